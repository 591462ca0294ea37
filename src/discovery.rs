use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::InputMode;
use crate::error::{Result, SubsError};

/// Container formats ffmpeg can pull an audio track from, compared case-insensitively.
pub const SUPPORTED_VIDEO_EXTENSIONS: [&str; 9] =
    ["mp4", "mov", "webm", "flv", "ogv", "ogg", "avi", "m4v", "m4a"];

pub fn is_supported_video<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// List supported video files below `root`, sorted by path.
///
/// Without `recursive` only direct children are considered. Directories that
/// cannot be read are logged and skipped; the walk carries on with the rest.
/// A file reachable through several symlinked paths is listed once, under the
/// first of those paths in sorted order.
pub fn enumerate<P: AsRef<Path>>(root: P, recursive: bool) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(SubsError::Config(format!(
            "Input path is not a directory: {}",
            root.display()
        )));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(true)
        .sort_by_file_name();

    let mut video_files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let location = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| root.display().to_string());
                warn!("Skipping unreadable entry {}: {}", location, e);
                continue;
            }
        };

        if entry.file_type().is_file() && is_supported_video(entry.path()) {
            debug!("Discovered {}", entry.path().display());
            video_files.push(entry.into_path());
        }
    }

    video_files.sort();
    let mut seen = HashSet::new();
    video_files.retain(|path| {
        let identity = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
        seen.insert(identity)
    });

    info!("Found {} video files under {}", video_files.len(), root.display());
    Ok(video_files)
}

/// Turn the root of a batch into its item list according to `mode`.
pub fn collect_items<P: AsRef<Path>>(root: P, mode: InputMode) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    match mode {
        InputMode::File => {
            if !root.exists() {
                return Err(SubsError::Config(format!(
                    "Input file does not exist: {}",
                    root.display()
                )));
            }
            Ok(vec![root.to_path_buf()])
        }
        InputMode::Folder => enumerate(root, false),
        InputMode::FolderRecursive => enumerate(root, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        dir.child("a.mp4").touch().unwrap();
        dir.child("b.avi").touch().unwrap();
        dir.child("c.txt").touch().unwrap();
        dir.child("sub/d.mov").touch().unwrap();
        dir
    }

    fn relative(root: &Path, paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_non_recursive_scans_direct_children() {
        let dir = fixture();
        let found = enumerate(dir.path(), false).unwrap();
        assert_eq!(relative(dir.path(), &found), vec!["a.mp4", "b.avi"]);
    }

    #[test]
    fn test_recursive_includes_all_descendants() {
        let dir = fixture();
        dir.child("sub/deeper/e.WEBM").touch().unwrap();

        let found = enumerate(dir.path(), true).unwrap();
        assert_eq!(
            relative(dir.path(), &found),
            vec!["a.mp4", "b.avi", "sub/d.mov", "sub/deeper/e.WEBM"]
        );
    }

    #[test]
    fn test_enumeration_is_restartable() {
        let dir = fixture();
        let first = enumerate(dir.path(), true).unwrap();
        let second = enumerate(dir.path(), true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_directories_with_video_names_are_excluded() {
        let dir = fixture();
        dir.child("folder.mp4").create_dir_all().unwrap();

        let found = enumerate(dir.path(), false).unwrap();
        assert_eq!(relative(dir.path(), &found), vec!["a.mp4", "b.avi"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_excluded() {
        let dir = fixture();
        std::os::unix::fs::symlink(dir.path().join("missing.mp4"), dir.path().join("link.mp4"))
            .unwrap();

        let found = enumerate(dir.path(), false).unwrap();
        assert_eq!(relative(dir.path(), &found), vec!["a.mp4", "b.avi"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_does_not_duplicate_files() {
        let dir = TempDir::new().unwrap();
        dir.child("a.mp4").touch().unwrap();
        dir.child("sub/d.mov").touch().unwrap();
        std::os::unix::fs::symlink(dir.path().join("sub"), dir.path().join("alias")).unwrap();

        let found = enumerate(dir.path(), true).unwrap();
        assert_eq!(relative(dir.path(), &found), vec!["a.mp4", "alias/d.mov"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subtree_is_skipped() {
        let dir = fixture();
        dir.child("sub/e.webm").touch().unwrap();
        // Following this link fails with a loop error for that entry only
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub/loop")).unwrap();

        let found = enumerate(dir.path(), true).unwrap();
        assert_eq!(
            relative(dir.path(), &found),
            vec!["a.mp4", "b.avi", "sub/d.mov", "sub/e.webm"]
        );
    }

    #[test]
    fn test_extension_filter_is_case_insensitive() {
        assert!(is_supported_video("movie.MP4"));
        assert!(is_supported_video("voice.m4a"));
        assert!(!is_supported_video("movie.mkv"));
        assert!(!is_supported_video("README"));
    }

    #[test]
    fn test_collect_items_by_mode() {
        let dir = fixture();

        let single = collect_items(dir.child("c.txt").path(), InputMode::File).unwrap();
        assert_eq!(single, vec![dir.child("c.txt").path().to_path_buf()]);

        let folder = collect_items(dir.path(), InputMode::Folder).unwrap();
        assert_eq!(folder.len(), 2);

        let all = collect_items(dir.path(), InputMode::FolderRecursive).unwrap();
        assert_eq!(all.len(), 3);

        assert!(matches!(
            collect_items(dir.child("a.mp4").path(), InputMode::Folder),
            Err(SubsError::Config(_))
        ));
    }
}
