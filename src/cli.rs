use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create subtitle files for a video or a folder of videos
    Run {
        /// Video file or folder to process
        path: PathBuf,

        /// How to interpret the path: file, folder or folder-recursive
        #[arg(short, long, default_value = "file")]
        input_mode: String,

        /// Overwrite existing subtitle files
        #[arg(long)]
        replace: bool,

        /// Detect the language per segment instead of once per file
        #[arg(long, conflicts_with = "language")]
        multi_lang: bool,

        /// Re-detect the language even if a cached detection exists
        #[arg(long)]
        replace_lang: bool,

        /// Decode every file in this language, skipping detection
        #[arg(short, long)]
        language: Option<String>,

        /// Keep extracted audio and language detection files
        #[arg(long)]
        preserve_intermediary_files: bool,

        /// Whisper model name or path to a ggml model file
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List the videos a run would process
    List {
        /// Folder to scan
        path: PathBuf,

        /// Include every subfolder
        #[arg(short, long)]
        recursive: bool,
    },

    /// List available whisper models and their status
    Models {
        /// Download the named model if it is missing
        #[arg(long)]
        download: Option<String>,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination file
        #[arg(short, long, default_value = "whispersubs.toml")]
        output: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_arguments() {
        let args = Args::try_parse_from([
            "whispersubs", "-v", "run", "/videos", "--input-mode", "folder-recursive",
            "--replace", "--language", "hi",
        ])
        .unwrap();

        assert!(args.verbose);
        match args.command {
            Commands::Run { path, input_mode, replace, multi_lang, language, .. } => {
                assert_eq!(path, PathBuf::from("/videos"));
                assert_eq!(input_mode, "folder-recursive");
                assert!(replace);
                assert!(!multi_lang);
                assert_eq!(language.as_deref(), Some("hi"));
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_language_conflicts_with_multi_lang() {
        let result = Args::try_parse_from([
            "whispersubs", "run", "movie.mp4", "--multi-lang", "--language", "en",
        ]);
        assert!(result.is_err());
    }
}
