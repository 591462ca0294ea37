use std::fmt::Write as _;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, SubsError};
use crate::transcribe::TranscriptSegment;

/// Default length of a segment the engine left open, matching its chunk length.
pub const FALLBACK_SEGMENT_SECONDS: f64 = 10.0;

/// Render segments as subtitle blocks.
///
/// Segments without a start are dropped and do not consume an index. A
/// segment without an end lasts `fallback_seconds`. Blocks
/// keep the input order; nothing is merged or re-sorted. The time-range line
/// keeps the historical `0H:MM:SS,000  -->  0H:MM:SS,000` shape so existing
/// subtitle files stay byte-compatible.
pub fn render_srt(segments: &[TranscriptSegment], fallback_seconds: f64) -> String {
    let mut srt_content = String::new();
    let mut index = 0;

    for segment in segments {
        let Some(start) = segment.start else {
            debug!("Dropping segment without start offset: {:?}", segment.text);
            continue;
        };
        let end = segment.end.unwrap_or(start + fallback_seconds);
        index += 1;

        // Writing into a String cannot fail
        let _ = write!(
            srt_content,
            "{}\n0{},000  -->  0{},000\n{}\n\n",
            index,
            format_timestamp(start),
            format_timestamp(end),
            segment.text.trim()
        );
    }

    srt_content
}

/// Write the subtitle file for `segments` to `output_path`, replacing any existing file.
pub async fn write_srt<P: AsRef<Path>>(
    output_path: P,
    segments: &[TranscriptSegment],
    fallback_seconds: f64,
) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating SRT file: {}", output_path.display());

    fs::write(output_path, render_srt(segments, fallback_seconds)).await
        .map_err(|e| SubsError::serialization(output_path, e))?;

    info!("SRT file generated successfully");
    Ok(())
}

/// Format seconds as `H:MM:SS`, truncated to whole seconds.
///
/// Hours are not padded and not wrapped; negative input clamps to zero.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    format!("{}:{:02}:{:02}", hours, minutes, secs)
}

/// Parse `H:MM:SS` back into seconds.
pub fn parse_timestamp(text: &str) -> Option<f64> {
    let mut parts = text.trim().split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let secs: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || secs >= 60 {
        return None;
    }
    Some((hours * 3600 + minutes * 60 + secs) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: Option<f64>, end: Option<f64>, text: &str) -> TranscriptSegment {
        TranscriptSegment::new(start, end, text)
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "0:00:00");
        assert_eq!(format_timestamp(65.9), "0:01:05");
        assert_eq!(format_timestamp(3661.5), "1:01:01");
        assert_eq!(format_timestamp(36000.0), "10:00:00");
        assert_eq!(format_timestamp(-3.0), "0:00:00");
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1:01:01"), Some(3661.0));
        assert_eq!(parse_timestamp(" 0:00:30 "), Some(30.0));
        assert_eq!(parse_timestamp("0:61:00"), None);
        assert_eq!(parse_timestamp("00:30"), None);
        assert_eq!(parse_timestamp("a:b:c"), None);
    }

    #[test]
    fn test_render_block_layout() {
        let srt = render_srt(&[seg(Some(1.2), Some(4.8), " Hello there.")], FALLBACK_SEGMENT_SECONDS);
        assert_eq!(srt, "1\n00:00:01,000  -->  00:00:04,000\nHello there.\n\n");
    }

    #[test]
    fn test_missing_end_uses_fallback_window() {
        let srt = render_srt(&[seg(Some(125.0), None, "tail")], FALLBACK_SEGMENT_SECONDS);
        assert_eq!(srt, "1\n00:02:05,000  -->  00:02:15,000\ntail\n\n");
    }

    #[test]
    fn test_fallback_window_is_configurable() {
        let srt = render_srt(&[seg(Some(60.0), None, "open")], 5.0);
        assert_eq!(srt, "1\n00:01:00,000  -->  00:01:05,000\nopen\n\n");
    }

    #[test]
    fn test_missing_start_is_dropped_and_indices_stay_consecutive() {
        let srt = render_srt(&[
            seg(None, Some(2.0), "lost"),
            seg(Some(2.0), Some(5.0), "first"),
            seg(None, None, "also lost"),
            seg(Some(5.0), Some(9.0), "second"),
        ], FALLBACK_SEGMENT_SECONDS);

        assert!(!srt.contains("lost"));
        let indices: Vec<&str> = srt
            .split("\n\n")
            .filter(|block| !block.is_empty())
            .map(|block| block.lines().next().unwrap())
            .collect();
        assert_eq!(indices, vec!["1", "2"]);
    }

    #[test]
    fn test_order_is_preserved_without_merging() {
        let srt = render_srt(&[
            seg(Some(10.0), Some(12.0), "later"),
            seg(Some(3.0), Some(12.0), "earlier"),
            seg(Some(3.0), Some(12.0), "earlier"),
        ], FALLBACK_SEGMENT_SECONDS);

        let expected = "1\n00:00:10,000  -->  00:00:12,000\nlater\n\n\
                        2\n00:00:03,000  -->  00:00:12,000\nearlier\n\n\
                        3\n00:00:03,000  -->  00:00:12,000\nearlier\n\n";
        assert_eq!(srt, expected);
    }

    #[test]
    fn test_long_recordings_keep_unpadded_hours() {
        let srt = render_srt(&[seg(Some(36000.0), Some(36005.0), "late")], FALLBACK_SEGMENT_SECONDS);
        assert!(srt.contains("010:00:00,000  -->  010:00:05,000"));
    }

    #[tokio::test]
    async fn test_write_srt_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.srt");
        std::fs::write(&path, "stale").unwrap();

        write_srt(&path, &[seg(Some(0.0), Some(1.0), "fresh")], FALLBACK_SEGMENT_SECONDS).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "1\n00:00:00,000  -->  00:00:01,000\nfresh\n\n");
    }

    #[tokio::test]
    async fn test_write_srt_reports_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("movie.srt");

        let err = write_srt(&path, &[], FALLBACK_SEGMENT_SECONDS).await.unwrap_err();
        assert!(matches!(err, SubsError::Serialization { .. }));
    }
}
