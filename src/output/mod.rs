use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use crate::extractors::{VideoEntry, VideoId, VideoStats};
use crate::utils::sanitize_filename;

pub mod clean;

pub use clean::clean_transcript;

/// Line separating the metadata block from the transcript body
pub const SEPARATOR: &str = "========================================";

/// Contents of one saved transcript file
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptDocument {
    pub video: VideoEntry,
    pub stats: Option<VideoStats>,
    /// Cleaned transcript text
    pub body: String,
}

impl TranscriptDocument {
    /// Render the metadata block, separator and body
    pub fn render(&self) -> String {
        let video_id = &self.video.video_id;
        let mut content = String::new();

        let _ = writeln!(content, "Title: {}", self.video.title);
        let _ = writeln!(content, "Video ID: {}", video_id);
        let _ = writeln!(content, "URL: {}", video_id.watch_url());

        if let Some(stats) = &self.stats {
            let counters = [
                ("Views", stats.view_count),
                ("Likes", stats.like_count),
                ("Favorites", stats.favorite_count),
                ("Comments", stats.comment_count),
            ];
            for (label, value) in counters {
                if let Some(value) = value {
                    let _ = writeln!(content, "{}: {}", label, value);
                }
            }
        }

        content.push_str(SEPARATOR);
        content.push('\n');
        content.push_str(&self.body);
        content.push('\n');
        content
    }
}

/// File name for a video: sanitized title followed by the id, which keeps names unique
pub fn transcript_filename(title: &str, video_id: &VideoId) -> String {
    format!("{}_{}.md", sanitize_filename(title), video_id)
}

/// Save a transcript document.
///
/// The content is written to a temporary file next to `path` and renamed into place,
/// so an interrupted run never leaves a partial transcript behind.
pub fn save_to_file(document: &TranscriptDocument, path: &Path) -> Result<()> {
    write_atomic(path, &document.render())
}

/// Write `content` to `path` in a single rename
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(content.as_bytes())
        .context("Failed to write transcript")?;
    file.persist(path)
        .with_context(|| format!("Failed to save {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(stats: Option<VideoStats>) -> TranscriptDocument {
        TranscriptDocument {
            video: VideoEntry {
                video_id: VideoId::new("dQw4w9WgXcQ"),
                title: "Never: Gonna?".to_string(),
            },
            stats,
            body: "Hello world. Next".to_string(),
        }
    }

    #[test]
    fn test_separator_is_forty_equals() {
        assert_eq!(SEPARATOR.len(), 40);
        assert!(SEPARATOR.chars().all(|c| c == '='));
    }

    #[test]
    fn test_render_without_stats() {
        let expected = format!(
            "Title: Never: Gonna?\nVideo ID: dQw4w9WgXcQ\n\
             URL: https://www.youtube.com/watch?v=dQw4w9WgXcQ\n{}\nHello world. Next\n",
            SEPARATOR
        );
        assert_eq!(document(None).render(), expected);
    }

    #[test]
    fn test_render_with_partial_stats() {
        let rendered = document(Some(VideoStats {
            view_count: Some(1000),
            like_count: None,
            favorite_count: Some(0),
            comment_count: Some(12),
        }))
        .render();

        assert!(rendered.contains(
            "URL: https://www.youtube.com/watch?v=dQw4w9WgXcQ\n\
             Views: 1000\nFavorites: 0\nComments: 12\n"
        ));
        assert!(!rendered.contains("Likes"));
    }

    #[test]
    fn test_transcript_filename() {
        assert_eq!(
            transcript_filename("What is 2+2? A Video: Test", &VideoId::new("abc")),
            "What is 2+2 A Video Test_abc.md"
        );
    }

    #[test]
    fn test_save_to_file_replaces_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video.md");

        tokio_test::assert_ok!(save_to_file(&document(None), &path));
        let first = fs_err::read_to_string(&path).unwrap();
        assert!(first.ends_with("Hello world. Next\n"));

        write_atomic(&path, "replaced").unwrap();
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "replaced");

        let leftovers: Vec<_> = fs_err::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("video.md");
        tokio_test::assert_err!(save_to_file(&document(None), &path));
    }
}
