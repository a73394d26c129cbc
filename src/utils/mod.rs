use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Characters rejected by at least one common filesystem
static FORBIDDEN_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Longest sanitized title kept in a filename, in characters
pub const MAX_FILENAME_CHARS: usize = 100;

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Sanitize a video title for safe filesystem usage.
///
/// Drops `< > : " / \ | ? *`, collapses whitespace, then keeps at most
/// [`MAX_FILENAME_CHARS`] characters.
pub fn sanitize_filename(title: &str) -> String {
    let stripped = FORBIDDEN_FILENAME_CHARS.replace_all(title, "");
    let collapsed = WHITESPACE_RUN.replace_all(&stripped, " ");
    truncate_chars(&collapsed, MAX_FILENAME_CHARS).trim().to_string()
}

/// First `max` characters of `text`, never splitting a code point
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Absolute path of a cookies file, or `None` with a warning when it does not exist.
///
/// A missing cookies file is not fatal; the run continues unauthenticated.
pub fn validate_cookie_file(path: &Path) -> Option<PathBuf> {
    if !path.is_file() {
        tracing::warn!("Cookie file not found: {}", path.display());
        return None;
    }

    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    println!("🍪 Using cookies from: {}", absolute.display());
    Some(absolute)
}

/// Check if the current environment has required tools
pub async fn check_dependencies(yt_dlp_path: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(yt_dlp_path).await {
        missing.push(format!(
            "{} - required for channel listing and caption tracks",
            yt_dlp_path
        ));
    }

    missing
}

/// Check if a command is available in PATH
pub async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
