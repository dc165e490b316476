//! Common utilities and helper functions

pub mod error;
pub mod retry;

use std::time::Duration;

/// Format a wait as `HHh MMm SSs` for log lines
pub fn format_wait(duration: Duration) -> String {
    let secs = duration.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{hours:02}h {mins:02}m {secs:02}s")
}

/// Truncate text to a maximum length in characters
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
