//! Text handling for changelog and description metadata.

use std::io;
use std::path::Path;

/// Maximum character budget for changelog/description text.
pub const TEXT_LIMIT: usize = 255;

const ELLIPSIS: char = '…';

/// Reads a metadata text file as UTF-8.
pub fn load_text(path: &Path) -> io::Result<String> {
    std::fs::read_to_string(path)
}

/// Truncates to `max` characters: over budget yields the first `max - 1`
/// characters plus a single ellipsis marker; at or under budget the
/// input is returned unchanged.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push(ELLIPSIS);
    cut
}

/// Converts newlines to break tags for the build log preview.
pub fn newlines_to_br(text: &str) -> String {
    text.replace("\r\n", "<br/>").replace('\n', "<br/>")
}
