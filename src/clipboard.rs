//! Clipboard functionality

use arboard::Clipboard;

/// Read a pasted video URL from the clipboard.
///
/// Only the first non-blank line is used, so copying a URL together with
/// surrounding text still yields the link.
pub fn read_video_url() -> Result<String, String> {
    let mut clipboard =
        Clipboard::new().map_err(|e| format!("Failed to access clipboard: {}", e))?;

    let text = clipboard
        .get_text()
        .map_err(|e| format!("Failed to read clipboard: {}", e))?;

    first_line(&text).ok_or_else(|| "Clipboard is empty".to_string())
}

/// Put the prepared artifact reference on the clipboard
pub fn copy_artifact_reference(reference: &str) -> Result<(), String> {
    let mut clipboard =
        Clipboard::new().map_err(|e| format!("Failed to access clipboard: {}", e))?;

    clipboard
        .set_text(reference)
        .map_err(|e| format!("Failed to write clipboard: {}", e))
}

fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
