//! Human-readable rendering helpers for the presentation layer

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Text shown when a size is missing.
pub const UNKNOWN_SIZE: &str = "Unknown size";

/// Render a byte count as megabytes with two decimals.
///
/// Zero is reported the same as a missing value.
pub fn format_file_size(bytes: Option<u64>) -> String {
    match bytes {
        Some(bytes) if bytes > 0 => format!("{:.2} MB", bytes as f64 / BYTES_PER_MB),
        _ => UNKNOWN_SIZE.to_string(),
    }
}

/// Render a duration as `M:SS`, or `H:MM:SS` from one hour up.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
