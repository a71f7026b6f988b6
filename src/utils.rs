//! Formatting helpers for command summaries.

/// Format a byte count in human-readable form.
///
/// # Examples
///
/// ```
/// use etcd_backup::utils::format_bytes;
///
/// assert_eq!(format_bytes(0), "0 bytes");
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        0 => "0 bytes".to_string(),
        b if b >= GB => format!("{:.2} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{b} bytes"),
    }
}

/// Format an elapsed time. Runs shorter than a minute keep millisecond
/// precision.
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use etcd_backup::utils::format_elapsed;
///
/// assert_eq!(format_elapsed(Duration::milliseconds(1250)), "1.25s");
/// assert_eq!(format_elapsed(Duration::seconds(90)), "1m 30s");
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn format_elapsed(duration: chrono::Duration) -> String {
    let secs = duration.num_seconds();
    if secs < 60 {
        format!("{:.2}s", duration.num_milliseconds() as f64 / 1000.0)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Size of the file at `path`, if it can be read.
pub fn file_size(path: &std::path::Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|meta| meta.len())
}
