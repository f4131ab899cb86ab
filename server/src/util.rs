//! Shared utility functions

/// Render a byte count with binary units for log lines.
///
/// Upload sizes in this crate are capped in mebibytes, so the scale stops
/// at MiB.
///
/// # Examples
///
/// ```
/// use meet_server::util::human_size;
///
/// assert_eq!(human_size(100), "100 B");
/// assert_eq!(human_size(64 * 1024), "64.0 KiB");
/// assert_eq!(human_size(25 * 1024 * 1024), "25.0 MiB");
/// ```
pub fn human_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * KIB;
    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}
