//! Human-readable renderings used only in HTTP responses

use chrono::{Local, TimeZone};

const SIZE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Size in 1024 steps with one decimal, e.g. `1.5 KB`
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, SIZE_UNITS[unit])
}

/// Epoch seconds as local `YYYY-MM-DD HH:MM:SS`
pub fn format_timestamp(secs: i64) -> String {
    match Local.timestamp_opt(secs, 0).earliest() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => secs.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn sizes() {
        assert_eq!(format_size(0), "0.0 B");
        assert_eq!(format_size(512), "512.0 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(1024u64.pow(5)), "1.0 PB");
        assert_eq!(format_size(1024u64.pow(6)), "1024.0 PB");
    }

    #[test]
    fn timestamps_use_fixed_layout() {
        let formatted = format_timestamp(1_700_000_000);
        assert!(NaiveDateTime::parse_from_str(&formatted, "%Y-%m-%d %H:%M:%S").is_ok());
        assert!(formatted.starts_with("2023-11-1"));
    }
}
