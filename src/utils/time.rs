//! # 时间格式化工具

use chrono::{Local, TimeZone};

/// 将 Unix 时间戳（秒）格式化为本地时间 `HH:MM:SS`
///
/// 超出可表示范围的时间戳按当前时间处理。
pub fn format_timestamp(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(time) => time.format("%H:%M:%S").to_string(),
        None => format_now(),
    }
}

/// 当前本地时间 `HH:MM:SS`
pub fn format_now() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_shape() {
        let formatted = format_timestamp(1_700_000_000);
        assert_eq!(formatted.len(), 8);
        assert_eq!(formatted.as_bytes()[2], b':');
        assert_eq!(formatted.as_bytes()[5], b':');
    }

    #[test]
    fn test_out_of_range_falls_back() {
        assert_eq!(format_timestamp(i64::MAX).len(), 8);
    }
}
