use chrono::{DateTime, Utc};

/// 将毫秒时间戳格式化为 HH:MM:SS.mmm (UTC)
pub fn format_timestamp(timestamp_ms: i128) -> String {
    i64::try_from(timestamp_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| format!("Invalid timestamp: {}", timestamp_ms))
}
