use chrono::{SecondsFormat, Utc};

/// Current time in the `toISOString` shape, e.g. `2024-05-01T12:00:00.123Z`
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Milliseconds since the Unix epoch
pub fn epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Name of a downloaded result file
pub fn download_file_name(millis: i64) -> String {
    format!("scraped-data-{}.json", millis)
}

/// Keep the first `limit` characters of `text`, returning the kept prefix and
/// the full character count
pub fn truncate_chars(text: &str, limit: usize) -> (String, usize) {
    let total = text.chars().count();
    if total <= limit {
        return (text.to_string(), total);
    }
    (text.chars().take(limit).collect(), total)
}
