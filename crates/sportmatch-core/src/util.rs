//! Small helpers shared by config, auth and models.

/// Trimmed text, or `None` when missing or blank.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(ToString::to_string)
}

pub fn is_http_url(value: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| value.starts_with(scheme))
}

/// Now, as Unix milliseconds.
pub fn unix_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
