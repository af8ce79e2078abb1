pub mod config;
pub mod error;
pub mod origin;

/// ISO-8601 UTC timestamp with millisecond precision, as stamped on every envelope.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
