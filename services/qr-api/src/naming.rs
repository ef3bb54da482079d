use chrono::{DateTime, Utc};

/// Key prefix for every stored QR image
pub const KEY_PREFIX: &str = "qr_codes/";

/// Maximum length, in characters, of the URL-derived part of a key
pub const MAX_FRAGMENT_LEN: usize = 50;

/// Generate the object key for a QR image
/// Format: qr_codes/{sanitized_url}_{YYYYMMDD_HHMMSS_micros}.png
///
/// The timestamp has microsecond resolution, so two keys for the same URL
/// only collide when both are generated within the same microsecond.
pub fn artifact_key(url: &str, now: DateTime<Utc>) -> String {
    format!(
        "{prefix}{fragment}_{timestamp}.png",
        prefix = KEY_PREFIX,
        fragment = sanitize_fragment(url),
        timestamp = format_timestamp(now),
    )
}

/// Drop the scheme and replace anything outside [A-Za-z0-9_-] (plus other
/// Unicode alphanumerics) with '_', keeping at most 50 characters.
pub fn sanitize_fragment(url: &str) -> String {
    let without_scheme = url.split_once("//").map_or(url, |(_, rest)| rest);

    without_scheme
        .chars()
        .map(|c| match c {
            '-' | '_' => c,
            c if c.is_alphanumeric() => c,
            _ => '_',
        })
        .take(MAX_FRAGMENT_LEN)
        .collect()
}

/// Timestamp suffix, e.g. 20240115_103045_123456
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d_%H%M%S_%6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(micros: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap()
            + Duration::microseconds(micros as i64)
    }

    #[test]
    fn test_artifact_key_format() {
        let key = artifact_key("https://example.com/", at(123_456));
        assert_eq!(key, "qr_codes/example_com__20240115_103045_123456.png");
    }

    #[test]
    fn test_timestamp_is_zero_padded() {
        assert_eq!(format_timestamp(at(42)), "20240115_103045_000042");
    }

    #[test]
    fn test_keys_differ_by_one_microsecond() {
        let url = "https://example.com/path?q=1";
        assert_ne!(artifact_key(url, at(1)), artifact_key(url, at(2)));
    }

    #[test]
    fn test_sanitize_strips_scheme_at_first_separator() {
        assert_eq!(sanitize_fragment("https://a.b/c"), "a_b_c");
        assert_eq!(
            sanitize_fragment("https://host/redirect?to=http://other"),
            "host_redirect_to_http___other"
        );
        assert_eq!(sanitize_fragment("no-scheme_here"), "no-scheme_here");
    }

    #[test]
    fn test_sanitize_empty_input() {
        assert_eq!(sanitize_fragment(""), "");
        assert_eq!(artifact_key("", at(0)), "qr_codes/_20240115_103045_000000.png");
    }

    #[test]
    fn test_sanitize_truncates_and_restricts_charset() {
        let long = format!("https://example.com/{}", "a/b.c?d=e&".repeat(20));
        let fragment = sanitize_fragment(&long);
        assert_eq!(fragment.chars().count(), MAX_FRAGMENT_LEN);
        assert!(fragment
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_sanitize_keeps_unicode_word_characters() {
        assert_eq!(sanitize_fragment("https://bücher.de/straße"), "bücher_de_straße");
    }
}
