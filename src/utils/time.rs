//! Timestamp parsing for the formats sources actually publish.

use chrono::{DateTime, NaiveDate, Utc};

/// Parse RFC 3339, RFC 2822 or a bare `YYYY-MM-DD` date into UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339() {
        let dt = parse_timestamp("2025-03-01T10:00:00+02:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-03-01T08:00:00+00:00");
    }

    #[test]
    fn test_rfc2822() {
        let dt = parse_timestamp("Sat, 01 Mar 2025 10:00:00 GMT").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_date_only() {
        let dt = parse_timestamp(" 2025-03-01 ").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_garbage() {
        assert!(parse_timestamp("3 days ago").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
