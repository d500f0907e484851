//! Vendor datetime parsing.

use chrono::{DateTime, FixedOffset};

/// Timestamps with fractional seconds, e.g. `2025-06-01T10:00:00.000+0200`.
const FORMAT_FRACTIONAL: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Timestamps without fractional seconds, e.g. `2025-06-01T10:00:00+0200`.
const FORMAT_SECONDS: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Parse a vendor datetime string.
///
/// Tries the fractional-seconds format first, then the plain one. The offset
/// may be `+HHMM`, `+HH:MM` or `Z`. Anything else, including `None`, yields
/// `None`.
pub fn parse_vendor_datetime(input: Option<&str>) -> Option<DateTime<FixedOffset>> {
    let raw = input?.trim();
    if raw.is_empty() {
        return None;
    }

    let normalized;
    let s = match raw.strip_suffix('Z') {
        Some(rest) => {
            normalized = format!("{}+0000", rest);
            normalized.as_str()
        }
        None => raw,
    };

    if s.contains('.') {
        if let Ok(dt) = DateTime::parse_from_str(s, FORMAT_FRACTIONAL) {
            return Some(dt);
        }
    }
    DateTime::parse_from_str(s, FORMAT_SECONDS).ok()
}

/// Parse an ISO 8601 timestamp as written by the vendor in metadata fields
/// (`updatedAt`). Falls back to the order-slot formats.
pub fn parse_iso_datetime(input: Option<&str>) -> Option<DateTime<FixedOffset>> {
    let raw = input?.trim();
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .or_else(|| parse_vendor_datetime(Some(raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn expected(h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 6, 1, h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_fractional() {
        let dt = parse_vendor_datetime(Some("2025-06-01T10:00:00.000+0200")).unwrap();
        assert_eq!(dt, expected(10, 0));
    }

    #[test]
    fn test_parse_microseconds() {
        let dt = parse_vendor_datetime(Some("2025-06-01T10:00:00.123456+0200")).unwrap();
        assert_eq!(dt.nanosecond(), 123_456_000);
    }

    #[test]
    fn test_parse_without_fraction() {
        let dt = parse_vendor_datetime(Some("2025-06-01T10:30:00+0200")).unwrap();
        assert_eq!(dt, expected(10, 30));
    }

    #[test]
    fn test_both_formats_same_instant() {
        let a = parse_vendor_datetime(Some("2025-06-01T10:00:00.000+0200")).unwrap();
        let b = parse_vendor_datetime(Some("2025-06-01T10:00:00+0200")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_colon_offset_and_zulu() {
        let colon = parse_vendor_datetime(Some("2025-06-01T10:00:00+02:00")).unwrap();
        assert_eq!(colon, expected(10, 0));

        let zulu = parse_vendor_datetime(Some("2025-06-01T08:00:00Z")).unwrap();
        assert_eq!(zulu, expected(10, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_vendor_datetime(None).is_none());
        assert!(parse_vendor_datetime(Some("")).is_none());
        assert!(parse_vendor_datetime(Some("tomorrow morning")).is_none());
        assert!(parse_vendor_datetime(Some("2025-06-01")).is_none());
        // no offset
        assert!(parse_vendor_datetime(Some("2025-06-01T10:00:00")).is_none());
        assert!(parse_vendor_datetime(Some("2025-13-01T10:00:00+0200")).is_none());
    }

    #[test]
    fn test_parse_iso_datetime() {
        let dt = parse_iso_datetime(Some("2025-06-01T10:00:00+02:00")).unwrap();
        assert_eq!(dt, expected(10, 0));
        let vendor = parse_iso_datetime(Some("2025-06-01T10:00:00.000+0200")).unwrap();
        assert_eq!(vendor, expected(10, 0));
        assert!(parse_iso_datetime(None).is_none());
    }
}
