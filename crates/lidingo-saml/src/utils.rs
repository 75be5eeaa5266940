#![forbid(unsafe_code)]

use base64::{prelude::BASE64_STANDARD, Engine};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use lidingo_core::Error;

/// Decode base64 that may have been wrapped or indented by an XML producer.
pub fn decode_xml_base64(input: &str) -> Result<Vec<u8>, Error> {
    let stripped: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64_STANDARD
        .decode(stripped)
        .map_err(|e| Error::Base64(e.to_string()))
}

/// `xs:dateTime` as SAML producers write it: UTC, millisecond precision,
/// `Z` suffix. Sub-millisecond digits are dropped, not rounded.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an `xs:dateTime`. A missing zone designator is read as UTC.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, Error> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map(|t| t.and_utc())
        })
        .map_err(|_| Error::InvalidTimestamp(value.to_owned()))
}

/// Random lowercase hex string of `len` characters.
pub fn random_hex(len: usize) -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_decode_wrapped_base64() {
        assert_eq!(decode_xml_base64(" aGVs\n bG8=\r\n\t").unwrap(), b"hello");
        assert!(matches!(decode_xml_base64("not base64!"), Err(Error::Base64(_))));
    }

    #[test]
    fn test_format_truncates_to_millis() {
        let t = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .unwrap()
            .with_nanosecond(123_999_999)
            .unwrap();
        assert_eq!(format_instant(t), "2026-03-01T12:00:00.123Z");
        let whole = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format_instant(whole), "2026-03-01T12:00:00.000Z");
    }

    #[test]
    fn test_parse_instant() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 12, 5, 0).unwrap();
        assert_eq!(parse_instant("2026-03-01T12:05:00Z").unwrap(), expected);
        assert_eq!(parse_instant("2026-03-01T12:05:00.000Z").unwrap(), expected);
        assert_eq!(parse_instant("2026-03-01T13:05:00+01:00").unwrap(), expected);
        assert_eq!(parse_instant("2026-03-01T12:05:00").unwrap(), expected);
        assert_eq!(
            parse_instant("yesterday"),
            Err(Error::InvalidTimestamp("yesterday".into()))
        );
    }

    #[test]
    fn test_random_hex() {
        let s = random_hex(32);
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(random_hex(32), s);
    }
}
