//! Lenient timestamp decoding.
//!
//! Records written by older clients carry local timestamps without an offset
//! (`2025-01-10T10:05:00`); these are read as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Parse RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS[.fff]` taken as UTC.
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_both_forms() {
        let zoned = parse("2025-01-10T10:05:00Z").unwrap();
        let naive = parse("2025-01-10T10:05:00").unwrap();
        assert_eq!(zoned, naive);
        assert!(parse("2025-01-10T10:05:00.123").is_some());
        assert!(parse("yesterday").is_none());
    }

    #[test]
    fn test_blank_timestamp_is_none() {
        #[derive(Deserialize)]
        struct Paid {
            #[serde(default, deserialize_with = "deserialize_opt")]
            at: Option<DateTime<Utc>>,
        }
        let paid: Paid = serde_json::from_str(r#"{"at":""}"#).unwrap();
        assert!(paid.at.is_none());
    }
}
