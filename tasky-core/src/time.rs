//! Time utilities: due-date parsing and timezone-aware "today".

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Parse a due date the way either a user or the server writes it:
/// a bare `YYYY-MM-DD`, or a full RFC3339 timestamp (reduced to its UTC day).
pub fn parse_due_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(day);
    }
    let dt = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| anyhow::anyhow!("invalid due date '{raw}': {e}"))?;
    Ok(dt.with_timezone(&Utc).date_naive())
}

pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// The calendar day `now` falls on in an IANA zone like "America/Chicago".
pub fn calendar_day(now: DateTime<Utc>, tz: &str) -> Result<NaiveDate> {
    let tz = parse_timezone(tz)?;
    Ok(now.with_timezone(&tz).date_naive())
}

/// Serde adapter for optional due dates.
///
/// Writes `YYYY-MM-DD`; reads anything [`parse_due_date`] accepts, and treats
/// `null` or an empty string as "no due date".
pub mod due_date_serde {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(day) => serializer.serialize_str(&day.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_due_date(s)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_bare_dates_and_timestamps() {
        let d = parse_due_date("2026-02-20").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 2, 20).unwrap());

        let d = parse_due_date("2026-02-20T00:00:00.000Z").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 2, 20).unwrap());

        assert!(parse_due_date("next tuesday").is_err());
    }

    #[test]
    fn calendar_day_follows_the_zone() {
        // 03:00 UTC is still the previous evening in Chicago (CST, UTC-6).
        let now = Utc.with_ymd_and_hms(2026, 2, 21, 3, 0, 0).unwrap();
        assert_eq!(
            calendar_day(now, "America/Chicago").unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 20).unwrap()
        );
        assert_eq!(
            calendar_day(now, "UTC").unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 21).unwrap()
        );
        assert!(calendar_day(now, "Mars/Olympus").is_err());
    }
}
