use chrono::{DateTime, NaiveDate};

/// Calendar format written for every match date
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// Formats seen in legacy blobs once the time portion has been split off
const LEGACY_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%Y/%m/%d"];

/// Parses a stored match date.
///
/// Structured dates (`2024-03-14`, RFC 3339) parse directly. Legacy
/// locale strings such as `3/14/2024, 8:05:00 PM` keep only the portion
/// before the first separator.
pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive());
    }

    let date_part = raw
        .split([',', 'T', ' '])
        .next()
        .unwrap_or(raw)
        .trim();

    LEGACY_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

/// `serde(with = ...)` adapter: writes `%Y-%m-%d`, reads any supported form
pub mod match_date {
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&date.format(super::DATE_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_match_date(&raw)
            .ok_or_else(|| D::Error::custom(format!("unrecognised match date: {raw}")))
    }
}
