//! Lenient serde helpers for fields the backend does not type consistently.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, de::IgnoredAny};

/// Parse a calendar date from `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Accept Option<NaiveDate> from a date string; null, unparsable strings and
/// non-string values all become None.
pub fn opt_date_from_str<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StrOrOther {
        Str(String),
        Other(IgnoredAny),
    }

    let val: Option<StrOrOther> = Option::deserialize(deserializer)?;
    Ok(match val {
        Some(StrOrOther::Str(s)) => parse_date(&s),
        _ => None,
    })
}

/// Accept a list of strings from either an array or a bare string; null -> empty.
pub fn vec_from_single_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let val: Option<OneOrMany> = Option::deserialize(deserializer)?;
    Ok(match val {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}
