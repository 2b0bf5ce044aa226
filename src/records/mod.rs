//! Typed record models, their field catalogs and validation

pub mod catalog;
mod features;
mod market_data;
pub mod validation;

pub use catalog::{FieldKind, FieldSpec, RecordSchema, FEATURES, MARKET_DATA, RECOMMENDED_FEATURES};
pub use features::FeatureRecord;
pub use market_data::MarketDataItem;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// A record type stored under a `(symbol, instant)` uniqueness key
pub trait Record: Serialize + DeserializeOwned {
    const SCHEMA: &'static RecordSchema;

    fn symbol(&self) -> &str;

    fn instant(&self) -> DateTime<Utc>;
}

/// Parse an ISO-8601 style instant.
///
/// Accepts RFC 3339 with an offset, naive date-times (taken as UTC, `T` or
/// space separated, optional fraction) and bare dates (midnight UTC). The UTC
/// year must have four digits.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    parse_any(raw.trim()).filter(|dt| (0..=9999).contains(&dt.year()))
}

fn parse_any(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Canonical storage form: fixed width, so text order equals time order
pub fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}
