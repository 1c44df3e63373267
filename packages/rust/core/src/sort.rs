//! Output ordering of matched records.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use tenderwatch_shared::{MatchedRecord, fields};

/// Parse a closing date. RFC 3339 values are normalised to UTC; naive
/// date-times and plain dates are taken as they are.
pub fn parse_closing_date(value: &str) -> Option<NaiveDateTime> {
    let raw = value.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Sort key: closing date (missing or unparseable last), then procurement
/// category, then contracting entity, both case-insensitive.
pub fn sort_key(matched: &MatchedRecord) -> (NaiveDateTime, String, String) {
    let record = &matched.record;
    (
        parse_closing_date(record.get(fields::CLOSING_DATE)).unwrap_or(NaiveDateTime::MAX),
        record.get(fields::PROCUREMENT_CATEGORY).to_lowercase(),
        record.first_of(&fields::CONTRACTING_ENTITY).to_lowercase(),
    )
}

/// Stable sort by [`sort_key`]; ties keep source order.
pub fn sort_records(records: &mut [MatchedRecord]) {
    records.sort_by_cached_key(sort_key);
}
