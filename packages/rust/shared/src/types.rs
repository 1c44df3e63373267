//! Core domain types for tenderwatch runs.

use std::collections::{BTreeMap, BTreeSet};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};

use crate::fields::{self, FieldFallback, LIST_SEPARATOR};

// ---------------------------------------------------------------------------
// RawRecord
// ---------------------------------------------------------------------------

/// One row of the tender feed: column name → value, in source column order.
///
/// Unknown columns are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    /// Build a record from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `column`, or `""` if the column is absent.
    pub fn get(&self, column: &str) -> &str {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    /// Value of the column at `index` in source order, or `""` past the end.
    pub fn value_at(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    /// First non-blank value among the field's columns, trimmed.
    pub fn first_of(&self, field: &FieldFallback) -> &str {
        field
            .columns
            .iter()
            .map(|column| self.get(column).trim())
            .find(|value| !value.is_empty())
            .unwrap_or("")
    }

    /// Non-empty values of `columns` joined with a space.
    pub fn joined(&self, columns: &[&str]) -> String {
        columns
            .iter()
            .map(|column| self.get(column))
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Column names in source order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Values in source order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Set `column` to `value`, appending the column if it is new.
    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| name == column) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((column.to_string(), value)),
        }
    }
}

impl Serialize for RawRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Match provenance
// ---------------------------------------------------------------------------

/// Which matching stage selected a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchSource {
    ClassificationCode,
    Keyword,
}

impl MatchSource {
    pub const ALL: [MatchSource; 2] = [MatchSource::ClassificationCode, MatchSource::Keyword];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClassificationCode => "classification-code",
            Self::Keyword => "keyword",
        }
    }
}

impl std::fmt::Display for MatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a record matched. Set-valued; sorted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchProvenance {
    /// Configured regions found in the record's region fields.
    pub regions: BTreeSet<String>,
    /// Industries matched by codes or keywords.
    pub industries: BTreeSet<String>,
    /// Normalized rule codes that fired.
    pub codes: BTreeSet<String>,
    /// `<industry>:<category tag>` for every rule that fired.
    pub categories: BTreeSet<String>,
    /// Matching stages that produced at least one hit.
    pub sources: BTreeSet<MatchSource>,
    /// Keywords found in the title/description text.
    pub keywords: BTreeSet<String>,
}

/// Attachment URLs of a record and what happened to each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentFields {
    /// All attachment URLs, deduplicated, first-seen order.
    pub urls: Vec<String>,
    /// URLs that answered HEAD with 200.
    pub working: Vec<String>,
    /// URLs that answered HEAD with 404.
    pub missing: Vec<String>,
    /// URLs with any other status, a transport failure, or no check at all.
    pub unchecked: Vec<String>,
    /// URLs successfully downloaded.
    pub downloaded: Vec<String>,
}

impl AttachmentFields {
    /// True when none of the URLs carries a check result.
    pub fn is_unverified(&self) -> bool {
        self.working.is_empty() && self.missing.is_empty() && self.unchecked.is_empty()
    }
}

// ---------------------------------------------------------------------------
// MatchedRecord
// ---------------------------------------------------------------------------

/// A feed row that passed the region gate and at least one industry match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRecord {
    pub record: RawRecord,
    pub provenance: MatchProvenance,
    pub attachments: AttachmentFields,
}

impl MatchedRecord {
    /// Derived column values, aligned with [`fields::DERIVED_COLUMNS`].
    pub fn derived_values(&self) -> Vec<String> {
        let p = &self.provenance;
        let a = &self.attachments;
        vec![
            join_set(&p.regions),
            join_set(&p.industries),
            join_set(&p.codes),
            join_set(&p.categories),
            p.sources
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(LIST_SEPARATOR),
            join_set(&p.keywords),
            a.urls.join(LIST_SEPARATOR),
            a.working.join(LIST_SEPARATOR),
            a.missing.join(LIST_SEPARATOR),
            a.unchecked.join(LIST_SEPARATOR),
            a.downloaded.join(LIST_SEPARATOR),
        ]
    }

    /// The source row with the derived columns written into it.
    pub fn to_output_row(&self) -> RawRecord {
        let mut row = self.record.clone();
        for (column, value) in fields::DERIVED_COLUMNS.iter().zip(self.derived_values()) {
            row.set(column, value);
        }
        row
    }
}

fn join_set(set: &BTreeSet<String>) -> String {
    set.iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// Split a `;`-joined derived column back into its items.
pub fn split_list(value: &str) -> Vec<&str> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Aggregate counters for one pipeline run, written as `summary-*.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Literal location the feed was read from.
    pub source: String,
    /// Configured regions.
    pub regions: Vec<String>,
    /// Rows evaluated by the matcher.
    pub processed_total: usize,
    /// Rows that matched.
    pub matched_total: usize,
    /// Rows that could not be parsed.
    #[serde(default)]
    pub rows_skipped: usize,
    /// Matched records per industry (each record counted once per industry).
    pub industry_counts: BTreeMap<String, usize>,
    /// Matched records per match source (each record counted once per source).
    pub match_sources: BTreeMap<String, usize>,
    pub attachment_urls_total: usize,
    pub attachment_urls_checked: usize,
    pub attachment_urls_ok: usize,
    pub attachment_urls_missing: usize,
    pub attachment_urls_other: usize,
    pub attachment_download_attempted: usize,
    pub attachment_downloaded: usize,
    pub output_rows: usize,
    pub markdown_count: usize,
    pub markdown_dir: String,
    pub generated_at_utc: String,
}

impl RunSummary {
    /// A zeroed summary for a run over `source`.
    pub fn new(source: impl Into<String>, regions: &[&str]) -> Self {
        Self {
            source: source.into(),
            regions: regions.iter().map(|r| r.to_string()).collect(),
            match_sources: MatchSource::ALL
                .iter()
                .map(|s| (s.as_str().to_string(), 0))
                .collect(),
            ..Self::default()
        }
    }

    /// Count one matched record: once per industry, once per match source.
    pub fn record_match(&mut self, provenance: &MatchProvenance) {
        self.matched_total += 1;
        for industry in &provenance.industries {
            *self.industry_counts.entry(industry.clone()).or_default() += 1;
        }
        for source in &provenance.sources {
            *self
                .match_sources
                .entry(source.as_str().to_string())
                .or_default() += 1;
        }
    }
}
