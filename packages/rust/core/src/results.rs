//! Read back the latest run: search, detail lookup, and summary.

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use tenderwatch_artifacts::{LATEST_CSV, LATEST_JSON};
use tenderwatch_shared::{RawRecord, Result, RunSummary, TenderError, fields};

/// Default cap on search results.
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Contents of `latest.csv` and `latest.json`, each absent if never written.
#[derive(Debug, Clone, Default)]
pub struct LatestRun {
    pub rows: Option<Vec<RawRecord>>,
    pub summary: Option<RunSummary>,
}

/// Load the latest outputs from `output_dir`.
pub fn load_latest(output_dir: &Path) -> Result<LatestRun> {
    let csv_path = output_dir.join(LATEST_CSV);
    let json_path = output_dir.join(LATEST_JSON);

    let rows = if csv_path.is_file() {
        Some(read_rows(&csv_path)?)
    } else {
        None
    };

    let summary = if json_path.is_file() {
        let content =
            std::fs::read_to_string(&json_path).map_err(|e| TenderError::io(&json_path, e))?;
        let summary: RunSummary = serde_json::from_str(&content).map_err(|e| {
            TenderError::parse(format!("invalid {}: {e}", json_path.display()))
        })?;
        Some(summary)
    } else {
        None
    };

    debug!(
        rows = rows.as_ref().map(Vec::len),
        has_summary = summary.is_some(),
        "latest run loaded"
    );

    Ok(LatestRun { rows, summary })
}

fn read_rows(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| TenderError::parse(format!("cannot open {}: {e}", path.display())))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| TenderError::parse(format!("invalid header in {}: {e}", path.display())))?
        .iter()
        .map(str::to_string)
        .collect();

    reader
        .records()
        .map(|row| -> Result<RawRecord> {
            let row = row.map_err(|e| {
                TenderError::parse(format!("invalid row in {}: {e}", path.display()))
            })?;
            Ok(RawRecord::from_pairs(
                headers.iter().map(String::as_str).zip(row.iter()),
            ))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Case-insensitive substring filters over the latest results.
#[derive(Debug, Clone, Serialize)]
pub struct ResultFilter {
    /// Keep rows whose `match_industries` contains any of these.
    pub industries: Vec<String>,
    /// Keep rows whose `match_regions` contains any of these.
    pub regions: Vec<String>,
    /// Keep rows whose English status contains this.
    pub status: Option<String>,
    #[serde(skip)]
    pub max_results: usize,
}

impl Default for ResultFilter {
    fn default() -> Self {
        Self {
            industries: Vec::new(),
            regions: Vec::new(),
            status: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// Apply `filter` in order (industries, regions, status), then truncate.
pub fn filter_results<'a>(rows: &'a [RawRecord], filter: &ResultFilter) -> Vec<&'a RawRecord> {
    let industries = lowered(&filter.industries);
    let regions = lowered(&filter.regions);
    let status = filter.status.as_deref().map(str::to_lowercase);

    rows.iter()
        .filter(|row| contains_any(row.get(fields::MATCH_INDUSTRIES), &industries))
        .filter(|row| contains_any(row.get(fields::MATCH_REGIONS), &regions))
        .filter(|row| match &status {
            Some(status) => row.get(fields::STATUS_EN).to_lowercase().contains(status.as_str()),
            None => true,
        })
        .take(filter.max_results)
        .collect()
}

fn lowered(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

/// An empty needle list keeps everything.
fn contains_any(haystack: &str, needles: &[String]) -> bool {
    if needles.is_empty() {
        return true;
    }
    let haystack = haystack.to_lowercase();
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

/// Compact view of one result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenderBrief {
    pub reference: String,
    pub title: String,
    pub status: String,
    pub closing_date: String,
    pub category: String,
    pub entity: String,
    pub regions: String,
    pub matched_industries: String,
    pub matched_codes: String,
    pub notice_url: String,
}

impl TenderBrief {
    pub fn from_record(row: &RawRecord) -> Self {
        Self {
            reference: row.get(fields::REFERENCE_NUMBER).trim().to_string(),
            title: row.first_of(&fields::TITLE).to_string(),
            status: row.first_of(&fields::STATUS).to_string(),
            closing_date: row.get(fields::CLOSING_DATE).trim().to_string(),
            category: row.get(fields::PROCUREMENT_CATEGORY).trim().to_string(),
            entity: row.first_of(&fields::CONTRACTING_ENTITY).to_string(),
            regions: row.first_of(&fields::DELIVERY_REGION).to_string(),
            matched_industries: row.get(fields::MATCH_INDUSTRIES).to_string(),
            matched_codes: row.get(fields::MATCH_CODES).to_string(),
            notice_url: row.first_of(&fields::NOTICE_URL).to_string(),
        }
    }
}

/// Search response: the filter used, counts, and the briefs.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: ResultFilter,
    pub result_count: usize,
    pub total_available: usize,
    pub tenders: Vec<TenderBrief>,
}

/// Filter `rows` and wrap the hits as briefs.
pub fn search(rows: &[RawRecord], filter: &ResultFilter) -> SearchResponse {
    let tenders: Vec<TenderBrief> = filter_results(rows, filter)
        .into_iter()
        .map(TenderBrief::from_record)
        .collect();

    SearchResponse {
        query: filter.clone(),
        result_count: tenders.len(),
        total_available: rows.len(),
        tenders,
    }
}

/// First row whose reference number equals `reference` exactly.
pub fn find_by_reference<'a>(rows: &'a [RawRecord], reference: &str) -> Option<&'a RawRecord> {
    rows.iter()
        .find(|row| row.get(fields::REFERENCE_NUMBER) == reference)
}
