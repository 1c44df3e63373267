//! Output writer: filtered CSV, run summary JSON, and per-record documents.
//!
//! Every file is written to a `.{name}.tmp` sibling first and then renamed,
//! and comes back as an [`ArtifactMeta`] carrying its SHA-256.
//!
//! Layout under the output directory:
//! ```text
//! <output_dir>/
//! ├── filtered-<stamp>.csv
//! ├── summary-<stamp>.json
//! ├── latest.csv
//! ├── latest.json
//! └── projects/
//!     └── <record-id>.md
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use tenderwatch_shared::{MatchedRecord, Result, RunSummary, TenderError, fields};

use crate::render::render_record_markdown;

pub const LATEST_CSV: &str = "latest.csv";
pub const LATEST_JSON: &str = "latest.json";
pub const PROJECTS_DIR: &str = "projects";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Metadata for a single written file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ArtifactMeta {
    pub filename: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Paths of the tabular and summary outputs of one run.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub latest_csv: PathBuf,
    pub latest_json: PathBuf,
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// `YYYYMMDD-HHMMSS`, used in output file names.
pub fn file_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d-%H%M%S").to_string()
}

/// `YYYY-MM-DDTHH:MM:SSZ`, used for `generated_at_utc`.
pub fn summary_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

/// Write the filtered CSV and the summary JSON, each as a timestamped file
/// plus an overwritten `latest` copy with identical bytes.
#[instrument(skip_all, fields(output_dir = %output_dir.display(), rows = records.len()))]
pub fn write_outputs(
    output_dir: &Path,
    source_headers: &[String],
    records: &[MatchedRecord],
    summary: &RunSummary,
    stamp: &str,
) -> Result<(OutputPaths, Vec<ArtifactMeta>)> {
    create_dir(output_dir)?;

    let csv = render_csv(source_headers, records)?;
    let json = render_summary(summary)?;

    let paths = OutputPaths {
        csv: output_dir.join(format!("filtered-{stamp}.csv")),
        json: output_dir.join(format!("summary-{stamp}.json")),
        latest_csv: output_dir.join(LATEST_CSV),
        latest_json: output_dir.join(LATEST_JSON),
    };

    let artifacts = vec![
        write_atomic(&paths.csv, csv.as_bytes())?,
        write_atomic(&paths.json, json.as_bytes())?,
        write_atomic(&paths.latest_csv, csv.as_bytes())?,
        write_atomic(&paths.latest_json, json.as_bytes())?,
    ];

    info!(
        csv = %paths.csv.display(),
        json = %paths.json.display(),
        "outputs written"
    );

    Ok((paths, artifacts))
}

/// Write one Markdown document per record as `<projects_dir>/<id>.md`.
///
/// `ids` must be aligned with `records`.
#[instrument(skip_all, fields(projects_dir = %projects_dir.display(), records = records.len()))]
pub fn write_record_documents(
    projects_dir: &Path,
    records: &[MatchedRecord],
    ids: &[String],
) -> Result<Vec<ArtifactMeta>> {
    if records.len() != ids.len() {
        return Err(TenderError::validation(format!(
            "{} records but {} record ids",
            records.len(),
            ids.len()
        )));
    }

    create_dir(projects_dir)?;

    let mut metas = Vec::with_capacity(records.len());
    for (matched, id) in records.iter().zip(ids) {
        let doc = render_record_markdown(matched);
        metas.push(write_atomic(&projects_dir.join(format!("{id}.md")), doc.as_bytes())?);
    }

    info!(count = metas.len(), "record documents written");
    Ok(metas)
}

/// Header row: source columns in source order, then any derived column the
/// source does not already carry.
pub fn output_headers(source_headers: &[String]) -> Vec<String> {
    let mut headers = source_headers.to_vec();
    for column in fields::DERIVED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            headers.push((*column).to_string());
        }
    }
    headers
}

/// The filtered CSV as a string. The header is present even with no records.
///
/// Source values are taken by position, so repeated source headers keep
/// their own values.
pub fn render_csv(source_headers: &[String], records: &[MatchedRecord]) -> Result<String> {
    let headers = output_headers(source_headers);
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(&headers)
        .map_err(|e| TenderError::validation(format!("CSV header write failed: {e}")))?;

    for matched in records {
        let derived = matched.derived_values();
        let row = headers.iter().enumerate().map(|(index, column)| {
            match fields::DERIVED_COLUMNS.iter().position(|d| d == column) {
                Some(slot) => derived[slot].as_str(),
                None => matched.record.value_at(index),
            }
        });
        writer
            .write_record(row)
            .map_err(|e| TenderError::validation(format!("CSV row write failed: {e}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TenderError::validation(format!("CSV flush failed: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| TenderError::validation(format!("CSV output is not UTF-8: {e}")))
}

/// The run summary as pretty-printed JSON.
pub fn render_summary(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary)
        .map_err(|e| TenderError::validation(format!("JSON serialization failed: {e}")))
}

/// Write `content` to `target` via a temp file and rename, returning its metadata.
pub fn write_atomic(target: &Path, content: &[u8]) -> Result<ArtifactMeta> {
    let filename = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            TenderError::validation(format!("not a file path: {}", target.display()))
        })?;
    let temp = target.with_file_name(format!(".{filename}.tmp"));

    std::fs::write(&temp, content).map_err(|e| TenderError::io(&temp, e))?;
    std::fs::rename(&temp, target).map_err(|e| TenderError::io(target, e))?;

    let mut hasher = Sha256::new();
    hasher.update(content);
    let hash = format!("{:x}", hasher.finalize());

    debug!(file = %filename, size = content.len(), "wrote artifact");

    Ok(ArtifactMeta {
        filename,
        sha256: hash,
        size_bytes: content.len(),
    })
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| TenderError::io(dir, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
