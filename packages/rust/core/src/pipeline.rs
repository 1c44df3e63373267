//! End-to-end run: source → match → sort → attachments → artifacts.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use tenderwatch_artifacts::{
    ArtifactMeta, PROJECTS_DIR, assign_record_ids, attachment_filename, file_stamp,
    summary_timestamp, write_outputs, write_record_documents,
};
use tenderwatch_fetch::{
    AttachmentClient, CheckReport, collect_unique_urls, open_source, parse_attachment_urls,
};
use tenderwatch_matcher::Matcher;
use tenderwatch_shared::{
    AttachmentFields, DefaultsConfig, MatchedRecord, PipelineConfig, RawRecord, Result,
    RunSummary, TenderError,
};

use crate::ProgressReporter;
use crate::sort::sort_records;

/// Directory under the output root that receives downloaded attachments.
pub const ATTACHMENTS_DIR: &str = "attachments";

/// Caller-supplied parameters of one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Regions, industries, and source aliases.
    pub config: PipelineConfig,
    /// Logical source key (`open`, `new`), local path, or URL.
    pub source: String,
    /// Root directory for every output file.
    pub output_dir: PathBuf,
    /// Stop after evaluating this many rows.
    pub max_rows: Option<usize>,
    /// HEAD-check attachment URLs.
    pub check_attachments: bool,
    /// Check at most this many unique URLs.
    pub attachment_check_limit: Option<usize>,
    /// Timeout for each attachment check or download.
    pub attachment_timeout: Duration,
    /// Timeout for the primary feed fetch.
    pub source_timeout: Duration,
    /// Download attachments. Implies `check_attachments`.
    pub download_attachments: bool,
    /// Download at most this many attachments across the run.
    pub download_limit: Option<usize>,
}

impl RunOptions {
    /// Options with checking and downloading off and the default timeouts.
    pub fn new(config: PipelineConfig, source: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        let defaults = DefaultsConfig::default();
        Self {
            config,
            source: source.into(),
            output_dir: output_dir.into(),
            max_rows: None,
            check_attachments: false,
            attachment_check_limit: None,
            attachment_timeout: Duration::from_secs(defaults.attachment_timeout_secs),
            source_timeout: Duration::from_secs(defaults.source_timeout_secs),
            download_attachments: false,
            download_limit: limit_from_count(defaults.download_limit),
        }
    }

    /// Whether attachment URLs get HEAD-checked in this run.
    pub fn checks_attachments(&self) -> bool {
        self.check_attachments || self.download_attachments
    }
}

/// Map a `0 = unlimited` count to an optional limit.
pub fn limit_from_count(count: usize) -> Option<usize> {
    (count > 0).then_some(count)
}

/// Result of a completed run.
#[derive(Debug)]
pub struct RunOutcome {
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
    pub latest_csv: PathBuf,
    pub latest_json: PathBuf,
    pub projects_dir: PathBuf,
    pub summary: RunSummary,
    /// Every file written, with its SHA-256.
    pub artifacts: Vec<ArtifactMeta>,
    pub elapsed: Duration,
}

/// Run the pipeline once.
///
/// 1. Resolve and open the source
/// 2. Match every row against regions, code rules, and keywords
/// 3. Sort the matched records
/// 4. Check, then optionally download, attachment URLs
/// 5. Write per-record documents, the CSV, and the summary
///
/// Only a missing source is fatal here; per-row and per-URL failures are
/// absorbed into the summary.
#[instrument(skip_all, fields(source = %options.source, output_dir = %options.output_dir.display()))]
pub async fn run_pipeline(
    options: &RunOptions,
    progress: &dyn ProgressReporter,
) -> Result<RunOutcome> {
    let start = Instant::now();

    // --- Phase 1: Rules ---
    progress.phase("Compiling rules");
    let matcher = Matcher::new(&options.config);
    let location = options.config.resolve_source(&options.source);

    info!(
        %location,
        rules = matcher.rules().len(),
        regions = options.config.regions().len(),
        "starting run"
    );

    // --- Phase 2: Read and match ---
    progress.phase("Reading source");
    let stream = open_source(&location, options.source_timeout).await?;

    let mut summary = RunSummary::new(location.clone(), &options.config.regions());
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(stream);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| TenderError::source_unavailable(&location, format!("unreadable header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut matched: Vec<MatchedRecord> = Vec::new();
    for result in reader.records() {
        if options.max_rows.is_some_and(|max| summary.processed_total >= max) {
            debug!(max_rows = ?options.max_rows, "row cap reached");
            break;
        }

        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "skipping malformed row");
                summary.rows_skipped += 1;
                continue;
            }
        };

        let record = RawRecord::from_pairs(headers.iter().map(String::as_str).zip(row.iter()));
        summary.processed_total += 1;

        if let Some(provenance) = matcher.evaluate(&record) {
            summary.record_match(&provenance);
            let attachments = AttachmentFields {
                urls: parse_attachment_urls(&record),
                ..AttachmentFields::default()
            };
            matched.push(MatchedRecord {
                record,
                provenance,
                attachments,
            });
        }
        progress.row_processed(summary.processed_total, matched.len());
    }

    info!(
        processed = summary.processed_total,
        matched = summary.matched_total,
        skipped = summary.rows_skipped,
        "source read"
    );

    // --- Phase 3: Sort ---
    sort_records(&mut matched);
    let ids = assign_record_ids(&matched);

    // --- Phase 4: Attachments ---
    let urls = collect_unique_urls(matched.iter().map(|m| m.attachments.urls.as_slice()));
    summary.attachment_urls_total = urls.len();

    if options.checks_attachments() && !urls.is_empty() {
        let client = AttachmentClient::new(options.attachment_timeout)?;

        progress.phase("Checking attachments");
        let report = client
            .check_urls(&urls, options.attachment_check_limit, |current, total| {
                progress.attachment_checked(current, total)
            })
            .await;

        summary.attachment_urls_checked = report.checked();
        summary.attachment_urls_ok = report.ok;
        summary.attachment_urls_missing = report.missing;
        summary.attachment_urls_other = report.other;

        for record in &mut matched {
            record.attachments = report.partition(&record.attachments.urls);
        }

        if options.download_attachments {
            progress.phase("Downloading attachments");
            download_attachments(&client, &report, options, &mut matched, &ids, &mut summary, progress)
                .await;
        }
    }

    // --- Phase 5: Write ---
    progress.phase("Writing outputs");
    let now = Utc::now();
    summary.output_rows = matched.len();
    summary.generated_at_utc = summary_timestamp(now);

    let projects_dir = options.output_dir.join(PROJECTS_DIR);
    let mut artifacts = write_record_documents(&projects_dir, &matched, &ids)?;
    summary.markdown_count = artifacts.len();
    summary.markdown_dir = display_absolute(&projects_dir);

    let (paths, outputs) = write_outputs(
        &options.output_dir,
        &headers,
        &matched,
        &summary,
        &file_stamp(now),
    )?;
    artifacts.extend(outputs);

    let outcome = RunOutcome {
        csv_path: paths.csv,
        json_path: paths.json,
        latest_csv: paths.latest_csv,
        latest_json: paths.latest_json,
        projects_dir,
        summary,
        artifacts,
        elapsed: start.elapsed(),
    };

    progress.done(&outcome);

    info!(
        matched = outcome.summary.matched_total,
        documents = outcome.summary.markdown_count,
        downloaded = outcome.summary.attachment_downloaded,
        elapsed_ms = outcome.elapsed.as_millis(),
        "run complete"
    );

    Ok(outcome)
}

/// Download each record's attachments in output order under a run-wide budget.
///
/// URLs whose check returned anything but 200 are skipped; the budget only
/// shrinks on success.
async fn download_attachments(
    client: &AttachmentClient,
    report: &CheckReport,
    options: &RunOptions,
    records: &mut [MatchedRecord],
    ids: &[String],
    summary: &mut RunSummary,
    progress: &dyn ProgressReporter,
) {
    let mut remaining = options.download_limit;
    let root = options.output_dir.join(ATTACHMENTS_DIR);

    for (record, id) in records.iter_mut().zip(ids) {
        let urls = record.attachments.urls.clone();
        for url in urls {
            if remaining == Some(0) {
                break;
            }
            if !report.allows_download(&url) {
                continue;
            }

            let destination = root.join(id).join(attachment_filename(&url));
            summary.attachment_download_attempted += 1;

            if client.download(&url, &destination).await {
                summary.attachment_downloaded += 1;
                record.attachments.downloaded.push(url.clone());
                remaining = remaining.map(|n| n - 1);
                progress.attachment_downloaded(&url, summary.attachment_downloaded);
            }
        }
    }

    info!(
        attempted = summary.attachment_download_attempted,
        downloaded = summary.attachment_downloaded,
        "attachment downloads complete"
    );
}

fn display_absolute(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    use tenderwatch_shared::{fields, load_pipeline_config};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use std::sync::Mutex;

    use crate::SilentProgress;
    use crate::results::load_latest;

    const DOCS_HOST: &str = "https://canadabuys.canada.ca/docs";

    fn fixture_path(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name)
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tw-pipeline-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fixture_options(source: &Path, output_dir: &Path) -> RunOptions {
        let config = load_pipeline_config(&fixture_path("json/config.fixture.json")).unwrap();
        RunOptions::new(config, source.to_str().unwrap(), output_dir)
    }

    /// The fixture feed with attachment URLs pointed at `server`.
    fn feed_for(server: &MockServer, dir: &Path) -> PathBuf {
        let feed = std::fs::read_to_string(fixture_path("csv/tenders.fixture.csv")).unwrap();
        let feed = feed.replace(DOCS_HOST, &format!("{}/docs", server.uri()));
        let path = dir.join("feed.csv");
        std::fs::write(&path, feed).unwrap();
        path
    }

    fn row_of<'a>(rows: &'a [RawRecord], reference: &str, amendment: &str) -> &'a RawRecord {
        rows.iter()
            .find(|r| {
                r.get(fields::REFERENCE_NUMBER) == reference
                    && r.get(fields::AMENDMENT_NUMBER) == amendment
            })
            .unwrap_or_else(|| panic!("no row {reference}/{amendment}"))
    }

    fn order(rows: &[RawRecord]) -> Vec<String> {
        rows.iter()
            .map(|r| {
                let amendment = r.get(fields::AMENDMENT_NUMBER);
                if amendment.is_empty() {
                    r.get(fields::REFERENCE_NUMBER).to_string()
                } else {
                    format!("{}#{amendment}", r.get(fields::REFERENCE_NUMBER))
                }
            })
            .collect()
    }

    #[test]
    fn zero_count_means_unlimited() {
        assert_eq!(limit_from_count(0), None);
        assert_eq!(limit_from_count(3), Some(3));
    }

    #[test]
    fn downloads_imply_checks() {
        let mut options = RunOptions::new(PipelineConfig::default(), "open", "out");
        assert!(!options.checks_attachments());
        options.download_attachments = true;
        assert!(options.checks_attachments());
        assert_eq!(options.download_limit, Some(10));
        assert_eq!(options.attachment_timeout, Duration::from_secs(20));
    }

    #[tokio::test]
    async fn unavailable_source_writes_nothing() {
        let dir = std::env::temp_dir().join(format!("tw-pipeline-test-{}", uuid::Uuid::now_v7()));
        let options = RunOptions::new(
            PipelineConfig::default(),
            "/definitely/not/here.csv",
            dir.join("out"),
        );

        let err = run_pipeline(&options, &SilentProgress).await.unwrap_err();
        assert!(err.is_fatal_precondition());
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn fixture_run_matches_sorts_and_counts() {
        let dir = temp_dir();
        let out = dir.join("out");
        let options = fixture_options(&fixture_path("csv/tenders.fixture.csv"), &out);

        let outcome = run_pipeline(&options, &SilentProgress).await.unwrap();
        let summary = &outcome.summary;

        assert_eq!(summary.processed_total, 6);
        assert_eq!(summary.matched_total, 4);
        assert_eq!(summary.output_rows, 4);
        assert_eq!(summary.rows_skipped, 0);
        assert_eq!(summary.industry_counts["steel"], 3);
        assert_eq!(summary.industry_counts["lumber"], 1);
        assert_eq!(summary.match_sources["classification-code"], 2);
        assert_eq!(summary.match_sources["keyword"], 3);
        assert_eq!(summary.regions, vec!["Alberta"]);
        assert_eq!(summary.attachment_urls_total, 2);
        assert_eq!(summary.attachment_urls_checked, 0);
        assert_eq!(summary.markdown_count, 4);
        assert_eq!(outcome.artifacts.len(), 8);

        let latest = load_latest(&out).unwrap();
        let rows = latest.rows.unwrap();
        assert_eq!(
            order(&rows),
            vec!["PW-24-004#001", "PW-24-004", "PW-24-001", "PW-24-003"]
        );
        assert_eq!(latest.summary.unwrap(), outcome.summary);

        // code-only match through the 301500 prefix rule
        let beams = row_of(&rows, "PW-24-001", "");
        assert_eq!(beams.get(fields::MATCH_SOURCES), "classification-code");
        assert_eq!(beams.get(fields::MATCH_CODES), "301500");
        assert_eq!(beams.get(fields::MATCH_CATEGORIES), "steel:macro");
        assert_eq!(beams.get(fields::MATCH_KEYWORDS), "");
        assert_eq!(beams.get(fields::MATCH_REGIONS), "Alberta");

        let bridge = row_of(&rows, "PW-24-003", "");
        assert_eq!(bridge.get(fields::MATCH_SOURCES), "keyword");
        assert_eq!(bridge.get(fields::MATCH_INDUSTRIES), "lumber");
        assert_eq!(bridge.get(fields::MATCH_KEYWORDS), "timber");

        let plate = row_of(&rows, "PW-24-004", "");
        assert_eq!(plate.get(fields::MATCH_SOURCES), "classification-code;keyword");
        assert_eq!(plate.get(fields::MATCH_CODES), "30102404;31160000");
        assert_eq!(
            plate.get(fields::ATTACHMENT_URLS),
            format!("{DOCS_HOST}/pw-24-004/spec.pdf;{DOCS_HOST}/pw-24-004/drawings.pdf")
        );
        assert_eq!(plate.get(fields::ATTACHMENT_WORKING), "");

        // the region gate drops the Ontario notice and the Alberta notice with no hit
        assert!(rows.iter().all(|r| r.get(fields::REFERENCE_NUMBER) != "PW-24-002"));
        assert!(rows.iter().all(|r| r.get(fields::REFERENCE_NUMBER) != "PW-24-005"));

        let projects = out.join(PROJECTS_DIR);
        let original = std::fs::read_to_string(projects.join("PW-24-004.md")).unwrap();
        let amended =
            std::fs::read_to_string(projects.join("PW-24-004-amendment-001.md")).unwrap();
        assert_ne!(original, amended);
        assert!(original.contains("- Attachments found but not checked. Run with --check-attachments."));
        assert!(projects.join("PW-24-001.md").is_file());
        assert!(projects.join("PW-24-003.md").is_file());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn row_cap_counts_only_evaluated_rows() {
        let dir = temp_dir();
        let mut options = fixture_options(&fixture_path("csv/tenders.fixture.csv"), &dir);
        options.max_rows = Some(2);

        let outcome = run_pipeline(&options, &SilentProgress).await.unwrap();
        assert_eq!(outcome.summary.processed_total, 2);
        assert_eq!(outcome.summary.matched_total, 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    /// Records every `row_processed` call.
    #[derive(Default)]
    struct RowCounts {
        rows: Mutex<Vec<(usize, usize)>>,
    }

    impl ProgressReporter for RowCounts {
        fn phase(&self, _name: &str) {}
        fn row_processed(&self, processed: usize, matched: usize) {
            self.rows.lock().unwrap().push((processed, matched));
        }
        fn attachment_checked(&self, _current: usize, _total: usize) {}
        fn attachment_downloaded(&self, _url: &str, _downloaded: usize) {}
        fn done(&self, _outcome: &RunOutcome) {}
    }

    #[tokio::test]
    async fn row_progress_includes_the_current_match() {
        let dir = temp_dir();
        let mut options = fixture_options(&fixture_path("csv/tenders.fixture.csv"), &dir);
        options.max_rows = Some(3);

        let progress = RowCounts::default();
        run_pipeline(&options, &progress).await.unwrap();
        assert_eq!(*progress.rows.lock().unwrap(), vec![(1, 1), (2, 1), (3, 2)]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn malformed_rows_are_skipped_and_counted() {
        let dir = temp_dir();
        let header = format!("{},{},{}", fields::TITLE_EN, fields::DELIVERY_REGION_EN, fields::UNSPSC);
        let mut feed = format!("{header}\nSteel beams,Alberta,*30150000\n").into_bytes();
        feed.extend_from_slice(b"Bad \xff\xfe row,Alberta,*30150000\n");
        feed.extend_from_slice(b"Timber decking,Alberta,*43211500\n");
        let source = dir.join("feed.csv");
        std::fs::write(&source, feed).unwrap();

        let out = dir.join("out");
        let outcome = run_pipeline(&fixture_options(&source, &out), &SilentProgress)
            .await
            .unwrap();
        let summary = &outcome.summary;
        assert_eq!(summary.processed_total, 2);
        assert_eq!(summary.matched_total, 2);
        assert_eq!(summary.rows_skipped, 1);
        assert_eq!(summary.industry_counts["steel"], 1);
        assert_eq!(summary.industry_counts["lumber"], 1);

        let back = load_latest(&out).unwrap().summary.unwrap();
        assert_eq!(back.rows_skipped, 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn rerun_reproduces_outputs() {
        let dir = temp_dir();
        let options = fixture_options(&fixture_path("csv/tenders.fixture.csv"), &dir);

        let first = run_pipeline(&options, &SilentProgress).await.unwrap();
        let first_csv = std::fs::read(&first.latest_csv).unwrap();
        let first_doc = std::fs::read(dir.join(PROJECTS_DIR).join("PW-24-004.md")).unwrap();

        let second = run_pipeline(&options, &SilentProgress).await.unwrap();
        assert_eq!(std::fs::read(&second.latest_csv).unwrap(), first_csv);
        assert_eq!(
            std::fs::read(dir.join(PROJECTS_DIR).join("PW-24-004.md")).unwrap(),
            first_doc
        );

        let mut a = first.summary.clone();
        let mut b = second.summary.clone();
        a.generated_at_utc.clear();
        b.generated_at_utc.clear();
        assert_eq!(a, b);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn empty_match_set_still_writes_header() {
        let dir = temp_dir();
        let mut options = fixture_options(&fixture_path("csv/tenders.fixture.csv"), &dir);
        options.config.filters.regions = vec!["Nunavut".into()];

        let outcome = run_pipeline(&options, &SilentProgress).await.unwrap();
        assert_eq!(outcome.summary.matched_total, 0);
        assert_eq!(outcome.summary.processed_total, 6);

        let csv = std::fs::read_to_string(&outcome.latest_csv).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with(fields::TITLE_EN));
        assert!(csv.trim_end().ends_with(fields::ATTACHMENT_DOWNLOADED));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn attachments_are_checked_and_downloaded() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/docs/pw-24-004/spec.pdf"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/docs/pw-24-004/drawings.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/pw-24-004/spec.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF spec".to_vec()))
            .mount(&server)
            .await;

        let dir = temp_dir();
        let feed = feed_for(&server, &dir);
        let out = dir.join("out");
        let mut options = fixture_options(&feed, &out);
        options.download_attachments = true;
        options.download_limit = None;
        options.attachment_timeout = Duration::from_secs(5);

        let outcome = run_pipeline(&options, &SilentProgress).await.unwrap();
        let summary = &outcome.summary;
        assert_eq!(summary.attachment_urls_total, 2);
        assert_eq!(summary.attachment_urls_checked, 2);
        assert_eq!(summary.attachment_urls_ok, 1);
        assert_eq!(summary.attachment_urls_missing, 1);
        assert_eq!(summary.attachment_urls_other, 0);
        assert_eq!(summary.attachment_download_attempted, 1);
        assert_eq!(summary.attachment_downloaded, 1);

        let saved = out.join(ATTACHMENTS_DIR).join("PW-24-004").join("spec.pdf");
        assert_eq!(std::fs::read(&saved).unwrap(), b"%PDF spec");

        let spec = format!("{}/docs/pw-24-004/spec.pdf", server.uri());
        let drawings = format!("{}/docs/pw-24-004/drawings.pdf", server.uri());
        let rows = load_latest(&out).unwrap().rows.unwrap();
        let plate = row_of(&rows, "PW-24-004", "");
        assert_eq!(plate.get(fields::ATTACHMENT_WORKING), spec);
        assert_eq!(plate.get(fields::ATTACHMENT_MISSING), drawings);
        assert_eq!(plate.get(fields::ATTACHMENT_UNCHECKED), "");
        assert_eq!(plate.get(fields::ATTACHMENT_DOWNLOADED), spec);

        let doc = std::fs::read_to_string(out.join(PROJECTS_DIR).join("PW-24-004.md")).unwrap();
        assert!(doc.contains(&format!("- [spec.pdf]({spec})")));
        assert!(doc.contains("- Missing: 1"));
        assert!(doc.contains("- Downloaded: 1"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn failed_downloads_do_not_spend_the_budget() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/pw-24-004/spec.pdf"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/pw-24-004/drawings.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF drawings".to_vec()))
            .mount(&server)
            .await;

        let dir = temp_dir();
        let feed = feed_for(&server, &dir);
        let mut options = fixture_options(&feed, &dir.join("out"));
        options.download_attachments = true;
        options.download_limit = Some(1);
        options.attachment_check_limit = Some(1);

        let outcome = run_pipeline(&options, &SilentProgress).await.unwrap();
        let summary = &outcome.summary;
        assert_eq!(summary.attachment_urls_checked, 1);
        assert_eq!(summary.attachment_download_attempted, 2);
        assert_eq!(summary.attachment_downloaded, 1);

        let rows = load_latest(&dir.join("out")).unwrap().rows.unwrap();
        let plate = row_of(&rows, "PW-24-004", "");
        let drawings = format!("{}/docs/pw-24-004/drawings.pdf", server.uri());
        assert_eq!(plate.get(fields::ATTACHMENT_UNCHECKED), drawings);
        assert_eq!(plate.get(fields::ATTACHMENT_DOWNLOADED), drawings);
        assert!(!dir.join("out").join(ATTACHMENTS_DIR).join("PW-24-004").join("spec.pdf").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
