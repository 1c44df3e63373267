//! Run orchestration for tenderwatch.
//!
//! This crate ties together source resolution, matching, sorting, attachment
//! verification, and artifact writing into one batch run ([`run_pipeline`]),
//! and reads the latest run back for search ([`results`]).

pub mod pipeline;
pub mod results;
pub mod sort;

pub use pipeline::{ATTACHMENTS_DIR, RunOptions, RunOutcome, limit_from_count, run_pipeline};
pub use results::{
    DEFAULT_MAX_RESULTS, LatestRun, ResultFilter, SearchResponse, TenderBrief, filter_results,
    find_by_reference, load_latest, search,
};
pub use sort::{parse_closing_date, sort_records};

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each evaluated row.
    fn row_processed(&self, processed: usize, matched: usize);
    /// Called after each attachment HEAD check.
    fn attachment_checked(&self, current: usize, total: usize);
    /// Called after each successful download.
    fn attachment_downloaded(&self, url: &str, downloaded: usize);
    /// Called when the run completes.
    fn done(&self, outcome: &RunOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn row_processed(&self, _processed: usize, _matched: usize) {}
    fn attachment_checked(&self, _current: usize, _total: usize) {}
    fn attachment_downloaded(&self, _url: &str, _downloaded: usize) {}
    fn done(&self, _outcome: &RunOutcome) {}
}
