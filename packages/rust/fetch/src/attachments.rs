//! Attachment URL parsing, HEAD verification, and streamed downloads.
//!
//! Nothing in here fails a run: a transport error on a check is recorded as
//! an unknown status, and a failed download is reported as `false`.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use tenderwatch_shared::{AttachmentFields, RawRecord, Result, fields};

use crate::http::build_client;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Outcome bucket of a HEAD check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentStatus {
    /// Answered 200.
    Working,
    /// Answered 404.
    Missing,
    /// Any other status, or no response at all.
    Other,
}

impl AttachmentStatus {
    pub fn classify(status: Option<u16>) -> Self {
        match status {
            Some(200) => Self::Working,
            Some(404) => Self::Missing,
            _ => Self::Other,
        }
    }
}

/// Result of checking a run's attachment URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Status per checked URL; `None` when the request itself failed.
    /// URLs beyond the check limit are absent.
    pub statuses: HashMap<String, Option<u16>>,
    pub ok: usize,
    pub missing: usize,
    pub other: usize,
}

impl CheckReport {
    /// Number of URLs that were checked.
    pub fn checked(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    fn record(&mut self, url: &str, status: Option<u16>) {
        match AttachmentStatus::classify(status) {
            AttachmentStatus::Working => self.ok += 1,
            AttachmentStatus::Missing => self.missing += 1,
            AttachmentStatus::Other => self.other += 1,
        }
        self.statuses.insert(url.to_string(), status);
    }

    /// Whether `url` may be downloaded: unchecked, failed to answer, or answered 200.
    pub fn allows_download(&self, url: &str) -> bool {
        !matches!(self.statuses.get(url), Some(Some(code)) if *code != 200)
    }

    /// Split `urls` into working, missing, and unchecked lists.
    ///
    /// An empty report leaves every list empty so that "not checked" stays
    /// distinguishable from "checked and unreachable".
    pub fn partition(&self, urls: &[String]) -> AttachmentFields {
        let mut fields = AttachmentFields {
            urls: urls.to_vec(),
            ..AttachmentFields::default()
        };
        if self.is_empty() {
            return fields;
        }

        for url in urls {
            let status = self.statuses.get(url).copied().flatten();
            match AttachmentStatus::classify(status) {
                AttachmentStatus::Working => fields.working.push(url.clone()),
                AttachmentStatus::Missing => fields.missing.push(url.clone()),
                AttachmentStatus::Other => fields.unchecked.push(url.clone()),
            }
        }
        fields
    }
}

// ---------------------------------------------------------------------------
// URL parsing
// ---------------------------------------------------------------------------

/// Attachment URLs of one row: English field first, then French, each split
/// on commas. Blank entries are dropped and duplicates keep their first position.
pub fn parse_attachment_urls(record: &RawRecord) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for column in fields::ATTACHMENT_COLUMNS {
        for part in record.get(column).split(',') {
            let url = part.trim();
            if !url.is_empty() && seen.insert(url.to_string()) {
                urls.push(url.to_string());
            }
        }
    }

    urls
}

/// Union of several URL lists, deduplicated in first-seen order.
pub fn collect_unique_urls<'a, I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for list in lists {
        for url in list {
            if seen.insert(url.as_str()) {
                urls.push(url.clone());
            }
        }
    }
    urls
}

// ---------------------------------------------------------------------------
// AttachmentClient
// ---------------------------------------------------------------------------

/// Sequential HEAD checks and downloads sharing one HTTP client.
#[derive(Debug, Clone)]
pub struct AttachmentClient {
    client: Client,
}

impl AttachmentClient {
    /// Create a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }

    /// HEAD `url` and return its status, or `None` if no response arrived.
    pub async fn head_status(&self, url: &str) -> Option<u16> {
        match self.client.head(url).send().await {
            Ok(response) => Some(response.status().as_u16()),
            Err(e) => {
                warn!(url, error = %e, "attachment check failed");
                None
            }
        }
    }

    /// Check `urls` in order, stopping after `limit` URLs when one is given.
    ///
    /// `on_progress` is called with `(checked, total)` after each request.
    #[instrument(skip_all, fields(urls = urls.len(), limit = ?limit))]
    pub async fn check_urls(
        &self,
        urls: &[String],
        limit: Option<usize>,
        mut on_progress: impl FnMut(usize, usize),
    ) -> CheckReport {
        let total = limit.map_or(urls.len(), |l| l.min(urls.len()));
        let mut report = CheckReport::default();

        for url in urls.iter().take(total) {
            let status = self.head_status(url).await;
            debug!(url = url.as_str(), status = ?status, "attachment checked");
            report.record(url, status);
            on_progress(report.checked(), total);
        }

        info!(
            checked = report.checked(),
            ok = report.ok,
            missing = report.missing,
            other = report.other,
            "attachment checks complete"
        );
        report
    }

    /// Stream `url` into `destination`. Returns whether the file was written.
    ///
    /// Bytes go to a sibling `.part` file that is renamed on completion, so a
    /// failed transfer never leaves a truncated file at `destination`.
    #[instrument(skip_all, fields(url = url))]
    pub async fn download(&self, url: &str, destination: &Path) -> bool {
        let partial = partial_path(destination);
        match self.try_download(url, destination, &partial).await {
            Ok(bytes) => {
                debug!(bytes, path = %destination.display(), "attachment downloaded");
                true
            }
            Err(reason) => {
                warn!(reason = %reason, "attachment download failed");
                let _ = tokio::fs::remove_file(&partial).await;
                false
            }
        }
    }

    async fn try_download(
        &self,
        url: &str,
        destination: &Path,
        partial: &Path,
    ) -> std::result::Result<u64, String> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let mut file = tokio::fs::File::create(partial)
            .await
            .map_err(|e| e.to_string())?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
            file.write_all(&chunk).await.map_err(|e| e.to_string())?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| e.to_string())?;
        drop(file);

        tokio::fs::rename(partial, destination)
            .await
            .map_err(|e| e.to_string())?;

        Ok(written)
    }
}

fn partial_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{name}.part"))
}
