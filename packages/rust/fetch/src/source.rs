//! Source resolution: open the tender feed from a local file or a remote URL.

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, instrument};
use url::Url;

use tenderwatch_shared::{Result, TenderError};

use crate::http::build_client;

/// UTF-8 byte-order mark.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Where the feed bytes came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Local(PathBuf),
    Remote(Url),
}

/// A readable feed with any leading BOM already removed.
pub struct SourceStream {
    location: String,
    kind: SourceKind,
    reader: Box<dyn Read + Send>,
}

impl SourceStream {
    /// The literal location this stream was opened from.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }
}

impl std::fmt::Debug for SourceStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceStream")
            .field("location", &self.location)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Read for SourceStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Open `location` as a feed.
///
/// An existing local file is streamed from disk. Anything else is fetched with
/// a GET bounded by `timeout`. Either failure is [`TenderError::SourceUnavailable`].
#[instrument(skip_all, fields(location = %location))]
pub async fn open_source(location: &str, timeout: Duration) -> Result<SourceStream> {
    let path = Path::new(location);
    if path.is_file() {
        return open_local(location, path);
    }

    let url = Url::parse(location).map_err(|e| {
        TenderError::source_unavailable(location, format!("not a local file or valid URL: {e}"))
    })?;

    open_remote(location, url, timeout).await
}

fn open_local(location: &str, path: &Path) -> Result<SourceStream> {
    let file = File::open(path)
        .map_err(|e| TenderError::source_unavailable(location, e.to_string()))?;

    let mut reader = BufReader::new(file);
    skip_bom(&mut reader).map_err(|e| TenderError::source_unavailable(location, e.to_string()))?;

    info!(path = %path.display(), "reading local feed");

    Ok(SourceStream {
        location: location.to_string(),
        kind: SourceKind::Local(path.to_path_buf()),
        reader: Box::new(reader),
    })
}

async fn open_remote(location: &str, url: Url, timeout: Duration) -> Result<SourceStream> {
    let client = build_client(timeout)?;

    info!(%url, timeout_secs = timeout.as_secs(), "fetching remote feed");

    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| TenderError::source_unavailable(location, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(TenderError::source_unavailable(
            location,
            format!("HTTP {status}"),
        ));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| TenderError::source_unavailable(location, format!("body read failed: {e}")))?;

    let text = decode_body(&body);
    debug!(bytes = body.len(), "remote feed downloaded");

    Ok(SourceStream {
        location: location.to_string(),
        kind: SourceKind::Remote(url),
        reader: Box::new(Cursor::new(text.into_bytes())),
    })
}

/// Decode a response body as UTF-8 without its BOM, replacing invalid sequences.
fn decode_body(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Consume a leading BOM from a buffered reader, if present.
fn skip_bom<R: BufRead>(reader: &mut R) -> std::io::Result<()> {
    let has_bom = reader.fill_buf()?.starts_with(UTF8_BOM);
    if has_bom {
        reader.consume(UTF8_BOM.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::http::REFERER_URL;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tw-source-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn read_all(mut stream: SourceStream) -> String {
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn decode_body_strips_bom() {
        assert_eq!(decode_body(b"\xEF\xBB\xBFa,b\n"), "a,b\n");
        assert_eq!(decode_body(b"a,b\n"), "a,b\n");
    }

    #[test]
    fn decode_body_replaces_invalid_utf8() {
        let decoded = decode_body(b"caf\xE9");
        assert!(decoded.starts_with("caf"));
    }

    #[tokio::test]
    async fn local_file_is_read_without_bom() {
        let dir = temp_dir();
        let path = dir.join("feed.csv");
        std::fs::write(&path, b"\xEF\xBB\xBFtitle\nSteel\n").unwrap();

        let stream = open_source(path.to_str().unwrap(), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(matches!(stream.kind(), SourceKind::Local(_)));
        assert_eq!(read_all(stream), "title\nSteel\n");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_path_is_source_unavailable() {
        let err = open_source("/definitely/not/here.csv", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, TenderError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn remote_feed_sends_browser_headers() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/open.csv"))
            .and(wiremock::matchers::header_exists("user-agent"))
            .and(wiremock::matchers::header("referer", REFERER_URL))
            .and(wiremock::matchers::header("accept", "*/*"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_bytes(b"\xEF\xBB\xBFtitle\nTimber\n".to_vec()),
            )
            .mount(&server)
            .await;

        let location = format!("{}/open.csv", server.uri());
        let stream = open_source(&location, Duration::from_secs(5)).await.unwrap();
        assert!(matches!(stream.kind(), SourceKind::Remote(_)));
        assert_eq!(stream.location(), location);
        assert_eq!(read_all(stream), "title\nTimber\n");
    }

    #[tokio::test]
    async fn remote_error_status_is_source_unavailable() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let location = format!("{}/open.csv", server.uri());
        let err = open_source(&location, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(err.is_fatal_precondition());
    }
}
