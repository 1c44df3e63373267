//! Network and file access for tenderwatch.
//!
//! This crate provides:
//! - [`source`]: opens the tender feed from a local path or a remote URL
//! - [`attachments`]: parses attachment URLs, checks them with HEAD, downloads them
//! - [`http`]: the shared client with the headers the feed host expects

pub mod attachments;
pub mod http;
pub mod source;

pub use attachments::{
    AttachmentClient, AttachmentStatus, CheckReport, collect_unique_urls, parse_attachment_urls,
};
pub use http::build_client;
pub use source::{SourceKind, SourceStream, open_source};
