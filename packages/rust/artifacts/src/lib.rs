//! Output artifacts for tenderwatch runs.
//!
//! This crate provides:
//! - [`ids`]: filesystem-safe record identifiers and attachment file names
//! - [`render`]: the per-record Markdown document
//! - [`writer`]: atomic CSV/JSON/document writes with SHA-256 metadata

pub mod ids;
pub mod render;
pub mod writer;

pub use ids::{
    DEFAULT_FILENAME, assign_record_ids, attachment_filename, filename_from_url, record_id,
    sanitize_filename,
};
pub use render::render_record_markdown;
pub use writer::{
    ArtifactMeta, LATEST_CSV, LATEST_JSON, OutputPaths, PROJECTS_DIR, file_stamp, output_headers,
    render_csv, render_summary, summary_timestamp, write_atomic, write_outputs,
    write_record_documents,
};
