//! Shared types, error model, and configuration for tenderwatch.
//!
//! This crate is the foundation depended on by all other tenderwatch crates.
//! It provides:
//! - [`TenderError`]: the unified error type
//! - Domain types ([`RawRecord`], [`MatchedRecord`], [`RunSummary`])
//! - Feed column names and bilingual fallbacks ([`fields`])
//! - Configuration ([`PipelineConfig`], [`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod fields;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, FiltersConfig, IndustryConfig, PipelineConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, load_pipeline_config,
};
pub use error::{Result, TenderError};
pub use fields::FieldFallback;
pub use types::{
    AttachmentFields, MatchProvenance, MatchSource, MatchedRecord, RawRecord, RunSummary,
    split_list,
};
