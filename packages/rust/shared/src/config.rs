//! Configuration for tenderwatch.
//!
//! Two layers:
//! - The pipeline configuration (`config.json`): feed locations, region filter,
//!   and per-industry classification codes and keywords. Required for every run.
//! - User defaults at `~/.tenderwatch/tenderwatch.toml`. CLI flags override
//!   config file values, which override built-in defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TenderError};

/// Default user config file name.
const CONFIG_FILE_NAME: &str = "tenderwatch.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".tenderwatch";

/// Logical source keys accepted on the command line, and the `sources` entry each maps to.
const SOURCE_ALIASES: &[(&str, &str)] = &[("open", "open_tenders_csv"), ("new", "new_tenders_csv")];

// ---------------------------------------------------------------------------
// Pipeline config (config.json)
// ---------------------------------------------------------------------------

/// The pipeline configuration, deserialized from JSON. Immutable for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Logical feed name → URL or path.
    #[serde(default)]
    pub sources: BTreeMap<String, String>,

    /// Record filters applied before industry matching.
    #[serde(default)]
    pub filters: FiltersConfig,

    /// Industry name → codes and keywords.
    #[serde(default)]
    pub industries: BTreeMap<String, IndustryConfig>,
}

/// `filters` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FiltersConfig {
    /// Region names tested as case-insensitive substrings of the region fields.
    #[serde(default)]
    pub regions: Vec<String>,
}

/// One entry of the `industries` map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndustryConfig {
    /// Broad category codes (usually `0`-suffixed).
    #[serde(default)]
    pub macro_unspsc: Vec<String>,

    /// Commodity-level codes.
    #[serde(default)]
    pub commodity_unspsc: Vec<String>,

    /// Feeder type → codes for upstream supply categories.
    #[serde(default)]
    pub feeders: BTreeMap<String, Vec<String>>,

    /// Free-text keywords matched against titles and descriptions.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl PipelineConfig {
    /// Configured regions, with blank entries dropped.
    pub fn regions(&self) -> Vec<&str> {
        self.filters
            .regions
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .collect()
    }

    /// Industry name → non-blank keywords.
    pub fn keyword_map(&self) -> BTreeMap<&str, Vec<&str>> {
        self.industries
            .iter()
            .map(|(name, industry)| {
                let keywords = industry
                    .keywords
                    .iter()
                    .map(|k| k.trim())
                    .filter(|k| !k.is_empty())
                    .collect();
                (name.as_str(), keywords)
            })
            .collect()
    }

    /// Map a source selector to a literal location.
    ///
    /// `open` and `new` resolve through `sources.open_tenders_csv` and
    /// `sources.new_tenders_csv`; any other key present in `sources` resolves
    /// to its value; anything else is returned unchanged as a path or URL.
    pub fn resolve_source(&self, selector: &str) -> String {
        let key = SOURCE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == selector)
            .map(|(_, key)| *key)
            .unwrap_or(selector);

        match self.sources.get(key) {
            Some(location) => location.clone(),
            None => selector.to_string(),
        }
    }
}

/// Load the pipeline configuration. A missing file is a fatal config error.
pub fn load_pipeline_config(path: &Path) -> Result<PipelineConfig> {
    if !path.is_file() {
        return Err(TenderError::config(format!(
            "config not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| TenderError::io(path, e))?;

    let config: PipelineConfig = serde_json::from_str(&content).map_err(|e| {
        TenderError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    tracing::debug!(
        ?path,
        regions = config.filters.regions.len(),
        industries = config.industries.len(),
        "pipeline config loaded"
    );

    Ok(config)
}

// ---------------------------------------------------------------------------
// User defaults (tenderwatch.toml)
// ---------------------------------------------------------------------------

/// Top-level user config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Run defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Path to the pipeline `config.json`.
    #[serde(default = "default_config_path")]
    pub config_path: String,

    /// Source selector: a logical key (`open`, `new`), a path, or a URL.
    #[serde(default = "default_source")]
    pub source: String,

    /// Output directory for CSV, JSON, and per-record documents.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Timeout in seconds for each attachment check or download.
    #[serde(default = "default_attachment_timeout")]
    pub attachment_timeout_secs: u64,

    /// Timeout in seconds for the primary feed fetch.
    #[serde(default = "default_source_timeout")]
    pub source_timeout_secs: u64,

    /// Maximum attachments to download per run (0 = no limit).
    #[serde(default = "default_download_limit")]
    pub download_limit: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            config_path: default_config_path(),
            source: default_source(),
            output_dir: default_output_dir(),
            attachment_timeout_secs: default_attachment_timeout(),
            source_timeout_secs: default_source_timeout(),
            download_limit: default_download_limit(),
        }
    }
}

fn default_config_path() -> String {
    "pipelines/canadabuys/config.json".into()
}
fn default_source() -> String {
    "open".into()
}
fn default_output_dir() -> String {
    "output/canadabuys".into()
}
fn default_attachment_timeout() -> u64 {
    20
}
fn default_source_timeout() -> u64 {
    120
}
fn default_download_limit() -> usize {
    10
}

/// Get the path to the config directory (`~/.tenderwatch/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TenderError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.tenderwatch/tenderwatch.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the user config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the user config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TenderError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| TenderError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TenderError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TenderError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TenderError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
