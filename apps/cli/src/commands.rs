//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use tenderwatch_core::{
    ProgressReporter, ResultFilter, RunOptions, RunOutcome, find_by_reference, limit_from_count,
    load_latest, run_pipeline, search,
};
use tenderwatch_shared::{
    AppConfig, DefaultsConfig, PipelineConfig, init_config, load_config, load_pipeline_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// tenderwatch: match public tender notices against industry profiles.
#[derive(Parser)]
#[command(
    name = "tenderwatch",
    version,
    about = "Filter a public tender feed by region, classification code, and keyword.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the pipeline once and write CSV, JSON, and per-record documents.
    Run(RunArgs),

    /// Search the latest results.
    Search {
        /// Keep tenders matched to this industry (repeatable).
        #[arg(long = "industry")]
        industries: Vec<String>,

        /// Keep tenders matched in this region (repeatable).
        #[arg(long = "region")]
        regions: Vec<String>,

        /// Keep tenders whose status contains this text.
        #[arg(long)]
        status: Option<String>,

        /// Maximum number of tenders to return.
        #[arg(long, default_value_t = tenderwatch_core::DEFAULT_MAX_RESULTS)]
        max_results: usize,

        /// Output directory of the run to search.
        #[arg(long)]
        output_dir: Option<String>,
    },

    /// Print every field of one tender from the latest results.
    Show {
        /// Exact reference number.
        reference: String,

        /// Output directory of the run to read.
        #[arg(long)]
        output_dir: Option<String>,
    },

    /// Print the summary of the latest run.
    Summary {
        /// Output directory of the run to read.
        #[arg(long)]
        output_dir: Option<String>,
    },

    /// List the industries configured in the pipeline config.
    Industries {
        /// Path to the pipeline config.json.
        #[arg(long)]
        config: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags of `tenderwatch run`. Unset values come from `tenderwatch.toml`.
#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Path to the pipeline config.json.
    #[arg(long)]
    pub config: Option<String>,

    /// Source: `open`, `new`, a local CSV path, or a URL.
    #[arg(long)]
    pub source: Option<String>,

    /// Directory for CSV, JSON, and per-record documents.
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Stop after evaluating this many rows.
    #[arg(long)]
    pub max_rows: Option<usize>,

    /// HEAD-check attachment URLs.
    #[arg(long)]
    pub check_attachments: bool,

    /// Check only the first N unique attachment URLs (0 = no limit).
    #[arg(long, default_value_t = 0)]
    pub attachment_check_limit: usize,

    /// Timeout in seconds for each attachment request.
    #[arg(long)]
    pub attachment_timeout: Option<u64>,

    /// Timeout in seconds for fetching the source feed.
    #[arg(long)]
    pub source_timeout: Option<u64>,

    /// Download attachments (implies --check-attachments).
    #[arg(long)]
    pub download_attachments: bool,

    /// Maximum number of attachments to download (0 = no limit).
    #[arg(long)]
    pub download_limit: Option<usize>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout stays
/// machine-readable.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "tenderwatch=info",
        1 => "tenderwatch=debug",
        _ => "tenderwatch=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(&args).await,
        Command::Search {
            industries,
            regions,
            status,
            max_results,
            output_dir,
        } => {
            let filter = ResultFilter {
                industries,
                regions,
                status,
                max_results,
            };
            cmd_search(&filter, output_dir.as_deref())
        }
        Command::Show {
            reference,
            output_dir,
        } => cmd_show(&reference, output_dir.as_deref()),
        Command::Summary { output_dir } => cmd_summary(output_dir.as_deref()),
        Command::Industries { config } => cmd_industries(config.as_deref()),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Merge `run` flags over the user defaults.
pub(crate) fn build_run_options(
    args: &RunArgs,
    defaults: &DefaultsConfig,
    config: PipelineConfig,
) -> RunOptions {
    let source = args.source.clone().unwrap_or_else(|| defaults.source.clone());
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| defaults.output_dir.clone());

    let mut options = RunOptions::new(config, source, output_dir);
    options.max_rows = args.max_rows;
    options.check_attachments = args.check_attachments || args.download_attachments;
    options.attachment_check_limit = limit_from_count(args.attachment_check_limit);
    options.attachment_timeout = Duration::from_secs(
        args.attachment_timeout
            .unwrap_or(defaults.attachment_timeout_secs),
    );
    options.source_timeout =
        Duration::from_secs(args.source_timeout.unwrap_or(defaults.source_timeout_secs));
    options.download_attachments = args.download_attachments;
    options.download_limit =
        limit_from_count(args.download_limit.unwrap_or(defaults.download_limit));
    options
}

async fn cmd_run(args: &RunArgs) -> Result<()> {
    let app_config = load_config()?;
    let defaults = &app_config.defaults;

    let config_path = PathBuf::from(
        args.config
            .clone()
            .unwrap_or_else(|| defaults.config_path.clone()),
    );
    let config = load_pipeline_config(&config_path)?;
    let options = build_run_options(args, defaults, config);

    info!(
        config = %config_path.display(),
        source = %options.source,
        output_dir = %options.output_dir.display(),
        check_attachments = options.checks_attachments(),
        download_attachments = options.download_attachments,
        "starting tender run"
    );

    let reporter = CliProgress::new();
    let outcome = run_pipeline(&options, &reporter).await?;
    let summary = &outcome.summary;

    println!();
    println!("  Run complete.");
    println!("  Source:     {}", summary.source);
    println!("  Processed:  {}", summary.processed_total);
    println!("  Matched:    {}", summary.matched_total);
    if summary.rows_skipped > 0 {
        println!("  Skipped:    {}", summary.rows_skipped);
    }
    for (industry, count) in &summary.industry_counts {
        println!("    {industry}: {count}");
    }
    if summary.attachment_urls_checked > 0 {
        println!(
            "  Attachments: {} checked, {} ok, {} missing, {} other",
            summary.attachment_urls_checked,
            summary.attachment_urls_ok,
            summary.attachment_urls_missing,
            summary.attachment_urls_other
        );
    }
    if summary.attachment_download_attempted > 0 {
        println!(
            "  Downloads:  {}/{}",
            summary.attachment_downloaded, summary.attachment_download_attempted
        );
    }
    println!("  CSV:        {}", outcome.csv_path.display());
    println!("  Summary:    {}", outcome.json_path.display());
    println!("  Documents:  {}", outcome.projects_dir.display());
    println!("  Time:       {:.1}s", outcome.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn row_processed(&self, processed: usize, matched: usize) {
        if processed % 500 == 0 {
            self.spinner
                .set_message(format!("Reading source: {processed} rows, {matched} matched"));
        }
    }

    fn attachment_checked(&self, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Checking attachments [{current}/{total}]"));
    }

    fn attachment_downloaded(&self, url: &str, downloaded: usize) {
        self.spinner
            .set_message(format!("Downloaded {downloaded}: {url}"));
    }

    fn done(&self, _outcome: &RunOutcome) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Read-back commands
// ---------------------------------------------------------------------------

fn output_dir_or_default(output_dir: Option<&str>) -> Result<PathBuf> {
    match output_dir {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => Ok(PathBuf::from(load_config()?.defaults.output_dir)),
    }
}

fn cmd_search(filter: &ResultFilter, output_dir: Option<&str>) -> Result<()> {
    let dir = output_dir_or_default(output_dir)?;
    let rows = load_latest(&dir)?
        .rows
        .ok_or_else(|| no_results(&dir))?;

    let response = search(&rows, filter);
    info!(
        hits = response.result_count,
        total = response.total_available,
        "search complete"
    );
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn cmd_show(reference: &str, output_dir: Option<&str>) -> Result<()> {
    let dir = output_dir_or_default(output_dir)?;
    let rows = load_latest(&dir)?
        .rows
        .ok_or_else(|| no_results(&dir))?;

    let row = find_by_reference(&rows, reference)
        .ok_or_else(|| eyre!("tender not found: {reference}"))?;
    println!("{}", serde_json::to_string_pretty(row)?);
    Ok(())
}

fn cmd_summary(output_dir: Option<&str>) -> Result<()> {
    let dir = output_dir_or_default(output_dir)?;
    let summary = load_latest(&dir)?
        .summary
        .ok_or_else(|| eyre!("no run summary in '{}'. Run `tenderwatch run` first.", dir.display()))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_industries(config: Option<&str>) -> Result<()> {
    let path = match config {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(load_config()?.defaults.config_path),
    };
    let config = load_pipeline_config(&path)?;

    let industries: Vec<&str> = config.industries.keys().map(String::as_str).collect();
    let listing = serde_json::json!({
        "industries": industries,
        "regions": config.regions(),
    });
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

fn no_results(dir: &Path) -> color_eyre::eyre::Report {
    eyre!(
        "no results in '{}'. Run `tenderwatch run` first.",
        dir.display()
    )
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_override_defaults() {
        let cli = Cli::parse_from([
            "tenderwatch",
            "run",
            "--source",
            "feed.csv",
            "--download-attachments",
            "--download-limit",
            "0",
            "--attachment-check-limit",
            "5",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };

        let options = build_run_options(&args, &DefaultsConfig::default(), PipelineConfig::default());
        assert_eq!(options.source, "feed.csv");
        assert_eq!(options.output_dir, PathBuf::from("output/canadabuys"));
        assert!(options.check_attachments);
        assert_eq!(options.download_limit, None);
        assert_eq!(options.attachment_check_limit, Some(5));
        assert_eq!(options.attachment_timeout, Duration::from_secs(20));
    }

    #[test]
    fn run_without_flags_uses_defaults() {
        let defaults = DefaultsConfig {
            source: "new".into(),
            download_limit: 3,
            ..DefaultsConfig::default()
        };
        let options = build_run_options(&RunArgs::default(), &defaults, PipelineConfig::default());
        assert_eq!(options.source, "new");
        assert!(!options.checks_attachments());
        assert_eq!(options.download_limit, Some(3));
        assert_eq!(options.attachment_check_limit, None);
        assert_eq!(options.max_rows, None);
    }

    #[test]
    fn search_flags_are_repeatable() {
        let cli = Cli::parse_from([
            "tenderwatch",
            "search",
            "--industry",
            "steel",
            "--industry",
            "lumber",
            "--status",
            "open",
        ]);
        let Command::Search {
            industries,
            status,
            max_results,
            ..
        } = cli.command
        else {
            panic!("expected search");
        };
        assert_eq!(industries, vec!["steel", "lumber"]);
        assert_eq!(status.as_deref(), Some("open"));
        assert_eq!(max_results, 20);
    }
}
