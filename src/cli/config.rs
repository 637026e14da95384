use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::browser::session::SessionOptions;
use crate::explorer::config::ExplorerConfig;
use crate::explorer::equivalence::HandlerMatch;
use crate::explorer::gate::GateConfig;
use crate::statechart::augment::AugmentOptions;

pub const DEFAULT_CONFIG_FILE: &str = "statechart-explorer.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "statechart-explorer",
    version,
    about = "Infer the statechart of an interactive web application"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: statechart-explorer.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Explore an application and export its statechart
    Explore(ExploreArgs),

    /// Regenerate the DOT graph from an exported statechart
    Graph {
        /// Path to statechart.json
        #[arg(long)]
        statechart: String,

        /// Output file (default: statechart.gv next to the input)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Args, Debug, Default)]
pub struct ExploreArgs {
    /// URL of the running application
    #[arg(long, conflicts_with = "url_file")]
    pub url: Option<String>,

    /// Plain-text file holding the target URL
    #[arg(long)]
    pub url_file: Option<String>,

    /// Plain-text file of event names to ignore, one per line
    #[arg(long)]
    pub excluded_events: Option<String>,

    /// Directory for statechart.json, statechart.gv and computation_times.txt
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Stop registering new states after this many
    #[arg(long)]
    pub max_states: Option<usize>,

    /// Do not expand states deeper than this
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Handler signature comparison for state equivalence
    #[arg(long, value_enum)]
    pub handler_match: Option<HandlerMatch>,

    /// Node.js page driver script
    #[arg(long)]
    pub driver_script: Option<String>,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `statechart-explorer.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub explore: ExploreConfig,
    #[serde(default)]
    pub driver: DriverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploreConfig {
    pub url_file: Option<String>,

    pub excluded_events_file: Option<String>,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    pub max_states: Option<usize>,

    pub max_depth: Option<usize>,

    #[serde(default)]
    pub handler_match: HandlerMatch,

    /// Element ids treated as modal containers.
    #[serde(default)]
    pub modal_ids: Vec<String>,

    #[serde(default)]
    pub require_equal_length: bool,

    /// JSONL exploration trace; disabled when absent.
    pub trace_file: Option<String>,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            url_file: None,
            excluded_events_file: None,
            output_dir: default_output_dir(),
            max_states: None,
            max_depth: None,
            handler_match: HandlerMatch::Exact,
            modal_ids: Vec::new(),
            require_equal_length: false,
            trace_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_script")]
    pub script: String,

    #[serde(default = "default_settle_ms")]
    pub settle_timeout_ms: u64,

    #[serde(default = "default_navigation_ms")]
    pub navigation_timeout_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            script: default_script(),
            settle_timeout_ms: default_settle_ms(),
            navigation_timeout_ms: default_navigation_ms(),
        }
    }
}

// Serde default helpers
fn default_output_dir() -> String { "output".to_string() }
fn default_script() -> String { "driver/page_driver.js".to_string() }
fn default_settle_ms() -> u64 { 1000 }
fn default_navigation_ms() -> u64 { 5000 }

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no target URL: pass --url, --url-file, or set explore.url_file")]
    MissingTargetUrl,

    #[error("target URL file {} is empty", path.display())]
    EmptyTargetUrl { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// ============================================================================
// Config File Loading
// ============================================================================

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|e| {
            warn!(path = config_path, error = %e, "ignoring malformed config file");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Plain-text inputs
// ============================================================================

fn read_input(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::ReadInput {
        path: path.to_path_buf(),
        source,
    })
}

/// One event name per line; trimmed, lower-cased, blanks dropped.
pub fn parse_excluded_events(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty())
        .collect()
}

pub fn load_excluded_events(path: impl AsRef<Path>) -> Result<Vec<String>, ConfigError> {
    Ok(parse_excluded_events(&read_input(path.as_ref())?))
}

pub fn load_target_url(path: impl AsRef<Path>) -> Result<String, ConfigError> {
    let path = path.as_ref();
    let url = read_input(path)?.trim().to_string();
    if url.is_empty() {
        return Err(ConfigError::EmptyTargetUrl {
            path: path.to_path_buf(),
        });
    }
    Ok(url)
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Everything an exploration run needs, resolved once.
#[derive(Debug, Clone)]
pub struct ExploreSettings {
    pub explorer: ExplorerConfig,
    pub session: SessionOptions,
    pub augment: AugmentOptions,
    pub output_dir: PathBuf,
    pub trace_file: Option<PathBuf>,
}

/// Resolve CLI > YAML > defaults, and read the plain-text inputs.
pub fn resolve_explore(args: &ExploreArgs, config: &AppConfig) -> Result<ExploreSettings, ConfigError> {
    let explore = &config.explore;

    let root_url = match (&args.url, &args.url_file, &explore.url_file) {
        (Some(url), _, _) => url.trim().to_string(),
        (None, Some(file), _) | (None, None, Some(file)) => load_target_url(file)?,
        (None, None, None) => return Err(ConfigError::MissingTargetUrl),
    };

    let excluded_events = match args
        .excluded_events
        .as_ref()
        .or(explore.excluded_events_file.as_ref())
    {
        Some(file) => load_excluded_events(file)?,
        None => Vec::new(),
    };

    Ok(ExploreSettings {
        explorer: build_explorer_config(&root_url, args, explore),
        session: SessionOptions {
            script: args
                .driver_script
                .clone()
                .unwrap_or_else(|| config.driver.script.clone()),
            settle_timeout_ms: config.driver.settle_timeout_ms,
            navigation_timeout_ms: config.driver.navigation_timeout_ms,
            excluded_events,
        },
        augment: AugmentOptions {
            require_equal_length: explore.require_equal_length,
        },
        output_dir: PathBuf::from(args.output_dir.as_deref().unwrap_or(&explore.output_dir)),
        trace_file: explore.trace_file.as_ref().map(PathBuf::from),
    })
}

/// Build an ExplorerConfig from resolved CLI/config values.
pub fn build_explorer_config(url: &str, args: &ExploreArgs, explore: &ExploreConfig) -> ExplorerConfig {
    ExplorerConfig {
        root_url: url.to_string(),
        max_states: args.max_states.or(explore.max_states),
        max_depth: args.max_depth.or(explore.max_depth),
        handler_match: args.handler_match.unwrap_or(explore.handler_match),
        gate: GateConfig {
            modal_ids: explore.modal_ids.clone(),
        },
    }
}
