//! Run-time configuration: `docchat.ron`, then environment, then flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use docchat_core::DEFAULT_NEWS_QUERY;
use docchat_engine::{ApiSettings, DeleteStyle, DEFAULT_BASE_URL};

use super::logging::{LogConfig, LogDestination};

pub const DEFAULT_CONFIG_FILE: &str = "docchat.ron";
pub const ENV_API_URL: &str = "DOCCHAT_API_URL";
pub const ENV_LOG: &str = "DOCCHAT_LOG";
pub const ENV_REQUEST_TIMEOUT: &str = "DOCCHAT_REQUEST_TIMEOUT_SECS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DeleteStyleArg {
    Path,
    Form,
}

impl From<DeleteStyleArg> for DeleteStyle {
    fn from(arg: DeleteStyleArg) -> Self {
        match arg {
            DeleteStyleArg::Path => DeleteStyle::PathParam,
            DeleteStyleArg::Form => DeleteStyle::FormField,
        }
    }
}

#[derive(Parser, Debug, Default)]
#[command(version, about = "Terminal client for the docchat document assistant")]
pub struct Args {
    /// Path to a RON config file (defaults to ./docchat.ron when present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Backend base URL.
    #[arg(long)]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// How `/delete` is addressed by the backend.
    #[arg(long, value_enum)]
    pub delete_style: Option<DeleteStyleArg>,

    /// Topic used by `/news` without an argument.
    #[arg(long)]
    pub news_query: Option<String>,

    /// Log level name (trace, debug, info, warn, error, off).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Where log output goes.
    #[arg(long, value_enum)]
    pub log_to: Option<LogDestination>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub api_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub operation_timeout_secs: u64,
    pub delete_style: DeleteStyle,
    pub news_query: String,
    pub scrape_tick_ms: u64,
    pub log_level: Option<String>,
    pub log_destination: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: api.connect_timeout.as_secs(),
            request_timeout_secs: api.request_timeout.as_secs(),
            operation_timeout_secs: api.operation_timeout.as_secs(),
            delete_style: api.delete_style,
            news_query: DEFAULT_NEWS_QUERY.to_string(),
            scrape_tick_ms: api.scrape_tick.as_millis() as u64,
            log_level: None,
            log_destination: LogDestination::default(),
        }
    }
}

impl AppConfig {
    /// Builds the effective configuration for `args` from the process
    /// environment.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.apply_args(args);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|value| !value.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        if let Some(level) = lookup(ENV_LOG).filter(|value| !value.trim().is_empty()) {
            self.log_level = Some(level);
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
            self.request_timeout_secs =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv {
                        name: ENV_REQUEST_TIMEOUT,
                        value: raw.clone(),
                    })?;
        }
        Ok(())
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(url) = &args.api_url {
            self.api_url = url.clone();
        }
        if let Some(secs) = args.request_timeout {
            self.request_timeout_secs = secs;
        }
        if let Some(style) = args.delete_style {
            self.delete_style = style.into();
        }
        if let Some(query) = &args.news_query {
            self.news_query = query.clone();
        }
        if let Some(level) = &args.log_level {
            self.log_level = Some(level.clone());
        }
        if let Some(destination) = args.log_to {
            self.log_destination = destination;
        }
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            operation_timeout: Duration::from_secs(self.operation_timeout_secs),
            delete_style: self.delete_style,
            scrape_tick: Duration::from_millis(self.scrape_tick_ms.max(1)),
            ..ApiSettings::default()
        }
    }

    pub fn log_config(&self, verbosity: u8) -> LogConfig {
        LogConfig::resolve(self.log_level.as_deref(), verbosity, self.log_destination)
    }
}
