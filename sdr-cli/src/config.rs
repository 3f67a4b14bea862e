//! CLI configuration loading: YAML document parsing (spec §6) plus
//! environment variable overrides for external endpoints and log level.

use color_eyre::eyre::{Context, Result};
use sdr_core::config::AppConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// External service endpoints and the RAG bootstrap uuid. Always overridden
/// by environment variables when present, matching the original
/// implementation's `os.environ.get(...)` pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    pub frontend_uri: String,
    pub database_uri: String,
    pub asr_uri: String,
    pub rag_uuid: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            frontend_uri: "localhost:6001".to_string(),
            database_uri: "0.0.0.0:8081".to_string(),
            asr_uri: "0.0.0.0:50051".to_string(),
            rag_uuid: "default".to_string(),
        }
    }
}

impl EndpointsConfig {
    /// Applies `FRONTEND_URI`/`DATABASE_URI`/`ASR_URI`/`RAG_UUID` overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("FRONTEND_URI") {
            self.frontend_uri = v;
        }
        if let Ok(v) = std::env::var("DATABASE_URI") {
            self.database_uri = v;
        }
        if let Ok(v) = std::env::var("ASR_URI") {
            self.asr_uri = v;
        }
        if let Ok(v) = std::env::var("RAG_UUID") {
            self.rag_uuid = v;
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn from_env_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARN" | "WARNING" => Some(Self::Warn),
            "ERROR" | "CRITICAL" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_env_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    Stdout,
    Stderr,
    File,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Logfmt,
    Pretty,
}

/// Structured event-logger configuration, independent of the ambient `log`
/// facade level (which `SDR_LOG_LEVEL` controls separately).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_target")]
    pub target: LogTarget,
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

fn default_log_target() -> LogTarget {
    LogTarget::Stdout
}
fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}
fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            target: default_log_target(),
            file_path: None,
            format: default_log_format(),
            level: default_log_level(),
        }
    }
}

/// Full CLI configuration: the pipeline's typed `AppConfig` fields
/// (flattened to match the single top-level YAML document of spec §6),
/// plus the CLI-owned endpoints and structured-logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CliConfig {
    #[serde(flatten)]
    pub pipeline: AppConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CliConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let mut config: CliConfig =
            serde_yaml::from_str(&content).wrap_err("failed to parse YAML configuration")?;

        config.endpoints.apply_env_overrides();
        if let Ok(level_str) = std::env::var("SDR_LOG_LEVEL") {
            if let Some(level) = LogLevel::from_env_str(&level_str) {
                config.logging.level = level;
            } else {
                eprintln!("warning: invalid SDR_LOG_LEVEL '{level_str}', keeping configured level");
            }
        }

        Ok(config)
    }
}
