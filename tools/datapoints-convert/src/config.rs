// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Optional YAML configuration for the converter.
//!
//! ```yaml
//! pretty: true
//! log_level: debug
//! default_from: legacy
//! default_to: compact
//! ```

use crate::conversion::Format;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Converter settings. Command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Pretty-print JSON output.
    pub pretty: bool,
    /// tracing filter directive, e.g. `info` or `datapoints=debug`.
    pub log_level: String,
    /// Input format when `--from` is absent. None = detect from content.
    pub default_from: Option<Format>,
    /// Output format when `--to` is absent.
    pub default_to: Option<Format>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            pretty: false,
            log_level: "info".to_string(),
            default_from: None,
            default_to: None,
        }
    }
}

/// Why a configuration could not be loaded.
#[derive(Debug)]
pub enum ConfigError {
    /// The file is not valid YAML or has unknown fields.
    Yaml(serde_yaml::Error),
    /// The file could not be read.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// `log_level` is not a valid tracing filter directive.
    LogLevel { level: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Yaml(e) => write!(f, "invalid converter config: {}", e),
            ConfigError::Read { path, source } => {
                write!(f, "cannot read config {}: {}", path.display(), source)
            }
            ConfigError::LogLevel { level, reason } => {
                write!(f, "log_level {:?} is not a filter directive: {}", level, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Yaml(e) => Some(e),
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::LogLevel { .. } => None,
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Yaml(e)
    }
}

impl ConvertConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: ConvertConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Reject a `log_level` the subscriber would not accept.
    pub fn validate(&self) -> Result<(), ConfigError> {
        EnvFilter::try_new(&self.log_level)
            .map(drop)
            .map_err(|e| ConfigError::LogLevel {
                level: self.log_level.clone(),
                reason: e.to_string(),
            })
    }

    pub fn builder() -> ConvertConfigBuilder {
        ConvertConfigBuilder::default()
    }
}

/// Fluent builder; unset fields keep their defaults or the base config.
#[derive(Debug, Default)]
pub struct ConvertConfigBuilder {
    base: Option<ConvertConfig>,
    pretty: Option<bool>,
    log_level: Option<String>,
    default_from: Option<Format>,
    default_to: Option<Format>,
}

impl ConvertConfigBuilder {
    /// Start from a loaded config instead of the defaults.
    pub fn base(mut self, config: ConvertConfig) -> Self {
        self.base = Some(config);
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = Some(pretty);
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn default_from(mut self, format: Format) -> Self {
        self.default_from = Some(format);
        self
    }

    pub fn default_to(mut self, format: Format) -> Self {
        self.default_to = Some(format);
        self
    }

    /// Build the configuration
    pub fn build(self) -> ConvertConfig {
        let base = self.base.unwrap_or_default();

        ConvertConfig {
            pretty: self.pretty.unwrap_or(base.pretty),
            log_level: self.log_level.unwrap_or(base.log_level),
            default_from: self.default_from.or(base.default_from),
            default_to: self.default_to.or(base.default_to),
        }
    }
}
