//! Configuration types for the classroom coordinator.
//!
//! This module provides the configuration structures that control server
//! binding, focus-score tuning, and the bounded history buffers. All values
//! have sensible classroom defaults so a missing `classroom.json` is not an
//! error.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoordinatorError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "classroom.json";

/// Default port for the HTTP/WebSocket server.
const fn default_port() -> u16 {
    5000
}

/// Default bind address.
fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default bound on the recent-answer log.
const fn default_answer_log_limit() -> usize {
    10
}

/// Default bound on the summary history.
const fn default_summary_history_limit() -> usize {
    10
}

/// Default idle duration after which the soft penalty applies, in seconds.
const fn default_soft_idle_secs() -> u32 {
    30
}

/// Default idle duration after which the hard penalty applies, in seconds.
const fn default_hard_idle_secs() -> u32 {
    120
}

/// Default score deduction for soft idleness.
const fn default_soft_penalty() -> u32 {
    10
}

/// Default score deduction for hard idleness.
const fn default_hard_penalty() -> u32 {
    30
}

/// Default score credit for an interaction.
const fn default_interaction_boost() -> u32 {
    10
}

/// Default score below which a student counts as struggling.
const fn default_trigger_threshold() -> u32 {
    60
}

/// Default interval between background focus sweeps, in seconds.
const fn default_sweep_interval_secs() -> u32 {
    30
}

/// Main configuration for the classroom coordinator.
///
/// Controls the server binding, the focus-score model, and how much recent
/// history the dashboards keep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Port for the HTTP and WebSocket server.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bind address for the server.
    #[serde(default = "default_host")]
    pub host: String,

    /// Focus-score tuning.
    #[serde(default)]
    pub focus: FocusConfig,

    /// Maximum entries kept in the recent-answer log.
    #[serde(default = "default_answer_log_limit")]
    pub answer_log_limit: usize,

    /// Maximum entries kept in the generated-summary history.
    #[serde(default = "default_summary_history_limit")]
    pub summary_history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            focus: FocusConfig::default(),
            answer_log_limit: default_answer_log_limit(),
            summary_history_limit: default_summary_history_limit(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `classroom.json` in the current directory. If found, loads
    /// and validates the configuration. If not found, returns default
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            CoordinatorError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from a specific directory.
    ///
    /// Looks for `classroom.json` in the given directory. If found, loads and
    /// validates the configuration. If not found, returns default
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        Self::load_from_file(&config_path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    /// If the file exists but contains invalid JSON, returns an error.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::ConfigParseError` if the file exists but
    /// contains invalid JSON.
    ///
    /// Returns `CoordinatorError::ConfigValidationError` if the configuration
    /// values are invalid (e.g., a zero sweep interval).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(CoordinatorError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| CoordinatorError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// Checks that all fields hold values the coordinator can run with:
    /// - `port` must be non-zero
    /// - `focus.softIdleSecs` must be non-zero and below `focus.hardIdleSecs`
    /// - `focus.triggerThreshold` must be in 1..=100
    /// - the focus penalties and boost must be in 1..=100
    /// - `focus.sweepIntervalSecs` must be non-zero
    /// - the history bounds must be non-zero
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(CoordinatorError::config_validation(
                "port must be non-zero",
                "Set port to a value between 1 and 65535 in your classroom.json",
            ));
        }

        if self.focus.soft_idle_secs == 0 {
            return Err(CoordinatorError::config_validation(
                "focus.softIdleSecs must be greater than 0",
                "Set focus.softIdleSecs to at least 1 second in your classroom.json",
            ));
        }

        if self.focus.soft_idle_secs >= self.focus.hard_idle_secs {
            return Err(CoordinatorError::config_validation(
                "focus.softIdleSecs must be below focus.hardIdleSecs",
                "Use a shorter soft tier than hard tier, e.g. 30 and 120 seconds",
            ));
        }

        if self.focus.trigger_threshold == 0 || self.focus.trigger_threshold > 100 {
            return Err(CoordinatorError::config_validation(
                "focus.triggerThreshold must be between 1 and 100",
                "Scores live on a 0-100 scale; 60 is the standard threshold",
            ));
        }

        for (field, value) in [
            ("focus.softPenalty", self.focus.soft_penalty),
            ("focus.hardPenalty", self.focus.hard_penalty),
            ("focus.interactionBoost", self.focus.interaction_boost),
        ] {
            if value == 0 || value > 100 {
                return Err(CoordinatorError::config_validation(
                    format!("{field} must be between 1 and 100"),
                    "Score adjustments operate on a 0-100 scale",
                ));
            }
        }

        if self.focus.sweep_interval_secs == 0 {
            return Err(CoordinatorError::config_validation(
                "focus.sweepIntervalSecs must be greater than 0",
                "Set focus.sweepIntervalSecs to at least 1 second in your classroom.json",
            ));
        }

        if self.answer_log_limit == 0 {
            return Err(CoordinatorError::config_validation(
                "answerLogLimit must be greater than 0",
                "Set answerLogLimit to at least 1 in your classroom.json",
            ));
        }

        if self.summary_history_limit == 0 {
            return Err(CoordinatorError::config_validation(
                "summaryHistoryLimit must be greater than 0",
                "Set summaryHistoryLimit to at least 1 in your classroom.json",
            ));
        }

        Ok(())
    }
}

/// Focus-score tuning.
///
/// The score model: every interaction adds `interactionBoost` (capped at
/// 100), and an evaluation deducts `softPenalty` or `hardPenalty` depending
/// on which idle tier the student's last interaction falls into. A student
/// whose score drops below `triggerThreshold` counts as struggling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusConfig {
    /// Idle seconds after which the soft penalty applies.
    #[serde(default = "default_soft_idle_secs")]
    pub soft_idle_secs: u32,

    /// Idle seconds after which the hard penalty applies instead.
    #[serde(default = "default_hard_idle_secs")]
    pub hard_idle_secs: u32,

    /// Deduction for idleness past the soft tier.
    #[serde(default = "default_soft_penalty")]
    pub soft_penalty: u32,

    /// Deduction for idleness past the hard tier.
    #[serde(default = "default_hard_penalty")]
    pub hard_penalty: u32,

    /// Credit for each interaction.
    #[serde(default = "default_interaction_boost")]
    pub interaction_boost: u32,

    /// Score below which a student counts as struggling.
    #[serde(default = "default_trigger_threshold")]
    pub trigger_threshold: u32,

    /// Interval between background focus sweeps, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u32,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            soft_idle_secs: default_soft_idle_secs(),
            hard_idle_secs: default_hard_idle_secs(),
            soft_penalty: default_soft_penalty(),
            hard_penalty: default_hard_penalty(),
            interaction_boost: default_interaction_boost(),
            trigger_threshold: default_trigger_threshold(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}
