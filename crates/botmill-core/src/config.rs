//! Botmill configuration system.
//!
//! The config file is the only surface the scheduler core consumes: a
//! `[scheduler]` table plus an ordered list of `[[jobs]]` descriptors.
//! Each job names an executable (relative to `jobs_dir`) and exactly one
//! trigger mechanism — a fixed interval, a time-of-day list (optionally
//! restricted to weekdays), or a tagged custom rule.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotmillConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub jobs: Vec<JobSpec>,
}

/// Schedule-manager settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Directory job paths resolve against.
    #[serde(default = "default_jobs_dir")]
    pub jobs_dir: String,
    /// Command used to run a job (the job's resolved path is its sole argument).
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Sleep between due-checks of a single job, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_jobs_dir() -> String { "bots".into() }
fn default_interpreter() -> String { "python3".into() }
fn default_poll_interval_ms() -> u64 { 100 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            jobs_dir: default_jobs_dir(),
            interpreter: default_interpreter(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// One scheduled job. `path` doubles as the job's identity — it keys the
/// execution tracker and is handed verbatim to the runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub path: String,
    /// Fire every N milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    /// Fire at these wall-clock times ("HH:MM").
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time: Vec<String>,
    /// Restrict `time` to these weekday names. Meaningless without `time`;
    /// such a job simply never fires.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub day: Vec<String>,
    /// Tagged custom rule, e.g. `{ type = "last_day_of_week_in_month", ... }`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_rule: Option<CustomRuleSpec>,
}

/// Raw custom-rule descriptor. The `type` tag is matched at evaluation
/// time; an unrecognized tag degrades to "never due" with a warning rather
/// than a config error, so one misconfigured job cannot take the daemon down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomRuleSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time: Vec<String>,
}

impl BotmillConfig {
    /// Load config from the default path (~/.botmill/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::BotmillError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::BotmillError::Config(format!("Failed to parse config: {e}")))?;
        config.warn_inert_jobs();
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".botmill")
            .join("config.toml")
    }

    /// Get the Botmill home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".botmill")
    }

    /// One startup warning per job that can never become due. Not an error:
    /// the scheduler runs the rest of the jobs regardless.
    fn warn_inert_jobs(&self) {
        for job in &self.jobs {
            if job.interval.is_none() && job.time.is_empty() && job.custom_rule.is_none() {
                tracing::warn!("job '{}' has no trigger configured and will never run", job.path);
            } else if !job.day.is_empty() && job.time.is_empty() {
                tracing::warn!("job '{}' has 'day' without 'time' and will never run", job.path);
            }
        }
    }
}
