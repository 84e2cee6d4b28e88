//! # Botmill Core
//!
//! Shared plumbing for the Botmill workspace: the TOML configuration
//! surface (job descriptors + scheduler settings) and the common error
//! type. Everything else lives in the member crates.

pub mod config;
pub mod error;

pub use config::{BotmillConfig, CustomRuleSpec, JobSpec, SchedulerConfig};
pub use error::{BotmillError, Result};
