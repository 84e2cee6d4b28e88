//! Job runner — the process-spawn boundary.
//!
//! The scheduler knows nothing about what a job does: a due job becomes
//! `<interpreter> <jobs_dir>/<path>`, awaited until exit. The exit status
//! and output are not interpreted — a failing bot is the bot's problem,
//! not the scheduler's. The await keeps a single job from overlapping
//! itself without blocking any other job's worker.

use std::path::PathBuf;

use async_trait::async_trait;
use botmill_core::config::{JobSpec, SchedulerConfig};
use botmill_core::error::{BotmillError, Result};
use tokio::process::Command;

/// Narrow execution seam so the manager is testable without spawning
/// real processes.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Run the job to completion. `Err` means the process could not be
    /// started; a started-but-failed job is still `Ok`.
    async fn run(&self, job: &JobSpec) -> Result<()>;
}

/// Spawns jobs as external interpreter processes.
pub struct ProcessRunner {
    jobs_dir: PathBuf,
    interpreter: String,
}

impl ProcessRunner {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            jobs_dir: PathBuf::from(&config.jobs_dir),
            interpreter: config.interpreter.clone(),
        }
    }

    /// Absolute-or-relative resolution of a job path against the base dir.
    fn resolve(&self, job: &JobSpec) -> PathBuf {
        self.jobs_dir.join(&job.path)
    }
}

#[async_trait]
impl JobRunner for ProcessRunner {
    async fn run(&self, job: &JobSpec) -> Result<()> {
        let resolved = self.resolve(job);
        let status = Command::new(&self.interpreter)
            .arg(&resolved)
            .status()
            .await
            .map_err(|e| {
                BotmillError::Spawn(format!("cannot spawn '{}': {e}", resolved.display()))
            })?;

        // Fire-and-forget contract: the status is logged, never acted on.
        tracing::debug!("job '{}' exited with {status}", job.path);
        Ok(())
    }
}
