//! Schedule manager — one worker per configured job.
//!
//! Each worker is its own tokio task running the same loop forever: read
//! the clock once, evaluate the job's trigger, spawn the job if due,
//! store the marker, sleep, repeat. Workers never share an execution
//! slot, so a slow or failing job only ever delays itself.

use std::sync::Arc;
use std::time::Duration;

use botmill_core::config::{BotmillConfig, JobSpec, SchedulerConfig};
use botmill_core::error::Result;

use crate::clock::{Clock, SystemClock};
use crate::rules::{self, Trigger};
use crate::runner::{JobRunner, ProcessRunner};
use crate::tracker::ExecutionTracker;

/// Owns the worker pool and the shared seams (clock, runner, tracker).
pub struct Manager {
    scheduler: SchedulerConfig,
    jobs: Vec<JobSpec>,
    tracker: Arc<ExecutionTracker>,
    runner: Arc<dyn JobRunner>,
    clock: Arc<dyn Clock>,
}

impl Manager {
    /// Build a manager that spawns real processes on the real clock.
    pub fn new(config: &BotmillConfig) -> Self {
        Self {
            scheduler: config.scheduler.clone(),
            jobs: config.jobs.clone(),
            tracker: Arc::new(ExecutionTracker::new()),
            runner: Arc::new(ProcessRunner::new(&config.scheduler)),
            clock: Arc::new(SystemClock),
        }
    }

    /// Substitute the execution seam (tests inject a recording fake).
    pub fn with_runner(mut self, runner: Arc<dyn JobRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Substitute the clock seam.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Shared handle to the marker map, for status inspection.
    pub fn tracker(&self) -> Arc<ExecutionTracker> {
        Arc::clone(&self.tracker)
    }

    /// Spawn one worker per job and park on them. In normal daemon
    /// operation this never returns — the workers loop until the process
    /// is killed.
    pub async fn run(self) {
        tracing::info!("schedule manager started with {} jobs", self.jobs.len());
        let poll = Duration::from_millis(self.scheduler.poll_interval_ms);

        let mut workers = Vec::with_capacity(self.jobs.len());
        for job in self.jobs {
            let tracker = Arc::clone(&self.tracker);
            let runner = Arc::clone(&self.runner);
            let clock = Arc::clone(&self.clock);
            workers.push(tokio::spawn(worker_loop(job, poll, tracker, runner, clock)));
        }

        futures::future::join_all(workers).await;
    }
}

/// The per-job loop. Any failure inside an iteration is logged and the
/// loop continues on the next tick; nothing terminates a worker.
async fn worker_loop(
    job: JobSpec,
    poll: Duration,
    tracker: Arc<ExecutionTracker>,
    runner: Arc<dyn JobRunner>,
    clock: Arc<dyn Clock>,
) {
    let Some(trigger) = Trigger::from_spec(&job) else {
        // Already warned at config load; an inert job needs no worker.
        tracing::debug!("job '{}' has no trigger, worker exiting", job.path);
        return;
    };

    loop {
        if let Err(e) = check_once(&job, &trigger, &tracker, runner.as_ref(), clock.as_ref()).await {
            tracing::warn!("job '{}' iteration failed: {e}", job.path);
        }
        tokio::time::sleep(poll).await;
    }
}

/// One due-check. The clock is read exactly once so interval math and
/// calendar math agree within the iteration.
async fn check_once(
    job: &JobSpec,
    trigger: &Trigger,
    tracker: &ExecutionTracker,
    runner: &dyn JobRunner,
    clock: &dyn Clock,
) -> Result<()> {
    let now = clock.now();
    let marker = tracker.get(&job.path, trigger);
    let decision = rules::evaluate(&job.path, trigger, now, &marker);

    if decision.fire {
        tracing::info!("triggering job '{}' at {}", job.path, now.format("%Y-%m-%d %H:%M:%S"));
        runner.run(job).await?;
    }
    tracker.set(&job.path, decision.marker);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use botmill_core::error::BotmillError;
    use chrono::{DateTime, Local, TimeZone};
    use std::sync::Mutex;

    struct FixedClock(DateTime<Local>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Local> {
            self.0
        }
    }

    /// Records every invocation; optionally fails for one job path.
    struct RecordingRunner {
        calls: Mutex<Vec<String>>,
        fail_path: Option<String>,
    }

    impl RecordingRunner {
        fn new() -> Self {
            Self { calls: Mutex::new(Vec::new()), fail_path: None }
        }

        fn failing_for(path: &str) -> Self {
            Self { calls: Mutex::new(Vec::new()), fail_path: Some(path.into()) }
        }

        fn calls_for(&self, path: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|p| *p == path).count()
        }
    }

    #[async_trait::async_trait]
    impl JobRunner for RecordingRunner {
        async fn run(&self, job: &JobSpec) -> Result<()> {
            self.calls.lock().unwrap().push(job.path.clone());
            if self.fail_path.as_deref() == Some(job.path.as_str()) {
                return Err(BotmillError::Spawn(format!("boom: {}", job.path)));
            }
            Ok(())
        }
    }

    fn job(path: &str) -> JobSpec {
        JobSpec {
            path: path.into(),
            interval: None,
            time: Vec::new(),
            day: Vec::new(),
            custom_rule: None,
        }
    }

    fn config(jobs: Vec<JobSpec>) -> BotmillConfig {
        BotmillConfig {
            scheduler: SchedulerConfig { poll_interval_ms: 10, ..SchedulerConfig::default() },
            jobs,
        }
    }

    // 2024-05-27 is a Monday.
    fn monday_1240() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 27, 12, 40, 0).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn time_rule_fires_exactly_once_while_clock_stands_still() {
        let mut standup = job("standup.py");
        standup.day = vec!["Monday".into()];
        standup.time = vec!["12:40".into()];

        let runner = Arc::new(RecordingRunner::new());
        let manager = Manager::new(&config(vec![standup]))
            .with_runner(runner.clone())
            .with_clock(Arc::new(FixedClock(monday_1240())));
        let tracker = manager.tracker();

        let handle = tokio::spawn(manager.run());
        // Plenty of poll iterations at a frozen "12:40".
        tokio::time::sleep(Duration::from_secs(2)).await;
        handle.abort();

        assert_eq!(runner.calls_for("standup.py"), 1);
        assert_eq!(
            tracker.snapshot()["standup.py"],
            crate::rules::Marker::Minute("12:40".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_job_fires_every_tick() {
        let mut ticker = job("ticker.py");
        ticker.interval = Some(0);

        let runner = Arc::new(RecordingRunner::new());
        let manager = Manager::new(&config(vec![ticker]))
            .with_runner(runner.clone())
            .with_clock(Arc::new(FixedClock(monday_1240())));

        let handle = tokio::spawn(manager.run());
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.abort();

        assert!(runner.calls_for("ticker.py") >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn one_failing_job_does_not_stop_the_others() {
        let mut bad = job("bad.py");
        bad.interval = Some(0);
        let mut good = job("good.py");
        good.interval = Some(0);

        let runner = Arc::new(RecordingRunner::failing_for("bad.py"));
        let manager = Manager::new(&config(vec![bad, good]))
            .with_runner(runner.clone())
            .with_clock(Arc::new(FixedClock(monday_1240())));

        let handle = tokio::spawn(manager.run());
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.abort();

        // The failing worker kept retrying instead of dying, and the
        // healthy worker kept firing alongside it.
        assert!(runner.calls_for("bad.py") >= 2);
        assert!(runner.calls_for("good.py") >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_custom_rule_never_reaches_the_runner() {
        let mut odd = job("odd.py");
        odd.custom_rule = Some(botmill_core::config::CustomRuleSpec {
            kind: "full_moon".into(),
            day_of_week: None,
            time: vec!["12:40".into()],
        });

        let runner = Arc::new(RecordingRunner::new());
        let manager = Manager::new(&config(vec![odd]))
            .with_runner(runner.clone())
            .with_clock(Arc::new(FixedClock(monday_1240())));

        let handle = tokio::spawn(manager.run());
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.abort();

        assert_eq!(runner.calls_for("odd.py"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn triggerless_job_spawns_no_work() {
        let runner = Arc::new(RecordingRunner::new());
        let manager = Manager::new(&config(vec![job("inert.py")]))
            .with_runner(runner.clone())
            .with_clock(Arc::new(FixedClock(monday_1240())));

        let handle = tokio::spawn(manager.run());
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert_eq!(runner.calls_for("inert.py"), 0);
    }
}
