//! # Botmill Scheduler
//!
//! The schedule manager: one worker per configured job, each polling its
//! own trigger rule and spawning the job's executable when due.
//!
//! ## Architecture
//! ```text
//! Manager (one tokio task per job)
//!   └── worker loop: Clock.now()
//!         → evaluate trigger (Interval | TimeOfDay | WeekdayAndTime | Custom)
//!         → if due: JobRunner spawns `<interpreter> <jobs_dir>/<path>`
//!         → ExecutionTracker remembers the fire (dedup marker)
//!         → sleep poll_interval_ms, repeat
//! ```
//!
//! ## Guarantees
//! - A job never overlaps itself: the spawn is awaited inside its own
//!   worker's iteration.
//! - Jobs never delay each other: workers share nothing but the tracker
//!   map and the log stream.
//! - No rule misconfiguration and no per-iteration failure ever terminates
//!   a worker; the iteration is logged and the loop continues.

pub mod clock;
pub mod manager;
pub mod rules;
pub mod runner;
pub mod tracker;

pub use clock::{Clock, SystemClock};
pub use manager::Manager;
pub use rules::{evaluate, Decision, Marker, Trigger};
pub use runner::{JobRunner, ProcessRunner};
pub use tracker::ExecutionTracker;
