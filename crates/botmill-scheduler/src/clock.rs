//! Clock seam — one wall-clock read per worker iteration.

use chrono::{DateTime, Local};

/// Supplies the current time. A worker reads it exactly once per iteration
/// so interval math and calendar math agree within that iteration.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The real wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}
