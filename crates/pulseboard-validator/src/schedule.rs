//! Fixed-interval schedule for validation passes.
//!
//! Unlike a game tick, the first pass is due immediately: a session that
//! was just restored from storage gets checked right away, not five
//! minutes later.
//!
//! The schedule is meant to sit inside a task's loop:
//!
//! ```ignore
//! loop {
//!     let pass = schedule.wait_for_pass().await;
//!     // validate...
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

/// Information about a pass that just became due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledPass {
    /// Monotonically increasing pass number (starts at 1).
    pub pass: u64,
    /// `true` if the pass fired more than one interval late (the task was
    /// starved or the machine slept). Missed passes are not replayed.
    pub late: bool,
}

/// Decides when the next validation pass is due.
pub struct ValidationSchedule {
    interval: Duration,
    next_pass: Instant,
    passes: u64,
}

impl ValidationSchedule {
    /// A schedule whose first pass is due now.
    pub fn new(interval: Duration) -> Self {
        debug!(interval_secs = interval.as_secs_f64(), "validation schedule created");
        Self {
            interval,
            next_pass: Instant::now(),
            passes: 0,
        }
    }

    /// Waits until the next pass is due.
    pub async fn wait_for_pass(&mut self) -> ScheduledPass {
        time::sleep_until(self.next_pass).await;

        let now = Instant::now();
        let late = now.saturating_duration_since(self.next_pass) > self.interval;
        self.passes += 1;
        // Always schedule from now: a late pass doesn't trigger a burst.
        self.next_pass = now + self.interval;

        trace!(pass = self.passes, late, "validation pass due");
        ScheduledPass {
            pass: self.passes,
            late,
        }
    }

    /// Passes fired so far.
    pub fn pass_count(&self) -> u64 {
        self.passes
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
