//! Stage timing passed explicitly through a call.

use std::time::{Duration, Instant};

use tracing::{debug, info};

/// Records how long each stage of a call takes.
///
/// One context belongs to one call, so concurrent calls never share timer
/// state. With `verbose` set, every lap is logged at `info` level, otherwise
/// at `debug`.
///
/// # Example
///
/// ```
/// use curve_types::TimingContext;
///
/// let mut timing = TimingContext::new(false);
/// let _ = timing.lap("graph construction");
/// let _ = timing.lap("search");
///
/// assert_eq!(timing.laps().len(), 2);
/// assert!(timing.total() >= timing.laps()[0].1);
/// ```
#[derive(Debug, Clone)]
pub struct TimingContext {
    verbose: bool,
    started: Instant,
    last: Instant,
    laps: Vec<(&'static str, Duration)>,
}

impl TimingContext {
    /// Starts timing now.
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        let now = Instant::now();
        Self {
            verbose,
            started: now,
            last: now,
            laps: Vec::new(),
        }
    }

    /// Closes the current stage and returns its duration.
    pub fn lap(&mut self, stage: &'static str) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        self.last = now;
        self.laps.push((stage, elapsed));

        let seconds = elapsed.as_secs_f64();
        if self.verbose {
            info!(stage, seconds, "stage finished");
        } else {
            debug!(stage, seconds, "stage finished");
        }
        elapsed
    }

    /// Time since the context was created.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.started.elapsed()
    }

    /// Recorded stages in order.
    #[must_use]
    pub fn laps(&self) -> &[(&'static str, Duration)] {
        &self.laps
    }

    /// Whether laps are logged at `info` level.
    #[must_use]
    pub const fn is_verbose(&self) -> bool {
        self.verbose
    }
}
