//! Wall-clock timing helpers

use std::time::{Duration, Instant};
use tracing::info;

/// Simple stopwatch
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}

/// Run `f` and return its output with the elapsed time
pub fn measure<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let timer = Timer::start();
    let out = f();
    (out, timer.elapsed())
}

/// Run `f` and log `"{label} took {secs}s"` at info level, even when `f`
/// returns an error.
pub fn timed<T>(label: &str, f: impl FnOnce() -> T) -> T {
    let (out, elapsed) = measure(f);
    info!(label, elapsed_secs = elapsed.as_secs_f64(), "{} took {:.3}s", label, elapsed.as_secs_f64());
    out
}
