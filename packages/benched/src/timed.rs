//! Ad-hoc timing of code blocks outside of any session.

use std::time::Duration;

use tracing::debug;

use crate::{Clock, MonotonicClock, NumberFormat};

/// Runs `body` once, logs how long it took at the debug level and returns its result.
///
/// # Examples
///
/// ```
/// let sum = benched::timed("sum", || (1..=10).sum::<u32>());
///
/// assert_eq!(sum, 55);
/// ```
pub fn timed<R>(name: &str, body: impl FnOnce() -> R) -> R {
    timed_with_clock(&MonotonicClock::new(), name, body)
}

/// Like [`timed()`] but reads time from `clock`.
pub fn timed_with_clock<R>(clock: &impl Clock, name: &str, body: impl FnOnce() -> R) -> R {
    let started = clock.now();
    let result = body();
    let elapsed = clock.now().saturating_sub(started);

    log_elapsed(name, elapsed);

    result
}

/// Runs `body` `iterations` times, logs the mean time per iteration at the debug level and
/// returns that mean.
///
/// Zero iterations never call `body` and report a zero mean.
///
/// # Examples
///
/// ```
/// let mut calls = 0;
/// benched::timed_iterations("increment", 3, || calls += 1);
///
/// assert_eq!(calls, 3);
/// ```
pub fn timed_iterations(name: &str, iterations: u32, body: impl FnMut()) -> Duration {
    timed_iterations_with_clock(&MonotonicClock::new(), name, iterations, body)
}

/// Like [`timed_iterations()`] but reads time from `clock`.
pub fn timed_iterations_with_clock(
    clock: &impl Clock,
    name: &str,
    iterations: u32,
    mut body: impl FnMut(),
) -> Duration {
    let started = clock.now();

    for _ in 0..iterations {
        body();
    }

    let mean = clock
        .now()
        .saturating_sub(started)
        .checked_div(iterations)
        .unwrap_or_default();

    log_elapsed(name, mean);

    mean
}

fn log_elapsed(name: &str, elapsed: Duration) {
    let millis = NumberFormat::plain().format(elapsed.as_secs_f64() * 1000.0);
    debug!("[{name}] {millis}ms");
}
