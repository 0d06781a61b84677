//! Platform abstraction layer for timestamps.
//!
//! Sessions read time exclusively through the [`Clock`] trait. The build target clock is
//! [`MonotonicClock`]; [`ManualClock`] lets callers (and tests) drive time explicitly.

mod abstractions;
mod facade;
mod manual;
mod real;

pub use abstractions::Clock;
pub(crate) use facade::ClockFacade;
pub use manual::ManualClock;
pub use real::MonotonicClock;
