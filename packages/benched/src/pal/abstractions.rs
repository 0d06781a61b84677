//! Platform abstraction trait definitions.

use std::fmt::Debug;
use std::time::Duration;

/// A monotonic source of timestamps.
///
/// Timestamps are expressed as the time elapsed since an arbitrary origin chosen by the clock.
/// The only requirement is that consecutive calls never go backwards. All timestamps that
/// end up in one [`Session`](crate::Session) come from the same clock, so they are
/// comparable with each other even though the origin is unspecified.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use benched::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// clock.advance(Duration::from_millis(16));
///
/// assert_eq!(clock.now(), Duration::from_millis(16));
/// ```
pub trait Clock: Debug + Send + Sync + 'static {
    /// Returns the current timestamp.
    fn now(&self) -> Duration;
}
