//! Manually driven clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::constants::ERR_POISONED_LOCK;
use crate::pal::Clock;

/// Clock that only moves when told to.
///
/// Clones share the same underlying time, so a test (or a fixed-timestep simulation) can
/// keep one handle while a [`Session`](crate::Session) owns another and observe the session
/// reacting to time progression.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use benched::{ManualClock, Session};
///
/// let clock = ManualClock::new();
/// let mut session = Session::with_clock("simulation", clock.clone());
///
/// session.start_frame(0);
/// session.start_measurement("physics");
/// clock.advance(Duration::from_millis(4));
/// session.end_measurement();
/// session.end_frame();
///
/// let frame = session.frame(0).unwrap();
/// assert_eq!(frame.phase_time("physics"), Some(Duration::from_millis(4)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Creates a clock that reads zero until advanced.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().expect(ERR_POISONED_LOCK);
        *now = now.saturating_add(delta);
    }

    /// Sets the clock to an absolute timestamp.
    ///
    /// Callers are responsible for keeping the clock monotonic. Setting an earlier value than
    /// a previously observed one makes subsequent elapsed times saturate at zero.
    pub fn set(&self, now: Duration) {
        *self.now.lock().expect(ERR_POISONED_LOCK) = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().expect(ERR_POISONED_LOCK)
    }
}
