// Facade that dispatches to either the build target clock or a caller-supplied clock.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::pal::{Clock, MonotonicClock};

/// Clock used by a session.
///
/// The common case (the monotonic system clock) is dispatched statically; anything else
/// goes through a trait object.
#[derive(Clone)]
pub(crate) enum ClockFacade {
    Target(MonotonicClock),
    Custom(Arc<dyn Clock>),
}

impl ClockFacade {
    pub(crate) fn target() -> Self {
        Self::Target(MonotonicClock::new())
    }

    pub(crate) fn custom(clock: impl Clock) -> Self {
        Self::Custom(Arc::new(clock))
    }
}

// Facade types are trivial pass-through layers - not worth testing.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl Clock for ClockFacade {
    fn now(&self) -> Duration {
        match self {
            Self::Target(clock) => clock.now(),
            Self::Custom(clock) => clock.now(),
        }
    }
}

// Debug implementations have no API contract to test.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl fmt::Debug for ClockFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target(clock) => f.debug_tuple("ClockFacade::Target").field(clock).finish(),
            Self::Custom(clock) => f.debug_tuple("ClockFacade::Custom").field(clock).finish(),
        }
    }
}
