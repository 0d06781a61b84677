//! Test helpers shared by the unit tests of this crate.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{Event, Level, Subscriber, subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Counts error-level events.
#[derive(Debug)]
struct ErrorCounter {
    errors: Arc<AtomicUsize>,
}

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Runs `f` and returns how many error-level diagnostics it emitted on this thread.
pub(crate) fn capture_errors(f: impl FnOnce()) -> usize {
    let errors = Arc::new(AtomicUsize::new(0));

    let counting = tracing_subscriber::registry().with(ErrorCounter {
        errors: Arc::clone(&errors),
    });

    subscriber::with_default(counting, f);

    errors.load(Ordering::Relaxed)
}
