//! End-to-end recording scenarios driven through the public API with a manual clock.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use benched::{ManualClock, Session};
use tracing::{Event, Level, Subscriber, subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

struct ErrorCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn count_errors(f: impl FnOnce()) -> usize {
    let errors = Arc::new(AtomicUsize::new(0));
    let counting = tracing_subscriber::registry().with(ErrorCounter(Arc::clone(&errors)));

    subscriber::with_default(counting, f);

    errors.load(Ordering::Relaxed)
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[test]
fn frame_loop_records_phase_totals_and_metrics() {
    let clock = ManualClock::new();
    let mut session = Session::with_clock("loop", clock.clone());

    for frame in 0..10_u64 {
        session.start_frame(frame);

        session.benchmark("update", |_| clock.advance(ms(1)));

        session.benchmark("render", |session| {
            clock.advance(ms(2));
            session.benchmark("shadows", |_| clock.advance(ms(3)));
        });

        // A second "update" in the same frame is summed with the first.
        session.benchmark("update", |_| clock.advance(ms(4)));

        session.update_metric("objects", 10.0, |objects| objects * 2.0);
        session.end_frame();
    }

    assert_eq!(session.frames().len(), 10);

    for (expected_index, frame) in (0_u64..).zip(session.frames()) {
        assert_eq!(frame.index(), expected_index);
        assert_eq!(frame.duration(), ms(10));
        assert_eq!(frame.phase_time("update"), Some(ms(5)));
        assert_eq!(frame.phase_time("render"), Some(ms(5)));
        assert_eq!(frame.phase_time("shadows"), Some(ms(3)));
        assert_eq!(frame.metric("objects"), Some(20.0));
    }

    let last = session.frame(9).unwrap();
    assert_eq!(last.start(), ms(90));
    assert_eq!(last.end(), ms(100));
}

#[test]
fn misuse_is_logged_and_recovered() {
    let clock = ManualClock::new();
    let mut session = Session::with_clock("misuse", clock.clone());

    let errors = count_errors(|| {
        // No frame yet.
        session.end_frame();
        session.start_activity("tap", "a");
        session.complete_activity("a");

        session.start_frame(0);

        // Nothing to end.
        session.end_measurement();

        // Unknown activity.
        session.complete_activity("never-started");

        // Left open when the frame ends.
        session.start_measurement("leak");
        clock.advance(ms(7));
        session.end_frame();
    });

    assert_eq!(errors, 6);

    let frame = session.frame(0).unwrap();
    assert_eq!(frame.phase_time("leak"), Some(ms(7)));
    assert_eq!(session.measurement_depth(), 0);
    assert!(session.completed_activities().is_empty());
    assert_eq!(session.open_activity_count(), 0);
}

#[test]
fn clean_usage_logs_no_errors() {
    let clock = ManualClock::new();
    let mut session = Session::with_clock("clean", clock.clone());

    let errors = count_errors(|| {
        session.start_frame(0);
        session.start_activity("tap", "a");
        session.benchmark("work", |_| clock.advance(ms(1)));
        session.complete_activity("a");
        session.end_frame();
    });

    assert_eq!(errors, 0);
}

#[test]
fn activity_spans_frames() {
    let clock = ManualClock::new();
    let mut session = Session::with_clock("activities", clock.clone());

    session.start_frame(100);
    session.start_activity("load_level", "level-2");
    clock.advance(ms(16));
    session.end_frame();

    for frame in 101..=104 {
        session.start_frame(frame);
        clock.advance(ms(16));
        session.end_frame();
    }

    assert_eq!(session.open_activity_count(), 1);

    session.start_frame(105);
    session.complete_activity("level-2");
    session.end_frame();

    let activity = session.completed_activities().first().unwrap();

    assert_eq!(activity.category(), "load_level");
    assert_eq!(activity.start_frame(), 100);
    assert_eq!(activity.end_frame(), Some(105));
    assert_eq!(activity.response_frames(), Some(5));
    assert_eq!(activity.response_time(), Some(ms(80)));
    assert_eq!(session.open_activity_count(), 0);
}

#[test]
fn panicking_benchmark_body_still_closes_measurement() {
    let clock = ManualClock::new();
    let mut session = Session::with_clock("panic", clock.clone());
    session.start_frame(0);

    let result = catch_unwind(AssertUnwindSafe(|| {
        session.benchmark("explodes", |_| {
            clock.advance(ms(2));
            panic!("simulated failure");
        });
    }));

    assert!(result.is_err());
    assert_eq!(session.measurement_depth(), 0);
    assert_eq!(session.phase_samples("explodes"), Some(&[ms(2)][..]));
}

#[test]
fn copied_results_appear_in_phase_summary() {
    let clock = ManualClock::new();

    let mut worker = Session::with_clock("worker", clock.clone());
    worker.start_frame(0);
    worker.benchmark("decode", |_| clock.advance(ms(3)));
    worker.benchmark("decode", |_| clock.advance(ms(5)));

    let mut main = Session::with_clock("main", clock.clone());
    main.start_frame(0);
    main.benchmark("render", |_| clock.advance(ms(1)));
    main.copy_results(&worker);

    let summary = main.phase_summary();
    let phases = summary.phases().collect::<Vec<_>>();

    assert_eq!(phases.len(), 2);

    let decode = phases.first().unwrap();
    assert_eq!(decode.name(), "decode");
    assert_eq!(decode.count(), 2);
    assert_eq!(decode.total(), ms(8));
    assert_eq!(decode.max(), ms(5));

    let rendered = summary.to_string();
    assert!(rendered.contains("[decode]"));
    assert!(rendered.contains("[render]"));
}
