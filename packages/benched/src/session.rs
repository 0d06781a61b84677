use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, SystemTime};

use foldhash::{HashMap, HashMapExt};
use tracing::{debug, error};

use crate::activity::ActivityTracker;
use crate::measurement::{MeasurementStack, PhaseSamples};
use crate::pal::{Clock, ClockFacade};
use crate::{
    Activity, CsvDirectorySink, CsvExport, Frame, FrameIndex, Misuse, PhaseSummary, ReportOptions,
    SessionReport,
};

/// The frame that is currently being recorded.
#[derive(Clone, Copy, Debug)]
struct ActiveFrame {
    index: FrameIndex,
    start: Duration,
}

/// Records frames, phase timings, custom metrics and activities for one execution context.
///
/// A session is driven by a single caller at a time (all recording methods take
/// `&mut self`). Use one session per execution context, for example one per worker thread,
/// and a [`SessionRegistry`](crate::SessionRegistry) to find the session of the current
/// context.
///
/// Misuse (ending a frame that was never started, ending a measurement that was never
/// started, completing an unknown activity, ...) never panics: the call is ignored and the
/// problem is logged via `tracing` at the error level.
///
/// # Examples
///
/// ```
/// use benched::{ReportOptions, Session};
///
/// let mut session = Session::new("main");
///
/// for frame in 0..3 {
///     session.start_frame(frame);
///
///     session.benchmark("update", |_| {
///         // Game logic goes here.
///     });
///
///     session.start_measurement("render");
///     // Rendering goes here.
///     session.end_measurement();
///
///     session.set_metric("draw_calls", 42.0);
///     session.end_frame();
/// }
///
/// assert_eq!(session.frames().count(), 3);
///
/// let report = session.to_report(&ReportOptions::default());
/// assert_eq!(report.frame_times().rows().len(), 2); // "render" and "update"
/// ```
#[derive(Debug)]
pub struct Session {
    name: String,
    clock: ClockFacade,

    // Reset at the start of every frame.
    phases: PhaseSamples,
    metrics: HashMap<String, f64>,
    measurements: MeasurementStack,

    activities: ActivityTracker,

    // Entries are never modified once inserted (unless the caller reuses a frame index).
    frames: BTreeMap<FrameIndex, Frame>,

    current_frame: Option<ActiveFrame>,
}

impl Session {
    /// Creates a session that reads time from the operating system monotonic clock.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_clock_facade(name.into(), ClockFacade::target())
    }

    /// Creates a session that reads time from the given clock.
    #[must_use]
    pub fn with_clock(name: impl Into<String>, clock: impl Clock) -> Self {
        Self::with_clock_facade(name.into(), ClockFacade::custom(clock))
    }

    fn with_clock_facade(name: String, clock: ClockFacade) -> Self {
        Self {
            name,
            clock,
            phases: PhaseSamples::new(),
            metrics: HashMap::new(),
            measurements: MeasurementStack::new(),
            activities: ActivityTracker::new(),
            frames: BTreeMap::new(),
            current_frame: None,
        }
    }

    /// The name given to the session when it was created.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts recording frame `index`.
    ///
    /// Any phase samples, metrics and open measurements left over from the previous frame are
    /// discarded, even if that frame was never ended.
    ///
    /// Frame indexes are expected to be unique. Starting a frame with the index of an already
    /// recorded frame replaces that frame's record once the new frame ends.
    pub fn start_frame(&mut self, index: FrameIndex) {
        self.current_frame = Some(ActiveFrame {
            index,
            start: self.clock.now(),
        });

        self.phases.clear();
        self.measurements.clear();
        self.metrics.clear();
    }

    /// Ends the current frame and stores its [`Frame`] record.
    ///
    /// Measurements still open at this point are logged as misuse and closed at the current
    /// time, so their time is included in the frame's phase totals.
    pub fn end_frame(&mut self) {
        let Some(active) = self.current_frame else {
            self.report(&Misuse::NoActiveFrame {
                operation: "end_frame",
            });
            return;
        };

        while let Some(open) = self.measurements.peek() {
            let misuse = Misuse::UnclosedMeasurement {
                phase: open.phase.clone(),
            };
            self.report(&misuse);
            self.end_measurement();
        }

        let end = self.clock.now();

        let frame = Frame::new(
            active.index,
            active.start,
            end,
            self.phases.totals(),
            self.metrics.clone(),
        );

        self.frames.insert(active.index, frame);
        self.current_frame = None;
    }

    /// Opens a measurement of `phase`.
    ///
    /// Measurements nest: every call must be matched by one [`end_measurement()`][1] call,
    /// which closes the most recently opened measurement.
    ///
    /// [1]: Self::end_measurement
    pub fn start_measurement(&mut self, phase: impl Into<String>) {
        self.measurements.push(phase, self.clock.now());
    }

    /// Closes the most recently opened measurement and records its elapsed time as a sample
    /// of its phase.
    pub fn end_measurement(&mut self) {
        let now = self.clock.now();

        let Some(open) = self.measurements.pop() else {
            self.report(&Misuse::EmptyMeasurementStack);
            return;
        };

        self.phases.record(open.phase, now.saturating_sub(open.started));
    }

    /// Measures `body` as one sample of `phase` and returns whatever `body` returns.
    ///
    /// The measurement is closed even if `body` panics. The session is lent to `body` so
    /// that nested phases can be measured inside it.
    ///
    /// # Examples
    ///
    /// ```
    /// use benched::Session;
    ///
    /// let mut session = Session::new("main");
    /// session.start_frame(0);
    ///
    /// let visible = session.benchmark("cull", |session| {
    ///     session.benchmark("cull_bvh", |_| 17)
    /// });
    ///
    /// assert_eq!(visible, 17);
    /// session.end_frame();
    /// ```
    pub fn benchmark<R>(
        &mut self,
        phase: impl Into<String>,
        body: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.start_measurement(phase);

        let mut session = scopeguard::guard(self, |session| session.end_measurement());
        body(&mut **session)
    }

    /// Overwrites the value of a custom metric for the current frame.
    pub fn set_metric(&mut self, name: impl Into<String>, value: f64) {
        self.metrics.insert(name.into(), value);
    }

    /// Updates a custom metric for the current frame from its previous value.
    ///
    /// If the metric has not been set in this frame, `update` receives `initial`.
    ///
    /// # Examples
    ///
    /// ```
    /// use benched::Session;
    ///
    /// let mut session = Session::new("main");
    /// session.start_frame(0);
    ///
    /// for _ in 0..3 {
    ///     session.update_metric("draw_calls", 0.0, |calls| calls + 1.0);
    /// }
    ///
    /// assert_eq!(session.metric("draw_calls"), Some(3.0));
    /// ```
    pub fn update_metric(
        &mut self,
        name: impl Into<String>,
        initial: f64,
        update: impl FnOnce(f64) -> f64,
    ) {
        let value = self.metrics.entry(name.into()).or_insert(initial);
        *value = update(*value);
    }

    /// Starts tracking activity `id` of the given category.
    ///
    /// If `id` is already open, the call is ignored and the original start is kept, so
    /// repeated start signals for work that has not yet completed do not hide its latency.
    pub fn start_activity(&mut self, category: impl Into<String>, id: impl Into<String>) {
        let id = id.into();

        if self.activities.is_open(&id) {
            return;
        }

        let Some(active) = self.current_frame else {
            self.report(&Misuse::NoActiveFrame {
                operation: "start_activity",
            });
            return;
        };

        self.activities
            .start(id, category, active.index, self.clock.now());
    }

    /// Completes the open activity `id` in the current frame.
    pub fn complete_activity(&mut self, id: &str) {
        let Some(active) = self.current_frame else {
            self.report(&Misuse::NoActiveFrame {
                operation: "complete_activity",
            });
            return;
        };

        let now = self.clock.now();

        if !self.activities.complete(id, active.index, now) {
            self.report(&Misuse::UnknownActivity { id: id.to_owned() });
        }
    }

    /// Appends the phase samples currently held by `other` to this session's samples.
    ///
    /// Only the in-progress samples are copied; frames and activities are not.
    pub fn copy_results(&mut self, other: &Self) {
        self.phases.extend_from(&other.phases);
    }

    /// Summarizes the phase samples of the current (or, between frames, the last) frame.
    #[must_use]
    pub fn phase_summary(&self) -> PhaseSummary {
        PhaseSummary::from_samples(&self.phases)
    }

    /// Index of the frame being recorded, `None` between frames.
    #[must_use]
    pub fn current_frame(&self) -> Option<FrameIndex> {
        self.current_frame.map(|active| active.index)
    }

    /// Number of measurements currently open.
    #[must_use]
    pub fn measurement_depth(&self) -> usize {
        self.measurements.depth()
    }

    /// Samples recorded for `phase` since the current frame started.
    #[must_use]
    pub fn phase_samples(&self, phase: &str) -> Option<&[Duration]> {
        self.phases.get(phase)
    }

    /// Value of a custom metric in the current frame.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    /// The record of frame `index`, if that frame has ended.
    #[must_use]
    pub fn frame(&self, index: FrameIndex) -> Option<&Frame> {
        self.frames.get(&index)
    }

    /// All recorded frames, in ascending index order.
    pub fn frames(&self) -> impl ExactSizeIterator<Item = &Frame> {
        self.frames.values()
    }

    /// All completed activities, in completion order.
    #[must_use]
    pub fn completed_activities(&self) -> &[Activity] {
        self.activities.completed()
    }

    /// Number of activities started but not yet completed.
    #[must_use]
    pub fn open_activity_count(&self) -> usize {
        self.activities.open_count()
    }

    /// Builds all report tables from the frames and activities recorded so far.
    #[must_use]
    pub fn to_report(&self, options: &ReportOptions) -> SessionReport {
        SessionReport::generate(self, options)
    }

    /// Writes every report table as a CSV file into a new directory under `base_dir`.
    ///
    /// The directory is named `BenchmarkSession <session name> <unix seconds>`. Failures are
    /// logged; a table that cannot be written does not prevent the others from being written.
    ///
    /// Returns the directory together with the number of tables written and failed, or `None`
    /// if the directory could not be created.
    pub fn export_csv(
        &self,
        base_dir: impl AsRef<Path>,
        options: &ReportOptions,
    ) -> Option<CsvExport> {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or(0, |since_epoch| since_epoch.as_secs());

        let directory = base_dir
            .as_ref()
            .join(format!("BenchmarkSession {} {timestamp}", self.name));

        let sink = match CsvDirectorySink::create(&directory, options.delimiter()) {
            Ok(sink) => sink,
            Err(e) => {
                error!(session = %self.name, "exporting benchmarks failed: {e}");
                return None;
            }
        };

        let outcome = self.to_report(options).export(&sink);
        debug!(
            session = %self.name,
            directory = %directory.display(),
            written = outcome.written(),
            failed = outcome.failed(),
            "exported benchmark report"
        );

        Some(CsvExport::new(directory, outcome))
    }

    fn report(&self, misuse: &Misuse) {
        error!(session = %self.name, "{misuse}");
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;
    use crate::ManualClock;
    use crate::testing::capture_errors;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn advance_then_panic(clock: &ManualClock, elapsed: Duration) {
        clock.advance(elapsed);
        panic!("simulated failure inside a measured phase");
    }

    fn create_test_session() -> (Session, ManualClock) {
        let clock = ManualClock::new();
        (Session::with_clock("test", clock.clone()), clock)
    }

    #[test]
    fn single_measurement_round_trip() {
        let (mut session, clock) = create_test_session();

        session.start_frame(0);
        session.start_measurement("render");
        clock.advance(ms(4));
        session.end_measurement();
        clock.advance(ms(1));
        session.end_frame();

        assert_eq!(session.frames().len(), 1);

        let frame = session.frame(0).unwrap();
        assert_eq!(frame.phase_time("render"), Some(ms(4)));
        assert_eq!(frame.duration(), ms(5));
        assert_eq!(session.current_frame(), None);

        session.start_frame(1);
        assert_eq!(session.phase_samples("render"), None);
        assert_eq!(session.measurement_depth(), 0);
    }

    #[test]
    fn repeated_phase_sums_samples() {
        let (mut session, clock) = create_test_session();

        session.start_frame(0);
        for elapsed in [1, 2, 3] {
            session.start_measurement("layout");
            clock.advance(ms(elapsed));
            session.end_measurement();
        }
        session.end_frame();

        assert_eq!(session.frame(0).unwrap().phase_time("layout"), Some(ms(6)));
    }

    #[test]
    fn nested_measurements_pop_by_position() {
        let (mut session, clock) = create_test_session();

        session.start_frame(0);
        session.start_measurement("outer");
        clock.advance(ms(1));
        session.start_measurement("inner");
        clock.advance(ms(2));
        session.end_measurement();
        clock.advance(ms(3));
        session.end_measurement();
        session.end_frame();

        let frame = session.frame(0).unwrap();
        assert_eq!(frame.phase_time("inner"), Some(ms(2)));
        assert_eq!(frame.phase_time("outer"), Some(ms(6)));
    }

    #[test]
    fn end_measurement_with_empty_stack_is_reported_no_op() {
        let (mut session, _clock) = create_test_session();
        session.start_frame(0);

        let errors = capture_errors(|| session.end_measurement());

        assert_eq!(errors, 1);
        assert!(session.phase_samples("anything").is_none());
        assert_eq!(session.phase_summary().phases().count(), 0);
    }

    #[test]
    fn end_frame_without_start_is_reported_no_op() {
        let (mut session, _clock) = create_test_session();

        let errors = capture_errors(|| session.end_frame());

        assert_eq!(errors, 1);
        assert_eq!(session.frames().len(), 0);
    }

    #[test]
    fn end_frame_twice_records_once() {
        let (mut session, _clock) = create_test_session();
        session.start_frame(0);
        session.end_frame();

        let errors = capture_errors(|| session.end_frame());

        assert_eq!(errors, 1);
        assert_eq!(session.frames().len(), 1);
    }

    #[test]
    fn unclosed_measurements_are_force_closed() {
        let (mut session, clock) = create_test_session();

        session.start_frame(0);
        session.start_measurement("outer");
        clock.advance(ms(2));
        session.start_measurement("inner");
        clock.advance(ms(3));

        let errors = capture_errors(|| session.end_frame());

        assert_eq!(errors, 2);
        let frame = session.frame(0).unwrap();
        assert_eq!(frame.phase_time("inner"), Some(ms(3)));
        assert_eq!(frame.phase_time("outer"), Some(ms(5)));
        assert_eq!(session.measurement_depth(), 0);
    }

    #[test]
    fn start_frame_discards_unfinished_state() {
        let (mut session, clock) = create_test_session();

        session.start_frame(0);
        session.start_measurement("abandoned");
        session.set_metric("m", 1.0);
        clock.advance(ms(1));

        session.start_frame(1);
        assert_eq!(session.measurement_depth(), 0);
        assert_eq!(session.metric("m"), None);

        session.end_frame();

        assert!(session.frame(0).is_none());
        assert_eq!(session.frame(1).unwrap().phase_times().count(), 0);
    }

    #[test]
    fn benchmark_passes_value_through() {
        let (mut session, clock) = create_test_session();
        session.start_frame(0);

        let value = session.benchmark("compute", |_| {
            clock.advance(ms(7));
            "done"
        });

        assert_eq!(value, "done");
        assert_eq!(session.phase_samples("compute"), Some([ms(7)].as_slice()));
        assert_eq!(session.measurement_depth(), 0);
    }

    #[test]
    fn benchmark_closes_measurement_on_panic() {
        let (mut session, clock) = create_test_session();
        session.start_frame(0);

        let result = catch_unwind(AssertUnwindSafe(|| {
            session.benchmark("explodes", |_| advance_then_panic(&clock, ms(2)));
        }));

        assert!(result.is_err());
        assert_eq!(session.measurement_depth(), 0);
        assert_eq!(session.phase_samples("explodes"), Some([ms(2)].as_slice()));
    }

    #[test]
    fn benchmark_supports_nesting() {
        let (mut session, clock) = create_test_session();
        session.start_frame(0);

        session.benchmark("outer", |session| {
            clock.advance(ms(1));
            session.benchmark("inner", |_| clock.advance(ms(2)));
        });
        session.end_frame();

        let frame = session.frame(0).unwrap();
        assert_eq!(frame.phase_time("outer"), Some(ms(3)));
        assert_eq!(frame.phase_time("inner"), Some(ms(2)));
    }

    #[test]
    fn metrics_are_snapshotted_per_frame() {
        let (mut session, _clock) = create_test_session();

        session.start_frame(0);
        session.set_metric("entities", 10.0);
        session.set_metric("entities", 12.0);
        session.update_metric("spawned", 5.0, |v| v * 2.0);
        session.update_metric("spawned", 0.0, |v| v + 1.0);
        session.end_frame();

        session.start_frame(1);
        session.end_frame();

        let first = session.frame(0).unwrap();
        assert_eq!(first.metric("entities"), Some(12.0));
        assert_eq!(first.metric("spawned"), Some(11.0));

        let second = session.frame(1).unwrap();
        assert_eq!(second.metric("entities"), None);
    }

    #[test]
    fn activity_spans_frames() {
        let (mut session, clock) = create_test_session();

        session.start_frame(10);
        clock.advance(ms(3));
        session.start_activity("tap", "a1");
        session.end_frame();

        session.start_frame(11);
        session.end_frame();

        session.start_frame(12);
        clock.advance(ms(30));
        session.complete_activity("a1");
        session.end_frame();

        let activity = session.completed_activities().first().unwrap();
        assert_eq!(activity.category(), "tap");
        assert_eq!(activity.start_frame(), 10);
        assert_eq!(activity.response_frames(), Some(2));
        assert_eq!(activity.response_time(), Some(ms(30)));
        assert_eq!(session.open_activity_count(), 0);
    }

    #[test]
    fn repeated_start_activity_keeps_first_start() {
        let (mut session, clock) = create_test_session();

        session.start_frame(0);
        session.start_activity("scroll", "s");
        let first_start = clock.now();
        session.end_frame();

        session.start_frame(1);
        clock.advance(ms(16));
        session.start_activity("scroll", "s");
        clock.advance(ms(16));
        session.complete_activity("s");
        session.end_frame();

        let activity = session.completed_activities().first().unwrap();
        assert_eq!(activity.start_frame(), 0);
        assert_eq!(activity.start_time(), first_start);
        assert_eq!(activity.response_time(), Some(ms(32)));
    }

    #[test]
    fn start_activity_without_frame_is_reported_no_op() {
        let (mut session, _clock) = create_test_session();

        let errors = capture_errors(|| session.start_activity("tap", "a1"));

        assert_eq!(errors, 1);
        assert_eq!(session.open_activity_count(), 0);
    }

    #[test]
    fn complete_activity_without_frame_is_reported_no_op() {
        let (mut session, _clock) = create_test_session();
        session.start_frame(0);
        session.start_activity("tap", "a1");
        session.end_frame();

        let errors = capture_errors(|| session.complete_activity("a1"));

        assert_eq!(errors, 1);
        assert_eq!(session.open_activity_count(), 1);
        assert!(session.completed_activities().is_empty());
    }

    #[test]
    fn complete_unknown_activity_is_reported_no_op() {
        let (mut session, _clock) = create_test_session();
        session.start_frame(0);

        let errors = capture_errors(|| session.complete_activity("ghost"));

        assert_eq!(errors, 1);
        assert!(session.completed_activities().is_empty());
    }

    #[test]
    fn reused_frame_index_overwrites() {
        let (mut session, clock) = create_test_session();

        session.start_frame(5);
        clock.advance(ms(1));
        session.end_frame();

        session.start_frame(5);
        clock.advance(ms(9));
        session.end_frame();

        assert_eq!(session.frames().len(), 1);
        assert_eq!(session.frame(5).unwrap().duration(), ms(9));
    }

    #[test]
    fn frames_iterate_in_index_order() {
        let (mut session, _clock) = create_test_session();

        for index in [3, 1, 2] {
            session.start_frame(index);
            session.end_frame();
        }

        let indexes = session.frames().map(Frame::index).collect::<Vec<_>>();
        assert_eq!(indexes, vec![1, 2, 3]);
    }

    #[test]
    fn copy_results_merges_current_samples() {
        let (mut main, clock) = create_test_session();
        let mut worker = Session::with_clock("worker", clock.clone());

        main.start_frame(0);
        main.benchmark("io", |_| clock.advance(ms(1)));

        worker.start_frame(0);
        worker.benchmark("io", |_| clock.advance(ms(2)));
        worker.benchmark("decode", |_| clock.advance(ms(3)));

        main.copy_results(&worker);
        main.end_frame();

        let frame = main.frame(0).unwrap();
        assert_eq!(frame.phase_time("io"), Some(ms(3)));
        assert_eq!(frame.phase_time("decode"), Some(ms(3)));
    }

    static_assertions::assert_impl_all!(Session: Send, Sync);
}
