//! Report tables built from a session's frames and completed activities.

use std::collections::BTreeSet;
use std::iter;
use std::num::NonZero;
use std::time::Duration;

use itertools::Itertools;
use tracing::{debug, error};

use crate::{Activity, Frame, NumberFormat, ReportOptions, Session, Summary, Table, TableSink};

/// Rendered in place of a custom metric that a frame never set.
pub const MISSING_METRIC: &str = "-";

/// Rendered in place of a phase that a frame never measured.
pub const MISSING_PHASE: &str = "0";

const ACTIVITY_STATISTICS_HEADERS: [&str; 9] = [
    "Count",
    "Max Response Time (ms)",
    "Avg. Response Time (ms)",
    "5% Response Time (ms)",
    "1% Response Time (ms)",
    "Max Frame Count",
    "Avg. Frame Count",
    "5% Frame Count",
    "1% Frame Count",
];

/// The five report tables describing one session.
///
/// All tables are computed eagerly from a borrowed session, so they always describe one
/// consistent state of the session. Categories, phases and metrics appear in lexicographic
/// order; frames appear in ascending index order.
///
/// # Examples
///
/// ```
/// use benched::{ReportOptions, Session};
///
/// let mut session = Session::new("main");
/// session.start_frame(0);
/// session.start_activity("tap", "button-1");
/// session.complete_activity("button-1");
/// session.end_frame();
///
/// let report = session.to_report(&ReportOptions::default());
///
/// assert_eq!(report.activities().rows().len(), 1);
/// assert_eq!(report.activities().cell(0, "Category"), Some("tap"));
/// assert_eq!(report.raw_frames().rows().len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct SessionReport {
    activities: Table,
    activities_by_frame_range: Vec<Table>,
    frame_times: Table,
    frame_windows: Table,
    raw_frames: Table,
}

/// Counts of tables written and rejected by one [`SessionReport::export()`] call.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ExportOutcome {
    written: usize,
    failed: usize,
}

impl ExportOutcome {
    /// Number of tables the sink accepted.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Number of tables the sink failed to persist.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }
}

impl SessionReport {
    pub(crate) fn generate(session: &Session, options: &ReportOptions) -> Self {
        let cells = Cells {
            format: options.number_format(),
        };

        let frames = session.frames().collect::<Vec<_>>();
        let phases = frames
            .iter()
            .copied()
            .flat_map(|frame| frame.phase_times().map(|(phase, _)| phase))
            .collect::<BTreeSet<_>>();
        let metrics = frames
            .iter()
            .copied()
            .flat_map(|frame| frame.metrics().map(|(name, _)| name))
            .collect::<BTreeSet<_>>();

        let activities_by_category = session
            .completed_activities()
            .iter()
            .into_group_map_by(|activity| activity.category())
            .into_iter()
            .sorted_unstable_by_key(|(category, _)| *category)
            .collect::<Vec<_>>();

        Self {
            activities: activity_table(&activities_by_category, cells),
            activities_by_frame_range: activities_by_category
                .iter()
                .map(|(category, activities)| {
                    activity_range_table(category, activities, options.group_size(), cells)
                })
                .collect(),
            frame_times: frame_time_table(&frames, &phases, cells),
            frame_windows: frame_window_table(&frames, &phases, &metrics, options, cells),
            raw_frames: raw_frame_table(&frames, &phases, &metrics, options, cells),
        }
    }

    /// Response statistics per activity category.
    #[must_use]
    pub fn activities(&self) -> &Table {
        &self.activities
    }

    /// Response statistics per activity category and start frame range, one table per
    /// category (in category order).
    #[must_use]
    pub fn activities_by_frame_range(&self) -> &[Table] {
        &self.activities_by_frame_range
    }

    /// Statistics of per-frame phase totals, one row per phase.
    #[must_use]
    pub fn frame_times(&self) -> &Table {
        &self.frame_times
    }

    /// Frame time, phase and metric statistics per window of consecutive frames.
    #[must_use]
    pub fn frame_windows(&self) -> &Table {
        &self.frame_windows
    }

    /// One row per frame with its timings and metrics.
    #[must_use]
    pub fn raw_frames(&self) -> &Table {
        &self.raw_frames
    }

    /// All tables, in export order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        iter::once(&self.activities)
            .chain(&self.activities_by_frame_range)
            .chain([&self.frame_times, &self.frame_windows, &self.raw_frames])
    }

    /// Hands every table to `sink`.
    ///
    /// A table the sink fails to persist is logged and skipped; the remaining tables are
    /// still exported.
    pub fn export(&self, sink: &(impl TableSink + ?Sized)) -> ExportOutcome {
        let mut outcome = ExportOutcome::default();

        for table in self.tables() {
            match sink.write_table(table) {
                Ok(()) => {
                    debug!(table = table.name(), "exported benchmark table");
                    outcome.written = outcome.written.saturating_add(1);
                }
                Err(e) => {
                    error!(table = table.name(), "exporting benchmarks failed: {e}");
                    outcome.failed = outcome.failed.saturating_add(1);
                }
            }
        }

        outcome
    }
}

/// Renders numeric cells.
#[derive(Clone, Copy, Debug)]
struct Cells {
    format: NumberFormat,
}

impl Cells {
    fn number(self, value: f64) -> String {
        self.format.format(value)
    }

    /// Renders a value measured in seconds as milliseconds.
    fn millis(self, seconds: f64) -> String {
        self.format.format(seconds * 1000.0)
    }

    fn flag(healthy: bool) -> String {
        if healthy { "1" } else { "0" }.to_owned()
    }
}

fn activity_headers(first_column: &str) -> impl Iterator<Item = &str> {
    iter::once(first_column).chain(ACTIVITY_STATISTICS_HEADERS)
}

fn activity_table(by_category: &[(&str, Vec<&Activity>)], cells: Cells) -> Table {
    let mut table = Table::new("activities", activity_headers("Category"));

    for (category, activities) in by_category {
        table.push_row(activity_row((*category).to_owned(), activities, cells));
    }

    table
}

fn activity_range_table(
    category: &str,
    activities: &[&Activity],
    group_size: NonZero<usize>,
    cells: Cells,
) -> Table {
    let group_size = NonZero::<u64>::try_from(group_size).unwrap_or(NonZero::<u64>::MAX);

    let mut table = Table::new(
        format!("activity_{category}"),
        activity_headers("Frame Range"),
    );

    let buckets = activities
        .iter()
        .copied()
        .into_group_map_by(|activity| activity.start_frame() / group_size)
        .into_iter()
        .sorted_unstable_by_key(|(bucket, _)| *bucket);

    for (bucket, members) in buckets {
        let start = bucket.saturating_mul(group_size.get());
        let end = start.saturating_add(group_size.get());

        table.push_row(activity_row(format!("{start}-{end}"), &members, cells));
    }

    table
}

fn activity_row(label: String, activities: &[&Activity], cells: Cells) -> Vec<String> {
    let response_times = Summary::of(
        activities
            .iter()
            .filter_map(|activity| activity.response_time())
            .map(|time| time.as_secs_f64()),
    );

    let response_frames = Summary::of(
        activities
            .iter()
            .filter_map(|activity| activity.response_frames())
            .map(frame_count_as_f64),
    );

    vec![
        label,
        activities.len().to_string(),
        cells.millis(response_times.max()),
        cells.millis(response_times.mean()),
        cells.millis(response_times.top_5_percent()),
        cells.millis(response_times.top_1_percent()),
        cells.number(response_frames.max()),
        cells.number(response_frames.mean()),
        cells.number(response_frames.top_5_percent()),
        cells.number(response_frames.top_1_percent()),
    ]
}

fn frame_time_table(frames: &[&Frame], phases: &BTreeSet<&str>, cells: Cells) -> Table {
    let mut table = Table::new(
        "frameTime",
        [
            "Phase",
            "Count",
            "Max Time (ms)",
            "Avg. Time (ms)",
            "5% Time (ms)",
            "1% Time (ms)",
        ],
    );

    for phase in phases {
        // Only frames that measured the phase take part.
        let summary = Summary::of(
            frames
                .iter()
                .filter_map(|frame| frame.phase_time(phase))
                .map(|time| time.as_secs_f64()),
        );

        table.push_row([
            (*phase).to_owned(),
            summary.count().to_string(),
            cells.millis(summary.max()),
            cells.millis(summary.mean()),
            cells.millis(summary.top_5_percent()),
            cells.millis(summary.top_1_percent()),
        ]);
    }

    table
}

fn frame_window_table(
    frames: &[&Frame],
    phases: &BTreeSet<&str>,
    metrics: &BTreeSet<&str>,
    options: &ReportOptions,
    cells: Cells,
) -> Table {
    let group_size = options.group_size();

    let headers = [
        "Frame Range",
        "OK",
        "Max. Frame Time (ms)",
        "Avg. Frame Time (ms)",
        "5% Frame Time (ms)",
        "1% Frame Time (ms)",
    ]
    .into_iter()
    .map(str::to_owned)
    .chain(phases.iter().flat_map(|phase| {
        ["Max", "Avg", "5%", "1%"].map(|statistic| format!("{phase} ({statistic})"))
    }))
    .chain(metrics.iter().flat_map(|metric| {
        ["Avg", "Max", "Total"].map(|statistic| format!("{metric} ({statistic})"))
    }));

    let mut table = Table::new(format!("frameTime_{group_size}"), headers);

    let mut start = 0_usize;

    for window in frames.chunks(group_size.get()) {
        let end = start.saturating_add(window.len());

        let frame_times = Summary::of(window.iter().map(|frame| frame.duration().as_secs_f64()));
        let healthy =
            frame_times.top_5_percent() < options.window_health_threshold().as_secs_f64();

        let mut row = vec![
            format!("{start}-{end}"),
            Cells::flag(healthy),
            cells.millis(frame_times.max()),
            cells.millis(frame_times.mean()),
            cells.millis(frame_times.top_5_percent()),
            cells.millis(frame_times.top_1_percent()),
        ];

        for phase in phases {
            // Frames that did not measure the phase count as zero time.
            let phase_times = Summary::of(window.iter().map(|frame| {
                frame
                    .phase_time(phase)
                    .unwrap_or(Duration::ZERO)
                    .as_secs_f64()
            }));

            row.extend([
                cells.millis(phase_times.max()),
                cells.millis(phase_times.mean()),
                cells.millis(phase_times.top_5_percent()),
                cells.millis(phase_times.top_1_percent()),
            ]);
        }

        for metric in metrics {
            let values = Summary::of(
                window
                    .iter()
                    .map(|frame| frame.metric(metric).unwrap_or(0.0)),
            );

            row.extend([
                cells.number(values.mean()),
                cells.number(values.max()),
                cells.number(values.sum()),
            ]);
        }

        table.push_row(row);
        start = end;
    }

    table
}

fn raw_frame_table(
    frames: &[&Frame],
    phases: &BTreeSet<&str>,
    metrics: &BTreeSet<&str>,
    options: &ReportOptions,
    cells: Cells,
) -> Table {
    let headers = ["Frame", "OK", "Start (ms)", "End (ms)", "Duration (ms)"]
        .into_iter()
        .chain(phases.iter().copied())
        .chain(metrics.iter().copied());

    let mut table = Table::new("raw", headers);

    for frame in frames {
        let healthy = frame.duration() < options.frame_health_threshold();

        let mut row = vec![
            frame.index().to_string(),
            Cells::flag(healthy),
            cells.millis(frame.start().as_secs_f64()),
            cells.millis(frame.end().as_secs_f64()),
            cells.millis(frame.duration().as_secs_f64()),
        ];

        row.extend(phases.iter().map(|phase| {
            frame
                .phase_time(phase)
                .map_or_else(|| MISSING_PHASE.to_owned(), |time| cells.millis(time.as_secs_f64()))
        }));

        row.extend(metrics.iter().map(|metric| {
            frame
                .metric(metric)
                .map_or_else(|| MISSING_METRIC.to_owned(), |value| cells.number(value))
        }));

        table.push_row(row);
    }

    table
}

fn frame_count_as_f64(frames: u64) -> f64 {
    #[expect(
        clippy::cast_precision_loss,
        reason = "frame counts are far below the range where f64 loses integer precision"
    )]
    let frames = frames as f64;

    frames
}
