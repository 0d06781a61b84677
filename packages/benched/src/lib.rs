#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Frame, phase and activity timing for render loops and event-loop ticks.
//!
//! A [`Session`] records a sequence of frames. Within a frame, code is timed as named phases
//! (nestable, and summed per frame when a phase repeats), custom numeric metrics are
//! attached, and long-running activities can be started in one frame and completed in a
//! later one. From the recorded data a [`SessionReport`] computes five tables of tail
//! latency statistics:
//!
//! 1. Response statistics per activity category.
//! 1. Response statistics per activity category and start frame range.
//! 1. Phase time statistics across all frames.
//! 1. Frame time, phase and metric statistics per window of consecutive frames, with a
//!    health flag per window.
//! 1. One row per frame.
//!
//! Tables are handed to a [`TableSink`], for example a [`CsvDirectorySink`].
//!
//! Protocol misuse (ending a measurement that was never started, completing an unknown
//! activity, ...) never panics. The offending call is ignored or repaired and a [`Misuse`]
//! is reported through `tracing` at the error level.
//!
//! # Simple usage
//!
//! ```
//! use benched::{ReportOptions, Session};
//!
//! let mut session = Session::new("game");
//!
//! for frame in 0..3 {
//!     session.start_frame(frame);
//!
//!     session.benchmark("update", |_| {
//!         // Simulation work.
//!     });
//!
//!     session.benchmark("render", |session| {
//!         session.benchmark("shadows", |_| {
//!             // Nested phase.
//!         });
//!     });
//!
//!     session.set_metric("draw_calls", 120.0);
//!     session.end_frame();
//! }
//!
//! let report = session.to_report(&ReportOptions::default());
//! assert_eq!(report.raw_frames().rows().len(), 3);
//! assert_eq!(report.frame_times().rows().len(), 3);
//! ```
//!
//! # Activities
//!
//! An activity measures the response time of something the user triggered, which may take
//! several frames to complete:
//!
//! ```
//! use benched::Session;
//!
//! let mut session = Session::new("ui");
//!
//! session.start_frame(10);
//! session.start_activity("open_menu", "menu-1");
//! session.end_frame();
//!
//! session.start_frame(12);
//! session.complete_activity("menu-1");
//! session.end_frame();
//!
//! let activity = session.completed_activities().first().unwrap();
//! assert_eq!(activity.response_frames(), Some(2));
//! ```
//!
//! # Threading
//!
//! A session is driven by one execution context at a time and is mutated through `&mut self`.
//! Applications with several independently timed contexts (worker threads, task queues) keep
//! one session per context in a [`SessionRegistry`].

mod activity;
mod constants;
mod error;
mod export;
mod format;
mod frame;
mod measurement;
mod options;
mod pal;
mod phase_summary;
mod registry;
mod report;
mod session;
mod stats;
mod table;
#[cfg(test)]
mod testing;
mod timed;

pub use activity::Activity;
pub use error::{ExportError, Misuse, OptionsError};
#[cfg(test)]
pub(crate) use export::MockTableSink;
pub use export::{CsvDirectorySink, CsvExport, TableSink};
pub use format::{FRACTION_DIGITS, NumberFormat};
pub use frame::{Frame, FrameIndex};
pub use options::{
    DEFAULT_DELIMITER, DEFAULT_FRAME_HEALTH_THRESHOLD, DEFAULT_GROUP_SIZE,
    DEFAULT_WINDOW_HEALTH_THRESHOLD, ReportOptions, ReportOptionsBuilder,
};
pub use pal::{Clock, ManualClock, MonotonicClock};
pub use phase_summary::{PhaseStatistics, PhaseSummary, RECENT_SAMPLE_COUNT};
pub use registry::{
    ContextId, ContextResolver, EnteredContext, SessionRegistry, SharedSession, ThreadContext,
};
pub use report::{ExportOutcome, MISSING_METRIC, MISSING_PHASE, SessionReport};
pub use session::Session;
pub use stats::{Summary, TOP_1_PERCENT, TOP_5_PERCENT, tail_average};
pub use table::Table;
pub use timed::{timed, timed_iterations, timed_iterations_with_clock, timed_with_clock};
