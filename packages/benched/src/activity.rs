//! Responsiveness activities that may span several frames.

use std::time::Duration;

use foldhash::{HashMap, HashMapExt};

use crate::FrameIndex;

/// One tracked unit of user-perceived work, from start signal to completion signal.
///
/// Activities handed out by a [`Session`](crate::Session) are always completed; open
/// activities stay internal to the session.
#[derive(Clone, Debug, PartialEq)]
pub struct Activity {
    category: String,
    start_frame: FrameIndex,
    start_time: Duration,
    end_frame: Option<FrameIndex>,
    end_time: Option<Duration>,
}

impl Activity {
    pub(crate) fn new(category: String, start_frame: FrameIndex, start_time: Duration) -> Self {
        Self {
            category,
            start_frame,
            start_time,
            end_frame: None,
            end_time: None,
        }
    }

    /// The grouping key supplied when the activity was started.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Frame during which the activity was started.
    #[must_use]
    pub fn start_frame(&self) -> FrameIndex {
        self.start_frame
    }

    /// Timestamp at which the activity was started.
    #[must_use]
    pub fn start_time(&self) -> Duration {
        self.start_time
    }

    /// Frame during which the activity was completed.
    #[must_use]
    pub fn end_frame(&self) -> Option<FrameIndex> {
        self.end_frame
    }

    /// Timestamp at which the activity was completed.
    #[must_use]
    pub fn end_time(&self) -> Option<Duration> {
        self.end_time
    }

    /// Time from start to completion, `None` until completed.
    #[must_use]
    pub fn response_time(&self) -> Option<Duration> {
        self.end_time
            .map(|end| end.saturating_sub(self.start_time))
    }

    /// Number of frames from start to completion, `None` until completed.
    ///
    /// An activity completed in the frame it started in has a frame count of zero.
    #[must_use]
    pub fn response_frames(&self) -> Option<u64> {
        self.end_frame
            .map(|end| end.saturating_sub(self.start_frame))
    }
}

/// Open activities by identifier plus the append-only list of completed ones.
#[derive(Clone, Debug, Default)]
pub(crate) struct ActivityTracker {
    open: HashMap<String, Activity>,
    completed: Vec<Activity>,
}

impl ActivityTracker {
    pub(crate) fn new() -> Self {
        Self {
            open: HashMap::new(),
            completed: Vec::new(),
        }
    }

    pub(crate) fn is_open(&self, id: &str) -> bool {
        self.open.contains_key(id)
    }

    /// Opens an activity. An already open `id` keeps its original start.
    pub(crate) fn start(
        &mut self,
        id: impl Into<String>,
        category: impl Into<String>,
        frame: FrameIndex,
        now: Duration,
    ) {
        self.open
            .entry(id.into())
            .or_insert_with(|| Activity::new(category.into(), frame, now));
    }

    /// Completes the open activity `id`. Returns `false` if no such activity is open.
    pub(crate) fn complete(&mut self, id: &str, frame: FrameIndex, now: Duration) -> bool {
        let Some(mut activity) = self.open.remove(id) else {
            return false;
        };

        activity.end_frame = Some(frame);
        activity.end_time = Some(now);
        self.completed.push(activity);

        true
    }

    pub(crate) fn open_count(&self) -> usize {
        self.open.len()
    }

    pub(crate) fn completed(&self) -> &[Activity] {
        &self.completed
    }
}
