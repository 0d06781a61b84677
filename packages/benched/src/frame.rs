//! Immutable per-frame snapshots.

use std::time::Duration;

use foldhash::HashMap;

/// Frame index as passed to [`Session::start_frame()`](crate::Session::start_frame).
pub type FrameIndex = u64;

/// Snapshot of one completed frame.
///
/// Created once by [`Session::end_frame()`](crate::Session::end_frame) and never modified
/// afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    index: FrameIndex,
    start: Duration,
    end: Duration,
    phase_times: HashMap<String, Duration>,
    metrics: HashMap<String, f64>,
}

impl Frame {
    pub(crate) fn new(
        index: FrameIndex,
        start: Duration,
        end: Duration,
        phase_times: HashMap<String, Duration>,
        metrics: HashMap<String, f64>,
    ) -> Self {
        Self {
            index,
            start,
            end,
            phase_times,
            metrics,
        }
    }

    /// The caller-supplied frame index.
    #[must_use]
    pub fn index(&self) -> FrameIndex {
        self.index
    }

    /// Clock timestamp at which the frame started.
    #[must_use]
    pub fn start(&self) -> Duration {
        self.start
    }

    /// Clock timestamp at which the frame ended.
    #[must_use]
    pub fn end(&self) -> Duration {
        self.end
    }

    /// Time between frame start and frame end.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }

    /// Total time spent in `phase` during this frame, if the phase was measured at all.
    #[must_use]
    pub fn phase_time(&self, phase: &str) -> Option<Duration> {
        self.phase_times.get(phase).copied()
    }

    /// Value of the custom metric `name` at the end of this frame, if it was set.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    /// Total time per measured phase.
    pub fn phase_times(&self) -> impl Iterator<Item = (&str, Duration)> {
        self.phase_times
            .iter()
            .map(|(phase, time)| (phase.as_str(), *time))
    }

    /// Custom metric values.
    pub fn metrics(&self) -> impl Iterator<Item = (&str, f64)> {
        self.metrics.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use foldhash::HashMapExt;

    use super::*;

    #[test]
    fn duration_is_end_minus_start() {
        let frame = Frame::new(
            7,
            Duration::from_millis(100),
            Duration::from_millis(116),
            HashMap::new(),
            HashMap::new(),
        );

        assert_eq!(frame.index(), 7);
        assert_eq!(frame.duration(), Duration::from_millis(16));
    }

    #[test]
    fn lookups_distinguish_absent_entries() {
        let mut phase_times = HashMap::new();
        phase_times.insert("render".to_string(), Duration::from_millis(3));

        let mut metrics = HashMap::new();
        metrics.insert("draw_calls".to_string(), 12.0);

        let frame = Frame::new(0, Duration::ZERO, Duration::ZERO, phase_times, metrics);

        assert_eq!(frame.phase_time("render"), Some(Duration::from_millis(3)));
        assert_eq!(frame.phase_time("physics"), None);
        assert_eq!(frame.metric("draw_calls"), Some(12.0));
        assert_eq!(frame.metric("triangles"), None);
        assert_eq!(frame.phase_times().count(), 1);
        assert_eq!(frame.metrics().count(), 1);
    }
}
