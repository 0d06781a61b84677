//! Per-frame phase samples and the stack of open measurements.

use std::time::Duration;

use foldhash::{HashMap, HashMapExt};

/// Elapsed-time samples per phase, collected during the current frame.
#[derive(Clone, Debug, Default)]
pub(crate) struct PhaseSamples {
    samples: HashMap<String, Vec<Duration>>,
}

impl PhaseSamples {
    pub(crate) fn new() -> Self {
        Self {
            samples: HashMap::new(),
        }
    }

    pub(crate) fn record(&mut self, phase: impl Into<String>, elapsed: Duration) {
        self.samples.entry(phase.into()).or_default().push(elapsed);
    }

    /// Appends every sample of `other`, keeping the existing samples of each phase first.
    pub(crate) fn extend_from(&mut self, other: &Self) {
        for (phase, samples) in &other.samples {
            self.samples
                .entry(phase.clone())
                .or_default()
                .extend_from_slice(samples);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.samples.clear();
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub(crate) fn get(&self, phase: &str) -> Option<&[Duration]> {
        self.samples.get(phase).map(Vec::as_slice)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &[Duration])> {
        self.samples
            .iter()
            .map(|(phase, samples)| (phase.as_str(), samples.as_slice()))
    }

    /// Total time per phase. A phase entered many times contributes the sum of its samples.
    pub(crate) fn totals(&self) -> HashMap<String, Duration> {
        self.samples
            .iter()
            .map(|(phase, samples)| (phase.clone(), samples.iter().sum()))
            .collect()
    }
}

/// One open measurement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct OpenMeasurement {
    pub(crate) phase: String,
    pub(crate) started: Duration,
}

/// Last-in-first-out stack of open measurements.
///
/// Entries are matched by position only: closing always pops the most recently opened
/// measurement, whatever its phase name.
#[derive(Clone, Debug, Default)]
pub(crate) struct MeasurementStack {
    open: Vec<OpenMeasurement>,
}

impl MeasurementStack {
    pub(crate) fn new() -> Self {
        Self { open: Vec::new() }
    }

    pub(crate) fn push(&mut self, phase: impl Into<String>, started: Duration) {
        self.open.push(OpenMeasurement {
            phase: phase.into(),
            started,
        });
    }

    pub(crate) fn pop(&mut self) -> Option<OpenMeasurement> {
        self.open.pop()
    }

    pub(crate) fn peek(&self) -> Option<&OpenMeasurement> {
        self.open.last()
    }

    pub(crate) fn depth(&self) -> usize {
        self.open.len()
    }

    pub(crate) fn clear(&mut self) {
        self.open.clear();
    }
}
