//! Console summary of the phase samples collected in the current frame.

use std::fmt;
use std::time::Duration;

use crate::NumberFormat;
use crate::measurement::PhaseSamples;

/// Number of most recent samples averaged by [`PhaseStatistics::recent_mean`].
pub const RECENT_SAMPLE_COUNT: usize = 100;

/// Snapshot of per-phase sample statistics, ordered by sample count (most frequent first).
///
/// Obtained from [`Session::phase_summary()`](crate::Session::phase_summary). The `Display`
/// implementation renders one aligned line per phase, framed by marker lines.
#[derive(Clone, Debug)]
pub struct PhaseSummary {
    phases: Vec<PhaseStatistics>,
}

/// Statistics of the samples of one phase.
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseStatistics {
    name: String,
    count: usize,
    total: Duration,
    mean: Duration,
    max: Duration,
    recent_mean: Duration,
}

impl PhaseSummary {
    pub(crate) fn from_samples(samples: &PhaseSamples) -> Self {
        let mut phases = samples
            .iter()
            .map(|(name, samples)| PhaseStatistics::new(name, samples))
            .collect::<Vec<_>>();

        phases.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

        Self { phases }
    }

    /// Statistics per phase, most frequently sampled first.
    pub fn phases(&self) -> impl Iterator<Item = &PhaseStatistics> {
        self.phases.iter()
    }

    /// Whether no phase has any samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Prints the summary to stdout, or nothing at all if there are no samples.
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    pub fn print_to_stdout(&self) {
        if self.is_empty() {
            return;
        }

        print!("{self}");
    }
}

impl PhaseStatistics {
    fn new(name: &str, samples: &[Duration]) -> Self {
        let recent_start = samples.len().saturating_sub(RECENT_SAMPLE_COUNT);
        let recent = samples.get(recent_start..).unwrap_or_default();

        Self {
            name: name.to_owned(),
            count: samples.len(),
            total: samples.iter().sum(),
            mean: mean_of(samples),
            max: samples.iter().max().copied().unwrap_or_default(),
            recent_mean: mean_of(recent),
        }
    }

    /// Phase name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of samples.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Sum of all samples.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Mean sample.
    #[must_use]
    pub fn mean(&self) -> Duration {
        self.mean
    }

    /// Largest sample.
    #[must_use]
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Mean of the last [`RECENT_SAMPLE_COUNT`] samples.
    #[must_use]
    pub fn recent_mean(&self) -> Duration {
        self.recent_mean
    }
}

impl fmt::Display for PhaseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = NumberFormat::plain();

        let name_width = self.phases.iter().map(|p| p.name.len()).max().unwrap_or(0);
        let count_width = self
            .phases
            .iter()
            .map(|p| p.count.to_string().len())
            .max()
            .unwrap_or(0);

        writeln!(f, "--- BENCHMARKS ---")?;

        for phase in &self.phases {
            writeln!(
                f,
                "[{name:<name_width$}] {count:<count_width$} times, {total}s total, {mean}ms avg, {max}ms max, last {RECENT_SAMPLE_COUNT}: {recent}ms avg",
                name = phase.name,
                count = phase.count,
                total = format.format(phase.total.as_secs_f64()),
                mean = format.format(millis(phase.mean)),
                max = format.format(millis(phase.max)),
                recent = format.format(millis(phase.recent_mean)),
            )?;
        }

        writeln!(f, "------------------")
    }
}

fn mean_of(samples: &[Duration]) -> Duration {
    let count = u32::try_from(samples.len()).unwrap_or(u32::MAX);

    samples
        .iter()
        .sum::<Duration>()
        .checked_div(count)
        .unwrap_or_default()
}

fn millis(value: Duration) -> f64 {
    value.as_secs_f64() * 1000.0
}
