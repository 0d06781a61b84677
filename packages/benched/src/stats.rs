//! Summary statistics over sample sets.

/// Fraction of the largest samples averaged by [`Summary::top_1_percent`].
pub const TOP_1_PERCENT: f64 = 0.01;

/// Fraction of the largest samples averaged by [`Summary::top_5_percent`].
pub const TOP_5_PERCENT: f64 = 0.05;

/// Count, sum, mean, maximum and worst-case tail averages of a set of samples.
///
/// The tail statistics look at the *largest* samples, which makes them outlier metrics: for
/// frame times they answer "how bad were the worst frames", not "how good were the best".
///
/// An empty sample set is valid and summarizes to all zeros.
///
/// # Examples
///
/// ```
/// use benched::Summary;
///
/// let summary = Summary::of((1..=100).map(f64::from));
///
/// assert_eq!(summary.count(), 100);
/// assert_eq!(summary.max(), 100.0);
/// assert_eq!(summary.mean(), 50.5);
/// assert_eq!(summary.top_5_percent(), 98.0);
/// assert_eq!(summary.top_1_percent(), 100.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Summary {
    count: usize,
    sum: f64,
    mean: f64,
    max: f64,
    top_5_percent: f64,
    top_1_percent: f64,
}

impl Summary {
    /// Summarizes the given samples.
    #[must_use]
    pub fn of(samples: impl IntoIterator<Item = f64>) -> Self {
        let mut sorted = samples.into_iter().collect::<Vec<_>>();
        sort_descending(&mut sorted);

        let sum = sorted.iter().sum::<f64>();

        Self {
            count: sorted.len(),
            sum,
            mean: average(&sorted),
            max: sorted.first().copied().unwrap_or_default(),
            top_5_percent: tail_average_of_sorted(&sorted, TOP_5_PERCENT),
            top_1_percent: tail_average_of_sorted(&sorted, TOP_1_PERCENT),
        }
    }

    /// Number of samples.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Sum of all samples, 0 if there are none.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Arithmetic mean, 0 if there are no samples.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Largest sample, 0 if there are no samples.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Mean of the largest 5% of samples (at least one sample).
    #[must_use]
    pub fn top_5_percent(&self) -> f64 {
        self.top_5_percent
    }

    /// Mean of the largest 1% of samples (at least one sample).
    #[must_use]
    pub fn top_1_percent(&self) -> f64 {
        self.top_1_percent
    }
}

/// Averages the largest `max(1, floor(len × fraction))` samples.
///
/// The order among equal values is irrelevant since only the values are averaged.
/// Returns 0 for an empty sample set.
///
/// # Examples
///
/// ```
/// use benched::tail_average;
///
/// let samples = [3.0, 9.0, 1.0, 7.0];
///
/// // floor(4 × 0.5) = 2 largest values: 9 and 7.
/// assert_eq!(tail_average(&samples, 0.5), 8.0);
///
/// // Always at least one value.
/// assert_eq!(tail_average(&samples, 0.01), 9.0);
/// ```
#[must_use]
pub fn tail_average(samples: &[f64], fraction: f64) -> f64 {
    let mut sorted = samples.to_vec();
    sort_descending(&mut sorted);
    tail_average_of_sorted(&sorted, fraction)
}

/// Number of samples that make up the tail of a set of `count` samples.
#[must_use]
pub(crate) fn tail_count(count: usize, fraction: f64) -> usize {
    #[expect(
        clippy::cast_precision_loss,
        reason = "sample counts are far below the range where f64 loses integer precision"
    )]
    let scaled = count as f64 * fraction;

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "floor of a non-negative value no larger than the original count"
    )]
    let floored = scaled.floor() as usize;

    floored.max(1)
}

fn sort_descending(samples: &mut [f64]) {
    samples.sort_unstable_by(|a, b| b.total_cmp(a));
}

fn tail_average_of_sorted(sorted_descending: &[f64], fraction: f64) -> f64 {
    let take = tail_count(sorted_descending.len(), fraction).min(sorted_descending.len());
    average(sorted_descending.get(..take).unwrap_or_default())
}

fn average(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "sample counts are far below the range where f64 loses integer precision"
    )]
    let count = samples.len() as f64;

    samples.iter().sum::<f64>() / count
}
