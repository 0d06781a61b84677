//! Report configuration.

use std::num::NonZero;
use std::time::Duration;

use crate::{NumberFormat, OptionsError};

/// Default number of frames per frame-range bucket and per report window.
pub const DEFAULT_GROUP_SIZE: NonZero<usize> = match NonZero::new(100) {
    Some(value) => value,
    None => panic!("100 is not zero"),
};

/// Default threshold below which a window's 5% tail frame time counts as healthy.
pub const DEFAULT_WINDOW_HEALTH_THRESHOLD: Duration = Duration::from_millis(50);

/// Default threshold below which a single frame's duration counts as healthy.
pub const DEFAULT_FRAME_HEALTH_THRESHOLD: Duration = Duration::from_millis(5);

/// Default column delimiter.
pub const DEFAULT_DELIMITER: char = ';';

/// Controls how a [`SessionReport`](crate::SessionReport) groups and renders data.
///
/// Use [`ReportOptions::builder()`] to customize; [`ReportOptions::default()`] gives the
/// standard report shape.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
/// use std::time::Duration;
///
/// use benched::{NumberFormat, ReportOptions};
///
/// let options = ReportOptions::builder()
///     .group_size(NonZero::new(60).unwrap())
///     .window_health_threshold(Duration::from_millis(17))
///     .delimiter(',')
///     .number_format(NumberFormat::plain())
///     .build()
///     .unwrap();
///
/// assert_eq!(options.group_size().get(), 60);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReportOptions {
    group_size: NonZero<usize>,
    window_health_threshold: Duration,
    frame_health_threshold: Duration,
    delimiter: char,
    number_format: NumberFormat,
}

impl ReportOptions {
    /// Starts building a customized set of options from the defaults.
    #[must_use]
    pub fn builder() -> ReportOptionsBuilder {
        ReportOptionsBuilder::new()
    }

    /// Number of frames per activity frame-range bucket and per frame window.
    #[must_use]
    pub fn group_size(&self) -> NonZero<usize> {
        self.group_size
    }

    /// A window is healthy if its 5% tail frame time is strictly below this value.
    #[must_use]
    pub fn window_health_threshold(&self) -> Duration {
        self.window_health_threshold
    }

    /// A frame is healthy if its duration is strictly below this value.
    #[must_use]
    pub fn frame_health_threshold(&self) -> Duration {
        self.frame_health_threshold
    }

    /// Character separating columns in exported tables.
    #[must_use]
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// How numeric cells are rendered.
    #[must_use]
    pub fn number_format(&self) -> NumberFormat {
        self.number_format
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
            window_health_threshold: DEFAULT_WINDOW_HEALTH_THRESHOLD,
            frame_health_threshold: DEFAULT_FRAME_HEALTH_THRESHOLD,
            delimiter: DEFAULT_DELIMITER,
            number_format: NumberFormat::default(),
        }
    }
}

/// Builds [`ReportOptions`].
///
/// Every property is optional and starts at its default.
#[derive(Clone, Copy, Debug)]
#[must_use]
pub struct ReportOptionsBuilder {
    options: ReportOptions,
}

impl ReportOptionsBuilder {
    fn new() -> Self {
        Self {
            options: ReportOptions::default(),
        }
    }

    /// Sets the number of frames per bucket/window. Defaults to 100.
    pub fn group_size(mut self, group_size: NonZero<usize>) -> Self {
        self.options.group_size = group_size;
        self
    }

    /// Sets the window health threshold. Defaults to 50 milliseconds.
    pub fn window_health_threshold(mut self, threshold: Duration) -> Self {
        self.options.window_health_threshold = threshold;
        self
    }

    /// Sets the single-frame health threshold. Defaults to 5 milliseconds.
    pub fn frame_health_threshold(mut self, threshold: Duration) -> Self {
        self.options.frame_health_threshold = threshold;
        self
    }

    /// Sets the column delimiter. Defaults to `;`.
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.options.delimiter = delimiter;
        self
    }

    /// Sets the numeric rendering. Defaults to [`NumberFormat::default()`].
    pub fn number_format(mut self, number_format: NumberFormat) -> Self {
        self.options.number_format = number_format;
        self
    }

    /// Validates and returns the options.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::DelimiterClash`] if the delimiter is also used as the decimal
    /// or grouping separator, since such output could not be parsed back into columns.
    pub fn build(self) -> Result<ReportOptions, OptionsError> {
        let delimiter = self.options.delimiter;
        let format = self.options.number_format;

        if format.decimal_separator() == delimiter || format.grouping_separator() == Some(delimiter)
        {
            return Err(OptionsError::DelimiterClash { delimiter });
        }

        Ok(self.options)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_default() {
        let built = ReportOptions::builder().build().unwrap();
        assert_eq!(built, ReportOptions::default());

        assert_eq!(built.group_size().get(), 100);
        assert_eq!(built.window_health_threshold(), Duration::from_millis(50));
        assert_eq!(built.frame_health_threshold(), Duration::from_millis(5));
        assert_eq!(built.delimiter(), ';');
        assert_eq!(built.number_format(), NumberFormat::default());
    }

    #[test]
    fn builder_applies_overrides() {
        let options = ReportOptions::builder()
            .group_size(NonZero::new(10).unwrap())
            .frame_health_threshold(Duration::from_millis(16))
            .delimiter('\t')
            .build()
            .unwrap();

        assert_eq!(options.group_size().get(), 10);
        assert_eq!(options.frame_health_threshold(), Duration::from_millis(16));
        assert_eq!(options.delimiter(), '\t');
    }

    #[test]
    fn rejects_delimiter_equal_to_decimal_separator() {
        let result = ReportOptions::builder().delimiter(',').build();

        assert_eq!(result, Err(OptionsError::DelimiterClash { delimiter: ',' }));
    }

    #[test]
    fn rejects_delimiter_equal_to_grouping_separator() {
        let result = ReportOptions::builder()
            .delimiter('.')
            .number_format(NumberFormat::new(',', Some('.')))
            .build();

        assert_eq!(result, Err(OptionsError::DelimiterClash { delimiter: '.' }));
    }

    #[test]
    fn comma_delimiter_is_fine_with_plain_numbers() {
        let options = ReportOptions::builder()
            .delimiter(',')
            .number_format(NumberFormat::plain())
            .build()
            .unwrap();

        assert_eq!(options.delimiter(), ',');
    }
}
