//! Fixed-precision number rendering for report cells.

/// Number of fractional digits in every formatted report number.
pub const FRACTION_DIGITS: usize = 3;

/// Renders numbers with exactly three fractional digits and configurable separators.
///
/// The default uses a German-style locale: `,` as the decimal separator and `.` to
/// group thousands, so that the `;`-delimited tables open directly in spreadsheet software
/// configured for that locale.
///
/// # Examples
///
/// ```
/// use benched::NumberFormat;
///
/// let format = NumberFormat::default();
/// assert_eq!(format.format(1234567.891), "1.234.567,891");
///
/// let plain = NumberFormat::plain();
/// assert_eq!(plain.format(1234567.891), "1234567.891");
/// assert_eq!(plain.format(0.5), "0.500");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NumberFormat {
    decimal_separator: char,
    grouping_separator: Option<char>,
}

impl NumberFormat {
    /// Creates a format with the given separators.
    #[must_use]
    pub const fn new(decimal_separator: char, grouping_separator: Option<char>) -> Self {
        Self {
            decimal_separator,
            grouping_separator,
        }
    }

    /// `.` as the decimal separator, no digit grouping.
    #[must_use]
    pub const fn plain() -> Self {
        Self::new('.', None)
    }

    /// The character placed between the integer and fractional parts.
    #[must_use]
    pub const fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    /// The character placed between groups of three integer digits, if any.
    #[must_use]
    pub const fn grouping_separator(&self) -> Option<char> {
        self.grouping_separator
    }

    /// Formats a value with exactly three fractional digits.
    ///
    /// Non-finite values are rendered by the standard library (`NaN`, `inf`) since there is
    /// no meaningful fixed-point representation for them.
    #[must_use]
    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return value.to_string();
        }

        let fixed = format!("{:.*}", FRACTION_DIGITS, value.abs());
        let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

        let mut result = String::with_capacity(fixed.len().saturating_add(integer.len()));

        // Values that round to zero do not get a sign.
        if value.is_sign_negative() && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
            result.push('-');
        }

        for (index, group) in integer.as_bytes().rchunks(3).rev().enumerate() {
            if let Some(separator) = self.grouping_separator.filter(|_| index != 0) {
                result.push(separator);
            }

            result.extend(group.iter().copied().map(char::from));
        }

        result.push(self.decimal_separator);
        result.push_str(fraction);

        result
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::new(',', Some('.'))
    }
}
