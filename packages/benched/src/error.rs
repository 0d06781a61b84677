use std::io;

use thiserror::Error;

/// Protocol misuse detected by a [`Session`](crate::Session).
///
/// Misuse never interrupts the caller: the offending call becomes a no-op (or, for
/// unclosed measurements, the measurement is force-closed) and the anomaly is reported
/// through `tracing` at the error level. The values are public so that diagnostic
/// consumers can match on the rendered messages.
#[derive(Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum Misuse {
    /// An operation that requires an active frame was called between frames.
    #[error("{operation} called without an active frame")]
    NoActiveFrame {
        /// The session operation that was attempted.
        operation: &'static str,
    },

    /// `end_measurement()` was called with no open measurement.
    #[error("attempting to end a measurement when none is active")]
    EmptyMeasurementStack,

    /// `complete_activity()` was called for an activity that is not open.
    #[error("missing activity: {id}")]
    UnknownActivity {
        /// Identifier passed by the caller.
        id: String,
    },

    /// A measurement was still open when its frame ended. It is closed at the frame end time.
    #[error("active measurement while ending frame: {phase}")]
    UnclosedMeasurement {
        /// Phase name of the measurement that was left open.
        phase: String,
    },
}

/// A table could not be persisted by a [`TableSink`](crate::TableSink).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    /// The underlying storage failed.
    #[error("exporting '{destination}' failed: {source}")]
    Io {
        /// Where the table was being written.
        destination: String,

        /// The I/O error reported by the operating system.
        source: io::Error,
    },

    /// The sink refused the table for a reason of its own.
    #[error("exporting '{destination}' was rejected: {reason}")]
    Rejected {
        /// Where the table was being written.
        destination: String,

        /// A human-readable description of why the sink refused the table.
        reason: String,
    },
}

/// Report options that cannot produce parseable output.
#[derive(Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum OptionsError {
    /// The column delimiter also appears inside formatted numbers.
    #[error(
        "column delimiter '{delimiter}' is also used as a decimal or grouping separator, rendering the output unparseable"
    )]
    DelimiterClash {
        /// The offending delimiter.
        delimiter: char,
    },
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Misuse: Send, Sync, Debug);
    assert_impl_all!(ExportError: Send, Sync, Debug);
    assert_impl_all!(OptionsError: Send, Sync, Debug);

    #[test]
    fn misuse_messages_name_the_subject() {
        let no_frame = Misuse::NoActiveFrame {
            operation: "end_frame",
        };
        assert_eq!(no_frame.to_string(), "end_frame called without an active frame");

        let unknown = Misuse::UnknownActivity {
            id: "tap-17".to_string(),
        };
        assert_eq!(unknown.to_string(), "missing activity: tap-17");

        let unclosed = Misuse::UnclosedMeasurement {
            phase: "layout".to_string(),
        };
        assert_eq!(unclosed.to_string(), "active measurement while ending frame: layout");
    }

    #[test]
    fn export_error_includes_destination() {
        let error = ExportError::Rejected {
            destination: "raw".to_string(),
            reason: "disk full".to_string(),
        };

        let message = error.to_string();
        assert!(message.contains("raw"));
        assert!(message.contains("disk full"));
    }
}
