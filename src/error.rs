//! # Error Types
//!
//! Every failure the calendar pipeline can report. Tide input problems are
//! [`DataError`]s and always name the offending record; station and engine
//! setup problems are [`ConfigError`]s and are detected before any day is
//! computed. [`CalendarError`] wraps both for the top-level build call.

use crate::ExtremumKind;
use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use std::fmt;
use thiserror::Error;

/// Malformed or insufficient tide extrema.
///
/// Indices are zero-based positions in the sequence handed to the tide engine
/// (or one-based line numbers for [`DataError::Parse`]).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// Fewer than two extrema: no segment can be modelled
    #[error("need at least 2 tide extrema to model a curve, got {count}")]
    Insufficient { count: usize },

    /// Fewer than two extrema inside the calendar year being built
    #[error("need at least 2 tide extrema inside {year} to model its curve, got {count}")]
    InsufficientForYear { year: i32, count: usize },

    /// Record is not strictly later than its predecessor
    #[error("extremum {index} at {current} is not after extremum {} at {previous}", .index.saturating_sub(1))]
    OutOfOrder {
        index: usize,
        previous: DateTime<Tz>,
        current: DateTime<Tz>,
    },

    /// Two highs or two lows in a row
    #[error("extremum {index} at {current} is a second consecutive {kind} (previous at {previous})")]
    NotAlternating {
        index: usize,
        kind: ExtremumKind,
        previous: DateTime<Tz>,
        current: DateTime<Tz>,
    },

    /// Height is NaN or infinite
    #[error("extremum {index} at {at} has a non-finite height")]
    NonFiniteHeight { index: usize, at: DateTime<Tz> },

    /// Record carries a different zone than the first record
    #[error("extremum {index} is in timezone {found}, expected {expected}")]
    MixedTimezone {
        index: usize,
        expected: Tz,
        found: Tz,
    },

    /// Input text could not be read as tide predictions
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// Invalid station metadata or engine settings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("latitude {0} is outside -90..=90 degrees")]
    InvalidLatitude(f64),

    #[error("longitude {0} is outside -180..=180 degrees")]
    InvalidLongitude(f64),

    #[error("elevation {0} m is not a finite number of meters above -500")]
    InvalidElevation(f64),

    #[error("unknown IANA timezone '{0}'")]
    UnknownTimezone(String),

    #[error("station field '{0}' is missing or empty")]
    MissingField(&'static str),

    #[error("station '{0}' is not in the station directory")]
    UnknownStation(String),

    #[error("setting '{field}' is invalid: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    /// Tide data and astronomy were computed for different years
    #[error("{source_name} covers year {found}, calendar year is {expected}")]
    YearMismatch {
        source_name: &'static str,
        expected: i32,
        found: i32,
    },

    /// Tide data and astronomy were computed in different zones
    #[error("{source_name} uses timezone {found}, station timezone is {expected}")]
    TimezoneMismatch {
        source_name: &'static str,
        expected: Tz,
        found: Tz,
    },
}

/// Top-level failure of a calendar build.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalendarError {
    #[error("tide data error: {0}")]
    Data(#[from] DataError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// A local time that occurs twice because clocks fell back.
///
/// Not an error: the adapter picks one instant by policy and logs this so
/// callers can see which records were affected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmbiguousTimeWarning {
    /// The wall-clock time as supplied
    pub local: NaiveDateTime,
    /// The instant that was used
    pub chosen: DateTime<Tz>,
    /// The instant that was rejected
    pub alternative: DateTime<Tz>,
}

impl fmt::Display for AmbiguousTimeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "local time {} is ambiguous; using {} rather than {}",
            self.local, self.chosen, self.alternative
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn out_of_order_message_names_both_records() {
        let tz: Tz = "UTC".parse().unwrap();
        let at = tz.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();
        let err = DataError::OutOfOrder {
            index: 4,
            previous: at,
            current: at,
        };
        assert!(err.to_string().starts_with("extremum 4 at"));
        assert!(err.to_string().contains("after extremum 3"));

        // Index 0 has no predecessor but must still format.
        let first = DataError::OutOfOrder {
            index: 0,
            previous: at,
            current: at,
        };
        assert!(first.to_string().contains("after extremum 0"));
    }
}
