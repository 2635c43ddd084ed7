//! # Tide Curve Reconstruction
//!
//! Published predictions only give the times and heights of high and low
//! water. Between two consecutive extrema `(t0, h0)` and `(t1, h1)` the water
//! level is modelled as half a cosine wave:
//!
//! ```text
//! h(t) = h0 + (h1 - h0) * (1 - cos(pi * (t - t0) / (t1 - t0))) / 2
//! ```
//!
//! The curve passes through every extremum with zero slope there (slack
//! water) and its value and first derivative are continuous from one segment
//! to the next, so no global spline solve is needed and no overshoot is
//! introduced between extrema.
//!
//! Outside the published range the first and last segments keep going as
//! the same cosine, i.e. the nearest complete half-period repeats, so every
//! instant of the calendar year has a height even when the data starts a few
//! hours after local midnight on January 1.
//!
//! All arithmetic is done on UTC instants so DST transitions cannot stretch
//! or squash a segment.

use crate::error::{CalendarError, ConfigError, DataError};
use crate::timezone::TimeZoneAdapter;
use crate::{TideExtremum, TideSample};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::f64::consts::PI;
use tracing::debug;

/// Continuous water level built from alternating extrema.
#[derive(Debug, Clone)]
pub struct TideCurve {
    tz: Tz,
    extrema: Vec<TideExtremum>,
    /// Extremum instants in milliseconds since the Unix epoch
    instants: Vec<i64>,
}

impl TideCurve {
    /// Validate the extrema and build the curve.
    ///
    /// The sequence must be strictly increasing in time, alternate between
    /// high and low, carry finite heights and share one timezone. The first
    /// violation is reported with its index; nothing is repaired.
    pub fn new(extrema: &[TideExtremum]) -> Result<Self, DataError> {
        if extrema.len() < 2 {
            return Err(DataError::Insufficient {
                count: extrema.len(),
            });
        }
        let tz = extrema[0].timestamp.timezone();

        for (index, record) in extrema.iter().enumerate() {
            if !record.height.is_finite() {
                return Err(DataError::NonFiniteHeight {
                    index,
                    at: record.timestamp,
                });
            }
            let found = record.timestamp.timezone();
            if found != tz {
                return Err(DataError::MixedTimezone {
                    index,
                    expected: tz,
                    found,
                });
            }
            if index == 0 {
                continue;
            }
            let previous = &extrema[index - 1];
            if record.timestamp <= previous.timestamp {
                return Err(DataError::OutOfOrder {
                    index,
                    previous: previous.timestamp,
                    current: record.timestamp,
                });
            }
            if record.kind == previous.kind {
                return Err(DataError::NotAlternating {
                    index,
                    kind: record.kind,
                    previous: previous.timestamp,
                    current: record.timestamp,
                });
            }
        }

        let instants = extrema
            .iter()
            .map(|e| e.timestamp.timestamp_millis())
            .collect();

        debug!(
            count = extrema.len(),
            first = %extrema[0].timestamp,
            last = %extrema[extrema.len() - 1].timestamp,
            "built tide curve"
        );

        Ok(Self {
            tz,
            extrema: extrema.to_vec(),
            instants,
        })
    }

    /// Zone the extrema were recorded in.
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn extrema(&self) -> &[TideExtremum] {
        &self.extrema
    }

    /// First and last published instants.
    pub fn span(&self) -> (DateTime<Tz>, DateTime<Tz>) {
        (
            self.extrema[0].timestamp,
            self.extrema[self.extrema.len() - 1].timestamp,
        )
    }

    /// Water level at any instant.
    pub fn height_at<Z: TimeZone>(&self, t: &DateTime<Z>) -> f64 {
        self.height_at_millis(t.timestamp_millis())
    }

    fn height_at_millis(&self, t: i64) -> f64 {
        let last = self.instants.len() - 1;
        let seg = match self.instants.binary_search(&t) {
            // Exactly on a published extremum.
            Ok(i) => return self.extrema[i].height,
            Err(0) => 0,
            Err(i) if i > last => last - 1,
            Err(i) => i - 1,
        };
        half_cosine(
            self.instants[seg],
            self.extrema[seg].height,
            self.instants[seg + 1],
            self.extrema[seg + 1].height,
            t,
        )
    }

    /// Published extrema within `[start, end)`.
    pub fn extrema_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> &[TideExtremum] {
        let lo = self
            .instants
            .partition_point(|&t| t < start.timestamp_millis());
        let hi = self
            .instants
            .partition_point(|&t| t < end.timestamp_millis());
        &self.extrema[lo..hi]
    }

    /// Build the dense table for one local calendar year.
    ///
    /// Samples run from local midnight on January 1 up to (not including)
    /// local midnight on the next January 1, `step` apart in elapsed time.
    /// At least two published extrema must fall inside the year; edge
    /// continuation fills the hours before the first and after the last, not
    /// whole months.
    pub fn sample_year(
        &self,
        adapter: &TimeZoneAdapter,
        year: i32,
        step: Duration,
    ) -> Result<TideTable, CalendarError> {
        if step <= Duration::zero() {
            return Err(ConfigError::InvalidSetting {
                field: "tide.step_minutes",
                reason: "sampling step must be positive".into(),
            }
            .into());
        }
        if adapter.tz() != self.tz {
            return Err(ConfigError::TimezoneMismatch {
                source_name: "tide extrema",
                expected: adapter.tz(),
                found: self.tz,
            }
            .into());
        }

        let (start, end) = adapter.year_bounds(year);
        let count = self.extrema_between(start, end).len();
        if count < 2 {
            return Err(DataError::InsufficientForYear { year, count }.into());
        }

        let capacity = ((end - start).num_seconds() / step.num_seconds().max(1)) as usize + 1;
        let mut samples = Vec::with_capacity(capacity);
        let mut t = start;
        while t < end {
            samples.push(TideSample {
                timestamp: adapter.to_local(t),
                height: self.height_at(&t),
            });
            t += step;
        }

        let (min, max) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s.height), hi.max(s.height))
            });

        debug!(year, samples = samples.len(), min, max, "sampled tide year");

        Ok(TideTable {
            year,
            tz: self.tz,
            step_minutes: step.num_minutes(),
            samples,
            min,
            max,
        })
    }
}

/// Half-cosine between `(t0, h0)` and `(t1, h1)`; continues as the same
/// cosine outside the interval.
fn half_cosine(t0: i64, h0: f64, t1: i64, h1: f64, t: i64) -> f64 {
    let x = (t - t0) as f64 / (t1 - t0) as f64;
    h0 + (h1 - h0) * (1.0 - (PI * x).cos()) / 2.0
}

/// The dense, fixed-step tide table for one local year.
#[derive(Debug, Clone, Serialize)]
pub struct TideTable {
    pub year: i32,
    pub tz: Tz,
    pub step_minutes: i64,
    pub samples: Vec<TideSample>,
    /// Lowest sampled height of the year (chart scaling)
    pub min: f64,
    /// Highest sampled height of the year (chart scaling)
    pub max: f64,
}

impl TideTable {
    /// Samples belonging to one local calendar day.
    pub fn day(&self, adapter: &TimeZoneAdapter, date: NaiveDate) -> &[TideSample] {
        let (start, end) = adapter.day_bounds(date);
        let lo = self
            .samples
            .partition_point(|s| s.timestamp.with_timezone(&Utc) < start);
        let hi = self
            .samples
            .partition_point(|s| s.timestamp.with_timezone(&Utc) < end);
        &self.samples[lo..hi]
    }
}
