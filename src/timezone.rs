//! # Time/Zone Adapter
//!
//! All astronomy runs on UTC instants while every output is shown in the
//! station's civil time. This module is the only place the two meet.
//!
//! ## DST policy
//!
//! - **Gap** (clocks spring forward): a wall-clock time that never happens is
//!   moved forward to the first instant that does exist, which is the
//!   transition itself (02:30 on a US spring-forward night becomes 03:00).
//! - **Fold** (clocks fall back): a wall-clock time that happens twice maps to
//!   the earlier instant unless the caller asks for [`Fold::Later`]. Each
//!   fold logs an [`AmbiguousTimeWarning`].

use crate::error::{AmbiguousTimeWarning, ConfigError};
use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;
use tracing::warn;

/// Longest clock jump searched when normalizing a gap. Real zones have
/// skipped at most a full day (Samoa, December 2011).
const MAX_GAP_MINUTES: i64 = 26 * 60;

/// Which instant to take when a local time occurs twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fold {
    /// The first occurrence (still on daylight time)
    #[default]
    Earlier,
    /// The second occurrence (after clocks fell back)
    Later,
}

/// How a wall-clock time maps onto the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalResolution {
    /// Exactly one instant has this local time
    Exact(DateTime<Tz>),
    /// No instant has this local time; `normalized` is the first valid one after it
    Gap { normalized: DateTime<Tz> },
    /// Two instants have this local time
    Fold {
        earlier: DateTime<Tz>,
        later: DateTime<Tz>,
    },
}

/// Converts between UTC and one station's civil time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeZoneAdapter {
    tz: Tz,
}

impl TimeZoneAdapter {
    /// Build an adapter from an IANA zone name such as `America/Los_Angeles`.
    pub fn new(name: &str) -> Result<Self, ConfigError> {
        let tz = name
            .trim()
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(name.to_string()))?;
        Ok(Self { tz })
    }

    pub fn from_tz(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// UTC instant to local civil time. Always succeeds.
    pub fn to_local(&self, utc: DateTime<Utc>) -> DateTime<Tz> {
        utc.with_timezone(&self.tz)
    }

    /// Local wall-clock time to UTC using the default policy (earlier fold).
    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        self.localize(local, Fold::Earlier).with_timezone(&Utc)
    }

    /// Local wall-clock time to a zone-aware instant, resolving folds as requested.
    pub fn localize(&self, local: NaiveDateTime, fold: Fold) -> DateTime<Tz> {
        match self.resolve(local) {
            LocalResolution::Exact(dt) => dt,
            LocalResolution::Gap { normalized } => normalized,
            LocalResolution::Fold { earlier, later } => {
                let (chosen, alternative) = match fold {
                    Fold::Earlier => (earlier, later),
                    Fold::Later => (later, earlier),
                };
                let warning = AmbiguousTimeWarning {
                    local,
                    chosen,
                    alternative,
                };
                warn!(timezone = %self.tz, "{}", warning);
                chosen
            }
        }
    }

    /// Classify a wall-clock time without choosing anything.
    pub fn resolve(&self, local: NaiveDateTime) -> LocalResolution {
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => LocalResolution::Exact(dt),
            LocalResult::Ambiguous(a, b) => {
                let (earlier, later) = if a <= b { (a, b) } else { (b, a) };
                LocalResolution::Fold { earlier, later }
            }
            LocalResult::None => LocalResolution::Gap {
                normalized: self.first_valid_after(local),
            },
        }
    }

    /// First existing instant at or after a wall-clock time inside a gap.
    fn first_valid_after(&self, local: NaiveDateTime) -> DateTime<Tz> {
        // Transitions happen on whole minutes, so scan minute boundaries.
        let mut probe = local
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(local);
        for _ in 0..MAX_GAP_MINUTES {
            probe += Duration::minutes(1);
            if let Some(dt) = self.tz.from_local_datetime(&probe).earliest() {
                return dt;
            }
        }
        // Not reachable for tzdata zones; read the time with the offset in
        // force just before the gap.
        let before = local - Duration::days(2);
        let offset = self.tz.offset_from_utc_datetime(&before);
        let utc = local - Duration::seconds(offset_seconds(&offset));
        self.tz.from_utc_datetime(&utc)
    }

    /// Start of a local calendar day as a UTC instant.
    pub fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        self.to_utc(date.and_time(NaiveTime::MIN))
    }

    /// `[start, end)` UTC instants of a local calendar day. Usually 24 h,
    /// 23 h or 25 h on transition days.
    pub fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let next = date.succ_opt().unwrap_or(NaiveDate::MAX);
        (self.local_midnight(date), self.local_midnight(next))
    }

    /// `[start, end)` UTC instants of a local calendar year.
    pub fn year_bounds(&self, year: i32) -> (DateTime<Utc>, DateTime<Utc>) {
        let first = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN);
        let next = NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap_or(NaiveDate::MAX);
        (self.local_midnight(first), self.local_midnight(next))
    }
}

/// Every calendar date of a year, in order.
pub fn dates_of_year(year: i32) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.year() == year)
        .collect()
}

fn offset_seconds(offset: &<Tz as TimeZone>::Offset) -> i64 {
    use chrono::Offset;
    offset.fix().local_minus_utc() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn unknown_zone_is_config_error() {
        let err = TimeZoneAdapter::new("Mars/Olympus_Mons").unwrap_err();
        assert_eq!(err, ConfigError::UnknownTimezone("Mars/Olympus_Mons".into()));
    }

    #[test]
    fn round_trip_outside_folds() {
        let adapter = TimeZoneAdapter::new("America/Los_Angeles").unwrap();
        let start = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();
        // Every 37 minutes through the year hits both transitions.
        let mut utc = start;
        while utc.year() == 2016 {
            let local = adapter.to_local(utc);
            if let LocalResolution::Exact(_) = adapter.resolve(local.naive_local()) {
                assert_eq!(adapter.to_utc(local.naive_local()), utc, "round trip at {utc}");
            }
            utc += Duration::minutes(37);
        }
    }

    #[test]
    fn spring_gap_moves_forward_to_transition() {
        let adapter = TimeZoneAdapter::new("America/Los_Angeles").unwrap();
        // 2016-03-13 02:30 does not exist in Los Angeles.
        let local = naive(2016, 3, 13, 2, 30);
        match adapter.resolve(local) {
            LocalResolution::Gap { normalized } => {
                assert_eq!(normalized.naive_local(), naive(2016, 3, 13, 3, 0));
                assert_eq!(
                    normalized.with_timezone(&Utc),
                    Utc.with_ymd_and_hms(2016, 3, 13, 10, 0, 0).unwrap()
                );
            }
            other => panic!("expected a gap, got {other:?}"),
        }
        assert_eq!(
            adapter.to_utc(local),
            Utc.with_ymd_and_hms(2016, 3, 13, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn fall_fold_prefers_earlier_instant() {
        let adapter = TimeZoneAdapter::new("America/Los_Angeles").unwrap();
        // 2016-11-06 01:30 happens at 08:30 UTC (PDT) and 09:30 UTC (PST).
        let local = naive(2016, 11, 6, 1, 30);
        assert!(matches!(adapter.resolve(local), LocalResolution::Fold { .. }));
        assert_eq!(
            adapter.to_utc(local),
            Utc.with_ymd_and_hms(2016, 11, 6, 8, 30, 0).unwrap()
        );
        assert_eq!(
            adapter.localize(local, Fold::Later).with_timezone(&Utc),
            Utc.with_ymd_and_hms(2016, 11, 6, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn transition_days_have_23_and_25_hours() {
        let adapter = TimeZoneAdapter::new("America/Los_Angeles").unwrap();
        let (s, e) = adapter.day_bounds(NaiveDate::from_ymd_opt(2016, 3, 13).unwrap());
        assert_eq!(e - s, Duration::hours(23));
        let (s, e) = adapter.day_bounds(NaiveDate::from_ymd_opt(2016, 11, 6).unwrap());
        assert_eq!(e - s, Duration::hours(25));
    }

    #[test]
    fn year_bounds_follow_local_midnight() {
        let adapter = TimeZoneAdapter::new("America/Los_Angeles").unwrap();
        let (start, end) = adapter.year_bounds(2016);
        assert_eq!(start, Utc.with_ymd_and_hms(2016, 1, 1, 8, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2017, 1, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn leap_year_has_366_dates() {
        assert_eq!(dates_of_year(2016).len(), 366);
        assert_eq!(dates_of_year(2015).len(), 365);
    }
}
