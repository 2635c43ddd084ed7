//! # Sun * Moon * Tide Calendar Core
//!
//! This library turns one year of published high/low water predictions and a
//! station's coordinates into everything a printed Sun * Moon * Tide calendar
//! needs, one record per local calendar day.
//!
//! ## Data Flow
//! 1. **Tide**: alternating extrema → half-cosine curve → dense table ([`tide_curve`])
//! 2. **Astronomy**: coordinates + dates → rise/set, tracks, phase, seasons ([`astro`])
//! 3. **Merge**: both → one [`DayRecord`] per local date ([`calendar`])
//!
//! Every timestamp handed out is in the station's civil time; conversions go
//! through [`timezone::TimeZoneAdapter`].
//!
//! ## Core Types
//! - [`TideExtremum`]: a published high or low water
//! - [`TideSample`]: one point of the reconstructed curve
//! - [`StationInfo`]: where and when the calendar is for
//! - [`AstroDayRecord`]: the day's sun and moon facts
//! - [`DayRecord`]: what a renderer draws for one day

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod astro;
pub mod calendar;
pub mod config;
pub mod error;
pub mod lunar;
pub mod noaa;
pub mod report;
pub mod solar;
pub mod station;
pub mod tide_curve;
pub mod timezone;

pub use calendar::{build_calendar, Calendar};
pub use config::{AstroConfig, Config, EngineConfig, TideConfig};
pub use error::{AmbiguousTimeWarning, CalendarError, ConfigError, DataError};
pub use station::StationInfo;

/// High or low water.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtremumKind {
    High,
    Low,
}

impl fmt::Display for ExtremumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtremumKind::High => f.write_str("high"),
            ExtremumKind::Low => f.write_str("low"),
        }
    }
}

/// A published high or low water.
///
/// # Example
/// ```
/// use chrono::TimeZone;
/// use sun_moon_tide::{ExtremumKind, TideExtremum};
///
/// let tz: chrono_tz::Tz = "America/Los_Angeles".parse().unwrap();
/// let high = TideExtremum {
///     timestamp: tz.with_ymd_and_hms(2016, 7, 4, 6, 12, 0).unwrap(),
///     height: 5.4,
///     kind: ExtremumKind::High,
/// };
/// assert_eq!(high.kind, ExtremumKind::High);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TideExtremum {
    /// Local civil time of the event
    pub timestamp: DateTime<Tz>,
    /// Height above station datum, in the datum's units
    pub height: f64,
    pub kind: ExtremumKind,
}

/// One point of the reconstructed tide curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TideSample {
    /// Local civil time
    pub timestamp: DateTime<Tz>,
    /// Interpolated height, same units as the extrema
    pub height: f64,
}

/// Where a body sits in the local sky.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TrackPoint {
    pub timestamp: DateTime<Tz>,
    /// Degrees above the horizon (negative below), refraction not applied
    pub altitude_deg: f64,
    /// Degrees east of true north, 0..360
    pub azimuth_deg: f64,
}

/// Direction of a horizon crossing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Crossing {
    Rise,
    Set,
}

/// A body crossing the horizon.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HorizonEvent {
    pub kind: Crossing,
    pub timestamp: DateTime<Tz>,
    /// Azimuth at the moment of crossing
    pub azimuth_deg: f64,
}

/// Highest point of a body's daily path.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Transit {
    pub timestamp: DateTime<Tz>,
    pub altitude_deg: f64,
}

/// Whether a body crossed the horizon during a local day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Visibility {
    RisesAndSets,
    /// Up for the whole day (midnight sun, circumpolar moon)
    AlwaysAbove,
    /// Down for the whole day (polar night)
    AlwaysBelow,
}

/// One body's facts for one local day.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BodyDay {
    /// First rise of the day, if any
    pub rise: Option<DateTime<Tz>>,
    /// First set of the day, if any
    pub set: Option<DateTime<Tz>>,
    /// Every crossing of the day in time order (at most two of each kind)
    pub crossings: Vec<HorizonEvent>,
    pub transit: Option<Transit>,
    pub visibility: Visibility,
    /// Positions at a fixed interval from local midnight
    pub track: Vec<TrackPoint>,
}

/// Principal lunar phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PhaseKind {
    NewMoon,
    FirstQuarter,
    FullMoon,
    LastQuarter,
}

/// A principal phase and the moment it happens.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PhaseEvent {
    pub kind: PhaseKind,
    pub timestamp: DateTime<Tz>,
}

/// Solstices and equinoxes, named by month so they read the same in both hemispheres.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SeasonKind {
    MarchEquinox,
    JuneSolstice,
    SeptemberEquinox,
    DecemberSolstice,
}

impl SeasonKind {
    /// Season whose start is at this apparent solar longitude (multiple of 90°).
    pub fn from_longitude(lon_deg: f64) -> Self {
        match ((lon_deg.rem_euclid(360.0) + 45.0) / 90.0).floor() as i32 % 4 {
            0 => SeasonKind::MarchEquinox,
            1 => SeasonKind::JuneSolstice,
            2 => SeasonKind::SeptemberEquinox,
            _ => SeasonKind::DecemberSolstice,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeasonKind::MarchEquinox => "March equinox",
            SeasonKind::JuneSolstice => "June solstice",
            SeasonKind::SeptemberEquinox => "September equinox",
            SeasonKind::DecemberSolstice => "December solstice",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SeasonEvent {
    pub kind: SeasonKind,
    pub timestamp: DateTime<Tz>,
}

/// Sun and moon facts for one local calendar day.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AstroDayRecord {
    pub date: NaiveDate,
    pub sun: BodyDay,
    pub moon: BodyDay,
    /// Fraction of the lunation at the phase reference hour: 0 new, 0.5 full, wraps at 1
    pub moon_phase: f64,
    /// Illuminated fraction of the disc at the phase reference hour: 0 new, 1 full
    pub moon_illumination: f64,
    /// Icon index for a set of lunation pictures, 0 = new
    pub lunation_day: u32,
    pub phase_event: Option<PhaseEvent>,
    pub season: Option<SeasonEvent>,
}

/// Everything a renderer needs for one local calendar day.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    /// Curve samples from local midnight up to (not including) the next one
    pub tides: Vec<TideSample>,
    /// Published highs and lows that fall on this date
    pub extrema: Vec<TideExtremum>,
    pub astro: AstroDayRecord,
}
