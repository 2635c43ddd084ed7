//! # Daily Aggregator
//!
//! Joins the dense tide table and the astronomy year into one [`DayRecord`]
//! per local calendar date. Anything that could make the two halves disagree
//! (year, zone, missing days) is checked before the first record is built,
//! so a calendar is either complete or not produced at all.

use crate::astro::{AstroEngine, AstroYear};
use crate::config::EngineConfig;
use crate::error::{CalendarError, ConfigError};
use crate::station::StationInfo;
use crate::tide_curve::{TideCurve, TideTable};
use crate::timezone::{dates_of_year, TimeZoneAdapter};
use crate::{DayRecord, SeasonEvent, TideExtremum};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

/// A finished year, ready for rendering or JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct Calendar {
    pub station: StationInfo,
    pub days: Vec<DayRecord>,
    /// Lowest published water of the year
    pub tide_min: f64,
    /// Highest published water of the year
    pub tide_max: f64,
    pub seasons: Vec<SeasonEvent>,
}

impl Calendar {
    pub fn day(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.days
            .binary_search_by_key(&date, |d| d.date)
            .ok()
            .map(|i| &self.days[i])
    }
}

/// Build a station's calendar for `station.year`.
///
/// Validates the settings and station, builds the tide curve and the
/// astronomy, then merges them day by day.
pub fn build_calendar(
    station: &StationInfo,
    extrema: &[TideExtremum],
    config: &EngineConfig,
) -> Result<Calendar, CalendarError> {
    config.validate()?;
    let adapter = station.validate()?;
    let year = station.year;

    let curve = TideCurve::new(extrema)?;
    let step = Duration::minutes(config.tide.step_minutes as i64);
    let table = curve.sample_year(&adapter, year, step)?;

    let engine = AstroEngine::for_station(station, config.astro)?;
    debug!(station = %station.id, year, "computing astronomy");
    let astro = engine.year(year);

    let seasons = astro.seasons.clone();
    let days = DailyAggregator::new(adapter, year).merge(&curve, &table, astro)?;

    let (tide_min, tide_max) = published_range(&curve, &adapter, year);

    info!(
        station = %station.place_name(),
        year,
        days = days.len(),
        tide_min,
        tide_max,
        "calendar built"
    );

    Ok(Calendar {
        station: station.clone(),
        days,
        tide_min,
        tide_max,
        seasons,
    })
}

/// Lowest and highest published extrema inside the local year.
fn published_range(curve: &TideCurve, adapter: &TimeZoneAdapter, year: i32) -> (f64, f64) {
    let (start, end) = adapter.year_bounds(year);
    curve
        .extrema_between(start, end)
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
            (lo.min(e.height), hi.max(e.height))
        })
}

/// Merges per-day outputs of both engines for one station year.
#[derive(Debug, Clone, Copy)]
pub struct DailyAggregator {
    adapter: TimeZoneAdapter,
    year: i32,
}

impl DailyAggregator {
    pub fn new(adapter: TimeZoneAdapter, year: i32) -> Self {
        DailyAggregator { adapter, year }
    }

    /// Both engine outputs must describe this aggregator's year and zone.
    pub fn check(&self, table: &TideTable, astro: &AstroYear) -> Result<(), ConfigError> {
        let tz = self.adapter.tz();
        for (source_name, found_year, found_tz) in [
            ("tide table", table.year, table.tz),
            ("astronomy", astro.year, astro.tz),
        ] {
            if found_year != self.year {
                return Err(ConfigError::YearMismatch {
                    source_name,
                    expected: self.year,
                    found: found_year,
                });
            }
            if found_tz != tz {
                return Err(ConfigError::TimezoneMismatch {
                    source_name,
                    expected: tz,
                    found: found_tz,
                });
            }
        }
        let expected_days = dates_of_year(self.year).len();
        if astro.days.len() != expected_days {
            return Err(ConfigError::YearMismatch {
                source_name: "astronomy",
                expected: self.year,
                found: astro.days.first().map_or(self.year, |d| d.date.year()),
            });
        }
        Ok(())
    }

    /// One record per local date, in date order.
    pub fn merge(
        &self,
        curve: &TideCurve,
        table: &TideTable,
        astro: AstroYear,
    ) -> Result<Vec<DayRecord>, ConfigError> {
        self.check(table, &astro)?;

        let days = astro
            .days
            .into_iter()
            .map(|astro| {
                let (start, end) = self.adapter.day_bounds(astro.date);
                DayRecord {
                    date: astro.date,
                    tides: table.day(&self.adapter, astro.date).to_vec(),
                    extrema: curve.extrema_between(start, end).to_vec(),
                    astro,
                }
            })
            .collect();
        Ok(days)
    }
}
