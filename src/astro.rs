//! # Astronomical Engine
//!
//! Turns the sun and moon ephemerides into the per-day facts a calendar shows:
//! rise and set times, transit, altitude/azimuth tracks, moon phase and the
//! solstices and equinoxes. Ephemerides run on UTC; every result is handed
//! back in the station's civil time through the [`TimeZoneAdapter`].
//!
//! ## Horizon crossings
//!
//! A body has risen when its topocentric altitude exceeds
//! `-(refraction + semidiameter + dip)`. The altitude is sampled every
//! `search_step_minutes` across the local day; since no body's altitude moves
//! faster than [`MAX_ALTITUDE_RATE_DEG_PER_HOUR`], a step of 20 minutes or
//! less bounds the change between samples to ~5°. Each sign change is refined
//! by bisection to one second. A turning point close to the horizon may hide
//! two crossings inside one step (grazing rise/set near the poles), so such
//! turning points are refined with a golden-section search first.
//!
//! Days without a crossing are normal at high latitude and are reported as
//! [`Visibility::AlwaysAbove`] or [`Visibility::AlwaysBelow`].

use crate::config::AstroConfig;
use crate::error::ConfigError;
use crate::lunar::{self, MoonPosition, EARTH_RADIUS_KM};
use crate::solar::{self, normalize_deg, Epoch, Equatorial, SunPosition};
use crate::station::{validate_coordinates, StationInfo};
use crate::timezone::{dates_of_year, TimeZoneAdapter};
use crate::{
    AstroDayRecord, BodyDay, Crossing, HorizonEvent, PhaseEvent, PhaseKind, SeasonEvent,
    SeasonKind, TrackPoint, Transit, Visibility,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

/// Upper bound on how fast any body's altitude changes: Earth's rotation
/// relative to the sun (15.04°/h) plus a margin for parallax.
pub const MAX_ALTITUDE_RATE_DEG_PER_HOUR: f64 = 15.5;

/// Bisection stops once the bracket is this narrow.
const ROOT_TOLERANCE_MS: i64 = 1_000;

/// WGS-84 polar/equatorial axis ratio
const EARTH_AXIS_RATIO: f64 = 0.996_647_19;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Body {
    Sun,
    Moon,
}

/// Altitude and azimuth seen from the observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Horizontal {
    pub altitude_deg: f64,
    /// Degrees east of true north
    pub azimuth_deg: f64,
}

/// A point on the Earth's surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub latitude_deg: f64,
    /// East positive
    pub longitude_deg: f64,
    pub elevation_m: f64,
    rho_sin_phi: f64,
    rho_cos_phi: f64,
}

impl Observer {
    pub fn new(latitude_deg: f64, longitude_deg: f64, elevation_m: f64) -> Result<Self, ConfigError> {
        validate_coordinates(latitude_deg, longitude_deg)?;
        if !elevation_m.is_finite() {
            return Err(ConfigError::InvalidElevation(elevation_m));
        }
        // Geocentric position of the observer (Meeus ch. 11).
        let phi = latitude_deg.to_radians();
        let u = (EARTH_AXIS_RATIO * phi.tan()).atan();
        let h = elevation_m / (EARTH_RADIUS_KM * 1000.0);
        Ok(Observer {
            latitude_deg,
            longitude_deg,
            elevation_m,
            rho_sin_phi: EARTH_AXIS_RATIO * u.sin() + h * phi.sin(),
            rho_cos_phi: u.cos() + h * phi.cos(),
        })
    }

    /// Topocentric altitude/azimuth of a geocentric position at a given
    /// Greenwich apparent sidereal time (Meeus ch. 13 and 40).
    pub fn horizontal(&self, eq: &Equatorial, gast_deg: f64) -> Horizontal {
        let phi = self.latitude_deg.to_radians();
        let hour_angle = (gast_deg + self.longitude_deg - eq.ra_deg).to_radians();
        let dec = eq.dec_deg.to_radians();
        let sin_pi = EARTH_RADIUS_KM / eq.distance_km;

        let denom = dec.cos() - self.rho_cos_phi * sin_pi * hour_angle.cos();
        let d_alpha = (-self.rho_cos_phi * sin_pi * hour_angle.sin()).atan2(denom);
        let dec_t = ((dec.sin() - self.rho_sin_phi * sin_pi) * d_alpha.cos()).atan2(denom);
        let h_t = hour_angle - d_alpha;

        let altitude = (phi.sin() * dec_t.sin() + phi.cos() * dec_t.cos() * h_t.cos())
            .clamp(-1.0, 1.0)
            .asin();
        let azimuth = (-dec_t.cos() * h_t.sin())
            .atan2(dec_t.sin() * phi.cos() - dec_t.cos() * h_t.cos() * phi.sin());

        Horizontal {
            altitude_deg: altitude.to_degrees(),
            azimuth_deg: normalize_deg(azimuth.to_degrees()),
        }
    }

    /// Depression of the sea horizon from the observer's height, degrees.
    pub fn dip_deg(&self, coefficient: f64) -> f64 {
        coefficient * self.elevation_m.max(0.0).sqrt()
    }
}

/// Apparent geocentric sun and moon at one instant.
#[derive(Debug, Clone, Copy)]
struct Sky {
    gast_deg: f64,
    sun: SunPosition,
    moon: Option<MoonPosition>,
}

impl Sky {
    fn at(t: DateTime<Utc>, with_moon: bool) -> Self {
        let epoch = Epoch::from_utc(t);
        let nut = solar::nutation(epoch.t_tt);
        Sky {
            gast_deg: solar::sidereal_time_deg(&epoch, &nut),
            sun: solar::sun_position(epoch.t_tt, &nut),
            moon: with_moon.then(|| lunar::moon_position(epoch.t_tt, &nut)),
        }
    }
}

/// Sun and moon facts for a whole local year.
#[derive(Debug, Clone, Serialize)]
pub struct AstroYear {
    pub year: i32,
    pub tz: Tz,
    pub days: Vec<AstroDayRecord>,
    pub seasons: Vec<SeasonEvent>,
}

/// Computes sun and moon facts for one observer.
#[derive(Debug, Clone)]
pub struct AstroEngine {
    observer: Observer,
    adapter: TimeZoneAdapter,
    config: AstroConfig,
}

impl AstroEngine {
    pub fn new(observer: Observer, adapter: TimeZoneAdapter, config: AstroConfig) -> Self {
        AstroEngine {
            observer,
            adapter,
            config,
        }
    }

    /// Engine for a station; rejects out-of-range coordinates and unknown zones.
    pub fn for_station(station: &StationInfo, config: AstroConfig) -> Result<Self, ConfigError> {
        let observer = Observer::new(station.latitude, station.longitude, station.elevation)?;
        let adapter = TimeZoneAdapter::new(&station.timezone)?;
        Ok(Self::new(observer, adapter, config))
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    pub fn adapter(&self) -> &TimeZoneAdapter {
        &self.adapter
    }

    /// Topocentric position of a body.
    pub fn position(&self, body: Body, t: DateTime<Utc>) -> Horizontal {
        let sky = Sky::at(t, body == Body::Moon);
        match (body, sky.moon) {
            (Body::Moon, Some(moon)) => self.observer.horizontal(&moon.equatorial, sky.gast_deg),
            _ => self.observer.horizontal(&sky.sun.equatorial, sky.gast_deg),
        }
    }

    /// Altitude of the body's centre relative to the rise/set threshold:
    /// positive while the upper limb is above the apparent horizon.
    pub fn altitude_above_horizon(&self, body: Body, t: DateTime<Utc>) -> f64 {
        let sky = Sky::at(t, body == Body::Moon);
        let (eq, semidiameter) = match (body, sky.moon) {
            (Body::Moon, Some(moon)) => (moon.equatorial, moon.semidiameter_deg()),
            _ => (sky.sun.equatorial, self.config.sun_semidiameter_deg),
        };
        let threshold = -(self.config.refraction_deg
            + semidiameter
            + self.observer.dip_deg(self.config.dip_coefficient_deg));
        self.observer.horizontal(&eq, sky.gast_deg).altitude_deg - threshold
    }

    /// Lunation fraction and illuminated fraction at an instant.
    pub fn moon_phase_at(&self, t: DateTime<Utc>) -> (f64, f64) {
        let sky = Sky::at(t, true);
        match sky.moon {
            Some(moon) => (
                lunar::lunation_fraction(&moon, &sky.sun),
                lunar::illuminated_fraction(&moon, &sky.sun),
            ),
            None => (0.0, 0.0),
        }
    }

    fn elongation_at(&self, t: DateTime<Utc>) -> f64 {
        let sky = Sky::at(t, true);
        sky.moon
            .map(|moon| lunar::elongation_deg(&moon, &sky.sun))
            .unwrap_or(0.0)
    }

    /// Rise, set, transit, visibility and track of one body for a local date.
    pub fn body_day(&self, body: Body, date: NaiveDate) -> BodyDay {
        let (start, end) = self.adapter.day_bounds(date);
        let step = Duration::minutes(self.config.search_step_minutes as i64);
        let f = |t: DateTime<Utc>| self.altitude_above_horizon(body, t);

        let grazing_band = MAX_ALTITUDE_RATE_DEG_PER_HOUR * step.num_minutes() as f64 / 60.0;
        let samples = Samples::take(&f, start, end, step);

        let crossings: Vec<HorizonEvent> = samples
            .crossings(&f, end, grazing_band)
            .into_iter()
            .map(|(t, kind)| HorizonEvent {
                kind,
                timestamp: self.adapter.to_local(t),
                azimuth_deg: self.position(body, t).azimuth_deg,
            })
            .collect();

        let visibility = if !crossings.is_empty() {
            Visibility::RisesAndSets
        } else if samples.values.first().is_some_and(|&v| v >= 0.0) {
            Visibility::AlwaysAbove
        } else {
            Visibility::AlwaysBelow
        };

        let altitude = |t: DateTime<Utc>| self.position(body, t).altitude_deg;
        let transit = samples.interior_maximum(&altitude).map(|(t, alt)| Transit {
            timestamp: self.adapter.to_local(t),
            altitude_deg: alt,
        });

        let track_step = Duration::minutes(self.config.track_interval_minutes as i64);
        let mut track = Vec::new();
        let mut t = start;
        while t < end {
            let pos = self.position(body, t);
            track.push(TrackPoint {
                timestamp: self.adapter.to_local(t),
                altitude_deg: pos.altitude_deg,
                azimuth_deg: pos.azimuth_deg,
            });
            t += track_step;
        }

        let first_of = |kind: Crossing| {
            crossings
                .iter()
                .find(|c| c.kind == kind)
                .map(|c| c.timestamp)
        };

        BodyDay {
            rise: first_of(Crossing::Rise),
            set: first_of(Crossing::Set),
            transit,
            visibility,
            track,
            crossings,
        }
    }

    /// New, first quarter, full or last quarter moon falling on a local date.
    pub fn phase_event(&self, date: NaiveDate) -> Option<PhaseEvent> {
        let (start, end) = self.adapter.day_bounds(date);
        let e0 = self.elongation_at(start);
        let span = (self.elongation_at(end) - e0).rem_euclid(360.0);

        [
            (0.0, PhaseKind::NewMoon),
            (90.0, PhaseKind::FirstQuarter),
            (180.0, PhaseKind::FullMoon),
            (270.0, PhaseKind::LastQuarter),
        ]
        .into_iter()
        .find(|(target, _)| (target - e0).rem_euclid(360.0) < span)
        .map(|(target, kind)| {
            let g = |t: DateTime<Utc>| signed_deg(self.elongation_at(t) - target);
            PhaseEvent {
                kind,
                timestamp: self.adapter.to_local(bisect(&g, start, end)),
            }
        })
    }

    /// Solstices and equinoxes of a local year, found on the apparent solar
    /// longitude sampled at each local midnight.
    pub fn season_events(&self, year: i32) -> Vec<SeasonEvent> {
        let mut midnights: Vec<DateTime<Utc>> = dates_of_year(year)
            .into_iter()
            .map(|d| self.adapter.local_midnight(d))
            .collect();
        midnights.push(self.adapter.year_bounds(year).1);

        let longitudes: Vec<f64> = midnights
            .iter()
            .map(|&t| solar::apparent_longitude(t))
            .collect();

        let mut events = Vec::new();
        for i in 0..midnights.len() - 1 {
            let (l0, l1) = (longitudes[i], longitudes[i + 1]);
            let span = (l1 - l0).rem_euclid(360.0);
            for target in [0.0, 90.0, 180.0, 270.0] {
                if (target - l0).rem_euclid(360.0) < span {
                    let g = |t: DateTime<Utc>| signed_deg(solar::apparent_longitude(t) - target);
                    let at = bisect(&g, midnights[i], midnights[i + 1]);
                    events.push(SeasonEvent {
                        kind: SeasonKind::from_longitude(target),
                        timestamp: self.adapter.to_local(at),
                    });
                }
            }
        }
        debug!(year, count = events.len(), "found solstices and equinoxes");
        events
    }

    /// All sun and moon facts for one local date.
    pub fn day(&self, date: NaiveDate, seasons: &[SeasonEvent]) -> AstroDayRecord {
        let hour = NaiveTime::from_hms_opt(self.config.phase_reference_hour, 0, 0)
            .unwrap_or(NaiveTime::MIN);
        let reference = self.adapter.to_utc(date.and_time(hour));
        let (moon_phase, moon_illumination) = self.moon_phase_at(reference);

        AstroDayRecord {
            date,
            sun: self.body_day(Body::Sun, date),
            moon: self.body_day(Body::Moon, date),
            moon_phase,
            moon_illumination,
            lunation_day: lunar::lunation_day(moon_phase, self.config.lunation_icons),
            phase_event: self.phase_event(date),
            season: seasons
                .iter()
                .find(|s| s.timestamp.date_naive() == date)
                .copied(),
        }
    }

    /// Every local day of a year.
    pub fn year(&self, year: i32) -> AstroYear {
        let seasons = self.season_events(year);
        let days: Vec<AstroDayRecord> = dates_of_year(year)
            .into_iter()
            .map(|date| self.day(date, &seasons))
            .collect();
        debug!(year, days = days.len(), "computed astronomy");
        AstroYear {
            year,
            tz: self.adapter.tz(),
            days,
            seasons,
        }
    }
}

/// Wrap an angle difference into `(-180, 180]`.
fn signed_deg(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// A function of time sampled on a fixed grid.
struct Samples {
    times: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl Samples {
    /// Sample `[start, end]` every `step`; the end point is always included.
    fn take<F: Fn(DateTime<Utc>) -> f64>(
        f: &F,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: Duration,
    ) -> Self {
        let mut times = Vec::new();
        let mut t = start;
        while t < end {
            times.push(t);
            t += step;
        }
        times.push(end);
        let values = times.iter().map(|&t| f(t)).collect();
        Samples { times, values }
    }

    /// Upward and downward zero crossings strictly before `end`, in time order.
    fn crossings<F: Fn(DateTime<Utc>) -> f64>(
        &self,
        f: &F,
        end: DateTime<Utc>,
        grazing_band: f64,
    ) -> Vec<(DateTime<Utc>, Crossing)> {
        let v = &self.values;
        let t = &self.times;
        let mut found = Vec::new();

        for i in 0..v.len().saturating_sub(1) {
            let (up0, up1) = (v[i] >= 0.0, v[i + 1] >= 0.0);
            if up0 != up1 {
                let kind = if up1 { Crossing::Rise } else { Crossing::Set };
                found.push((bisect(f, t[i], t[i + 1]), kind));
            } else if i > 0 {
                // Turning point hugging the horizon: the curve may dip
                // across and back between two samples.
                let (a, b, c) = (v[i - 1], v[i], v[i + 1]);
                let (left_up, right_up) = (a >= 0.0, c >= 0.0);
                let turning = (b - a) * (c - b) < 0.0;
                if turning && left_up == up0 && right_up == up0 && b.abs() < grazing_band {
                    let maximize = b > a;
                    let (t_ext, v_ext) = golden_extremum(f, t[i - 1], t[i + 1], maximize);
                    if (v_ext >= 0.0) != up0 {
                        let (first, second) = if up0 {
                            (Crossing::Set, Crossing::Rise)
                        } else {
                            (Crossing::Rise, Crossing::Set)
                        };
                        found.push((bisect(f, t[i - 1], t_ext), first));
                        found.push((bisect(f, t_ext, t[i + 1]), second));
                    }
                }
            }
        }

        found.retain(|(at, _)| *at < end);
        found.sort_by_key(|(at, _)| *at);
        found.dedup_by(|a, b| a.1 == b.1 && (a.0 - b.0).num_milliseconds().abs() <= ROOT_TOLERANCE_MS);
        found
    }

    /// Highest point strictly inside the window, refined between the
    /// neighbouring samples. `None` when the maximum sits on an edge.
    fn interior_maximum<F: Fn(DateTime<Utc>) -> f64>(&self, f: &F) -> Option<(DateTime<Utc>, f64)> {
        // Raw altitude, not the thresholded search function.
        let values: Vec<f64> = self.times.iter().map(|&t| f(t)).collect();
        let (best, _) = values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))?;
        if best == 0 || best + 1 >= values.len() {
            return None;
        }
        Some(golden_extremum(f, self.times[best - 1], self.times[best + 1], true))
    }
}

/// Root of `f` between two instants whose values differ in sign.
fn bisect<F: Fn(DateTime<Utc>) -> f64>(f: &F, mut lo: DateTime<Utc>, mut hi: DateTime<Utc>) -> DateTime<Utc> {
    let lo_up = f(lo) >= 0.0;
    while (hi - lo).num_milliseconds() > ROOT_TOLERANCE_MS {
        let mid = lo + (hi - lo) / 2;
        if (f(mid) >= 0.0) == lo_up {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo + (hi - lo) / 2
}

/// Golden-section search for the extremum of a unimodal stretch.
fn golden_extremum<F: Fn(DateTime<Utc>) -> f64>(
    f: &F,
    a: DateTime<Utc>,
    b: DateTime<Utc>,
    maximize: bool,
) -> (DateTime<Utc>, f64) {
    const INV_PHI: f64 = 0.618_033_988_749_895;
    let score = |t: DateTime<Utc>| if maximize { f(t) } else { -f(t) };
    let at = |lo: DateTime<Utc>, frac: f64, hi: DateTime<Utc>| {
        lo + Duration::milliseconds(((hi - lo).num_milliseconds() as f64 * frac) as i64)
    };

    let (mut lo, mut hi) = (a, b);
    while (hi - lo).num_milliseconds() > ROOT_TOLERANCE_MS {
        let x1 = at(lo, 1.0 - INV_PHI, hi);
        let x2 = at(lo, INV_PHI, hi);
        if score(x1) < score(x2) {
            lo = x1;
        } else {
            hi = x2;
        }
    }
    let t = lo + (hi - lo) / 2;
    (t, f(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn engine(lat: f64, lon: f64, tz: &str) -> AstroEngine {
        AstroEngine::new(
            Observer::new(lat, lon, 0.0).unwrap(),
            TimeZoneAdapter::new(tz).unwrap(),
            AstroConfig::default(),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        assert_eq!(
            Observer::new(90.5, 0.0, 0.0).unwrap_err(),
            ConfigError::InvalidLatitude(90.5)
        );
        assert_eq!(
            Observer::new(0.0, 181.0, 0.0).unwrap_err(),
            ConfigError::InvalidLongitude(181.0)
        );
        assert!(Observer::new(f64::NAN, 0.0, 0.0).is_err());
    }

    #[test]
    fn equator_equinox_day_is_about_twelve_hours() {
        let e = engine(0.0, 0.0, "UTC");
        let day = e.body_day(Body::Sun, date(2024, 3, 20));
        let rise = day.rise.expect("sunrise");
        let set = day.set.expect("sunset");
        let length = set - rise;
        // Refraction and the solar radius add ~7 minutes.
        assert!(
            length > Duration::hours(12) && length < Duration::minutes(12 * 60 + 15),
            "day length {length}"
        );
        // Sunrise is due east, sunset due west, within a degree or so.
        let rise_az = day.crossings[0].azimuth_deg;
        assert!((rise_az - 90.0).abs() < 1.5, "rise azimuth {rise_az}");
        assert_eq!(day.visibility, Visibility::RisesAndSets);
    }

    #[test]
    fn midnight_sun_at_66_north_has_no_sunset() {
        let e = engine(66.0, -18.0, "Atlantic/Reykjavik");
        let day = e.body_day(Body::Sun, date(2024, 6, 22));
        assert_eq!(day.set, None);
        assert_eq!(day.rise, None);
        assert_eq!(day.visibility, Visibility::AlwaysAbove);
        assert!(day.transit.is_some());
    }

    #[test]
    fn polar_night_has_no_sunrise() {
        let e = engine(78.2, 15.6, "Arctic/Longyearbyen");
        let day = e.body_day(Body::Sun, date(2024, 12, 21));
        assert_eq!(day.rise, None);
        assert_eq!(day.visibility, Visibility::AlwaysBelow);
        assert!(day.track.iter().all(|p| p.altitude_deg < 0.0));
    }

    #[test]
    fn santa_cruz_sunrise_matches_almanac() {
        // Santa Cruz, CA on 2016-07-04: sunrise 05:54, sunset 20:31 PDT.
        let e = engine(36.97, -122.02, "America/Los_Angeles");
        let day = e.body_day(Body::Sun, date(2016, 7, 4));
        let tz: Tz = "America/Los_Angeles".parse().unwrap();
        let expect_rise = tz.with_ymd_and_hms(2016, 7, 4, 5, 54, 0).unwrap();
        let expect_set = tz.with_ymd_and_hms(2016, 7, 4, 20, 31, 0).unwrap();
        let rise = day.rise.unwrap();
        let set = day.set.unwrap();
        assert!((rise - expect_rise).num_seconds().abs() < 120, "rise {rise}");
        assert!((set - expect_set).num_seconds().abs() < 120, "set {set}");
    }

    #[test]
    fn track_covers_the_local_day() {
        let e = engine(36.97, -122.02, "America/Los_Angeles");
        assert_eq!(e.body_day(Body::Moon, date(2016, 7, 4)).track.len(), 24);
        assert_eq!(e.body_day(Body::Moon, date(2016, 3, 13)).track.len(), 23);
        assert_eq!(e.body_day(Body::Moon, date(2016, 11, 6)).track.len(), 25);
    }

    #[test]
    fn moonrise_and_moonset_are_found_each_month() {
        let e = engine(36.97, -122.02, "America/Los_Angeles");
        let mut rises = 0;
        let mut sets = 0;
        for d in 1..=30 {
            let day = e.body_day(Body::Moon, date(2016, 6, d));
            rises += day.crossings.iter().filter(|c| c.kind == Crossing::Rise).count();
            sets += day.crossings.iter().filter(|c| c.kind == Crossing::Set).count();
        }
        // The moon rises ~50 min later each day, so a 30-day month skips one.
        assert!((28..=30).contains(&rises), "rises {rises}");
        assert!((28..=30).contains(&sets), "sets {sets}");
    }

    #[test]
    fn january_2024_new_and_full_moon() {
        let e = engine(0.0, 0.0, "UTC");
        let new = e.phase_event(date(2024, 1, 11)).expect("new moon");
        assert_eq!(new.kind, PhaseKind::NewMoon);
        let expected = Utc.with_ymd_and_hms(2024, 1, 11, 11, 57, 0).unwrap();
        assert!((new.timestamp.with_timezone(&Utc) - expected).num_minutes().abs() < 10);

        let full = e.phase_event(date(2024, 1, 25)).expect("full moon");
        assert_eq!(full.kind, PhaseKind::FullMoon);
        let expected = Utc.with_ymd_and_hms(2024, 1, 25, 17, 54, 0).unwrap();
        assert!((full.timestamp.with_timezone(&Utc) - expected).num_minutes().abs() < 10);

        assert!(e.phase_event(date(2024, 1, 12)).is_none());
    }

    #[test]
    fn moon_phase_is_monotone_and_wraps_only_at_new_moon() {
        let e = engine(36.97, -122.02, "America/Los_Angeles");
        let phases: Vec<f64> = (0..120)
            .map(|i| {
                let d = date(2016, 1, 1) + Duration::days(i);
                e.moon_phase_at(e.adapter().local_midnight(d)).0
            })
            .collect();
        let mut wraps = 0;
        for w in phases.windows(2) {
            let diff = w[1] - w[0];
            if diff < 0.0 {
                wraps += 1;
                assert!(w[0] > 0.9 && w[1] < 0.1, "jumped back from {} to {}", w[0], w[1]);
            } else {
                assert!(diff > 0.02 && diff < 0.06, "daily advance {diff}");
            }
        }
        assert!((3..=5).contains(&wraps), "wraps {wraps}");
    }

    #[test]
    fn full_moon_is_fully_lit() {
        let e = engine(0.0, 0.0, "UTC");
        let t = Utc.with_ymd_and_hms(2024, 1, 25, 17, 54, 0).unwrap();
        let (phase, lit) = e.moon_phase_at(t);
        assert!((phase - 0.5).abs() < 0.002, "phase {phase}");
        assert!(lit > 0.99, "illumination {lit}");
    }

    #[test]
    fn seasons_2024() {
        let e = engine(0.0, 0.0, "UTC");
        let events = e.season_events(2024);
        let expected = [
            (SeasonKind::MarchEquinox, (3, 20, 3, 6)),
            (SeasonKind::JuneSolstice, (6, 20, 20, 51)),
            (SeasonKind::SeptemberEquinox, (9, 22, 12, 44)),
            (SeasonKind::DecemberSolstice, (12, 21, 9, 21)),
        ];
        assert_eq!(events.len(), 4);
        for (event, (kind, (m, d, h, min))) in events.iter().zip(expected) {
            assert_eq!(event.kind, kind);
            let want = Utc.with_ymd_and_hms(2024, m, d, h, min, 0).unwrap();
            let got = event.timestamp.with_timezone(&Utc);
            assert!((got - want).num_minutes().abs() < 15, "{kind:?} at {got}");
        }
    }

    #[test]
    fn season_flag_lands_on_local_date() {
        // 2024 December solstice is ~09:20 UTC, still the evening of the
        // 20th in Honolulu.
        let e = engine(21.3, -157.9, "Pacific/Honolulu");
        let seasons = e.season_events(2024);
        let record = e.day(date(2024, 12, 20), &seasons);
        assert_eq!(record.season.map(|s| s.kind), Some(SeasonKind::DecemberSolstice));
        assert_eq!(record.date.month(), 12);
        assert!(e.day(date(2024, 12, 21), &seasons).season.is_none());
    }

    #[test]
    fn bisect_and_golden_search_on_a_parabola() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let f = |t: DateTime<Utc>| {
            let h = (t - t0).num_seconds() as f64 / 3600.0;
            1.0 - (h - 2.0).powi(2)
        };
        let root = bisect(&f, t0 + Duration::hours(2), t0 + Duration::hours(4));
        assert!(((root - t0).num_seconds() - 3 * 3600).abs() <= 1);
        let (peak, value) = golden_extremum(&f, t0, t0 + Duration::hours(4), true);
        assert!(((peak - t0).num_seconds() - 2 * 3600).abs() <= 2);
        assert!((value - 1.0).abs() < 1e-6);
    }

    #[test]
    fn grazing_dip_between_samples_yields_two_crossings() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        // Below zero only for 01:00 ± 6.7 min; every sample is positive.
        let f = |t: DateTime<Utc>| {
            let h = (t - t0).num_seconds() as f64 / 3600.0 - 1.0;
            8.0 * h * h - 0.1
        };
        let start = t0 + Duration::minutes(20);
        let end = t0 + Duration::hours(3);
        let samples = Samples::take(&f, start, end, Duration::minutes(30));
        assert!(samples.values.iter().all(|&v| v > 0.0));

        let found = samples.crossings(&f, end, 5.0);
        assert_eq!(found.len(), 2, "{found:?}");
        assert_eq!(found[0].1, Crossing::Set);
        assert_eq!(found[1].1, Crossing::Rise);
        let centre = t0 + Duration::hours(1);
        assert!(((found[0].0 - centre).num_seconds() + 402).abs() < 5);
        assert!(((found[1].0 - centre).num_seconds() - 402).abs() < 5);
    }
}
