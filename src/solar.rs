//! Low-precision solar ephemeris and the time scales it runs on.
//!
//! Formulas follow Meeus, *Astronomical Algorithms* (2nd ed.): chapter 25 for
//! the sun, chapter 22 (abridged) for nutation, chapter 12 for sidereal time.
//! Accuracy is about 0.01° in longitude over 1950–2050, far better than a
//! rise/set or solstice table needs.

use chrono::{DateTime, Datelike, Utc};

/// Julian day of the Unix epoch
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
/// Julian day of J2000.0
pub const J2000: f64 = 2_451_545.0;
/// Kilometres per astronomical unit
pub const AU_KM: f64 = 149_597_870.7;

/// Normalize an angle to `[0, 360)` degrees.
pub fn normalize_deg(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Julian day (UT) of an instant.
pub fn julian_day(t: DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64 / 86_400_000.0 + UNIX_EPOCH_JD
}

/// ΔT = TT − UT in seconds (Espenak & Meeus polynomials).
pub fn delta_t_seconds(year: f64) -> f64 {
    let long_term = |y: f64| {
        let u = (y - 1820.0) / 100.0;
        -20.0 + 32.0 * u * u
    };
    match year {
        y if y < 1920.0 => long_term(y),
        y if y < 1941.0 => {
            let t = y - 1920.0;
            21.20 + 0.84493 * t - 0.076100 * t * t + 0.0020936 * t * t * t
        }
        y if y < 1961.0 => {
            let t = y - 1950.0;
            29.07 + 0.407 * t - t * t / 233.0 + t * t * t / 2547.0
        }
        y if y < 1986.0 => {
            let t = y - 1975.0;
            45.45 + 1.067 * t - t * t / 260.0 - t * t * t / 718.0
        }
        y if y < 2005.0 => {
            let t = y - 2000.0;
            63.86 + 0.3345 * t - 0.060374 * t.powi(2)
                + 0.0017275 * t.powi(3)
                + 0.000651814 * t.powi(4)
                + 0.00002373599 * t.powi(5)
        }
        y if y < 2050.0 => {
            let t = y - 2000.0;
            62.92 + 0.32217 * t + 0.005589 * t * t
        }
        y if y < 2150.0 => long_term(y) - 0.5628 * (2150.0 - y),
        y => long_term(y),
    }
}

/// One instant expressed on the scales the ephemerides need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Epoch {
    /// Julian day, UT (for sidereal time)
    pub jd_ut: f64,
    /// Julian centuries of TT since J2000.0 (for orbital elements)
    pub t_tt: f64,
}

impl Epoch {
    pub fn from_utc(t: DateTime<Utc>) -> Self {
        let jd_ut = julian_day(t);
        let year = t.year() as f64 + (t.ordinal0() as f64 + 0.5) / 365.25;
        let jd_tt = jd_ut + delta_t_seconds(year) / 86_400.0;
        Epoch {
            jd_ut,
            t_tt: (jd_tt - J2000) / 36_525.0,
        }
    }
}

/// Nutation in longitude and the true obliquity of the ecliptic, degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nutation {
    pub delta_psi: f64,
    pub obliquity: f64,
}

/// Abridged nutation (Meeus 22, ~0.5″ in Δψ).
pub fn nutation(t: f64) -> Nutation {
    let omega = (125.04452 - 1934.136261 * t).to_radians();
    let l_sun = (280.4665 + 36000.7698 * t).to_radians();
    let l_moon = (218.3165 + 481267.8813 * t).to_radians();

    let delta_psi = (-17.20 * omega.sin() - 1.32 * (2.0 * l_sun).sin()
        - 0.23 * (2.0 * l_moon).sin()
        + 0.21 * (2.0 * omega).sin())
        / 3600.0;
    let delta_eps = (9.20 * omega.cos() + 0.57 * (2.0 * l_sun).cos() + 0.10 * (2.0 * l_moon).cos()
        - 0.09 * (2.0 * omega).cos())
        / 3600.0;

    let eps0 = 23.0 + 26.0 / 60.0 + 21.448 / 3600.0
        - (46.8150 * t + 0.00059 * t * t - 0.001813 * t * t * t) / 3600.0;

    Nutation {
        delta_psi,
        obliquity: eps0 + delta_eps,
    }
}

/// Greenwich apparent sidereal time in degrees.
pub fn sidereal_time_deg(epoch: &Epoch, nut: &Nutation) -> f64 {
    let d = epoch.jd_ut - J2000;
    let t = d / 36_525.0;
    let mean = 280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    normalize_deg(mean + nut.delta_psi * nut.obliquity.to_radians().cos())
}

/// Geocentric equatorial position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equatorial {
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub distance_km: f64,
}

/// Ecliptic longitude/latitude to right ascension/declination.
pub fn ecliptic_to_equatorial(lon_deg: f64, lat_deg: f64, obliquity_deg: f64, distance_km: f64) -> Equatorial {
    let (lon, lat, eps) = (
        lon_deg.to_radians(),
        lat_deg.to_radians(),
        obliquity_deg.to_radians(),
    );
    let ra = (lon.sin() * eps.cos() - lat.tan() * eps.sin()).atan2(lon.cos());
    let dec = (lat.sin() * eps.cos() + lat.cos() * eps.sin() * lon.sin()).asin();
    Equatorial {
        ra_deg: normalize_deg(ra.to_degrees()),
        dec_deg: dec.to_degrees(),
        distance_km,
    }
}

/// Apparent geocentric sun.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunPosition {
    /// Apparent ecliptic longitude, degrees `[0, 360)`
    pub longitude_deg: f64,
    /// Distance in AU
    pub distance_au: f64,
    pub equatorial: Equatorial,
}

/// Sun position at `t` Julian centuries (TT) from J2000.
pub fn sun_position(t: f64, nut: &Nutation) -> SunPosition {
    let l0 = 280.46646 + 36000.76983 * t + 0.0003032 * t * t;
    let m = (357.52911 + 35999.05029 * t - 0.0001537 * t * t).to_radians();
    let e = 0.016708634 - 0.000042037 * t - 0.0000001267 * t * t;

    let c = (1.914602 - 0.004817 * t - 0.000014 * t * t) * m.sin()
        + (0.019993 - 0.000101 * t) * (2.0 * m).sin()
        + 0.000289 * (3.0 * m).sin();
    let true_lon = l0 + c;
    let anomaly = m + c.to_radians();
    let r = 1.000001018 * (1.0 - e * e) / (1.0 + e * anomaly.cos());

    // Nutation plus annual aberration (20.4898″ / R).
    let apparent = normalize_deg(true_lon + nut.delta_psi - 20.4898 / 3600.0 / r);

    SunPosition {
        longitude_deg: apparent,
        distance_au: r,
        equatorial: ecliptic_to_equatorial(apparent, 0.0, nut.obliquity, r * AU_KM),
    }
}

/// Apparent solar longitude at an instant; used for season detection.
pub fn apparent_longitude(t: DateTime<Utc>) -> f64 {
    let epoch = Epoch::from_utc(t);
    let nut = nutation(epoch.t_tt);
    sun_position(epoch.t_tt, &nut).longitude_deg
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn julian_day_of_j2000_noon() {
        let t = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!((julian_day(t) - J2000).abs() < 1e-9);
    }

    #[test]
    fn delta_t_is_about_69_seconds_in_2020() {
        let dt = delta_t_seconds(2020.0);
        assert!((65.0..75.0).contains(&dt), "ΔT {dt}");
    }

    #[test]
    fn meeus_example_25a() {
        // 1992 October 13.0 TD: apparent λ = 199.90895°, δ = −7.78507°.
        let jde = 2_448_908.5;
        let t = (jde - J2000) / 36_525.0;
        let nut = nutation(t);
        let sun = sun_position(t, &nut);
        assert!((sun.longitude_deg - 199.909).abs() < 0.01, "λ {}", sun.longitude_deg);
        assert!((sun.equatorial.dec_deg + 7.785).abs() < 0.01, "δ {}", sun.equatorial.dec_deg);
        assert!((sun.distance_au - 0.99766).abs() < 1e-4);
    }

    #[test]
    fn meeus_example_12a_sidereal_time() {
        // 1987 April 10, 0h UT: mean sidereal time 13h10m46.3668s.
        let epoch = Epoch {
            jd_ut: 2_446_895.5,
            t_tt: (2_446_895.5 - J2000) / 36_525.0,
        };
        let no_nutation = Nutation {
            delta_psi: 0.0,
            obliquity: 23.44,
        };
        let expected = (13.0 + 10.0 / 60.0 + 46.3668 / 3600.0) * 15.0;
        assert!((sidereal_time_deg(&epoch, &no_nutation) - expected).abs() < 1e-4);
    }
}
