//! Moon position & phase (Meeus, Astronomical Algorithms, ch. 47–49)
//!
//! The lunar theory is ELP-2000/82 truncated to its main periodic terms:
//! longitude and distance terms down to ~0.002°, the larger latitude terms,
//! and the three planetary/flattening corrections A1–A3. Accuracy is around
//! 10″ in longitude and 4″ in latitude, i.e. arc-minute level after parallax,
//! which is plenty for moonrise/moonset and phase times to the minute.

use crate::solar::{ecliptic_to_equatorial, normalize_deg, Equatorial, Nutation, SunPosition, AU_KM};

/// Equatorial radius of the Earth in km
pub const EARTH_RADIUS_KM: f64 = 6378.14;
/// Ratio of the moon's radius to the Earth's
const MOON_EARTH_RADIUS_RATIO: f64 = 0.272_481;

/// Periodic terms for longitude (1e-6 °) and distance (1e-3 km):
/// multiples of D, M, M′, F, then Σl and Σr coefficients.
#[rustfmt::skip]
const LON_DIST_TERMS: [(i8, i8, i8, i8, f64, f64); 46] = [
    (0, 0, 1, 0, 6_288_774.0, -20_905_355.0),
    (2, 0, -1, 0, 1_274_027.0, -3_699_111.0),
    (2, 0, 0, 0, 658_314.0, -2_955_968.0),
    (0, 0, 2, 0, 213_618.0, -569_925.0),
    (0, 1, 0, 0, -185_116.0, 48_888.0),
    (0, 0, 0, 2, -114_332.0, -3_149.0),
    (2, 0, -2, 0, 58_793.0, 246_158.0),
    (2, -1, -1, 0, 57_066.0, -152_138.0),
    (2, 0, 1, 0, 53_322.0, -170_733.0),
    (2, -1, 0, 0, 45_758.0, -204_586.0),
    (0, 1, -1, 0, -40_923.0, -129_620.0),
    (1, 0, 0, 0, -34_720.0, 108_743.0),
    (0, 1, 1, 0, -30_383.0, 104_755.0),
    (2, 0, 0, -2, 15_327.0, 10_321.0),
    (0, 0, 1, 2, -12_528.0, 0.0),
    (0, 0, 1, -2, 10_980.0, 79_661.0),
    (4, 0, -1, 0, 10_675.0, -34_782.0),
    (0, 0, 3, 0, 10_034.0, -23_210.0),
    (4, 0, -2, 0, 8_548.0, -21_636.0),
    (2, 1, -1, 0, -7_888.0, 24_208.0),
    (2, 1, 0, 0, -6_766.0, 30_824.0),
    (1, 0, -1, 0, -5_163.0, -8_379.0),
    (1, 1, 0, 0, 4_987.0, -16_675.0),
    (2, -1, 1, 0, 4_036.0, -12_831.0),
    (2, 0, 2, 0, 3_994.0, -10_445.0),
    (4, 0, 0, 0, 3_861.0, -11_650.0),
    (2, 0, -3, 0, 3_665.0, 14_403.0),
    (0, 1, -2, 0, -2_689.0, -7_003.0),
    (2, 0, -1, 2, -2_602.0, 0.0),
    (2, -1, -2, 0, 2_390.0, 10_056.0),
    (1, 0, 1, 0, -2_348.0, 6_322.0),
    (2, -2, 0, 0, 2_236.0, -9_884.0),
    (0, 1, 2, 0, -2_120.0, 5_751.0),
    (0, 2, 0, 0, -2_069.0, 0.0),
    (2, -2, -1, 0, 2_048.0, -4_950.0),
    (2, 0, 1, -2, -1_773.0, 4_130.0),
    (2, 0, 0, 2, -1_595.0, 0.0),
    (4, -1, -1, 0, 1_215.0, -3_958.0),
    (0, 0, 2, 2, -1_110.0, 0.0),
    (3, 0, -1, 0, -892.0, 3_258.0),
    (2, 1, 1, 0, -810.0, 2_616.0),
    (4, -1, -2, 0, 759.0, -1_897.0),
    (0, 2, -1, 0, -713.0, -2_117.0),
    (2, 2, -1, 0, -700.0, 2_354.0),
    (2, 1, -2, 0, 691.0, 0.0),
    (2, -1, 0, -2, 596.0, 0.0),
];

/// Periodic terms for latitude (1e-6 °): multiples of D, M, M′, F, coefficient.
#[rustfmt::skip]
const LAT_TERMS: [(i8, i8, i8, i8, f64); 30] = [
    (0, 0, 0, 1, 5_128_122.0),
    (0, 0, 1, 1, 280_602.0),
    (0, 0, 1, -1, 277_693.0),
    (2, 0, 0, -1, 173_237.0),
    (2, 0, -1, 1, 55_413.0),
    (2, 0, -1, -1, 46_271.0),
    (2, 0, 0, 1, 32_573.0),
    (0, 0, 2, 1, 17_198.0),
    (2, 0, 1, -1, 9_266.0),
    (0, 0, 2, -1, 8_822.0),
    (2, -1, 0, -1, 8_216.0),
    (2, 0, -2, -1, 4_324.0),
    (2, 0, 1, 1, 4_200.0),
    (2, 1, 0, -1, -3_359.0),
    (2, -1, -1, 1, 2_463.0),
    (2, -1, 0, 1, 2_211.0),
    (2, -1, -1, -1, 2_065.0),
    (0, 1, -1, -1, -1_870.0),
    (4, 0, -1, -1, 1_828.0),
    (0, 1, 0, 1, -1_794.0),
    (0, 0, 0, 3, -1_749.0),
    (0, 1, -1, 1, -1_565.0),
    (1, 0, 0, 1, -1_491.0),
    (0, 1, 1, 1, -1_475.0),
    (0, 1, 1, -1, -1_410.0),
    (0, 1, 0, -1, -1_344.0),
    (1, 0, 0, -1, -1_335.0),
    (0, 0, 3, 1, 1_107.0),
    (4, 0, 0, -1, 1_021.0),
    (4, 0, -1, 1, 833.0),
];

/// Apparent geocentric moon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoonPosition {
    /// Apparent ecliptic longitude, degrees `[0, 360)`
    pub longitude_deg: f64,
    /// Ecliptic latitude, degrees
    pub latitude_deg: f64,
    /// Centre-to-centre distance, km
    pub distance_km: f64,
    pub equatorial: Equatorial,
}

impl MoonPosition {
    /// Equatorial horizontal parallax, degrees.
    pub fn parallax_deg(&self) -> f64 {
        (EARTH_RADIUS_KM / self.distance_km).asin().to_degrees()
    }

    /// Apparent radius of the disc, degrees (geocentric).
    pub fn semidiameter_deg(&self) -> f64 {
        MOON_EARTH_RADIUS_RATIO * self.parallax_deg()
    }
}

/// Moon position at `t` Julian centuries (TT) from J2000.
pub fn moon_position(t: f64, nut: &Nutation) -> MoonPosition {
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    let l_prime = 218.316_447_7 + 481_267.881_234_21 * t - 0.001_578_6 * t2 + t3 / 538_841.0
        - t4 / 65_194_000.0;
    let d = 297.850_192_1 + 445_267.111_403_4 * t - 0.001_881_9 * t2 + t3 / 545_868.0
        - t4 / 113_065_000.0;
    let m = 357.529_109_2 + 35_999.050_290_9 * t - 0.000_153_6 * t2 + t3 / 24_490_000.0;
    let m_prime = 134.963_396_4 + 477_198.867_505_5 * t + 0.008_741_4 * t2 + t3 / 69_699.0
        - t4 / 14_712_000.0;
    let f = 93.272_095_0 + 483_202.017_523_3 * t - 0.003_653_9 * t2 - t3 / 3_526_000.0
        + t4 / 863_310_000.0;

    let a1 = (119.75 + 131.849 * t).to_radians();
    let a2 = (53.09 + 479_264.290 * t).to_radians();
    let a3 = (313.45 + 481_266.484 * t).to_radians();
    // Eccentricity of the Earth's orbit scales every term containing M.
    let e = 1.0 - 0.002_516 * t - 0.000_007_4 * t2;

    let (d, m, m_prime, f) = (
        normalize_deg(d).to_radians(),
        normalize_deg(m).to_radians(),
        normalize_deg(m_prime).to_radians(),
        normalize_deg(f).to_radians(),
    );
    let l_rad = normalize_deg(l_prime).to_radians();

    let argument = |cd: i8, cm: i8, cmp: i8, cf: i8| {
        cd as f64 * d + cm as f64 * m + cmp as f64 * m_prime + cf as f64 * f
    };
    let ecc = |cm: i8| match cm.abs() {
        1 => e,
        2 => e * e,
        _ => 1.0,
    };

    let mut sum_l = 0.0;
    let mut sum_r = 0.0;
    for &(cd, cm, cmp, cf, coeff_l, coeff_r) in LON_DIST_TERMS.iter() {
        let arg = argument(cd, cm, cmp, cf);
        sum_l += coeff_l * ecc(cm) * arg.sin();
        sum_r += coeff_r * ecc(cm) * arg.cos();
    }
    let mut sum_b = 0.0;
    for &(cd, cm, cmp, cf, coeff) in LAT_TERMS.iter() {
        sum_b += coeff * ecc(cm) * argument(cd, cm, cmp, cf).sin();
    }

    sum_l += 3958.0 * a1.sin() + 1962.0 * (l_rad - f).sin() + 318.0 * a2.sin();
    sum_b += -2235.0 * l_rad.sin() + 382.0 * a3.sin() + 175.0 * (a1 - f).sin()
        + 175.0 * (a1 + f).sin()
        + 127.0 * (l_rad - m_prime).sin()
        - 115.0 * (l_rad + m_prime).sin();

    let longitude = normalize_deg(l_prime + sum_l / 1e6 + nut.delta_psi);
    let latitude = sum_b / 1e6;
    let distance = 385_000.56 + sum_r / 1000.0;

    MoonPosition {
        longitude_deg: longitude,
        latitude_deg: latitude,
        distance_km: distance,
        equatorial: ecliptic_to_equatorial(longitude, latitude, nut.obliquity, distance),
    }
}

/// Moon's ecliptic longitude minus the sun's, degrees `[0, 360)`.
///
/// Grows by ~12.2° a day and is 0 at new moon, 90 at first quarter, 180 at
/// full moon and 270 at last quarter.
pub fn elongation_deg(moon: &MoonPosition, sun: &SunPosition) -> f64 {
    normalize_deg(moon.longitude_deg - sun.longitude_deg)
}

/// Fraction of the lunation elapsed, `[0, 1)`: 0 new, 0.5 full.
pub fn lunation_fraction(moon: &MoonPosition, sun: &SunPosition) -> f64 {
    let fraction = elongation_deg(moon, sun) / 360.0;
    // Guard against 360/360 from rounding.
    if fraction >= 1.0 {
        0.0
    } else {
        fraction
    }
}

/// Illuminated fraction of the disc (Meeus 48.1–48.3).
pub fn illuminated_fraction(moon: &MoonPosition, sun: &SunPosition) -> f64 {
    let beta = moon.latitude_deg.to_radians();
    let dlon = (moon.longitude_deg - sun.longitude_deg).to_radians();
    let psi = (beta.cos() * dlon.cos()).clamp(-1.0, 1.0).acos();
    let r = sun.distance_au * AU_KM;
    let phase_angle = (r * psi.sin()).atan2(moon.distance_km - r * psi.cos());
    ((1.0 + phase_angle.cos()) / 2.0).clamp(0.0, 1.0)
}

/// Icon index for a lunation fraction, `0..icons`, 0 = new moon.
///
/// Quarter phases land on exact indices only when `icons - 1` is a multiple
/// of 4 (29 icons, say). With the default 28 they round to the nearest
/// picture: 7, 14 and 20.
pub fn lunation_day(fraction: f64, icons: u32) -> u32 {
    let last = icons.saturating_sub(1);
    let index = (fraction.clamp(0.0, 1.0) * last as f64).round() as u32;
    index.min(last)
}
