//! WGS84 ⇄ UTM zone 32N (EUREF89 / EPSG:25832)
//!
//! Krüger's transverse-Mercator series to sixth order in the third
//! flattening `n`. Accurate to well below a millimetre inside the zone,
//! and still sub-metre a few degrees outside it.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// WGS84 semi-major axis (m)
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// UTM scale factor on the central meridian
pub const UTM_K0: f64 = 0.9996;
pub const UTM_FALSE_EASTING: f64 = 500_000.0;
/// Zone 32 central meridian (degrees east)
pub const UTM32_CENTRAL_MERIDIAN: f64 = 9.0;
/// Zone 32 bounds used for the fallback rule (degrees east, inclusive)
pub const UTM32_MIN_LON: f64 = 3.0;
pub const UTM32_MAX_LON: f64 = 12.0;

pub const UTM32_DATUM_LABEL: &str = "EUREF89 UTM32N (EPSG:25832)";
pub const WGS84_DATUM_LABEL: &str = "WGS84 (EPSG:4326)";

/// Coordinate system used for display and for the form's GPS fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordSystem {
    #[default]
    Utm32,
    Wgs84,
}

impl CoordSystem {
    pub fn datum_label(&self) -> &'static str {
        match self {
            CoordSystem::Utm32 => UTM32_DATUM_LABEL,
            CoordSystem::Wgs84 => WGS84_DATUM_LABEL,
        }
    }
}

impl std::str::FromStr for CoordSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "utm32" | "utm" | "utm32n" | "25832" => Ok(CoordSystem::Utm32),
            "wgs84" | "wgs" | "latlon" | "4326" => Ok(CoordSystem::Wgs84),
            _ => Err(format!("Unknown coordinate system: {}. Use utm32 or wgs84", s)),
        }
    }
}

impl std::fmt::Display for CoordSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordSystem::Utm32 => write!(f, "utm32"),
            CoordSystem::Wgs84 => write!(f, "wgs84"),
        }
    }
}

/// Projected UTM32N position in metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Utm32 {
    pub easting: f64,
    pub northing: f64,
}

struct Series {
    /// Rectifying radius A, already scaled by k0
    k0_a: f64,
    alpha: [f64; 6],
    beta: [f64; 6],
    delta: [f64; 6],
    /// First eccentricity
    e: f64,
}

fn series() -> Series {
    let n = WGS84_F / (2.0 - WGS84_F);
    let n2 = n * n;
    let n3 = n2 * n;
    let n4 = n3 * n;
    let n5 = n4 * n;
    let n6 = n5 * n;

    let a = WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0 + n6 / 256.0);

    let alpha = [
        n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0 - 127.0 * n5 / 288.0
            + 7891.0 * n6 / 37800.0,
        13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0 + 281.0 * n5 / 630.0
            - 1983433.0 * n6 / 1935360.0,
        61.0 * n3 / 240.0 - 103.0 * n4 / 140.0 + 15061.0 * n5 / 26880.0
            + 167603.0 * n6 / 181440.0,
        49561.0 * n4 / 161280.0 - 179.0 * n5 / 168.0 + 6601661.0 * n6 / 7257600.0,
        34729.0 * n5 / 80640.0 - 3418889.0 * n6 / 1995840.0,
        212378941.0 * n6 / 319334400.0,
    ];
    let beta = [
        n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0 - n4 / 360.0 - 81.0 * n5 / 512.0
            + 96199.0 * n6 / 604800.0,
        n2 / 48.0 + n3 / 15.0 - 437.0 * n4 / 1440.0 + 46.0 * n5 / 105.0
            - 1118711.0 * n6 / 3870720.0,
        17.0 * n3 / 480.0 - 37.0 * n4 / 840.0 - 209.0 * n5 / 4480.0 + 5569.0 * n6 / 90720.0,
        4397.0 * n4 / 161280.0 - 11.0 * n5 / 504.0 - 830251.0 * n6 / 7257600.0,
        4583.0 * n5 / 161280.0 - 108847.0 * n6 / 3991680.0,
        20648693.0 * n6 / 638668800.0,
    ];
    let delta = [
        2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3 + 116.0 * n4 / 45.0 + 26.0 * n5 / 45.0
            - 2854.0 * n6 / 675.0,
        7.0 * n2 / 3.0 - 8.0 * n3 / 5.0 - 227.0 * n4 / 45.0 + 2704.0 * n5 / 315.0
            + 2323.0 * n6 / 945.0,
        56.0 * n3 / 15.0 - 136.0 * n4 / 35.0 - 1262.0 * n5 / 105.0 + 73814.0 * n6 / 2835.0,
        4279.0 * n4 / 630.0 - 332.0 * n5 / 35.0 - 399572.0 * n6 / 14175.0,
        4174.0 * n5 / 315.0 - 144838.0 * n6 / 6237.0,
        601676.0 * n6 / 22275.0,
    ];

    Series {
        k0_a: UTM_K0 * a,
        alpha,
        beta,
        delta,
        e: (WGS84_F * (2.0 - WGS84_F)).sqrt(),
    }
}

/// Projects a WGS84 position onto UTM zone 32N.
///
/// The zone is not checked; longitudes far from 9°E still produce numbers,
/// just with growing distortion. Use [`is_in_utm32_zone`] to decide.
pub fn wgs84_to_utm32(lat: f64, lon: f64) -> Utm32 {
    let s = series();
    let phi = lat.to_radians();
    let lambda = (lon - UTM32_CENTRAL_MERIDIAN).to_radians();

    // conformal latitude
    let sin_phi = phi.sin();
    let t = (sin_phi.atanh() - s.e * (s.e * sin_phi).atanh()).sinh();
    let xi_p = t.atan2(lambda.cos());
    let eta_p = (lambda.sin() / (1.0 + t * t).sqrt()).atanh();

    let mut xi = xi_p;
    let mut eta = eta_p;
    for (j, alpha) in s.alpha.iter().enumerate() {
        let k = 2.0 * (j + 1) as f64;
        xi += alpha * (k * xi_p).sin() * (k * eta_p).cosh();
        eta += alpha * (k * xi_p).cos() * (k * eta_p).sinh();
    }

    Utm32 {
        easting: UTM_FALSE_EASTING + s.k0_a * eta,
        northing: s.k0_a * xi,
    }
}

/// Inverse of [`wgs84_to_utm32`], returns `(lat, lon)` in degrees.
pub fn utm32_to_wgs84(northing: f64, easting: f64) -> (f64, f64) {
    let s = series();
    let xi = northing / s.k0_a;
    let eta = (easting - UTM_FALSE_EASTING) / s.k0_a;

    let mut xi_p = xi;
    let mut eta_p = eta;
    for (j, beta) in s.beta.iter().enumerate() {
        let k = 2.0 * (j + 1) as f64;
        xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
        eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
    }

    let chi = (xi_p.sin() / eta_p.cosh()).asin();
    let mut phi = chi;
    for (j, delta) in s.delta.iter().enumerate() {
        phi += delta * (2.0 * (j + 1) as f64 * chi).sin();
    }
    let lambda = eta_p.sinh().atan2(xi_p.cos());

    (phi * 180.0 / PI, UTM32_CENTRAL_MERIDIAN + lambda * 180.0 / PI)
}

/// Longitude test for zone 32 (inclusive bounds).
pub fn is_in_utm32_zone(lon: f64) -> bool {
    (UTM32_MIN_LON..=UTM32_MAX_LON).contains(&lon)
}

/// UTM32 is only honoured inside its zone; everywhere else the answer is WGS84.
pub fn effective_system(preferred: CoordSystem, lon: f64) -> CoordSystem {
    if preferred == CoordSystem::Utm32 && !is_in_utm32_zone(lon) {
        CoordSystem::Wgs84
    } else {
        preferred
    }
}

/// Parsed location text
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationText {
    Wgs84 { lat: f64, lon: f64 },
    Utm32 { northing: f64, easting: f64 },
}

impl LocationText {
    /// WGS84 position of the parsed text
    pub fn to_wgs84(&self) -> (f64, f64) {
        match *self {
            LocationText::Wgs84 { lat, lon } => (lat, lon),
            LocationText::Utm32 { northing, easting } => utm32_to_wgs84(northing, easting),
        }
    }
}

/// Parses `"Lat: 60.1, Lon: 10.2"` or `"N: 6651411, E: 500000"`.
///
/// Labels are case-insensitive, the order of the two parts is fixed.
pub fn parse_location_text(text: &str) -> Option<LocationText> {
    let (first, second) = text.split_once(',')?;
    let (label_a, value_a) = first.split_once(':')?;
    let (label_b, value_b) = second.split_once(':')?;
    let a: f64 = value_a.trim().parse().ok()?;
    let b: f64 = value_b.trim().parse().ok()?;
    if !a.is_finite() || !b.is_finite() {
        return None;
    }

    let label_a = label_a.trim().to_lowercase();
    let label_b = label_b.trim().to_lowercase();
    match (label_a.as_str(), label_b.as_str()) {
        ("lat", "lon") | ("lat", "lng") => Some(LocationText::Wgs84 { lat: a, lon: b }),
        ("n", "e") | ("n", "ø") => Some(LocationText::Utm32 { northing: a, easting: b }),
        _ => None,
    }
}

/// Location string for display, in the effective system.
pub fn format_location(lat: f64, lon: f64, system: CoordSystem) -> String {
    match effective_system(system, lon) {
        CoordSystem::Utm32 => {
            let utm = wgs84_to_utm32(lat, lon);
            format!("N: {:.0}, E: {:.0} (UTM32)", utm.northing, utm.easting)
        }
        CoordSystem::Wgs84 => format!("Lat: {:.6}, Lon: {:.6}", lat, lon),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {} ± {}, got {}",
            expected,
            tolerance,
            actual
        );
    }

    #[test]
    fn test_central_meridian_reference() {
        // 60°N on the central meridian: EUREF89 reference northing 6651411.19
        let utm = wgs84_to_utm32(60.0, 9.0);
        assert_close(utm.easting, 500000.0, 0.01);
        assert_close(utm.northing, 6651411.19, 0.05);
    }

    #[test]
    fn test_norwegian_reference_points() {
        let cases = [
            (60.0, 10.0, 555776.27, 6651832.74),
            (59.9139, 10.7522, 597979.90, 6643118.99),
            (63.4305, 10.3951, 569618.63, 7034313.85),
            (58.0, 7.0, 381792.10, 6430460.06),
            (71.0, 12.0, 608970.19, 7880094.92),
        ];
        for (lat, lon, easting, northing) in cases {
            let utm = wgs84_to_utm32(lat, lon);
            assert_close(utm.easting, easting, 0.5);
            assert_close(utm.northing, northing, 0.5);
        }
    }

    #[test]
    fn test_inverse_round_trip() {
        for (lat, lon) in [(60.0, 10.0), (63.4305, 10.3951), (58.5, 4.0), (70.9, 11.9)] {
            let utm = wgs84_to_utm32(lat, lon);
            let (lat2, lon2) = utm32_to_wgs84(utm.northing, utm.easting);
            assert_close(lat2, lat, 1e-8);
            assert_close(lon2, lon, 1e-8);
        }
    }

    #[test]
    fn test_zone_bounds_inclusive() {
        assert!(is_in_utm32_zone(3.0));
        assert!(is_in_utm32_zone(12.0));
        assert!(is_in_utm32_zone(9.0));
        assert!(!is_in_utm32_zone(2.999));
        assert!(!is_in_utm32_zone(12.0001));
        assert!(!is_in_utm32_zone(-9.0));
    }

    #[test]
    fn test_effective_system_inside_and_outside_zone() {
        for lon in [3.0, 4.5, 9.0, 11.99, 12.0] {
            assert_eq!(effective_system(CoordSystem::Utm32, lon), CoordSystem::Utm32);
        }
        for lon in [-170.0, 0.0, 2.9, 12.01, 20.5, 31.0] {
            assert_eq!(effective_system(CoordSystem::Utm32, lon), CoordSystem::Wgs84);
        }
    }

    #[test]
    fn test_effective_system_keeps_wgs84() {
        assert_eq!(effective_system(CoordSystem::Wgs84, 9.0), CoordSystem::Wgs84);
        assert_eq!(effective_system(CoordSystem::Wgs84, 20.0), CoordSystem::Wgs84);
    }

    #[test]
    fn test_parse_location_text() {
        assert_eq!(
            parse_location_text("Lat: 60.123456, Lon: 10.5"),
            Some(LocationText::Wgs84 { lat: 60.123456, lon: 10.5 })
        );
        assert_eq!(
            parse_location_text("N: 6651411, E: 500000"),
            Some(LocationText::Utm32 { northing: 6651411.0, easting: 500000.0 })
        );
        assert_eq!(parse_location_text("somewhere"), None);
        assert_eq!(parse_location_text("Lat: abc, Lon: 1"), None);
        assert_eq!(parse_location_text("X: 1, Y: 2"), None);
    }

    #[test]
    fn test_utm_location_text_resolves_to_wgs84() {
        let (lat, lon) = parse_location_text("N: 6651411.19, E: 500000")
            .unwrap()
            .to_wgs84();
        assert_close(lat, 60.0, 1e-6);
        assert_close(lon, 9.0, 1e-6);
    }

    #[test]
    fn test_format_location() {
        assert_eq!(
            format_location(60.0, 9.0, CoordSystem::Utm32),
            "N: 6651411, E: 500000 (UTM32)"
        );
        assert_eq!(
            format_location(69.5, 20.5, CoordSystem::Utm32),
            "Lat: 69.500000, Lon: 20.500000"
        );
    }

    #[test]
    fn test_coord_system_from_str() {
        assert_eq!("UTM32".parse::<CoordSystem>().unwrap(), CoordSystem::Utm32);
        assert_eq!("wgs84".parse::<CoordSystem>().unwrap(), CoordSystem::Wgs84);
        assert!("mercator".parse::<CoordSystem>().is_err());
    }
}
