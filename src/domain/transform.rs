//! Coordinate projection between WGS-84 and GCJ-02.
//!
//! Maps served inside mainland China expect GCJ-02 coordinates. The game
//! API reports WGS-84, so reads optionally project each position on the
//! way out. Points outside the China envelope pass through unchanged.

use std::f64::consts::PI;

/// Semi-major axis of the Krasovsky 1940 ellipsoid.
const AXIS: f64 = 6_378_245.0;

/// First eccentricity squared of the same ellipsoid.
const ECCENTRICITY_SQ: f64 = 0.006_693_421_622_965_943;

/// Coordinate system applied to positions at the read boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateSystem {
    /// Return stored WGS-84 positions as-is.
    #[default]
    Wgs84,
    /// Project to GCJ-02.
    Gcj02,
}

impl CoordinateSystem {
    /// Selects the system from the locale flag.
    #[must_use]
    pub const fn from_china_flag(china: bool) -> Self {
        if china { Self::Gcj02 } else { Self::Wgs84 }
    }

    /// Projects a stored WGS-84 position into this system.
    #[must_use]
    pub fn project(self, lat: f64, lon: f64) -> (f64, f64) {
        match self {
            Self::Wgs84 => (lat, lon),
            Self::Gcj02 => wgs_to_gcj(lat, lon),
        }
    }

    /// Projects the position of every row in place.
    pub fn apply<T: Located>(self, rows: &mut [T]) {
        if self == Self::Wgs84 {
            return;
        }
        for row in rows {
            let (lat, lon) = row.position_mut();
            (*lat, *lon) = self.project(*lat, *lon);
        }
    }
}

/// Anything carrying a latitude/longitude pair.
pub trait Located {
    /// Mutable access to `(latitude, longitude)`.
    fn position_mut(&mut self) -> (&mut f64, &mut f64);
}

/// Returns `true` if the position lies outside the GCJ-02 envelope.
#[must_use]
pub fn out_of_china(lat: f64, lon: f64) -> bool {
    !(72.004..=137.8347).contains(&lon) || !(0.8293..=55.8271).contains(&lat)
}

/// Projects a WGS-84 position to GCJ-02.
#[must_use]
pub fn wgs_to_gcj(lat: f64, lon: f64) -> (f64, f64) {
    if out_of_china(lat, lon) {
        return (lat, lon);
    }
    let (d_lat, d_lon) = delta(lat, lon);
    (lat + d_lat, lon + d_lon)
}

fn delta(lat: f64, lon: f64) -> (f64, f64) {
    let d_lat = shift_lat(lon - 105.0, lat - 35.0);
    let d_lon = shift_lon(lon - 105.0, lat - 35.0);
    let rad_lat = lat / 180.0 * PI;
    let magic = 1.0 - ECCENTRICITY_SQ * rad_lat.sin().powi(2);
    let sqrt_magic = magic.sqrt();
    let d_lat = (d_lat * 180.0) / ((AXIS * (1.0 - ECCENTRICITY_SQ)) / (magic * sqrt_magic) * PI);
    let d_lon = (d_lon * 180.0) / (AXIS / sqrt_magic * rad_lat.cos() * PI);
    (d_lat, d_lon)
}

fn shift_lat(x: f64, y: f64) -> f64 {
    let mut ret = -100.0 + 2.0 * x + 3.0 * y + 0.2 * y * y + 0.1 * x * y + 0.2 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (y * PI).sin() + 40.0 * (y / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (160.0 * (y / 12.0 * PI).sin() + 320.0 * (y * PI / 30.0).sin()) * 2.0 / 3.0;
    ret
}

fn shift_lon(x: f64, y: f64) -> f64 {
    let mut ret = 300.0 + x + 2.0 * y + 0.1 * x * x + 0.1 * x * y + 0.1 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (x * PI).sin() + 40.0 * (x / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (150.0 * (x / 12.0 * PI).sin() + 300.0 * (x / 30.0 * PI).sin()) * 2.0 / 3.0;
    ret
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn identity_outside_china() {
        let nyc = (40.7128, -74.0060);
        assert_eq!(wgs_to_gcj(nyc.0, nyc.1), nyc);
        assert_eq!(CoordinateSystem::Gcj02.project(nyc.0, nyc.1), nyc);
    }

    #[test]
    fn shifts_points_inside_china() {
        // Tiananmen Square; the published offset is a few hundred metres.
        let (lat, lon) = wgs_to_gcj(39.9087, 116.3975);
        assert!((lat - 39.9087).abs() > 0.0005 && (lat - 39.9087).abs() < 0.01);
        assert!((lon - 116.3975).abs() > 0.0005 && (lon - 116.3975).abs() < 0.01);
    }

    #[test]
    fn wgs84_is_passthrough() {
        assert_eq!(CoordinateSystem::Wgs84.project(39.9, 116.4), (39.9, 116.4));
    }

    struct Point(f64, f64);

    impl Located for Point {
        fn position_mut(&mut self) -> (&mut f64, &mut f64) {
            (&mut self.0, &mut self.1)
        }
    }

    #[test]
    fn apply_projects_each_row() {
        let mut rows = [Point(39.9087, 116.3975), Point(40.7128, -74.0060)];
        CoordinateSystem::Gcj02.apply(&mut rows);
        assert_eq!((rows[0].0, rows[0].1), wgs_to_gcj(39.9087, 116.3975));
        assert_eq!((rows[1].0, rows[1].1), (40.7128, -74.0060));
    }

    #[test]
    fn flag_selects_system() {
        assert_eq!(CoordinateSystem::from_china_flag(true), CoordinateSystem::Gcj02);
        assert_eq!(CoordinateSystem::from_china_flag(false), CoordinateSystem::Wgs84);
    }
}
