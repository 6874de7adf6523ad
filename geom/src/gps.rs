use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::fmt;

use serde::de::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Angle, Distance};

/// Earth radius shared by the haversine formulas and the Mercator projection, in meters.
const EARTH_RADIUS: f64 = 6_378_137.0;

/// A WGS84 coordinate. Serializes as a GeoJSON-style `[longitude, latitude]` position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LonLat {
    longitude: f64,
    latitude: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> LonLat {
        LonLat {
            longitude: lon,
            latitude: lat,
        }
    }

    pub fn x(self) -> f64 {
        self.longitude
    }

    pub fn y(self) -> f64 {
        self.latitude
    }

    /// Haversine distance to `other`.
    pub fn gps_dist(self, other: LonLat) -> Distance {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let half_dlat = (lat2 - lat1) / 2.0;
        let half_dlon = (other.longitude - self.longitude).to_radians() / 2.0;
        let a = half_dlat.sin().powi(2) + lat1.cos() * lat2.cos() * half_dlon.sin().powi(2);
        Distance::meters(2.0 * EARTH_RADIUS * a.sqrt().asin())
    }

    /// Initial great-circle bearing towards `other`.
    pub fn initial_bearing(self, other: LonLat) -> Angle {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();
        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        Angle::degrees(y.atan2(x).to_degrees())
    }

    /// The destination reached by travelling `dist` along the great circle leaving here at
    /// `bearing`.
    pub fn project_away(self, dist: Distance, bearing: Angle) -> LonLat {
        let ang = dist.inner_meters() / EARTH_RADIUS;
        let brg = bearing.to_radians();
        let lat1 = self.latitude.to_radians();
        let lon1 = self.longitude.to_radians();
        let lat2 = (lat1.sin() * ang.cos() + lat1.cos() * ang.sin() * brg.cos()).asin();
        let lon2 = lon1
            + (brg.sin() * ang.sin() * lat1.cos()).atan2(ang.cos() - lat1.sin() * lat2.sin());
        LonLat::new(lon2.to_degrees(), lat2.to_degrees())
    }

    /// Web-Mercator projection, in meters.
    pub(crate) fn to_mercator(self) -> [f64; 2] {
        let x = EARTH_RADIUS * self.longitude.to_radians();
        let y = EARTH_RADIUS * (FRAC_PI_4 + self.latitude.to_radians() / 2.0).tan().ln();
        [x, y]
    }

    pub(crate) fn from_mercator(pt: [f64; 2]) -> LonLat {
        let lon = (pt[0] / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (pt[1] / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees();
        LonLat::new(lon, lat)
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.longitude, self.latitude)
    }
}

impl Serialize for LonLat {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        (self.longitude, self.latitude).serialize(s)
    }
}

impl<'de> Deserialize<'de> for LonLat {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<LonLat, D::Error> {
        let (lon, lat) = <(f64, f64)>::deserialize(d)?;
        if !lon.is_finite() || !lat.is_finite() {
            return Err(D::Error::custom("non-finite coordinate"));
        }
        Ok(LonLat::new(lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine() {
        // Alexanderplatz to Zoologischer Garten is a bit over 6km.
        let alex = LonLat::new(13.4132, 52.5219);
        let zoo = LonLat::new(13.3326, 52.5072);
        let dist = alex.gps_dist(zoo);
        assert!(dist > Distance::meters(5500.0) && dist < Distance::meters(6500.0));
        assert_eq!(alex.gps_dist(alex), Distance::ZERO);
    }

    #[test]
    fn bearings() {
        let origin = LonLat::new(13.4, 52.5);
        let north = LonLat::new(13.4, 52.6);
        let east = LonLat::new(13.5, 52.5);
        assert!(origin.initial_bearing(north).normalized_degrees().abs() < 1.0);
        let east_bearing = origin.initial_bearing(east).normalized_degrees();
        assert!((east_bearing - 90.0).abs() < 1.0);
    }

    #[test]
    fn project_away_round_trips_distance() {
        let origin = LonLat::new(13.4, 52.5);
        for degs in [0.0, 45.0, 133.0, 270.0] {
            let there = origin.project_away(Distance::meters(2500.0), Angle::degrees(degs));
            let back = origin.gps_dist(there);
            assert!((back.inner_meters() - 2500.0).abs() < 1.0);
        }
    }

    #[test]
    fn mercator_round_trip() {
        let pt = LonLat::new(13.3699, 52.5251);
        let back = LonLat::from_mercator(pt.to_mercator());
        assert!((back.x() - pt.x()).abs() < 1e-9);
        assert!((back.y() - pt.y()).abs() < 1e-9);
    }

    #[test]
    fn serde_position() {
        let pt = LonLat::new(13.4, 52.5);
        assert_eq!(serde_json::to_string(&pt).unwrap(), "[13.4,52.5]");
        let parsed: LonLat = serde_json::from_str("[13.4,52.5]").unwrap();
        assert_eq!(parsed, pt);
        assert!(serde_json::from_str::<LonLat>("[13.4]").is_err());
    }
}
