use serde::{Deserialize, Serialize};

use crate::{LonLat, Ring};

/// An axis-aligned rectangle in lon/lat space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GPSBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GPSBounds {
    pub fn new() -> GPSBounds {
        GPSBounds {
            min_lon: f64::MAX,
            min_lat: f64::MAX,
            max_lon: f64::MIN,
            max_lat: f64::MIN,
        }
    }

    pub fn from_corners(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> GPSBounds {
        GPSBounds {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    pub fn update(&mut self, pt: LonLat) {
        self.min_lon = self.min_lon.min(pt.x());
        self.min_lat = self.min_lat.min(pt.y());
        self.max_lon = self.max_lon.max(pt.x());
        self.max_lat = self.max_lat.max(pt.y());
    }

    pub fn contains(&self, pt: LonLat) -> bool {
        pt.x() >= self.min_lon
            && pt.x() <= self.max_lon
            && pt.y() >= self.min_lat
            && pt.y() <= self.max_lat
    }

    pub fn center(&self) -> LonLat {
        LonLat::new(
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// A closed counter-clockwise ring tracing the rectangle.
    pub fn to_ring(&self) -> Ring {
        Ring::must_new(vec![
            LonLat::new(self.min_lon, self.min_lat),
            LonLat::new(self.max_lon, self.min_lat),
            LonLat::new(self.max_lon, self.max_lat),
            LonLat::new(self.min_lon, self.max_lat),
            LonLat::new(self.min_lon, self.min_lat),
        ])
    }
}

impl Default for GPSBounds {
    fn default() -> GPSBounds {
        GPSBounds::new()
    }
}
