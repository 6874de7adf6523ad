use std::fmt;

use serde::{Deserialize, Serialize};

/// An angle in degrees. Bearings are measured clockwise from true north.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    /// Wraps the input to [0, 360).
    pub fn degrees(degs: f64) -> Angle {
        Angle(degs.rem_euclid(360.0))
    }

    pub fn normalized_degrees(self) -> f64 {
        self.0
    }

    pub fn to_radians(self) -> f64 {
        self.0.to_radians()
    }

    pub fn rotate_degs(self, by: f64) -> Angle {
        Angle::degrees(self.0 + by)
    }

    /// The bearing pointing the other way.
    pub fn opposite(self) -> Angle {
        self.rotate_degs(180.0)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}
