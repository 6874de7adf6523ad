use std::{fmt, ops};

use serde::{Deserialize, Serialize};

/// A distance in meters.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Distance(f64);

impl Distance {
    pub const ZERO: Distance = Distance(0.0);

    pub fn meters(value: f64) -> Distance {
        if !value.is_finite() {
            panic!("bad distance {}", value);
        }
        Distance(value)
    }

    pub fn kilometers(value: f64) -> Distance {
        Distance::meters(1000.0 * value)
    }

    pub fn inner_meters(self) -> f64 {
        self.0
    }

    pub fn min(self, other: Distance) -> Distance {
        if self <= other {
            self
        } else {
            other
        }
    }

    /// Rounded to whole meters below a kilometer, otherwise to tenths of a kilometer: "340m",
    /// "1km", "6.8km".
    pub fn describe_rounded(self) -> String {
        if self.0 >= 1000.0 {
            let km = self.0 / 1000.0;
            if (km - km.round()).abs() < 0.05 {
                format!("{}km", km.round())
            } else {
                format!("{:.1}km", km)
            }
        } else {
            format!("{}m", self.0.round())
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}m", self.0)
    }
}

impl ops::Add for Distance {
    type Output = Distance;
    fn add(self, other: Distance) -> Distance {
        Distance::meters(self.0 + other.0)
    }
}

impl ops::Sub for Distance {
    type Output = Distance;
    fn sub(self, other: Distance) -> Distance {
        Distance::meters(self.0 - other.0)
    }
}

impl ops::Mul<f64> for Distance {
    type Output = Distance;
    fn mul(self, scale: f64) -> Distance {
        Distance::meters(self.0 * scale)
    }
}

impl ops::Div<f64> for Distance {
    type Output = Distance;
    fn div(self, scale: f64) -> Distance {
        if scale == 0.0 {
            panic!("can't divide {} by 0", self);
        }
        Distance::meters(self.0 / scale)
    }
}
