use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::LonLat;

/// A closed loop of points: the first and last are equal, and there are at least three distinct
/// vertices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pts: Vec<LonLat>,
}

impl Ring {
    pub fn new(pts: Vec<LonLat>) -> Result<Ring> {
        if pts.len() < 4 {
            bail!("can't make a ring with only {} points", pts.len());
        }
        if pts[0] != *pts.last().unwrap() {
            bail!(
                "ring must start and end at the same point: {} vs {}",
                pts[0],
                pts.last().unwrap()
            );
        }
        Ok(Ring { pts })
    }

    pub fn must_new(pts: Vec<LonLat>) -> Ring {
        Ring::new(pts).unwrap()
    }

    /// Builds a ring from an open chain of points, duplicating the first point if needed.
    pub fn close(mut pts: Vec<LonLat>) -> Result<Ring> {
        if pts.first() != pts.last() {
            let first = *pts
                .first()
                .ok_or_else(|| anyhow!("can't close an empty chain"))?;
            pts.push(first);
        }
        Ring::new(pts)
    }

    pub fn points(&self) -> &Vec<LonLat> {
        &self.pts
    }

    pub fn into_points(self) -> Vec<LonLat> {
        self.pts
    }

    pub fn reversed(&self) -> Ring {
        let mut pts = self.pts.clone();
        pts.reverse();
        Ring { pts }
    }

    /// Twice the signed planar area. Positive when the ring winds counter-clockwise.
    fn doubled_signed_area(&self) -> f64 {
        let mut sum = 0.0;
        for pair in self.pts.windows(2) {
            sum += pair[0].x() * pair[1].y() - pair[1].x() * pair[0].y();
        }
        sum
    }

    pub fn is_clockwise(&self) -> bool {
        self.doubled_signed_area() < 0.0
    }

    /// GeoJSON winding for an exterior ring: counter-clockwise.
    pub fn as_outer(self) -> Ring {
        if self.is_clockwise() {
            self.reversed()
        } else {
            self
        }
    }

    /// GeoJSON winding for a hole: clockwise.
    pub fn as_hole(self) -> Ring {
        if self.is_clockwise() {
            self
        } else {
            self.reversed()
        }
    }

    /// Planar even-odd containment, casting a ray east.
    pub fn contains_pt(&self, pt: LonLat) -> bool {
        let mut inside = false;
        for pair in self.pts.windows(2) {
            let (x1, y1) = (pair[0].x(), pair[0].y());
            let (x2, y2) = (pair[1].x(), pair[1].y());
            if (y1 > pt.y()) != (y2 > pt.y()) {
                let x_cross = x1 + (pt.y() - y1) / (y2 - y1) * (x2 - x1);
                if pt.x() < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }
}
