//! Metric circles. A circle is sampled in Web-Mercator space, where a fixed projected offset
//! corresponds to a fixed number of meters at the center's latitude, then unprojected back to
//! WGS84.

use std::f64::consts::PI;

use crate::{Angle, Distance, GPSBounds, LonLat, Polygon, Ring};

/// Angular sampling step, in radians.
const CIRCLE_STEP: f64 = 0.05;

impl Ring {
    /// A closed counter-clockwise ring approximating the circle of `radius` around `center`.
    pub fn circle(center: LonLat, radius: Distance) -> Ring {
        let scale = mercator_scale(center, radius);
        let center_proj = center.to_mercator();
        let mut pts = Vec::new();
        let mut angle = -PI;
        while angle <= PI {
            pts.push(LonLat::from_mercator([
                center_proj[0] + scale * angle.cos(),
                center_proj[1] + scale * angle.sin(),
            ]));
            angle += CIRCLE_STEP;
        }
        pts.push(pts[0]);
        Ring::must_new(pts)
    }
}

impl Polygon {
    pub fn circle(center: LonLat, radius: Distance) -> Polygon {
        Polygon::from_ring(Ring::circle(center, radius))
    }

    /// Shades everything outside the circle: the universe rectangle as the exterior, the circle
    /// as its single hole.
    pub fn inverse_circle(center: LonLat, radius: Distance, universe: &GPSBounds) -> Polygon {
        Polygon::with_holes(universe.to_ring(), vec![Ring::circle(center, radius)])
    }
}

/// The projected length of `radius` at the center's latitude: offset the center due west by the
/// radius and measure the difference in projected x.
fn mercator_scale(center: LonLat, radius: Distance) -> f64 {
    let on_circle = center.project_away(radius, Angle::degrees(270.0));
    center.to_mercator()[0] - on_circle.to_mercator()[0]
}
