//! Line simplification. Douglas-Peucker keeps every point farther than a tolerance from the
//! simplified chain; Visvalingam repeatedly drops the vertex spanning the least area, until only
//! the requested number of points remains.

use crate::{LonLat, PolyLine, Ring};

impl PolyLine {
    pub fn simplified(&self, epsilon: f64) -> PolyLine {
        PolyLine::must_new(douglas_peucker(self.points(), epsilon))
    }
}

impl Ring {
    /// Pares the ring down to at most `keep` points, endpoints included. The ring stays closed.
    pub fn simplified_to(&self, keep: usize) -> Ring {
        Ring::must_new(visvalingam_keep(self.points(), keep))
    }
}

fn perpendicular_dist(pt: LonLat, a: LonLat, b: LonLat) -> f64 {
    let dx = b.x() - a.x();
    let dy = b.y() - a.y();
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        let px = pt.x() - a.x();
        let py = pt.y() - a.y();
        return (px * px + py * py).sqrt();
    }
    ((pt.x() - a.x()) * dy - (pt.y() - a.y()) * dx).abs() / len
}

pub fn douglas_peucker(pts: &[LonLat], epsilon: f64) -> Vec<LonLat> {
    if pts.len() <= 2 {
        return pts.to_vec();
    }
    let a = pts[0];
    let b = *pts.last().unwrap();
    let mut max_dist = -1.0;
    let mut idx = 0;
    for (i, pt) in pts.iter().enumerate().take(pts.len() - 1).skip(1) {
        let dist = perpendicular_dist(*pt, a, b);
        if dist > max_dist {
            max_dist = dist;
            idx = i;
        }
    }
    if max_dist > epsilon {
        let mut left = douglas_peucker(&pts[..=idx], epsilon);
        let right = douglas_peucker(&pts[idx..], epsilon);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![a, b]
    }
}

fn triangle_area(a: LonLat, b: LonLat, c: LonLat) -> f64 {
    0.5 * ((b.x() - a.x()) * (c.y() - a.y()) - (c.x() - a.x()) * (b.y() - a.y())).abs()
}

pub fn visvalingam_keep(pts: &[LonLat], keep: usize) -> Vec<LonLat> {
    let mut pts = pts.to_vec();
    let keep = keep.max(4);
    while pts.len() > keep {
        let mut least_area = f64::MAX;
        let mut least_idx = 1;
        for i in 1..pts.len() - 1 {
            let area = triangle_area(pts[i - 1], pts[i], pts[i + 1]);
            if area < least_area {
                least_area = area;
                least_idx = i;
            }
        }
        pts.remove(least_idx);
    }
    pts
}
