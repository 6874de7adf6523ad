//! Round-trips between our types and the `geo` crate, which supplies the planar constructive
//! geometry (union, difference).

use crate::{LonLat, MultiPolygon, Polygon, Ring};

fn ring_to_geo(ring: &Ring) -> geo::LineString<f64> {
    ring.points()
        .iter()
        .map(|pt| (pt.x(), pt.y()))
        .collect::<Vec<_>>()
        .into()
}

fn polygon_to_geo(polygon: &Polygon) -> geo::Polygon<f64> {
    geo::Polygon::new(
        ring_to_geo(polygon.exterior()),
        polygon.holes().iter().map(ring_to_geo).collect(),
    )
}

pub(crate) fn to_geo(mp: &MultiPolygon) -> geo::MultiPolygon<f64> {
    geo::MultiPolygon(mp.polygons().iter().map(polygon_to_geo).collect())
}

fn ring_from_geo(ls: &geo::LineString<f64>) -> Option<Ring> {
    let pts: Vec<LonLat> = ls.coords().map(|c| LonLat::new(c.x, c.y)).collect();
    Ring::close(pts).ok()
}

/// Degenerate slivers (rings that collapse below three distinct points) are dropped; boolean ops
/// on sampled circles produce them routinely.
pub(crate) fn from_geo(mp: geo::MultiPolygon<f64>) -> MultiPolygon {
    let mut polygons = Vec::new();
    for poly in mp {
        if let Some(exterior) = ring_from_geo(poly.exterior()) {
            let holes = poly.interiors().iter().filter_map(ring_from_geo).collect();
            polygons.push(Polygon::with_holes(exterior, holes));
        }
    }
    MultiPolygon(polygons)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let polygon = Polygon::with_holes(
            Ring::must_new(vec![
                LonLat::new(0.0, 0.0),
                LonLat::new(4.0, 0.0),
                LonLat::new(4.0, 4.0),
                LonLat::new(0.0, 4.0),
                LonLat::new(0.0, 0.0),
            ]),
            vec![Ring::must_new(vec![
                LonLat::new(1.0, 1.0),
                LonLat::new(3.0, 1.0),
                LonLat::new(3.0, 3.0),
                LonLat::new(1.0, 3.0),
                LonLat::new(1.0, 1.0),
            ])],
        );
        let mp = MultiPolygon::from(polygon);
        let back = from_geo(to_geo(&mp));
        assert_eq!(back.polygons().len(), 1);
        assert_eq!(back.polygons()[0].holes().len(), 1);
        assert!(back.contains_pt(LonLat::new(0.5, 0.5)));
        assert!(!back.contains_pt(LonLat::new(2.0, 2.0)));
    }
}
