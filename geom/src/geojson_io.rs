//! GeoJSON geometry round-trips, used by the exclusion mask.

use anyhow::Result;

use crate::{LonLat, MultiPolygon, Polygon, Ring};

fn ring_positions(ring: &Ring) -> Vec<Vec<f64>> {
    ring.points().iter().map(|pt| vec![pt.x(), pt.y()]).collect()
}

fn polygon_positions(polygon: &Polygon) -> Vec<Vec<Vec<f64>>> {
    polygon.rings().iter().map(ring_positions).collect()
}

fn ring_from_positions(positions: &[Vec<f64>]) -> Result<Ring> {
    let mut pts = Vec::new();
    for pos in positions {
        if pos.len() < 2 {
            bail!("GeoJSON position with {} coordinates", pos.len());
        }
        pts.push(LonLat::new(pos[0], pos[1]));
    }
    Ring::close(pts)
}

fn polygon_from_positions(rings: &[Vec<Vec<f64>>]) -> Result<Polygon> {
    if rings.is_empty() {
        bail!("GeoJSON polygon with no rings");
    }
    let exterior = ring_from_positions(&rings[0])?;
    let mut holes = Vec::new();
    for hole in &rings[1..] {
        holes.push(ring_from_positions(hole)?);
    }
    Ok(Polygon::with_holes(exterior, holes))
}

impl Polygon {
    pub fn to_geojson(&self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::Polygon(polygon_positions(self)))
    }
}

impl MultiPolygon {
    pub fn to_geojson(&self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::MultiPolygon(
            self.polygons().iter().map(polygon_positions).collect(),
        ))
    }

    /// Accepts Polygon and MultiPolygon geometries.
    pub fn from_geojson(geometry: &geojson::Geometry) -> Result<MultiPolygon> {
        match &geometry.value {
            geojson::Value::Polygon(rings) => {
                Ok(MultiPolygon::from(polygon_from_positions(rings)?))
            }
            geojson::Value::MultiPolygon(polygons) => {
                let mut list = Vec::new();
                for rings in polygons {
                    list.push(polygon_from_positions(rings)?);
                }
                Ok(MultiPolygon(list))
            }
            x => bail!("unexpected GeoJSON geometry {:?}", x),
        }
    }
}
