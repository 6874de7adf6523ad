use geo::BooleanOps;
use serde::{Deserialize, Serialize};

use crate::{conversions, LonLat, Ring};

/// One exterior ring plus zero or more holes, wound GeoJSON-style: exterior counter-clockwise,
/// holes clockwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    rings: Vec<Ring>,
}

impl Polygon {
    pub fn from_ring(ring: Ring) -> Polygon {
        Polygon {
            rings: vec![ring.as_outer()],
        }
    }

    pub fn with_holes(exterior: Ring, holes: Vec<Ring>) -> Polygon {
        let mut rings = vec![exterior.as_outer()];
        rings.extend(holes.into_iter().map(|r| r.as_hole()));
        Polygon { rings }
    }

    pub fn exterior(&self) -> &Ring {
        &self.rings[0]
    }

    pub fn holes(&self) -> &[Ring] {
        &self.rings[1..]
    }

    pub fn rings(&self) -> &Vec<Ring> {
        &self.rings
    }

    /// Planar even-odd containment over all rings: inside the exterior and not swallowed by a
    /// hole.
    pub fn contains_pt(&self, pt: LonLat) -> bool {
        self.rings.iter().filter(|r| r.contains_pt(pt)).count() % 2 == 1
    }
}

/// Zero or more polygons treated as one region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiPolygon(pub Vec<Polygon>);

impl MultiPolygon {
    pub fn empty() -> MultiPolygon {
        MultiPolygon(Vec::new())
    }

    pub fn polygons(&self) -> &Vec<Polygon> {
        &self.0
    }

    pub fn contains_pt(&self, pt: LonLat) -> bool {
        self.0.iter().any(|p| p.contains_pt(pt))
    }

    pub fn union(&self, other: &MultiPolygon) -> MultiPolygon {
        conversions::from_geo(conversions::to_geo(self).union(&conversions::to_geo(other)))
    }

    pub fn difference(&self, other: &MultiPolygon) -> MultiPolygon {
        conversions::from_geo(conversions::to_geo(self).difference(&conversions::to_geo(other)))
    }
}

impl From<Polygon> for MultiPolygon {
    fn from(polygon: Polygon) -> MultiPolygon {
        MultiPolygon(vec![polygon])
    }
}

/// Dissolves a pile of possibly overlapping polygons into one region, merging pairwise to keep
/// the intermediate results small.
pub fn union_all(list: Vec<Polygon>) -> MultiPolygon {
    let mut layers: Vec<MultiPolygon> = list.into_iter().map(MultiPolygon::from).collect();
    if layers.is_empty() {
        return MultiPolygon::empty();
    }
    while layers.len() > 1 {
        let mut merged = Vec::new();
        for pair in layers.chunks(2) {
            if pair.len() == 2 {
                merged.push(pair[0].union(&pair[1]));
            } else {
                merged.push(pair[0].clone());
            }
        }
        layers = merged;
    }
    layers.pop().unwrap()
}
