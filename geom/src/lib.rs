//! Geometry for a city-scale game on a round earth. Distances and bearings are great-circle;
//! containment and boolean operations are planar, treating WGS84 degrees as Cartesian, which is
//! fine at city scale.

#[macro_use]
extern crate anyhow;

mod angle;
mod bounds;
mod circle;
mod conversions;
mod distance;
mod geojson_io;
mod gps;
mod polygon;
mod polyline;
mod ring;
mod simplify;

pub use crate::angle::Angle;
pub use crate::bounds::GPSBounds;
pub use crate::distance::Distance;
pub use crate::gps::LonLat;
pub use crate::polygon::{union_all, MultiPolygon, Polygon};
pub use crate::polyline::PolyLine;
pub use crate::ring::Ring;
