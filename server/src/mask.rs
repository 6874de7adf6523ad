//! The exclusion mask: a GeoJSON feature collection per lobby, stored as text on the lobby row.
//! Question handlers parse it, append features, and write it back; features are never coalesced,
//! the client just overlays them.

use geojson::{Feature, FeatureCollection, GeoJson};

use geom::{MultiPolygon, Polygon};
use map_model::Map;

use crate::config::universe;
use crate::errors::ApiError;
use crate::model::Lobby;

/// The mask a fresh lobby starts with: everything outside the city is shaded, by wrapping the
/// play-area boundary (as a hole) in the universe rectangle.
pub fn seed(map: &Map) -> Result<String, ApiError> {
    let polygon = Polygon::with_holes(universe().to_ring(), vec![map.boundary_ring.clone()]);
    let mut feature = feature(polygon.to_geojson());
    feature.set_property("category", "game_area_border");
    let fc = FeatureCollection {
        bbox: None,
        features: vec![feature],
        foreign_members: None,
    };
    serialize(&fc)
}

pub fn parse(lobby: &Lobby) -> Result<FeatureCollection, ApiError> {
    let geojson: GeoJson = lobby
        .mask
        .parse()
        .map_err(|err: geojson::Error| ApiError::Internal(err.into()))?;
    FeatureCollection::try_from(geojson).map_err(|err| ApiError::Internal(err.into()))
}

pub fn append_polygon(fc: &mut FeatureCollection, polygon: &Polygon) {
    fc.features.push(feature(polygon.to_geojson()));
}

pub fn append_multipolygon(fc: &mut FeatureCollection, mp: &MultiPolygon) {
    fc.features.push(feature(mp.to_geojson()));
}

pub fn store(lobby: &mut Lobby, fc: FeatureCollection) -> Result<(), ApiError> {
    lobby.mask = serialize(&fc)?;
    Ok(())
}

fn serialize(fc: &FeatureCollection) -> Result<String, ApiError> {
    serde_json::to_string(fc).map_err(|err| ApiError::Internal(err.into()))
}

fn feature(geometry: geojson::Geometry) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: None,
        foreign_members: None,
    }
}
