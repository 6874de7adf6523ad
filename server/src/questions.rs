//! The question evaluator. Every handler follows the same contract: compute a truthful verdict
//! from the index and the players' positions, append the matching exclusion feature(s) to the
//! lobby's mask, record a history entry, and offer the hider a card draw.

use hyper::{Body, Response, StatusCode};
use serde::{Deserialize, Serialize};

use geom::{union_all, Distance, LonLat, PolyLine, Polygon, Ring};
use map_model::{District, Map, RelationID};

use crate::cards;
use crate::config::{
    close_route_threshold, hiding_zone_radius, thermometer_box, universe, universe_polygon,
};
use crate::errors::{empty_response, json_response, ApiError};
use crate::mask;
use crate::model::{GamePhase, Lobby, Thermometer};
use crate::storage::Database;

#[derive(Deserialize)]
struct ThermometerRequest {
    distance: f64,
}

#[derive(Deserialize)]
struct TrainServiceRequest {
    #[serde(rename = "routeID")]
    route_id: i64,
}

#[derive(Serialize)]
struct RouteProximityResponse {
    routes: Vec<RouteDetails>,
}

#[derive(Serialize)]
struct RouteDetails {
    name: String,
    #[serde(rename = "routeID")]
    route_id: i64,
}

/// Questions only start once the run is over and the seeker is narrowing the location.
fn check_phase(lobby: &Lobby) -> Result<(), ApiError> {
    if lobby.phase >= GamePhase::LocationNarrowing && lobby.phase != GamePhase::Invalid {
        Ok(())
    } else {
        Err(ApiError::Conflict)
    }
}

/// (hider, seeker) positions; a question can't be answered before both exist.
fn positions(lobby: &Lobby) -> Result<(LonLat, LonLat), ApiError> {
    match (lobby.hider_pt, lobby.seeker_pt) {
        (Some(hider), Some(seeker)) => Ok((hider, seeker)),
        _ => Err(ApiError::Conflict),
    }
}

fn parse_radius(raw: &str) -> Result<Distance, ApiError> {
    let meters: f64 = raw.parse().map_err(ApiError::bad_request)?;
    if !meters.is_finite() || meters <= 0.0 {
        return Err(ApiError::bad_request(anyhow!("bad radius {:?}", raw)));
    }
    Ok(Distance::meters(meters))
}

/// The seeker's current position, for geocoding before the real work starts.
pub fn seeker_position(db: &Database, code: &str) -> Result<LonLat, ApiError> {
    let lobby = db.lobby(code)?;
    check_phase(lobby)?;
    Ok(positions(lobby)?.1)
}

/// Radar: is the hider within `radius` of the seeker? A miss excludes the disk itself; a hit
/// excludes everything outside it.
pub fn radar(
    db: &mut Database,
    code: &str,
    raw_radius: &str,
    seeker_address: &str,
) -> Result<Response<Body>, ApiError> {
    let radius = parse_radius(raw_radius)?;
    let draw_id = db.new_draw_id();
    let lobby = db.lobby_mut(code)?;
    check_phase(lobby)?;
    let (hider, seeker) = positions(lobby)?;

    let within = hider.gps_dist(seeker) < radius;
    let mut fc = mask::parse(lobby)?;
    if within {
        mask::append_polygon(
            &mut fc,
            &Polygon::inverse_circle(seeker, radius, &universe()),
        );
    } else {
        mask::append_polygon(&mut fc, &Polygon::circle(seeker, radius));
    }
    mask::store(lobby, fc)?;

    lobby.record(
        "Radar",
        format!(
            "Hider is {} {} of {}",
            if within { "within" } else { "not within" },
            radius.describe_rounded(),
            seeker_address
        ),
    );
    cards::offer_draw(draw_id, lobby, 2, 1);
    Ok(empty_response(StatusCode::OK))
}

/// Arms the thermometer: snapshots where the seeker is and how far they'll walk.
pub fn thermometer_start(
    db: &mut Database,
    code: &str,
    body: &[u8],
) -> Result<Response<Body>, ApiError> {
    let req: ThermometerRequest = serde_json::from_slice(body).map_err(ApiError::bad_request)?;
    if !req.distance.is_finite() || req.distance <= 0.0 {
        return Err(ApiError::bad_request(anyhow!(
            "bad thermometer distance {}",
            req.distance
        )));
    }
    let lobby = db.lobby_mut(code)?;
    check_phase(lobby)?;
    let (_, seeker) = positions(lobby)?;
    if lobby.thermometer.is_some() {
        return Err(ApiError::Conflict);
    }
    lobby.thermometer = Some(Thermometer {
        start: seeker,
        distance_meters: req.distance,
    });
    Ok(empty_response(StatusCode::OK))
}

/// Reads the thermometer: hotter or colder than where the seeker armed it? Shades a 30km box on
/// the cold side of the halfway line.
pub fn thermometer_end(db: &mut Database, code: &str) -> Result<Response<Body>, ApiError> {
    let draw_id = db.new_draw_id();
    let lobby = db.lobby_mut(code)?;
    check_phase(lobby)?;
    let (hider, seeker) = positions(lobby)?;
    let thermometer = lobby.thermometer.clone().ok_or(ApiError::Conflict)?;

    let moved = thermometer.start.gps_dist(seeker);
    if moved < Distance::meters(thermometer.distance_meters) {
        return Err(ApiError::Precondition);
    }

    let walk_bearing = thermometer.start.initial_bearing(seeker);
    let hotter = hider.gps_dist(seeker) < hider.gps_dist(thermometer.start);
    // The box extends away from the hider's half: backwards past the start when hotter, onwards
    // past the end when colder.
    let bearing = if hotter {
        walk_bearing.opposite()
    } else {
        walk_bearing
    };
    let mid = thermometer.start.project_away(moved / 2.0, walk_bearing);
    let half = thermometer_box() / 2.0;
    let a = mid.project_away(half, bearing.rotate_degs(90.0));
    let b = mid.project_away(half, bearing.rotate_degs(-90.0));
    let c = b.project_away(thermometer_box(), bearing);
    let d = a.project_away(thermometer_box(), bearing);

    let mut fc = mask::parse(lobby)?;
    mask::append_polygon(
        &mut fc,
        &Polygon::from_ring(Ring::must_new(vec![a, b, c, d, a])),
    );
    mask::store(lobby, fc)?;

    lobby.record(
        "Thermometer",
        format!(
            "Hider is {} after the seeker moved {}",
            if hotter { "hotter" } else { "colder" },
            moved.describe_rounded()
        ),
    );
    lobby.thermometer = None;
    cards::offer_draw(draw_id, lobby, 2, 1);
    Ok(empty_response(StatusCode::OK))
}

pub fn same_district(db: &mut Database, map: &Map, code: &str) -> Result<Response<Body>, ApiError> {
    district_question(db, &map.districts, code, "Same Bezirk")
}

pub fn same_subdistrict(
    db: &mut Database,
    map: &Map,
    code: &str,
) -> Result<Response<Body>, ApiError> {
    district_question(db, &map.subdistricts, code, "Same Ortsteil")
}

/// Are hider and seeker in the same district? Same: the hider's district is the only one left,
/// so shade every other. Different: only the seeker's district is ruled out.
fn district_question(
    db: &mut Database,
    layer: &[District],
    code: &str,
    title: &str,
) -> Result<Response<Body>, ApiError> {
    let draw_id = db.new_draw_id();
    let lobby = db.lobby_mut(code)?;
    check_phase(lobby)?;
    let (hider, seeker) = positions(lobby)?;

    let seeker_district = layer
        .iter()
        .find(|d| d.shape.contains_pt(seeker))
        .ok_or_else(|| ApiError::Internal(anyhow!("seeker {} is outside every district", seeker)))?;
    let hider_district = layer.iter().find(|d| d.shape.contains_pt(hider));
    let same = hider_district
        .map(|d| d.id == seeker_district.id)
        .unwrap_or(false);

    let mut fc = mask::parse(lobby)?;
    let description = if same {
        let hider_district = hider_district.unwrap();
        for other in layer {
            if other.id != hider_district.id {
                mask::append_multipolygon(&mut fc, &other.shape);
            }
        }
        format!("Hider is in {}", hider_district.name)
    } else {
        mask::append_multipolygon(&mut fc, &seeker_district.shape);
        format!("Hider is not in {}", seeker_district.name)
    };
    mask::store(lobby, fc)?;

    lobby.record(title, description);
    cards::offer_draw(draw_id, lobby, 3, 1);
    Ok(empty_response(StatusCode::OK))
}

/// Does the hider's sub-district name end with the same letter as the seeker's?
pub fn subdistrict_last_letter(
    db: &mut Database,
    map: &Map,
    code: &str,
) -> Result<Response<Body>, ApiError> {
    let draw_id = db.new_draw_id();
    let lobby = db.lobby_mut(code)?;
    check_phase(lobby)?;
    let (hider, seeker) = positions(lobby)?;

    let seeker_letter = map
        .subdistrict_containing(seeker)
        .and_then(|d| d.name.chars().last())
        .ok_or_else(|| ApiError::Internal(anyhow!("seeker {} has no sub-district", seeker)))?;
    let hider_letter = map
        .subdistrict_containing(hider)
        .and_then(|d| d.name.chars().last())
        .ok_or_else(|| ApiError::Internal(anyhow!("hider has no sub-district")))?;
    let same = hider_letter == seeker_letter;

    let mut fc = mask::parse(lobby)?;
    for district in &map.subdistricts {
        let letter = district.name.chars().last();
        // Same: everything not ending in the hider's letter is out. Different: everything ending
        // in the seeker's letter is out.
        let excluded = if same {
            letter != Some(hider_letter)
        } else {
            letter == Some(seeker_letter)
        };
        if excluded {
            mask::append_multipolygon(&mut fc, &district.shape);
        }
    }
    mask::store(lobby, fc)?;

    lobby.record(
        "Ortsteil last letter",
        if same {
            format!("Hider's Ortsteil ends with '{}'", seeker_letter)
        } else {
            format!("Hider's Ortsteil doesn't end with '{}'", seeker_letter)
        },
    );
    cards::offer_draw(draw_id, lobby, 3, 1);
    Ok(empty_response(StatusCode::OK))
}

pub fn closer_to_mcdonalds(
    db: &mut Database,
    map: &Map,
    code: &str,
) -> Result<Response<Body>, ApiError> {
    closer_to_brand(db, &map.mcdonalds, code, "McDonald's", "a McDonald's")
}

pub fn closer_to_ikea(db: &mut Database, map: &Map, code: &str) -> Result<Response<Body>, ApiError> {
    closer_to_brand(db, &map.ikea, code, "IKEA", "an IKEA")
}

/// Is the seeker closer to the nearest branded POI than the hider is? If so, the hider is
/// outside *every* disk of the seeker's distance; if not, they're inside at least one of them.
fn closer_to_brand(
    db: &mut Database,
    pois: &[LonLat],
    code: &str,
    title: &str,
    label: &str,
) -> Result<Response<Body>, ApiError> {
    let draw_id = db.new_draw_id();
    let lobby = db.lobby_mut(code)?;
    check_phase(lobby)?;
    let (hider, seeker) = positions(lobby)?;

    let seeker_dist = min_dist(pois, seeker)
        .ok_or_else(|| ApiError::Internal(anyhow!("no {} POIs in the index", title)))?;
    let hider_dist = min_dist(pois, hider)
        .ok_or_else(|| ApiError::Internal(anyhow!("no {} POIs in the index", title)))?;
    let closer = seeker_dist < hider_dist;

    let mut fc = mask::parse(lobby)?;
    if closer {
        for poi in pois {
            mask::append_polygon(&mut fc, &Polygon::circle(*poi, seeker_dist));
        }
    } else {
        let disks = union_all(
            pois.iter()
                .map(|poi| Polygon::circle(*poi, seeker_dist))
                .collect(),
        );
        mask::append_multipolygon(&mut fc, &universe_polygon().difference(&disks));
    }
    mask::store(lobby, fc)?;

    lobby.record(
        title,
        if closer {
            format!(
                "Hider is further than {} from {}",
                seeker_dist.describe_rounded(),
                label
            )
        } else {
            format!(
                "Hider is closer than {} to {}",
                seeker_dist.describe_rounded(),
                label
            )
        },
    );
    cards::offer_draw(draw_id, lobby, 3, 1);
    Ok(empty_response(StatusCode::OK))
}

pub fn closer_to_spree(
    db: &mut Database,
    map: &Map,
    code: &str,
) -> Result<Response<Body>, ApiError> {
    closer_to_line(db, &map.river, code, "The Spree", "the Spree")
}

/// Like the brand question, against a set of line strings. The region within the seeker's
/// distance of the line is a corridor: a rectangle per segment plus a disk per vertex, unioned.
fn closer_to_line(
    db: &mut Database,
    lines: &[PolyLine],
    code: &str,
    title: &str,
    label: &str,
) -> Result<Response<Body>, ApiError> {
    let draw_id = db.new_draw_id();
    let lobby = db.lobby_mut(code)?;
    check_phase(lobby)?;
    let (hider, seeker) = positions(lobby)?;

    let vertices: Vec<LonLat> = lines.iter().flat_map(|l| l.points().clone()).collect();
    let seeker_dist = min_dist(&vertices, seeker)
        .ok_or_else(|| ApiError::Internal(anyhow!("the index has no river")))?;

    let mut pieces = Vec::new();
    for line in lines {
        let pts = line.points();
        for (i, pt) in pts.iter().enumerate() {
            if let Some(next) = pts.get(i + 1) {
                let bearing = pt.initial_bearing(*next);
                let normal = bearing.rotate_degs(90.0);
                let antinormal = bearing.rotate_degs(-90.0);
                let ring = Ring::must_new(vec![
                    pt.project_away(seeker_dist, normal),
                    next.project_away(seeker_dist, normal),
                    next.project_away(seeker_dist, antinormal),
                    pt.project_away(seeker_dist, antinormal),
                    pt.project_away(seeker_dist, normal),
                ]);
                pieces.push(Polygon::from_ring(ring));
            }
            pieces.push(Polygon::circle(*pt, seeker_dist));
        }
    }
    let corridor = union_all(pieces);
    let inside = corridor.contains_pt(hider);

    let mut fc = mask::parse(lobby)?;
    if inside {
        mask::append_multipolygon(&mut fc, &universe_polygon().difference(&corridor));
    } else {
        mask::append_multipolygon(&mut fc, &corridor);
    }
    mask::store(lobby, fc)?;

    lobby.record(
        title,
        if inside {
            format!(
                "Hider is closer than {} to {}",
                seeker_dist.describe_rounded(),
                label
            )
        } else {
            format!(
                "Hider is further than {} from {}",
                seeker_dist.describe_rounded(),
                label
            )
        },
    );
    cards::offer_draw(draw_id, lobby, 3, 1);
    Ok(empty_response(StatusCode::OK))
}

/// Does the hiding zone touch this route? On-line means some stop of the route is within the
/// zone radius of the zone center; then the hider must be near *some* stop, so everything
/// beyond two zone radii of every stop is shaded. Off-line shades a zone-radius disk per stop.
pub fn train_service(
    db: &mut Database,
    map: &Map,
    code: &str,
    body: &[u8],
) -> Result<Response<Body>, ApiError> {
    let req: TrainServiceRequest = serde_json::from_slice(body).map_err(ApiError::bad_request)?;
    let route = map
        .route(RelationID(req.route_id))
        .ok_or(ApiError::NotFound)?;

    let draw_id = db.new_draw_id();
    let lobby = db.lobby_mut(code)?;
    check_phase(lobby)?;
    let zone = lobby.zone_center.ok_or(ApiError::Conflict)?;

    let radius = hiding_zone_radius();
    let on_line = route.stops.iter().any(|stop| zone.gps_dist(*stop) <= radius);

    let mut fc = mask::parse(lobby)?;
    if on_line {
        let disks = union_all(
            route
                .stops
                .iter()
                .map(|stop| Polygon::circle(*stop, radius * 2.0))
                .collect(),
        );
        mask::append_multipolygon(&mut fc, &universe_polygon().difference(&disks));
    } else {
        for stop in &route.stops {
            mask::append_polygon(&mut fc, &Polygon::circle(*stop, radius));
        }
    }
    mask::store(lobby, fc)?;

    lobby.record(
        "Train service",
        if on_line {
            format!("Hider's zone is served by {}", route.name)
        } else {
            format!("Hider's zone is not served by {}", route.name)
        },
    );
    cards::offer_draw(draw_id, lobby, 3, 1);
    Ok(empty_response(StatusCode::OK))
}

/// Read-only: which routes pass near the seeker right now? No mask change, no card draw.
pub fn close_routes(db: &Database, map: &Map, code: &str) -> Result<Response<Body>, ApiError> {
    let lobby = db.lobby(code)?;
    check_phase(lobby)?;
    let (_, seeker) = positions(lobby)?;
    let routes = map
        .routes_near(seeker, close_route_threshold())
        .into_iter()
        .map(|route| RouteDetails {
            name: route.name.clone(),
            route_id: route.id.0,
        })
        .collect();
    json_response(StatusCode::OK, &RouteProximityResponse { routes })
}

fn min_dist(points: &[LonLat], from: LonLat) -> Option<Distance> {
    let mut best: Option<Distance> = None;
    for pt in points {
        let dist = from.gps_dist(*pt);
        // A POI exactly at the player is the player; ignore it.
        if dist == Distance::ZERO {
            continue;
        }
        best = Some(match best {
            Some(so_far) => so_far.min(dist),
            None => dist,
        });
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GamePhase;
    use crate::testutil::{narrowing_lobby, test_map, HIDER, SEEKER};
    use geom::MultiPolygon;

    fn mask_shapes(db: &Database, code: &str) -> Vec<MultiPolygon> {
        let fc = mask::parse(db.lobby(code).unwrap()).unwrap();
        fc.features
            .iter()
            .map(|f| MultiPolygon::from_geojson(f.geometry.as_ref().unwrap()).unwrap())
            .collect()
    }

    #[test]
    fn questions_rejected_before_narrowing() {
        let (mut db, code) = narrowing_lobby();
        db.lobby_mut(&code).unwrap().phase = GamePhase::Run;
        assert!(matches!(
            radar(&mut db, &code, "1000", "somewhere"),
            Err(ApiError::Conflict)
        ));
    }

    #[test]
    fn radar_miss_appends_the_disk() {
        let (mut db, code) = narrowing_lobby();
        {
            let lobby = db.lobby_mut(&code).unwrap();
            lobby.hider_pt = Some(LonLat::new(13.40, 52.52));
            lobby.seeker_pt = Some(LonLat::new(13.50, 52.52));
        }
        let before = mask_shapes(&db, &code).len();
        radar(&mut db, &code, "1000", "Alexanderplatz 1").unwrap();

        let shapes = mask_shapes(&db, &code);
        assert_eq!(shapes.len(), before + 1);
        let disk = shapes.last().unwrap();
        // The disk covers the seeker, not the hider.
        assert!(disk.contains_pt(LonLat::new(13.50, 52.52)));
        assert!(!disk.contains_pt(LonLat::new(13.40, 52.52)));

        let lobby = db.lobby(&code).unwrap();
        let entry = lobby.history.last().unwrap();
        assert_eq!(entry.title, "Radar");
        assert_eq!(entry.description, "Hider is not within 1km of Alexanderplatz 1");
        assert_eq!(lobby.draw_opportunities.len(), 1);
        assert_eq!(lobby.draw_opportunities[0].cards_to_draw, 2);
    }

    #[test]
    fn radar_hit_appends_the_inverse_disk() {
        let (mut db, code) = narrowing_lobby();
        {
            let lobby = db.lobby_mut(&code).unwrap();
            lobby.hider_pt = Some(LonLat::new(13.401, 52.52));
            lobby.seeker_pt = Some(LonLat::new(13.40, 52.52));
        }
        radar(&mut db, &code, "1000", "somewhere").unwrap();
        let shapes = mask_shapes(&db, &code);
        let inverse = shapes.last().unwrap();
        // The mask never covers the hider's true position.
        assert!(!inverse.contains_pt(LonLat::new(13.401, 52.52)));
        // But it shades far-away points inside the universe.
        assert!(inverse.contains_pt(LonLat::new(14.5, 52.5)));
    }

    #[test]
    fn thermometer_full_cycle() {
        let (mut db, code) = narrowing_lobby();
        {
            let lobby = db.lobby_mut(&code).unwrap();
            lobby.hider_pt = Some(LonLat::new(13.45, 52.52));
            lobby.seeker_pt = Some(LonLat::new(13.40, 52.52));
        }
        // End without start
        assert!(matches!(
            thermometer_end(&mut db, &code),
            Err(ApiError::Conflict)
        ));
        thermometer_start(&mut db, &code, br#"{"distance":500.0}"#).unwrap();
        // Double start
        assert!(matches!(
            thermometer_start(&mut db, &code, br#"{"distance":500.0}"#),
            Err(ApiError::Conflict)
        ));
        // Hasn't moved far enough
        assert!(matches!(
            thermometer_end(&mut db, &code),
            Err(ApiError::Precondition)
        ));

        // Walk ~680m east, towards the hider: hotter.
        db.lobby_mut(&code).unwrap().seeker_pt = Some(LonLat::new(13.41, 52.52));
        thermometer_end(&mut db, &code).unwrap();

        let lobby = db.lobby(&code).unwrap();
        assert!(lobby.thermometer.is_none());
        assert!(lobby
            .history
            .last()
            .unwrap()
            .description
            .starts_with("Hider is hotter"));
        // The cold-side box lies west of the halfway line; the hider is not in it.
        let shapes = mask_shapes(&db, &code);
        let cold_box = shapes.last().unwrap();
        assert!(!cold_box.contains_pt(LonLat::new(13.45, 52.52)));
        assert!(cold_box.contains_pt(LonLat::new(13.38, 52.52)));
    }

    #[test]
    fn same_district_shades_the_others() {
        let (mut db, code) = narrowing_lobby();
        let map = test_map();
        {
            // Both in the west district
            let lobby = db.lobby_mut(&code).unwrap();
            lobby.hider_pt = Some(LonLat::new(13.2, 52.4));
            lobby.seeker_pt = Some(LonLat::new(13.3, 52.3));
        }
        let before = mask_shapes(&db, &code).len();
        same_district(&mut db, &map, &code).unwrap();
        // N-1 of the 2 synthetic districts shaded
        assert_eq!(mask_shapes(&db, &code).len(), before + 1);
        let lobby = db.lobby(&code).unwrap();
        assert_eq!(lobby.history.last().unwrap().description, "Hider is in West");

        // Now split them
        db.lobby_mut(&code).unwrap().hider_pt = Some(LonLat::new(13.8, 52.4));
        same_district(&mut db, &map, &code).unwrap();
        let lobby = db.lobby(&code).unwrap();
        assert_eq!(
            lobby.history.last().unwrap().description,
            "Hider is not in West"
        );
        // The seeker's district is shaded; the hider's point stays clear.
        let shapes = mask_shapes(&db, &code);
        let shaded = shapes.last().unwrap();
        assert!(shaded.contains_pt(LonLat::new(13.3, 52.3)));
        assert!(!shaded.contains_pt(LonLat::new(13.8, 52.4)));
    }

    #[test]
    fn closer_to_brand_shades_truthfully() {
        let (mut db, code) = narrowing_lobby();
        let map = test_map();
        {
            // Seeker right by the McDonald's at (13.42, 52.52); hider far east.
            let lobby = db.lobby_mut(&code).unwrap();
            lobby.seeker_pt = Some(LonLat::new(13.425, 52.52));
            lobby.hider_pt = Some(LonLat::new(13.9, 52.5));
        }
        closer_to_mcdonalds(&mut db, &map, &code).unwrap();
        let lobby = db.lobby(&code).unwrap();
        let desc = &lobby.history.last().unwrap().description;
        assert!(desc.starts_with("Hider is further than"), "{}", desc);
        // The hider lies outside every appended disk.
        let shapes = mask_shapes(&db, &code);
        assert!(!shapes
            .iter()
            .skip(1)
            .any(|s| s.contains_pt(LonLat::new(13.9, 52.5))));
    }

    #[test]
    fn closer_to_line_builds_a_corridor() {
        let (mut db, code) = narrowing_lobby();
        let map = test_map();
        {
            // The synthetic river runs along lat 52.45 from lon 13.2 to 13.6. Hider sits on it,
            // seeker is ~5.5km north.
            let lobby = db.lobby_mut(&code).unwrap();
            lobby.hider_pt = Some(LonLat::new(13.4, 52.452));
            lobby.seeker_pt = Some(LonLat::new(13.4, 52.5));
        }
        closer_to_spree(&mut db, &map, &code).unwrap();
        let lobby = db.lobby(&code).unwrap();
        assert!(lobby
            .history
            .last()
            .unwrap()
            .description
            .starts_with("Hider is closer than"));
        // Inside the corridor: the complement was shaded, so the hider stays clear and a point
        // far from the river is covered.
        let shapes = mask_shapes(&db, &code);
        let shaded = shapes.last().unwrap();
        assert!(!shaded.contains_pt(LonLat::new(13.4, 52.452)));
        assert!(shaded.contains_pt(LonLat::new(14.8, 51.2)));
    }

    #[test]
    fn train_service_on_and_off_line() {
        let (mut db, code) = narrowing_lobby();
        let map = test_map();
        let route_id = *map.rail_routes.keys().next().unwrap();
        let body = format!("{{\"routeID\":{}}}", route_id.0);

        // No hiding zone yet
        assert!(matches!(
            train_service(&mut db, &map, &code, body.as_bytes()),
            Err(ApiError::Conflict)
        ));

        // Zone on the route's stop (13.5, 52.5)
        db.lobby_mut(&code).unwrap().zone_center = Some(LonLat::new(13.5, 52.501));
        train_service(&mut db, &map, &code, body.as_bytes()).unwrap();
        let lobby = db.lobby(&code).unwrap();
        assert!(lobby
            .history
            .last()
            .unwrap()
            .description
            .starts_with("Hider's zone is served"));
        let shapes = mask_shapes(&db, &code);
        let shaded = shapes.last().unwrap();
        // Far from every stop: shaded. At the stop: clear.
        assert!(shaded.contains_pt(LonLat::new(14.5, 51.5)));
        assert!(!shaded.contains_pt(LonLat::new(13.5, 52.5)));

        // Unknown route
        assert!(matches!(
            train_service(&mut db, &map, &code, br#"{"routeID":999}"#),
            Err(ApiError::NotFound)
        ));
    }

    #[test]
    fn close_routes_enumeration() {
        let (mut db, code) = narrowing_lobby();
        let map = test_map();
        db.lobby_mut(&code).unwrap().seeker_pt = Some(LonLat::new(13.5, 52.5001));
        let resp = close_routes(&db, &map, &code).unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        db.lobby_mut(&code).unwrap().seeker_pt = Some(LonLat::new(13.05, 52.05));
        let resp = close_routes(&db, &map, &code).unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn min_dist_ignores_exact_zero() {
        let pois = vec![LonLat::new(13.4, 52.5), LonLat::new(13.5, 52.5)];
        let dist = min_dist(&pois, LonLat::new(13.4, 52.5)).unwrap();
        assert!(dist > Distance::meters(6000.0));
        assert!(min_dist(&[], LonLat::new(13.4, 52.5)).is_none());
    }

    #[test]
    fn subdistrict_letters() {
        let (mut db, code) = narrowing_lobby();
        let map = test_map();
        {
            // Hider in "Altglienicke" (ends 'e'), seeker in "Moabit" (ends 't').
            let lobby = db.lobby_mut(&code).unwrap();
            lobby.hider_pt = Some(LonLat::new(13.2, 52.4));
            lobby.seeker_pt = Some(LonLat::new(13.8, 52.4));
        }
        subdistrict_last_letter(&mut db, &map, &code).unwrap();
        let lobby = db.lobby(&code).unwrap();
        assert_eq!(
            lobby.history.last().unwrap().description,
            "Hider's Ortsteil doesn't end with 't'"
        );
        // Moabit (the seeker's) is shaded, Altglienicke isn't.
        let shapes = mask_shapes(&db, &code);
        let shaded = shapes.last().unwrap();
        assert!(shaded.contains_pt(LonLat::new(13.8, 52.4)));
        assert!(!shaded.contains_pt(LonLat::new(13.2, 52.4)));
    }
}
