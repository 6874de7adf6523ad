use std::collections::BTreeMap;

use anyhow::Result;

use geom::{Distance, GPSBounds, LonLat, MultiPolygon, PolyLine, Ring};

use crate::{stitch, Document, Member, NodeID, RelationID, Timer, Way, WayID};

/// The play-area boundary keeps this many points after simplification.
const BOUNDARY_KEEP_POINTS: usize = 1500;

/// Douglas-Peucker tolerance, in degrees, for cleaning up over-noded river ways.
const RIVER_SIMPLIFY_EPSILON: f64 = 1e-7;

/// The immutable index built once at startup. The raw tables stay available for lookups by id;
/// the thematic layers are what question evaluation actually touches.
pub struct Map {
    pub osm: Document,

    pub city_boundary: RelationID,
    /// Stitched from the city boundary relation and simplified; closed, counter-clockwise.
    pub boundary_ring: Ring,
    /// Admin level 9, name-prefixed "Bezirk".
    pub districts: Vec<District>,
    /// Admin level 10.
    pub subdistricts: Vec<District>,
    pub rail_routes: BTreeMap<RelationID, RailRoute>,
    /// Stations and halts, except tourism lines.
    pub stations: Vec<(NodeID, LonLat)>,
    pub mcdonalds: Vec<LonLat>,
    pub ikea: Vec<LonLat>,
    /// The river, as the ordered vertex chains of its member ways.
    pub river: Vec<PolyLine>,
}

pub struct District {
    pub id: RelationID,
    pub name: String,
    pub shape: MultiPolygon,
}

pub struct RailRoute {
    pub id: RelationID,
    pub name: String,
    /// Positions of member nodes tagged railway=stop.
    pub stops: Vec<LonLat>,
    pub ways: Vec<WayID>,
}

impl Map {
    pub fn load(path: &str, timer: &mut Timer) -> Result<Map> {
        let doc = crate::reader::read(path, timer)?;
        Map::from_document(doc, timer)
    }

    pub fn from_document(doc: Document, timer: &mut Timer) -> Result<Map> {
        timer.start("extract thematic layers");

        let mut stations = Vec::new();
        let mut mcdonalds = Vec::new();
        for (id, node) in &doc.nodes {
            if node.tags.is_any("railway", vec!["station", "halt"])
                && !node.tags.is("usage", "tourism")
            {
                stations.push((*id, node.pt));
            }
            if node.tags.is("brand", "McDonald's") {
                mcdonalds.push(node.pt);
            }
        }

        let mut ikea = Vec::new();
        for way in doc.ways.values() {
            if way.tags.is("brand", "McDonald's") {
                mcdonalds.push(way_center(way));
            }
            if way.tags.is("brand", "IKEA")
                && !way
                    .tags
                    .get("name")
                    .map(|name| name.contains("Planning studio"))
                    .unwrap_or(false)
            {
                ikea.push(way_center(way));
            }
        }

        let mut city_boundary = None;
        let mut district_ids = Vec::new();
        let mut subdistrict_ids = Vec::new();
        let mut route_ids = Vec::new();
        let mut river_rel = None;
        for (id, rel) in &doc.relations {
            if rel.tags.is("admin_level", "4")
                && rel.tags.is("de:amtlicher_gemeindeschluessel", "11000000")
            {
                city_boundary = Some(*id);
            }
            if rel.tags.is("admin_level", "9") && rel.tags.is("name:prefix", "Bezirk") {
                district_ids.push(*id);
            }
            if rel.tags.is("admin_level", "10") {
                subdistrict_ids.push(*id);
            }
            if rel.tags.is("route", "subway")
                || rel.tags.is("route", "light_rail")
                || rel.tags.is("service", "regional")
            {
                route_ids.push(*id);
            }
            if rel.tags.is("name", "Spree") {
                river_rel = Some(*id);
            }
        }
        timer.stop("extract thematic layers");

        let city_boundary =
            city_boundary.ok_or_else(|| anyhow!("the extract has no city boundary relation"))?;

        timer.start("assemble boundaries");
        let boundary_ring = assemble_boundary(&doc, city_boundary)?;
        let districts = assemble_districts(&doc, district_ids);
        let subdistricts = assemble_districts(&doc, subdistrict_ids);
        timer.stop("assemble boundaries");

        timer.start("index rail routes");
        let mut rail_routes = BTreeMap::new();
        for id in route_ids {
            rail_routes.insert(id, extract_route(&doc, id));
        }
        timer.stop("index rail routes");

        let river = match river_rel {
            Some(id) => river_linestrings(&doc, id),
            None => {
                warn!("the extract has no river relation");
                Vec::new()
            }
        };

        info!(
            "index has {} districts, {} sub-districts, {} rail routes, {} stations",
            districts.len(),
            subdistricts.len(),
            rail_routes.len(),
            stations.len()
        );

        Ok(Map {
            osm: doc,
            city_boundary,
            boundary_ring,
            districts,
            subdistricts,
            rail_routes,
            stations,
            mcdonalds,
            ikea,
            river,
        })
    }

    /// Some station within `radius` of the point, if any. This is what makes a hiding zone
    /// valid: the spot has to be reachable by transit.
    pub fn station_within(&self, pt: LonLat, radius: Distance) -> Option<NodeID> {
        self.stations
            .iter()
            .find(|(_, loc)| pt.gps_dist(*loc) <= radius)
            .map(|(id, _)| *id)
    }

    pub fn district_containing(&self, pt: LonLat) -> Option<&District> {
        self.districts.iter().find(|d| d.shape.contains_pt(pt))
    }

    pub fn subdistrict_containing(&self, pt: LonLat) -> Option<&District> {
        self.subdistricts.iter().find(|d| d.shape.contains_pt(pt))
    }

    pub fn route(&self, id: RelationID) -> Option<&RailRoute> {
        self.rail_routes.get(&id)
    }

    /// Routes with any way vertex within `threshold` of the point.
    pub fn routes_near(&self, pt: LonLat, threshold: Distance) -> Vec<&RailRoute> {
        self.rail_routes
            .values()
            .filter(|route| {
                route.ways.iter().any(|w| {
                    self.osm
                        .ways
                        .get(w)
                        .map(|way| way.pts.iter().any(|p| p.gps_dist(pt) <= threshold))
                        .unwrap_or(false)
                })
            })
            .collect()
    }
}

/// Stitches all way members of a relation into a multipolygon.
pub fn relation_multipolygon(doc: &Document, id: RelationID) -> Result<MultiPolygon> {
    let rel = doc
        .relations
        .get(&id)
        .ok_or_else(|| anyhow!("unknown relation {}", id))?;
    let mut chains = Vec::new();
    for (_, member) in &rel.members {
        if let Member::Way(w) = member {
            if let Some(way) = doc.ways.get(w) {
                chains.push(way.pts.clone());
            }
        }
    }
    stitch::glue_multipolygon(chains)
}

fn assemble_boundary(doc: &Document, id: RelationID) -> Result<Ring> {
    let mp = relation_multipolygon(doc, id)?;
    // The city is one contiguous shape; take the largest piece if the data disagrees.
    let polygon = mp
        .polygons()
        .iter()
        .max_by_key(|p| p.exterior().points().len())
        .ok_or_else(|| anyhow!("city boundary {} stitched to nothing", id))?;
    Ok(polygon.exterior().simplified_to(BOUNDARY_KEEP_POINTS))
}

fn assemble_districts(doc: &Document, ids: Vec<RelationID>) -> Vec<District> {
    let mut districts = Vec::new();
    for id in ids {
        let rel = &doc.relations[&id];
        let name = match rel.tags.get("name") {
            Some(name) => name.clone(),
            None => {
                warn!("skipping unnamed district {}", id);
                continue;
            }
        };
        match relation_multipolygon(doc, id) {
            Ok(shape) => districts.push(District { id, name, shape }),
            Err(err) => warn!("skipping district {} ({}): {}", id, name, err),
        }
    }
    districts
}

fn extract_route(doc: &Document, id: RelationID) -> RailRoute {
    let rel = &doc.relations[&id];
    let name = rel
        .tags
        .get("ref")
        .or_else(|| rel.tags.get("name"))
        .cloned()
        .unwrap_or_else(|| format!("route {}", id.0));
    let mut stops = Vec::new();
    let mut ways = Vec::new();
    for (_, member) in &rel.members {
        match member {
            Member::Node(n) => {
                let node = &doc.nodes[n];
                if node.tags.is("railway", "stop") {
                    stops.push(node.pt);
                }
            }
            Member::Way(w) => {
                ways.push(*w);
            }
            Member::Relation(_) => {}
        }
    }
    RailRoute {
        id,
        name,
        stops,
        ways,
    }
}

fn river_linestrings(doc: &Document, id: RelationID) -> Vec<PolyLine> {
    let rel = &doc.relations[&id];
    let mut lines = Vec::new();
    for (_, member) in &rel.members {
        if let Member::Way(w) = member {
            if let Some(way) = doc.ways.get(w) {
                if let Ok(line) = PolyLine::new(way.pts.clone()) {
                    lines.push(line.simplified(RIVER_SIMPLIFY_EPSILON));
                }
            }
        }
    }
    lines
}

fn way_center(way: &Way) -> LonLat {
    let mut bounds = GPSBounds::new();
    for pt in &way.pts {
        bounds.update(*pt);
    }
    bounds.center()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Node, Relation, Tags};

    fn tags(pairs: Vec<(&str, &str)>) -> Tags {
        let mut tags = Tags::new();
        for (k, v) in pairs {
            tags.insert(k, v);
        }
        tags
    }

    fn add_node(doc: &mut Document, id: i64, lon: f64, lat: f64, t: Vec<(&str, &str)>) {
        doc.nodes.insert(
            NodeID(id),
            Node {
                pt: LonLat::new(lon, lat),
                tags: tags(t),
            },
        );
    }

    fn add_way(doc: &mut Document, id: i64, node_ids: Vec<i64>, t: Vec<(&str, &str)>) {
        let nodes: Vec<NodeID> = node_ids.into_iter().map(NodeID).collect();
        let pts = nodes.iter().map(|n| doc.nodes[n].pt).collect();
        doc.ways.insert(
            WayID(id),
            Way {
                nodes,
                pts,
                tags: tags(t),
            },
        );
    }

    fn add_relation(
        doc: &mut Document,
        id: i64,
        members: Vec<(&str, Member)>,
        t: Vec<(&str, &str)>,
    ) {
        doc.relations.insert(
            RelationID(id),
            Relation {
                tags: tags(t),
                members: members
                    .into_iter()
                    .map(|(role, m)| (role.to_string(), m))
                    .collect(),
            },
        );
    }

    /// A tiny city: a square boundary, one district covering the west half, a station, and a
    /// one-way rail route.
    pub fn synthetic_doc() -> Document {
        let mut doc = Document::empty();
        // Boundary corners
        add_node(&mut doc, 1, 13.0, 52.0, vec![]);
        add_node(&mut doc, 2, 14.0, 52.0, vec![]);
        add_node(&mut doc, 3, 14.0, 52.9, vec![]);
        add_node(&mut doc, 4, 13.0, 52.9, vec![]);
        // A station and a stop on the route
        add_node(
            &mut doc,
            5,
            13.3699,
            52.5251,
            vec![("railway", "station"), ("name", "Hauptbahnhof")],
        );
        add_node(&mut doc, 6, 13.5, 52.5, vec![("railway", "stop")]);
        // District corners (west half)
        add_node(&mut doc, 7, 13.5, 52.0, vec![]);
        add_node(&mut doc, 8, 13.5, 52.9, vec![]);

        add_way(&mut doc, 10, vec![1, 2, 3], vec![]);
        add_way(&mut doc, 11, vec![3, 4, 1], vec![]);
        add_way(&mut doc, 12, vec![1, 7, 8, 4, 1], vec![]);
        add_way(&mut doc, 13, vec![5, 6], vec![("railway", "rail")]);

        add_relation(
            &mut doc,
            20,
            vec![("outer", Member::Way(WayID(10))), ("outer", Member::Way(WayID(11)))],
            vec![
                ("admin_level", "4"),
                ("de:amtlicher_gemeindeschluessel", "11000000"),
                ("name", "Berlin"),
            ],
        );
        add_relation(
            &mut doc,
            21,
            vec![("outer", Member::Way(WayID(12)))],
            vec![
                ("admin_level", "9"),
                ("name:prefix", "Bezirk"),
                ("name", "Mitte"),
            ],
        );
        add_relation(
            &mut doc,
            22,
            vec![
                ("stop", Member::Node(NodeID(6))),
                ("", Member::Way(WayID(13))),
            ],
            vec![("route", "subway"), ("ref", "U1")],
        );
        doc
    }

    #[test]
    fn extraction() {
        let mut timer = Timer::new("test");
        let map = Map::from_document(synthetic_doc(), &mut timer).unwrap();
        timer.done();

        assert_eq!(map.districts.len(), 1);
        assert_eq!(map.districts[0].name, "Mitte");
        assert!(map.subdistricts.is_empty());
        assert_eq!(map.stations.len(), 1);
        assert_eq!(map.rail_routes.len(), 1);

        // Containment against the extracted district
        assert!(map.district_containing(LonLat::new(13.2, 52.4)).is_some());
        assert!(map.district_containing(LonLat::new(13.8, 52.4)).is_none());

        // The boundary ring closed up
        assert_eq!(
            map.boundary_ring.points().first(),
            map.boundary_ring.points().last()
        );
        assert!(!map.boundary_ring.is_clockwise());

        // Hiding-zone reachability
        assert!(map
            .station_within(LonLat::new(13.3705, 52.5253), Distance::meters(500.0))
            .is_some());
        assert!(map
            .station_within(LonLat::new(13.9, 52.1), Distance::meters(500.0))
            .is_none());

        // Route lookups
        let route = map.rail_routes.values().next().unwrap();
        assert_eq!(route.name, "U1");
        assert_eq!(route.stops.len(), 1);
        assert_eq!(
            map.routes_near(LonLat::new(13.5, 52.5001), Distance::meters(300.0))
                .len(),
            1
        );
        assert!(map
            .routes_near(LonLat::new(13.0, 52.0), Distance::meters(300.0))
            .is_empty());
    }
}
