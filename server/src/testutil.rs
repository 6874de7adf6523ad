//! Shared fixtures: a synthetic city small enough to reason about by hand, and lobbies in the
//! states the tests care about.

use geom::LonLat;
use map_model::{Document, Map, Member, Node, NodeID, Relation, RelationID, Tags, Timer, Way, WayID};

use crate::model::{GamePhase, UserID};
use crate::storage::Database;

pub const HIDER: UserID = UserID(1);
pub const SEEKER: UserID = UserID(2);

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

fn add_relation(doc: &mut Document, id: i64, members: Vec<(&str, Member)>, t: Vec<(&str, &str)>) {
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

/// A square city spanning (13, 52)..(14, 52.9), split at lon 13.5 into a West and an East
/// district (doubling as the sub-districts Altglienicke and Moabit), with one station, one
/// subway route stopping at (13.5, 52.5), a McDonald's, and a river along lat 52.45.
pub fn test_map() -> Map {
    let mut doc = Document::empty();

    // City corners
    add_node(&mut doc, 1, 13.0, 52.0, vec![]);
    add_node(&mut doc, 2, 14.0, 52.0, vec![]);
    add_node(&mut doc, 3, 14.0, 52.9, vec![]);
    add_node(&mut doc, 4, 13.0, 52.9, vec![]);
    // Station near Hauptbahnhof's real position
    add_node(
        &mut doc,
        5,
        13.3699,
        52.5251,
        vec![("railway", "station"), ("name", "Hauptbahnhof")],
    );
    // A stop on the subway route, and the route's track
    add_node(&mut doc, 6, 13.5, 52.5, vec![("railway", "stop")]);
    add_node(&mut doc, 9, 13.55, 52.5, vec![]);
    // The split meridian
    add_node(&mut doc, 7, 13.5, 52.0, vec![]);
    add_node(&mut doc, 8, 13.5, 52.9, vec![]);
    // A McDonald's
    add_node(&mut doc, 30, 13.42, 52.52, vec![("brand", "McDonald's")]);
    // River vertices
    add_node(&mut doc, 31, 13.2, 52.45, vec![]);
    add_node(&mut doc, 32, 13.4, 52.45, vec![]);
    add_node(&mut doc, 33, 13.6, 52.45, vec![]);

    // Boundary in two chains
    add_way(&mut doc, 10, vec![1, 2, 3], vec![]);
    add_way(&mut doc, 11, vec![3, 4, 1], vec![]);
    // West and East halves, closed
    add_way(&mut doc, 12, vec![1, 7, 8, 4, 1], vec![]);
    add_way(&mut doc, 14, vec![7, 2, 3, 8, 7], vec![]);
    // Track and river
    add_way(&mut doc, 13, vec![6, 9], vec![("railway", "rail")]);
    add_way(&mut doc, 15, vec![31, 32, 33], vec![("waterway", "river")]);

    add_relation(
        &mut doc,
        20,
        vec![
            ("outer", Member::Way(WayID(10))),
            ("outer", Member::Way(WayID(11))),
        ],
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
            ("name", "West"),
        ],
    );
    add_relation(
        &mut doc,
        23,
        vec![("outer", Member::Way(WayID(14)))],
        vec![
            ("admin_level", "9"),
            ("name:prefix", "Bezirk"),
            ("name", "East"),
        ],
    );
    add_relation(
        &mut doc,
        24,
        vec![("outer", Member::Way(WayID(12)))],
        vec![("admin_level", "10"), ("name", "Altglienicke")],
    );
    add_relation(
        &mut doc,
        25,
        vec![("outer", Member::Way(WayID(14)))],
        vec![("admin_level", "10"), ("name", "Moabit")],
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
    add_relation(
        &mut doc,
        26,
        vec![("main_stream", Member::Way(WayID(15)))],
        vec![("name", "Spree"), ("waterway", "river")],
    );

    let mut timer = Timer::new("build the test map");
    let map = Map::from_document(doc, &mut timer).unwrap();
    timer.done();
    map
}

pub fn fresh_lobby() -> (Database, String) {
    let map = test_map();
    let mut db = Database::default();
    crate::lobby::create(&mut db, &map, UserID(10)).unwrap();
    let code = db.lobbies.keys().next().unwrap().clone();
    (db, code)
}

pub fn lobby_with_players() -> (Database, String) {
    let (mut db, code) = fresh_lobby();
    let lobby = db.lobbies.get_mut(&code).unwrap();
    lobby.hider = Some(HIDER);
    lobby.seeker = Some(SEEKER);
    (db, code)
}

pub fn narrowing_lobby() -> (Database, String) {
    let (mut db, code) = lobby_with_players();
    let lobby = db.lobbies.get_mut(&code).unwrap();
    lobby.phase = GamePhase::LocationNarrowing;
    lobby.hider_pt = Some(LonLat::new(13.4, 52.5));
    lobby.seeker_pt = Some(LonLat::new(13.45, 52.5));
    (db, code)
}
