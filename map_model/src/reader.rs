use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::LonLat;

use crate::{Tags, Timer};

// References to missing objects are just filtered out. PBF extracts order their blocks nodes,
// then ways, then relations, so members resolve in a single pass.

pub struct Document {
    pub nodes: BTreeMap<NodeID, Node>,
    pub ways: BTreeMap<WayID, Way>,
    pub relations: BTreeMap<RelationID, Relation>,
}

impl Document {
    pub fn empty() -> Document {
        Document {
            nodes: BTreeMap::new(),
            ways: BTreeMap::new(),
            relations: BTreeMap::new(),
        }
    }
}

pub struct Node {
    pub pt: LonLat,
    pub tags: Tags,
}

pub struct Way {
    // Duplicates geometry, because it's convenient
    pub nodes: Vec<NodeID>,
    pub pts: Vec<LonLat>,
    pub tags: Tags,
}

pub struct Relation {
    pub tags: Tags,
    /// (role, member)
    pub members: Vec<(String, Member)>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Member {
    Node(NodeID),
    Way(WayID),
    Relation(RelationID),
}

pub fn read(path: &str, timer: &mut Timer) -> Result<Document> {
    timer.start(format!("read {}", path));
    let file = fs_err::File::open(path)?;
    let mut pbf = osmpbfreader::OsmPbfReader::new(file);

    let mut doc = Document::empty();
    for obj in pbf.iter() {
        match obj? {
            osmpbfreader::OsmObj::Node(node) => {
                doc.nodes.insert(
                    NodeID(node.id.0),
                    Node {
                        pt: LonLat::new(node.lon(), node.lat()),
                        tags: read_tags(&node.tags),
                    },
                );
            }
            osmpbfreader::OsmObj::Way(way) => {
                let mut nodes = Vec::new();
                let mut pts = Vec::new();
                for id in &way.nodes {
                    let id = NodeID(id.0);
                    // Just skip missing nodes
                    if let Some(node) = doc.nodes.get(&id) {
                        nodes.push(id);
                        pts.push(node.pt);
                    }
                }
                if !nodes.is_empty() {
                    doc.ways.insert(
                        WayID(way.id.0),
                        Way {
                            nodes,
                            pts,
                            tags: read_tags(&way.tags),
                        },
                    );
                }
            }
            osmpbfreader::OsmObj::Relation(rel) => {
                let mut members = Vec::new();
                for r in &rel.refs {
                    let member = match r.member {
                        osmpbfreader::OsmId::Node(n) => {
                            if !doc.nodes.contains_key(&NodeID(n.0)) {
                                continue;
                            }
                            Member::Node(NodeID(n.0))
                        }
                        osmpbfreader::OsmId::Way(w) => {
                            if !doc.ways.contains_key(&WayID(w.0)) {
                                continue;
                            }
                            Member::Way(WayID(w.0))
                        }
                        osmpbfreader::OsmId::Relation(r) => {
                            if !doc.relations.contains_key(&RelationID(r.0)) {
                                continue;
                            }
                            Member::Relation(RelationID(r.0))
                        }
                    };
                    members.push((r.role.to_string(), member));
                }
                doc.relations.insert(
                    RelationID(rel.id.0),
                    Relation {
                        tags: read_tags(&rel.tags),
                        members,
                    },
                );
            }
        }
    }
    timer.stop(format!("read {}", path));
    info!(
        "found {} nodes, {} ways, {} relations",
        doc.nodes.len(),
        doc.ways.len(),
        doc.relations.len()
    );

    Ok(doc)
}

fn read_tags(raw: &osmpbfreader::Tags) -> Tags {
    let mut tags = Tags::new();
    for (key, value) in raw.iter() {
        // Filter out really useless data
        if key.starts_with("tiger:") || key.starts_with("old_name:") {
            continue;
        }
        tags.insert(key, value);
    }
    tags
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeID(pub i64);
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WayID(pub i64);
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationID(pub i64);

impl fmt::Display for NodeID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "https://www.openstreetmap.org/node/{}", self.0)
    }
}
impl fmt::Display for WayID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "https://www.openstreetmap.org/way/{}", self.0)
    }
}
impl fmt::Display for RelationID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "https://www.openstreetmap.org/relation/{}", self.0)
    }
}
