//! Reads an OSM extract once at startup and distills it into the immutable index the game
//! evaluates questions against: typed node/way/relation tables plus the thematic layers (city
//! boundary, districts, rail, river, branded POIs). Nothing here mutates after `Map::load`
//! returns, so the index can be shared freely.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod extract;
mod reader;
mod stitch;
mod tags;
mod timer;

pub use crate::extract::{relation_multipolygon, District, Map, RailRoute};
pub use crate::reader::{read, Document, Member, Node, NodeID, Relation, RelationID, Way, WayID};
pub use crate::stitch::glue_multipolygon;
pub use crate::tags::Tags;
pub use crate::timer::{elapsed_seconds, Timer};
