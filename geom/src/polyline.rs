use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::LonLat;

/// An open sequence of at least two points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolyLine {
    pts: Vec<LonLat>,
}

impl PolyLine {
    pub fn new(pts: Vec<LonLat>) -> Result<PolyLine> {
        if pts.len() < 2 {
            bail!("need at least two points for a PolyLine, got {}", pts.len());
        }
        Ok(PolyLine { pts })
    }

    pub fn must_new(pts: Vec<LonLat>) -> PolyLine {
        PolyLine::new(pts).unwrap()
    }

    pub fn points(&self) -> &Vec<LonLat> {
        &self.pts
    }

    pub fn into_points(self) -> Vec<LonLat> {
        self.pts
    }

    pub fn first_pt(&self) -> LonLat {
        self.pts[0]
    }

    pub fn last_pt(&self) -> LonLat {
        *self.pts.last().unwrap()
    }

    pub fn reversed(&self) -> PolyLine {
        let mut pts = self.pts.clone();
        pts.reverse();
        PolyLine { pts }
    }
}
