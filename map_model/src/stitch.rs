//! OSM multipolygon relations enumerate member ways in arbitrary order and direction. This glues
//! the pieces back into closed rings.

use anyhow::Result;

use geom::{LonLat, MultiPolygon, Polygon, Ring};

/// Reassembles way chains into one polygon per disjoint outer boundary. OSM data quality is
/// imperfect: a boundary with a dangling endpoint is closed with whatever was collected and
/// returned anyway, so callers must tolerate an approximate polygon.
pub fn glue_multipolygon(mut chains: Vec<Vec<LonLat>>) -> Result<MultiPolygon> {
    chains.retain(|pts| !pts.is_empty());
    if chains.is_empty() {
        bail!("empty input");
    }
    let mut polygons = Vec::new();
    while !chains.is_empty() {
        polygons.push(Polygon::from_ring(glue_one_ring(&mut chains)?));
    }
    Ok(MultiPolygon(polygons))
}

fn glue_one_ring(chains: &mut Vec<Vec<LonLat>>) -> Result<Ring> {
    let mut result = chains.remove(0);
    loop {
        let glue_pt = *result.last().unwrap();
        if let Some(idx) = chains
            .iter()
            .position(|pts| pts[0] == glue_pt || *pts.last().unwrap() == glue_pt)
        {
            let mut append = chains.remove(idx);
            if append[0] != glue_pt {
                append.reverse();
            }
            result.pop();
            result.extend(append);
        } else {
            break;
        }
    }

    if result[0] != *result.last().unwrap() {
        warn!(
            "boundary doesn't close after gluing {} points; connecting the ends directly",
            result.len()
        );
        result.push(result[0]);
    }
    Ring::new(result)
}
