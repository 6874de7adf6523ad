//! Best-effort reverse geocoding for history descriptions. The lookup goes out to Nominatim and
//! can fail or stall; a question never fails because of it, the description just falls back to
//! raw coordinates.

use anyhow::Result;
use serde::Deserialize;

use geom::LonLat;

#[derive(Deserialize)]
struct Reply {
    display_name: Option<String>,
    address: Option<Address>,
}

#[derive(Deserialize, Default)]
struct Address {
    road: Option<String>,
    house_number: Option<String>,
    suburb: Option<String>,
    county: Option<String>,
}

pub async fn address_near(pt: LonLat) -> String {
    match lookup(pt).await {
        Ok(address) => address,
        Err(err) => {
            warn!("reverse geocoding {} failed: {}", pt, err);
            format!("{}", pt)
        }
    }
}

async fn lookup(pt: LonLat) -> Result<String> {
    let url = format!(
        "https://nominatim.openstreetmap.org/reverse?format=jsonv2&lat={}&lon={}",
        pt.y(),
        pt.x()
    );
    let client = reqwest::Client::builder()
        .user_agent("hide-and-seek-server")
        .timeout(std::time::Duration::from_secs(5))
        .build()?;
    let reply: Reply = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if let Some(addr) = reply.address {
        let parts = format!(
            "{} {}, {} {}",
            addr.road.unwrap_or_default(),
            addr.house_number.unwrap_or_default(),
            addr.suburb.unwrap_or_default(),
            addr.county.unwrap_or_default()
        );
        let trimmed = parts.split_whitespace().collect::<Vec<_>>().join(" ");
        if trimmed != "," {
            return Ok(trimmed);
        }
    }
    if let Some(name) = reply.display_name {
        return Ok(name);
    }
    bail!("empty reply")
}
