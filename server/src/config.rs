//! Gameplay constants. The run duration is the one tunable that varies between dev loops and
//! real games, so it's a CLI flag instead.

use geom::{Distance, GPSBounds, MultiPolygon, Polygon};
use rand::Rng;

/// A hiding zone is a circle of this radius around a rail-reachable center.
pub fn hiding_zone_radius() -> Distance {
    Distance::meters(500.0)
}

/// Rail routes passing within this distance of the seeker count as "close".
pub fn close_route_threshold() -> Distance {
    Distance::meters(300.0)
}

/// The side length of the exclusion box a thermometer answer shades.
pub fn thermometer_box() -> Distance {
    Distance::kilometers(30.0)
}

/// The fixed rectangle comfortably containing the play area, used as the universe polygon in
/// complement operations.
pub fn universe() -> GPSBounds {
    GPSBounds::from_corners(12.0, 51.0, 15.0, 53.0)
}

pub fn universe_polygon() -> MultiPolygon {
    MultiPolygon::from(Polygon::from_ring(universe().to_ring()))
}

pub const LOBBY_CODE_LEN: usize = 6;
pub const LOBBY_CODE_CHARSET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ123456789";
pub const SALT_CHARSET: &str = "0123456789abcdef";

pub fn random_string(len: usize, charset: &str) -> String {
    let chars: Vec<char> = charset.chars().collect();
    let mut rng = rand::thread_rng();
    (0..len).map(|_| chars[rng.gen_range(0..chars.len())]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_strings_use_the_charset() {
        let code = random_string(LOBBY_CODE_LEN, LOBBY_CODE_CHARSET);
        assert_eq!(code.len(), LOBBY_CODE_LEN);
        assert!(code.chars().all(|c| LOBBY_CODE_CHARSET.contains(c)));
    }
}
