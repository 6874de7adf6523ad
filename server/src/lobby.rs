use chrono::{DateTime, Utc};
use hyper::{Body, Response, StatusCode};
use serde::{Deserialize, Serialize};

use geom::LonLat;
use map_model::Map;

use crate::config::{hiding_zone_radius, random_string, LOBBY_CODE_CHARSET, LOBBY_CODE_LEN};
use crate::errors::{empty_response, json_response, ApiError};
use crate::mask;
use crate::model::{GamePhase, HistoryItem, Lobby, Role, UserID};
use crate::storage::Database;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LobbyCreation {
    lobby_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LobbyJoin {
    lobby_token: String,
}

#[derive(Serialize)]
struct PhaseResponse {
    phase: GamePhase,
}

#[derive(Deserialize)]
struct RoleRequest {
    role: Role,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
}

#[derive(Deserialize)]
struct SetReadiness {
    ready: bool,
}

#[derive(Deserialize)]
struct LocationRequest {
    location: LonLat,
}

#[derive(Serialize)]
struct TimeResponse {
    time: Option<DateTime<Utc>>,
}

pub fn parse_code(code: &str) -> Result<String, ApiError> {
    if code.len() == LOBBY_CODE_LEN
        && code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        Ok(code.to_string())
    } else {
        Err(ApiError::bad_request(anyhow!(
            "malformed lobby code {:?}",
            code
        )))
    }
}

pub fn create(db: &mut Database, map: &Map, user: UserID) -> Result<Response<Body>, ApiError> {
    // No zombie lobbies: a creator gets one at a time.
    db.lobbies.retain(|_, lobby| lobby.creator != user);

    let code = loop {
        let code = random_string(LOBBY_CODE_LEN, LOBBY_CODE_CHARSET);
        if !db.lobbies.contains_key(&code) {
            break code;
        }
    };
    let lobby = Lobby::new(code.clone(), user, mask::seed(map)?);
    db.lobbies.insert(code.clone(), lobby);
    info!("created lobby {}", code);
    json_response(StatusCode::CREATED, &LobbyCreation { lobby_token: code })
}

pub fn join(db: &Database, body: &[u8]) -> Result<Response<Body>, ApiError> {
    let req: LobbyJoin = serde_json::from_slice(body).map_err(ApiError::bad_request)?;
    db.lobby(&req.lobby_token)?;
    Ok(empty_response(StatusCode::OK))
}

pub fn get_map(db: &Database, code: &str) -> Result<Response<Body>, ApiError> {
    let lobby = db.lobby(code)?;
    let mut resp = Response::new(Body::from(lobby.mask.clone()));
    resp.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    Ok(resp)
}

pub fn get_phase(db: &Database, code: &str) -> Result<Response<Body>, ApiError> {
    let lobby = db.lobby(code)?;
    json_response(StatusCode::OK, &PhaseResponse { phase: lobby.phase })
}

pub fn get_roles(db: &Database, code: &str) -> Result<Response<Body>, ApiError> {
    let lobby = db.lobby(code)?;
    let mut available = Vec::new();
    if lobby.hider.is_none() {
        available.push(Role::Hider);
    }
    if lobby.seeker.is_none() {
        available.push(Role::Seeker);
    }
    json_response(StatusCode::OK, &available)
}

/// Claims a role. A slot can be taken if it's empty or already ours; switching roles releases
/// the old slot, so the two ids stay distinct.
pub fn select_role(
    db: &mut Database,
    code: &str,
    user: UserID,
    body: &[u8],
) -> Result<Response<Body>, ApiError> {
    let req: RoleRequest = serde_json::from_slice(body).map_err(ApiError::bad_request)?;
    let lobby = db.lobby_mut(code)?;
    let slot = match req.role {
        Role::Hider => &mut lobby.hider,
        Role::Seeker => &mut lobby.seeker,
    };
    if slot.is_some() && *slot != Some(user) {
        return Err(ApiError::Conflict);
    }
    *slot = Some(user);
    match req.role {
        Role::Hider => {
            if lobby.seeker == Some(user) {
                lobby.seeker = None;
            }
        }
        Role::Seeker => {
            if lobby.hider == Some(user) {
                lobby.hider = None;
            }
        }
    }
    Ok(empty_response(StatusCode::OK))
}

pub fn get_readiness(db: &Database, code: &str) -> Result<Response<Body>, ApiError> {
    let lobby = db.lobby(code)?;
    json_response(
        StatusCode::OK,
        &ReadinessResponse {
            ready: lobby.hider_ready && lobby.seeker_ready,
        },
    )
}

/// Flips the caller's ready flag. When both flip on, the run starts: the phase advances, the
/// clock is stamped, and the caller is told to arm the one-shot run timer.
pub fn set_readiness(
    db: &mut Database,
    code: &str,
    user: UserID,
    body: &[u8],
) -> Result<(Response<Body>, bool), ApiError> {
    let req: SetReadiness = serde_json::from_slice(body).map_err(ApiError::bad_request)?;
    let lobby = db.lobby_mut(code)?;
    match lobby.role_of(user) {
        Some(Role::Hider) => lobby.hider_ready = req.ready,
        Some(Role::Seeker) => lobby.seeker_ready = req.ready,
        None => return Err(ApiError::Forbidden),
    }
    let mut started = false;
    if lobby.hider_ready && lobby.seeker_ready && lobby.phase == GamePhase::BeforeStart {
        lobby.advance(GamePhase::Run);
        lobby.run_start = Some(Utc::now());
        started = true;
        info!("lobby {} run begins", code);
    }
    Ok((empty_response(StatusCode::OK), started))
}

/// The run timer fired. State may have diverged while we slept, so this reloads by code and only
/// acts if the lobby is still mid-run.
pub fn fire_run_timer(db: &mut Database, code: &str) {
    let lobby = match db.lobbies.get_mut(code) {
        Some(lobby) => lobby,
        None => return,
    };
    if lobby.phase != GamePhase::Run {
        return;
    }
    info!("lobby {} run is over, location narrowing begins", code);
    lobby.advance(GamePhase::LocationNarrowing);
}

pub fn save_location(
    db: &mut Database,
    code: &str,
    user: UserID,
    body: &[u8],
) -> Result<Response<Body>, ApiError> {
    let req: LocationRequest = serde_json::from_slice(body).map_err(ApiError::bad_request)?;
    let lobby = db.lobby_mut(code)?;
    match lobby.role_of(user) {
        Some(Role::Hider) => lobby.hider_pt = Some(req.location),
        Some(Role::Seeker) => lobby.seeker_pt = Some(req.location),
        None => return Err(ApiError::Forbidden),
    }
    Ok(empty_response(StatusCode::OK))
}

/// Only the hider picks the hiding zone, and only somewhere transit can reach: within 500m of
/// some railway station. Also initializes the hider's position to the zone center.
pub fn save_hiding_zone(
    db: &mut Database,
    map: &Map,
    code: &str,
    user: UserID,
    body: &[u8],
) -> Result<Response<Body>, ApiError> {
    let req: LocationRequest = serde_json::from_slice(body).map_err(ApiError::bad_request)?;
    let lobby = db.lobby_mut(code)?;
    if lobby.role_of(user) != Some(Role::Hider) {
        return Err(ApiError::Forbidden);
    }
    if map
        .station_within(req.location, hiding_zone_radius())
        .is_none()
    {
        return Err(ApiError::bad_request(anyhow!(
            "hiding zone {} isn't near a railway station",
            req.location
        )));
    }
    lobby.zone_center = Some(req.location);
    lobby.hider_pt = Some(req.location);
    Ok(empty_response(StatusCode::OK))
}

pub fn run_start_time(db: &Database, code: &str) -> Result<Response<Body>, ApiError> {
    let lobby = db.lobby(code)?;
    json_response(
        StatusCode::OK,
        &TimeResponse {
            time: lobby.run_start,
        },
    )
}

pub fn get_history(db: &Database, code: &str) -> Result<Response<Body>, ApiError> {
    let lobby = db.lobby(code)?;
    let history: &Vec<HistoryItem> = &lobby.history;
    json_response(StatusCode::OK, history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{lobby_with_players, test_map, HIDER, SEEKER};

    #[test]
    fn create_seeds_the_mask() {
        let map = test_map();
        let mut db = Database::default();
        let resp = create(&mut db, &map, UserID(1)).unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(db.lobbies.len(), 1);
        let lobby = db.lobbies.values().next().unwrap();
        assert_eq!(lobby.code.len(), LOBBY_CODE_LEN);
        assert!(parse_code(&lobby.code).is_ok());
        let fc = mask::parse(lobby).unwrap();
        assert_eq!(fc.features.len(), 1);

        // Creating again deletes the old lobby.
        create(&mut db, &map, UserID(1)).unwrap();
        assert_eq!(db.lobbies.len(), 1);
    }

    #[test]
    fn role_conflict() {
        let map = test_map();
        let mut db = Database::default();
        create(&mut db, &map, UserID(1)).unwrap();
        let code = db.lobbies.keys().next().unwrap().clone();

        let hider_req = br#"{"role":"Hider"}"#;
        assert!(select_role(&mut db, &code, UserID(1), hider_req).is_ok());
        // Re-claiming your own slot is fine
        assert!(select_role(&mut db, &code, UserID(1), hider_req).is_ok());
        // Someone else claiming it isn't
        assert!(matches!(
            select_role(&mut db, &code, UserID(2), hider_req),
            Err(ApiError::Conflict)
        ));
        // But the other slot is open
        assert!(select_role(&mut db, &code, UserID(2), br#"{"role":"Seeker"}"#).is_ok());
        let lobby = db.lobby(&code).unwrap();
        assert_eq!(lobby.hider, Some(UserID(1)));
        assert_eq!(lobby.seeker, Some(UserID(2)));
    }

    #[test]
    fn switching_roles_keeps_ids_distinct() {
        let map = test_map();
        let mut db = Database::default();
        create(&mut db, &map, UserID(1)).unwrap();
        let code = db.lobbies.keys().next().unwrap().clone();
        select_role(&mut db, &code, UserID(1), br#"{"role":"Hider"}"#).unwrap();
        select_role(&mut db, &code, UserID(1), br#"{"role":"Seeker"}"#).unwrap();
        let lobby = db.lobby(&code).unwrap();
        assert_eq!(lobby.hider, None);
        assert_eq!(lobby.seeker, Some(UserID(1)));
    }

    #[test]
    fn readiness_starts_the_run() {
        let (mut db, code) = lobby_with_players();
        let ready = br#"{"ready":true}"#;

        // A stranger can't set readiness
        assert!(matches!(
            set_readiness(&mut db, &code, UserID(99), ready),
            Err(ApiError::Forbidden)
        ));

        let (_, started) = set_readiness(&mut db, &code, HIDER, ready).unwrap();
        assert!(!started);
        assert_eq!(db.lobby(&code).unwrap().phase, GamePhase::BeforeStart);

        let (_, started) = set_readiness(&mut db, &code, SEEKER, ready).unwrap();
        assert!(started);
        let lobby = db.lobby(&code).unwrap();
        assert_eq!(lobby.phase, GamePhase::Run);
        assert!(lobby.run_start.is_some());

        // The timer advances the phase...
        fire_run_timer(&mut db, &code);
        assert_eq!(db.lobby(&code).unwrap().phase, GamePhase::LocationNarrowing);
        // ...and firing again is a no-op.
        fire_run_timer(&mut db, &code);
        assert_eq!(db.lobby(&code).unwrap().phase, GamePhase::LocationNarrowing);
    }

    #[test]
    fn hiding_zone_validation() {
        let (mut db, code) = lobby_with_players();
        let map = test_map();

        // Nowhere near a station
        assert!(matches!(
            save_hiding_zone(
                &mut db,
                &map,
                &code,
                HIDER,
                br#"{"location":[0.0,0.0]}"#
            ),
            Err(ApiError::BadRequest(_))
        ));
        // The seeker doesn't get to pick
        assert!(matches!(
            save_hiding_zone(
                &mut db,
                &map,
                &code,
                SEEKER,
                br#"{"location":[13.3699,52.5251]}"#
            ),
            Err(ApiError::Forbidden)
        ));
        // Near the synthetic Hauptbahnhof
        save_hiding_zone(
            &mut db,
            &map,
            &code,
            HIDER,
            br#"{"location":[13.3699,52.5251]}"#,
        )
        .unwrap();
        let lobby = db.lobby(&code).unwrap();
        assert!(lobby.zone_center.is_some());
        assert_eq!(lobby.hider_pt, lobby.zone_center);
    }

    #[test]
    fn locations_respect_roles() {
        let (mut db, code) = lobby_with_players();
        save_location(&mut db, &code, SEEKER, br#"{"location":[13.5,52.52]}"#).unwrap();
        assert!(db.lobby(&code).unwrap().seeker_pt.is_some());
        assert!(matches!(
            save_location(&mut db, &code, UserID(99), br#"{"location":[13.5,52.52]}"#),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn code_validation() {
        assert!(parse_code("ABC123").is_ok());
        assert!(parse_code("abc123").is_err());
        assert!(parse_code("ABC12").is_err());
        assert!(parse_code("ABC12!").is_err());
    }
}
