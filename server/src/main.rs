//! The authoritative server for a two-player hide-and-seek game across a real city. One process:
//! load the OSM index, open the store, serve JSON over HTTP until killed.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

mod auth;
mod cards;
mod config;
mod errors;
mod geocode;
mod lobby;
mod mask;
mod model;
mod questions;
mod storage;
#[cfg(test)]
mod testutil;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server};
use structopt::StructOpt;

use map_model::{Map, Timer};

use crate::errors::ApiError;
use crate::model::UserID;
use crate::storage::Store;

lazy_static! {
    static ref MAP: RwLock<Option<Map>> = RwLock::new(None);
    static ref STORE: Mutex<Store> = Mutex::new(Store::empty());
    static ref RUN_DURATION: RwLock<Duration> = RwLock::new(Duration::from_secs(45 * 60));
}

#[derive(StructOpt)]
#[structopt(name = "server", about = "Authoritative server for city-wide hide-and-seek")]
struct Args {
    /// Port to listen on
    #[structopt(long, default_value = "3000")]
    port: u16,
    /// The OSM extract to index at startup
    #[structopt(long, default_value = "./berlin-latest.osm.pbf")]
    osm_path: String,
    /// Where the durable store lives
    #[structopt(long, default_value = "./gamedata.json")]
    db_path: String,
    /// How long the run phase lasts before location narrowing starts. 2700 for real games, 15
    /// for dev loops.
    #[structopt(long, default_value = "2700")]
    run_duration_seconds: u64,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::from_args();
    *RUN_DURATION.write().unwrap() = Duration::from_secs(args.run_duration_seconds);

    let mut timer = Timer::new("build the game index");
    let map = Map::load(&args.osm_path, &mut timer).expect("loading the OSM extract failed");
    timer.done();
    *MAP.write().unwrap() = Some(map);

    STORE
        .lock()
        .unwrap()
        .open(&args.db_path)
        .expect("opening the store failed");

    tokio::spawn(auth::sweep_expired_sessions());

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("listening on {}", addr);
    let make_svc = make_service_fn(|_| async { Ok::<_, Infallible>(service_fn(serve_req)) });
    if let Err(err) = Server::bind(&addr).serve(make_svc).await {
        error!("server broke: {}", err);
    }
}

async fn serve_req(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let (parts, body) = req.into_parts();
    let bytes = match hyper::body::to_bytes(body).await {
        Ok(bytes) => bytes,
        Err(err) => {
            return Ok(ApiError::bad_request(anyhow::Error::from(err)).into_response());
        }
    };
    debug!("{} {}", parts.method, parts.uri.path());
    match route(&parts, &bytes).await {
        Ok(resp) => Ok(resp),
        Err(err) => Ok(err.into_response()),
    }
}

async fn route(
    parts: &hyper::http::request::Parts,
    body: &[u8],
) -> Result<Response<Body>, ApiError> {
    let path = parts.uri.path().to_string();
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    match (parts.method.as_str(), segments.as_slice()) {
        ("POST", ["register"]) => storage::writing(|db| auth::register(db, body)),
        ("POST", ["login"]) => storage::writing(|db| auth::login(db, body)),
        ("POST", ["logout"]) => storage::writing(|db| auth::logout(db, &parts.headers)),
        ("POST", ["lobby", "create"]) => {
            let user = auth::authenticate(&parts.headers)?;
            storage::with_map(|map| storage::writing(|db| lobby::create(db, map, user)))
        }
        ("POST", ["lobby", "join"]) => {
            auth::authenticate(&parts.headers)?;
            storage::reading(|db| lobby::join(db, body))
        }
        (method, ["lobby", code, rest @ ..]) => {
            let user = auth::authenticate(&parts.headers)?;
            let code = lobby::parse_code(code)?;
            scoped(method, &code, user, rest, body).await
        }
        _ => Err(ApiError::NotFound),
    }
}

async fn scoped(
    method: &str,
    code: &str,
    user: UserID,
    rest: &[&str],
    body: &[u8],
) -> Result<Response<Body>, ApiError> {
    match (method, rest) {
        ("GET", ["map"]) => storage::reading(|db| lobby::get_map(db, code)),
        ("GET", ["phase"]) => storage::reading(|db| lobby::get_phase(db, code)),
        ("GET", ["roles"]) => storage::reading(|db| lobby::get_roles(db, code)),
        ("POST", ["selectRole"]) => {
            storage::writing(|db| lobby::select_role(db, code, user, body))
        }
        ("GET", ["readiness"]) => storage::reading(|db| lobby::get_readiness(db, code)),
        ("PUT", ["readiness"]) => {
            let mut started = false;
            let resp = storage::writing(|db| {
                let (resp, now_running) = lobby::set_readiness(db, code, user, body)?;
                started = now_running;
                Ok(resp)
            })?;
            if started {
                schedule_run_timer(code.to_string());
            }
            Ok(resp)
        }
        ("PUT", ["saveLocation"]) => {
            storage::writing(|db| lobby::save_location(db, code, user, body))
        }
        ("PUT", ["saveHidingZone"]) => storage::with_map(|map| {
            storage::writing(|db| lobby::save_hiding_zone(db, map, code, user, body))
        }),
        ("GET", ["runStartTime"]) => storage::reading(|db| lobby::run_start_time(db, code)),
        ("GET", ["history"]) => storage::reading(|db| lobby::get_history(db, code)),
        ("GET", ["cardActions"]) => storage::reading(|db| cards::card_actions(db, code)),
        ("POST", ["drawCards", draw_id]) => {
            storage::writing(|db| cards::draw_cards(db, code, draw_id))
        }
        ("GET", ["draw"]) => storage::reading(|db| cards::current_draw(db, code)),
        ("POST", ["pickCards"]) => {
            storage::writing(|db| cards::pick_cards(db, code, user, body))
        }
        ("GET", ["deck"]) => storage::reading(|db| cards::deck(db, code, user)),
        ("GET", ["questions", "closeRoutes"]) => {
            storage::with_map(|map| storage::reading(|db| questions::close_routes(db, map, code)))
        }
        ("POST", ["questions", "trainService"]) => storage::with_map(|map| {
            storage::writing(|db| questions::train_service(db, map, code, body))
        }),
        ("POST", ["questions", "radar", radius]) => {
            // Geocode before taking the store for the real work; the geocoder is external and
            // can stall.
            let seeker = {
                let store = STORE.lock().unwrap();
                questions::seeker_position(&store.db, code)?
            };
            let address = geocode::address_near(seeker).await;
            storage::writing(|db| questions::radar(db, code, radius, &address))
        }
        ("POST", ["questions", "thermometer", "start"]) => {
            storage::writing(|db| questions::thermometer_start(db, code, body))
        }
        ("POST", ["questions", "thermometer", "end"]) => {
            storage::writing(|db| questions::thermometer_end(db, code))
        }
        ("POST", ["questions", "sameBezirk"]) => {
            storage::with_map(|map| storage::writing(|db| questions::same_district(db, map, code)))
        }
        ("POST", ["questions", "sameOrtsteil"]) => storage::with_map(|map| {
            storage::writing(|db| questions::same_subdistrict(db, map, code))
        }),
        ("POST", ["questions", "ortsteilLastLetter"]) => storage::with_map(|map| {
            storage::writing(|db| questions::subdistrict_last_letter(db, map, code))
        }),
        ("POST", ["questions", "closerToMcDonalds"]) => storage::with_map(|map| {
            storage::writing(|db| questions::closer_to_mcdonalds(db, map, code))
        }),
        ("POST", ["questions", "closerToIkea"]) => {
            storage::with_map(|map| storage::writing(|db| questions::closer_to_ikea(db, map, code)))
        }
        ("POST", ["questions", "closerToSpree"]) => {
            storage::with_map(|map| storage::writing(|db| questions::closer_to_spree(db, map, code)))
        }
        _ => Err(ApiError::NotFound),
    }
}

/// One-shot per lobby: when the run duration elapses, move the lobby on to location narrowing.
/// The task reloads the lobby when it fires and no-ops if the phase already advanced.
fn schedule_run_timer(code: String) {
    let duration = *RUN_DURATION.read().unwrap();
    tokio::spawn(async move {
        tokio::time::sleep(duration).await;
        let result = storage::mutate(|db| {
            lobby::fire_run_timer(db, &code);
            Ok(())
        });
        if let Err(err) = result {
            error!("run timer for {} broke: {:?}", code, err);
        }
    });
}
