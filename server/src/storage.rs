use std::collections::BTreeMap;

use anyhow::Result;
use hyper::{Body, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use map_model::Map;

use crate::errors::ApiError;
use crate::model::{Lobby, Session, UserAccount, UserID};

/// Everything durable. The whole database serializes to one JSON file after every mutation; at
/// this scale (two players per lobby) that's plenty, and it keeps the read-modify-write cycle
/// trivially serialized behind the store lock.
#[derive(Default, Serialize, Deserialize)]
pub struct Database {
    pub users: BTreeMap<UserID, UserAccount>,
    pub sessions: BTreeMap<Uuid, Session>,
    pub lobbies: BTreeMap<String, Lobby>,
    next_user_id: u64,
    next_draw_id: u64,
}

impl Database {
    pub fn new_user_id(&mut self) -> UserID {
        self.next_user_id += 1;
        UserID(self.next_user_id)
    }

    pub fn new_draw_id(&mut self) -> u64 {
        self.next_draw_id += 1;
        self.next_draw_id
    }

    pub fn user_by_name(&self, name: &str) -> Option<&UserAccount> {
        self.users.values().find(|user| user.name == name)
    }

    pub fn lobby(&self, code: &str) -> Result<&Lobby, ApiError> {
        self.lobbies.get(code).ok_or(ApiError::NotFound)
    }

    pub fn lobby_mut(&mut self, code: &str) -> Result<&mut Lobby, ApiError> {
        self.lobbies.get_mut(code).ok_or(ApiError::NotFound)
    }
}

pub struct Store {
    pub db: Database,
    path: Option<String>,
}

impl Store {
    pub fn empty() -> Store {
        Store {
            db: Database::default(),
            path: None,
        }
    }

    /// Points the store at its backing file, loading existing contents when present.
    pub fn open(&mut self, path: &str) -> Result<()> {
        if let Ok(bytes) = fs_err::read(path) {
            self.db = serde_json::from_slice(&bytes)?;
            info!(
                "loaded {} users, {} sessions, {} lobbies from {}",
                self.db.users.len(),
                self.db.sessions.len(),
                self.db.lobbies.len(),
                path
            );
        }
        self.path = Some(path.to_string());
        Ok(())
    }

    /// Writes the whole database out.
    pub fn persist(&self) -> Result<(), ApiError> {
        if let Some(path) = &self.path {
            let json =
                serde_json::to_string(&self.db).map_err(|err| ApiError::Internal(err.into()))?;
            fs_err::write(path, json).map_err(|err| ApiError::Internal(err.into()))?;
        }
        Ok(())
    }
}

/// Runs a read-only handler under the store lock.
pub fn reading<F>(f: F) -> Result<Response<Body>, ApiError>
where
    F: FnOnce(&Database) -> Result<Response<Body>, ApiError>,
{
    let store = crate::STORE.lock().unwrap();
    f(&store.db)
}

/// Runs a mutating handler under the store lock, persisting afterwards. Nothing here ever holds
/// the lock across an await, so concurrent requests on one lobby serialize cleanly.
pub fn writing<F>(f: F) -> Result<Response<Body>, ApiError>
where
    F: FnOnce(&mut Database) -> Result<Response<Body>, ApiError>,
{
    let mut store = crate::STORE.lock().unwrap();
    let resp = f(&mut store.db)?;
    store.persist()?;
    Ok(resp)
}

/// Like `writing`, for work that doesn't produce a response (background tasks).
pub fn mutate<F>(f: F) -> Result<(), ApiError>
where
    F: FnOnce(&mut Database) -> Result<(), ApiError>,
{
    let mut store = crate::STORE.lock().unwrap();
    f(&mut store.db)?;
    store.persist()
}

/// The index is loaded once before the server starts listening, then never written again.
pub fn with_map<R>(f: impl FnOnce(&Map) -> Result<R, ApiError>) -> Result<R, ApiError> {
    let guard = crate::MAP.read().unwrap();
    let map = guard.as_ref().expect("the OSM index isn't loaded yet");
    f(map)
}
