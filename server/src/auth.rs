use chrono::{DateTime, Duration, Utc};
use hyper::{Body, HeaderMap, Response, StatusCode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::{random_string, SALT_CHARSET};
use crate::errors::{empty_response, json_response, ApiError};
use crate::model::{Session, UserAccount, UserID};
use crate::storage::{mutate, Database};

const SESSION_LIFETIME_HOURS: i64 = 12;
const NULL_UUID: &str = "00000000-0000-0000-0000-000000000000";

#[derive(Deserialize)]
struct LoginInfo {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct SessionToken {
    token: Uuid,
    expiry: DateTime<Utc>,
}

pub fn register(db: &mut Database, body: &[u8]) -> Result<Response<Body>, ApiError> {
    let info: LoginInfo = serde_json::from_slice(body).map_err(ApiError::bad_request)?;
    if db.user_by_name(&info.username).is_some() {
        return Err(ApiError::bad_request(anyhow!(
            "duplicate username {:?}",
            info.username
        )));
    }
    let salt = random_string(16, SALT_CHARSET);
    let hash = hash_password(&salt, &info.password);
    let id = db.new_user_id();
    info!("registered {:?}", info.username);
    db.users.insert(
        id,
        UserAccount {
            id,
            name: info.username,
            pw_salt: salt,
            pw_hash: hash,
        },
    );
    Ok(empty_response(StatusCode::CREATED))
}

pub fn login(db: &mut Database, body: &[u8]) -> Result<Response<Body>, ApiError> {
    let info: LoginInfo = serde_json::from_slice(body).map_err(ApiError::bad_request)?;
    // An unknown username answers exactly like a bad password.
    let (user, salt, hash) = match db.user_by_name(&info.username) {
        Some(user) => (user.id, user.pw_salt.clone(), user.pw_hash.clone()),
        None => return Err(ApiError::Forbidden),
    };
    if hash_password(&salt, &info.password) != hash {
        return Err(ApiError::Forbidden);
    }

    let session = Session {
        token: Uuid::new_v4(),
        user,
        expiry: Utc::now() + Duration::hours(SESSION_LIFETIME_HOURS),
    };
    let payload = SessionToken {
        token: session.token,
        expiry: session.expiry,
    };
    db.sessions.insert(session.token, session);
    json_response(StatusCode::CREATED, &payload)
}

fn bearer_token(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let header = headers
        .get(hyper::header::AUTHORIZATION)
        .ok_or(ApiError::Unauthorized)?;
    let value = header.to_str().map_err(|_| ApiError::Unauthorized)?;
    let token = value.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
    if token == NULL_UUID {
        return Err(ApiError::bad_request(anyhow!("null user token")));
    }
    token.parse().map_err(|_| ApiError::Unauthorized)
}

/// Resolves the bearer token to a user. Locks the store briefly; call before taking it again.
pub fn authenticate(headers: &HeaderMap) -> Result<UserID, ApiError> {
    let token = bearer_token(headers)?;
    let store = crate::STORE.lock().unwrap();
    match store.db.sessions.get(&token) {
        Some(session) if session.expiry > Utc::now() => Ok(session.user),
        _ => {
            info!("failed to find token, unauthenticated");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Ends the caller's own session.
pub fn logout(db: &mut Database, headers: &HeaderMap) -> Result<Response<Body>, ApiError> {
    let token = bearer_token(headers)?;
    match db.sessions.remove(&token) {
        Some(session) => {
            info!("user {:?} logged out", session.user);
            Ok(empty_response(StatusCode::OK))
        }
        None => Err(ApiError::Unauthorized),
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Sessions expire on their own clock; this reaps the corpses.
pub async fn sweep_expired_sessions() {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
    loop {
        interval.tick().await;
        let result = mutate(|db| {
            let now = Utc::now();
            let before = db.sessions.len();
            db.sessions.retain(|_, session| session.expiry > now);
            let swept = before - db.sessions.len();
            if swept > 0 {
                info!("swept {} expired sessions", swept);
            }
            Ok(())
        });
        if let Err(err) = result {
            error!("session sweep broke: {:?}", err);
        }
    }
}
