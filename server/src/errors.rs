use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Response, StatusCode};
use serde::Serialize;

/// Everything a handler can go wrong with, mapped onto the status code the client sees. The
/// underlying cause is logged, never sent over the wire.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(anyhow::Error),
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    /// The request is well-formed, but the game isn't in a state where it can be answered yet
    /// (reading a thermometer before moving far enough).
    Precondition,
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn bad_request<E: Into<anyhow::Error>>(err: E) -> ApiError {
        ApiError::BadRequest(err.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Precondition => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self) -> Response<Body> {
        match &self {
            ApiError::BadRequest(err) => warn!("bad request: {}", err),
            ApiError::Internal(err) => error!("internal error: {}", err),
            _ => {}
        }
        empty_response(self.status())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> ApiError {
        ApiError::Internal(err)
    }
}

pub fn empty_response(status: StatusCode) -> Response<Body> {
    let mut resp = Response::new(Body::empty());
    *resp.status_mut() = status;
    resp
}

pub fn json_response<T: Serialize>(
    status: StatusCode,
    payload: &T,
) -> Result<Response<Body>, ApiError> {
    let body = serde_json::to_string(payload).map_err(|err| ApiError::Internal(err.into()))?;
    let mut resp = Response::new(Body::from(body));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(resp)
}
