//! Request decoding helpers: bearer token, JSON bodies, path ids and
//! query parameters. Every decode failure becomes an [`ApiError`].

use std::collections::HashMap;

use axum::Json;
use axum::extract::Path;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use resman_auth::Authenticated;
use resman_core::error::ResmanError;
use resman_service::ListParams;

use crate::error::ApiError;
use crate::state::AppState;

/// The token of an `Authorization: Bearer <token>` header.
pub fn bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ResmanError::unauthorized("missing bearer token"))?
        .to_str()
        .map_err(|_| ResmanError::unauthorized("malformed authorization header"))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(ResmanError::unauthorized("malformed authorization header").into()),
    }
}

impl AppState {
    /// Authenticate the caller of a request.
    pub fn caller(&self, headers: &HeaderMap) -> Result<Authenticated, ApiError> {
        Ok(self.gate.authenticate(bearer(headers)?)?)
    }
}

pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_input("body", rejection.body_text()))
}

pub fn path<T>(path: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    path.map(|Path(value)| value)
        .map_err(|rejection| ApiError::bad_input("path", rejection.body_text()))
}

fn parse_i64(params: &HashMap<String, String>, key: &str) -> Result<Option<i64>, ApiError> {
    match params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ApiError::bad_input(key, "must be an integer")),
        None => Ok(None),
    }
}

/// A required integer query parameter such as `team-id`.
pub fn required_id(params: &HashMap<String, String>, key: &str) -> Result<i64, ApiError> {
    parse_i64(params, key)?.ok_or_else(|| ApiError::bad_input(key, "is required"))
}

/// `offset`, `limit` and `filter` from the query string.
pub fn list_params(params: &HashMap<String, String>) -> Result<ListParams, ApiError> {
    Ok(ListParams {
        offset: parse_i64(params, "offset")?,
        limit: parse_i64(params, "limit")?,
        filter: params.get("filter").cloned(),
    })
}
