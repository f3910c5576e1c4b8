//! HTTP routes.

mod account;
mod hierarchy;
mod oauth;
mod participant;
mod team;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::rate_limit::rate_limit_middleware;
use crate::state::AppState;

pub(crate) type ApiResult = Result<Json<Value>, ApiError>;

/// `{"message": ..., "<key>": value}`
pub(crate) fn reply<T: Serialize>(message: &str, key: &str, value: T) -> ApiResult {
    let value = serde_json::to_value(value)
        .map_err(|e| ApiError(resman_core::ResmanError::Internal(e.to_string())))?;
    let mut body = json!({ "message": message });
    body[key] = value;
    Ok(Json(body))
}

pub(crate) fn done(message: &str) -> ApiResult {
    Ok(Json(json!({ "message": message })))
}

async fn banner() -> &'static str {
    "Resources Manager"
}

async fn cors_middleware(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let origin = req
        .headers()
        .get("origin")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let allowed = match (&origin, &state.allowed_origin) {
        (Some(origin), Some(allowed)) if origin == allowed => HeaderValue::from_str(origin).ok(),
        _ => None,
    };

    let mut resp = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };
    if let Some(origin) = allowed {
        let headers = resp.headers_mut();
        headers.insert("access-control-allow-origin", origin);
        headers.insert(
            "access-control-allow-methods",
            HeaderValue::from_static("GET,POST,PATCH,DELETE,OPTIONS"),
        );
        headers.insert(
            "access-control-allow-headers",
            HeaderValue::from_static("authorization,content-type"),
        );
    }
    resp
}

/// Build the full router over `state`.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(banner))
        .route(
            "/user",
            post(account::register)
                .get(account::me)
                .patch(account::update_me)
                .delete(account::delete_me),
        )
        .route("/login-user", post(account::login))
        .route(
            "/team",
            post(team::create).get(team::list).patch(team::update),
        )
        .route("/team/:team_id", get(team::get).delete(team::remove))
        .route("/join-team", post(team::join))
        .route(
            "/project",
            post(hierarchy::create_project)
                .get(hierarchy::list_projects)
                .patch(hierarchy::update_project),
        )
        .route(
            "/project/:project_id",
            get(hierarchy::get_project).delete(hierarchy::delete_project),
        )
        .route(
            "/section",
            post(hierarchy::create_section)
                .get(hierarchy::list_sections)
                .patch(hierarchy::update_section),
        )
        .route(
            "/section/:section_id",
            get(hierarchy::get_section).delete(hierarchy::delete_section),
        )
        .route(
            "/resource",
            post(hierarchy::create_resource)
                .get(hierarchy::list_resources)
                .patch(hierarchy::update_resource),
        )
        .route(
            "/resource/:resource_id",
            get(hierarchy::get_resource).delete(hierarchy::delete_resource),
        )
        .route("/csv", post(hierarchy::import_csv))
        .route(
            "/participant",
            post(participant::add)
                .get(participant::list)
                .patch(participant::update),
        )
        .route("/participant/:user_id/:team_id", delete(participant::remove))
        .route("/auth/google_login", get(oauth::google_login))
        .route("/auth/google_callback", get(oauth::google_callback))
        .layer(from_fn_with_state(state.clone(), cors_middleware))
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}
