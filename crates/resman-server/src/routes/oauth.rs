//! Google login: redirect with signed state, then the code callback.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use resman_auth::IdentityProvider;
use resman_core::error::ResmanError;

use super::{ApiResult, reply};
use crate::error::ApiError;
use crate::state::AppState;

fn provider_disabled() -> ApiError {
    ResmanError::not_found("oauth provider", "google").into()
}

pub async fn google_login(State(state): State<AppState>) -> Result<Response, ApiError> {
    let google = state.google.as_ref().ok_or_else(provider_disabled)?;
    let oauth_state = state.accounts.oauth_state()?;
    let url = google.authorize_url(&oauth_state)?;
    Ok(Redirect::to(&url).into_response())
}

pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    let google = state.google.as_ref().ok_or_else(provider_disabled)?;
    let oauth_state = params
        .get("state")
        .ok_or_else(|| ApiError::bad_input("state", "is required"))?;
    let code = params
        .get("code")
        .ok_or_else(|| ApiError::bad_input("code", "is required"))?;

    state.accounts.check_oauth_state(oauth_state)?;
    let identity = google.exchange(code).await?;
    let output = state.accounts.oauth_login(identity).await?;
    reply("User logged in successfully", "auth", output)
}
