//! Registration, login and self-management of the caller's account.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use resman_auth::{LoginInput, RegisterInput};
use resman_core::models::user::UpdateUser;

use super::{ApiResult, done, reply};
use crate::extract::json_body;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterInput>, JsonRejection>,
) -> ApiResult {
    let user = state.accounts.register(json_body(body)?).await?;
    reply("User created successfully", "user", user)
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginInput>, JsonRejection>,
) -> ApiResult {
    let output = state.accounts.login(json_body(body)?).await?;
    reply("User logged in successfully", "auth", output)
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let caller = state.caller(&headers)?;
    let user = state.hierarchy.get_user(caller.user_id).await?;
    reply("User retrieved successfully", "user", user)
}

pub async fn update_me(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<UpdateUser>, JsonRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let user = state
        .hierarchy
        .update_user(caller.user_id, json_body(body)?)
        .await?;
    reply("User updated successfully", "user", user)
}

pub async fn delete_me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let caller = state.caller(&headers)?;
    state.hierarchy.delete_user(caller.user_id).await?;
    done("User deleted successfully")
}
