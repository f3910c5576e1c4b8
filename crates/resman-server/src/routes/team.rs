//! Team endpoints, including join-by-name.

use std::collections::HashMap;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use resman_core::models::team::{CreateTeam, UpdateTeam};
use serde::Deserialize;

use super::{ApiResult, done, reply};
use crate::extract::{json_body, list_params, path};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TeamPatch {
    pub id: i64,
    #[serde(flatten)]
    pub patch: UpdateTeam,
}

#[derive(Debug, Deserialize)]
pub struct JoinTeam {
    pub name: String,
    pub password: String,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateTeam>, JsonRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let team = state
        .hierarchy
        .create_team(caller.user_id, json_body(body)?)
        .await?;
    reply("Team created successfully", "team", team)
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let page = state
        .listing
        .list_teams(caller.user_id, &list_params(&params)?)
        .await?;
    reply("Teams retrieved successfully", "teams", page)
}

pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    team_id: Result<Path<i64>, PathRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let team_id = path(team_id)?;
    state.gate.authorize(caller, team_id).await?;
    let team = state.hierarchy.get_team(team_id).await?;
    reply("Team retrieved successfully", "team", team)
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<TeamPatch>, JsonRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let TeamPatch { id, patch } = json_body(body)?;
    state.gate.require_admin(caller, id).await?;
    let team = state.hierarchy.update_team(id, patch).await?;
    reply("Team updated successfully", "team", team)
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    team_id: Result<Path<i64>, PathRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let team_id = path(team_id)?;
    state.gate.require_admin(caller, team_id).await?;
    state.hierarchy.delete_team(team_id).await?;
    done("Team deleted successfully")
}

pub async fn join(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<JoinTeam>, JsonRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let JoinTeam { name, password } = json_body(body)?;
    let participant = state
        .hierarchy
        .join_team_as(caller.user_id, &name, &password)
        .await?;
    reply("Joined team successfully", "team_id", participant.team_id)
}
