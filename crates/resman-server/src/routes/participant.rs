//! Team membership endpoints. Mutations require a team admin.

use std::collections::HashMap;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use resman_core::models::participant::CreateParticipant;
use serde::Deserialize;

use super::{ApiResult, done, reply};
use crate::extract::{json_body, list_params, path, required_id};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ParticipantPatch {
    pub team_id: i64,
    pub user_id: i64,
    pub admin: bool,
}

pub async fn add(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateParticipant>, JsonRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let input = json_body(body)?;
    state.gate.require_admin(caller, input.team_id).await?;
    let participant = state.hierarchy.add_participant(input).await?;
    reply("Participant added successfully", "participant", participant)
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let team_id = required_id(&params, "team-id")?;
    state.gate.authorize(caller, team_id).await?;
    let page = state
        .listing
        .list_participants(team_id, &list_params(&params)?)
        .await?;
    reply("Participants retrieved successfully", "participants", page)
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ParticipantPatch>, JsonRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let ParticipantPatch {
        team_id,
        user_id,
        admin,
    } = json_body(body)?;
    state.gate.require_admin(caller, team_id).await?;
    let participant = state
        .hierarchy
        .update_participant(team_id, user_id, admin)
        .await?;
    reply("Participant updated successfully", "participant", participant)
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let (user_id, team_id) = path(ids)?;
    state.gate.require_admin(caller, team_id).await?;
    state.hierarchy.remove_participant(team_id, user_id).await?;
    done("Participant removed successfully")
}
