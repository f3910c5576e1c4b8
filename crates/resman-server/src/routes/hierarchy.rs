//! Project, section and resource endpoints plus the CSV import.
//!
//! Every operation resolves the owning team first and requires the
//! caller to be one of its participants.

use std::collections::HashMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use resman_core::models::project::{CreateProject, UpdateProject};
use resman_core::models::resource::{CreateResource, UpdateResource};
use resman_core::models::section::{CreateSection, UpdateSection};
use serde::Deserialize;

use super::{ApiResult, done, reply};
use crate::error::ApiError;
use crate::extract::{json_body, list_params, path, required_id};
use crate::state::AppState;

/// A patch body carrying the target id next to the patched fields.
#[derive(Debug, Deserialize)]
pub struct Patch<T> {
    pub id: i64,
    #[serde(flatten)]
    pub patch: T,
}

// -----------------------------------------------------------------------
// Projects
// -----------------------------------------------------------------------

pub async fn create_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateProject>, JsonRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let input = json_body(body)?;
    state.gate.authorize(caller, input.team_id).await?;
    let project = state.hierarchy.create_project(input).await?;
    reply("Project created successfully", "project", project)
}

pub async fn list_projects(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let team_id = required_id(&params, "team-id")?;
    state.gate.authorize(caller, team_id).await?;
    let page = state
        .listing
        .list_projects(team_id, &list_params(&params)?)
        .await?;
    reply("Projects retrieved successfully", "projects", page)
}

pub async fn get_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let id = path(id)?;
    let team_id = state.hierarchy.team_of_project(id).await?;
    state.gate.authorize(caller, team_id).await?;
    let project = state.hierarchy.get_project(id).await?;
    reply("Project retrieved successfully", "project", project)
}

pub async fn update_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Patch<UpdateProject>>, JsonRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let Patch { id, patch } = json_body(body)?;
    let team_id = state.hierarchy.team_of_project(id).await?;
    state.gate.authorize(caller, team_id).await?;
    let project = state.hierarchy.update_project(id, patch).await?;
    reply("Project updated successfully", "project", project)
}

pub async fn delete_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let id = path(id)?;
    let team_id = state.hierarchy.team_of_project(id).await?;
    state.gate.authorize(caller, team_id).await?;
    state.hierarchy.delete_project(id).await?;
    done("Project deleted successfully")
}

// -----------------------------------------------------------------------
// Sections
// -----------------------------------------------------------------------

pub async fn create_section(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateSection>, JsonRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let input = json_body(body)?;
    let team_id = state.hierarchy.team_of_project(input.project_id).await?;
    state.gate.authorize(caller, team_id).await?;
    let section = state.hierarchy.create_section(input).await?;
    reply("Section created successfully", "section", section)
}

pub async fn list_sections(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let project_id = required_id(&params, "project-id")?;
    let team_id = state.hierarchy.team_of_project(project_id).await?;
    state.gate.authorize(caller, team_id).await?;
    let page = state
        .listing
        .list_sections(project_id, &list_params(&params)?)
        .await?;
    reply("Sections retrieved successfully", "sections", page)
}

pub async fn get_section(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let id = path(id)?;
    let team_id = state.hierarchy.team_of_section(id).await?;
    state.gate.authorize(caller, team_id).await?;
    let section = state.hierarchy.get_section(id).await?;
    reply("Section retrieved successfully", "section", section)
}

pub async fn update_section(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Patch<UpdateSection>>, JsonRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let Patch { id, patch } = json_body(body)?;
    let team_id = state.hierarchy.team_of_section(id).await?;
    state.gate.authorize(caller, team_id).await?;
    let section = state.hierarchy.update_section(id, patch).await?;
    reply("Section updated successfully", "section", section)
}

pub async fn delete_section(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let id = path(id)?;
    let team_id = state.hierarchy.team_of_section(id).await?;
    state.gate.authorize(caller, team_id).await?;
    state.hierarchy.delete_section(id).await?;
    done("Section deleted successfully")
}

// -----------------------------------------------------------------------
// Resources
// -----------------------------------------------------------------------

pub async fn create_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateResource>, JsonRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let input = json_body(body)?;
    let team_id = state.hierarchy.team_of_section(input.section_id).await?;
    state.gate.authorize(caller, team_id).await?;
    let resource = state.hierarchy.create_resource(input).await?;
    reply("Resource created successfully", "resource", resource)
}

pub async fn list_resources(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let section_id = required_id(&params, "section-id")?;
    let team_id = state.hierarchy.team_of_section(section_id).await?;
    state.gate.authorize(caller, team_id).await?;
    let page = state
        .listing
        .list_resources(section_id, &list_params(&params)?)
        .await?;
    reply("Resources retrieved successfully", "resources", page)
}

pub async fn get_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let id = path(id)?;
    let team_id = state.hierarchy.team_of_resource(id).await?;
    state.gate.authorize(caller, team_id).await?;
    let resource = state.hierarchy.get_resource(id).await?;
    reply("Resource retrieved successfully", "resource", resource)
}

pub async fn update_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Patch<UpdateResource>>, JsonRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let Patch { id, patch } = json_body(body)?;
    let team_id = state.hierarchy.team_of_resource(id).await?;
    state.gate.authorize(caller, team_id).await?;
    let resource = state.hierarchy.update_resource(id, patch).await?;
    reply("Resource updated successfully", "resource", resource)
}

pub async fn delete_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let id = path(id)?;
    let team_id = state.hierarchy.team_of_resource(id).await?;
    state.gate.authorize(caller, team_id).await?;
    state.hierarchy.delete_resource(id).await?;
    done("Resource deleted successfully")
}

// -----------------------------------------------------------------------
// Bulk import
// -----------------------------------------------------------------------

pub async fn import_csv(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult {
    let caller = state.caller(&headers)?;
    let section_id = required_id(&params, "section-id")?;
    let payload = body.map_err(|rejection| ApiError::bad_input("body", rejection.body_text()))?;
    let team_id = state.hierarchy.team_of_section(section_id).await?;
    state.gate.authorize(caller, team_id).await?;
    let report = state.importer.import(section_id, &payload).await?;
    reply("CSV imported", "report", report)
}
