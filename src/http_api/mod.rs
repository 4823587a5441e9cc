use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::{
    ClearanceGate, ItemId, Milestone, MilestoneFields, MilestoneId, MilestoneStatus,
    PermissionDenied, PermissionSnapshot, ProjectId, ProjectMetadata, ProjectSchedule,
    ResolvedMilestone, ScheduleBackend, ScheduleSummary, StoreError, ValidationError,
    VisibilityLevel, permissions::Action,
};

pub type SharedBackend = Arc<dyn ScheduleBackend + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    backend: SharedBackend,
    permissions: PermissionSnapshot,
}

impl AppState {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            permissions: PermissionSnapshot::full(),
        }
    }

    pub fn with_permissions(mut self, permissions: PermissionSnapshot) -> Self {
        self.permissions = permissions;
        self
    }

    fn backend(&self) -> &(dyn ScheduleBackend + Send + Sync) {
        self.backend.as_ref()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Forbidden(String),
    Invalid(String),
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { .. } => ApiError::NotFound(value.to_string()),
            StoreError::InvalidData(message) => ApiError::Invalid(message),
            other => {
                error!("backend failure: {other}");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        ApiError::Invalid(value.to_string())
    }
}

impl From<PermissionDenied> for ApiError {
    fn from(value: PermissionDenied) -> Self {
        ApiError::Forbidden(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, "forbidden", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ViewerQuery {
    clearance: Option<VisibilityLevel>,
}

impl ViewerQuery {
    fn gate(&self) -> ClearanceGate {
        ClearanceGate::new(self.clearance.unwrap_or(VisibilityLevel::Management))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMilestonePayload {
    #[serde(flatten)]
    pub fields: MilestoneFields,
    pub created_by: String,
    #[serde(default)]
    pub linked_item_ids: Vec<ItemId>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMilestonePayload {
    #[serde(flatten)]
    pub fields: MilestoneFields,
    #[serde(default)]
    pub linked_item_ids: Vec<ItemId>,
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    status: MilestoneStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinksPayload {
    pub item_ids: Vec<ItemId>,
}

#[derive(Debug, Deserialize)]
struct VisibilityPayload {
    level: VisibilityLevel,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/projects/:project_id", get(get_project).put(update_project))
        .route(
            "/projects/:project_id/milestones",
            get(list_milestones).post(create_milestone),
        )
        .route("/projects/:project_id/summary", get(get_summary))
        .route(
            "/milestones/:milestone_id",
            put(update_milestone).delete(delete_milestone),
        )
        .route("/milestones/:milestone_id/status", put(set_status))
        .route(
            "/milestones/:milestone_id/links",
            get(get_links).put(replace_links),
        )
        .route("/milestones/:milestone_id/visibility", put(set_visibility))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, backend: SharedBackend) -> std::io::Result<()> {
    let app = router(AppState::new(backend));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<ProjectMetadata>, ApiError> {
    match state.backend().load_project(project_id)? {
        Some(metadata) => Ok(Json(metadata)),
        None => Err(ApiError::NotFound(format!("project {project_id} not found"))),
    }
}

async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Json(metadata): Json<ProjectMetadata>,
) -> Result<Json<ProjectMetadata>, ApiError> {
    state.permissions.check(Action::Edit)?;
    if let (Some(start), Some(end)) = (metadata.project_start_date, metadata.target_end_date) {
        if start > end {
            return Err(ApiError::Invalid(format!(
                "project start date {start} must be on or before target end date {end}"
            )));
        }
    }
    state.backend().save_project(project_id, &metadata)?;
    Ok(Json(metadata))
}

async fn list_milestones(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Query(viewer): Query<ViewerQuery>,
) -> Result<Json<Vec<ResolvedMilestone>>, ApiError> {
    let schedule = ProjectSchedule::load(state.backend(), project_id, &viewer.gate())?;
    Ok(Json(schedule.milestones().to_vec()))
}

async fn get_summary(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Query(viewer): Query<ViewerQuery>,
) -> Result<Json<ScheduleSummary>, ApiError> {
    let schedule = ProjectSchedule::load(state.backend(), project_id, &viewer.gate())?;
    Ok(Json(schedule.summary(Local::now().date_naive())))
}

async fn create_milestone(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<CreateMilestonePayload>,
) -> Result<(StatusCode, Json<Milestone>), ApiError> {
    state.permissions.check(Action::Create)?;
    payload.fields.validate()?;
    let backend = state.backend();
    let milestone =
        backend.create_milestone(project_id, &payload.fields, payload.created_by.trim())?;
    backend.replace_milestone_links(milestone.id, &payload.linked_item_ids)?;
    info!(project_id, milestone_id = milestone.id, "milestone created");
    Ok((StatusCode::CREATED, Json(milestone)))
}

async fn update_milestone(
    State(state): State<AppState>,
    Path(milestone_id): Path<MilestoneId>,
    Json(payload): Json<UpdateMilestonePayload>,
) -> Result<Json<Milestone>, ApiError> {
    state.permissions.check(Action::Edit)?;
    payload.fields.validate()?;
    let backend = state.backend();
    let milestone = backend.update_milestone(milestone_id, &payload.fields)?;
    backend.replace_milestone_links(milestone_id, &payload.linked_item_ids)?;
    Ok(Json(milestone))
}

async fn delete_milestone(
    State(state): State<AppState>,
    Path(milestone_id): Path<MilestoneId>,
) -> Result<StatusCode, ApiError> {
    state.permissions.check(Action::Delete)?;
    state.backend().delete_milestone(milestone_id)?;
    info!(milestone_id, "milestone deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn set_status(
    State(state): State<AppState>,
    Path(milestone_id): Path<MilestoneId>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<Milestone>, ApiError> {
    state.permissions.check(Action::Edit)?;
    let milestone = state
        .backend()
        .set_milestone_status(milestone_id, payload.status)?;
    Ok(Json(milestone))
}

async fn get_links(
    State(state): State<AppState>,
    Path(milestone_id): Path<MilestoneId>,
) -> Result<Json<LinksPayload>, ApiError> {
    let item_ids = state.backend().list_milestone_links(milestone_id)?;
    Ok(Json(LinksPayload { item_ids }))
}

async fn replace_links(
    State(state): State<AppState>,
    Path(milestone_id): Path<MilestoneId>,
    Json(payload): Json<LinksPayload>,
) -> Result<Json<LinksPayload>, ApiError> {
    state.permissions.check(Action::Edit)?;
    let backend = state.backend();
    backend.replace_milestone_links(milestone_id, &payload.item_ids)?;
    let item_ids = backend.list_milestone_links(milestone_id)?;
    Ok(Json(LinksPayload { item_ids }))
}

async fn set_visibility(
    State(state): State<AppState>,
    Path(milestone_id): Path<MilestoneId>,
    Json(payload): Json<VisibilityPayload>,
) -> Result<StatusCode, ApiError> {
    state.permissions.check(Action::Edit)?;
    state.backend().set_visibility(milestone_id, payload.level)?;
    Ok(StatusCode::NO_CONTENT)
}
