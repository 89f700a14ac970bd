//! Session handlers for the REST API.

use std::collections::BTreeSet;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use skillcheck_core::repository::SortOrder;
use skillcheck_core::repository::session::SessionFilter;
use skillcheck_types::session::{
    Baseline, CreateSessionRequest, PersonId, SaveRequest, Session, SessionId, SessionStatus,
    SessionSummary, SkillId,
};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for the session list endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct SessionListQuery {
    /// Filter by status (draft, complete, discard).
    pub status: Option<String>,
    /// Filter by team.
    pub team_id: Option<String>,
    /// Sort order on session date (asc, desc).
    #[serde(default = "default_order")]
    pub order: String,
    /// Maximum results.
    pub limit: Option<i64>,
    /// Offset for pagination.
    pub offset: Option<i64>,
}

fn default_order() -> String {
    "desc".to_string()
}

/// Body of `PUT /sessions/{id}/assessees`.
#[derive(Debug, Deserialize)]
pub struct AssesseesBody {
    pub assessee_ids: BTreeSet<PersonId>,
}

/// Body of `PUT /sessions/{id}/skills`.
#[derive(Debug, Deserialize)]
pub struct SkillsBody {
    pub skill_ids: BTreeSet<SkillId>,
}

fn parse_id(raw: &str) -> Result<SessionId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("invalid session id '{raw}'")))
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn request_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// POST /api/v1/sessions - Create a draft session.
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<ApiResponse<Session>, AppError> {
    let start = Instant::now();
    let session = state.session_service.create_session(body).await?;
    let self_link = format!("/api/v1/sessions/{}", session.id);
    let baseline_link = format!("{self_link}/baseline");

    Ok(ApiResponse::success(session, request_id(), elapsed_ms(start))
        .with_link("self", &self_link)
        .with_link("baseline", &baseline_link))
}

/// GET /api/v1/sessions - List sessions with filtering.
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionListQuery>,
) -> Result<ApiResponse<Vec<Session>>, AppError> {
    let start = Instant::now();

    let status = match &query.status {
        Some(s) => Some(s.parse::<SessionStatus>().map_err(AppError::Validation)?),
        None => None,
    };
    let sort_order = match query.order.to_lowercase().as_str() {
        "asc" => SortOrder::Asc,
        _ => SortOrder::Desc,
    };

    let filter = SessionFilter {
        status,
        team_id: query.team_id,
        sort_order: Some(sort_order),
        limit: query.limit,
        offset: query.offset,
    };
    let sessions = state.session_service.list_sessions(Some(filter)).await?;

    Ok(ApiResponse::success(sessions, request_id(), elapsed_ms(start))
        .with_link("self", "/api/v1/sessions"))
}

/// GET /api/v1/sessions/{id} - Get one session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Session>, AppError> {
    let start = Instant::now();
    let id = parse_id(&id)?;
    let session = state.session_service.get_session(&id).await?;

    Ok(ApiResponse::success(session, request_id(), elapsed_ms(start))
        .with_link("self", &format!("/api/v1/sessions/{id}"))
        .with_link("summary", &format!("/api/v1/sessions/{id}/summary")))
}

/// DELETE /api/v1/sessions/{id} - Delete a session permanently.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let start = Instant::now();
    let id = parse_id(&id)?;
    state.session_service.delete_session(&id).await?;

    let data = serde_json::json!({ "deleted": true, "id": id });
    Ok(ApiResponse::success(data, request_id(), elapsed_ms(start)))
}

/// GET /api/v1/sessions/{id}/baseline - Last-persisted state for hydration.
pub async fn get_baseline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Baseline>, AppError> {
    let start = Instant::now();
    let id = parse_id(&id)?;
    let baseline = state.session_service.get_baseline(&id).await?;

    Ok(ApiResponse::success(baseline, request_id(), elapsed_ms(start))
        .with_link("diffs", &format!("/api/v1/sessions/{id}/diffs")))
}

/// POST /api/v1/sessions/{id}/diffs - Apply a batch of diffs, all or nothing.
pub async fn save_diffs(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SaveRequest>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let start = Instant::now();
    let id = parse_id(&id)?;
    if body.session_id != id {
        return Err(AppError::Validation(format!(
            "body targets session {} but path is {id}",
            body.session_id
        )));
    }

    state.session_service.apply_diffs(&body).await?;

    let data = serde_json::json!({ "session_id": id, "applied": body.diffs.len() });
    Ok(ApiResponse::success(data, request_id(), elapsed_ms(start))
        .with_link("baseline", &format!("/api/v1/sessions/{id}/baseline")))
}

/// PUT /api/v1/sessions/{id}/assessees - Replace the assessee set.
pub async fn set_assessees(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AssesseesBody>,
) -> Result<ApiResponse<BTreeSet<PersonId>>, AppError> {
    let start = Instant::now();
    let id = parse_id(&id)?;
    state
        .session_service
        .replace_assessees(&id, &body.assessee_ids)
        .await?;

    Ok(ApiResponse::success(
        body.assessee_ids,
        request_id(),
        elapsed_ms(start),
    ))
}

/// PUT /api/v1/sessions/{id}/skills - Replace the skill set.
pub async fn set_skills(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SkillsBody>,
) -> Result<ApiResponse<BTreeSet<SkillId>>, AppError> {
    let start = Instant::now();
    let id = parse_id(&id)?;
    state
        .session_service
        .replace_skills(&id, &body.skill_ids)
        .await?;

    Ok(ApiResponse::success(
        body.skill_ids,
        request_id(),
        elapsed_ms(start),
    ))
}

/// GET /api/v1/sessions/{id}/summary - Aggregated latest results.
pub async fn get_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<SessionSummary>, AppError> {
    let start = Instant::now();
    let id = parse_id(&id)?;
    let summary = state.session_service.summarize(&id).await?;

    Ok(ApiResponse::success(summary, request_id(), elapsed_ms(start)))
}
