use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use super::{parse_id, single_with_tags, with_tags};
use crate::{
    authentication::AuthUser,
    data_formats::{
        optional_non_blank, required, CreateTagRequest, DataWrapper, NoteQueryParams,
        NoteResponse, PagedWrapper, ReasonRequest, ReportQueryParams, ReportResponse,
        ReviewLogResponse, RoleRequest, SortOrder, TagResponse, UserResponse,
    },
    db_helpers::{
        create_tag_in_db, list_notes_in_db, list_reports_in_db, list_review_logs_in_db,
        review_note_in_db, set_user_role_in_db, REPORT_STATUSES,
    },
    errors::RequestError,
    models::{ReviewAction, Role},
    AppState, JsonResponse,
};

// ----------------- Review -----------------
pub async fn moderation_queue(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Query(params): Query<NoteQueryParams>,
) -> Result<Json<PagedWrapper<NoteResponse>>, RequestError> {
    auth.require_reviewer()?;
    let filter = params.into_filter("pending", SortOrder::OldestFirst)?;
    let (notes, total) = list_notes_in_db(&state.pool, &filter).await?;
    Ok(Json(PagedWrapper {
        data: with_tags(&state.pool, notes).await?,
        total,
        page: filter.page,
        limit: filter.limit,
    }))
}

pub async fn approve_note(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DataWrapper<NoteResponse>>, RequestError> {
    auth.require_reviewer()?;
    let id = parse_id(&id)?;
    let note = review_note_in_db(&state.pool, id, auth.id, ReviewAction::Approve, None).await?;
    info!(note_id = id, reviewer_id = auth.id, "note approved");
    Ok(Json(DataWrapper::wrap(
        single_with_tags(&state.pool, note).await?,
    )))
}

pub async fn reject_note(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    payload: Option<Json<ReasonRequest>>,
) -> Result<Json<DataWrapper<NoteResponse>>, RequestError> {
    auth.require_reviewer()?;
    let id = parse_id(&id)?;
    let reason = payload.and_then(|Json(request)| request.reason);
    let reason = required(reason, "A rejection reason is required")?;
    let note = review_note_in_db(
        &state.pool,
        id,
        auth.id,
        ReviewAction::Reject,
        Some(&reason),
    )
    .await?;
    info!(note_id = id, reviewer_id = auth.id, %reason, "note rejected");
    Ok(Json(DataWrapper::wrap(
        single_with_tags(&state.pool, note).await?,
    )))
}

pub async fn list_review_logs(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DataWrapper<Vec<ReviewLogResponse>>>, RequestError> {
    auth.require_reviewer()?;
    let id = parse_id(&id)?;
    let logs = list_review_logs_in_db(&state.pool, id).await?;
    Ok(Json(DataWrapper::wrap(
        logs.into_iter().map(Into::into).collect(),
    )))
}

// ----------------- Administration -----------------
pub async fn set_user_role(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<RoleRequest>,
) -> Result<Json<DataWrapper<UserResponse>>, RequestError> {
    auth.require_admin()?;
    let id = parse_id(&id)?;
    let role: Role = required(request.role, "Role is required")?
        .to_lowercase()
        .parse()?;
    let user = set_user_role_in_db(&state.pool, id, role).await?;
    info!(user_id = id, admin_id = auth.id, %role, "role changed");
    Ok(Json(DataWrapper::wrap(user.into())))
}

pub async fn create_tag(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Json(request): Json<CreateTagRequest>,
) -> Result<JsonResponse<DataWrapper<TagResponse>>, RequestError> {
    auth.require_admin()?;
    let name = required(request.name, "Tag name is required")?;
    let tag = create_tag_in_db(
        &state.pool,
        &name,
        optional_non_blank(request.image, "Image must not be empty")?,
        optional_non_blank(request.suggestion, "Suggestion must not be empty")?,
        optional_non_blank(request.url, "Url must not be empty")?,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataWrapper::wrap(tag.into()))))
}

pub async fn list_reports(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Query(params): Query<ReportQueryParams>,
) -> Result<Json<DataWrapper<Vec<ReportResponse>>>, RequestError> {
    auth.require_admin()?;
    let status = params
        .status
        .map(|status| status.trim().to_lowercase())
        .filter(|status| !status.is_empty());
    if let Some(status) = &status {
        if !REPORT_STATUSES.contains(&status.as_str()) {
            return Err(RequestError::BadRequest("Invalid status"));
        }
    }
    let reports = list_reports_in_db(&state.pool, status.as_deref()).await?;
    Ok(Json(DataWrapper::wrap(
        reports.into_iter().map(Into::into).collect(),
    )))
}
