use std::sync::Arc;

use axum::{extract::Path, http::StatusCode, Extension, Json};

use super::parse_id;
use crate::{
    authentication::AuthUser,
    data_formats::{required, CommentRequest, CommentResponse, DataWrapper, MessageResponse},
    db_helpers::{
        add_comment_to_note_in_db, delete_comment_in_db, get_comments_for_note_in_db,
        get_note_by_id_in_db,
    },
    errors::RequestError,
    AppState, JsonResponse,
};

pub async fn list_comments(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DataWrapper<Vec<CommentResponse>>>, RequestError> {
    let id = parse_id(&id)?;
    if get_note_by_id_in_db(&state.pool, id).await?.is_none() {
        return Err(RequestError::NotFound("Travel note not found"));
    }
    let comments = get_comments_for_note_in_db(&state.pool, id).await?;
    Ok(Json(DataWrapper::wrap(
        comments.into_iter().map(Into::into).collect(),
    )))
}

pub async fn add_comment(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<JsonResponse<DataWrapper<CommentResponse>>, RequestError> {
    let id = parse_id(&id)?;
    let content = required(request.content, "Content is required")?;
    let comment = add_comment_to_note_in_db(&state.pool, auth.id, id, &content).await?;
    Ok((StatusCode::CREATED, Json(DataWrapper::wrap(comment.into()))))
}

pub async fn delete_comment(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DataWrapper<MessageResponse>>, RequestError> {
    let id = parse_id(&id)?;
    delete_comment_in_db(&state.pool, auth.id, id).await?;
    Ok(Json(DataWrapper::wrap(MessageResponse::new("Comment deleted"))))
}
