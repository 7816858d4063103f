use std::sync::Arc;

use axum::{extract::Path, Extension, Json};

use super::{parse_id, with_tags};
use crate::{
    authentication::{AuthUser, MaybeUser},
    data_formats::{DataWrapper, ProfileResponse, ProfileWithNotesResponse, TagResponse},
    db_helpers::{
        follow_user_in_db, get_profile_by_id_in_db, get_tags_in_db, list_notes_by_author_in_db,
        unfollow_user_in_db,
    },
    errors::RequestError,
    AppState,
};

pub async fn get_user_profile(
    Extension(state): Extension<Arc<AppState>>,
    viewer: MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<DataWrapper<ProfileWithNotesResponse>>, RequestError> {
    let id = parse_id(&id)?;
    let viewer_id = viewer.get_id();
    let (user, is_following) = get_profile_by_id_in_db(&state.pool, viewer_id, id).await?;

    let published_only = viewer_id != Some(id);
    let notes = list_notes_by_author_in_db(&state.pool, id, published_only).await?;
    Ok(Json(DataWrapper::wrap(ProfileWithNotesResponse {
        user: ProfileResponse::new(user, is_following),
        notes: with_tags(&state.pool, notes).await?,
    })))
}

pub async fn follow_user(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DataWrapper<ProfileResponse>>, RequestError> {
    let id = parse_id(&id)?;
    let user = follow_user_in_db(&state.pool, auth.id, id).await?;
    Ok(Json(DataWrapper::wrap(ProfileResponse::new(user, true))))
}

pub async fn unfollow_user(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DataWrapper<ProfileResponse>>, RequestError> {
    let id = parse_id(&id)?;
    let user = unfollow_user_in_db(&state.pool, auth.id, id).await?;
    Ok(Json(DataWrapper::wrap(ProfileResponse::new(user, false))))
}

pub async fn list_tags(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<DataWrapper<Vec<TagResponse>>>, RequestError> {
    let tags = get_tags_in_db(&state.pool).await?;
    Ok(Json(DataWrapper::wrap(
        tags.into_iter().map(Into::into).collect(),
    )))
}
