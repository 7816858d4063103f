use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use super::{parse_id, single_with_tags, with_tags};
use crate::{
    authentication::{AuthUser, MaybeUser},
    data_formats::{
        optional_non_blank, required, CreateNoteRequest, DataWrapper, FavoriteResponse,
        LikeResponse, MessageResponse, NoteDetailResponse, NoteQueryParams, NoteResponse,
        PagedWrapper, ReasonRequest, ReportResponse, SortOrder, UpdateNoteRequest,
    },
    db_helpers::{
        add_reaction_in_db, count_reactions_in_db, create_note_in_db, create_report_in_db,
        get_comments_for_note_in_db, has_reaction_in_db, list_notes_in_db, remove_reaction_in_db,
        soft_delete_note_in_db, update_note_in_db, view_note_in_db, NewNote, NoteChanges,
        Reaction,
    },
    errors::RequestError,
    AppState, JsonResponse,
};

// ----------------- Notes -----------------
pub async fn list_travel_notes(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<NoteQueryParams>,
) -> Result<Json<PagedWrapper<NoteResponse>>, RequestError> {
    let filter = params.into_filter("all", SortOrder::NewestFirst)?;
    let (notes, total) = list_notes_in_db(&state.pool, &filter).await?;
    Ok(Json(PagedWrapper {
        data: with_tags(&state.pool, notes).await?,
        total,
        page: filter.page,
        limit: filter.limit,
    }))
}

pub async fn create_travel_note(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Json(request): Json<CreateNoteRequest>,
) -> Result<JsonResponse<DataWrapper<NoteResponse>>, RequestError> {
    let note = NewNote {
        title: required(request.title, "Title is required")?,
        content: required(request.content, "Content is required")?,
        location: request.location,
        images: request.images,
        video: request.video,
        tags: request.tags,
        is_public: request.is_public.unwrap_or(true),
    };
    let note = create_note_in_db(&state.pool, auth.id, note).await?;
    let note = single_with_tags(&state.pool, note).await?;
    Ok((StatusCode::CREATED, Json(DataWrapper::wrap(note))))
}

pub async fn get_travel_note(
    Extension(state): Extension<Arc<AppState>>,
    viewer: MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<DataWrapper<NoteDetailResponse>>, RequestError> {
    let id = parse_id(&id)?;
    let mut note = view_note_in_db(&state.pool, id).await?;
    note.favorite_count = count_reactions_in_db(&state.pool, Reaction::Favorite, id).await?;

    let comments = get_comments_for_note_in_db(&state.pool, id).await?;
    let (liked, favorited) = match viewer.get_id() {
        Some(user_id) => (
            has_reaction_in_db(&state.pool, Reaction::Like, user_id, id).await?,
            has_reaction_in_db(&state.pool, Reaction::Favorite, user_id, id).await?,
        ),
        None => (false, false),
    };

    Ok(Json(DataWrapper::wrap(NoteDetailResponse {
        note: single_with_tags(&state.pool, note).await?,
        liked,
        favorited,
        comments: comments.into_iter().map(Into::into).collect(),
    })))
}

pub async fn update_travel_note(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateNoteRequest>,
) -> Result<Json<DataWrapper<NoteResponse>>, RequestError> {
    let id = parse_id(&id)?;
    let changes = NoteChanges {
        title: optional_non_blank(request.title, "Title must not be empty")?,
        content: optional_non_blank(request.content, "Content must not be empty")?,
        location: request.location,
        images: request.images,
        video: request.video,
        tags: request.tags,
        is_public: request.is_public,
    };
    let note = update_note_in_db(&state.pool, id, auth.id, changes).await?;
    let note = single_with_tags(&state.pool, note).await?;
    Ok(Json(DataWrapper::wrap(note)))
}

pub async fn delete_travel_note(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DataWrapper<MessageResponse>>, RequestError> {
    let id = parse_id(&id)?;
    let moderated = soft_delete_note_in_db(&state.pool, id, auth.id, auth.role).await?;
    if moderated {
        info!(note_id = id, admin_id = auth.id, "note deleted by administrator");
    }
    Ok(Json(DataWrapper::wrap(MessageResponse::new(
        "Travel note deleted",
    ))))
}

// ----------------- Likes -----------------
pub async fn like_note(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DataWrapper<LikeResponse>>, RequestError> {
    let id = parse_id(&id)?;
    let likes_count = add_reaction_in_db(&state.pool, Reaction::Like, auth.id, id).await?;
    Ok(Json(DataWrapper::wrap(LikeResponse {
        liked: true,
        likes_count: Some(likes_count),
    })))
}

pub async fn unlike_note(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DataWrapper<LikeResponse>>, RequestError> {
    let id = parse_id(&id)?;
    let likes_count = remove_reaction_in_db(&state.pool, Reaction::Like, auth.id, id).await?;
    Ok(Json(DataWrapper::wrap(LikeResponse {
        liked: false,
        likes_count: Some(likes_count),
    })))
}

pub async fn check_like(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DataWrapper<LikeResponse>>, RequestError> {
    let id = parse_id(&id)?;
    let liked = has_reaction_in_db(&state.pool, Reaction::Like, auth.id, id).await?;
    Ok(Json(DataWrapper::wrap(LikeResponse {
        liked,
        likes_count: None,
    })))
}

// ----------------- Favorites -----------------
pub async fn favorite_note(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DataWrapper<FavoriteResponse>>, RequestError> {
    let id = parse_id(&id)?;
    let favorite_count =
        add_reaction_in_db(&state.pool, Reaction::Favorite, auth.id, id).await?;
    Ok(Json(DataWrapper::wrap(FavoriteResponse {
        favorited: true,
        favorite_count: Some(favorite_count),
    })))
}

pub async fn unfavorite_note(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DataWrapper<FavoriteResponse>>, RequestError> {
    let id = parse_id(&id)?;
    let favorite_count =
        remove_reaction_in_db(&state.pool, Reaction::Favorite, auth.id, id).await?;
    Ok(Json(DataWrapper::wrap(FavoriteResponse {
        favorited: false,
        favorite_count: Some(favorite_count),
    })))
}

pub async fn check_favorite(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DataWrapper<FavoriteResponse>>, RequestError> {
    let id = parse_id(&id)?;
    let favorited = has_reaction_in_db(&state.pool, Reaction::Favorite, auth.id, id).await?;
    Ok(Json(DataWrapper::wrap(FavoriteResponse {
        favorited,
        favorite_count: None,
    })))
}

// ----------------- Reports -----------------
pub async fn report_note(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    payload: Option<Json<ReasonRequest>>,
) -> Result<JsonResponse<DataWrapper<ReportResponse>>, RequestError> {
    let id = parse_id(&id)?;
    let reason = payload.and_then(|Json(request)| request.reason);
    let reason = required(reason, "Reason is required")?;
    let report = create_report_in_db(&state.pool, auth.id, id, &reason).await?;
    info!(note_id = id, reporter_id = auth.id, "note reported");
    Ok((StatusCode::CREATED, Json(DataWrapper::wrap(report.into()))))
}
