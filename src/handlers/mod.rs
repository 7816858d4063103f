use axum::http::{StatusCode, Uri};
use sqlx::SqlitePool;

use crate::{
    data_formats::NoteResponse, db_helpers::get_tags_for_notes_in_db, errors::RequestError,
    models::TravelNote,
};

mod admin_handlers;
mod auth_handlers;
mod comment_handlers;
mod note_handlers;
mod profile_handlers;
mod statistics_handlers;

pub use admin_handlers::*;
pub use auth_handlers::*;
pub use comment_handlers::*;
pub use note_handlers::*;
pub use profile_handlers::*;
pub use statistics_handlers::*;

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> (StatusCode, String) {
    (
        StatusCode::NOT_FOUND,
        format!("URL {} provided was not found", uri),
    )
}

/// Path ids are positive integers; anything else is a malformed request
/// rather than a missing entity.
fn parse_id(raw: &str) -> Result<i64, RequestError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(RequestError::BadRequest("Invalid id")),
    }
}

/// Attaches tags to a page of notes with one extra query.
async fn with_tags(
    pool: &SqlitePool,
    notes: Vec<TravelNote>,
) -> Result<Vec<NoteResponse>, RequestError> {
    let ids: Vec<i64> = notes.iter().map(|note| note.id).collect();
    let mut tags = get_tags_for_notes_in_db(pool, &ids).await?;
    Ok(notes
        .into_iter()
        .map(|note| {
            let note_tags = tags.remove(&note.id).unwrap_or_default();
            NoteResponse::new(note, note_tags)
        })
        .collect())
}

async fn single_with_tags(
    pool: &SqlitePool,
    note: TravelNote,
) -> Result<NoteResponse, RequestError> {
    let mut notes = with_tags(pool, vec![note]).await?;
    notes.pop().ok_or(RequestError::ServerError)
}
