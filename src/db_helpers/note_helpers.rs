use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};

use crate::data_formats::{NoteFilter, SortOrder};
use crate::errors::RequestError;
use crate::models::{NoteStatus, ReviewAction, Role, TravelNote};

use super::review_helpers::insert_review_log;
use super::{like_pattern, push_in};

const NOTE_QUERY: &str = r#"
    SELECT travel_notes.id               AS id,
           travel_notes.author_id        AS author_id,
           travel_notes.title            AS title,
           travel_notes.content          AS content,
           travel_notes.location         AS location,
           travel_notes.images           AS images,
           travel_notes.video            AS video,
           travel_notes.status           AS status,
           travel_notes.rejection_reason AS rejection_reason,
           travel_notes.likes_count      AS likes_count,
           travel_notes.favorite_count   AS favorite_count,
           travel_notes.comment_count    AS comment_count,
           travel_notes.views            AS views,
           travel_notes.is_public        AS is_public,
           travel_notes.created_at       AS created_at,
           travel_notes.updated_at       AS updated_at,
           users.nickname                AS author_nickname,
           users.avatar                  AS author_avatar
    FROM   travel_notes
           JOIN users
             ON users.id = travel_notes.author_id
"#;

/// A validated note ready for insertion.
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub location: Option<String>,
    pub images: Vec<String>,
    pub video: Option<String>,
    pub tags: Vec<i64>,
    pub is_public: bool,
}

/// Fields an author edit may change; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub location: Option<String>,
    pub images: Option<Vec<String>>,
    pub video: Option<String>,
    pub tags: Option<Vec<i64>>,
    pub is_public: Option<bool>,
}

fn images_to_json(images: &[String]) -> Result<String, RequestError> {
    serde_json::to_string(images).map_err(|e| RequestError::Internal(e.into()))
}

/// Appends the WHERE clause of a listing. Called once per query since a
/// built query takes the builder's arguments.
fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &NoteFilter) {
    builder.push(" WHERE travel_notes.is_deleted = 0 AND ");
    push_in(
        builder,
        "travel_notes.status",
        filter
            .statuses
            .iter()
            .map(|status| status.as_str().to_string()),
    );
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        builder.push(" AND (");
        let mut columns = builder.separated(" OR ");
        for column in [
            "travel_notes.title",
            "travel_notes.content",
            "travel_notes.location",
            "users.nickname",
        ] {
            columns
                .push(format_args!("{column} LIKE "))
                .push_bind_unseparated(pattern.clone())
                .push_unseparated(r" ESCAPE '\'");
        }
        columns.push_unseparated(")");
    }
}

/// One page of live notes matching `filter`, plus the total match count.
pub async fn list_notes_in_db(
    pool: &SqlitePool,
    filter: &NoteFilter,
) -> Result<(Vec<TravelNote>, i64), RequestError> {
    let mut count = QueryBuilder::<Sqlite>::new(
        "SELECT COUNT(*) FROM travel_notes JOIN users ON users.id = travel_notes.author_id",
    );
    push_filter(&mut count, filter);
    let (total,) = count
        .build_query_as::<(i64,)>()
        .fetch_one(pool)
        .await?;

    let direction = match filter.order {
        SortOrder::NewestFirst => "DESC",
        SortOrder::OldestFirst => "ASC",
    };
    let mut page = QueryBuilder::<Sqlite>::new(NOTE_QUERY);
    push_filter(&mut page, filter);
    page.push(format_args!(
        " ORDER BY travel_notes.created_at {direction}, travel_notes.id {direction} LIMIT "
    ))
    .push_bind(i64::from(filter.limit))
    .push(" OFFSET ")
    .push_bind(filter.offset());
    let notes = page
        .build_query_as::<TravelNote>()
        .fetch_all(pool)
        .await?;

    Ok((notes, total))
}

/// Live notes by one author, newest first. With `published_only` the list
/// is restricted to approved public notes.
pub async fn list_notes_by_author_in_db(
    pool: &SqlitePool,
    author_id: i64,
    published_only: bool,
) -> Result<Vec<TravelNote>, RequestError> {
    let mut builder = QueryBuilder::<Sqlite>::new(NOTE_QUERY);
    builder
        .push(" WHERE travel_notes.is_deleted = 0 AND travel_notes.author_id = ")
        .push_bind(author_id);
    if published_only {
        builder
            .push(" AND travel_notes.is_public = 1 AND travel_notes.status = ")
            .push_bind(NoteStatus::Approved.as_str());
    }
    builder.push(" ORDER BY travel_notes.created_at DESC, travel_notes.id DESC");
    let notes = builder
        .build_query_as::<TravelNote>()
        .fetch_all(pool)
        .await?;
    Ok(notes)
}

pub async fn get_note_by_id_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<TravelNote>, RequestError> {
    let query =
        format!("{NOTE_QUERY} WHERE travel_notes.id = ? AND travel_notes.is_deleted = 0");
    let note = sqlx::query_as::<Sqlite, TravelNote>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(note)
}

async fn get_note_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    id: i64,
) -> Result<TravelNote, RequestError> {
    let query =
        format!("{NOTE_QUERY} WHERE travel_notes.id = ? AND travel_notes.is_deleted = 0");
    sqlx::query_as::<Sqlite, TravelNote>(&query)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RequestError::NotFound("Travel note not found"))
}

/// Reads a live note, counting the read as a view.
pub async fn view_note_in_db(pool: &SqlitePool, id: i64) -> Result<TravelNote, RequestError> {
    let mut tx = pool.begin().await?;
    let result =
        sqlx::query("UPDATE travel_notes SET views = views + 1 WHERE id = ? AND is_deleted = 0")
            .bind(id)
            .execute(&mut tx)
            .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Travel note not found"));
    }
    let note = get_note_in_tx(&mut tx, id).await?;
    tx.commit().await?;
    Ok(note)
}

/// Replaces the tag set of a note after checking every id exists.
async fn attach_tags(
    tx: &mut Transaction<'_, Sqlite>,
    note_id: i64,
    tags: &[i64],
) -> Result<(), RequestError> {
    let mut tags = tags.to_vec();
    tags.sort_unstable();
    tags.dedup();

    sqlx::query("DELETE FROM note_tags WHERE note_id = ?")
        .bind(note_id)
        .execute(&mut *tx)
        .await?;
    if tags.is_empty() {
        return Ok(());
    }

    let mut known = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tags WHERE ");
    push_in(&mut known, "id", tags.iter().copied());
    let (known,) = known
        .build_query_as::<(i64,)>()
        .fetch_one(&mut *tx)
        .await?;
    if known != tags.len() as i64 {
        return Err(RequestError::BadRequest("Unknown tag"));
    }

    for tag_id in tags {
        sqlx::query("INSERT INTO note_tags (note_id, tag_id) VALUES (?, ?)")
            .bind(note_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
    }
    Ok(())
}

/// Inserts a `pending` note and bumps the author's post counter atomically.
pub async fn create_note_in_db(
    pool: &SqlitePool,
    author_id: i64,
    NewNote {
        title,
        content,
        location,
        images,
        video,
        tags,
        is_public,
    }: NewNote,
) -> Result<TravelNote, RequestError> {
    let images = images_to_json(&images)?;
    let mut tx = pool.begin().await?;

    let note_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO travel_notes (author_id, title, content, location, images, video, status, is_public)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(author_id)
    .bind(title)
    .bind(content)
    .bind(location)
    .bind(images)
    .bind(video)
    .bind(NoteStatus::Pending.as_str())
    .bind(is_public)
    .fetch_one(&mut tx)
    .await?;

    sqlx::query("UPDATE users SET posts = posts + 1 WHERE id = ?")
        .bind(author_id)
        .execute(&mut tx)
        .await?;

    attach_tags(&mut tx, note_id, &tags).await?;

    let note = get_note_in_tx(&mut tx, note_id).await?;
    tx.commit().await?;
    Ok(note)
}

/// Applies an author edit. Any edit sends the note back to review.
pub async fn update_note_in_db(
    pool: &SqlitePool,
    id: i64,
    author_id: i64,
    NoteChanges {
        title,
        content,
        location,
        images,
        video,
        tags,
        is_public,
    }: NoteChanges,
) -> Result<TravelNote, RequestError> {
    let images = images.map(|images| images_to_json(&images)).transpose()?;

    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE travel_notes SET ");
    let mut set = builder.separated(", ");
    if let Some(title) = title {
        set.push("title = ").push_bind_unseparated(title);
    }
    if let Some(content) = content {
        set.push("content = ").push_bind_unseparated(content);
    }
    if let Some(location) = location {
        set.push("location = ").push_bind_unseparated(location);
    }
    if let Some(images) = images {
        set.push("images = ").push_bind_unseparated(images);
    }
    if let Some(video) = video {
        set.push("video = ").push_bind_unseparated(video);
    }
    if let Some(is_public) = is_public {
        set.push("is_public = ").push_bind_unseparated(is_public);
    }
    set.push("status = ")
        .push_bind_unseparated(NoteStatus::Pending.as_str());
    set.push("rejection_reason = NULL");
    set.push("updated_at = CURRENT_TIMESTAMP");
    builder
        .push(" WHERE is_deleted = 0 AND id = ")
        .push_bind(id)
        .push(" AND author_id = ")
        .push_bind(author_id);

    // The guarded write comes first so the transaction holds the write lock
    // before anything is read.
    let mut tx = pool.begin().await?;
    let updated = builder.build().execute(&mut tx).await?;
    if updated.rows_affected() == 0 {
        get_note_in_tx(&mut tx, id).await?;
        return Err(RequestError::Forbidden("Only the author can edit this note"));
    }

    if let Some(tags) = tags {
        attach_tags(&mut tx, id, &tags).await?;
    }

    let note = get_note_in_tx(&mut tx, id).await?;
    tx.commit().await?;
    Ok(note)
}

/// Soft-deletes a note on behalf of its author or an administrator.
/// Returns `true` when the deletion was a moderation action and got logged.
pub async fn soft_delete_note_in_db(
    pool: &SqlitePool,
    id: i64,
    requester_id: i64,
    requester_role: Role,
) -> Result<bool, RequestError> {
    let mut tx = pool.begin().await?;

    let author_id = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE travel_notes
        SET is_deleted = 1, status = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND is_deleted = 0 AND (author_id = ? OR ?)
        RETURNING author_id
        "#,
    )
    .bind(NoteStatus::Deleted.as_str())
    .bind(id)
    .bind(requester_id)
    .bind(requester_role.can_administer())
    .fetch_optional(&mut tx)
    .await?;
    let author_id = match author_id {
        Some(author_id) => author_id,
        None => {
            get_note_in_tx(&mut tx, id).await?;
            return Err(RequestError::Forbidden("Not allowed to delete this note"));
        }
    };

    sqlx::query("UPDATE users SET posts = MAX(posts - 1, 0) WHERE id = ?")
        .bind(author_id)
        .execute(&mut tx)
        .await?;

    let moderated = author_id != requester_id;
    if moderated {
        insert_review_log(&mut tx, id, requester_id, ReviewAction::Delete, None).await?;
    }

    tx.commit().await?;
    Ok(moderated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_formats::NoteQueryParams;
    use crate::db_helpers::get_user_by_id;
    use crate::db_helpers::test_support::{test_pool, test_user};

    fn new_note(title: &str) -> NewNote {
        NewNote {
            title: title.to_string(),
            content: "B".to_string(),
            images: vec!["x.jpg".to_string()],
            is_public: true,
            ..Default::default()
        }
    }

    fn all_filter(search: Option<&str>) -> NoteFilter {
        NoteQueryParams {
            search: search.map(str::to_string),
            status: None,
            page: 1,
            limit: 10,
        }
        .into_filter("all", SortOrder::NewestFirst)
        .unwrap()
    }

    #[tokio::test]
    async fn created_notes_are_pending_and_count_as_posts() {
        let pool = test_pool().await;
        let author = test_user(&pool, "ada").await;
        let note = create_note_in_db(&pool, author.id, new_note("A"))
            .await
            .unwrap();
        assert_eq!(note.status(), NoteStatus::Pending);
        assert_eq!(note.image_list(), vec!["x.jpg".to_string()]);
        let author = get_user_by_id(&pool, author.id).await.unwrap().unwrap();
        assert_eq!(author.posts, 1);
    }

    #[tokio::test]
    async fn unknown_tags_roll_back_the_whole_note() {
        let pool = test_pool().await;
        let author = test_user(&pool, "ada").await;
        let mut note = new_note("A");
        note.tags = vec![404];
        let result = create_note_in_db(&pool, author.id, note).await;
        assert!(matches!(result, Err(RequestError::BadRequest(_))));

        let author = get_user_by_id(&pool, author.id).await.unwrap().unwrap();
        assert_eq!(author.posts, 0);
        let (notes, total) = list_notes_in_db(&pool, &all_filter(None)).await.unwrap();
        assert!(notes.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn viewing_counts_every_read() {
        let pool = test_pool().await;
        let author = test_user(&pool, "ada").await;
        let note = create_note_in_db(&pool, author.id, new_note("A"))
            .await
            .unwrap();
        view_note_in_db(&pool, note.id).await.unwrap();
        let note = view_note_in_db(&pool, note.id).await.unwrap();
        assert_eq!(note.views, 2);
    }

    #[tokio::test]
    async fn search_matches_title_content_or_author_nickname() {
        let pool = test_pool().await;
        let ada = test_user(&pool, "ada").await;
        let bob = test_user(&pool, "bob").await;
        create_note_in_db(&pool, ada.id, new_note("Kyoto in Autumn"))
            .await
            .unwrap();
        create_note_in_db(&pool, bob.id, new_note("Lisbon"))
            .await
            .unwrap();

        let (notes, total) = list_notes_in_db(&pool, &all_filter(Some("kyoto")))
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(notes[0].title, "Kyoto in Autumn");

        let (notes, _) = list_notes_in_db(&pool, &all_filter(Some("BOB NICK")))
            .await
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Lisbon");

        let (notes, _) = list_notes_in_db(&pool, &all_filter(Some("%")))
            .await
            .unwrap();
        assert!(notes.is_empty());
    }

    #[tokio::test]
    async fn edits_reset_review_and_are_author_only() {
        let pool = test_pool().await;
        let ada = test_user(&pool, "ada").await;
        let bob = test_user(&pool, "bob").await;
        let note = create_note_in_db(&pool, ada.id, new_note("A"))
            .await
            .unwrap();
        sqlx::query("UPDATE travel_notes SET status = 'approved' WHERE id = ?")
            .bind(note.id)
            .execute(&pool)
            .await
            .unwrap();

        let changes = NoteChanges {
            title: Some("A2".to_string()),
            ..Default::default()
        };
        let denied = update_note_in_db(&pool, note.id, bob.id, changes.clone()).await;
        assert!(matches!(denied, Err(RequestError::Forbidden(_))));

        let note = update_note_in_db(&pool, note.id, ada.id, changes)
            .await
            .unwrap();
        assert_eq!(note.title, "A2");
        assert_eq!(note.status(), NoteStatus::Pending);
    }

    #[tokio::test]
    async fn deleted_notes_disappear_and_only_moderation_is_logged() {
        let pool = test_pool().await;
        let ada = test_user(&pool, "ada").await;
        let bob = test_user(&pool, "bob").await;
        let first = create_note_in_db(&pool, ada.id, new_note("A"))
            .await
            .unwrap();
        let second = create_note_in_db(&pool, ada.id, new_note("B"))
            .await
            .unwrap();

        let denied = soft_delete_note_in_db(&pool, first.id, bob.id, Role::Reviewer).await;
        assert!(matches!(denied, Err(RequestError::Forbidden(_))));

        assert!(!soft_delete_note_in_db(&pool, first.id, ada.id, Role::User)
            .await
            .unwrap());
        assert!(soft_delete_note_in_db(&pool, second.id, bob.id, Role::Admin)
            .await
            .unwrap());

        assert!(get_note_by_id_in_db(&pool, first.id).await.unwrap().is_none());
        assert!(matches!(
            view_note_in_db(&pool, first.id).await,
            Err(RequestError::NotFound(_))
        ));
        let (notes, total) = list_notes_in_db(&pool, &all_filter(None)).await.unwrap();
        assert!(notes.is_empty());
        assert_eq!(total, 0);
        assert!(list_notes_by_author_in_db(&pool, ada.id, false)
            .await
            .unwrap()
            .is_empty());

        let logs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM review_logs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(logs, 1);
        let author = get_user_by_id(&pool, ada.id).await.unwrap().unwrap();
        assert_eq!(author.posts, 0);
    }
}
