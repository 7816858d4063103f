use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::{errors::RequestError, models::Comment};

const COMMENT_QUERY: &str = r#"
    SELECT comments.id          AS id,
           comments.note_id     AS note_id,
           comments.author_id   AS author_id,
           comments.content     AS content,
           comments.likes_count AS likes_count,
           comments.created_at  AS created_at,
           users.nickname       AS author_nickname,
           users.avatar         AS author_avatar
    FROM   comments
           JOIN users
             ON users.id = comments.author_id
"#;

async fn get_comment_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    id: i64,
) -> Result<Comment, RequestError> {
    let query = format!("{COMMENT_QUERY} WHERE comments.id = ? AND comments.is_deleted = 0");
    sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RequestError::NotFound("Comment not found"))
}

pub async fn add_comment_to_note_in_db(
    pool: &SqlitePool,
    author_id: i64,
    note_id: i64,
    content: &str,
) -> Result<Comment, RequestError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE travel_notes SET comment_count = comment_count + 1 WHERE id = ? AND is_deleted = 0",
    )
    .bind(note_id)
    .execute(&mut tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Travel note not found"));
    }

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO comments (note_id, author_id, content)
        VALUES (?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(note_id)
    .bind(author_id)
    .bind(content)
    .fetch_one(&mut tx)
    .await?;

    let comment = get_comment_in_tx(&mut tx, id).await?;
    tx.commit().await?;
    Ok(comment)
}

/// Every live comment on a live note, newest first.
pub async fn get_comments_for_note_in_db(
    pool: &SqlitePool,
    note_id: i64,
) -> Result<Vec<Comment>, RequestError> {
    let query = format!(
        r#"{COMMENT_QUERY}
        JOIN travel_notes
          ON travel_notes.id = comments.note_id
        WHERE comments.note_id = ?
          AND comments.is_deleted = 0
          AND travel_notes.is_deleted = 0
        ORDER BY comments.created_at DESC, comments.id DESC"#
    );
    let comments = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(note_id)
        .fetch_all(pool)
        .await?;
    Ok(comments)
}

/// Soft-deletes a comment; only its author may do so.
pub async fn delete_comment_in_db(
    pool: &SqlitePool,
    user_id: i64,
    comment_id: i64,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;

    let note_id = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE comments SET is_deleted = 1
        WHERE id = ? AND is_deleted = 0 AND author_id = ?
        RETURNING note_id
        "#,
    )
    .bind(comment_id)
    .bind(user_id)
    .fetch_optional(&mut tx)
    .await?;
    let note_id = match note_id {
        Some(note_id) => note_id,
        None => {
            get_comment_in_tx(&mut tx, comment_id).await?;
            return Err(RequestError::Forbidden("Only the author can delete this comment"));
        }
    };

    sqlx::query("UPDATE travel_notes SET comment_count = MAX(comment_count - 1, 0) WHERE id = ?")
        .bind(note_id)
        .execute(&mut tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
