use sqlx::SqlitePool;

use crate::errors::RequestError;

/// The two user-to-note join tables, each backing a note counter and an
/// aggregate counter on the note's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Favorite,
}

impl Reaction {
    fn table(&self) -> &'static str {
        match self {
            Reaction::Like => "likes",
            Reaction::Favorite => "favorites",
        }
    }

    fn note_counter(&self) -> &'static str {
        match self {
            Reaction::Like => "likes_count",
            Reaction::Favorite => "favorite_count",
        }
    }

    fn author_counter(&self) -> &'static str {
        match self {
            Reaction::Like => "likeds",
            Reaction::Favorite => "favoriteds",
        }
    }

    fn already_present(&self) -> &'static str {
        match self {
            Reaction::Like => "You have already liked this note",
            Reaction::Favorite => "You have already favorited this note",
        }
    }

    fn not_present(&self) -> &'static str {
        match self {
            Reaction::Like => "You have not liked this note",
            Reaction::Favorite => "You have not favorited this note",
        }
    }
}

/// Adds the join row and bumps both counters in one transaction, returning
/// the note's new counter value.
///
/// The counter update runs first so the write lock is taken before anything
/// is read; a duplicate row rolls the whole transaction back.
pub async fn add_reaction_in_db(
    pool: &SqlitePool,
    reaction: Reaction,
    user_id: i64,
    note_id: i64,
) -> Result<i64, RequestError> {
    let counter = reaction.note_counter();
    let mut tx = pool.begin().await?;

    let result = sqlx::query(&format!(
        "UPDATE travel_notes SET {counter} = {counter} + 1 WHERE id = ? AND is_deleted = 0"
    ))
    .bind(note_id)
    .execute(&mut tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Travel note not found"));
    }

    let inserted = sqlx::query(&format!(
        "INSERT OR IGNORE INTO {} (user_id, note_id) VALUES (?, ?)",
        reaction.table()
    ))
    .bind(user_id)
    .bind(note_id)
    .execute(&mut tx)
    .await?;
    if inserted.rows_affected() == 0 {
        return Err(RequestError::Conflict(reaction.already_present()));
    }

    let author_counter = reaction.author_counter();
    sqlx::query(&format!(
        r#"
        UPDATE users SET {author_counter} = {author_counter} + 1
        WHERE id = (SELECT author_id FROM travel_notes WHERE id = ?)
        "#
    ))
    .bind(note_id)
    .execute(&mut tx)
    .await?;

    let count = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT {counter} FROM travel_notes WHERE id = ?"
    ))
    .bind(note_id)
    .fetch_one(&mut tx)
    .await?;

    tx.commit().await?;
    Ok(count)
}

/// Removes the join row and decrements both counters, floored at zero.
pub async fn remove_reaction_in_db(
    pool: &SqlitePool,
    reaction: Reaction,
    user_id: i64,
    note_id: i64,
) -> Result<i64, RequestError> {
    let counter = reaction.note_counter();
    let mut tx = pool.begin().await?;

    let result = sqlx::query(&format!(
        "UPDATE travel_notes SET {counter} = MAX({counter} - 1, 0) WHERE id = ? AND is_deleted = 0"
    ))
    .bind(note_id)
    .execute(&mut tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Travel note not found"));
    }

    let deleted = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = ? AND note_id = ?",
        reaction.table()
    ))
    .bind(user_id)
    .bind(note_id)
    .execute(&mut tx)
    .await?;
    if deleted.rows_affected() == 0 {
        return Err(RequestError::Conflict(reaction.not_present()));
    }

    let author_counter = reaction.author_counter();
    sqlx::query(&format!(
        r#"
        UPDATE users SET {author_counter} = MAX({author_counter} - 1, 0)
        WHERE id = (SELECT author_id FROM travel_notes WHERE id = ?)
        "#
    ))
    .bind(note_id)
    .execute(&mut tx)
    .await?;

    let count = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT {counter} FROM travel_notes WHERE id = ?"
    ))
    .bind(note_id)
    .fetch_one(&mut tx)
    .await?;

    tx.commit().await?;
    Ok(count)
}

pub async fn has_reaction_in_db(
    pool: &SqlitePool,
    reaction: Reaction,
    user_id: i64,
    note_id: i64,
) -> Result<bool, RequestError> {
    let found = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM {} WHERE user_id = ? AND note_id = ?",
        reaction.table()
    ))
    .bind(user_id)
    .bind(note_id)
    .fetch_one(pool)
    .await?;
    Ok(found > 0)
}

/// Live count of join rows, independent of the denormalized counter.
pub async fn count_reactions_in_db(
    pool: &SqlitePool,
    reaction: Reaction,
    note_id: i64,
) -> Result<i64, RequestError> {
    let count = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM {} WHERE note_id = ?",
        reaction.table()
    ))
    .bind(note_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}
