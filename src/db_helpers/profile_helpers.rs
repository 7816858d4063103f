use sqlx::SqlitePool;

use crate::{errors::RequestError, models::User};

use super::get_user_by_id;

pub async fn get_profile_by_id_in_db(
    pool: &SqlitePool,
    id: Option<i64>,
    profile_id: i64,
) -> Result<(User, bool), RequestError> {
    let profile = match get_user_by_id(pool, profile_id).await? {
        Some(profile) => profile,
        None => return Err(RequestError::NotFound("User not found")),
    };

    let following = match id {
        Some(id) => {
            let found = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM follows WHERE follower_id = ? AND followed_id = ?",
            )
            .bind(id)
            .bind(profile.id)
            .fetch_one(pool)
            .await?;
            found > 0
        }
        None => false,
    };
    Ok((profile, following))
}

pub async fn follow_user_in_db(
    pool: &SqlitePool,
    follower_id: i64,
    followed_id: i64,
) -> Result<User, RequestError> {
    if follower_id == followed_id {
        return Err(RequestError::BadRequest("You cannot follow yourself"));
    }

    let mut tx = pool.begin().await?;
    let result = sqlx::query("UPDATE users SET followers = followers + 1 WHERE id = ?")
        .bind(followed_id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("User not found"));
    }

    let inserted =
        sqlx::query("INSERT OR IGNORE INTO follows (follower_id, followed_id) VALUES (?, ?)")
            .bind(follower_id)
            .bind(followed_id)
            .execute(&mut tx)
            .await?;
    if inserted.rows_affected() == 0 {
        return Err(RequestError::Conflict("You already follow this user"));
    }

    sqlx::query("UPDATE users SET following = following + 1 WHERE id = ?")
        .bind(follower_id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;

    get_user_by_id(pool, followed_id)
        .await?
        .ok_or(RequestError::NotFound("User not found"))
}

pub async fn unfollow_user_in_db(
    pool: &SqlitePool,
    follower_id: i64,
    followed_id: i64,
) -> Result<User, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("UPDATE users SET followers = MAX(followers - 1, 0) WHERE id = ?")
        .bind(followed_id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("User not found"));
    }

    let deleted = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followed_id = ?")
        .bind(follower_id)
        .bind(followed_id)
        .execute(&mut tx)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(RequestError::Conflict("You do not follow this user"));
    }

    sqlx::query("UPDATE users SET following = MAX(following - 1, 0) WHERE id = ?")
        .bind(follower_id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;

    get_user_by_id(pool, followed_id)
        .await?
        .ok_or(RequestError::NotFound("User not found"))
}
