use sqlx::SqlitePool;

use crate::{
    errors::RequestError,
    models::{Role, User},
};

use super::get_user_by_id;

/// A validated registration, password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub nickname: String,
    pub password_hash: String,
    pub role: Role,
}

pub async fn insert_user(pool: &SqlitePool, user: NewUser) -> Result<User, RequestError> {
    let mut tx = pool.begin().await?;
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (username, email, password, nickname, role)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.nickname)
    .bind(user.role.as_str())
    .fetch_one(&mut tx)
    .await
    .map_err(|e| RequestError::from(e).on_unique_violation("Username or email already exists"))?;
    tx.commit().await?;

    get_user_by_id(pool, id)
        .await?
        .ok_or(RequestError::NotFound("User not found"))
}

pub async fn set_user_role_in_db(
    pool: &SqlitePool,
    id: i64,
    role: Role,
) -> Result<User, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("User not found"));
    }
    tx.commit().await?;

    get_user_by_id(pool, id)
        .await?
        .ok_or(RequestError::NotFound("User not found"))
}
