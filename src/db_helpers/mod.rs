use sqlx::{Encode, QueryBuilder, Sqlite, SqlitePool, Type};

use crate::{errors::RequestError, models::User};

mod comment_helpers;
mod note_helpers;
mod profile_helpers;
mod reaction_helpers;
mod report_helpers;
mod review_helpers;
mod statistics_helpers;
mod tag_helpers;
mod user_helpers;

pub use comment_helpers::*;
pub use note_helpers::*;
pub use profile_helpers::*;
pub use reaction_helpers::*;
pub use report_helpers::*;
pub use review_helpers::*;
pub use statistics_helpers::*;
pub use tag_helpers::*;
pub use user_helpers::*;

/// Appends `column IN (?, ...)` with one bind per value; an empty list
/// matches nothing.
fn push_in<'args, T>(
    builder: &mut QueryBuilder<'args, Sqlite>,
    column: &str,
    values: impl IntoIterator<Item = T>,
) where
    T: 'args + Encode<'args, Sqlite> + Send + Type<Sqlite>,
{
    let mut values = values.into_iter().peekable();
    if values.peek().is_none() {
        builder.push("0 = 1");
        return;
    }
    builder.push(column).push(" IN (");
    let mut list = builder.separated(", ");
    for value in values {
        list.push_bind(value);
    }
    list.push_unseparated(")");
}

/// Escapes LIKE wildcards so user input matches literally, wrapped for a
/// substring match. Pair with `ESCAPE '\'`.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// ----------------- Helper Functions -----------------

const USER_COLUMNS: &str = r#"
    id, username, email, password, nickname, avatar, bio, role,
    posts, likeds, followers, following, favoriteds, created_at
"#;

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}
