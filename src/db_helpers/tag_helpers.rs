use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    errors::RequestError,
    models::{NoteTag, Tag},
};

use super::push_in;

pub async fn get_tags_in_db(pool: &SqlitePool) -> Result<Vec<Tag>, RequestError> {
    let tags = sqlx::query_as::<Sqlite, Tag>(
        "SELECT id, name, image, suggestion, url FROM tags ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(tags)
}

pub async fn create_tag_in_db(
    pool: &SqlitePool,
    name: &str,
    image: Option<String>,
    suggestion: Option<String>,
    url: Option<String>,
) -> Result<Tag, RequestError> {
    let mut tx = pool.begin().await?;
    let tag = sqlx::query_as::<Sqlite, Tag>(
        r#"
        INSERT INTO tags (name, image, suggestion, url)
        VALUES (?, ?, ?, ?)
        RETURNING id, name, image, suggestion, url
        "#,
    )
    .bind(name)
    .bind(image)
    .bind(suggestion)
    .bind(url)
    .fetch_one(&mut tx)
    .await
    .map_err(|e| RequestError::from(e).on_unique_violation("Tag already exists"))?;
    tx.commit().await?;
    Ok(tag)
}

/// Tags of several notes in one query, keyed by note id.
pub async fn get_tags_for_notes_in_db(
    pool: &SqlitePool,
    note_ids: &[i64],
) -> Result<HashMap<i64, Vec<NoteTag>>, RequestError> {
    let mut grouped: HashMap<i64, Vec<NoteTag>> = HashMap::new();
    if note_ids.is_empty() {
        return Ok(grouped);
    }

    let mut builder = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT note_tags.note_id AS note_id,
               tags.id           AS id,
               tags.name         AS name,
               tags.image        AS image
        FROM   note_tags
               JOIN tags
                 ON tags.id = note_tags.tag_id
        WHERE  "#,
    );
    push_in(&mut builder, "note_tags.note_id", note_ids.iter().copied());
    builder.push(" ORDER BY tags.name");
    let rows = builder
        .build_query_as::<NoteTag>()
        .fetch_all(pool)
        .await?;

    for row in rows {
        grouped.entry(row.note_id).or_default().push(row);
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_helpers::test_support::{test_pool, test_user};
    use crate::db_helpers::{create_note_in_db, NewNote};

    #[tokio::test]
    async fn tag_names_are_unique() {
        let pool = test_pool().await;
        create_tag_in_db(&pool, "beach", None, None, None)
            .await
            .unwrap();
        let again = create_tag_in_db(&pool, "beach", None, None, None).await;
        assert!(matches!(again, Err(RequestError::Conflict(_))));
    }

    #[tokio::test]
    async fn note_tags_are_grouped_by_note() {
        let pool = test_pool().await;
        let author = test_user(&pool, "ada").await;
        let beach = create_tag_in_db(&pool, "beach", None, None, None)
            .await
            .unwrap();
        let food = create_tag_in_db(&pool, "food", Some("food.png".to_string()), None, None)
            .await
            .unwrap();
        let tagged = create_note_in_db(
            &pool,
            author.id,
            NewNote {
                title: "A".to_string(),
                content: "B".to_string(),
                tags: vec![food.id, beach.id, food.id],
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let plain = create_note_in_db(
            &pool,
            author.id,
            NewNote {
                title: "C".to_string(),
                content: "D".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let grouped = get_tags_for_notes_in_db(&pool, &[tagged.id, plain.id])
            .await
            .unwrap();
        let names: Vec<_> = grouped[&tagged.id].iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["beach", "food"]);
        assert!(!grouped.contains_key(&plain.id));
    }
}
