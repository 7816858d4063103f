use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::Report};

pub const REPORT_STATUSES: [&str; 2] = ["pending", "resolved"];

pub async fn create_report_in_db(
    pool: &SqlitePool,
    reporter_id: i64,
    note_id: i64,
    reason: &str,
) -> Result<Report, RequestError> {
    let report = sqlx::query_as::<Sqlite, Report>(
        r#"
        INSERT INTO reports (note_id, reporter_id, reason)
        SELECT id, ?, ?
        FROM   travel_notes
        WHERE  id = ? AND is_deleted = 0
        RETURNING id, note_id, reporter_id, reason, status, created_at
        "#,
    )
    .bind(reporter_id)
    .bind(reason)
    .bind(note_id)
    .fetch_optional(pool)
    .await?;
    report.ok_or(RequestError::NotFound("Travel note not found"))
}

/// Reports newest first, optionally narrowed to one status.
pub async fn list_reports_in_db(
    pool: &SqlitePool,
    status: Option<&str>,
) -> Result<Vec<Report>, RequestError> {
    let reports = sqlx::query_as::<Sqlite, Report>(
        r#"
        SELECT id, note_id, reporter_id, reason, status, created_at
        FROM   reports
        WHERE  status = ? OR ? IS NULL
        ORDER  BY created_at DESC, id DESC
        "#,
    )
    .bind(status)
    .bind(status)
    .fetch_all(pool)
    .await?;
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_helpers::test_support::{test_pool, test_user};
    use crate::db_helpers::{create_note_in_db, NewNote};

    #[tokio::test]
    async fn reports_start_pending() {
        let pool = test_pool().await;
        let author = test_user(&pool, "ada").await;
        let note = create_note_in_db(
            &pool,
            author.id,
            NewNote {
                title: "A".to_string(),
                content: "B".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let report = create_report_in_db(&pool, author.id, note.id, "spam")
            .await
            .unwrap();
        assert_eq!(report.status, "pending");
        assert_eq!(list_reports_in_db(&pool, Some("pending")).await.unwrap().len(), 1);
        assert!(list_reports_in_db(&pool, Some("resolved"))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(list_reports_in_db(&pool, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_notes_cannot_be_reported() {
        let pool = test_pool().await;
        let author = test_user(&pool, "ada").await;
        let result = create_report_in_db(&pool, author.id, 5, "spam").await;
        assert!(matches!(result, Err(RequestError::NotFound(_))));
    }
}
