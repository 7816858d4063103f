use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};

use crate::{
    errors::RequestError,
    models::{NoteStatus, ReviewAction, ReviewLog, TravelNote},
};

use super::note_helpers::get_note_by_id_in_db;
use super::push_in;

/// Appends an audit entry. Review logs are never updated or removed.
pub(crate) async fn insert_review_log(
    tx: &mut Transaction<'_, Sqlite>,
    note_id: i64,
    reviewer_id: i64,
    action: ReviewAction,
    reason: Option<&str>,
) -> Result<(), RequestError> {
    sqlx::query(
        r#"
        INSERT INTO review_logs (note_id, reviewer_id, action, reason)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(note_id)
    .bind(reviewer_id)
    .bind(action.as_str())
    .bind(reason)
    .execute(&mut *tx)
    .await?;
    Ok(())
}

/// Approves or rejects a pending note and records the decision.
pub async fn review_note_in_db(
    pool: &SqlitePool,
    note_id: i64,
    reviewer_id: i64,
    action: ReviewAction,
    reason: Option<&str>,
) -> Result<TravelNote, RequestError> {
    let next = action.target_status();
    if next == NoteStatus::Deleted {
        return Err(RequestError::BadRequest("Deletion is not a review decision"));
    }
    let sources = NoteStatus::VISIBLE
        .iter()
        .filter(|current| current.can_transition_to(next))
        .map(|current| current.as_str().to_string())
        .collect::<Vec<_>>();

    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE travel_notes SET status = ");
    builder
        .push_bind(next.as_str())
        .push(", rejection_reason = ")
        .push_bind(reason.filter(|_| next == NoteStatus::Rejected).map(str::to_string))
        .push(", updated_at = CURRENT_TIMESTAMP WHERE is_deleted = 0 AND id = ")
        .push_bind(note_id)
        .push(" AND ");
    push_in(&mut builder, "status", sources);

    // Status check and change are one guarded write, so concurrent
    // reviewers serialize on the write lock.
    let mut tx = pool.begin().await?;
    let updated = builder.build().execute(&mut tx).await?;
    if updated.rows_affected() == 0 {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM travel_notes WHERE id = ? AND is_deleted = 0",
        )
        .bind(note_id)
        .fetch_one(&mut tx)
        .await?;
        return Err(if exists == 0 {
            RequestError::NotFound("Travel note not found")
        } else {
            RequestError::Conflict("Only pending notes can be reviewed")
        });
    }

    insert_review_log(&mut tx, note_id, reviewer_id, action, reason).await?;
    tx.commit().await?;

    get_note_by_id_in_db(pool, note_id)
        .await?
        .ok_or(RequestError::NotFound("Travel note not found"))
}

/// Audit trail of a note, oldest entry first. Deleted notes keep theirs.
pub async fn list_review_logs_in_db(
    pool: &SqlitePool,
    note_id: i64,
) -> Result<Vec<ReviewLog>, RequestError> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM travel_notes WHERE id = ?")
        .bind(note_id)
        .fetch_one(pool)
        .await?;
    if exists == 0 {
        return Err(RequestError::NotFound("Travel note not found"));
    }

    let logs = sqlx::query_as::<Sqlite, ReviewLog>(
        r#"
        SELECT review_logs.id          AS id,
               review_logs.note_id     AS note_id,
               review_logs.reviewer_id AS reviewer_id,
               users.nickname          AS reviewer_nickname,
               review_logs.action      AS action,
               review_logs.reason      AS reason,
               review_logs.created_at  AS created_at
        FROM   review_logs
               JOIN users
                 ON users.id = review_logs.reviewer_id
        WHERE  review_logs.note_id = ?
        ORDER  BY review_logs.id ASC
        "#,
    )
    .bind(note_id)
    .fetch_all(pool)
    .await?;
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_helpers::test_support::{test_pool, test_user};
    use crate::db_helpers::{
        add_reaction_in_db, create_note_in_db, update_note_in_db, NewNote, NoteChanges, Reaction,
    };

    async fn pending_note(pool: &SqlitePool, author_id: i64) -> TravelNote {
        let note = NewNote {
            title: "A".to_string(),
            content: "B".to_string(),
            is_public: true,
            ..Default::default()
        };
        create_note_in_db(pool, author_id, note).await.unwrap()
    }

    #[tokio::test]
    async fn approval_is_logged() {
        let pool = test_pool().await;
        let author = test_user(&pool, "ada").await;
        let reviewer = test_user(&pool, "rey").await;
        let note = pending_note(&pool, author.id).await;

        let note = review_note_in_db(&pool, note.id, reviewer.id, ReviewAction::Approve, None)
            .await
            .unwrap();
        assert_eq!(note.status(), NoteStatus::Approved);

        let logs = list_review_logs_in_db(&pool, note.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "approve");
        assert_eq!(logs[0].reviewer_nickname, "rey nick");
    }

    #[tokio::test]
    async fn rejection_keeps_the_reason() {
        let pool = test_pool().await;
        let author = test_user(&pool, "ada").await;
        let reviewer = test_user(&pool, "rey").await;
        let note = pending_note(&pool, author.id).await;

        let note = review_note_in_db(
            &pool,
            note.id,
            reviewer.id,
            ReviewAction::Reject,
            Some("blurry photos"),
        )
        .await
        .unwrap();
        assert_eq!(note.status(), NoteStatus::Rejected);
        assert_eq!(note.rejection_reason.as_deref(), Some("blurry photos"));
    }

    #[tokio::test]
    async fn reviewed_notes_cannot_be_reviewed_again() {
        let pool = test_pool().await;
        let author = test_user(&pool, "ada").await;
        let reviewer = test_user(&pool, "rey").await;
        let note = pending_note(&pool, author.id).await;
        review_note_in_db(&pool, note.id, reviewer.id, ReviewAction::Approve, None)
            .await
            .unwrap();

        let again = review_note_in_db(
            &pool,
            note.id,
            reviewer.id,
            ReviewAction::Reject,
            Some("changed my mind"),
        )
        .await;
        assert!(matches!(again, Err(RequestError::Conflict(_))));
        assert_eq!(list_review_logs_in_db(&pool, note.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_notes_are_not_found() {
        let pool = test_pool().await;
        let reviewer = test_user(&pool, "rey").await;
        let result = review_note_in_db(&pool, 77, reviewer.id, ReviewAction::Approve, None).await;
        assert!(matches!(result, Err(RequestError::NotFound(_))));
        assert!(matches!(
            list_review_logs_in_db(&pool, 77).await,
            Err(RequestError::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_edits_and_approvals_of_one_note_never_fail_on_locks() {
        let pool = test_pool().await;
        let author = test_user(&pool, "ada").await;
        let reviewer = test_user(&pool, "rey").await;
        let (author_id, reviewer_id) = (author.id, reviewer.id);

        for round in 0..10 {
            let note_id = pending_note(&pool, author_id).await.id;
            let mut edits = vec![];
            let mut approvals = vec![];
            for i in 0..3 {
                let edit_pool = pool.clone();
                let changes = NoteChanges {
                    title: Some(format!("round {round} edit {i}")),
                    ..Default::default()
                };
                edits.push(tokio::spawn(async move {
                    update_note_in_db(&edit_pool, note_id, author_id, changes).await
                }));
                let review_pool = pool.clone();
                approvals.push(tokio::spawn(async move {
                    review_note_in_db(
                        &review_pool,
                        note_id,
                        reviewer_id,
                        ReviewAction::Approve,
                        None,
                    )
                    .await
                }));
            }

            for edit in edits {
                let edited = edit.await.unwrap().unwrap();
                assert_eq!(edited.id, note_id);
            }
            for approval in approvals {
                match approval.await.unwrap() {
                    Ok(approved) => assert_eq!(approved.id, note_id),
                    Err(RequestError::Conflict(_)) => {}
                    Err(other) => panic!("approval failed: {other:?}"),
                }
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn edits_do_not_block_likes_on_other_notes() {
        let pool = test_pool().await;
        let author = test_user(&pool, "ada").await;
        let author_id = author.id;
        let edited_id = pending_note(&pool, author_id).await.id;
        let liked_id = pending_note(&pool, author_id).await.id;
        let mut fans = vec![];
        for i in 0..20 {
            fans.push(test_user(&pool, &format!("fan{i}")).await);
        }

        let mut tasks = vec![];
        for (i, fan) in fans.iter().enumerate() {
            let edit_pool = pool.clone();
            let changes = NoteChanges {
                content: Some(format!("edit {i}")),
                ..Default::default()
            };
            tasks.push(tokio::spawn(async move {
                update_note_in_db(&edit_pool, edited_id, author_id, changes)
                    .await
                    .map(|_| ())
            }));
            let like_pool = pool.clone();
            let fan_id = fan.id;
            tasks.push(tokio::spawn(async move {
                add_reaction_in_db(&like_pool, Reaction::Like, fan_id, liked_id)
                    .await
                    .map(|_| ())
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let liked = get_note_by_id_in_db(&pool, liked_id).await.unwrap().unwrap();
        assert_eq!(liked.likes_count, 20);
    }
}
