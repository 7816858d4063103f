use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{Sqlite, SqlitePool};

use crate::{
    errors::RequestError,
    models::{to_db_timestamp, PendingCounts, StatisticsTotals, TopNote},
    statistics::{StatisticsWindow, LEADERBOARD_SIZE},
};

/// Which table a daily series counts creations in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailySeries {
    NewUsers,
    NewNotes,
}

impl DailySeries {
    fn table(&self) -> &'static str {
        match self {
            DailySeries::NewUsers => "users",
            DailySeries::NewNotes => "travel_notes",
        }
    }

    /// Soft-deleted notes do not count as new notes.
    fn live_rows(&self) -> &'static str {
        match self {
            DailySeries::NewUsers => "",
            DailySeries::NewNotes => "AND is_deleted = 0",
        }
    }
}

/// All-time totals; the reporting window does not apply.
pub async fn count_totals_in_db(pool: &SqlitePool) -> Result<StatisticsTotals, RequestError> {
    let totals = sqlx::query_as::<Sqlite, StatisticsTotals>(
        r#"
        SELECT (SELECT COUNT(*) FROM users)                                       AS users,
               (SELECT COUNT(*) FROM travel_notes WHERE is_deleted = 0)           AS notes,
               (SELECT COUNT(*) FROM comments WHERE is_deleted = 0)               AS comments,
               (SELECT COUNT(*) FROM likes)                                       AS likes,
               (SELECT COUNT(*) FROM favorites)                                   AS favorites,
               (SELECT COALESCE(SUM(views), 0) FROM travel_notes
                WHERE is_deleted = 0)                                             AS views,
               (SELECT COUNT(*) FROM reports)                                     AS reports
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(totals)
}

pub async fn count_pending_in_db(pool: &SqlitePool) -> Result<PendingCounts, RequestError> {
    let pending = sqlx::query_as::<Sqlite, PendingCounts>(
        r#"
        SELECT (SELECT COUNT(*) FROM travel_notes
                WHERE status = 'pending' AND is_deleted = 0)            AS notes,
               (SELECT COUNT(*) FROM reports WHERE status = 'pending')  AS reports
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(pending)
}

/// Creations per UTC calendar day inside the window. Days without any
/// creation are absent; callers fill the gaps.
pub async fn count_daily_in_db(
    pool: &SqlitePool,
    series: DailySeries,
    window: &StatisticsWindow,
) -> Result<HashMap<NaiveDate, i64>, RequestError> {
    let query = format!(
        r#"
        SELECT date(created_at) AS day, COUNT(*) AS count
        FROM   {}
        WHERE  created_at >= ?
          AND  created_at <= ?
          {}
        GROUP  BY day
        "#,
        series.table(),
        series.live_rows()
    );
    let rows = sqlx::query_as::<Sqlite, (String, i64)>(&query)
        .bind(to_db_timestamp(&window.start))
        .bind(to_db_timestamp(&window.end))
        .fetch_all(pool)
        .await?;

    let mut counts = HashMap::new();
    for (day, count) in rows {
        let day = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
            .map_err(|e| RequestError::Internal(e.into()))?;
        counts.insert(day, count);
    }
    Ok(counts)
}

/// Most liked notes created inside the window, views breaking ties.
pub async fn top_notes_in_db(
    pool: &SqlitePool,
    window: &StatisticsWindow,
) -> Result<Vec<TopNote>, RequestError> {
    let notes = sqlx::query_as::<Sqlite, TopNote>(
        r#"
        SELECT travel_notes.id          AS id,
               travel_notes.title       AS title,
               travel_notes.images      AS images,
               travel_notes.likes_count AS likes_count,
               travel_notes.views       AS views,
               travel_notes.created_at  AS created_at,
               users.id                 AS author_id,
               users.nickname           AS author_nickname,
               users.avatar             AS author_avatar
        FROM   travel_notes
               JOIN users
                 ON users.id = travel_notes.author_id
        WHERE  travel_notes.is_deleted = 0
          AND  travel_notes.created_at >= ?
          AND  travel_notes.created_at <= ?
        ORDER  BY travel_notes.likes_count DESC,
                  travel_notes.views DESC,
                  travel_notes.id DESC
        LIMIT  ?
        "#,
    )
    .bind(to_db_timestamp(&window.start))
    .bind(to_db_timestamp(&window.end))
    .bind(LEADERBOARD_SIZE)
    .fetch_all(pool)
    .await?;
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::db_helpers::test_support::{test_pool, test_user};
    use crate::db_helpers::{
        add_reaction_in_db, create_note_in_db, soft_delete_note_in_db, view_note_in_db, NewNote,
        Reaction,
    };
    use crate::models::Role;

    fn around_now() -> StatisticsWindow {
        let now = Utc::now();
        StatisticsWindow {
            start: now - Duration::days(1),
            end: now + Duration::minutes(1),
        }
    }

    async fn note(pool: &SqlitePool, author_id: i64, title: &str) -> i64 {
        let note = NewNote {
            title: title.to_string(),
            content: "B".to_string(),
            images: vec!["cover.jpg".to_string(), "second.jpg".to_string()],
            ..Default::default()
        };
        create_note_in_db(pool, author_id, note).await.unwrap().id
    }

    #[tokio::test]
    async fn totals_ignore_deleted_notes() {
        let pool = test_pool().await;
        let ada = test_user(&pool, "ada").await;
        let kept = note(&pool, ada.id, "kept").await;
        let gone = note(&pool, ada.id, "gone").await;
        view_note_in_db(&pool, kept).await.unwrap();
        view_note_in_db(&pool, gone).await.unwrap();
        soft_delete_note_in_db(&pool, gone, ada.id, Role::User)
            .await
            .unwrap();

        let totals = count_totals_in_db(&pool).await.unwrap();
        assert_eq!(totals.users, 1);
        assert_eq!(totals.notes, 1);
        assert_eq!(totals.views, 1);

        let pending = count_pending_in_db(&pool).await.unwrap();
        assert_eq!(pending.notes, 1);
        assert_eq!(pending.reports, 0);
    }

    #[tokio::test]
    async fn daily_counts_group_by_creation_day() {
        let pool = test_pool().await;
        let ada = test_user(&pool, "ada").await;
        test_user(&pool, "bob").await;
        note(&pool, ada.id, "A").await;

        let window = around_now();
        let users = count_daily_in_db(&pool, DailySeries::NewUsers, &window)
            .await
            .unwrap();
        let notes = count_daily_in_db(&pool, DailySeries::NewNotes, &window)
            .await
            .unwrap();
        assert_eq!(users.values().sum::<i64>(), 2);
        assert_eq!(notes.values().sum::<i64>(), 1);

        let past = StatisticsWindow {
            start: Utc::now() - Duration::days(30),
            end: Utc::now() - Duration::days(20),
        };
        assert!(count_daily_in_db(&pool, DailySeries::NewUsers, &past)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn leaderboard_orders_by_likes_then_views() {
        let pool = test_pool().await;
        let ada = test_user(&pool, "ada").await;
        let bob = test_user(&pool, "bob").await;
        let quiet = note(&pool, ada.id, "quiet").await;
        let viewed = note(&pool, ada.id, "viewed").await;
        let liked = note(&pool, ada.id, "liked").await;
        view_note_in_db(&pool, viewed).await.unwrap();
        add_reaction_in_db(&pool, Reaction::Like, bob.id, liked)
            .await
            .unwrap();

        let top = top_notes_in_db(&pool, &around_now()).await.unwrap();
        let ids: Vec<_> = top.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![liked, viewed, quiet]);
        assert_eq!(top[0].author_nickname, "ada nick");
    }
}
