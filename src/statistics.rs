//! Reporting window handling and the dense daily series behind the
//! dashboard statistics.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    data_formats::{AuthorResponse, StatisticsQueryParams},
    errors::RequestError,
    models::{to_utc, PendingCounts, StatisticsTotals, TopNote},
};

pub const DEFAULT_WINDOW_DAYS: i64 = 7;
pub const LEADERBOARD_SIZE: i64 = 10;
pub const MAX_WINDOW_DAYS: i64 = 366;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatisticsWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl StatisticsWindow {
    /// Resolves the requested window against `now`. Missing bounds default
    /// to the last seven days. Unparsable or inverted bounds are rejected, as
    /// are windows longer than [`MAX_WINDOW_DAYS`].
    pub fn resolve(
        StatisticsQueryParams {
            start_time,
            end_time,
        }: StatisticsQueryParams,
        now: DateTime<Utc>,
    ) -> Result<Self, RequestError> {
        let end = match non_blank(end_time) {
            Some(value) => parse_time(&value, true)?,
            None => now,
        };
        let start = match non_blank(start_time) {
            Some(value) => parse_time(&value, false)?,
            None => end - Duration::days(DEFAULT_WINDOW_DAYS),
        };
        if start > end {
            return Err(RequestError::BadRequest("startTime must not be after endTime"));
        }
        if end - start > Duration::days(MAX_WINDOW_DAYS) {
            return Err(RequestError::BadRequest(
                "Statistics window must not exceed 366 days",
            ));
        }
        Ok(StatisticsWindow { start, end })
    }

    /// Calendar days covered by the window, both ends included.
    pub fn days(&self) -> Vec<NaiveDate> {
        let last = self.end.naive_utc().date();
        let mut day = self.start.naive_utc().date();
        let mut days = vec![];
        while day <= last {
            days.push(day);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        days
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Accepts epoch milliseconds, RFC 3339, `YYYY-MM-DD HH:MM:SS` or a bare
/// date. A bare date used as an upper bound covers the whole day.
pub fn parse_time(value: &str, end_of_day: bool) -> Result<DateTime<Utc>, RequestError> {
    const INVALID: RequestError = RequestError::BadRequest("Invalid date");

    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        let millis: i64 = value.parse().map_err(|_| INVALID)?;
        return Utc.timestamp_millis_opt(millis).single().ok_or(INVALID);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(to_utc(parsed));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| INVALID)?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(to_utc).ok_or(INVALID)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub date: String,
    pub new_users: i64,
    pub new_notes: i64,
}

/// One entry per day of the window, zero where nothing happened.
pub fn fill_daily_series(
    window: &StatisticsWindow,
    users: &HashMap<NaiveDate, i64>,
    notes: &HashMap<NaiveDate, i64>,
) -> Vec<DailyStat> {
    window
        .days()
        .into_iter()
        .map(|day| DailyStat {
            date: day.format("%Y-%m-%d").to_string(),
            new_users: users.get(&day).copied().unwrap_or(0),
            new_notes: notes.get(&day).copied().unwrap_or(0),
        })
        .collect()
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopNoteResponse {
    pub id: i64,
    pub title: String,
    pub cover: Option<String>,
    pub likes_count: i64,
    pub views: i64,
    pub created_at: String,
    pub author: AuthorResponse,
}

impl From<TopNote> for TopNoteResponse {
    fn from(note: TopNote) -> Self {
        let cover = serde_json::from_str::<Vec<String>>(&note.images)
            .ok()
            .and_then(|images| images.into_iter().next());
        TopNoteResponse {
            id: note.id,
            title: note.title,
            cover,
            likes_count: note.likes_count,
            views: note.views,
            created_at: to_utc(note.created_at).to_rfc3339(),
            author: AuthorResponse {
                id: note.author_id,
                nickname: note.author_nickname,
                avatar: note.author_avatar,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    pub start_time: String,
    pub end_time: String,
    pub totals: StatisticsTotals,
    pub pending: PendingCounts,
    pub daily_stats: Vec<DailyStat>,
    pub top_notes: Vec<TopNoteResponse>,
}
