use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::RequestError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub nickname: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub role: String,
    pub posts: i64,
    pub likeds: i64,
    pub followers: i64,
    pub following: i64,
    pub favoriteds: i64,
    pub created_at: NaiveDateTime,
}

impl User {
    /// Unknown role strings in storage degrade to the least privileged role.
    pub fn role(&self) -> Role {
        match self.role.parse() {
            Ok(role) => role,
            Err(_) => {
                warn!(user_id = self.id, role = %self.role, "Unknown role in storage");
                Role::User
            }
        }
    }
}

/// A travel note joined with its author's public fields.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TravelNote {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub location: Option<String>,
    pub images: String,
    pub video: Option<String>,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub likes_count: i64,
    pub favorite_count: i64,
    pub comment_count: i64,
    pub views: i64,
    pub is_public: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub author_nickname: String,
    pub author_avatar: Option<String>,
}

impl TravelNote {
    /// Unknown status strings in storage are treated as pending.
    pub fn status(&self) -> NoteStatus {
        match self.status.parse() {
            Ok(status) => status,
            Err(_) => {
                warn!(note_id = self.id, status = %self.status, "Unknown note status in storage");
                NoteStatus::Pending
            }
        }
    }

    pub fn image_list(&self) -> Vec<String> {
        serde_json::from_str(&self.images).unwrap_or_default()
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub note_id: i64,
    pub author_id: i64,
    pub content: String,
    pub likes_count: i64,
    pub created_at: NaiveDateTime,
    pub author_nickname: String,
    pub author_avatar: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub suggestion: Option<String>,
    pub url: Option<String>,
}

/// Tag attached to a note, carrying the owning note id so a page of notes
/// can be populated with a single query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NoteTag {
    pub note_id: i64,
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewLog {
    pub id: i64,
    pub note_id: i64,
    pub reviewer_id: i64,
    pub reviewer_nickname: String,
    pub action: String,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Report {
    pub id: i64,
    pub note_id: i64,
    pub reporter_id: i64,
    pub reason: String,
    pub status: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, sqlx::FromRow, Serialize, Deserialize)]
pub struct StatisticsTotals {
    pub users: i64,
    pub notes: i64,
    pub comments: i64,
    pub likes: i64,
    pub favorites: i64,
    pub views: i64,
    pub reports: i64,
}

#[derive(Debug, Clone, Default, sqlx::FromRow, Serialize, Deserialize)]
pub struct PendingCounts {
    pub notes: i64,
    pub reports: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopNote {
    pub id: i64,
    pub title: String,
    pub images: String,
    pub likes_count: i64,
    pub views: i64,
    pub created_at: NaiveDateTime,
    pub author_id: i64,
    pub author_nickname: String,
    pub author_avatar: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Reviewer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Reviewer => "reviewer",
            Role::Admin => "admin",
        }
    }

    /// Approve or reject notes, read the moderation queue and statistics.
    pub fn can_review(&self) -> bool {
        matches!(self, Role::Reviewer | Role::Admin)
    }

    /// Delete any note, manage roles, tags and reports.
    pub fn can_administer(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Role::User),
            "reviewer" => Ok(Role::Reviewer),
            "admin" => Ok(Role::Admin),
            _ => Err(RequestError::BadRequest("Invalid role")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteStatus {
    Pending,
    Approved,
    Rejected,
    Deleted,
}

impl NoteStatus {
    /// Statuses a listing covers when no explicit filter is given.
    pub const VISIBLE: [NoteStatus; 3] = [
        NoteStatus::Pending,
        NoteStatus::Approved,
        NoteStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Pending => "pending",
            NoteStatus::Approved => "approved",
            NoteStatus::Rejected => "rejected",
            NoteStatus::Deleted => "deleted",
        }
    }

    /// Moderation transitions. Returning a note to `pending` only happens
    /// through an author edit, which is not a review action.
    pub fn can_transition_to(&self, next: NoteStatus) -> bool {
        match (self, next) {
            (NoteStatus::Pending, NoteStatus::Approved) => true,
            (NoteStatus::Pending, NoteStatus::Rejected) => true,
            (NoteStatus::Deleted, _) => false,
            (_, NoteStatus::Deleted) => true,
            _ => false,
        }
    }
}

impl FromStr for NoteStatus {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(NoteStatus::Pending),
            "approved" => Ok(NoteStatus::Approved),
            "rejected" => Ok(NoteStatus::Rejected),
            "deleted" => Ok(NoteStatus::Deleted),
            _ => Err(RequestError::BadRequest("Invalid status")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    Reject,
    Delete,
}

impl ReviewAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewAction::Approve => "approve",
            ReviewAction::Reject => "reject",
            ReviewAction::Delete => "delete",
        }
    }

    pub fn target_status(&self) -> NoteStatus {
        match self {
            ReviewAction::Approve => NoteStatus::Approved,
            ReviewAction::Reject => NoteStatus::Rejected,
            ReviewAction::Delete => NoteStatus::Deleted,
        }
    }
}

pub fn to_utc(timestamp: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&timestamp)
}

/// Storage format for timestamps, matching SQLite's `CURRENT_TIMESTAMP`.
pub fn to_db_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reviewers_and_admins_can_review() {
        assert!(!Role::User.can_review());
        assert!(Role::Reviewer.can_review());
        assert!(Role::Admin.can_review());
    }

    #[test]
    fn only_admins_can_administer() {
        assert!(!Role::User.can_administer());
        assert!(!Role::Reviewer.can_administer());
        assert!(Role::Admin.can_administer());
    }

    #[test]
    fn role_parsing_rejects_unknown_values() {
        assert_eq!("reviewer".parse::<Role>().unwrap(), Role::Reviewer);
        assert!("superuser".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn only_pending_notes_can_be_reviewed() {
        use NoteStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Pending));
    }

    #[test]
    fn any_live_note_can_be_deleted_once() {
        use NoteStatus::*;
        assert!(Pending.can_transition_to(Deleted));
        assert!(Approved.can_transition_to(Deleted));
        assert!(Rejected.can_transition_to(Deleted));
        assert!(!Deleted.can_transition_to(Deleted));
    }

    #[test]
    fn timestamps_round_trip_through_storage_format() {
        let stamp = NaiveDateTime::parse_from_str("2024-03-05 10:20:30", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        assert_eq!(to_db_timestamp(&to_utc(stamp)), "2024-03-05 10:20:30");
    }

    #[test]
    fn unknown_stored_values_fall_back_to_the_safest_reading() {
        let stamp = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let user = User {
            id: 1,
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: String::new(),
            nickname: "Ada".to_string(),
            avatar: None,
            bio: None,
            role: "superuser".to_string(),
            posts: 0,
            likeds: 0,
            followers: 0,
            following: 0,
            favoriteds: 0,
            created_at: stamp,
        };
        assert_eq!(user.role(), Role::User);

        let note = TravelNote {
            id: 1,
            author_id: 1,
            title: "A".to_string(),
            content: "B".to_string(),
            location: None,
            images: "[]".to_string(),
            video: None,
            status: "published".to_string(),
            rejection_reason: None,
            likes_count: 0,
            favorite_count: 0,
            comment_count: 0,
            views: 0,
            is_public: true,
            created_at: stamp,
            updated_at: stamp,
            author_nickname: "Ada".to_string(),
            author_avatar: None,
        };
        assert_eq!(note.status(), NoteStatus::Pending);
    }
}
