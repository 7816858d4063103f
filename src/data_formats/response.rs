use serde::{Deserialize, Serialize};

use crate::models::{to_utc, Comment, NoteTag, Report, ReviewLog, Tag, TravelNote, User};

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub nickname: String,
    pub avatar: Option<String>,
    pub bio: String,
    pub role: String,
    pub posts: i64,
    pub likeds: i64,
    pub followers: i64,
    pub following: i64,
    pub favoriteds: i64,
    pub created_at: String,
}

/// Public view of a user: no email, plus whether the requester follows them.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub nickname: String,
    pub avatar: Option<String>,
    pub bio: String,
    pub posts: i64,
    pub likeds: i64,
    pub followers: i64,
    pub following: i64,
    pub favoriteds: i64,
    pub is_following: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct AuthorResponse {
    pub id: i64,
    pub nickname: String,
    pub avatar: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub suggestion: Option<String>,
    pub url: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NoteTagResponse {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub location: Option<String>,
    pub images: Vec<String>,
    pub video: Option<String>,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub likes_count: i64,
    pub favorite_count: i64,
    pub comment_count: i64,
    pub views: i64,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
    pub author: AuthorResponse,
    pub tags: Vec<NoteTagResponse>,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetailResponse {
    #[serde(flatten)]
    pub note: NoteResponse,
    pub liked: bool,
    pub favorited: bool,
    pub comments: Vec<CommentResponse>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub note_id: i64,
    pub content: String,
    pub likes_count: i64,
    pub created_at: String,
    pub author: AuthorResponse,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub liked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes_count: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub favorited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite_count: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogResponse {
    pub id: i64,
    pub note_id: i64,
    pub action: String,
    pub reason: Option<String>,
    pub created_at: String,
    pub reviewer: AuthorResponse,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: i64,
    pub note_id: i64,
    pub reporter_id: i64,
    pub reason: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProfileWithNotesResponse {
    pub user: ProfileResponse,
    pub notes: Vec<NoteResponse>,
}

impl From<User> for UserResponse {
    fn from(
        User {
            id,
            username,
            email,
            nickname,
            avatar,
            bio,
            role,
            posts,
            likeds,
            followers,
            following,
            favoriteds,
            created_at,
            ..
        }: User,
    ) -> Self {
        UserResponse {
            id,
            username,
            email,
            nickname,
            avatar,
            bio: bio.unwrap_or_default(),
            role,
            posts,
            likeds,
            followers,
            following,
            favoriteds,
            created_at: to_utc(created_at).to_rfc3339(),
        }
    }
}

impl ProfileResponse {
    pub fn new(user: User, is_following: bool) -> Self {
        ProfileResponse {
            id: user.id,
            username: user.username,
            nickname: user.nickname,
            avatar: user.avatar,
            bio: user.bio.unwrap_or_default(),
            posts: user.posts,
            likeds: user.likeds,
            followers: user.followers,
            following: user.following,
            favoriteds: user.favoriteds,
            is_following,
        }
    }
}

impl From<Tag> for TagResponse {
    fn from(
        Tag {
            id,
            name,
            image,
            suggestion,
            url,
        }: Tag,
    ) -> Self {
        TagResponse {
            id,
            name,
            image,
            suggestion,
            url,
        }
    }
}

impl From<NoteTag> for NoteTagResponse {
    fn from(NoteTag { id, name, image, .. }: NoteTag) -> Self {
        NoteTagResponse { id, name, image }
    }
}

impl NoteResponse {
    pub fn new(note: TravelNote, tags: Vec<NoteTag>) -> Self {
        let images = note.image_list();
        let status = note.status().as_str().to_string();
        NoteResponse {
            id: note.id,
            title: note.title,
            content: note.content,
            location: note.location,
            images,
            video: note.video,
            status,
            rejection_reason: note.rejection_reason,
            likes_count: note.likes_count,
            favorite_count: note.favorite_count,
            comment_count: note.comment_count,
            views: note.views,
            is_public: note.is_public,
            created_at: to_utc(note.created_at).to_rfc3339(),
            updated_at: to_utc(note.updated_at).to_rfc3339(),
            author: AuthorResponse {
                id: note.author_id,
                nickname: note.author_nickname,
                avatar: note.author_avatar,
            },
            tags: tags.into_iter().map(NoteTagResponse::from).collect(),
        }
    }
}

impl From<Comment> for CommentResponse {
    fn from(
        Comment {
            id,
            note_id,
            author_id,
            content,
            likes_count,
            created_at,
            author_nickname,
            author_avatar,
        }: Comment,
    ) -> Self {
        CommentResponse {
            id,
            note_id,
            content,
            likes_count,
            created_at: to_utc(created_at).to_rfc3339(),
            author: AuthorResponse {
                id: author_id,
                nickname: author_nickname,
                avatar: author_avatar,
            },
        }
    }
}

impl From<ReviewLog> for ReviewLogResponse {
    fn from(
        ReviewLog {
            id,
            note_id,
            reviewer_id,
            reviewer_nickname,
            action,
            reason,
            created_at,
        }: ReviewLog,
    ) -> Self {
        ReviewLogResponse {
            id,
            note_id,
            action,
            reason,
            created_at: to_utc(created_at).to_rfc3339(),
            reviewer: AuthorResponse {
                id: reviewer_id,
                nickname: reviewer_nickname,
                avatar: None,
            },
        }
    }
}

impl From<Report> for ReportResponse {
    fn from(
        Report {
            id,
            note_id,
            reporter_id,
            reason,
            status,
            created_at,
        }: Report,
    ) -> Self {
        ReportResponse {
            id,
            note_id,
            reporter_id,
            reason,
            status,
            created_at: to_utc(created_at).to_rfc3339(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        MessageResponse {
            message: message.to_string(),
        }
    }
}
