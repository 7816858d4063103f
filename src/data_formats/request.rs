use serde::{Deserialize, Serialize};

use crate::errors::RequestError;

/// Trims a required text field, rejecting missing and blank values.
pub fn required(value: Option<String>, message: &'static str) -> Result<String, RequestError> {
    match value.map(|value| value.trim().to_string()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(RequestError::BadRequest(message)),
    }
}

/// Like [`required`], but an absent value stays absent.
pub fn optional_non_blank(
    value: Option<String>,
    message: &'static str,
) -> Result<Option<String>, RequestError> {
    match value {
        Some(value) => required(Some(value), message).map(Some),
        None => Ok(None),
    }
}

// ----------------- Auth Request -----------------
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub nickname: Option<String>,
}

// ----------------- Note Request -----------------
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub location: Option<String>,
    pub images: Vec<String>,
    pub video: Option<String>,
    pub tags: Vec<i64>,
    pub is_public: Option<bool>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub location: Option<String>,
    pub images: Option<Vec<String>>,
    pub video: Option<String>,
    pub tags: Option<Vec<i64>>,
    pub is_public: Option<bool>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct CommentRequest {
    pub content: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct ReasonRequest {
    pub reason: Option<String>,
}

// ----------------- Admin Request -----------------
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct RoleRequest {
    pub role: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct CreateTagRequest {
    pub name: Option<String>,
    pub image: Option<String>,
    pub suggestion: Option<String>,
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_rejects_blank_values() {
        assert_eq!(required(Some("  Lhasa ".into()), "title").unwrap(), "Lhasa");
        assert!(required(Some("   ".into()), "title").is_err());
        assert!(required(None, "title").is_err());
    }

    #[test]
    fn optional_non_blank_keeps_absent_values() {
        assert_eq!(optional_non_blank(None, "title").unwrap(), None);
        assert!(optional_non_blank(Some("".into()), "title").is_err());
    }

    #[test]
    fn client_supplied_status_is_not_part_of_note_creation() {
        let request: CreateNoteRequest = serde_json::from_value(serde_json::json!({
            "title": "A",
            "content": "B",
            "status": "approved",
            "images": ["x.jpg"],
        }))
        .unwrap();
        assert_eq!(request.images, vec!["x.jpg".to_string()]);
        assert!(request.tags.is_empty());
    }
}
