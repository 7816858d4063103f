use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::JsonResponse;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("{0}")]
    NotAuthorized(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("Internal Server Error")]
    ServerError,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct RequestErrorJson {
    pub message: String,
}

impl RequestErrorJson {
    pub fn new(error: &str) -> RequestErrorJson {
        RequestErrorJson {
            message: error.to_string(),
        }
    }
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Duplicates share 400 with validation failures.
            RequestError::BadRequest(_) | RequestError::Conflict(_) => StatusCode::BAD_REQUEST,
            RequestError::NotAuthorized(_) => StatusCode::UNAUTHORIZED,
            RequestError::Forbidden(_) => StatusCode::FORBIDDEN,
            RequestError::NotFound(_) => StatusCode::NOT_FOUND,
            RequestError::ServerError
            | RequestError::DatabaseError(_)
            | RequestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_json_response(&self) -> JsonResponse<RequestErrorJson> {
        let status_code = self.status_code();
        let json = match self {
            RequestError::DatabaseError(error) => {
                tracing::error!(%error, "database error");
                RequestErrorJson::new("Internal Server Error")
            }
            RequestError::Internal(error) => {
                tracing::error!(error = ?error, "internal error");
                RequestErrorJson::new("Internal Server Error")
            }
            other => RequestErrorJson::new(&other.to_string()),
        };
        (status_code, Json(json))
    }

    /// Maps a violated UNIQUE constraint to a conflict, passing every other
    /// error through.
    pub fn on_unique_violation(self, message: &'static str) -> RequestError {
        if let RequestError::DatabaseError(sqlx::Error::Database(error)) = &self {
            if error.message().contains("UNIQUE constraint failed") {
                return RequestError::Conflict(message);
            }
        }
        self
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        self.to_json_response().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_are_client_errors() {
        assert_eq!(
            RequestError::Conflict("Already liked").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn server_errors_hide_their_cause() {
        let error = RequestError::Internal(anyhow::anyhow!("disk on fire"));
        let (status, Json(body)) = error.to_json_response();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Internal Server Error");
    }

    #[test]
    fn non_database_errors_pass_through_unique_mapping() {
        let error = RequestError::NotFound("Note not found").on_unique_violation("dup");
        assert!(matches!(error, RequestError::NotFound(_)));
    }
}
