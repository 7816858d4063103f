use std::sync::Arc;

use crate::db_helpers::get_user_by_id;
use crate::errors::RequestError;
use crate::models::Role;
use crate::AppState;
use anyhow::{Context, Result};
use argon2::PasswordVerifier;
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

const JWT_EXPIRY_DURATION: time::Duration = time::Duration::days(90);

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaim {
    id: i64,
    exp: i64,
}

/// The requesting user, loaded from storage so the role is current.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

impl AuthUser {
    pub fn require_reviewer(&self) -> Result<(), RequestError> {
        if self.role.can_review() {
            Ok(())
        } else {
            Err(RequestError::Forbidden("Reviewer role required"))
        }
    }

    pub fn require_admin(&self) -> Result<(), RequestError> {
        if self.role.can_administer() {
            Ok(())
        } else {
            Err(RequestError::Forbidden("Admin role required"))
        }
    }
}

pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn get_id(&self) -> Option<i64> {
        self.0.as_ref().map(|a| a.id)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let header = match parts.headers.get("Authorization") {
            Some(header) => header,
            None => return Ok(MaybeUser(None)),
        };
        let header = header.to_str().map_err(|_| {
            tracing::debug!("authorization header is not valid ascii");
            RequestError::NotAuthorized("Invalid token")
        })?;

        let token = match header.strip_prefix("Bearer ") {
            Some(token) => token.trim(),
            None => {
                tracing::debug!("authorization header without bearer prefix");
                return Err(RequestError::NotAuthorized("Invalid token"));
            }
        };

        let state = parts
            .extensions
            .get::<Arc<AppState>>()
            .cloned()
            .ok_or(RequestError::ServerError)?;

        let id = verify_jwt_token(token, &state.config.jwt_secret)?;
        let user = get_user_by_id(&state.pool, id)
            .await?
            .ok_or(RequestError::NotAuthorized("User not found"))?;

        Ok(MaybeUser(Some(AuthUser {
            id: user.id,
            role: user.role(),
        })))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        user.ok_or(RequestError::NotAuthorized("Authentication required"))
    }
}

pub fn get_jwt_token(id: i64, jwt_secret: &str) -> Result<String> {
    let expiry_date = OffsetDateTime::now_utc() + JWT_EXPIRY_DURATION;
    let claim = AuthClaim {
        id,
        exp: expiry_date.unix_timestamp(),
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .context("Failed to generate jwt token")
}

pub fn verify_jwt_token(token: &str, jwt_secret: &str) -> Result<i64, RequestError> {
    let token_data = jsonwebtoken::decode::<AuthClaim>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(jwt_secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Error verifying token: {}", e);
        RequestError::NotAuthorized("Invalid token")
    })?;
    let claim = token_data.claims;
    if claim.exp < OffsetDateTime::now_utc().unix_timestamp() {
        return Err(RequestError::NotAuthorized("Token expired"));
    }
    Ok(claim.id)
}

pub async fn verify_password_argon2(password: String, hash: &str) -> Result<bool> {
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to verify password"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_with_the_same_secret() {
        let token = get_jwt_token(42, "secret").unwrap();
        assert_eq!(verify_jwt_token(&token, "secret").unwrap(), 42);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let token = get_jwt_token(42, "secret").unwrap();
        assert!(matches!(
            verify_jwt_token(&token, "other"),
            Err(RequestError::NotAuthorized(_))
        ));
    }

    #[tokio::test]
    async fn password_hashes_verify() {
        let hash = hash_password_argon2("hunter22".to_string()).await.unwrap();
        assert!(verify_password_argon2("hunter22".to_string(), &hash)
            .await
            .unwrap());
        assert!(!verify_password_argon2("hunter23".to_string(), &hash)
            .await
            .unwrap());
    }
}
