use std::sync::Arc;

use axum::{http::StatusCode, Extension, Json};
use tracing::info;

use crate::{
    authentication::{get_jwt_token, hash_password_argon2, verify_password_argon2, AuthUser},
    data_formats::{required, AuthPayload, DataWrapper, LoginRequest, RegisterRequest, UserPayload},
    db_helpers::{get_user_by_email, get_user_by_id, get_user_by_username, insert_user, NewUser},
    errors::RequestError,
    models::Role,
    AppState, JsonResponse,
};

pub async fn register_user(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<JsonResponse<DataWrapper<AuthPayload>>, RequestError> {
    let username = required(request.username, "Username is required")?;
    let email = required(request.email, "Email is required")?.to_lowercase();
    if !email.contains('@') {
        return Err(RequestError::BadRequest("Invalid email"));
    }
    let password = match request.password {
        Some(password) if !password.is_empty() => password,
        _ => return Err(RequestError::BadRequest("Password is required")),
    };
    let nickname = request
        .nickname
        .map(|nickname| nickname.trim().to_string())
        .filter(|nickname| !nickname.is_empty())
        .unwrap_or_else(|| username.clone());

    let is_bootstrap_admin = state
        .config
        .admin_email
        .as_deref()
        .map_or(false, |admin| admin.eq_ignore_ascii_case(&email));
    let role = if is_bootstrap_admin {
        Role::Admin
    } else {
        Role::User
    };

    let password_hash = hash_password_argon2(password).await?;
    let user = insert_user(
        &state.pool,
        NewUser {
            username,
            email,
            nickname,
            password_hash,
            role,
        },
    )
    .await?;

    let token = get_jwt_token(user.id, &state.config.jwt_secret)?;
    info!(user_id = user.id, %role, "registered user");
    Ok((
        StatusCode::CREATED,
        Json(DataWrapper::wrap(AuthPayload {
            token,
            user: user.into(),
        })),
    ))
}

pub async fn login_user(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<DataWrapper<AuthPayload>>, RequestError> {
    let password = request
        .password
        .ok_or(RequestError::BadRequest("Password is required"))?;

    let user = match (request.email, request.username) {
        (Some(email), _) if !email.trim().is_empty() => {
            get_user_by_email(&state.pool, &email.trim().to_lowercase()).await?
        }
        (_, Some(username)) if !username.trim().is_empty() => {
            get_user_by_username(&state.pool, username.trim()).await?
        }
        _ => return Err(RequestError::BadRequest("Email or username is required")),
    };
    let user = user.ok_or(RequestError::NotAuthorized("Invalid credentials"))?;

    if !verify_password_argon2(password, &user.password).await? {
        return Err(RequestError::NotAuthorized("Invalid credentials"));
    }

    let token = get_jwt_token(user.id, &state.config.jwt_secret)?;
    Ok(Json(DataWrapper::wrap(AuthPayload {
        token,
        user: user.into(),
    })))
}

pub async fn get_current_user(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<DataWrapper<UserPayload>>, RequestError> {
    let user = get_user_by_id(&state.pool, auth.id)
        .await?
        .ok_or(RequestError::NotAuthorized("User not found"))?;
    Ok(Json(DataWrapper::wrap(UserPayload { user: user.into() })))
}
