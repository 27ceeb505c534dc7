use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::db::users;
use crate::error::{AppError, Result};
use crate::models::{User, UserRow};
use crate::routes::extract::AppJson;
use crate::routes::validation::non_blank;
use crate::routes::{AuthUser, MessageResponse};
use crate::security::{hash_password, issue_token, verify_dummy_password, verify_password};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub message: String,
    pub user: User,
}

/// Passwords are taken verbatim; only the empty string counts as missing
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn check_password_length(password: &str, msg: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(msg.to_string()));
    }
    Ok(())
}

fn session_token(state: &AppState, user_id: u64) -> String {
    issue_token(
        user_id,
        Utc::now().timestamp(),
        TOKEN_TTL_SECS,
        &state.config.token_secret,
    )
}

/// Register a new user
///
/// Returns 409 Conflict if the username or email is already in use.
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let (Some(username), Some(email), Some(password)) = (
        non_blank(payload.username),
        non_blank(payload.email),
        non_empty(payload.password),
    ) else {
        return Err(AppError::InvalidInput(
            ERR_REGISTER_FIELDS_REQUIRED.to_string(),
        ));
    };
    check_password_length(&password, ERR_PASSWORD_TOO_SHORT)?;

    let email = User::normalize_email(&email);
    let db = state.db.clone();

    let (id, row) = tokio::task::spawn_blocking(move || -> Result<(u64, UserRow)> {
        let password_hash = hash_password(&password).map_err(AppError::PasswordHash)?;
        users::create_user(
            &db,
            UserRow {
                username,
                email,
                password_hash,
                created_at: Utc::now().timestamp_millis(),
            },
        )
    })
    .await??;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".to_string(),
            token: session_token(&state, id),
            user: User::from_row(id, &row),
        }),
    ))
}

/// Authenticate with email and password
///
/// Unknown email and wrong password produce the same 401 after the same
/// amount of argon2 work.
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let (Some(email), Some(password)) = (non_blank(payload.email), non_empty(payload.password))
    else {
        return Err(AppError::InvalidInput(ERR_LOGIN_FIELDS_REQUIRED.to_string()));
    };

    let email = User::normalize_email(&email);
    let db = state.db.clone();

    let (id, row) = tokio::task::spawn_blocking(move || -> Result<(u64, UserRow)> {
        let Some((id, row)) = users::find_by_email(&db, &email)? else {
            verify_dummy_password(&password);
            return Err(AppError::InvalidCredentials);
        };
        if !verify_password(&password, &row.password_hash).map_err(AppError::PasswordHash)? {
            return Err(AppError::InvalidCredentials);
        }
        Ok((id, row))
    })
    .await?
    .inspect_err(|e| {
        if matches!(e, AppError::InvalidCredentials) {
            tracing::warn!("Failed login attempt");
        }
    })?;

    tracing::info!("User {} logged in", id);

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token: session_token(&state, id),
        user: User::from_row(id, &row),
    }))
}

/// Profile of the authenticated user
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let db = state.db.clone();
    let row = tokio::task::spawn_blocking(move || users::get_user(&db, auth.user_id)).await??;

    Ok(Json(ProfileResponse {
        user: User::from_row(auth.user_id, &row),
    }))
}

/// Change the authenticated user's username
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>> {
    let username = non_blank(payload.username)
        .ok_or_else(|| AppError::InvalidInput("Username is required".to_string()))?;

    let db = state.db.clone();
    let row = tokio::task::spawn_blocking(move || {
        users::update_username(&db, auth.user_id, &username)
    })
    .await??;

    Ok(Json(UpdateProfileResponse {
        message: "Profile updated successfully".to_string(),
        user: User::from_row(auth.user_id, &row),
    }))
}

/// Replace the password after confirming the current one
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let (Some(current_password), Some(new_password)) = (
        non_empty(payload.current_password),
        non_empty(payload.new_password),
    ) else {
        return Err(AppError::InvalidInput(
            "Both current and new passwords are required".to_string(),
        ));
    };
    check_password_length(&new_password, "New password must be at least 6 characters")?;

    let db = state.db.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let row = users::get_user(&db, auth.user_id)?;
        if !verify_password(&current_password, &row.password_hash)
            .map_err(AppError::PasswordHash)?
        {
            tracing::warn!("User {} supplied a wrong current password", auth.user_id);
            return Err(AppError::IncorrectPassword);
        }

        let password_hash = hash_password(&new_password).map_err(AppError::PasswordHash)?;
        users::update_password_hash(&db, auth.user_id, password_hash)
    })
    .await??;

    Ok(MessageResponse::new("Password changed successfully"))
}
