//! Authentication routes: register, login, logout.
//!
//! Successful register and login set the session cookie and also return the
//! token for clients that prefer a Bearer header.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;
use serde_json::json;
use tracing::info;

use crate::{AppState, error::ApiResult, routes::account::user_info};
use spendbee_core::auth::{hash_password, validate_password_strength, verify_password};
use spendbee_db::UserRepository;
use spendbee_db::entities::users;
use spendbee_shared::AppError;
use spendbee_shared::auth::{AuthResponse, LoginRequest, RegisterRequest};
use spendbee_shared::jwt::SESSION_COOKIE;
use spendbee_shared::types::UserId;

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// `Set-Cookie` value for a session token.
#[must_use]
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}{secure}")
}

/// `Set-Cookie` value that removes the session cookie.
#[must_use]
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn signed_in(
    state: &AppState,
    status: StatusCode,
    user: users::Model,
    group_uuid: Option<String>,
) -> ApiResult<impl IntoResponse + use<>> {
    let token = state
        .jwt_service
        .generate_token(UserId::new(user.id), &user.email)?;
    let cookie = session_cookie(
        &token,
        state.jwt_service.token_max_age_secs(),
        state.secure_cookie,
    );

    Ok((
        status,
        [(SET_COOKIE, cookie)],
        Json(AuthResponse {
            token,
            user: user_info(user),
            group_uuid,
        }),
    ))
}

/// POST /auth/register - Create an account, optionally from an invitation.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = normalize_email(&payload.email);
    let name = payload.name.trim();
    if !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".into()).into());
    }
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".into()).into());
    }
    validate_password_strength(&payload.password)?;

    let user_repo = UserRepository::new((*state.db).clone());
    let password_hash = hash_password(&payload.password)?;

    let (user, group_uuid) = match payload.token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => {
            let (user, group) = user_repo
                .register_with_invitation(&email, &password_hash, name, token, Utc::now())
                .await?;
            (user, Some(group.uuid))
        }
        None => {
            if user_repo.email_exists(&email).await? {
                return Err(AppError::Conflict("Email already registered".into()).into());
            }
            (user_repo.create(&email, &password_hash, name).await?, None)
        }
    };

    info!(user_id = user.id, "New user registered");
    signed_in(&state, StatusCode::CREATED, user, group_uuid)
}

/// POST /auth/login - Check credentials and start a session.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let invalid = || AppError::Unauthorized("Invalid email or password".into());

    let user = UserRepository::new((*state.db).clone())
        .find_by_email(&normalize_email(&payload.email))
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password)? {
        info!(user_id = user.id, "Failed login attempt - invalid password");
        return Err(invalid().into());
    }

    info!(user_id = user.id, "User logged in");
    signed_in(&state, StatusCode::OK, user, None)
}

/// POST /auth/logout - Clear the session cookie.
async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(SET_COOKIE, clear_session_cookie(state.secure_cookie))],
        Json(json!({ "success": true })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc", 2_592_000, true);
        assert!(cookie.starts_with("token=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=2592000"));
        assert!(cookie.ends_with("; Secure"));

        assert!(!session_cookie("abc", 60, false).contains("Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie(false);
        assert!(cookie.starts_with("token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }
}
