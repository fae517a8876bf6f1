//! Account routes: profile read and update.

use axum::{Json, Router, extract::State, routing::get};
use chrono::Utc;
use tracing::info;

use crate::{AppState, error::ApiResult, middleware::AuthUser};
use spendbee_core::auth::{hash_password, validate_password_strength, verify_password};
use spendbee_db::entities::users;
use spendbee_db::repositories::{UpdateUserInput, UserRepository};
use spendbee_shared::AppError;
use spendbee_shared::auth::{UpdateAccountRequest, UserInfo};
use spendbee_shared::types::UserId;

/// Creates the account routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/account", get(get_account).patch(update_account))
}

/// Public view of a user row.
#[must_use]
pub fn user_info(user: users::Model) -> UserInfo {
    UserInfo {
        id: UserId::new(user.id),
        email: user.email,
        name: user.name,
        avatar_url: user.avatar_url,
        created_at: user.created_at.with_timezone(&Utc),
    }
}

/// GET `/account` - Current user's profile.
async fn get_account(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<UserInfo>> {
    let user = UserRepository::new((*state.db).clone())
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(user_info(user)))
}

/// PATCH `/account` - Change name, avatar or password.
///
/// A new password requires the current one.
async fn update_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateAccountRequest>,
) -> ApiResult<Json<UserInfo>> {
    let repo = UserRepository::new((*state.db).clone());
    let mut input = UpdateUserInput::default();

    if let Some(name) = payload.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Name cannot be empty".into()).into());
        }
        input.name = Some(name.to_string());
    }
    input.avatar_url = payload.avatar_url;

    if let Some(new_password) = payload.new_password {
        let current = payload
            .current_password
            .ok_or_else(|| AppError::Validation("Current password is required".into()))?;
        let user = repo
            .find_by_id(auth.user_id())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        if !verify_password(&current, &user.password)? {
            return Err(AppError::Validation("Current password is incorrect".into()).into());
        }
        validate_password_strength(&new_password)?;
        input.password_hash = Some(hash_password(&new_password)?);
        info!(user_id = user.id, "Password changed");
    }

    let user = repo.update(auth.user_id(), input).await?;
    Ok(Json(user_info(user)))
}
