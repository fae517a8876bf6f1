//! Notification routes: inbox and invitation responses.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use crate::{AppState, error::ApiResult, middleware::AuthUser};
use spendbee_db::entities::notifications;
use spendbee_db::repositories::NotificationRepository;
use spendbee_shared::types::{GroupId, NotificationId};

/// Creates the notification routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/{notification_id}/read", patch(mark_read))
        .route("/notifications/{notification_id}/accept", post(accept))
        .route("/notifications/{notification_id}/decline", post(decline))
}

/// A notification in the inbox.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    /// Notification ID.
    pub id: NotificationId,
    /// Notification type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Type-specific payload.
    pub data: Option<Value>,
    /// Read flag.
    pub read: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<notifications::Model> for NotificationResponse {
    fn from(n: notifications::Model) -> Self {
        Self {
            id: NotificationId::new(n.id),
            kind: n.kind,
            title: n.title,
            message: n.message,
            data: n.data,
            read: n.read,
            created_at: n.created_at.with_timezone(&Utc),
        }
    }
}

/// GET `/notifications` - The caller's inbox, newest first.
async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<NotificationResponse>>> {
    let rows = NotificationRepository::new((*state.db).clone())
        .list_for_user(auth.user_id())
        .await?;
    Ok(Json(rows.into_iter().map(NotificationResponse::from).collect()))
}

/// GET `/notifications/unread-count`
async fn unread_count(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Value>> {
    let count = NotificationRepository::new((*state.db).clone())
        .unread_count(auth.user_id())
        .await?;
    Ok(Json(json!({ "count": count })))
}

/// PATCH `/notifications/{notification_id}/read`
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NotificationId>,
) -> ApiResult<Json<Value>> {
    NotificationRepository::new((*state.db).clone())
        .mark_read(id, auth.user_id())
        .await?;
    Ok(Json(json!({ "success": true })))
}

/// POST `/notifications/{notification_id}/accept` - Join the inviting group.
async fn accept(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NotificationId>,
) -> ApiResult<Json<Value>> {
    let joined = NotificationRepository::new((*state.db).clone())
        .accept(id, auth.user_id())
        .await?;

    let body = match joined {
        Some(group) => json!({ "success": true, "groupId": GroupId::new(group.id) }),
        None => json!({ "success": true }),
    };
    Ok(Json(body))
}

/// POST `/notifications/{notification_id}/decline`
async fn decline(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NotificationId>,
) -> ApiResult<Json<Value>> {
    NotificationRepository::new((*state.db).clone())
        .decline(id, auth.user_id())
        .await?;
    Ok(Json(json!({ "success": true })))
}
