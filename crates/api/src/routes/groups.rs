//! Group routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::{
    AppState,
    access::require_member,
    error::ApiResult,
    middleware::AuthUser,
    routes::members::MemberResponse,
};
use spendbee_db::entities::groups;
use spendbee_db::repositories::{CreateGroupInput, GroupRepository, MemberRepository};
use spendbee_shared::AppError;
use spendbee_shared::types::{
    GroupId, UserId, is_supported_currency, normalize_currency,
};

/// Creates the group routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route(
            "/groups/{group_id}",
            get(get_group).patch(update_group).delete(delete_group),
        )
        .route("/groups/{group_id}/archive", patch(set_archived))
        .route("/groups/{group_id}/currency", patch(set_currency))
}

/// Response for a group.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    /// Group ID.
    pub id: GroupId,
    /// Public UUID.
    pub uuid: String,
    /// Name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Base currency.
    pub base_currency: String,
    /// Archived flag.
    pub archived: bool,
    /// Creating user.
    pub created_by: Option<UserId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<groups::Model> for GroupResponse {
    fn from(g: groups::Model) -> Self {
        Self {
            id: GroupId::new(g.id),
            base_currency: normalize_currency(g.base_currency.as_deref()),
            uuid: g.uuid,
            name: g.name,
            description: g.description,
            archived: g.archived,
            created_by: g.created_by.map(UserId::new),
            created_at: g.created_at.with_timezone(&Utc),
        }
    }
}

/// Group with its members.
#[derive(Debug, Serialize)]
pub struct GroupDetailResponse {
    /// Group fields.
    #[serde(flatten)]
    pub group: GroupResponse,
    /// Members in join order.
    pub members: Vec<MemberResponse>,
}

/// Request to create a group.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    /// Name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional base currency; defaults to EUR.
    pub base_currency: Option<String>,
}

/// Request to update a group. An empty description clears it.
#[derive(Debug, Deserialize)]
pub struct UpdateGroupRequest {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// Request to archive or unarchive a group.
#[derive(Debug, Deserialize)]
pub struct ArchiveRequest {
    /// Desired flag.
    pub archived: bool,
}

/// Request to change the base currency.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRequest {
    /// ISO 4217 code.
    pub base_currency: String,
}

/// Normalizes and checks a currency code.
///
/// # Errors
///
/// Returns a validation error for codes outside the supported list.
pub fn supported_currency(code: Option<&str>) -> ApiResult<String> {
    let code = normalize_currency(code);
    if is_supported_currency(&code) {
        Ok(code)
    } else {
        Err(AppError::Validation(format!("Unsupported currency: {code}")).into())
    }
}

/// Like [`supported_currency`], but also requires the current rate table
/// to carry the code, so balances of the group can always be converted.
///
/// # Errors
///
/// Returns a validation error for unsupported or unquoted codes.
async fn base_currency_for(state: &AppState, code: Option<&str>) -> ApiResult<String> {
    let code = supported_currency(code)?;
    if state.rates.get_rates().await.supports(&code) {
        Ok(code)
    } else {
        warn!(currency = %code, "Base currency rejected: no exchange rate available");
        Err(AppError::Validation(format!("No exchange rate available for {code}")).into())
    }
}

/// GET `/groups` - Groups the caller belongs to.
async fn list_groups(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<GroupResponse>>> {
    let groups = GroupRepository::new((*state.db).clone())
        .list_for_user(auth.user_id())
        .await?;

    Ok(Json(groups.into_iter().map(GroupResponse::from).collect()))
}

/// POST `/groups` - Create a group; the caller becomes its first member.
async fn create_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateGroupRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Group name is required".into()).into());
    }
    let base_currency = base_currency_for(&state, payload.base_currency.as_deref()).await?;

    let (group, _) = GroupRepository::new((*state.db).clone())
        .create(CreateGroupInput {
            name: name.to_string(),
            description: payload.description.filter(|d| !d.trim().is_empty()),
            base_currency: Some(base_currency),
            created_by: auth.user_id(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(GroupResponse::from(group))))
}

/// GET `/groups/{group_id}` - Group details with members.
async fn get_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
) -> ApiResult<Json<GroupDetailResponse>> {
    let access = require_member(&state.db, group_id, auth.user_id()).await?;
    let members = MemberRepository::new((*state.db).clone())
        .list_with_users(group_id)
        .await?;

    Ok(Json(GroupDetailResponse {
        group: access.group.into(),
        members: members.into_iter().map(MemberResponse::from).collect(),
    }))
}

/// PATCH `/groups/{group_id}` - Rename or re-describe (creator only).
async fn update_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
    Json(payload): Json<UpdateGroupRequest>,
) -> ApiResult<Json<GroupResponse>> {
    let access = require_member(&state.db, group_id, auth.user_id()).await?;
    access.require_creator(auth.user_id())?;

    let name = match payload.name {
        Some(name) if name.trim().is_empty() => {
            return Err(AppError::Validation("Group name is required".into()).into());
        }
        Some(name) => Some(name.trim().to_string()),
        None => None,
    };
    let description = payload
        .description
        .map(|d| Some(d.trim().to_string()).filter(|d| !d.is_empty()));

    let group = GroupRepository::new((*state.db).clone())
        .update_details(group_id, name, description)
        .await?;
    Ok(Json(group.into()))
}

/// DELETE `/groups/{group_id}` - Delete the group and everything in it
/// (creator only).
async fn delete_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
) -> ApiResult<impl IntoResponse> {
    let access = require_member(&state.db, group_id, auth.user_id()).await?;
    access.require_creator(auth.user_id())?;

    GroupRepository::new((*state.db).clone())
        .delete(group_id)
        .await?;
    Ok(Json(json!({ "success": true })))
}

/// PATCH `/groups/{group_id}/archive` - Set the archived flag (creator only).
async fn set_archived(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
    Json(payload): Json<ArchiveRequest>,
) -> ApiResult<Json<GroupResponse>> {
    let access = require_member(&state.db, group_id, auth.user_id()).await?;
    access.require_creator(auth.user_id())?;

    let group = GroupRepository::new((*state.db).clone())
        .set_archived(group_id, payload.archived)
        .await?;
    info!(group_id = group.id, archived = group.archived, "Group archive flag changed");
    Ok(Json(group.into()))
}

/// PATCH `/groups/{group_id}/currency` - Change the base currency
/// (creator only).
async fn set_currency(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
    Json(payload): Json<CurrencyRequest>,
) -> ApiResult<Json<GroupResponse>> {
    let access = require_member(&state.db, group_id, auth.user_id()).await?;
    access.require_creator(auth.user_id())?;
    let currency = base_currency_for(&state, Some(&payload.base_currency)).await?;

    let group = GroupRepository::new((*state.db).clone())
        .set_base_currency(group_id, &currency)
        .await?;
    info!(group_id = group.id, currency = %currency, "Group base currency changed");
    Ok(Json(group.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_currency_normalizes() {
        assert_eq!(supported_currency(Some(" usd ")).unwrap(), "USD");
        assert_eq!(supported_currency(None).unwrap(), "EUR");
        assert!(supported_currency(Some("XYZ")).is_err());
    }
}
