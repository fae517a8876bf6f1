//! Member routes: guests, invitations and removal.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{AppState, access::require_member, error::ApiResult, middleware::AuthUser};
use spendbee_db::entities::invitation_tokens;
use spendbee_db::repositories::{
    GroupInviteData, InvitationRepository, MemberRepository, MemberWithUser,
    NotificationRepository, UserRepository, invitation_link,
};
use spendbee_shared::AppError;
use spendbee_shared::types::{GroupId, MemberId, UserId};

/// Creates the member routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/groups/{group_id}/members",
            get(list_members).post(add_guest),
        )
        .route(
            "/groups/{group_id}/members/{member_id}",
            delete(remove_member),
        )
        .route("/groups/{group_id}/invite", post(invite))
        .route(
            "/groups/{group_id}/invitations",
            get(list_invitations).delete(revoke_invitation),
        )
}

/// A group member.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    /// Member ID.
    pub id: MemberId,
    /// Linked account, if any.
    pub user_id: Option<UserId>,
    /// Display name.
    pub name: String,
    /// Email of the linked account.
    pub email: Option<String>,
    /// Avatar of the linked account.
    pub avatar_url: Option<String>,
    /// True for members without an account.
    pub is_guest: bool,
    /// Join time.
    pub joined_at: DateTime<Utc>,
}

impl From<MemberWithUser> for MemberResponse {
    fn from(row: MemberWithUser) -> Self {
        let info = row.to_member_info();
        Self {
            id: info.id,
            user_id: info.user_id,
            name: info.display_name().to_string(),
            is_guest: info.is_guest(),
            email: row.user.as_ref().map(|u| u.email.clone()),
            avatar_url: row.user.and_then(|u| u.avatar_url),
            joined_at: row.member.joined_at.with_timezone(&Utc),
        }
    }
}

/// A pending signup invitation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResponse {
    /// Invitation ID.
    pub id: i32,
    /// Invited address.
    pub email: String,
    /// Expiry time.
    pub expires_at: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<invitation_tokens::Model> for InvitationResponse {
    fn from(row: invitation_tokens::Model) -> Self {
        Self {
            id: row.id,
            email: row.email,
            expires_at: row.expires_at.with_timezone(&Utc),
            created_at: row.created_at.with_timezone(&Utc),
        }
    }
}

/// Request to add a guest.
#[derive(Debug, Deserialize)]
pub struct AddGuestRequest {
    /// Guest's display name.
    pub name: String,
}

/// Request to invite someone by email.
#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    /// Address to invite.
    pub email: String,
}

/// Outcome of an invitation.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InviteOutcome {
    /// An existing user received an in-app notification.
    Notified,
    /// A signup link was issued.
    LinkCreated,
}

/// Query for revoking an invitation.
#[derive(Debug, Deserialize)]
pub struct RevokeQuery {
    /// Invitation ID.
    pub id: i32,
}

/// GET `/groups/{group_id}/members` - Members in join order.
async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
) -> ApiResult<Json<Vec<MemberResponse>>> {
    require_member(&state.db, group_id, auth.user_id()).await?;

    let members = MemberRepository::new((*state.db).clone())
        .list_with_users(group_id)
        .await?;
    Ok(Json(members.into_iter().map(MemberResponse::from).collect()))
}

/// POST `/groups/{group_id}/members` - Add a guest member.
async fn add_guest(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
    Json(payload): Json<AddGuestRequest>,
) -> ApiResult<impl IntoResponse> {
    let access = require_member(&state.db, group_id, auth.user_id()).await?;
    access.require_active()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Guest name is required".into()).into());
    }

    let member = MemberRepository::new((*state.db).clone())
        .add_guest(group_id, name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MemberResponse::from(MemberWithUser { member, user: None })),
    ))
}

/// DELETE `/groups/{group_id}/members/{member_id}` - Remove a guest who has
/// no expenses, shares or settlements.
async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, member_id)): Path<(GroupId, MemberId)>,
) -> ApiResult<impl IntoResponse> {
    let access = require_member(&state.db, group_id, auth.user_id()).await?;
    access.require_active()?;

    let repo = MemberRepository::new((*state.db).clone());
    let member = repo
        .find_by_id(member_id)
        .await?
        .filter(|m| m.group_id == group_id.into_inner())
        .ok_or_else(|| AppError::NotFound("Member not found".into()))?;

    if member.user_id.is_some() {
        return Err(AppError::Validation("Only guest members can be removed".into()).into());
    }
    if repo.has_records(member_id).await? {
        return Err(AppError::Conflict(
            "Member has expenses or settlements and cannot be removed".into(),
        )
        .into());
    }

    repo.remove(member_id).await?;
    info!(group_id = %group_id, member_id = %member_id, "Guest member removed");
    Ok(Json(json!({ "success": true })))
}

/// POST `/groups/{group_id}/invite` - Invite by email.
///
/// Existing users get a notification; anyone else gets a signup link.
async fn invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
    Json(payload): Json<InviteRequest>,
) -> ApiResult<impl IntoResponse> {
    let access = require_member(&state.db, group_id, auth.user_id()).await?;
    access.require_active()?;

    let email = payload.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".into()).into());
    }

    let users = UserRepository::new((*state.db).clone());
    let inviter = users
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if let Some(invitee) = users.find_by_email(&email).await? {
        let invitee_id = UserId::new(invitee.id);
        if MemberRepository::new((*state.db).clone())
            .find_membership(group_id, invitee_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("User is already a member".into()).into());
        }

        let notifications = NotificationRepository::new((*state.db).clone());
        if notifications.has_pending_invite(invitee_id, group_id).await? {
            return Err(AppError::Conflict("User has already been invited".into()).into());
        }
        notifications
            .create_group_invite(
                invitee_id,
                &GroupInviteData {
                    group_id,
                    group_name: access.group.name.clone(),
                    invited_by: inviter.name,
                },
            )
            .await?;

        info!(group_id = %group_id, invitee = invitee.id, "Existing user invited");
        return Ok((
            StatusCode::CREATED,
            Json(json!({ "outcome": InviteOutcome::Notified })),
        ));
    }

    let invitation = InvitationRepository::new((*state.db).clone())
        .create(group_id, &email, auth.user_id(), Utc::now())
        .await?;
    let link = invitation_link(&state.public_url, &invitation.token);

    info!(group_id = %group_id, invitation_id = invitation.id, link = %link, "Signup invitation created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "outcome": InviteOutcome::LinkCreated,
            "invitation": InvitationResponse::from(invitation),
            "link": link,
        })),
    ))
}

/// GET `/groups/{group_id}/invitations` - Pending signup invitations.
async fn list_invitations(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
) -> ApiResult<Json<Vec<InvitationResponse>>> {
    require_member(&state.db, group_id, auth.user_id()).await?;

    let pending = InvitationRepository::new((*state.db).clone())
        .pending_for_group(group_id, Utc::now())
        .await?;
    Ok(Json(pending.into_iter().map(InvitationResponse::from).collect()))
}

/// DELETE `/groups/{group_id}/invitations?id=` - Revoke a pending invitation.
async fn revoke_invitation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
    Query(query): Query<RevokeQuery>,
) -> ApiResult<impl IntoResponse> {
    require_member(&state.db, group_id, auth.user_id()).await?;

    let revoked = InvitationRepository::new((*state.db).clone())
        .revoke(group_id, query.id)
        .await?;
    if !revoked {
        return Err(AppError::NotFound("Invitation not found".into()).into());
    }
    Ok(Json(json!({ "success": true })))
}
