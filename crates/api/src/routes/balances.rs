//! Balance, settle-up and export routes.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use tracing::debug;

use crate::{AppState, access::require_member, error::ApiResult, middleware::AuthUser};
use spendbee_core::activity::label_member;
use spendbee_core::balance::{MemberBalance, SuggestedTransfer, suggest_settlements};
use spendbee_core::export::{export_filename, write_expenses_csv};
use spendbee_db::repositories::{BalanceRepository, ExpenseRepository, MemberRepository};
use spendbee_shared::AppError;
use spendbee_shared::types::{GroupId, MemberId};

/// Creates the balance routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups/{group_id}/balances", get(get_balances))
        .route(
            "/groups/{group_id}/balances/suggestions",
            get(get_suggestions),
        )
        .route("/groups/{group_id}/export", get(export_expenses))
}

async fn compute(state: &AppState, group_id: GroupId) -> ApiResult<Vec<MemberBalance>> {
    let inputs = BalanceRepository::new((*state.db).clone())
        .load_inputs(group_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Group not found".into()))?;

    let rates = state.rates.get_rates().await;
    let balances = inputs.compute(&rates)?;
    debug!(
        group_id = %group_id,
        members = balances.len(),
        expenses = inputs.expenses.len(),
        "Balances computed"
    );
    Ok(balances)
}

/// GET `/groups/{group_id}/balances` - Every member's net position.
async fn get_balances(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
) -> ApiResult<Json<Vec<MemberBalance>>> {
    require_member(&state.db, group_id, auth.user_id()).await?;
    Ok(Json(compute(&state, group_id).await?))
}

/// GET `/groups/{group_id}/balances/suggestions` - Transfers that settle
/// the group.
async fn get_suggestions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
) -> ApiResult<Json<Vec<SuggestedTransfer>>> {
    require_member(&state.db, group_id, auth.user_id()).await?;
    let balances = compute(&state, group_id).await?;
    Ok(Json(suggest_settlements(&balances)))
}

/// GET `/groups/{group_id}/export` - Expenses as a CSV download.
async fn export_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
) -> ApiResult<impl IntoResponse> {
    let access = require_member(&state.db, group_id, auth.user_id()).await?;
    let base_currency = access.base_currency();

    let labels: HashMap<MemberId, String> = MemberRepository::new((*state.db).clone())
        .list_with_users(group_id)
        .await?
        .into_iter()
        .map(|m| {
            let label = label_member(
                m.user.as_ref().map(|u| u.name.as_str()),
                m.member.name.as_deref(),
            );
            (MemberId::new(m.member.id), label)
        })
        .collect();
    let label = |id: MemberId| {
        labels
            .get(&id)
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string())
    };

    let rows: Vec<_> = ExpenseRepository::new((*state.db).clone())
        .list_for_group(group_id)
        .await?
        .iter()
        .map(|e| e.to_export_row(&base_currency, label))
        .collect();
    let csv = write_expenses_csv(&base_currency, &rows)?;
    let filename = export_filename(&access.group.name, Utc::now().date_naive());

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}
