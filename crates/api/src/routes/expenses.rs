//! Expense routes.
//!
//! Every write validates against the group's current member list and
//! captures the exchange rate to the group's base currency.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState,
    access::{GroupAccess, require_member},
    error::ApiResult,
    middleware::AuthUser,
};
use spendbee_core::currency::rate_between;
use spendbee_core::expense::{CustomShare, ExpenseDraft, validate_expense};
use spendbee_db::repositories::{
    CreateExpenseInput, ExpenseRepository, ExpenseWithShares, MemberRepository,
    UpdateExpenseInput,
};
use spendbee_shared::AppError;
use spendbee_shared::types::{ExpenseId, GroupId, MemberId, currency_or};

/// Creates the expense routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/groups/{group_id}/expenses",
            get(list_expenses).post(create_expense),
        )
        .route(
            "/expenses/{expense_id}",
            patch(update_expense).delete(delete_expense),
        )
}

/// One member's share of an expense.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    /// Member owing the share.
    pub member_id: MemberId,
    /// Member's display name.
    pub member_name: String,
    /// Amount owed.
    #[serde(with = "rust_decimal::serde::float")]
    pub share: Decimal,
}

/// An expense with payer and shares.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    /// Expense ID.
    pub id: ExpenseId,
    /// Owning group.
    pub group_id: GroupId,
    /// Description.
    pub description: String,
    /// Optional note.
    pub note: Option<String>,
    /// Total amount.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Rate to the base currency captured at creation.
    #[serde(with = "rust_decimal::serde::float")]
    pub exchange_rate: Decimal,
    /// Paying member.
    pub paid_by: MemberId,
    /// Payer's display name.
    pub paid_by_name: String,
    /// Expense date.
    pub created_at: DateTime<Utc>,
    /// Shares in insertion order.
    pub shares: Vec<ShareResponse>,
    /// Receipt image location.
    pub receipt_image_url: Option<String>,
    /// Itemized receipt lines.
    pub receipt_items: Option<serde_json::Value>,
    /// Attachment metadata.
    pub attachments: Option<serde_json::Value>,
}

/// Display names keyed by member.
pub(crate) type MemberNames = HashMap<MemberId, String>;

pub(crate) fn name_of(names: &MemberNames, id: MemberId) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| "Unknown".to_string())
}

fn to_response(row: ExpenseWithShares, base_currency: &str, names: &MemberNames) -> ExpenseResponse {
    let e = row.expense;
    let paid_by = MemberId::new(e.paid_by);
    ExpenseResponse {
        id: ExpenseId::new(e.id),
        group_id: GroupId::new(e.group_id),
        currency: currency_or(e.currency.as_deref(), base_currency),
        description: e.description,
        note: e.note,
        amount: e.amount,
        exchange_rate: e.exchange_rate,
        paid_by,
        paid_by_name: name_of(names, paid_by),
        created_at: e.created_at.with_timezone(&Utc),
        shares: row
            .shares
            .into_iter()
            .map(|s| {
                let member_id = MemberId::new(s.member_id);
                ShareResponse {
                    member_id,
                    member_name: name_of(names, member_id),
                    share: s.share,
                }
            })
            .collect(),
        receipt_image_url: e.receipt_image_url,
        receipt_items: e.receipt_items,
        attachments: e.attachments,
    }
}

pub(crate) async fn member_names(state: &AppState, group_id: GroupId) -> ApiResult<MemberNames> {
    let members = MemberRepository::new((*state.db).clone())
        .list_with_users(group_id)
        .await?;
    Ok(members
        .iter()
        .map(|m| {
            let info = m.to_member_info();
            (info.id, info.display_name().to_string())
        })
        .collect())
}

/// Rate from `currency` to the group's base currency in the live table.
pub(crate) async fn capture_rate(state: &AppState, currency: &str, base_currency: &str) -> ApiResult<Decimal> {
    let rates = state.rates.get_rates().await;
    rate_between(currency, base_currency, &rates)
        .map_err(|e| AppError::Validation(e.to_string()).into())
}

/// Request to create an expense.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    /// Description.
    pub description: String,
    /// Optional note.
    pub note: Option<String>,
    /// Total amount.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Currency; the group's base currency if unset.
    pub currency: Option<String>,
    /// Paying member; the caller if unset.
    pub paid_by: Option<MemberId>,
    /// Members splitting equally.
    #[serde(default)]
    pub shared_with: Vec<MemberId>,
    /// Explicit shares; overrides `shared_with`.
    #[serde(default)]
    pub custom_shares: Vec<CustomShare>,
    /// Backdated expense time.
    pub created_at: Option<DateTime<Utc>>,
    /// Itemized receipt lines.
    pub receipt_items: Option<serde_json::Value>,
    /// Attachment metadata.
    pub attachments: Option<serde_json::Value>,
}

/// Request to update an expense. Absent fields stay unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    /// New description.
    pub description: Option<String>,
    /// New note; empty clears it.
    pub note: Option<String>,
    /// New amount.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    /// New currency.
    pub currency: Option<String>,
    /// New payer.
    pub paid_by: Option<MemberId>,
    /// New equal split.
    pub shared_with: Option<Vec<MemberId>>,
    /// New custom split.
    pub custom_shares: Option<Vec<CustomShare>>,
    /// New date.
    pub created_at: Option<DateTime<Utc>>,
}

/// GET `/groups/{group_id}/expenses` - Expenses newest first.
async fn list_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
) -> ApiResult<Json<Vec<ExpenseResponse>>> {
    let access = require_member(&state.db, group_id, auth.user_id()).await?;
    let base_currency = access.base_currency();

    let expenses = ExpenseRepository::new((*state.db).clone())
        .list_for_group(group_id)
        .await?;
    let names = member_names(&state, group_id).await?;

    Ok(Json(
        expenses
            .into_iter()
            .map(|e| to_response(e, &base_currency, &names))
            .collect(),
    ))
}

/// POST `/groups/{group_id}/expenses` - Record an expense.
async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
    Json(payload): Json<CreateExpenseRequest>,
) -> ApiResult<impl IntoResponse> {
    let access = require_member(&state.db, group_id, auth.user_id()).await?;
    access.require_active()?;
    let base_currency = access.base_currency();

    let currency = currency_or(payload.currency.as_deref(), &base_currency);
    let paid_by = payload.paid_by.unwrap_or_else(|| access.member_id());
    let member_ids = MemberRepository::new((*state.db).clone())
        .member_ids(group_id)
        .await?;

    let shares = validate_expense(
        &ExpenseDraft {
            description: &payload.description,
            amount: payload.amount,
            currency: &currency,
            created_at: payload.created_at,
            paid_by,
            shared_with: &payload.shared_with,
            custom_shares: &payload.custom_shares,
        },
        &member_ids,
        Utc::now(),
    )?;
    let exchange_rate = capture_rate(&state, &currency, &base_currency).await?;

    let created = ExpenseRepository::new((*state.db).clone())
        .create(CreateExpenseInput {
            group_id,
            actor: access.member_id(),
            description: payload.description.trim().to_string(),
            note: payload.note.filter(|n| !n.trim().is_empty()),
            amount: payload.amount,
            currency,
            exchange_rate,
            paid_by,
            created_at: payload.created_at,
            shares,
            receipt_items: payload.receipt_items,
            attachments: payload.attachments,
        })
        .await?;

    let names = member_names(&state, group_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(to_response(created, &base_currency, &names)),
    ))
}

/// Loads an expense and checks the caller may change it.
async fn editable_expense(
    state: &AppState,
    auth: &AuthUser,
    expense_id: ExpenseId,
) -> ApiResult<(GroupAccess, ExpenseWithShares)> {
    let repo = ExpenseRepository::new((*state.db).clone());
    let expense = repo
        .find_by_id(expense_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Expense not found".into()))?;

    let access =
        require_member(&state.db, GroupId::new(expense.group_id), auth.user_id()).await?;
    access.require_active()?;

    let shares = repo.shares_of(expense_id).await?;
    Ok((access, ExpenseWithShares { expense, shares }))
}

/// PATCH `/expenses/{expense_id}` - Update an expense.
///
/// A new amount without a new split is re-split equally over the current
/// participants.
async fn update_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(expense_id): Path<ExpenseId>,
    Json(payload): Json<UpdateExpenseRequest>,
) -> ApiResult<Json<ExpenseResponse>> {
    let (access, current) = editable_expense(&state, &auth, expense_id).await?;
    let base_currency = access.base_currency();
    let group_id = access.group_id();
    let expense = &current.expense;

    let description = payload
        .description
        .clone()
        .unwrap_or_else(|| expense.description.clone());
    let amount = payload.amount.unwrap_or(expense.amount);
    let currency = match payload.currency.as_deref() {
        Some(code) => currency_or(Some(code), &base_currency),
        None => currency_or(expense.currency.as_deref(), &base_currency),
    };
    let paid_by = payload
        .paid_by
        .unwrap_or_else(|| MemberId::new(expense.paid_by));

    let current_participants: Vec<MemberId> = current
        .shares
        .iter()
        .map(|s| MemberId::new(s.member_id))
        .collect();
    let shared_with = payload
        .shared_with
        .as_deref()
        .unwrap_or(&current_participants);
    let custom_shares = payload.custom_shares.as_deref().unwrap_or_default();

    let member_ids = MemberRepository::new((*state.db).clone())
        .member_ids(group_id)
        .await?;
    let allocations = validate_expense(
        &ExpenseDraft {
            description: &description,
            amount,
            currency: &currency,
            created_at: payload.created_at,
            paid_by,
            shared_with,
            custom_shares,
        },
        &member_ids,
        Utc::now(),
    )?;

    let resplit = payload.shared_with.is_some()
        || payload.custom_shares.is_some()
        || payload.amount.is_some_and(|a| a != expense.amount);
    let exchange_rate = if payload.currency.is_some() {
        Some(capture_rate(&state, &currency, &base_currency).await?)
    } else {
        None
    };

    let updated = ExpenseRepository::new((*state.db).clone())
        .update(
            expense_id,
            access.member_id(),
            UpdateExpenseInput {
                description: payload.description.map(|d| d.trim().to_string()),
                note: payload
                    .note
                    .map(|n| Some(n.trim().to_string()).filter(|n| !n.is_empty())),
                amount: payload.amount,
                currency: payload.currency.map(|_| currency),
                exchange_rate,
                paid_by: payload.paid_by,
                created_at: payload.created_at,
                shares: resplit.then_some(allocations),
            },
        )
        .await?;

    let names = member_names(&state, group_id).await?;
    Ok(Json(to_response(updated, &base_currency, &names)))
}

/// DELETE `/expenses/{expense_id}` - Delete an expense and its shares.
async fn delete_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(expense_id): Path<ExpenseId>,
) -> ApiResult<impl IntoResponse> {
    let (access, _) = editable_expense(&state, &auth, expense_id).await?;

    ExpenseRepository::new((*state.db).clone())
        .delete(expense_id, access.member_id())
        .await?;
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use rust_decimal_macros::dec;
    use spendbee_db::entities::{expense_shares, expenses};

    fn expense_row() -> ExpenseWithShares {
        let ts = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 1, 19, 0, 0)
            .unwrap();
        ExpenseWithShares {
            expense: expenses::Model {
                id: 10,
                group_id: 1,
                description: "Dinner".into(),
                note: None,
                amount: dec!(100),
                currency: None,
                exchange_rate: dec!(1),
                paid_by: 1,
                receipt_image_url: None,
                receipt_items: None,
                attachments: None,
                created_at: ts,
            },
            shares: vec![
                expense_shares::Model {
                    id: 1,
                    expense_id: 10,
                    member_id: 1,
                    share: dec!(50),
                },
                expense_shares::Model {
                    id: 2,
                    expense_id: 10,
                    member_id: 3,
                    share: dec!(50),
                },
            ],
        }
    }

    #[test]
    fn test_response_defaults_currency_and_labels_members() {
        let names: MemberNames = [(MemberId::new(1), "Ana".to_string())].into_iter().collect();
        let response = to_response(expense_row(), "USD", &names);

        assert_eq!(response.currency, "USD");
        assert_eq!(response.paid_by_name, "Ana");
        assert_eq!(response.shares[1].member_name, "Unknown");
    }

    #[test]
    fn test_create_request_accepts_numbers() {
        let request: CreateExpenseRequest = serde_json::from_value(json!({
            "description": "Taxi",
            "amount": 12.5,
            "sharedWith": [1, 2],
        }))
        .unwrap();

        assert_eq!(request.amount, dec!(12.5));
        assert_eq!(request.shared_with, vec![MemberId::new(1), MemberId::new(2)]);
        assert!(request.custom_shares.is_empty());
        assert!(request.paid_by.is_none());
    }

    #[test]
    fn test_update_request_fields_are_optional() {
        let request: UpdateExpenseRequest = serde_json::from_value(json!({ "note": "" })).unwrap();
        assert!(request.amount.is_none());
        assert_eq!(request.note.as_deref(), Some(""));
    }
}
