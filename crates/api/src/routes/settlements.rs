//! Settlement routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    access::require_member,
    error::ApiResult,
    middleware::AuthUser,
    routes::expenses::{MemberNames, capture_rate, member_names, name_of},
};
use spendbee_core::expense::validate_settlement;
use spendbee_db::entities::settlements;
use spendbee_db::repositories::{CreateSettlementInput, MemberRepository, SettlementRepository};
use spendbee_shared::types::{GroupId, MemberId, SettlementId, currency_or};

/// Creates the settlement routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/groups/{group_id}/settlements",
        get(list_settlements).post(create_settlement),
    )
}

/// A recorded payment between two members.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    /// Settlement ID.
    pub id: SettlementId,
    /// Paying member.
    pub from_member_id: MemberId,
    /// Payer's display name.
    pub from_member_name: String,
    /// Receiving member.
    pub to_member_id: MemberId,
    /// Receiver's display name.
    pub to_member_name: String,
    /// Amount paid.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Rate to the base currency captured at creation.
    #[serde(with = "rust_decimal::serde::float")]
    pub exchange_rate: Decimal,
    /// Payment time.
    pub created_at: DateTime<Utc>,
}

fn to_response(row: settlements::Model, base_currency: &str, names: &MemberNames) -> SettlementResponse {
    let from = MemberId::new(row.from_member_id);
    let to = MemberId::new(row.to_member_id);
    SettlementResponse {
        id: SettlementId::new(row.id),
        from_member_id: from,
        from_member_name: name_of(names, from),
        to_member_id: to,
        to_member_name: name_of(names, to),
        amount: row.amount,
        currency: currency_or(row.currency.as_deref(), base_currency),
        exchange_rate: row.exchange_rate,
        created_at: row.created_at.with_timezone(&Utc),
    }
}

/// Request to record a settlement.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSettlementRequest {
    /// Paying member.
    pub from_member_id: MemberId,
    /// Receiving member.
    pub to_member_id: MemberId,
    /// Amount paid.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Currency; the group's base currency if unset.
    pub currency: Option<String>,
}

/// GET `/groups/{group_id}/settlements` - Settlements newest first.
async fn list_settlements(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
) -> ApiResult<Json<Vec<SettlementResponse>>> {
    let access = require_member(&state.db, group_id, auth.user_id()).await?;
    let base_currency = access.base_currency();

    let rows = SettlementRepository::new((*state.db).clone())
        .list_for_group(group_id)
        .await?;
    let names = member_names(&state, group_id).await?;

    Ok(Json(
        rows.into_iter()
            .map(|s| to_response(s, &base_currency, &names))
            .collect(),
    ))
}

/// POST `/groups/{group_id}/settlements` - Record a payment.
async fn create_settlement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<GroupId>,
    Json(payload): Json<CreateSettlementRequest>,
) -> ApiResult<impl IntoResponse> {
    let access = require_member(&state.db, group_id, auth.user_id()).await?;
    access.require_active()?;
    let base_currency = access.base_currency();
    let currency = currency_or(payload.currency.as_deref(), &base_currency);

    let member_ids = MemberRepository::new((*state.db).clone())
        .member_ids(group_id)
        .await?;
    validate_settlement(
        payload.from_member_id,
        payload.to_member_id,
        payload.amount,
        &currency,
        &member_ids,
    )?;
    let exchange_rate = capture_rate(&state, &currency, &base_currency).await?;

    let settlement = SettlementRepository::new((*state.db).clone())
        .create(CreateSettlementInput {
            group_id,
            actor: access.member_id(),
            from: payload.from_member_id,
            to: payload.to_member_id,
            amount: payload.amount,
            currency,
            exchange_rate,
        })
        .await?;

    let names = member_names(&state, group_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(to_response(settlement, &base_currency, &names)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use rust_decimal_macros::dec;

    #[test]
    fn test_response_names_both_sides() {
        let row = settlements::Model {
            id: 4,
            group_id: 1,
            from_member_id: 2,
            to_member_id: 1,
            amount: dec!(50),
            currency: Some("USD".into()),
            exchange_rate: dec!(0.8),
            created_at: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2026, 3, 2, 8, 0, 0)
                .unwrap(),
        };
        let names: MemberNames = [
            (MemberId::new(1), "Ana".to_string()),
            (MemberId::new(2), "Bob (guest)".to_string()),
        ]
        .into_iter()
        .collect();

        let response = to_response(row, "EUR", &names);
        assert_eq!(response.from_member_name, "Bob (guest)");
        assert_eq!(response.to_member_name, "Ana");
        assert_eq!(response.currency, "USD");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["fromMemberId"], 2);
        assert_eq!(json["amount"], 50.0);
    }
}
