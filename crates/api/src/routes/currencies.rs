//! Currency listing route.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{AppState, middleware::AuthUser};
use spendbee_core::currency::{ANCHOR_CURRENCY, RateTable};
use spendbee_shared::types::SUPPORTED_CURRENCIES;

/// Creates the currency routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/currencies", get(list_currencies))
}

/// Supported codes and the rate table in use.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrenciesResponse {
    /// Codes accepted for groups, expenses and settlements.
    pub supported: Vec<&'static str>,
    /// Currency every rate is relative to.
    pub anchor: &'static str,
    /// Current rates, keyed by code.
    pub rates: RateTable,
    /// When the cached table was fetched; `None` when serving the fallback.
    pub fetched_at: Option<DateTime<Utc>>,
}

/// GET `/currencies`
async fn list_currencies(State(state): State<AppState>, _auth: AuthUser) -> Json<CurrenciesResponse> {
    let rates = state.rates.get_rates().await;
    let fetched_at = state.rates.snapshot().await.fetched_at();

    Json(CurrenciesResponse {
        supported: SUPPORTED_CURRENCIES.to_vec(),
        anchor: ANCHOR_CURRENCY,
        rates,
        fetched_at,
    })
}
