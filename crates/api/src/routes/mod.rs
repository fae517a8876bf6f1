//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod account;
pub mod activity;
pub mod auth;
pub mod balances;
pub mod currencies;
pub mod expenses;
pub mod groups;
pub mod health;
pub mod members;
pub mod notifications;
pub mod settlements;

#[cfg(test)]
mod tests;

/// Creates the API router: health and auth are public, everything else
/// sits behind the session check.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(account::routes())
        .merge(groups::routes())
        .merge(members::routes())
        .merge(expenses::routes())
        .merge(settlements::routes())
        .merge(balances::routes())
        .merge(activity::routes())
        .merge(notifications::routes())
        .merge(currencies::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}
