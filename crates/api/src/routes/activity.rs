//! Activity feed route.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::Utc;

use crate::{AppState, error::ApiResult, middleware::AuthUser};
use spendbee_core::activity::{FeedItem, format_activity};
use spendbee_db::repositories::ActivityRepository;
use spendbee_shared::types::FeedLimit;

/// Creates the activity routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/activity", get(get_feed))
}

/// GET `/activity?limit=` - Recent events across the caller's groups.
async fn get_feed(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(limit): Query<FeedLimit>,
) -> ApiResult<Json<Vec<FeedItem>>> {
    let feed = ActivityRepository::new((*state.db).clone())
        .feed_for_user(auth.user_id(), limit.effective())
        .await?;

    let today = Utc::now().date_naive();
    Ok(Json(
        feed.records
            .iter()
            .map(|record| format_activity(record, &feed.viewer_members, today))
            .collect(),
    ))
}
