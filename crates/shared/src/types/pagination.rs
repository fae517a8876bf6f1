//! Limits for feed-style list endpoints.

use serde::{Deserialize, Serialize};

/// Default number of feed items returned when no limit is given.
pub const DEFAULT_FEED_LIMIT: u64 = 50;

/// Hard upper bound on feed items per request.
pub const MAX_FEED_LIMIT: u64 = 200;

/// Query parameters for newest-first feeds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedLimit {
    /// Requested number of items.
    pub limit: Option<u64>,
}

impl FeedLimit {
    /// Returns the limit to apply to the query.
    ///
    /// Missing or zero requests fall back to the default; large ones are
    /// clamped to [`MAX_FEED_LIMIT`].
    #[must_use]
    pub fn effective(&self) -> u64 {
        match self.limit {
            None | Some(0) => DEFAULT_FEED_LIMIT,
            Some(n) => n.min(MAX_FEED_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limit() {
        assert_eq!(FeedLimit::default().effective(), 50);
        assert_eq!(FeedLimit { limit: Some(0) }.effective(), 50);
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(FeedLimit { limit: Some(10) }.effective(), 10);
        assert_eq!(FeedLimit { limit: Some(200) }.effective(), 200);
        assert_eq!(FeedLimit { limit: Some(5000) }.effective(), 200);
    }
}
