//! Group activity feed.

pub mod format;

pub use format::{
    ActivityKind, ActivityMetadata, ActivityParty, ActivityRecord, FeedItem, date_label,
    format_activity, label_member, member_label,
};
