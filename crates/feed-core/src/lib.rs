//! # feed-core
//!
//! Domain layer for the feed interaction engine: entities, value objects,
//! collaborator ports, and domain errors. This crate has zero dependencies
//! on infrastructure (HTTP client, WebSocket transport, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Comment, CommentDraft, CommentLikeState, LikeToggle, ReactionState, ReactionToggle,
    ReplyTarget,
};
pub use error::DomainError;
pub use events::{
    EntityUpdate, Notification, NotificationKind, XpReason, XP_COMMENT_LIKED, XP_POST_LIKED,
};
pub use traits::{
    EntityFeed, FeedError, FeedResult, GatewayError, GatewayResult, MutationGateway,
    NotificationSink, SinkError, SinkResult, XpSink,
};
pub use value_objects::{CommentId, IdParseError, PostId, UserId};
