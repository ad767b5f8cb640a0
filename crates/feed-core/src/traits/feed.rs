//! Entity feed port - control plane of the real-time counter subscription

use async_trait::async_trait;

use crate::value_objects::PostId;

/// Result type for feed operations
pub type FeedResult<T> = Result<T, FeedError>;

/// Feed subscription errors
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed connection closed")]
    Closed,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Subscription control for the push feed of authoritative counters.
///
/// The data plane is a broadcast stream of [`crate::EntityUpdate`] frames
/// handed to the reconciliation listener by the implementation; this trait
/// only starts and stops per-entity delivery. Subscriptions must be released
/// when the entity leaves scope.
#[async_trait]
pub trait EntityFeed: Send + Sync {
    /// Start delivering updates for this post
    async fn subscribe(&self, entity_id: PostId) -> FeedResult<()>;

    /// Stop delivering updates for this post
    async fn unsubscribe(&self, entity_id: PostId) -> FeedResult<()>;
}
