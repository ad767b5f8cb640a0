//! Fire-and-forget sinks for secondary effects
//!
//! Only the side-effect dispatcher calls these; failures are logged there
//! and never influence the primary mutation. Idempotency ("award once per
//! like") is the collaborator's responsibility.

use async_trait::async_trait;

use crate::events::{Notification, XpReason};
use crate::value_objects::UserId;

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Sink delivery errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected: {0}")]
    Rejected(String),
}

/// Experience-point mutation sink
#[async_trait]
pub trait XpSink: Send + Sync {
    /// Grant experience points
    async fn award(&self, user_id: UserId, amount: u32, reason: XpReason) -> SinkResult<()>;

    /// Take back previously granted experience points
    async fn deduct(&self, user_id: UserId, amount: u32, reason: XpReason) -> SinkResult<()>;
}

/// Notification creation sink
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification
    async fn deliver(&self, notification: Notification) -> SinkResult<()>;
}
