//! Mutation gateway port - the single entry point for primary mutations

use async_trait::async_trait;

use crate::entities::{Comment, CommentDraft};
use crate::value_objects::{CommentId, PostId, UserId};

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Typed failure of a remote primary mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected by server ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("not authorized to perform this operation")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(String),
}

impl GatewayError {
    /// Check if this is a 403-equivalent authorization failure
    #[must_use]
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Whether retrying the same request can reasonably succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Transport(_) | Self::Rejected { .. } => true,
            Self::Unauthorized | Self::NotFound(_) => false,
        }
    }
}

/// Thin client for the named remote mutations the engine performs.
///
/// Every method resolves to either a confirmed result or a typed failure;
/// toggles are server-side idempotent pairs (calling twice with the same
/// arguments returns to the original state).
#[async_trait]
pub trait MutationGateway: Send + Sync {
    /// Toggle the viewer's reaction on a post
    async fn toggle_reaction(
        &self,
        post_id: PostId,
        viewer_id: UserId,
        emoji: &str,
    ) -> GatewayResult<()>;

    /// Toggle the viewer's like on a comment
    async fn toggle_comment_like(
        &self,
        comment_id: CommentId,
        viewer_id: UserId,
    ) -> GatewayResult<()>;

    /// Create a comment from a prepared draft, returning the persisted
    /// entity. The draft's content is expected to already be the outgoing
    /// form ([`CommentDraft::outgoing_content`]).
    async fn create_comment(&self, draft: &CommentDraft) -> GatewayResult<Comment>;

    /// Edit a comment's content (author-only, enforced server-side)
    async fn edit_comment(
        &self,
        comment_id: CommentId,
        editor_id: UserId,
        content: &str,
    ) -> GatewayResult<Comment>;

    /// Delete a comment (author-only, enforced server-side)
    async fn delete_comment(&self, comment_id: CommentId, editor_id: UserId) -> GatewayResult<()>;

    /// Fetch the canonical ordered comment list for a post
    async fn list_comments(&self, post_id: PostId, viewer_id: UserId)
        -> GatewayResult<Vec<Comment>>;
}
