//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::{CommentId, PostId};

/// Domain layer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Post not found: {0}")]
    PostNotFound(PostId),

    #[error("Comment not found: {0}")]
    CommentNotFound(CommentId),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Comment content is empty")]
    EmptyContent,

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Invalid emoji key: {0}")]
    InvalidEmoji(String),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Not comment author")]
    NotCommentAuthor,
}

impl DomainError {
    /// Get an error code string for API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::PostNotFound(_) => "UNKNOWN_POST",
            Self::CommentNotFound(_) => "UNKNOWN_COMMENT",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::EmptyContent => "EMPTY_CONTENT",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::InvalidEmoji(_) => "INVALID_EMOJI",
            Self::NotCommentAuthor => "NOT_COMMENT_AUTHOR",
        }
    }

    /// Check if this is a "not found" error
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PostNotFound(_) | Self::CommentNotFound(_))
    }

    /// Check if this is a validation error
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::EmptyContent
                | Self::ContentTooLong { .. }
                | Self::InvalidEmoji(_)
        )
    }

    /// Check if this is an authorization error
    #[must_use]
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::NotCommentAuthor)
    }
}
