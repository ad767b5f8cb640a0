//! Request DTOs for comment operations
//!
//! All request DTOs implement `Deserialize` and `Validate` for input
//! validation before anything leaves the client.

use feed_core::CommentId;
use serde::Deserialize;
use validator::Validate;

/// Create comment request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "Comment must be 1-2000 characters"))]
    pub content: String,

    /// Comment being replied to, passed as a structured field and never
    /// re-derived from the content text
    pub reply_to_comment_id: Option<CommentId>,

    /// Display name used by the composer's `@name ` reply prefix
    pub reply_to_author_name: Option<String>,
}

impl CreateCommentRequest {
    /// A top-level comment
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            reply_to_comment_id: None,
            reply_to_author_name: None,
        }
    }

    /// A reply to an existing comment
    #[must_use]
    pub fn reply(
        content: impl Into<String>,
        reply_to_comment_id: CommentId,
        reply_to_author_name: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            reply_to_comment_id: Some(reply_to_comment_id),
            reply_to_author_name: Some(reply_to_author_name.into()),
        }
    }

    /// Whether this request is a reply
    #[inline]
    #[must_use]
    pub fn is_reply(&self) -> bool {
        self.reply_to_comment_id.is_some()
    }
}

/// Edit comment request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EditCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "Comment must be 1-2000 characters"))]
    pub content: String,
}
