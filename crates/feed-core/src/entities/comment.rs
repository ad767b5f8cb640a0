//! Comment entity and the viewer-local like counter

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{CommentId, PostId, UserId};

/// Comment entity as delivered by the collaborator API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub reply_to_comment_id: Option<CommentId>,
    pub reply_to_author_name: Option<String>,
    pub like_count: u32,
    /// Whether the requesting viewer has liked this comment; reported by the
    /// list endpoint so the like state can be seeded without a second query
    #[serde(default)]
    pub viewer_has_liked: bool,
}

impl Comment {
    /// Maximum accepted content length in characters
    pub const MAX_LENGTH: usize = 2000;

    /// Check if the comment has been edited
    #[inline]
    #[must_use]
    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    /// Check if the comment is a reply to another comment
    #[inline]
    #[must_use]
    pub fn is_reply(&self) -> bool {
        self.reply_to_comment_id.is_some()
    }

    /// Viewer-local like counter seeded from this comment
    #[must_use]
    pub fn like_state(&self) -> CommentLikeState {
        CommentLikeState {
            liked: self.viewer_has_liked,
            count: self.like_count,
        }
    }

    /// Truncated content preview (for notification payloads)
    #[must_use]
    pub fn preview(&self, max_len: usize) -> &str {
        if self.content.len() <= max_len {
            &self.content
        } else {
            let mut end = max_len;
            while !self.content.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &self.content[..end]
        }
    }
}

/// Outcome of flipping a comment like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    /// The viewer liked a comment they had not liked
    Liked,
    /// The viewer withdrew an existing like
    Unliked,
}

/// Per-comment, per-viewer like counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommentLikeState {
    pub liked: bool,
    pub count: u32,
}

impl CommentLikeState {
    /// Flip the viewer's like in place; the counter floors at zero
    pub fn toggle(&mut self) -> LikeToggle {
        if self.liked {
            self.liked = false;
            self.count = self.count.saturating_sub(1);
            LikeToggle::Unliked
        } else {
            self.liked = true;
            self.count += 1;
            LikeToggle::Liked
        }
    }
}

/// Structured reply linkage carried alongside a draft, never re-derived
/// from the content text server-side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTarget {
    pub comment_id: CommentId,
    pub author_id: UserId,
    pub author_name: String,
}

/// Outgoing comment before submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDraft {
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub reply_to: Option<ReplyTarget>,
}

impl CommentDraft {
    /// Create a top-level comment draft
    #[must_use]
    pub fn new(post_id: PostId, author_id: UserId, content: impl Into<String>) -> Self {
        Self {
            post_id,
            author_id,
            content: content.into(),
            reply_to: None,
        }
    }

    /// Create a reply draft
    #[must_use]
    pub fn reply(
        post_id: PostId,
        author_id: UserId,
        content: impl Into<String>,
        target: ReplyTarget,
    ) -> Self {
        Self {
            post_id,
            author_id,
            content: content.into(),
            reply_to: Some(target),
        }
    }

    /// Produce the content actually submitted to the collaborator API.
    ///
    /// Composer UIs prefix replies with `@author_name `; the prefix is a
    /// display convention and is stripped before submission, the linkage
    /// travels in `reply_to` instead. Rejects content that is empty after
    /// trimming or over [`Comment::MAX_LENGTH`].
    pub fn outgoing_content(&self) -> Result<String, DomainError> {
        let mut content = self.content.as_str();

        if let Some(target) = &self.reply_to {
            let prefix = format!("@{} ", target.author_name);
            if let Some(stripped) = content.strip_prefix(&prefix) {
                content = stripped;
            }
        }

        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::EmptyContent);
        }
        if content.chars().count() > Comment::MAX_LENGTH {
            return Err(DomainError::ContentTooLong {
                max: Comment::MAX_LENGTH,
            });
        }

        Ok(content.to_owned())
    }
}
