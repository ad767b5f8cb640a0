//! Side-effect payloads - XP grants and notifications
//!
//! The source of these used free strings for notification kinds and XP
//! reasons; here both are closed enums and the string encoding happens at
//! the collaborator API boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{CommentId, PostId, UserId};

/// Experience points granted when someone likes a post
pub const XP_POST_LIKED: u32 = 5;
/// Experience points granted when someone likes a comment
pub const XP_COMMENT_LIKED: u32 = 2;

/// Why experience points are granted or taken back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum XpReason {
    PostLiked,
    CommentLiked,
}

impl XpReason {
    /// The fixed amount attached to this reason
    #[must_use]
    pub fn amount(self) -> u32 {
        match self {
            Self::PostLiked => XP_POST_LIKED,
            Self::CommentLiked => XP_COMMENT_LIKED,
        }
    }

    /// Wire name used by the collaborator API
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PostLiked => "POST_LIKED",
            Self::CommentLiked => "COMMENT_LIKED",
        }
    }
}

/// All notification kinds the engine can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    /// Someone reacted to your post
    PostLiked,
    /// Someone commented on your post
    PostCommented,
    /// Someone replied to your comment
    CommentReplied,
    /// Someone liked your comment
    CommentLiked,
}

impl NotificationKind {
    /// Wire name used by the collaborator API
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PostLiked => "POST_LIKED",
            Self::PostCommented => "POST_COMMENTED",
            Self::CommentReplied => "COMMENT_REPLIED",
            Self::CommentLiked => "COMMENT_LIKED",
        }
    }
}

/// One notification to be delivered to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub to_user_id: UserId,
    pub actor_id: UserId,
    pub post_id: PostId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<CommentId>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Creation Helpers
// ============================================================================

impl Notification {
    /// Someone reacted to `to_user_id`'s post
    #[must_use]
    pub fn post_liked(to_user_id: UserId, actor_id: UserId, post_id: PostId) -> Self {
        Self {
            kind: NotificationKind::PostLiked,
            to_user_id,
            actor_id,
            post_id,
            comment_id: None,
            created_at: Utc::now(),
        }
    }

    /// Someone commented on `to_user_id`'s post
    #[must_use]
    pub fn post_commented(
        to_user_id: UserId,
        actor_id: UserId,
        post_id: PostId,
        comment_id: CommentId,
    ) -> Self {
        Self {
            kind: NotificationKind::PostCommented,
            to_user_id,
            actor_id,
            post_id,
            comment_id: Some(comment_id),
            created_at: Utc::now(),
        }
    }

    /// Someone replied to `to_user_id`'s comment
    #[must_use]
    pub fn comment_replied(
        to_user_id: UserId,
        actor_id: UserId,
        post_id: PostId,
        comment_id: CommentId,
    ) -> Self {
        Self {
            kind: NotificationKind::CommentReplied,
            to_user_id,
            actor_id,
            post_id,
            comment_id: Some(comment_id),
            created_at: Utc::now(),
        }
    }

    /// Someone liked `to_user_id`'s comment
    #[must_use]
    pub fn comment_liked(
        to_user_id: UserId,
        actor_id: UserId,
        post_id: PostId,
        comment_id: CommentId,
    ) -> Self {
        Self {
            kind: NotificationKind::CommentLiked,
            to_user_id,
            actor_id,
            post_id,
            comment_id: Some(comment_id),
            created_at: Utc::now(),
        }
    }
}
