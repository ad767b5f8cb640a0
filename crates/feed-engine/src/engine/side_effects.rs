//! Side-effect dispatcher
//!
//! Fires the secondary, non-authoritative operations (experience points,
//! notifications) that follow a confirmed primary mutation. Every call here
//! happens strictly after primary success; each remote call is awaited
//! independently and a failure is logged and swallowed, so one sink going
//! down can neither block the other nor surface to the user.

use std::sync::Arc;

use feed_core::{
    Comment, CommentId, Notification, NotificationSink, PostId, ReplyTarget, UserId, XpReason,
    XpSink,
};
use tracing::{instrument, warn};

/// Dispatcher for best-effort secondary effects
pub struct SideEffectDispatcher {
    xp: Arc<dyn XpSink>,
    notifications: Arc<dyn NotificationSink>,
}

impl SideEffectDispatcher {
    /// Create a new dispatcher
    #[must_use]
    pub fn new(xp: Arc<dyn XpSink>, notifications: Arc<dyn NotificationSink>) -> Self {
        Self { xp, notifications }
    }

    /// A confirmed new reaction landed on someone else's post: XP for the
    /// post owner plus a "liked your post" notification
    #[instrument(skip(self))]
    pub async fn post_liked(&self, post_owner_id: UserId, viewer_id: UserId, post_id: PostId) {
        let reason = XpReason::PostLiked;
        if let Err(e) = self.xp.award(post_owner_id, reason.amount(), reason).await {
            warn!(user_id = %post_owner_id, error = %e, "XP award failed");
        }

        let notification = Notification::post_liked(post_owner_id, viewer_id, post_id);
        if let Err(e) = self.notifications.deliver(notification).await {
            warn!(user_id = %post_owner_id, error = %e, "Notification delivery failed");
        }
    }

    /// A confirmed like on someone else's comment: XP for the comment
    /// author plus a "liked your comment" notification
    #[instrument(skip(self))]
    pub async fn comment_liked(
        &self,
        comment_author_id: UserId,
        viewer_id: UserId,
        post_id: PostId,
        comment_id: CommentId,
    ) {
        let reason = XpReason::CommentLiked;
        if let Err(e) = self.xp.award(comment_author_id, reason.amount(), reason).await {
            warn!(user_id = %comment_author_id, error = %e, "XP award failed");
        }

        let notification =
            Notification::comment_liked(comment_author_id, viewer_id, post_id, comment_id);
        if let Err(e) = self.notifications.deliver(notification).await {
            warn!(user_id = %comment_author_id, error = %e, "Notification delivery failed");
        }
    }

    /// A confirmed unlike of someone else's comment takes the XP back; no
    /// notification is sent for withdrawals
    #[instrument(skip(self))]
    pub async fn comment_unliked(&self, comment_author_id: UserId, comment_id: CommentId) {
        let reason = XpReason::CommentLiked;
        if let Err(e) = self.xp.deduct(comment_author_id, reason.amount(), reason).await {
            warn!(user_id = %comment_author_id, error = %e, "XP deduction failed");
        }
    }

    /// A confirmed comment: "commented on your post" for the post owner
    /// (unless the author commented on their own post), and additionally
    /// "replied to your comment" when the comment is a reply to someone
    /// else. The two deliveries are independent.
    #[instrument(skip(self, comment, reply_to))]
    pub async fn comment_created(
        &self,
        post_owner_id: UserId,
        author_id: UserId,
        comment: &Comment,
        reply_to: Option<&ReplyTarget>,
    ) {
        if post_owner_id != author_id {
            let notification = Notification::post_commented(
                post_owner_id,
                author_id,
                comment.post_id,
                comment.id,
            );
            if let Err(e) = self.notifications.deliver(notification).await {
                warn!(user_id = %post_owner_id, error = %e, "Notification delivery failed");
            }
        }

        if let Some(target) = reply_to {
            if target.author_id != author_id {
                let notification = Notification::comment_replied(
                    target.author_id,
                    author_id,
                    comment.post_id,
                    comment.id,
                );
                if let Err(e) = self.notifications.deliver(notification).await {
                    warn!(user_id = %target.author_id, error = %e, "Notification delivery failed");
                }
            }
        }
    }
}

impl std::fmt::Debug for SideEffectDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SideEffectDispatcher").finish()
    }
}
