//! Comment controller - one post's comment thread and like counters
//!
//! Like toggles are optimistic with exact-snapshot rollback, exactly like
//! post reactions. Create, edit, and delete are not: they wait for
//! confirmation and then replace the cached thread with the canonical list
//! from the collaborator, so there is never a speculative placeholder to
//! reconcile.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use feed_core::{
    Comment, CommentDraft, CommentId, CommentLikeState, DomainError, LikeToggle, PostId,
    ReplyTarget, UserId,
};

use crate::dto::{CreateCommentRequest, EditCommentRequest};

use super::context::EngineContext;
use super::error::{
    EngineError, EngineResult, MSG_COMMENT_CREATE, MSG_COMMENT_DELETE, MSG_COMMENT_EDIT,
    MSG_COMMENT_LIKE, MSG_COMMENT_LIST,
};
use super::pending::{OperationKind, Snapshot};

/// Cached thread state guarded by the controller's lock.
///
/// `likes` is the display source for per-comment counters; `comments` keeps
/// the server's ordering and metadata. The lock is never held across an
/// await.
struct CommentThread {
    comments: Vec<Comment>,
    likes: HashMap<CommentId, CommentLikeState>,
}

/// Controller for one post's comment thread
pub struct CommentController {
    post_id: PostId,
    post_owner_id: UserId,
    viewer_id: UserId,
    ctx: EngineContext,
    thread: Mutex<CommentThread>,
}

impl CommentController {
    /// Create a controller seeded with the comments the post rendered with
    #[must_use]
    pub fn new(
        post_id: PostId,
        post_owner_id: UserId,
        viewer_id: UserId,
        initial: Vec<Comment>,
        ctx: EngineContext,
    ) -> Self {
        let likes = initial.iter().map(|c| (c.id, c.like_state())).collect();
        Self {
            post_id,
            post_owner_id,
            viewer_id,
            ctx,
            thread: Mutex::new(CommentThread {
                comments: initial,
                likes,
            }),
        }
    }

    /// The post this thread belongs to
    #[inline]
    #[must_use]
    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    /// Current cached comment list, in server order
    #[must_use]
    pub fn comments(&self) -> Vec<Comment> {
        self.thread.lock().comments.clone()
    }

    /// Current like counter for one comment
    #[must_use]
    pub fn like_state(&self, comment_id: CommentId) -> Option<CommentLikeState> {
        self.thread.lock().likes.get(&comment_id).copied()
    }

    /// Toggle the viewer's like on a comment.
    ///
    /// The flip is applied immediately; a remote failure restores the exact
    /// prior counter. A toggle issued while one is outstanding for the same
    /// comment is a no-op returning the unchanged state.
    #[instrument(skip(self), fields(post_id = %self.post_id))]
    pub async fn toggle_like(&self, comment_id: CommentId) -> EngineResult<CommentLikeState> {
        let (author_id, toggle) = {
            let mut guard = self.thread.lock();
            let thread = &mut *guard;
            let comment = thread
                .comments
                .iter()
                .find(|c| c.id == comment_id)
                .ok_or(DomainError::CommentNotFound(comment_id))?;
            let author_id = comment.author_id;
            let seed = comment.like_state();

            let entry = thread.likes.entry(comment_id).or_insert(seed);
            let prior = Snapshot::CommentLike(*entry);
            if !self
                .ctx
                .pending()
                .begin(comment_id, OperationKind::CommentLikeToggle, prior)
            {
                debug!(comment_id = %comment_id, "like toggle already in flight, ignoring");
                return Ok(*entry);
            }
            (author_id, entry.toggle())
        };

        let result = self
            .ctx
            .gateway()
            .toggle_comment_like(comment_id, self.viewer_id)
            .await;

        let state = {
            let mut thread = self.thread.lock();
            let pending = self
                .ctx
                .pending()
                .settle(comment_id, OperationKind::CommentLikeToggle);

            if result.is_err() {
                if let Some(pending) = pending {
                    if let Snapshot::CommentLike(prior) = pending.prior {
                        thread.likes.insert(comment_id, prior);
                    }
                }
            }

            thread.likes.get(&comment_id).copied().unwrap_or_default()
        };

        match result {
            Ok(()) => {
                info!(comment_id = %comment_id, liked = state.liked, "Comment like toggled");
                if author_id != self.viewer_id {
                    match toggle {
                        LikeToggle::Liked => {
                            self.ctx
                                .dispatcher()
                                .comment_liked(author_id, self.viewer_id, self.post_id, comment_id)
                                .await;
                        }
                        LikeToggle::Unliked => {
                            self.ctx
                                .dispatcher()
                                .comment_unliked(author_id, comment_id)
                                .await;
                        }
                    }
                }
                Ok(state)
            }
            Err(e) => {
                warn!(comment_id = %comment_id, error = %e, "Comment like failed, state rolled back");
                Err(EngineError::remote(MSG_COMMENT_LIKE, e))
            }
        }
    }

    /// Submit a new comment.
    ///
    /// The composer's `@name ` reply prefix is stripped before submission;
    /// reply linkage travels as structured fields. Returns `None` when an
    /// identical submit is already in flight. A remote failure changes
    /// nothing locally, so the composer's input stays intact for retry.
    #[instrument(skip(self, request), fields(post_id = %self.post_id))]
    pub async fn create_comment(
        &self,
        request: CreateCommentRequest,
    ) -> EngineResult<Option<Comment>> {
        request
            .validate()
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;

        let reply_to = match request.reply_to_comment_id {
            Some(target_id) => {
                let thread = self.thread.lock();
                let target = thread
                    .comments
                    .iter()
                    .find(|c| c.id == target_id)
                    .ok_or(DomainError::CommentNotFound(target_id))?;
                Some(ReplyTarget {
                    comment_id: target.id,
                    author_id: target.author_id,
                    author_name: request.reply_to_author_name.clone().unwrap_or_default(),
                })
            }
            None => None,
        };

        let mut draft = match reply_to.clone() {
            Some(target) => {
                CommentDraft::reply(self.post_id, self.viewer_id, request.content, target)
            }
            None => CommentDraft::new(self.post_id, self.viewer_id, request.content),
        };
        draft.content = draft.outgoing_content()?;

        if !self
            .ctx
            .pending()
            .begin(self.post_id, OperationKind::CommentCreate, Snapshot::None)
        {
            debug!("comment create already in flight, ignoring");
            return Ok(None);
        }

        let result = self.ctx.gateway().create_comment(&draft).await;
        self.ctx
            .pending()
            .settle(self.post_id, OperationKind::CommentCreate);

        match result {
            Ok(comment) => {
                info!(comment_id = %comment.id, "Comment created");
                self.refresh_or(|thread| {
                    if !thread.comments.iter().any(|c| c.id == comment.id) {
                        thread.comments.push(comment.clone());
                        thread.likes.insert(comment.id, comment.like_state());
                    }
                })
                .await;

                self.ctx
                    .dispatcher()
                    .comment_created(
                        self.post_owner_id,
                        self.viewer_id,
                        &comment,
                        reply_to.as_ref(),
                    )
                    .await;

                Ok(Some(comment))
            }
            Err(e) => Err(EngineError::remote(MSG_COMMENT_CREATE, e)),
        }
    }

    /// Edit a comment's content.
    ///
    /// No optimistic mutation: author-only enforcement lives in the
    /// collaborator API, and a 403-equivalent is fatal for this action.
    /// Returns `None` when an edit for this comment is already in flight.
    #[instrument(skip(self, request), fields(post_id = %self.post_id))]
    pub async fn edit_comment(
        &self,
        comment_id: CommentId,
        request: EditCommentRequest,
    ) -> EngineResult<Option<Comment>> {
        request
            .validate()
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        let content = request.content.trim().to_owned();

        if !self
            .ctx
            .pending()
            .begin(comment_id, OperationKind::CommentEdit, Snapshot::None)
        {
            debug!(comment_id = %comment_id, "comment edit already in flight, ignoring");
            return Ok(None);
        }

        let result = self
            .ctx
            .gateway()
            .edit_comment(comment_id, self.viewer_id, &content)
            .await;
        self.ctx
            .pending()
            .settle(comment_id, OperationKind::CommentEdit);

        match result {
            Ok(comment) => {
                info!(comment_id = %comment_id, "Comment edited");
                self.refresh_or(|thread| {
                    if let Some(cached) = thread.comments.iter_mut().find(|c| c.id == comment.id) {
                        *cached = comment.clone();
                    }
                })
                .await;
                Ok(Some(comment))
            }
            Err(e) => {
                warn!(comment_id = %comment_id, error = %e, "Comment edit failed");
                Err(EngineError::remote(MSG_COMMENT_EDIT, e))
            }
        }
    }

    /// Delete a comment.
    ///
    /// Same confirmation-first shape as edit. Returns `false` when a delete
    /// for this comment is already in flight.
    #[instrument(skip(self), fields(post_id = %self.post_id))]
    pub async fn delete_comment(&self, comment_id: CommentId) -> EngineResult<bool> {
        if !self
            .ctx
            .pending()
            .begin(comment_id, OperationKind::CommentDelete, Snapshot::None)
        {
            debug!(comment_id = %comment_id, "comment delete already in flight, ignoring");
            return Ok(false);
        }

        let result = self
            .ctx
            .gateway()
            .delete_comment(comment_id, self.viewer_id)
            .await;
        self.ctx
            .pending()
            .settle(comment_id, OperationKind::CommentDelete);

        match result {
            Ok(()) => {
                info!(comment_id = %comment_id, "Comment deleted");
                self.refresh_or(|thread| {
                    thread.comments.retain(|c| c.id != comment_id);
                    thread.likes.remove(&comment_id);
                })
                .await;
                Ok(true)
            }
            Err(e) => {
                warn!(comment_id = %comment_id, error = %e, "Comment delete failed");
                Err(EngineError::remote(MSG_COMMENT_DELETE, e))
            }
        }
    }

    /// Replace the cached thread with the canonical list from the
    /// collaborator.
    ///
    /// Like counters are reseeded from the fetched comments, except for a
    /// comment whose like toggle is currently in flight: its speculative
    /// counter stays, the toggle's own settle path owns that rollback.
    #[instrument(skip(self), fields(post_id = %self.post_id))]
    pub async fn refresh(&self) -> EngineResult<Vec<Comment>> {
        let comments = self
            .ctx
            .gateway()
            .list_comments(self.post_id, self.viewer_id)
            .await
            .map_err(|e| EngineError::remote(MSG_COMMENT_LIST, e))?;

        let mut guard = self.thread.lock();
        let thread = &mut *guard;
        thread.comments = comments.clone();

        let mut likes = HashMap::with_capacity(thread.comments.len());
        for comment in &thread.comments {
            let state = if self
                .ctx
                .pending()
                .is_pending(comment.id, OperationKind::CommentLikeToggle)
            {
                thread
                    .likes
                    .get(&comment.id)
                    .copied()
                    .unwrap_or_else(|| comment.like_state())
            } else {
                comment.like_state()
            };
            likes.insert(comment.id, state);
        }
        thread.likes = likes;

        Ok(comments)
    }

    /// Refresh the thread after a confirmed mutation, falling back to a
    /// local patch when the refetch itself fails. The primary mutation is
    /// already correct server-side, so a refetch failure is logged, not
    /// surfaced.
    async fn refresh_or(&self, patch: impl FnOnce(&mut CommentThread)) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Comment list refresh failed, patching local cache");
            let mut thread = self.thread.lock();
            patch(&mut thread);
        }
    }
}

impl std::fmt::Debug for CommentController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentController")
            .field("post_id", &self.post_id)
            .field("viewer_id", &self.viewer_id)
            .finish()
    }
}
