//! Test fixtures and scripted collaborators
//!
//! In-memory implementations of the engine's collaborator ports with
//! failure scripting, call counting, and a hold gate for exercising
//! in-flight interleavings.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::{broadcast, Notify};

use feed_core::{
    Comment, CommentDraft, CommentId, EntityFeed, EntityUpdate, FeedResult, GatewayError,
    GatewayResult, MutationGateway, Notification, NotificationSink, PostId, ReactionState,
    SinkError, SinkResult, UserId, XpReason, XpSink,
};

/// Build a reaction state from (emoji, count) pairs
pub fn reaction_state(pairs: &[(&str, u32)], viewer: Option<&str>) -> ReactionState {
    ReactionState::new(
        pairs.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect(),
        viewer.map(str::to_owned),
    )
}

/// Build an update frame for a post
pub fn update(post_id: PostId, pairs: &[(&str, u32)], total_count: u32) -> EntityUpdate {
    EntityUpdate::new(
        post_id,
        pairs.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect(),
        total_count,
    )
}

/// Build a stored comment
pub fn comment(post_id: PostId, author_id: UserId, content: &str, like_count: u32) -> Comment {
    Comment {
        id: CommentId::generate(),
        post_id,
        author_id,
        content: content.to_owned(),
        created_at: Utc::now(),
        edited_at: None,
        reply_to_comment_id: None,
        reply_to_author_name: None,
        like_count,
        viewer_has_liked: false,
    }
}

// ============================================================================
// Scripted gateway
// ============================================================================

/// Mutation gateway fake with per-call failure scripting and a hold gate
#[derive(Default)]
pub struct ScriptedGateway {
    comments: Mutex<Vec<Comment>>,
    reaction_calls: AtomicUsize,
    like_calls: AtomicUsize,
    create_calls: AtomicUsize,
    fail_next: Mutex<Option<GatewayError>>,
    holding: AtomicBool,
    entered: Notify,
    gate: Notify,
}

impl ScriptedGateway {
    /// Make the next mutation call fail with this error
    pub fn fail_next(&self, error: GatewayError) {
        *self.fail_next.lock() = Some(error);
    }

    /// Park the next mutation call until [`Self::release`]
    pub fn hold(&self) {
        self.holding.store(true, Ordering::SeqCst);
    }

    /// Let a held call proceed
    pub fn release(&self) {
        self.holding.store(false, Ordering::SeqCst);
        self.gate.notify_one();
    }

    /// Wait until a held call has arrived at the gate
    pub async fn wait_for_call(&self) {
        self.entered.notified().await;
    }

    pub fn reaction_calls(&self) -> usize {
        self.reaction_calls.load(Ordering::SeqCst)
    }

    pub fn like_calls(&self) -> usize {
        self.like_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Seed a stored comment
    pub fn push_comment(&self, comment: Comment) {
        self.comments.lock().push(comment);
    }

    /// Snapshot of the stored comments
    pub fn stored_comments(&self) -> Vec<Comment> {
        self.comments.lock().clone()
    }

    async fn maybe_hold(&self) {
        if self.holding.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.gate.notified().await;
        }
    }

    fn take_failure(&self) -> GatewayResult<()> {
        match self.fail_next.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MutationGateway for ScriptedGateway {
    async fn toggle_reaction(
        &self,
        _post_id: PostId,
        _viewer_id: UserId,
        _emoji: &str,
    ) -> GatewayResult<()> {
        self.reaction_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_hold().await;
        self.take_failure()
    }

    async fn toggle_comment_like(
        &self,
        _comment_id: CommentId,
        _viewer_id: UserId,
    ) -> GatewayResult<()> {
        self.like_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_hold().await;
        self.take_failure()
    }

    async fn create_comment(&self, draft: &CommentDraft) -> GatewayResult<Comment> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_hold().await;
        self.take_failure()?;

        let created = Comment {
            id: CommentId::generate(),
            post_id: draft.post_id,
            author_id: draft.author_id,
            content: draft.content.clone(),
            created_at: Utc::now(),
            edited_at: None,
            reply_to_comment_id: draft.reply_to.as_ref().map(|t| t.comment_id),
            reply_to_author_name: draft.reply_to.as_ref().map(|t| t.author_name.clone()),
            like_count: 0,
            viewer_has_liked: false,
        };
        self.comments.lock().push(created.clone());
        Ok(created)
    }

    async fn edit_comment(
        &self,
        comment_id: CommentId,
        _editor_id: UserId,
        content: &str,
    ) -> GatewayResult<Comment> {
        self.take_failure()?;

        let mut comments = self.comments.lock();
        let stored = comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| GatewayError::NotFound("Comment".to_owned()))?;
        stored.content = content.to_owned();
        stored.edited_at = Some(Utc::now());
        Ok(stored.clone())
    }

    async fn delete_comment(&self, comment_id: CommentId, _editor_id: UserId) -> GatewayResult<()> {
        self.take_failure()?;
        self.comments.lock().retain(|c| c.id != comment_id);
        Ok(())
    }

    async fn list_comments(
        &self,
        post_id: PostId,
        _viewer_id: UserId,
    ) -> GatewayResult<Vec<Comment>> {
        Ok(self
            .comments
            .lock()
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Recording sinks
// ============================================================================

/// XP sink recording accepted calls; optionally failing all of them
#[derive(Default)]
pub struct RecordingXp {
    awards: Mutex<Vec<(UserId, u32, XpReason)>>,
    deductions: Mutex<Vec<(UserId, u32, XpReason)>>,
    fail: bool,
}

impl RecordingXp {
    /// A sink whose every call fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn awards(&self) -> Vec<(UserId, u32, XpReason)> {
        self.awards.lock().clone()
    }

    pub fn deductions(&self) -> Vec<(UserId, u32, XpReason)> {
        self.deductions.lock().clone()
    }
}

#[async_trait]
impl XpSink for RecordingXp {
    async fn award(&self, user_id: UserId, amount: u32, reason: XpReason) -> SinkResult<()> {
        if self.fail {
            return Err(SinkError::Transport("xp service down".to_owned()));
        }
        self.awards.lock().push((user_id, amount, reason));
        Ok(())
    }

    async fn deduct(&self, user_id: UserId, amount: u32, reason: XpReason) -> SinkResult<()> {
        if self.fail {
            return Err(SinkError::Transport("xp service down".to_owned()));
        }
        self.deductions.lock().push((user_id, amount, reason));
        Ok(())
    }
}

/// Notification sink recording every delivery
#[derive(Default)]
pub struct RecordingNotifications {
    delivered: Mutex<Vec<Notification>>,
}

impl RecordingNotifications {
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifications {
    async fn deliver(&self, notification: Notification) -> SinkResult<()> {
        self.delivered.lock().push(notification);
        Ok(())
    }
}

// ============================================================================
// Manual feed
// ============================================================================

/// Entity feed fake whose pushes are driven by the test
pub struct ManualFeed {
    tx: broadcast::Sender<EntityUpdate>,
    subscribed: Mutex<HashSet<PostId>>,
}

impl Default for ManualFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            tx,
            subscribed: Mutex::new(HashSet::new()),
        }
    }

    /// Receiver for the listener under test
    pub fn receiver(&self) -> broadcast::Receiver<EntityUpdate> {
        self.tx.subscribe()
    }

    /// Emit one update frame
    pub fn push(&self, update: EntityUpdate) {
        let _ = self.tx.send(update);
    }

    /// Whether a post currently has an upstream subscription
    pub fn is_subscribed(&self, post_id: PostId) -> bool {
        self.subscribed.lock().contains(&post_id)
    }

    /// Wait until every emitted frame has been consumed and applied
    pub async fn drained(&self) {
        while !self.tx.is_empty() {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
}

#[async_trait]
impl EntityFeed for ManualFeed {
    async fn subscribe(&self, entity_id: PostId) -> FeedResult<()> {
        self.subscribed.lock().insert(entity_id);
        Ok(())
    }

    async fn unsubscribe(&self, entity_id: PostId) -> FeedResult<()> {
        self.subscribed.lock().remove(&entity_id);
        Ok(())
    }
}

/// An `Arc`'d trait object view of the gateway, for context assembly
pub fn as_gateway(gateway: &Arc<ScriptedGateway>) -> Arc<dyn MutationGateway> {
    Arc::clone(gateway) as Arc<dyn MutationGateway>
}
