//! In-memory collaborators for engine unit tests

use std::collections::{BTreeMap, HashSet};
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

use super::comment::CommentController;
use super::context::EngineContext;
use super::reaction::ReactionController;

pub fn reaction_state(pairs: &[(&str, u32)], viewer: Option<&str>) -> ReactionState {
    ReactionState::new(
        pairs.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect(),
        viewer.map(str::to_owned),
    )
}

pub fn comment_fixture(author_id: UserId) -> Comment {
    Comment {
        id: CommentId::generate(),
        post_id: PostId::generate(),
        author_id,
        content: "first!".to_owned(),
        created_at: Utc::now(),
        edited_at: None,
        reply_to_comment_id: None,
        reply_to_author_name: None,
        like_count: 0,
        viewer_has_liked: false,
    }
}

// ============================================================================
// Scripted gateway
// ============================================================================

/// Gateway fake with per-call failure scripting and a hold gate for
/// single-flight tests
#[derive(Default)]
pub struct StubGateway {
    comments: Mutex<Vec<Comment>>,
    reaction_calls: AtomicUsize,
    like_calls: AtomicUsize,
    create_calls: AtomicUsize,
    fail_next: Mutex<Option<GatewayError>>,
    holding: AtomicBool,
    entered: Notify,
    gate: Notify,
}

impl StubGateway {
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

    /// Overwrite the stored like count for one comment
    pub fn set_like_count(&self, comment_id: CommentId, count: u32) {
        if let Some(comment) = self.comments.lock().iter_mut().find(|c| c.id == comment_id) {
            comment.like_count = count;
        }
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
impl MutationGateway for StubGateway {
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
        comment_id: CommentId,
        _viewer_id: UserId,
    ) -> GatewayResult<()> {
        self.like_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_hold().await;
        self.take_failure()?;

        if let Some(comment) = self.comments.lock().iter_mut().find(|c| c.id == comment_id) {
            if comment.viewer_has_liked {
                comment.viewer_has_liked = false;
                comment.like_count = comment.like_count.saturating_sub(1);
            } else {
                comment.viewer_has_liked = true;
                comment.like_count += 1;
            }
        }
        Ok(())
    }

    async fn create_comment(&self, draft: &CommentDraft) -> GatewayResult<Comment> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_hold().await;
        self.take_failure()?;

        let comment = Comment {
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
        self.comments.lock().push(comment.clone());
        Ok(comment)
    }

    async fn edit_comment(
        &self,
        comment_id: CommentId,
        _editor_id: UserId,
        content: &str,
    ) -> GatewayResult<Comment> {
        self.take_failure()?;

        let mut comments = self.comments.lock();
        let comment = comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| GatewayError::NotFound("Comment".to_owned()))?;
        comment.content = content.to_owned();
        comment.edited_at = Some(Utc::now());
        Ok(comment.clone())
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

/// XP sink recording every accepted call; optionally failing all of them
#[derive(Default)]
pub struct RecordingXp {
    awards: Mutex<Vec<(UserId, u32)>>,
    deductions: Mutex<Vec<(UserId, u32)>>,
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

    pub fn awards(&self) -> Vec<(UserId, u32)> {
        self.awards.lock().clone()
    }

    pub fn deductions(&self) -> Vec<(UserId, u32)> {
        self.deductions.lock().clone()
    }
}

#[async_trait]
impl XpSink for RecordingXp {
    async fn award(&self, user_id: UserId, amount: u32, _reason: XpReason) -> SinkResult<()> {
        if self.fail {
            return Err(SinkError::Transport("xp service down".to_owned()));
        }
        self.awards.lock().push((user_id, amount));
        Ok(())
    }

    async fn deduct(&self, user_id: UserId, amount: u32, _reason: XpReason) -> SinkResult<()> {
        if self.fail {
            return Err(SinkError::Transport("xp service down".to_owned()));
        }
        self.deductions.lock().push((user_id, amount));
        Ok(())
    }
}

/// Notification sink recording every delivery
#[derive(Default)]
pub struct RecordingNotifications {
    delivered: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotifications {
    /// A sink whose every call fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifications {
    async fn deliver(&self, notification: Notification) -> SinkResult<()> {
        if self.fail {
            return Err(SinkError::Transport("notification service down".to_owned()));
        }
        self.delivered.lock().push(notification);
        Ok(())
    }
}

// ============================================================================
// Manual feed
// ============================================================================

/// Feed fake whose pushes are driven by the test
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

    /// Receiver for a listener under test
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
        // The consumer applies synchronously between recv calls; give it a
        // beat to finish the frame it just took.
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

// ============================================================================
// Harness
// ============================================================================

/// Assembled engine with scripted collaborators
pub struct EngineHarness {
    pub gateway: Arc<StubGateway>,
    pub xp: Arc<RecordingXp>,
    pub notifications: Arc<RecordingNotifications>,
    pub ctx: EngineContext,
    pub post: PostId,
    pub owner: UserId,
    pub viewer: UserId,
    pub other_author: UserId,
}

impl Default for EngineHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineHarness {
    pub fn new() -> Self {
        let gateway = Arc::new(StubGateway::default());
        let xp = Arc::new(RecordingXp::default());
        let notifications = Arc::new(RecordingNotifications::default());
        let ctx = EngineContext::new(
            Arc::clone(&gateway) as Arc<dyn MutationGateway>,
            Arc::clone(&xp) as Arc<dyn XpSink>,
            Arc::clone(&notifications) as Arc<dyn NotificationSink>,
        );

        Self {
            gateway,
            xp,
            notifications,
            ctx,
            post: PostId::generate(),
            owner: UserId::generate(),
            viewer: UserId::generate(),
            other_author: UserId::generate(),
        }
    }

    /// Controller for a post owned by someone other than the viewer
    pub fn reaction_controller(&self, initial: ReactionState) -> Arc<ReactionController> {
        Arc::new(ReactionController::new(
            self.post,
            self.owner,
            self.viewer,
            initial,
            self.ctx.clone(),
        ))
    }

    /// Controller for the viewer's own post
    pub fn own_post_reaction_controller(&self, initial: ReactionState) -> Arc<ReactionController> {
        Arc::new(ReactionController::new(
            self.post,
            self.viewer,
            self.viewer,
            initial,
            self.ctx.clone(),
        ))
    }

    /// Comment thread controller seeded with the gateway's stored comments
    pub fn comment_controller(&self) -> Arc<CommentController> {
        Arc::new(CommentController::new(
            self.post,
            self.owner,
            self.viewer,
            self.gateway.stored_comments(),
            self.ctx.clone(),
        ))
    }

    /// Store a comment authored by a third user on the harness post
    pub fn seed_comment(&self, content: &str, like_count: u32, viewer_has_liked: bool) -> Comment {
        self.seed_with_author(self.other_author, content, like_count, viewer_has_liked)
    }

    /// Store a comment authored by the viewer on the harness post
    pub fn seed_own_comment(&self, content: &str, like_count: u32) -> Comment {
        self.seed_with_author(self.viewer, content, like_count, false)
    }

    fn seed_with_author(
        &self,
        author_id: UserId,
        content: &str,
        like_count: u32,
        viewer_has_liked: bool,
    ) -> Comment {
        let comment = Comment {
            id: CommentId::generate(),
            post_id: self.post,
            author_id,
            content: content.to_owned(),
            created_at: Utc::now(),
            edited_at: None,
            reply_to_comment_id: None,
            reply_to_author_name: None,
            like_count,
            viewer_has_liked,
        };
        self.gateway.push_comment(comment.clone());
        comment
    }

    /// Update frame for a controller's post
    pub fn update(
        &self,
        controller: &ReactionController,
        pairs: &[(&str, u32)],
        total_count: u32,
    ) -> EntityUpdate {
        let counts: BTreeMap<String, u32> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), *v))
            .collect();
        EntityUpdate::new(controller.post_id(), counts, total_count)
    }
}
