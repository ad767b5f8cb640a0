//! Engine assembly helpers
//!
//! Wires controllers, the reconciliation listener, and the scripted
//! collaborators together the way an embedding application would.

use std::sync::Arc;

use feed_core::{
    Comment, EntityFeed, MutationGateway, NotificationSink, PostId, ReactionState, UserId, XpSink,
};
use feed_engine::{
    CommentController, EngineContext, ReactionController, ReconciliationListener,
};

use crate::fixtures::{ManualFeed, RecordingNotifications, RecordingXp, ScriptedGateway};

/// Fully assembled engine over scripted collaborators
pub struct TestEngine {
    pub gateway: Arc<ScriptedGateway>,
    pub xp: Arc<RecordingXp>,
    pub notifications: Arc<RecordingNotifications>,
    pub feed: Arc<ManualFeed>,
    pub listener: ReconciliationListener,
    pub ctx: EngineContext,
    pub post: PostId,
    pub owner: UserId,
    pub viewer: UserId,
}

impl TestEngine {
    /// Assemble with well-behaved collaborators
    pub fn new() -> Self {
        Self::assemble(Arc::new(RecordingXp::default()))
    }

    /// Assemble with an XP sink whose every call fails
    pub fn with_failing_xp() -> Self {
        Self::assemble(Arc::new(RecordingXp::failing()))
    }

    fn assemble(xp: Arc<RecordingXp>) -> Self {
        let gateway = Arc::new(ScriptedGateway::default());
        let notifications = Arc::new(RecordingNotifications::default());
        let feed = Arc::new(ManualFeed::new());

        let ctx = EngineContext::new(
            Arc::clone(&gateway) as Arc<dyn MutationGateway>,
            Arc::clone(&xp) as Arc<dyn XpSink>,
            Arc::clone(&notifications) as Arc<dyn NotificationSink>,
        );
        let listener =
            ReconciliationListener::spawn(Arc::clone(&feed) as Arc<dyn EntityFeed>, feed.receiver());

        Self {
            gateway,
            xp,
            notifications,
            feed,
            listener,
            ctx,
            post: PostId::generate(),
            owner: UserId::generate(),
            viewer: UserId::generate(),
        }
    }

    /// Controller for the harness post (owned by someone else)
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
    pub fn own_post_controller(&self, initial: ReactionState) -> Arc<ReactionController> {
        Arc::new(ReactionController::new(
            self.post,
            self.viewer,
            self.viewer,
            initial,
            self.ctx.clone(),
        ))
    }

    /// Comment thread controller seeded from the gateway's stored comments
    pub fn comment_controller(&self) -> Arc<CommentController> {
        Arc::new(CommentController::new(
            self.post,
            self.owner,
            self.viewer,
            self.gateway.stored_comments(),
            self.ctx.clone(),
        ))
    }

    /// Watch a controller through the reconciliation listener
    pub async fn watch(&self, controller: &Arc<ReactionController>) {
        self.listener
            .watch(Arc::clone(controller))
            .await
            .expect("watch should subscribe");
    }

    /// Seed a comment on the harness post
    pub fn seed_comment(&self, author_id: UserId, content: &str, like_count: u32) -> Comment {
        let comment = crate::fixtures::comment(self.post, author_id, content, like_count);
        self.gateway.push_comment(comment.clone());
        comment
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}
