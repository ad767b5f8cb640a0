//! Reconciliation listener
//!
//! Single consumer task draining the feed's broadcast stream of
//! [`EntityUpdate`] frames in arrival order and routing each to the
//! controller watching that post. The merge-or-buffer decision itself lives
//! in [`ReactionController::apply_push`]; this task only guarantees ordered,
//! per-entity delivery and drives the upstream subscription lifecycle.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use feed_core::{EntityFeed, EntityUpdate, FeedResult, PostId};

use super::reaction::ReactionController;

/// Listener routing authoritative counter pushes to watched posts
pub struct ReconciliationListener {
    feed: Arc<dyn EntityFeed>,
    watched: Arc<DashMap<PostId, Arc<ReactionController>>>,
    handle: JoinHandle<()>,
}

impl ReconciliationListener {
    /// Spawn the listener over a feed's update stream
    #[must_use]
    pub fn spawn(
        feed: Arc<dyn EntityFeed>,
        updates: broadcast::Receiver<EntityUpdate>,
    ) -> Self {
        let watched: Arc<DashMap<PostId, Arc<ReactionController>>> = Arc::new(DashMap::new());
        let handle = tokio::spawn(Self::run(updates, Arc::clone(&watched)));

        Self {
            feed,
            watched,
            handle,
        }
    }

    async fn run(
        mut updates: broadcast::Receiver<EntityUpdate>,
        watched: Arc<DashMap<PostId, Arc<ReactionController>>>,
    ) {
        loop {
            match updates.recv().await {
                Ok(update) => {
                    if let Some(controller) = watched.get(&update.entity_id) {
                        controller.apply_push(update);
                    } else {
                        // Post left scope between emit and delivery; drop.
                        debug!(entity_id = %update.entity_id, "update for unwatched post dropped");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Last-received-wins semantics make skipped frames safe:
                    // the next frame is the newest baseline anyway.
                    warn!(skipped, "feed consumer lagged, dropped updates");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("feed stream closed, reconciliation listener stopping");
                    break;
                }
            }
        }
    }

    /// Start reconciling a post's counters and subscribe upstream
    pub async fn watch(&self, controller: Arc<ReactionController>) -> FeedResult<()> {
        let post_id = controller.post_id();
        self.watched.insert(post_id, controller);
        self.feed.subscribe(post_id).await
    }

    /// Stop reconciling a post and release the upstream subscription
    pub async fn unwatch(&self, post_id: PostId) -> FeedResult<()> {
        self.watched.remove(&post_id);
        self.feed.unsubscribe(post_id).await
    }

    /// Number of posts currently being reconciled
    #[must_use]
    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    /// Stop the consumer task
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for ReconciliationListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl std::fmt::Debug for ReconciliationListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationListener")
            .field("watched", &self.watched.len())
            .finish()
    }
}
