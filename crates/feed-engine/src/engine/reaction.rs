//! Reaction controller - optimistic state machine for one post's reactions
//!
//! Owns the client-visible [`ReactionState`] for a single post. A toggle
//! applies its speculative delta synchronously, before the remote call
//! resolves; a remote failure restores the exact pre-delta snapshot. Server
//! pushes arriving while a toggle is in flight are buffered and merged when
//! the toggle settles.

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use feed_core::{EntityUpdate, PostId, ReactionState, UserId};

use super::context::EngineContext;
use super::error::{EngineError, EngineResult, MSG_REACTION};
use super::pending::{OperationKind, Snapshot};

/// State cell guarded by the controller's lock.
///
/// The lock is only ever held for synchronous transitions, never across an
/// await; the pending registry is consulted exclusively under this lock, so
/// the single-flight check, the speculative delta, the rollback, and the
/// push-buffering decision are mutually atomic.
struct ReactionCell {
    state: ReactionState,
    buffered_push: Option<EntityUpdate>,
}

/// Optimistic state machine for one post's reaction counters
pub struct ReactionController {
    post_id: PostId,
    post_owner_id: UserId,
    viewer_id: UserId,
    ctx: EngineContext,
    cell: Mutex<ReactionCell>,
}

impl ReactionController {
    /// Create a controller seeded with the state the post rendered with
    #[must_use]
    pub fn new(
        post_id: PostId,
        post_owner_id: UserId,
        viewer_id: UserId,
        initial: ReactionState,
        ctx: EngineContext,
    ) -> Self {
        Self {
            post_id,
            post_owner_id,
            viewer_id,
            ctx,
            cell: Mutex::new(ReactionCell {
                state: initial,
                buffered_push: None,
            }),
        }
    }

    /// The post this controller owns state for
    #[inline]
    #[must_use]
    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    /// Current client-visible state
    #[must_use]
    pub fn state(&self) -> ReactionState {
        self.cell.lock().state.clone()
    }

    /// Toggle the viewer's reaction.
    ///
    /// The speculative transition is applied immediately and the new state
    /// returned reflects the settled outcome: confirmed on success, the
    /// restored prior snapshot on failure, either one merged with a push
    /// that arrived while the call was outstanding. A toggle issued while
    /// another is in flight is a no-op returning the unchanged state.
    #[instrument(skip(self), fields(post_id = %self.post_id))]
    pub async fn toggle_reaction(&self, emoji: &str) -> EngineResult<ReactionState> {
        let toggle = {
            let mut cell = self.cell.lock();
            let prior = Snapshot::Reaction(cell.state.clone());
            if !self
                .ctx
                .pending()
                .begin(self.post_id, OperationKind::ReactionToggle, prior)
            {
                debug!("reaction toggle already in flight, ignoring");
                return Ok(cell.state.clone());
            }
            cell.state.apply_toggle(emoji)
        };

        let result = self
            .ctx
            .gateway()
            .toggle_reaction(self.post_id, self.viewer_id, emoji)
            .await;

        // Settle under the lock: release the slot, roll back on failure,
        // then let any buffered push through as the new baseline.
        let state = {
            let mut cell = self.cell.lock();
            let pending = self
                .ctx
                .pending()
                .settle(self.post_id, OperationKind::ReactionToggle);

            if result.is_err() {
                if let Some(pending) = pending {
                    if let Snapshot::Reaction(prior) = pending.prior {
                        cell.state = prior;
                    }
                }
            }

            if let Some(push) = cell.buffered_push.take() {
                cell.state.merge_baseline(push.counts, push.total_count);
            }

            cell.state.clone()
        };

        match result {
            Ok(()) => {
                info!(emoji = %emoji, "Reaction toggled");
                if toggle.is_new_reaction() && self.post_owner_id != self.viewer_id {
                    self.ctx
                        .dispatcher()
                        .post_liked(self.post_owner_id, self.viewer_id, self.post_id)
                        .await;
                }
                Ok(state)
            }
            Err(e) => {
                warn!(emoji = %emoji, error = %e, "Reaction toggle failed, state rolled back");
                Err(EngineError::remote(MSG_REACTION, e))
            }
        }
    }

    /// Merge a server push of authoritative counters.
    ///
    /// With no toggle outstanding the push is accepted unconditionally as
    /// the new baseline. While a toggle is pending it is buffered instead
    /// (last received wins): applying it immediately could overwrite the
    /// speculative state with a stale pre-mutation snapshot, visibly
    /// discarding the user's action until the next push.
    pub fn apply_push(&self, update: EntityUpdate) {
        let mut cell = self.cell.lock();
        if self
            .ctx
            .pending()
            .is_pending(self.post_id, OperationKind::ReactionToggle)
        {
            debug!(post_id = %self.post_id, "toggle in flight, buffering push");
            cell.buffered_push = Some(update);
        } else {
            cell.state.merge_baseline(update.counts, update.total_count);
        }
    }
}

impl std::fmt::Debug for ReactionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactionController")
            .field("post_id", &self.post_id)
            .field("viewer_id", &self.viewer_id)
            .finish()
    }
}
