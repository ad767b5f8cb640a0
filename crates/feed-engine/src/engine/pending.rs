//! In-flight mutation tracking
//!
//! At most one mutation may be outstanding per (entity, operation) pair;
//! the registry entry claimed here carries the rollback snapshot, so a
//! failed mutation always has a single, unambiguous restore target.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use feed_core::{CommentLikeState, ReactionState};
use uuid::Uuid;

/// The mutation kinds the engine serializes independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    ReactionToggle,
    CommentLikeToggle,
    CommentCreate,
    CommentEdit,
    CommentDelete,
}

impl OperationKind {
    /// Stable name for logging
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReactionToggle => "reaction-toggle",
            Self::CommentLikeToggle => "comment-like-toggle",
            Self::CommentCreate => "comment-create",
            Self::CommentEdit => "comment-edit",
            Self::CommentDelete => "comment-delete",
        }
    }
}

/// State captured immediately before a speculative delta.
///
/// Rollback is always a full snapshot replace, never a re-derived inverse;
/// floor-at-zero arithmetic must not be applied twice.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Reaction(ReactionState),
    CommentLike(CommentLikeState),
    /// The operation applies no speculative delta, nothing to restore
    None,
}

/// One outstanding mutation
#[derive(Debug, Clone)]
pub struct PendingMutation {
    pub entity_id: Uuid,
    pub kind: OperationKind,
    pub prior: Snapshot,
    pub requested_at: DateTime<Utc>,
}

/// Registry of outstanding mutations keyed by (entity, operation).
///
/// Serialization is at entity+operation granularity, not a global lock:
/// independent sub-resources of the same post proceed concurrently.
#[derive(Debug, Default)]
pub struct PendingSet {
    inner: DashMap<(Uuid, OperationKind), PendingMutation>,
}

impl PendingSet {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Try to claim the (entity, operation) slot, storing the rollback
    /// snapshot. Returns `false` when a mutation is already in flight, in
    /// which case the new intent must be ignored.
    pub fn begin(
        &self,
        entity_id: impl Into<Uuid>,
        kind: OperationKind,
        prior: Snapshot,
    ) -> bool {
        let entity_id = entity_id.into();
        match self.inner.entry((entity_id, kind)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(PendingMutation {
                    entity_id,
                    kind,
                    prior,
                    requested_at: Utc::now(),
                });
                true
            }
        }
    }

    /// Release the slot once the remote call resolved, returning the stored
    /// mutation (with its rollback snapshot)
    pub fn settle(
        &self,
        entity_id: impl Into<Uuid>,
        kind: OperationKind,
    ) -> Option<PendingMutation> {
        self.inner
            .remove(&(entity_id.into(), kind))
            .map(|(_, pending)| pending)
    }

    /// Check whether a mutation is outstanding for this (entity, operation)
    #[must_use]
    pub fn is_pending(&self, entity_id: impl Into<Uuid>, kind: OperationKind) -> bool {
        self.inner.contains_key(&(entity_id.into(), kind))
    }

    /// Number of outstanding mutations across all entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if nothing is in flight
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
