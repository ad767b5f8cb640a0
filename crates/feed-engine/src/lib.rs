//! # feed-engine
//!
//! The social-interaction optimistic-update engine: per-entity state
//! machines that apply speculative transitions on user intent, reconcile
//! server-pushed counters, roll back exactly on remote failure, and fire
//! best-effort side effects only after a confirmed primary mutation.

pub mod dto;
pub mod engine;

// Re-export the engine surface at crate root
pub use dto::{CreateCommentRequest, EditCommentRequest};
pub use engine::{
    CommentController, EngineContext, EngineError, EngineResult, OperationKind, PendingMutation,
    PendingSet, ReactionController, ReconciliationListener, SideEffectDispatcher, Snapshot,
};
