//! Engine context - dependency container for controllers
//!
//! Holds the mutation gateway, the side-effect dispatcher, and the shared
//! pending-mutation registry. Controllers are constructed with a clone of
//! this context, which makes them unit-testable with in-memory fakes.

use std::sync::Arc;

use feed_core::{MutationGateway, NotificationSink, XpSink};

use super::pending::PendingSet;
use super::side_effects::SideEffectDispatcher;

/// Engine dependency container
#[derive(Clone)]
pub struct EngineContext {
    gateway: Arc<dyn MutationGateway>,
    dispatcher: Arc<SideEffectDispatcher>,
    pending: Arc<PendingSet>,
}

impl EngineContext {
    /// Create a new context from collaborator implementations
    #[must_use]
    pub fn new(
        gateway: Arc<dyn MutationGateway>,
        xp_sink: Arc<dyn XpSink>,
        notification_sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            gateway,
            dispatcher: Arc::new(SideEffectDispatcher::new(xp_sink, notification_sink)),
            pending: Arc::new(PendingSet::new()),
        }
    }

    /// Get the mutation gateway
    pub fn gateway(&self) -> &dyn MutationGateway {
        self.gateway.as_ref()
    }

    /// Get the side-effect dispatcher
    pub fn dispatcher(&self) -> &SideEffectDispatcher {
        self.dispatcher.as_ref()
    }

    /// Get the pending-mutation registry
    pub fn pending(&self) -> &PendingSet {
        self.pending.as_ref()
    }
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("pending", &self.pending.len())
            .finish()
    }
}
