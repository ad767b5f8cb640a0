//! Collaborator ports
//!
//! The engine consumes the surrounding product (REST API, real-time store,
//! gamification and notification services) exclusively through these traits;
//! the infrastructure layer provides the implementations.

mod feed;
mod gateway;
mod sinks;

pub use feed::{EntityFeed, FeedError, FeedResult};
pub use gateway::{GatewayError, GatewayResult, MutationGateway};
pub use sinks::{NotificationSink, SinkError, SinkResult, XpSink};
