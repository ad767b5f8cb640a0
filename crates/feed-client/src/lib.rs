//! # feed-client
//!
//! Infrastructure adapters for the collaborator contracts: a reqwest-backed
//! HTTP implementation of the mutation gateway and the fire-and-forget
//! sinks, and a WebSocket subscriber delivering the real-time entity-update
//! feed.

pub mod feed;
pub mod http;

// Re-export adapter types
pub use feed::{FeedSubscriber, FeedSubscriberBuilder, FeedSubscriberConfig};
pub use http::HttpGateway;
