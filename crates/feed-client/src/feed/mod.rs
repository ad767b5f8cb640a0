//! Real-time entity-update feed.
//!
//! Provides the subscription side of the live counter stream.

mod subscriber;

pub use subscriber::{FeedSubscriber, FeedSubscriberBuilder, FeedSubscriberConfig};
