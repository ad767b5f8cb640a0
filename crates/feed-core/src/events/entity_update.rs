//! Authoritative counter push for one post
//!
//! The real-time document store emits one of these whenever a post's
//! aggregate counters change server-side. It is both the domain payload the
//! reconciliation listener consumes and the JSON frame the feed transport
//! carries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value_objects::PostId;

/// Server-authoritative counters for one post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityUpdate {
    pub entity_id: PostId,
    pub counts: BTreeMap<String, u32>,
    pub total_count: u32,
}

impl EntityUpdate {
    /// Create a new update payload
    #[must_use]
    pub fn new(entity_id: PostId, counts: BTreeMap<String, u32>, total_count: u32) -> Self {
        Self {
            entity_id,
            counts,
            total_count,
        }
    }
}
