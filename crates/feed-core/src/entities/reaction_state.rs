//! Reaction state - the viewer-visible reaction counters for one post

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Outcome of applying a reaction toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionToggle {
    /// The viewer re-tapped their current reaction and removed it
    Removed,
    /// The viewer moved an existing reaction to a different emoji
    Swapped {
        /// The emoji the reaction moved away from
        from: String,
    },
    /// The viewer reacted for the first time
    Added,
}

impl ReactionToggle {
    /// Whether this transition placed a reaction the post did not have from
    /// this viewer before (an add or a swap, but not a removal)
    #[inline]
    #[must_use]
    pub fn is_new_reaction(&self) -> bool {
        matches!(self, Self::Added | Self::Swapped { .. })
    }
}

/// Per-post, per-viewer reaction counters
///
/// `counts` is the server-authoritative baseline; `viewer_reaction` is the
/// viewer's own contribution to it. Settled state keeps the invariant
/// `counts[viewer_reaction] >= 1` whenever `viewer_reaction` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReactionState {
    /// Aggregate count per emoji key
    pub counts: BTreeMap<String, u32>,
    /// The viewer's own current reaction, if any
    pub viewer_reaction: Option<String>,
    /// Derived display counter
    pub total_count: u32,
}

impl ReactionState {
    /// State for a post the viewer has not interacted with yet
    #[must_use]
    pub fn new(counts: BTreeMap<String, u32>, viewer_reaction: Option<String>) -> Self {
        let total_count = counts.values().sum();
        Self {
            counts,
            viewer_reaction,
            total_count,
        }
    }

    /// Apply the viewer's toggle intent in place and report the transition.
    ///
    /// Re-tapping the current reaction removes it; tapping a different emoji
    /// while one is set swaps (total unchanged); otherwise a fresh reaction
    /// is added. Counters floor at zero.
    pub fn apply_toggle(&mut self, emoji: &str) -> ReactionToggle {
        match self.viewer_reaction.take() {
            Some(current) if current == emoji => {
                self.decrement(&current);
                self.total_count = self.total_count.saturating_sub(1);
                ReactionToggle::Removed
            }
            Some(current) => {
                self.decrement(&current);
                *self.counts.entry(emoji.to_owned()).or_insert(0) += 1;
                self.viewer_reaction = Some(emoji.to_owned());
                ReactionToggle::Swapped { from: current }
            }
            None => {
                *self.counts.entry(emoji.to_owned()).or_insert(0) += 1;
                self.viewer_reaction = Some(emoji.to_owned());
                self.total_count += 1;
                ReactionToggle::Added
            }
        }
    }

    /// Replace the server-authoritative counters, keeping the viewer's own
    /// reaction.
    ///
    /// A pushed baseline can predate a mutation that already settled here; a
    /// set `viewer_reaction` missing from the pushed counts is re-asserted so
    /// the `counts[viewer_reaction] >= 1` invariant keeps holding and the
    /// viewer's completed action stays visible.
    pub fn merge_baseline(&mut self, counts: BTreeMap<String, u32>, total_count: u32) {
        self.counts = counts;
        self.total_count = total_count;

        if let Some(emoji) = self.viewer_reaction.clone() {
            let count = self.counts.entry(emoji).or_insert(0);
            if *count == 0 {
                *count = 1;
                self.total_count += 1;
            }
        }
    }

    /// Displayed count for one emoji
    #[must_use]
    pub fn count_of(&self, emoji: &str) -> u32 {
        self.counts.get(emoji).copied().unwrap_or(0)
    }

    /// Whether the viewer currently has any reaction on this post
    #[inline]
    #[must_use]
    pub fn has_reacted(&self) -> bool {
        self.viewer_reaction.is_some()
    }

    fn decrement(&mut self, emoji: &str) {
        if let Some(count) = self.counts.get_mut(emoji) {
            *count = count.saturating_sub(1);
        }
    }
}
