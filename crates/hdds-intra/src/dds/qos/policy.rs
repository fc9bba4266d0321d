// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Individual QoS policies.

use crate::config::KEEP_ALL_DEFAULT_MAX_SAMPLES;

/// Reliability policy
///
/// Determines whether a publish may wait for readers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Reliability {
    /// Never block on readers; full readers that refuse a sample miss it.
    #[default]
    BestEffort,
    /// Block, up to the writer's max blocking time, until every matched
    /// reader that refuses samples while full has room.
    Reliable,
}

/// History policy
///
/// Determines how many samples a reader queue (or writer history) keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum History {
    /// Keep last N samples (bounded queue, evicts oldest).
    KeepLast(u32),
    /// Keep all samples within `ResourceLimits::max_samples`.
    ///
    /// Inserts are refused once the limit is reached.
    KeepAll,
}

impl Default for History {
    fn default() -> Self {
        History::KeepLast(crate::config::DEFAULT_HISTORY_DEPTH)
    }
}

/// Durability policy
///
/// Determines whether late-joining readers see earlier samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Durability {
    /// Late joiners only see samples published after they matched.
    #[default]
    Volatile,
    /// Writer keeps its last `history depth` samples and replays them to
    /// late-joining readers that also request TRANSIENT_LOCAL.
    /// Cache lives only as long as the writer.
    TransientLocal,
}

/// Resource limits for Writer/Reader
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Maximum samples held by a KEEP_ALL queue.
    pub max_samples: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_samples: KEEP_ALL_DEFAULT_MAX_SAMPLES,
        }
    }
}
