// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Aggregated QoS profile and its builder methods.

use super::policy::{Durability, History, Reliability, ResourceLimits};
use crate::config::DURATION_INFINITE;
use crate::core::rt::OverflowPolicy;
use crate::dds::{Error, Result};
use std::time::Duration;

/// Aggregated QoS profile used by the public API.
#[derive(Clone, Debug, PartialEq)]
pub struct QoS {
    pub reliability: Reliability,
    pub history: History,
    pub durability: Durability,
    pub resource_limits: ResourceLimits,
    /// Upper bound for a reliable publish waiting on full readers.
    /// Ignored by best-effort writers.
    pub max_blocking_time: Duration,
}

impl QoS {
    /// Create BestEffort QoS profile (default baseline).
    pub fn best_effort() -> Self {
        Self {
            reliability: Reliability::BestEffort,
            history: History::default(),
            durability: Durability::Volatile,
            resource_limits: ResourceLimits::default(),
            max_blocking_time: DURATION_INFINITE,
        }
    }

    /// Create Reliable QoS profile.
    pub fn reliable() -> Self {
        Self {
            reliability: Reliability::Reliable,
            ..Self::best_effort()
        }
    }

    /// Set KEEP_LAST history depth.
    pub fn keep_last(mut self, depth: u32) -> Self {
        self.history = History::KeepLast(depth);
        self
    }

    /// Set KEEP_ALL history policy.
    pub fn keep_all(mut self) -> Self {
        self.history = History::KeepAll;
        self
    }

    /// Set the KEEP_ALL sample limit.
    pub fn max_samples(mut self, max_samples: usize) -> Self {
        self.resource_limits.max_samples = max_samples;
        self
    }

    /// Set volatile durability.
    pub fn volatile(mut self) -> Self {
        self.durability = Durability::Volatile;
        self
    }

    /// Set transient-local durability.
    pub fn transient_local(mut self) -> Self {
        self.durability = Durability::TransientLocal;
        self
    }

    /// Set the reliable publish timeout. `Duration::ZERO` tries once.
    pub fn max_blocking_time(mut self, timeout: Duration) -> Self {
        self.max_blocking_time = timeout;
        self
    }

    /// Check the profile is usable for an endpoint.
    pub fn validate(&self) -> Result<()> {
        match self.history {
            History::KeepLast(0) => Err(Error::InvalidQos(
                "History::KeepLast(n) requires n > 0".to_string(),
            )),
            History::KeepAll if self.resource_limits.max_samples == 0 => Err(Error::InvalidQos(
                "History::KeepAll requires ResourceLimits.max_samples > 0".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Queue capacity implied by the history policy.
    pub fn history_depth(&self) -> usize {
        match self.history {
            History::KeepLast(depth) => depth as usize,
            History::KeepAll => self.resource_limits.max_samples,
        }
    }

    /// What a full queue built from this profile does.
    pub fn overflow_policy(&self) -> OverflowPolicy {
        match self.history {
            History::KeepLast(_) => OverflowPolicy::EvictOldest,
            History::KeepAll => OverflowPolicy::Reject,
        }
    }

    pub fn is_reliable(&self) -> bool {
        self.reliability == Reliability::Reliable
    }

    pub fn is_transient_local(&self) -> bool {
        self.durability == Durability::TransientLocal
    }
}

impl Default for QoS {
    fn default() -> Self {
        Self::best_effort()
    }
}
