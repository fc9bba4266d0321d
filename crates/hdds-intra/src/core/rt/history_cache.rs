// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Writer-side history for TRANSIENT_LOCAL durability.
//!
//! Keeps the last `depth` samples a writer published (KEEP_LAST, FIFO
//! eviction) so late-joining readers can be replayed. Entries are shared
//! [`SampleBuffer`] handles, not copies.

use super::sample::SampleBuffer;
use crate::core::types::SequenceNumber;
use parking_lot::Mutex;
use std::collections::VecDeque;

pub struct HistoryCache {
    depth: usize,
    samples: Mutex<VecDeque<SampleBuffer>>,
}

impl HistoryCache {
    pub fn new(depth: usize) -> Self {
        Self {
            depth: depth.max(1),
            samples: Mutex::new(VecDeque::with_capacity(depth.clamp(1, 1024))),
        }
    }

    /// Store a sample, evicting the oldest one when at depth.
    pub fn insert(&self, sample: &SampleBuffer) {
        let mut samples = self.samples.lock();
        if samples.len() >= self.depth {
            samples.pop_front();
        }
        samples.push_back(sample.clone());
    }

    /// Handles to every cached sample, oldest first.
    pub fn snapshot(&self) -> Vec<SampleBuffer> {
        self.samples.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn oldest_seq(&self) -> Option<SequenceNumber> {
        self.samples.lock().front().map(SampleBuffer::sequence)
    }

    pub fn newest_seq(&self) -> Option<SequenceNumber> {
        self.samples.lock().back().map(SampleBuffer::sequence)
    }

    pub fn clear(&self) {
        let drained: Vec<SampleBuffer> = self.samples.lock().drain(..).collect();
        drop(drained);
    }
}
