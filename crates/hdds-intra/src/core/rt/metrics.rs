// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Allocation counters for sample buffers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-topic buffer accounting.
///
/// `allocated` is bumped when a tracked [`SampleBuffer`](super::SampleBuffer)
/// is created, `released` when its storage is freed. `live()` is the
/// number of buffers whose storage still exists.
#[derive(Debug, Default)]
pub struct BufferMetrics {
    allocated: AtomicU64,
    released: AtomicU64,
    bytes_live: AtomicU64,
}

impl BufferMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_alloc(&self, len: usize) {
        self.allocated.fetch_add(1, Ordering::Relaxed);
        self.bytes_live.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_release(&self, len: usize) {
        self.released.fetch_add(1, Ordering::Relaxed);
        self.bytes_live.fetch_sub(len as u64, Ordering::Relaxed);
    }

    pub fn allocated(&self) -> u64 {
        self.allocated.load(Ordering::Relaxed)
    }

    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    /// Buffers allocated but not yet freed.
    pub fn live(&self) -> u64 {
        self.allocated().saturating_sub(self.released())
    }

    /// Payload bytes held by live buffers.
    pub fn bytes_live(&self) -> u64 {
        self.bytes_live.load(Ordering::Relaxed)
    }
}
