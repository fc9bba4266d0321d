// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Atomic reference counter with a retain/release contract.
//!
//! The counter starts at 1 (the creator's reference). Every `retain()` is a
//! single CAS increment that refuses to resurrect a count that already hit
//! zero; every `release()` is a single CAS decrement with `Release`
//! ordering. The caller that observes the 1 -> 0 transition gets `true`
//! back, after an `Acquire` fence, and owns the teardown.
//!
//! Misuse (retain or release at zero) trips a `debug_assert!` and is a
//! logged no-op in release builds.

use crossbeam::utils::CachePadded;
use std::sync::atomic::{fence, AtomicUsize, Ordering};

/// Same overflow ceiling as `std::sync::Arc`.
const MAX_REFCOUNT: usize = isize::MAX as usize;

/// Thread-safe reference counter.
///
/// The count word is cache padded: it is the only field written by every
/// reader and writer touching a sample.
#[derive(Debug)]
pub struct AtomicRefCount {
    count: CachePadded<AtomicUsize>,
}

impl AtomicRefCount {
    /// New counter holding one reference.
    pub fn new() -> Self {
        Self {
            count: CachePadded::new(AtomicUsize::new(1)),
        }
    }

    /// Current count. Only meaningful as a snapshot.
    #[inline]
    pub fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Add one reference.
    ///
    /// Returns `false` (and changes nothing) if the count is already zero.
    pub fn retain(&self) -> bool {
        let mut current = self.count.load(Ordering::Relaxed);
        loop {
            if current == 0 {
                misuse("retain");
                return false;
            }
            if current >= MAX_REFCOUNT {
                log::error!("[refcount] count overflow, aborting");
                std::process::abort();
            }
            match self.count.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Drop one reference.
    ///
    /// Returns `true` exactly once per counter: for the caller whose
    /// decrement moved the count from 1 to 0. All writes made by other
    /// holders before their own `release()` are visible to that caller.
    pub fn release(&self) -> bool {
        let mut current = self.count.load(Ordering::Relaxed);
        loop {
            if current == 0 {
                misuse("release");
                return false;
            }
            match self.count.compare_exchange_weak(
                current,
                current - 1,
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) if current == 1 => {
                    fence(Ordering::Acquire);
                    return true;
                }
                Ok(_) => return false,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for AtomicRefCount {
    fn default() -> Self {
        Self::new()
    }
}

#[cold]
fn misuse(op: &str) {
    if cfg!(debug_assertions) {
        panic!("AtomicRefCount::{}() on a released counter", op);
    }
    log::error!("[refcount] {}() after count reached zero, ignored", op);
}
