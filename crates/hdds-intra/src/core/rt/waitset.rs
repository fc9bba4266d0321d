// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wakeup driver behind `dds::WaitSet`.
//!
//! Conditions hold a [`WaitsetSignal`] per attached WaitSet and call
//! `signal()` when their trigger value may have become `true`. The driver
//! counts signals in a generation number: a waiter samples the generation,
//! evaluates its conditions, and only sleeps if no signal arrived since the
//! sample, so a signal racing with evaluation is never lost.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Wakeup handle given to conditions.
pub trait WaitsetSignal: Send + Sync {
    fn id(&self) -> u64;

    /// Wake every thread blocked on the owning waitset.
    fn signal(&self);
}

/// Generation-counting wakeup driver.
pub struct WaitsetDriver {
    id: u64,
    generation: Mutex<u64>,
    wake: Condvar,
}

impl WaitsetDriver {
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            generation: Mutex::new(0),
            wake: Condvar::new(),
        }
    }

    /// Current generation. Sample it before evaluating conditions.
    pub fn generation(&self) -> u64 {
        *self.generation.lock()
    }

    /// Block until a signal moves the generation past `seen`.
    ///
    /// Returns `false` if `deadline` passed first. `None` waits forever.
    pub fn wait_past(&self, seen: u64, deadline: Option<Instant>) -> bool {
        let mut generation = self.generation.lock();
        while *generation == seen {
            match deadline {
                Some(deadline) => {
                    if self.wake.wait_until(&mut generation, deadline).timed_out() {
                        return *generation != seen;
                    }
                }
                None => self.wake.wait(&mut generation),
            }
        }
        true
    }
}

impl Default for WaitsetDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitsetSignal for WaitsetDriver {
    fn id(&self) -> u64 {
        self.id
    }

    fn signal(&self) {
        let mut generation = self.generation.lock();
        *generation = generation.wrapping_add(1);
        drop(generation);
        self.wake.notify_all();
    }
}

impl std::fmt::Debug for WaitsetDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitsetDriver")
            .field("id", &self.id)
            .field("generation", &self.generation())
            .finish()
    }
}
