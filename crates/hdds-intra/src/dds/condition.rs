// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conditions: trigger predicates a [`WaitSet`](super::waitset::WaitSet)
//! blocks on.
//!
//! | Condition | Trigger value |
//! |-----------|---------------|
//! | [`GuardCondition`] | set by the application |
//! | [`StatusCondition`] | an enabled status of its endpoint changed and was not yet read |
//! | [`ReadCondition`] | its reader holds a sample in one of the requested states |

use crate::core::rt::{ReaderQueue, SampleState, WaitsetSignal};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Boolean predicate that can be attached to a WaitSet.
pub trait Condition: Send + Sync {
    /// Whether the condition is currently satisfied.
    fn get_trigger_value(&self) -> bool;

    /// Unique identifier, used to detect duplicate attachments.
    fn condition_id(&self) -> u64;

    /// Register a waitset signal so this condition can wake blocked waiters.
    fn add_waitset_signal(&self, signal: Arc<dyn WaitsetSignal>);

    /// Remove a previously registered waitset signal.
    fn remove_waitset_signal(&self, signal_id: u64);

    /// Downcast support for dynamic condition handling.
    fn as_any(&self) -> &dyn Any;
}

/// Entities that own a [`StatusCondition`].
pub trait HasStatusCondition {
    fn get_status_condition(&self) -> Arc<StatusCondition>;
}

fn next_condition_id() -> u64 {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

// ============================================================================
// Waitset hooks
// ============================================================================

struct WaitsetHook {
    id: u64,
    signal: Weak<dyn WaitsetSignal>,
}

/// Signals of the waitsets a condition is attached to.
#[derive(Default)]
struct WaitsetHooks(Mutex<Vec<WaitsetHook>>);

impl WaitsetHooks {
    fn add(&self, signal: &Arc<dyn WaitsetSignal>) {
        let mut hooks = self.0.lock();
        hooks.retain(|hook| hook.signal.strong_count() > 0 && hook.id != signal.id());
        hooks.push(WaitsetHook {
            id: signal.id(),
            signal: Arc::downgrade(signal),
        });
    }

    fn remove(&self, signal_id: u64) {
        self.0.lock().retain(|hook| hook.id != signal_id);
    }

    fn notify(&self) {
        let live: Vec<Arc<dyn WaitsetSignal>> = {
            let mut hooks = self.0.lock();
            hooks.retain(|hook| hook.signal.strong_count() > 0);
            hooks.iter().filter_map(|hook| hook.signal.upgrade()).collect()
        };
        for signal in live {
            signal.signal();
        }
    }
}

// ============================================================================
// StatusMask
// ============================================================================

/// Status bits of a [`StatusCondition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMask(u32);

impl StatusMask {
    pub const NONE: StatusMask = StatusMask(0);
    pub const ALL: StatusMask = StatusMask(0xFFFF_FFFF);

    /// Data available to take (DataReader)
    pub const DATA_AVAILABLE: StatusMask = StatusMask(1 << 0);
    /// Unread sample evicted (DataReader)
    pub const SAMPLE_LOST: StatusMask = StatusMask(1 << 1);
    /// Sample refused by a full queue (DataReader)
    pub const SAMPLE_REJECTED: StatusMask = StatusMask(1 << 2);
    /// Matched writers changed (DataReader)
    pub const SUBSCRIPTION_MATCHED: StatusMask = StatusMask(1 << 6);
    /// Matched readers changed (DataWriter)
    pub const PUBLICATION_MATCHED: StatusMask = StatusMask(1 << 10);

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        StatusMask(bits)
    }

    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set.
    #[must_use]
    pub const fn contains(&self, other: StatusMask) -> bool {
        (self.0 & other.0) == other.0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for StatusMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        StatusMask(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for StatusMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        StatusMask(self.0 & rhs.0)
    }
}

// ============================================================================
// StatusCondition
// ============================================================================

/// Condition tracking the communication statuses of one endpoint.
///
/// A status becomes active when it changes on an endpoint without a
/// listener and stays active until the matching `*_status()` getter (or,
/// for DATA_AVAILABLE, a read/take) is called. All statuses are enabled
/// initially.
pub struct StatusCondition {
    id: u64,
    enabled: Mutex<StatusMask>,
    active: Mutex<StatusMask>,
    hooks: WaitsetHooks,
}

impl StatusCondition {
    pub fn new() -> Self {
        Self {
            id: next_condition_id(),
            enabled: Mutex::new(StatusMask::ALL),
            active: Mutex::new(StatusMask::NONE),
            hooks: WaitsetHooks::default(),
        }
    }

    /// Choose which statuses set the trigger value.
    pub fn set_enabled_statuses(&self, mask: StatusMask) {
        *self.enabled.lock() = mask;
        if self.get_trigger_value() {
            self.hooks.notify();
        }
    }

    pub fn get_enabled_statuses(&self) -> StatusMask {
        *self.enabled.lock()
    }

    /// Statuses changed and not yet read.
    pub fn get_active_statuses(&self) -> StatusMask {
        *self.active.lock()
    }

    pub(crate) fn raise(&self, mask: StatusMask) {
        {
            let mut active = self.active.lock();
            *active = *active | mask;
        }
        if !(self.get_enabled_statuses() & mask).is_empty() {
            self.hooks.notify();
        }
    }

    pub(crate) fn clear(&self, mask: StatusMask) {
        let mut active = self.active.lock();
        *active = StatusMask(active.0 & !mask.0);
    }
}

impl Default for StatusCondition {
    fn default() -> Self {
        Self::new()
    }
}

impl Condition for StatusCondition {
    fn get_trigger_value(&self) -> bool {
        !(self.get_enabled_statuses() & self.get_active_statuses()).is_empty()
    }

    fn condition_id(&self) -> u64 {
        self.id
    }

    fn add_waitset_signal(&self, signal: Arc<dyn WaitsetSignal>) {
        self.hooks.add(&signal);
        if self.get_trigger_value() {
            signal.signal();
        }
    }

    fn remove_waitset_signal(&self, signal_id: u64) {
        self.hooks.remove(signal_id);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for StatusCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusCondition")
            .field("id", &self.id)
            .field("enabled", &self.get_enabled_statuses())
            .field("active", &self.get_active_statuses())
            .finish()
    }
}

// ============================================================================
// GuardCondition
// ============================================================================

/// Condition whose trigger value is under application control.
pub struct GuardCondition {
    id: u64,
    trigger_value: AtomicBool,
    hooks: WaitsetHooks,
}

impl GuardCondition {
    pub fn new() -> Self {
        Self {
            id: next_condition_id(),
            trigger_value: AtomicBool::new(false),
            hooks: WaitsetHooks::default(),
        }
    }

    /// Set the trigger value. `true` wakes every WaitSet it is attached to.
    pub fn set_trigger_value(&self, value: bool) {
        self.trigger_value.store(value, Ordering::Release);
        if value {
            self.hooks.notify();
        }
    }
}

impl Default for GuardCondition {
    fn default() -> Self {
        Self::new()
    }
}

impl Condition for GuardCondition {
    fn get_trigger_value(&self) -> bool {
        self.trigger_value.load(Ordering::Acquire)
    }

    fn condition_id(&self) -> u64 {
        self.id
    }

    fn add_waitset_signal(&self, signal: Arc<dyn WaitsetSignal>) {
        self.hooks.add(&signal);
        if self.get_trigger_value() {
            signal.signal();
        }
    }

    fn remove_waitset_signal(&self, signal_id: u64) {
        self.hooks.remove(signal_id);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// ReadCondition
// ============================================================================

/// Sample states a [`ReadCondition`] looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleStateMask(u32);

impl SampleStateMask {
    /// Already returned by `read()`.
    pub const READ: SampleStateMask = SampleStateMask(1 << 0);
    /// Never returned by `read()`.
    pub const NOT_READ: SampleStateMask = SampleStateMask(1 << 1);
    pub const ANY: SampleStateMask = SampleStateMask(Self::READ.0 | Self::NOT_READ.0);

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub fn matches(&self, state: SampleState) -> bool {
        let bit = match state {
            SampleState::Read => Self::READ,
            SampleState::NotRead => Self::NOT_READ,
        };
        self.0 & bit.0 != 0
    }
}

impl std::ops::BitOr for SampleStateMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        SampleStateMask(self.0 | rhs.0)
    }
}

/// Condition on the samples held by one DataReader.
///
/// Created by `DataReader::create_read_condition`. The trigger value is
/// evaluated against the reader's queue on every call; it is `false` once
/// the reader is destroyed.
pub struct ReadCondition {
    id: u64,
    queue: Weak<ReaderQueue>,
    sample_states: SampleStateMask,
    hooks: WaitsetHooks,
}

impl ReadCondition {
    pub(crate) fn new(queue: &Arc<ReaderQueue>, sample_states: SampleStateMask) -> Self {
        Self {
            id: next_condition_id(),
            queue: Arc::downgrade(queue),
            sample_states,
            hooks: WaitsetHooks::default(),
        }
    }

    pub fn get_sample_state_mask(&self) -> SampleStateMask {
        self.sample_states
    }

    /// Wake attached WaitSets so they re-evaluate this condition.
    pub(crate) fn notify_waitsets(&self) {
        self.hooks.notify();
    }
}

impl Condition for ReadCondition {
    fn get_trigger_value(&self) -> bool {
        let Some(queue) = self.queue.upgrade() else {
            return false;
        };
        !queue.is_closed() && queue.count_matching(|state| self.sample_states.matches(state)) > 0
    }

    fn condition_id(&self) -> u64 {
        self.id
    }

    fn add_waitset_signal(&self, signal: Arc<dyn WaitsetSignal>) {
        self.hooks.add(&signal);
        if self.get_trigger_value() {
            signal.signal();
        }
    }

    fn remove_waitset_signal(&self, signal_id: u64) {
        self.hooks.remove(signal_id);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for ReadCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadCondition")
            .field("id", &self.id)
            .field("sample_states", &self.sample_states)
            .finish()
    }
}
