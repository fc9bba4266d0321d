// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded per-reader history queue.
//!
//! Any writer's fan-out may push into a queue while its reader drains it, so
//! the queue carries its own lock, independent of the channel lock, plus two
//! condition variables:
//!
//! - `data_ready`: signalled on enqueue, waited on by `wait_pop`
//! - `space_ready`: signalled on dequeue, waited on by reliable writers
//!
//! `close()` wakes both sides and drains every held reference.
//!
//! An optional [`QueueEvents`] sink observes acceptance, loss, refusal and
//! writer-count changes. Hooks always run after the queue lock is released.

use super::sample::SampleBuffer;
use crate::core::types::{EndpointId, SequenceNumber};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a full queue does with a new sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Evict the oldest entry first (KEEP_LAST).
    EvictOldest,
    /// Refuse the new sample (KEEP_ALL with a sample limit).
    Reject,
}

/// Result of offering a sample to a queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OfferOutcome {
    Accepted,
    /// Accepted after evicting the oldest entry.
    AcceptedWithEviction,
    /// Queue full and eviction disabled.
    Refused,
    /// Same writer already delivered this or a later sequence number.
    Duplicate,
    /// Queue was closed by its reader.
    Closed,
}

impl OfferOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted | Self::AcceptedWithEviction)
    }
}

/// Whether a queued sample was already returned by a non-destructive read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleState {
    NotRead,
    Read,
}

/// Observer of queue activity, installed by the owning reader.
///
/// Every hook runs on the thread that caused the event (usually a
/// publishing writer) with no queue or channel lock held. Hooks must not
/// block for long and must not publish on the writer that triggered them.
pub trait QueueEvents: Send + Sync {
    /// A sample was enqueued.
    fn on_accepted(&self, sample: &SampleBuffer) {
        let _ = sample;
    }

    /// An unread sample was evicted to make room.
    fn on_lost(&self, sample: &SampleBuffer) {
        let _ = sample;
    }

    /// A sample was finally refused because the queue stayed full.
    fn on_refused(&self, sample: &SampleBuffer) {
        let _ = sample;
    }

    /// The number of matched writers changed by `delta`; `writer` is the
    /// writer whose arrival or departure caused it.
    fn on_writers_changed(&self, current: usize, writer: EndpointId, delta: isize) {
        let _ = (current, writer, delta);
    }
}

/// Error returned by blocking operations on a closed queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueClosed;

/// Counters exposed by [`ReaderQueue::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub received: u64,
    pub evicted: u64,
    pub refused: u64,
    pub duplicates: u64,
}

struct QueueEntry {
    sample: SampleBuffer,
    state: SampleState,
}

struct QueueState {
    entries: VecDeque<QueueEntry>,
    /// Highest sequence accepted per writer.
    last_seq: HashMap<EndpointId, SequenceNumber>,
    closed: bool,
    /// Removed from its channel; reliable writers stop waiting for space.
    unmatched: bool,
}

#[derive(Default)]
struct Counters {
    received: AtomicU64,
    evicted: AtomicU64,
    refused: AtomicU64,
    duplicates: AtomicU64,
}

/// History queue owned by one reader and fed by any number of writers.
pub struct ReaderQueue {
    id: EndpointId,
    capacity: usize,
    policy: OverflowPolicy,
    state: Mutex<QueueState>,
    data_ready: Condvar,
    space_ready: Condvar,
    counters: Counters,
    matched_writers: AtomicUsize,
    ever_matched: AtomicBool,
    events: Option<Arc<dyn QueueEvents>>,
}

impl ReaderQueue {
    /// Create a queue holding at most `capacity` samples.
    ///
    /// `capacity` must be at least 1; callers validate QoS first.
    pub fn new(id: EndpointId, capacity: usize, policy: OverflowPolicy) -> Self {
        Self::with_events(id, capacity, policy, None)
    }

    /// Create a queue whose activity is reported to `events`.
    pub fn with_events(
        id: EndpointId,
        capacity: usize,
        policy: OverflowPolicy,
        events: Option<Arc<dyn QueueEvents>>,
    ) -> Self {
        debug_assert!(capacity > 0, "reader queue capacity must be >= 1");
        Self {
            id,
            capacity,
            policy,
            state: Mutex::new(QueueState {
                entries: VecDeque::with_capacity(capacity.min(1024)),
                last_seq: HashMap::new(),
                closed: false,
                unmatched: false,
            }),
            data_ready: Condvar::new(),
            space_ready: Condvar::new(),
            counters: Counters::default(),
            matched_writers: AtomicUsize::new(0),
            ever_matched: AtomicBool::new(false),
            events,
        }
    }

    #[inline]
    pub fn id(&self) -> EndpointId {
        self.id
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Offer a sample without blocking.
    ///
    /// On acceptance the queue retains its own reference; the caller's
    /// handle is untouched either way.
    pub fn offer(&self, sample: &SampleBuffer) -> OfferOutcome {
        let (outcome, lost) = self.offer_deferred(sample);
        self.run_hooks(sample, outcome, lost.as_ref());
        outcome
    }

    /// Non-blocking offer that leaves the refusal counter alone. Used for
    /// the first pass of a reliable fan-out, which retries refused queues.
    pub(crate) fn try_offer(&self, sample: &SampleBuffer) -> OfferOutcome {
        let mut evicted = None;
        let outcome = self.try_insert(&mut self.state.lock(), sample, &mut evicted);
        let lost = self.settle(outcome, evicted, false);
        if outcome != OfferOutcome::Refused {
            self.run_hooks(sample, outcome, lost.as_ref());
        }
        outcome
    }

    /// Offer without running [`QueueEvents`] hooks. Returns the outcome and
    /// the unread sample evicted to make room, if any; the caller passes
    /// both to [`ReaderQueue::run_hooks`] once it holds no other lock.
    pub(crate) fn offer_deferred(
        &self,
        sample: &SampleBuffer,
    ) -> (OfferOutcome, Option<SampleBuffer>) {
        let mut evicted = None;
        let outcome = self.try_insert(&mut self.state.lock(), sample, &mut evicted);
        let lost = self.settle(outcome, evicted, true);
        (outcome, lost)
    }

    /// Offer a sample, waiting for space until `deadline` if the queue
    /// refuses new entries while full. `None` waits without limit.
    ///
    /// Gives up with [`OfferOutcome::Closed`] once the queue is closed or
    /// removed from its channel while waiting.
    pub fn offer_until(&self, sample: &SampleBuffer, deadline: Option<Instant>) -> OfferOutcome {
        let mut evicted = None;
        let mut state = self.state.lock();
        let outcome = loop {
            let outcome = self.try_insert(&mut state, sample, &mut evicted);
            if outcome != OfferOutcome::Refused {
                break outcome;
            }
            if state.unmatched {
                log::debug!(
                    "[queue] {} unmatched while full, dropping seq {} from {}",
                    self.id,
                    sample.sequence(),
                    sample.writer()
                );
                break OfferOutcome::Closed;
            }
            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        break outcome;
                    }
                    let _ = self.space_ready.wait_until(&mut state, deadline);
                }
                None => self.space_ready.wait(&mut state),
            }
        };
        drop(state);
        let lost = self.settle(outcome, evicted, true);
        self.run_hooks(sample, outcome, lost.as_ref());
        outcome
    }

    fn try_insert(
        &self,
        state: &mut QueueState,
        sample: &SampleBuffer,
        evicted: &mut Option<QueueEntry>,
    ) -> OfferOutcome {
        if state.closed {
            return OfferOutcome::Closed;
        }

        let writer = sample.writer();
        let sequence = sample.sequence();
        if let Some(last) = state.last_seq.get(&writer) {
            if sequence <= *last {
                self.counters.duplicates.fetch_add(1, Ordering::Relaxed);
                return OfferOutcome::Duplicate;
            }
        }

        let mut outcome = OfferOutcome::Accepted;
        if state.entries.len() >= self.capacity {
            match self.policy {
                OverflowPolicy::EvictOldest => {
                    if let Some(oldest) = state.entries.pop_front() {
                        log::debug!(
                            "[queue] {} evicted seq {} from {}",
                            self.id,
                            oldest.sample.sequence(),
                            oldest.sample.writer()
                        );
                        *evicted = Some(oldest);
                    }
                    self.counters.evicted.fetch_add(1, Ordering::Relaxed);
                    outcome = OfferOutcome::AcceptedWithEviction;
                }
                OverflowPolicy::Reject => return OfferOutcome::Refused,
            }
        }

        state.entries.push_back(QueueEntry {
            sample: sample.clone(),
            state: SampleState::NotRead,
        });
        state.last_seq.insert(writer, sequence);
        self.counters.received.fetch_add(1, Ordering::Relaxed);
        outcome
    }

    /// Wake readers and update counters once the queue lock is released.
    /// Returns the evicted sample if it was never read.
    fn settle(
        &self,
        outcome: OfferOutcome,
        evicted: Option<QueueEntry>,
        count_refusal: bool,
    ) -> Option<SampleBuffer> {
        match outcome {
            OfferOutcome::Accepted | OfferOutcome::AcceptedWithEviction => {
                self.data_ready.notify_one();
            }
            OfferOutcome::Refused if count_refusal => {
                self.counters.refused.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
        evicted
            .filter(|entry| entry.state == SampleState::NotRead)
            .map(|entry| entry.sample)
    }

    /// Report an offer to the installed [`QueueEvents`], if any.
    pub(crate) fn run_hooks(
        &self,
        sample: &SampleBuffer,
        outcome: OfferOutcome,
        lost: Option<&SampleBuffer>,
    ) {
        let Some(events) = &self.events else {
            return;
        };
        if let Some(lost) = lost {
            events.on_lost(lost);
        }
        match outcome {
            OfferOutcome::Accepted | OfferOutcome::AcceptedWithEviction => {
                events.on_accepted(sample);
            }
            OfferOutcome::Refused => events.on_refused(sample),
            OfferOutcome::Duplicate | OfferOutcome::Closed => {}
        }
    }

    /// Dequeue the oldest sample, if any.
    pub fn pop(&self) -> Option<SampleBuffer> {
        let entry = self.state.lock().entries.pop_front()?;
        self.space_ready.notify_one();
        Some(entry.sample)
    }

    /// Dequeue up to `max` samples in FIFO order.
    pub fn pop_batch(&self, max: usize) -> Vec<SampleBuffer> {
        let drained: Vec<SampleBuffer> = {
            let mut state = self.state.lock();
            let n = max.min(state.entries.len());
            state.entries.drain(..n).map(|e| e.sample).collect()
        };
        if !drained.is_empty() {
            self.space_ready.notify_all();
        }
        drained
    }

    /// Clone every queued sample without dequeuing, marking them read.
    ///
    /// Each sample is paired with its state *before* this call.
    pub fn read_all(&self) -> Vec<(SampleBuffer, SampleState)> {
        let mut state = self.state.lock();
        state
            .entries
            .iter_mut()
            .map(|entry| {
                let prev = entry.state;
                entry.state = SampleState::Read;
                (entry.sample.clone(), prev)
            })
            .collect()
    }

    /// Number of queued samples whose state satisfies `filter`.
    pub fn count_matching(&self, filter: impl Fn(SampleState) -> bool) -> usize {
        self.state
            .lock()
            .entries
            .iter()
            .filter(|entry| filter(entry.state))
            .count()
    }

    /// Block until a sample can be dequeued, the timeout elapses
    /// (`Ok(None)`) or the queue is closed (`Err(QueueClosed)`).
    ///
    /// `None` waits without limit.
    pub fn wait_pop(
        &self,
        timeout: Option<Duration>,
    ) -> Result<Option<SampleBuffer>, QueueClosed> {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(QueueClosed);
            }
            if let Some(entry) = state.entries.pop_front() {
                drop(state);
                self.space_ready.notify_one();
                return Ok(Some(entry.sample));
            }
            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Ok(None);
                    }
                    // Loop re-checks state after a timed-out wait.
                    let _ = self.data_ready.wait_until(&mut state, deadline);
                }
                None => self.data_ready.wait(&mut state),
            }
        }
    }

    /// Close the queue: refuse further offers, release every held sample
    /// and wake all blocked readers and writers.
    ///
    /// Returns the number of samples dropped. Idempotent.
    pub fn close(&self) -> usize {
        let drained: Vec<QueueEntry> = {
            let mut state = self.state.lock();
            if state.closed {
                return 0;
            }
            state.closed = true;
            state.last_seq.clear();
            state.entries.drain(..).collect()
        };
        self.data_ready.notify_all();
        self.space_ready.notify_all();
        self.matched_writers.store(0, Ordering::Release);
        drained.len()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            received: self.counters.received.load(Ordering::Relaxed),
            evicted: self.counters.evicted.load(Ordering::Relaxed),
            refused: self.counters.refused.load(Ordering::Relaxed),
            duplicates: self.counters.duplicates.load(Ordering::Relaxed),
        }
    }

    /// Writers currently matched with this queue's reader.
    pub fn matched_writers(&self) -> usize {
        self.matched_writers.load(Ordering::Acquire)
    }

    /// Whether this queue ever had a matched writer.
    pub fn ever_matched(&self) -> bool {
        self.ever_matched.load(Ordering::Acquire)
    }

    /// Record the channel's writer count. Called under the channel lock.
    pub(crate) fn set_matched_writers(&self, count: usize) {
        self.matched_writers.store(count, Ordering::Release);
        if count > 0 {
            self.ever_matched.store(true, Ordering::Release);
        }
    }

    /// Mark the queue as removed from (or returned to) its channel. Writers
    /// blocked in [`ReaderQueue::offer_until`] are woken and give up.
    pub(crate) fn set_unmatched(&self, unmatched: bool) {
        self.state.lock().unmatched = unmatched;
        if unmatched {
            self.space_ready.notify_all();
        }
    }

    /// Drop the duplicate-suppression record of a departed writer.
    pub(crate) fn forget_writer(&self, writer: EndpointId) {
        self.state.lock().last_seq.remove(&writer);
    }

    /// Keep duplicate-suppression records only for `writers`.
    pub(crate) fn retain_writers(&self, writers: &[EndpointId]) {
        self.state
            .lock()
            .last_seq
            .retain(|writer, _| writers.contains(writer));
    }

    /// Writers this queue still tracks for duplicate suppression.
    #[cfg(test)]
    pub(crate) fn tracked_writers(&self) -> usize {
        self.state.lock().last_seq.len()
    }

    /// Report a matched-writer change to the installed [`QueueEvents`].
    /// Called after the channel lock is released.
    pub(crate) fn writers_changed(&self, writer: EndpointId, delta: isize) {
        if let Some(events) = &self.events {
            events.on_writers_changed(self.matched_writers(), writer, delta);
        }
    }
}

impl std::fmt::Debug for ReaderQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderQueue")
            .field("id", &self.id)
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .field("len", &self.len())
            .finish()
    }
}
