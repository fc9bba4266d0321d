// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DataReader: drains one topic's samples from a bounded history queue.
//!
//! # State machine
//!
//! ```text
//! Registered --(writer attaches)--> Matched <--> Unmatched --(destroy)--> Destroyed
//!      |                                                                      ^
//!      +----------------------------------(destroy)---------------------------+
//! ```
//!
//! `Matched` means at least one writer is attached to the topic while this
//! reader is matched with the channel. An `Unmatched` reader keeps its
//! backlog and can still `take()` it.
//!
//! `destroy()` (also run on drop) unmatches the reader, releases every
//! queued sample and wakes all threads blocked in `wait_for_sample`, which
//! then return [`Error::Unregistered`].
//!
//! # Events
//!
//! A [`DataReaderListener`] given at creation is called on data arrival,
//! sample loss, rejection and writer matching. Without one, those events
//! raise bits on the reader's [`StatusCondition`]. Any number of
//! [`ReadCondition`]s can watch the queue for WaitSet-based waiting.

mod status;

use crate::core::rt::{DistributionChannel, QueueEvents, ReaderQueue, SampleBuffer, SampleState};
use crate::core::types::{EndpointId, SequenceNumber, Time};
use crate::dds::condition::{HasStatusCondition, ReadCondition, SampleStateMask, StatusCondition};
use crate::dds::listener::{
    DataReaderListener, SampleLostStatus, SampleRejectedStatus, SubscriptionMatchedStatus,
};
use crate::dds::topic_registry::Registration;
use crate::dds::{Error, QoS, Result};
use status::ReaderStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub use crate::core::rt::QueueStats as ReaderStats;

/// Reader lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReaderState {
    /// Registered, never matched with a writer.
    Registered,
    /// At least one writer matched.
    Matched,
    /// Was matched, currently no writer. Backlog still readable.
    Unmatched,
    /// Terminal.
    Destroyed,
}

/// Metadata returned alongside samples by [`DataReader::read`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleInfo {
    /// Whether an earlier `read()` already returned this sample.
    pub sample_state: SampleState,
    pub sequence: SequenceNumber,
    /// Writer that published the sample.
    pub publication_handle: EndpointId,
    pub source_timestamp: Time,
}

impl SampleInfo {
    fn new(sample: &SampleBuffer, sample_state: SampleState) -> Self {
        Self {
            sample_state,
            sequence: sample.sequence(),
            publication_handle: sample.writer(),
            source_timestamp: sample.source_timestamp(),
        }
    }
}

pub struct DataReader {
    id: EndpointId,
    qos: QoS,
    channel: Arc<DistributionChannel>,
    queue: Arc<ReaderQueue>,
    status: Arc<ReaderStatus>,
    destroyed: AtomicBool,
    registration: Registration,
}

impl DataReader {
    pub(crate) fn new(
        id: EndpointId,
        qos: QoS,
        registration: Registration,
        listener: Option<Arc<dyn DataReaderListener>>,
    ) -> Self {
        let channel = Arc::clone(registration.entry().channel());
        let status = Arc::new(ReaderStatus::new(listener));
        let queue = Arc::new(ReaderQueue::with_events(
            id,
            qos.history_depth(),
            qos.overflow_policy(),
            Some(Arc::clone(&status) as Arc<dyn QueueEvents>),
        ));
        channel.match_reader(&queue, qos.is_transient_local());

        log::debug!(
            "[reader] {} created on '{}' (depth {}, {:?})",
            id,
            channel.topic(),
            queue.capacity(),
            queue.policy()
        );

        Self {
            id,
            qos,
            channel,
            queue,
            status,
            destroyed: AtomicBool::new(false),
            registration,
        }
    }

    /// Dequeue the oldest sample without blocking.
    ///
    /// The returned handle holds one reference; dropping it releases it.
    pub fn take(&self) -> Option<SampleBuffer> {
        if self.is_destroyed() {
            return None;
        }
        self.status.data_consumed();
        self.queue.pop()
    }

    /// Dequeue the oldest sample and hand it to `f`; the reference is
    /// released when `f` returns.
    pub fn take_with<R>(&self, f: impl FnOnce(&SampleBuffer) -> R) -> Option<R> {
        let sample = self.take()?;
        Some(f(&sample))
    }

    /// Dequeue up to `max` samples in FIFO order.
    pub fn take_batch(&self, max: usize) -> Vec<SampleBuffer> {
        if self.is_destroyed() {
            return Vec::new();
        }
        self.status.data_consumed();
        self.queue.pop_batch(max)
    }

    /// Non-destructive read of every queued sample.
    ///
    /// Samples stay queued and are marked `Read` for later calls.
    pub fn read(&self) -> Vec<(SampleBuffer, SampleInfo)> {
        if self.is_destroyed() {
            return Vec::new();
        }
        self.status.data_consumed();
        let samples: Vec<(SampleBuffer, SampleInfo)> = self
            .queue
            .read_all()
            .into_iter()
            .map(|(sample, state)| {
                let info = SampleInfo::new(&sample, state);
                (sample, info)
            })
            .collect();
        if !samples.is_empty() {
            // Samples moved to READ; conditions on that state may now hold.
            self.status.notify_read_conditions();
        }
        samples
    }

    /// Block until a sample arrives, `timeout` elapses (`Ok(None)`) or the
    /// reader is destroyed (`Err(Unregistered)`). `None` waits forever.
    pub fn wait_for_sample(&self, timeout: Option<Duration>) -> Result<Option<SampleBuffer>> {
        if self.is_destroyed() {
            return Err(Error::Unregistered);
        }
        let sample = self
            .queue
            .wait_pop(timeout)
            .map_err(|_| Error::Unregistered)?;
        if sample.is_some() {
            self.status.data_consumed();
        }
        Ok(sample)
    }

    /// Destroy the reader: unmatch, release the backlog, wake waiters and
    /// unregister. Idempotent.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.channel.unmatch_reader(&self.queue);
        let dropped = self.queue.close();
        self.registration.release();
        log::debug!(
            "[reader] {} destroyed on '{}', released {} queued samples",
            self.id,
            self.channel.topic(),
            dropped
        );
    }

    /// Stop receiving new samples; the backlog stays readable.
    pub fn unmatch(&self) -> Result<()> {
        if self.is_destroyed() {
            return Err(Error::Unregistered);
        }
        self.channel.unmatch_reader(&self.queue);
        Ok(())
    }

    /// Match again after [`unmatch`](Self::unmatch). TRANSIENT_LOCAL readers
    /// get writer history replayed; samples already received are skipped.
    pub fn rematch(&self) -> Result<()> {
        if self.is_destroyed() {
            return Err(Error::Unregistered);
        }
        self.channel
            .match_reader(&self.queue, self.qos.is_transient_local());
        Ok(())
    }

    pub fn state(&self) -> ReaderState {
        if self.is_destroyed() {
            ReaderState::Destroyed
        } else if self.queue.matched_writers() > 0 {
            ReaderState::Matched
        } else if self.queue.ever_matched() {
            ReaderState::Unmatched
        } else {
            ReaderState::Registered
        }
    }

    #[inline]
    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    #[inline]
    pub fn id(&self) -> EndpointId {
        self.id
    }

    pub fn topic_name(&self) -> &str {
        self.channel.topic()
    }

    pub fn qos(&self) -> &QoS {
        &self.qos
    }

    /// Channel this reader is fed from.
    pub fn channel(&self) -> &Arc<DistributionChannel> {
        &self.channel
    }

    /// This reader's history queue.
    pub fn queue(&self) -> &Arc<ReaderQueue> {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn matched_writers(&self) -> usize {
        self.queue.matched_writers()
    }

    pub fn stats(&self) -> ReaderStats {
        self.queue.stats()
    }

    /// Condition over this reader's queued samples, for use with a
    /// [`WaitSet`](crate::dds::WaitSet).
    pub fn create_read_condition(&self, sample_states: SampleStateMask) -> Arc<ReadCondition> {
        let condition = Arc::new(ReadCondition::new(&self.queue, sample_states));
        self.status.add_read_condition(&condition);
        condition
    }

    /// Matched-writer status; resets its change counters.
    pub fn subscription_matched_status(&self) -> SubscriptionMatchedStatus {
        self.status.subscription_matched()
    }

    /// Lost-sample status; resets its change counter.
    pub fn sample_lost_status(&self) -> SampleLostStatus {
        self.status.sample_lost()
    }

    /// Rejected-sample status; resets its change counter.
    pub fn sample_rejected_status(&self) -> SampleRejectedStatus {
        self.status.sample_rejected()
    }
}

impl HasStatusCondition for DataReader {
    fn get_status_condition(&self) -> Arc<StatusCondition> {
        Arc::clone(self.status.condition())
    }
}

impl Drop for DataReader {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for DataReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataReader")
            .field("id", &self.id)
            .field("topic", &self.topic_name())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests;
