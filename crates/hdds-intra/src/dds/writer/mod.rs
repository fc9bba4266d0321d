// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DataWriter: publishes byte payloads into one topic's channel.
//!
//! Each publish allocates one [`SampleBuffer`] with the next per-writer
//! sequence number (starting at 1) and fans it out to every matched reader.
//! Publishes of one writer are serialized, so every reader sees that
//! writer's samples in sequence order.
//!
//! # Reliability
//!
//! - `BestEffort`: never blocks. Readers whose KEEP_ALL queue is full miss
//!   the sample.
//! - `Reliable`: waits for room in full KEEP_ALL queues until the timeout
//!   (`QoS::max_blocking_time` or the per-call override). On timeout the
//!   call returns [`Error::PublishTimeout`]; readers that accepted the
//!   sample keep it.
//!
//! Matched-reader changes reach a [`DataWriterListener`] given at creation,
//! or raise PUBLICATION_MATCHED on the writer's [`StatusCondition`].

mod status;

use crate::core::rt::{
    Delivery, DistributionChannel, HistoryCache, SampleBuffer, SampleHeader, WriterEvents,
};
use crate::core::types::{EndpointId, SequenceNumber, Time};
use crate::dds::condition::{HasStatusCondition, StatusCondition};
use crate::dds::listener::{DataWriterListener, PublicationMatchedStatus};
use crate::dds::topic_registry::Registration;
use crate::dds::{Error, QoS, Result};
use status::WriterStatus;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Writer-side counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Samples published (including timed-out ones).
    pub published: u64,
    /// Reader deliveries across all publishes.
    pub delivered: u64,
    /// Deliveries that evicted an older sample from a reader.
    pub evicted: u64,
    /// Reader deliveries that did not happen because the queue was full.
    pub refused: u64,
    /// Reliable publishes that returned `PublishTimeout`.
    pub timeouts: u64,
}

#[derive(Default)]
struct Counters {
    published: AtomicU64,
    delivered: AtomicU64,
    evicted: AtomicU64,
    refused: AtomicU64,
    timeouts: AtomicU64,
}

pub struct DataWriter {
    id: EndpointId,
    qos: QoS,
    channel: Arc<DistributionChannel>,
    history: Option<Arc<HistoryCache>>,
    /// Next sequence number; also the per-writer publish lock.
    next_seq: Mutex<SequenceNumber>,
    counters: Counters,
    status: Arc<WriterStatus>,
    registration: Registration,
}

impl DataWriter {
    pub(crate) fn new(
        id: EndpointId,
        qos: QoS,
        registration: Registration,
        listener: Option<Arc<dyn DataWriterListener>>,
    ) -> Self {
        let channel = Arc::clone(registration.entry().channel());
        let history = qos
            .is_transient_local()
            .then(|| Arc::new(HistoryCache::new(qos.history_depth())));
        let status = Arc::new(WriterStatus::new(listener));
        channel.attach_writer(
            id,
            history.clone(),
            Some(Arc::clone(&status) as Arc<dyn WriterEvents>),
        );

        log::debug!(
            "[writer] {} created on '{}' ({:?}, {:?})",
            id,
            channel.topic(),
            qos.reliability,
            qos.durability
        );

        Self {
            id,
            qos,
            channel,
            history,
            next_seq: Mutex::new(SequenceNumber::FIRST),
            counters: Counters::default(),
            status,
            registration,
        }
    }

    /// Publish a payload. Returns the sample's sequence number.
    ///
    /// Reliable writers wait up to `QoS::max_blocking_time`.
    pub fn publish(&self, payload: impl Into<Box<[u8]>>) -> Result<SequenceNumber> {
        self.publish_inner(payload.into(), Time::now(), self.qos.max_blocking_time)
    }

    /// Publish with an explicit reliable timeout. `Duration::ZERO` tries once.
    ///
    /// Best-effort writers ignore `timeout`.
    pub fn publish_with_timeout(
        &self,
        payload: impl Into<Box<[u8]>>,
        timeout: Duration,
    ) -> Result<SequenceNumber> {
        self.publish_inner(payload.into(), Time::now(), timeout)
    }

    /// Publish with a caller-supplied source timestamp.
    pub fn publish_with_timestamp(
        &self,
        payload: impl Into<Box<[u8]>>,
        source_timestamp: Time,
    ) -> Result<SequenceNumber> {
        self.publish_inner(payload.into(), source_timestamp, self.qos.max_blocking_time)
    }

    fn publish_inner(
        &self,
        payload: Box<[u8]>,
        source_timestamp: Time,
        timeout: Duration,
    ) -> Result<SequenceNumber> {
        let delivery = if self.qos.is_reliable() {
            Delivery::Reliable {
                deadline: Instant::now().checked_add(timeout),
            }
        } else {
            Delivery::BestEffort
        };

        let mut next_seq = self.next_seq.lock();
        let sequence = *next_seq;
        *next_seq = sequence.next();

        let sample = SampleBuffer::with_header(
            SampleHeader {
                sequence,
                writer: self.id,
                source_timestamp,
            },
            payload,
            Some(Arc::clone(self.channel.metrics())),
        );
        if let Some(history) = &self.history {
            history.insert(&sample);
        }
        let report = self.channel.fan_out(&sample, delivery);
        drop(next_seq);

        self.counters.published.fetch_add(1, Ordering::Relaxed);
        self.counters
            .delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.counters
            .evicted
            .fetch_add(report.evicted as u64, Ordering::Relaxed);
        self.counters
            .refused
            .fetch_add(report.refused as u64, Ordering::Relaxed);

        if report.refused > 0 && self.qos.is_reliable() {
            self.counters.timeouts.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "[writer] {} on '{}': seq {} timed out, {} of {} readers did not accept",
                self.id,
                self.channel.topic(),
                sequence,
                report.refused,
                report.matched
            );
            return Err(Error::PublishTimeout {
                sequence,
                undelivered: report.refused,
            });
        }
        self.status.written(sequence);
        Ok(sequence)
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

    /// Channel this writer publishes into.
    pub fn channel(&self) -> &Arc<DistributionChannel> {
        &self.channel
    }

    /// Readers currently matched on this writer's topic.
    pub fn matched_readers(&self) -> usize {
        self.channel.matched_reader_count()
    }

    /// Samples retained for late joiners (TRANSIENT_LOCAL only).
    pub fn history_len(&self) -> usize {
        self.history.as_ref().map_or(0, |h| h.len())
    }

    pub fn stats(&self) -> WriterStats {
        WriterStats {
            published: self.counters.published.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            evicted: self.counters.evicted.load(Ordering::Relaxed),
            refused: self.counters.refused.load(Ordering::Relaxed),
            timeouts: self.counters.timeouts.load(Ordering::Relaxed),
        }
    }

    /// Matched-reader status; resets its change counters.
    pub fn publication_matched_status(&self) -> PublicationMatchedStatus {
        self.status.publication_matched()
    }
}

impl HasStatusCondition for DataWriter {
    fn get_status_condition(&self) -> Arc<StatusCondition> {
        Arc::clone(self.status.condition())
    }
}

impl Drop for DataWriter {
    fn drop(&mut self) {
        self.channel.detach_writer(self.id);
        self.registration.release();
        log::debug!("[writer] {} dropped from '{}'", self.id, self.channel.topic());
    }
}

impl std::fmt::Debug for DataWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataWriter")
            .field("id", &self.id)
            .field("topic", &self.topic_name())
            .field("reliability", &self.qos.reliability)
            .finish()
    }
}
