// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fan-out hub connecting a topic's writers to its matched reader queues.
//!
//! `DistributionChannel` holds reader queues by `Weak` reference only: a
//! dropped reader leaves a dead entry that is pruned on the next snapshot,
//! never a dangling one. The channel lock covers set mutation and the
//! snapshot; per-reader enqueue work runs after the lock is released.
//!
//! # Late joiners
//!
//! Writers with TRANSIENT_LOCAL durability attach their [`HistoryCache`].
//! `match_reader(.., replay = true)` pushes that history into the new
//! reader's queue before it becomes visible to fan-out. Per-writer
//! duplicate suppression in the queue absorbs the overlap between replay
//! and an in-flight publish.
//!
//! # Notifications
//!
//! Match changes and replayed samples are reported to [`QueueEvents`] and
//! [`WriterEvents`] sinks only after the channel lock is dropped, so a sink
//! may call back into the channel.

use super::history_cache::HistoryCache;
use super::metrics::BufferMetrics;
use super::queue::{OfferOutcome, ReaderQueue};
#[cfg(doc)]
use super::queue::QueueEvents;
use super::sample::SampleBuffer;
use crate::core::types::EndpointId;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Instant;

/// How a fan-out treats queues that refuse the sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Never block; refused readers miss the sample.
    BestEffort,
    /// Wait for space in refusing queues until `deadline` (`None` = forever).
    Reliable { deadline: Option<Instant> },
}

/// Per-publish delivery summary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Readers in the snapshot.
    pub matched: usize,
    pub delivered: usize,
    /// Deliveries that evicted an older sample.
    pub evicted: usize,
    /// Readers that did not take the sample (queue full).
    pub refused: usize,
    pub duplicates: usize,
    /// Readers destroyed or unmatched between snapshot and enqueue.
    pub closed: usize,
}

impl FanOutReport {
    fn tally(&mut self, outcome: OfferOutcome) {
        match outcome {
            OfferOutcome::Accepted => self.delivered += 1,
            OfferOutcome::AcceptedWithEviction => {
                self.delivered += 1;
                self.evicted += 1;
            }
            OfferOutcome::Refused => self.refused += 1,
            OfferOutcome::Duplicate => self.duplicates += 1,
            OfferOutcome::Closed => self.closed += 1,
        }
    }
}

/// Observer of a writer's matched-reader count.
pub trait WriterEvents: Send + Sync {
    /// The number of matched readers changed by `delta`; `reader` is the
    /// reader whose arrival or departure caused it.
    fn on_readers_changed(&self, current: usize, reader: EndpointId, delta: isize);
}

struct WriterSlot {
    id: EndpointId,
    history: Option<Arc<HistoryCache>>,
    events: Option<Arc<dyn WriterEvents>>,
}

/// Work collected under the channel lock and run after it is released.
enum Notice {
    Writers {
        queue: Arc<ReaderQueue>,
        writer: EndpointId,
        delta: isize,
    },
    Readers {
        events: Arc<dyn WriterEvents>,
        reader: EndpointId,
        delta: isize,
    },
    Replayed {
        queue: Arc<ReaderQueue>,
        sample: SampleBuffer,
        outcome: OfferOutcome,
        lost: Option<SampleBuffer>,
    },
}

struct ChannelState {
    readers: Vec<Weak<ReaderQueue>>,
    writers: Vec<WriterSlot>,
}

/// Per-topic distribution hub.
pub struct DistributionChannel {
    topic: Arc<str>,
    state: Mutex<ChannelState>,
    metrics: Arc<BufferMetrics>,
}

impl DistributionChannel {
    pub fn new(topic: impl Into<Arc<str>>) -> Self {
        Self {
            topic: topic.into(),
            state: Mutex::new(ChannelState {
                readers: Vec::new(),
                writers: Vec::new(),
            }),
            metrics: Arc::new(BufferMetrics::new()),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Buffer accounting shared by every writer of this topic.
    pub fn metrics(&self) -> &Arc<BufferMetrics> {
        &self.metrics
    }

    /// Live matched readers. Prunes dead entries.
    fn snapshot(&self) -> Vec<Arc<ReaderQueue>> {
        let mut state = self.state.lock();
        let mut live = Vec::with_capacity(state.readers.len());
        state.readers.retain(|weak| match weak.upgrade() {
            Some(queue) => {
                live.push(queue);
                true
            }
            None => false,
        });
        live
    }

    /// Deliver `sample` to every reader matched at snapshot time.
    ///
    /// Each accepting queue retains the sample once. With
    /// [`Delivery::Reliable`], refusing queues are retried after every
    /// other reader was served, each waiting until the shared deadline.
    pub fn fan_out(&self, sample: &SampleBuffer, delivery: Delivery) -> FanOutReport {
        let readers = self.snapshot();
        let mut report = FanOutReport {
            matched: readers.len(),
            ..FanOutReport::default()
        };

        match delivery {
            Delivery::BestEffort => {
                for queue in &readers {
                    report.tally(queue.offer(sample));
                }
            }
            Delivery::Reliable { deadline } => {
                let mut blocked = Vec::new();
                for queue in &readers {
                    match queue.try_offer(sample) {
                        OfferOutcome::Refused => blocked.push(queue),
                        outcome => report.tally(outcome),
                    }
                }
                for queue in blocked {
                    report.tally(queue.offer_until(sample, deadline));
                }
            }
        }

        if report.refused > 0 {
            log::debug!(
                "[channel] '{}' seq {}: {}/{} readers refused",
                self.topic,
                sample.sequence(),
                report.refused,
                report.matched
            );
        }
        report
    }

    /// Add a reader queue to the matched set.
    ///
    /// With `replay`, the history of every TRANSIENT_LOCAL writer is pushed
    /// into the queue first. Returns `false` if the queue was already
    /// matched.
    pub fn match_reader(&self, queue: &Arc<ReaderQueue>, replay: bool) -> bool {
        let mut notices = Vec::new();
        let mut state = self.state.lock();
        state.readers.retain(|weak| weak.strong_count() > 0);
        if state
            .readers
            .iter()
            .any(|weak| Weak::as_ptr(weak) == Arc::as_ptr(queue))
        {
            log::debug!(
                "[channel] '{}' reader {} already matched, ignoring",
                self.topic,
                queue.id()
            );
            return false;
        }

        let writer_ids: Vec<EndpointId> = state.writers.iter().map(|w| w.id).collect();
        queue.retain_writers(&writer_ids);
        queue.set_unmatched(false);
        queue.set_matched_writers(writer_ids.len());
        if let Some(last) = writer_ids.last() {
            notices.push(Notice::Writers {
                queue: Arc::clone(queue),
                writer: *last,
                delta: writer_ids.len() as isize,
            });
        }

        if replay {
            for slot in &state.writers {
                let Some(history) = &slot.history else {
                    continue;
                };
                let mut replayed = 0usize;
                for sample in history.snapshot() {
                    let (outcome, lost) = queue.offer_deferred(&sample);
                    if outcome.is_accepted() {
                        replayed += 1;
                    }
                    notices.push(Notice::Replayed {
                        queue: Arc::clone(queue),
                        sample,
                        outcome,
                        lost,
                    });
                }
                log::debug!(
                    "[channel] '{}' replayed {} samples from writer {} to reader {}",
                    self.topic,
                    replayed,
                    slot.id,
                    queue.id()
                );
            }
        }

        state.readers.push(Arc::downgrade(queue));
        notices.extend(Self::reader_notices(&state, queue.id(), 1));
        log::debug!(
            "[channel] '{}' matched reader {}, now {} readers",
            self.topic,
            queue.id(),
            state.readers.len()
        );
        drop(state);
        self.dispatch(notices);
        true
    }

    /// Remove a reader queue from the matched set.
    ///
    /// Samples already in the queue stay there for the reader to drain.
    /// Writers blocked on the queue for space stop waiting.
    pub fn unmatch_reader(&self, queue: &Arc<ReaderQueue>) -> bool {
        let mut notices = Vec::new();
        let mut state = self.state.lock();
        let before = state.readers.len();
        state
            .readers
            .retain(|weak| weak.strong_count() > 0 && Weak::as_ptr(weak) != Arc::as_ptr(queue));
        let removed = state.readers.len() != before;
        queue.set_unmatched(true);
        queue.set_matched_writers(0);
        if removed {
            if let Some(last) = state.writers.last() {
                notices.push(Notice::Writers {
                    queue: Arc::clone(queue),
                    writer: last.id,
                    delta: -(state.writers.len() as isize),
                });
            }
            notices.extend(Self::reader_notices(&state, queue.id(), -1));
            log::debug!(
                "[channel] '{}' unmatched reader {}",
                self.topic,
                queue.id()
            );
        }
        drop(state);
        self.dispatch(notices);
        removed
    }

    /// Register a writer; updates the matched-writer count of every reader.
    pub fn attach_writer(
        &self,
        id: EndpointId,
        history: Option<Arc<HistoryCache>>,
        events: Option<Arc<dyn WriterEvents>>,
    ) -> bool {
        let mut state = self.state.lock();
        if state.writers.iter().any(|w| w.id == id) {
            return false;
        }
        let count = state.writers.len() + 1;
        let readers = Self::publish_writer_count(&mut state, count);
        let mut notices = Self::writer_notices(&readers, id, 1);
        if let (Some(events), Some(last)) = (&events, readers.last()) {
            notices.push(Notice::Readers {
                events: Arc::clone(events),
                reader: last.id(),
                delta: readers.len() as isize,
            });
        }
        state.writers.push(WriterSlot {
            id,
            history,
            events,
        });
        drop(state);
        self.dispatch(notices);
        true
    }

    /// Unregister a writer. Reader queues forget its sequence numbers.
    pub fn detach_writer(&self, id: EndpointId) -> bool {
        let mut state = self.state.lock();
        let before = state.writers.len();
        state.writers.retain(|w| w.id != id);
        if state.writers.len() == before {
            return false;
        }
        let count = state.writers.len();
        let readers = Self::publish_writer_count(&mut state, count);
        for queue in &readers {
            queue.forget_writer(id);
        }
        let notices = Self::writer_notices(&readers, id, -1);
        drop(state);
        self.dispatch(notices);
        true
    }

    /// Set every live reader's matched-writer count; returns those readers.
    fn publish_writer_count(state: &mut ChannelState, count: usize) -> Vec<Arc<ReaderQueue>> {
        let mut live = Vec::with_capacity(state.readers.len());
        state.readers.retain(|weak| match weak.upgrade() {
            Some(queue) => {
                queue.set_matched_writers(count);
                live.push(queue);
                true
            }
            None => false,
        });
        live
    }

    fn writer_notices(readers: &[Arc<ReaderQueue>], writer: EndpointId, delta: isize) -> Vec<Notice> {
        readers
            .iter()
            .map(|queue| Notice::Writers {
                queue: Arc::clone(queue),
                writer,
                delta,
            })
            .collect()
    }

    fn reader_notices(state: &ChannelState, reader: EndpointId, delta: isize) -> Vec<Notice> {
        state
            .writers
            .iter()
            .filter_map(|slot| slot.events.as_ref())
            .map(|events| Notice::Readers {
                events: Arc::clone(events),
                reader,
                delta,
            })
            .collect()
    }

    fn dispatch(&self, notices: Vec<Notice>) {
        if notices.is_empty() {
            return;
        }
        let readers = self.matched_reader_count();
        for notice in notices {
            match notice {
                Notice::Writers {
                    queue,
                    writer,
                    delta,
                } => queue.writers_changed(writer, delta),
                Notice::Readers {
                    events,
                    reader,
                    delta,
                } => events.on_readers_changed(readers, reader, delta),
                Notice::Replayed {
                    queue,
                    sample,
                    outcome,
                    lost,
                } => queue.run_hooks(&sample, outcome, lost.as_ref()),
            }
        }
    }

    pub fn matched_reader_count(&self) -> usize {
        self.state
            .lock()
            .readers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn writer_count(&self) -> usize {
        self.state.lock().writers.len()
    }
}

impl std::fmt::Debug for DistributionChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributionChannel")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}
