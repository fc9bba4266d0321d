// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Listener callbacks for DataReader and DataWriter events.
//!
//! Listeners are installed when the endpoint is created and are invoked on
//! the thread that caused the event:
//!
//! | Event | Raised by |
//! |-------|-----------|
//! | `on_data_available` | the publishing writer, after the sample is queued |
//! | `on_sample_lost` | the publishing writer, when an unread sample is evicted |
//! | `on_sample_rejected` | the publishing writer, when a full KEEP_ALL queue refuses |
//! | `on_subscription_matched` | whoever attached/detached a writer or (un)matched the reader |
//! | `on_publication_matched` | whoever (un)matched a reader or created the writer |
//! | `on_sample_written` | the publishing thread, after a successful publish |
//!
//! No registry, channel or queue lock is held during a callback. A reader
//! callback does run while the triggering writer holds its publish lock,
//! so it must not publish on that same writer.
//!
//! A status passed to a listener carries the changes since the previous
//! notification; the change counters are reset afterwards. Endpoints
//! without a listener raise the matching bit of their
//! [`StatusCondition`](super::condition::StatusCondition) instead.
//!
//! # Example
//!
//! ```rust,no_run
//! use hdds_intra::dds::listener::ClosureListener;
//! use hdds_intra::{Participant, QoS};
//! use std::sync::Arc;
//!
//! # fn main() -> hdds_intra::Result<()> {
//! let participant = Participant::builder("app").build()?;
//! let topic = participant.create_topic("sensors/temperature", "Temperature")?;
//! let listener = ClosureListener::new(|sample| {
//!     println!("seq {} ({} bytes)", sample.sequence(), sample.len());
//! });
//! let _reader = participant.create_reader_with_listener(&topic, QoS::default(), Arc::new(listener))?;
//! # Ok(())
//! # }
//! ```

use crate::core::rt::SampleBuffer;
use crate::core::types::{EndpointId, SequenceNumber};

// ============================================================================
// Status Types
// ============================================================================

/// Subscription matched status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriptionMatchedStatus {
    /// Writers ever matched.
    pub total_count: u32,
    /// Change in total_count since the last notification.
    pub total_count_change: i32,
    /// Writers currently matched.
    pub current_count: u32,
    /// Change in current_count since the last notification.
    pub current_count_change: i32,
    /// Writer whose arrival or departure caused the last change.
    pub last_publication_handle: Option<EndpointId>,
}

/// Publication matched status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublicationMatchedStatus {
    /// Readers ever matched.
    pub total_count: u32,
    /// Change in total_count since the last notification.
    pub total_count_change: i32,
    /// Readers currently matched.
    pub current_count: u32,
    /// Change in current_count since the last notification.
    pub current_count_change: i32,
    /// Reader whose arrival or departure caused the last change.
    pub last_subscription_handle: Option<EndpointId>,
}

/// Samples evicted from a KEEP_LAST queue before they were read or taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleLostStatus {
    pub total_count: u32,
    pub total_count_change: i32,
}

/// Samples a full KEEP_ALL queue refused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleRejectedStatus {
    pub total_count: u32,
    pub total_count_change: i32,
    pub last_reason: SampleRejectedReason,
    /// Writer of the last rejected sample.
    pub last_publication_handle: Option<EndpointId>,
}

/// Reason for sample rejection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SampleRejectedReason {
    #[default]
    NotRejected,
    /// The queue already held `max_samples` samples.
    ResourceLimit,
}

/// Status with change counters that reset once reported.
pub(crate) trait StatusChanges: Copy {
    /// Return the status as it stands and reset its change counters.
    fn take_changes(&mut self) -> Self;
}

impl StatusChanges for SubscriptionMatchedStatus {
    fn take_changes(&mut self) -> Self {
        let snapshot = *self;
        self.total_count_change = 0;
        self.current_count_change = 0;
        snapshot
    }
}

impl StatusChanges for PublicationMatchedStatus {
    fn take_changes(&mut self) -> Self {
        let snapshot = *self;
        self.total_count_change = 0;
        self.current_count_change = 0;
        snapshot
    }
}

impl StatusChanges for SampleLostStatus {
    fn take_changes(&mut self) -> Self {
        let snapshot = *self;
        self.total_count_change = 0;
        snapshot
    }
}

impl StatusChanges for SampleRejectedStatus {
    fn take_changes(&mut self) -> Self {
        let snapshot = *self;
        self.total_count_change = 0;
        snapshot
    }
}

/// Fold one match change into `(total, total_change, current, current_change)`.
fn record_match(
    counts: (&mut u32, &mut i32, &mut u32, &mut i32),
    current: usize,
    delta: isize,
) {
    let (total, total_change, current_count, current_change) = counts;
    if delta > 0 {
        let added = u32::try_from(delta).unwrap_or(u32::MAX);
        *total = total.saturating_add(added);
        *total_change = total_change.saturating_add(added as i32);
    }
    let current = u32::try_from(current).unwrap_or(u32::MAX);
    *current_change = current_change.saturating_add(current as i32 - *current_count as i32);
    *current_count = current;
}

impl SubscriptionMatchedStatus {
    pub(crate) fn record(&mut self, current: usize, writer: EndpointId, delta: isize) {
        record_match(
            (
                &mut self.total_count,
                &mut self.total_count_change,
                &mut self.current_count,
                &mut self.current_count_change,
            ),
            current,
            delta,
        );
        self.last_publication_handle = Some(writer);
    }
}

impl PublicationMatchedStatus {
    pub(crate) fn record(&mut self, current: usize, reader: EndpointId, delta: isize) {
        record_match(
            (
                &mut self.total_count,
                &mut self.total_count_change,
                &mut self.current_count,
                &mut self.current_count_change,
            ),
            current,
            delta,
        );
        self.last_subscription_handle = Some(reader);
    }
}

impl SampleLostStatus {
    pub(crate) fn record(&mut self) {
        self.total_count = self.total_count.saturating_add(1);
        self.total_count_change = self.total_count_change.saturating_add(1);
    }
}

impl SampleRejectedStatus {
    pub(crate) fn record(&mut self, writer: EndpointId) {
        self.total_count = self.total_count.saturating_add(1);
        self.total_count_change = self.total_count_change.saturating_add(1);
        self.last_reason = SampleRejectedReason::ResourceLimit;
        self.last_publication_handle = Some(writer);
    }
}

// ============================================================================
// Listener Traits
// ============================================================================

/// Listener for DataReader events.
///
/// All methods have default no-op implementations. Callbacks should return
/// quickly; see the module docs for the thread they run on.
pub trait DataReaderListener: Send + Sync {
    /// A sample was queued for this reader. The reference is only borrowed;
    /// clone it to keep the payload past the callback.
    fn on_data_available(&self, sample: &SampleBuffer) {
        let _ = sample;
    }

    /// A writer was matched or unmatched.
    fn on_subscription_matched(&self, status: SubscriptionMatchedStatus) {
        let _ = status;
    }

    /// An unread sample was evicted by a newer one.
    fn on_sample_lost(&self, status: SampleLostStatus) {
        let _ = status;
    }

    /// A sample was refused because the queue was full.
    fn on_sample_rejected(&self, status: SampleRejectedStatus) {
        let _ = status;
    }
}

/// Listener for DataWriter events.
///
/// All methods have default no-op implementations.
pub trait DataWriterListener: Send + Sync {
    /// A publish completed without timing out.
    fn on_sample_written(&self, sequence: SequenceNumber) {
        let _ = sequence;
    }

    /// A reader was matched or unmatched.
    fn on_publication_matched(&self, status: PublicationMatchedStatus) {
        let _ = status;
    }
}

// ============================================================================
// Closure-based Listener
// ============================================================================

/// Reader listener that only handles `on_data_available`.
///
/// ```rust
/// use hdds_intra::dds::listener::{ClosureListener, DataReaderListener};
///
/// let listener = ClosureListener::new(|sample| println!("{} bytes", sample.len()));
/// # let _: &dyn DataReaderListener = &listener;
/// ```
pub struct ClosureListener<F>
where
    F: Fn(&SampleBuffer) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureListener<F>
where
    F: Fn(&SampleBuffer) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> DataReaderListener for ClosureListener<F>
where
    F: Fn(&SampleBuffer) + Send + Sync,
{
    fn on_data_available(&self, sample: &SampleBuffer) {
        (self.callback)(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_closure_listener() {
        let counter = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&counter);
        let listener = ClosureListener::new(move |sample: &SampleBuffer| {
            assert_eq!(sample.payload(), b"x");
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let sample = SampleBuffer::new(SequenceNumber(1), b"x".to_vec());
        listener.on_data_available(&sample);
        listener.on_data_available(&sample);
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        // Other callbacks are no-ops.
        listener.on_sample_lost(SampleLostStatus::default());
        assert_eq!(sample.ref_count(), 1);
    }

    #[test]
    fn test_status_defaults() {
        let status = SubscriptionMatchedStatus::default();
        assert_eq!(status.total_count, 0);
        assert_eq!(status.current_count, 0);
        assert!(status.last_publication_handle.is_none());

        let rejected = SampleRejectedStatus::default();
        assert_eq!(rejected.last_reason, SampleRejectedReason::NotRejected);
    }

    #[test]
    fn test_matched_status_changes_reset_after_take() {
        let a = EndpointId::next();
        let b = EndpointId::next();
        let mut status = SubscriptionMatchedStatus::default();
        status.record(1, a, 1);
        status.record(2, b, 1);

        let first = status.take_changes();
        assert_eq!(first.total_count, 2);
        assert_eq!(first.total_count_change, 2);
        assert_eq!(first.current_count, 2);
        assert_eq!(first.current_count_change, 2);
        assert_eq!(first.last_publication_handle, Some(b));

        status.record(0, a, -2);
        let second = status.take_changes();
        assert_eq!(second.total_count, 2);
        assert_eq!(second.total_count_change, 0);
        assert_eq!(second.current_count, 0);
        assert_eq!(second.current_count_change, -2);

        assert_eq!(status.take_changes().current_count_change, 0);
    }

    #[test]
    fn test_rejected_status_records_reason() {
        let writer = EndpointId::next();
        let mut status = SampleRejectedStatus::default();
        status.record(writer);
        status.record(writer);
        let taken = status.take_changes();
        assert_eq!(taken.total_count, 2);
        assert_eq!(taken.total_count_change, 2);
        assert_eq!(taken.last_reason, SampleRejectedReason::ResourceLimit);
        assert_eq!(taken.last_publication_handle, Some(writer));
        assert_eq!(status.total_count_change, 0);
    }

    struct NoopListener;
    impl DataReaderListener for NoopListener {}
    impl DataWriterListener for NoopListener {}

    #[test]
    fn test_noop_listeners() {
        let listener = NoopListener;
        let sample = SampleBuffer::new(SequenceNumber(1), vec![0u8]);
        DataReaderListener::on_data_available(&listener, &sample);
        DataReaderListener::on_subscription_matched(&listener, SubscriptionMatchedStatus::default());
        DataWriterListener::on_sample_written(&listener, SequenceNumber(1));
        DataWriterListener::on_publication_matched(&listener, PublicationMatchedStatus::default());
    }
}
