// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reader-side status bookkeeping, fed by the reader's queue events.

use crate::core::rt::{QueueEvents, SampleBuffer};
use crate::core::types::EndpointId;
use crate::dds::condition::{ReadCondition, StatusCondition, StatusMask};
use crate::dds::listener::{
    DataReaderListener, SampleLostStatus, SampleRejectedStatus, StatusChanges,
    SubscriptionMatchedStatus,
};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

pub(crate) struct ReaderStatus {
    listener: Option<Arc<dyn DataReaderListener>>,
    condition: Arc<StatusCondition>,
    read_conditions: Mutex<Vec<Weak<ReadCondition>>>,
    matched: Mutex<SubscriptionMatchedStatus>,
    lost: Mutex<SampleLostStatus>,
    rejected: Mutex<SampleRejectedStatus>,
}

impl ReaderStatus {
    pub(crate) fn new(listener: Option<Arc<dyn DataReaderListener>>) -> Self {
        Self {
            listener,
            condition: Arc::new(StatusCondition::new()),
            read_conditions: Mutex::new(Vec::new()),
            matched: Mutex::new(SubscriptionMatchedStatus::default()),
            lost: Mutex::new(SampleLostStatus::default()),
            rejected: Mutex::new(SampleRejectedStatus::default()),
        }
    }

    pub(crate) fn condition(&self) -> &Arc<StatusCondition> {
        &self.condition
    }

    pub(crate) fn add_read_condition(&self, condition: &Arc<ReadCondition>) {
        let mut conditions = self.read_conditions.lock();
        conditions.retain(|weak| weak.strong_count() > 0);
        conditions.push(Arc::downgrade(condition));
    }

    /// Wake the WaitSets of every live read condition.
    pub(crate) fn notify_read_conditions(&self) {
        let live: Vec<Arc<ReadCondition>> = {
            let mut conditions = self.read_conditions.lock();
            conditions.retain(|weak| weak.strong_count() > 0);
            conditions.iter().filter_map(Weak::upgrade).collect()
        };
        for condition in live {
            condition.notify_waitsets();
        }
    }

    /// A read or take consumed the DATA_AVAILABLE status.
    pub(crate) fn data_consumed(&self) {
        self.condition.clear(StatusMask::DATA_AVAILABLE);
    }

    pub(crate) fn subscription_matched(&self) -> SubscriptionMatchedStatus {
        self.condition.clear(StatusMask::SUBSCRIPTION_MATCHED);
        self.matched.lock().take_changes()
    }

    pub(crate) fn sample_lost(&self) -> SampleLostStatus {
        self.condition.clear(StatusMask::SAMPLE_LOST);
        self.lost.lock().take_changes()
    }

    pub(crate) fn sample_rejected(&self) -> SampleRejectedStatus {
        self.condition.clear(StatusMask::SAMPLE_REJECTED);
        self.rejected.lock().take_changes()
    }

    /// Apply `update`, then either hand the changes to the listener or
    /// raise `mask` on the status condition.
    fn report<S: StatusChanges>(
        &self,
        status: &Mutex<S>,
        mask: StatusMask,
        update: impl FnOnce(&mut S),
        call: impl FnOnce(&dyn DataReaderListener, S),
    ) {
        let mut guard = status.lock();
        update(&mut guard);
        match &self.listener {
            Some(listener) => {
                let changes = guard.take_changes();
                drop(guard);
                call(listener.as_ref(), changes);
            }
            None => {
                drop(guard);
                self.condition.raise(mask);
            }
        }
    }
}

impl QueueEvents for ReaderStatus {
    fn on_accepted(&self, sample: &SampleBuffer) {
        self.notify_read_conditions();
        match &self.listener {
            Some(listener) => listener.on_data_available(sample),
            None => self.condition.raise(StatusMask::DATA_AVAILABLE),
        }
    }

    fn on_lost(&self, sample: &SampleBuffer) {
        log::debug!(
            "[reader] lost unread seq {} from {}",
            sample.sequence(),
            sample.writer()
        );
        self.report(
            &self.lost,
            StatusMask::SAMPLE_LOST,
            |status| status.record(),
            |listener, status| listener.on_sample_lost(status),
        );
    }

    fn on_refused(&self, sample: &SampleBuffer) {
        self.report(
            &self.rejected,
            StatusMask::SAMPLE_REJECTED,
            |status| status.record(sample.writer()),
            |listener, status| listener.on_sample_rejected(status),
        );
    }

    fn on_writers_changed(&self, current: usize, writer: EndpointId, delta: isize) {
        self.report(
            &self.matched,
            StatusMask::SUBSCRIPTION_MATCHED,
            |status| status.record(current, writer, delta),
            |listener, status| listener.on_subscription_matched(status),
        );
    }
}

impl std::fmt::Debug for ReaderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderStatus")
            .field("has_listener", &self.listener.is_some())
            .field("condition", &self.condition)
            .finish_non_exhaustive()
    }
}
