// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Writer-side status bookkeeping, fed by the channel's matching events.

use crate::core::rt::WriterEvents;
use crate::core::types::{EndpointId, SequenceNumber};
use crate::dds::condition::{StatusCondition, StatusMask};
use crate::dds::listener::{DataWriterListener, PublicationMatchedStatus, StatusChanges};
use parking_lot::Mutex;
use std::sync::Arc;

pub(crate) struct WriterStatus {
    listener: Option<Arc<dyn DataWriterListener>>,
    condition: Arc<StatusCondition>,
    matched: Mutex<PublicationMatchedStatus>,
}

impl WriterStatus {
    pub(crate) fn new(listener: Option<Arc<dyn DataWriterListener>>) -> Self {
        Self {
            listener,
            condition: Arc::new(StatusCondition::new()),
            matched: Mutex::new(PublicationMatchedStatus::default()),
        }
    }

    pub(crate) fn condition(&self) -> &Arc<StatusCondition> {
        &self.condition
    }

    pub(crate) fn written(&self, sequence: SequenceNumber) {
        if let Some(listener) = &self.listener {
            listener.on_sample_written(sequence);
        }
    }

    pub(crate) fn publication_matched(&self) -> PublicationMatchedStatus {
        self.condition.clear(StatusMask::PUBLICATION_MATCHED);
        self.matched.lock().take_changes()
    }
}

impl WriterEvents for WriterStatus {
    fn on_readers_changed(&self, current: usize, reader: EndpointId, delta: isize) {
        let mut status = self.matched.lock();
        status.record(current, reader, delta);
        match &self.listener {
            Some(listener) => {
                let changes = status.take_changes();
                drop(status);
                listener.on_publication_matched(changes);
            }
            None => {
                drop(status);
                self.condition.raise(StatusMask::PUBLICATION_MATCHED);
            }
        }
    }
}

impl std::fmt::Debug for WriterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterStatus")
            .field("has_listener", &self.listener.is_some())
            .field("condition", &self.condition)
            .finish_non_exhaustive()
    }
}
