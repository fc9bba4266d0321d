// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Immutable, reference-counted sample buffer.
//!
//! A [`SampleBuffer`] is an owning handle to one heap allocation holding the
//! payload, its header and an [`AtomicRefCount`]. Cloning a handle retains,
//! dropping it releases; the handle whose release moves the count to zero
//! frees the allocation. Handles are `Send + Sync` and may be cloned and
//! dropped from any thread without further locking.

use super::metrics::BufferMetrics;
use super::refcount::AtomicRefCount;
use crate::core::types::{EndpointId, SequenceNumber, Time};
use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;
use std::sync::Arc;

/// Metadata stamped on a sample by its writer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleHeader {
    pub sequence: SequenceNumber,
    pub writer: EndpointId,
    pub source_timestamp: Time,
}

impl SampleHeader {
    /// Header for a sample produced outside of a registered writer.
    pub fn detached(sequence: SequenceNumber) -> Self {
        Self {
            sequence,
            writer: EndpointId::UNKNOWN,
            source_timestamp: Time::now(),
        }
    }
}

struct SampleStorage {
    refs: AtomicRefCount,
    header: SampleHeader,
    payload: Box<[u8]>,
    metrics: Option<Arc<BufferMetrics>>,
}

/// Shared handle to an immutable published sample.
pub struct SampleBuffer {
    ptr: NonNull<SampleStorage>,
    _owns: PhantomData<SampleStorage>,
}

// SAFETY: the storage behind `ptr` is never mutated after construction except
// through `AtomicRefCount`, and it is freed only by the single handle that
// observes the count reaching zero. Sharing or sending handles across
// threads is therefore equivalent to sharing an `Arc<SampleStorage>`.
unsafe impl Send for SampleBuffer {}
// SAFETY: see `Send` above; all `&self` methods are read-only or atomic.
unsafe impl Sync for SampleBuffer {}

impl SampleBuffer {
    /// Untracked buffer with a detached header.
    pub fn new(sequence: SequenceNumber, payload: impl Into<Box<[u8]>>) -> Self {
        Self::with_header(SampleHeader::detached(sequence), payload, None)
    }

    /// Buffer with an explicit header, optionally counted in `metrics`.
    pub fn with_header(
        header: SampleHeader,
        payload: impl Into<Box<[u8]>>,
        metrics: Option<Arc<BufferMetrics>>,
    ) -> Self {
        let payload = payload.into();
        if let Some(m) = &metrics {
            m.record_alloc(payload.len());
        }
        let storage = Box::new(SampleStorage {
            refs: AtomicRefCount::new(),
            header,
            payload,
            metrics,
        });
        Self {
            ptr: NonNull::from(Box::leak(storage)),
            _owns: PhantomData,
        }
    }

    #[inline]
    fn storage(&self) -> &SampleStorage {
        // SAFETY: this handle owns one reference, so the storage is alive for
        // at least as long as `self`.
        unsafe { self.ptr.as_ref() }
    }

    /// Payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.storage().payload
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.storage().payload.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage().payload.is_empty()
    }

    #[inline]
    pub fn sequence(&self) -> SequenceNumber {
        self.storage().header.sequence
    }

    /// Writer that published this sample.
    #[inline]
    pub fn writer(&self) -> EndpointId {
        self.storage().header.writer
    }

    #[inline]
    pub fn source_timestamp(&self) -> Time {
        self.storage().header.source_timestamp
    }

    #[inline]
    pub fn header(&self) -> SampleHeader {
        self.storage().header
    }

    /// Number of live handles to this sample (snapshot).
    pub fn ref_count(&self) -> usize {
        self.storage().refs.get()
    }

    /// Whether two handles point at the same sample.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        a.ptr == b.ptr
    }

    /// Take an additional reference. Equivalent to `clone()`.
    #[must_use]
    pub fn retain(&self) -> Self {
        self.clone()
    }

    /// Give up this handle's reference.
    ///
    /// Returns `true` if this was the last reference and the storage was
    /// freed. Equivalent to `drop()` apart from the return value.
    pub fn release(self) -> bool {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never used or dropped again, so its reference is
        // given up exactly once.
        unsafe { Self::release_raw(this.ptr) }
    }

    /// # Safety
    ///
    /// The caller must own one reference to `ptr` and must not use it after
    /// this call.
    unsafe fn release_raw(ptr: NonNull<SampleStorage>) -> bool {
        // SAFETY: the caller still owns a reference, so the storage is alive.
        let last = unsafe { ptr.as_ref() }.refs.release();
        if last {
            // SAFETY: the count reached zero, no other handle exists and the
            // allocation came from `Box::leak` in `with_header`.
            let storage = unsafe { Box::from_raw(ptr.as_ptr()) };
            if let Some(m) = &storage.metrics {
                m.record_release(storage.payload.len());
            }
        }
        last
    }
}

impl Clone for SampleBuffer {
    fn clone(&self) -> Self {
        // A live handle holds a reference, so a zero count means the storage
        // is already freed. Handing out another handle would free it twice.
        assert!(
            self.storage().refs.retain(),
            "SampleBuffer cloned after its storage was released"
        );
        Self {
            ptr: self.ptr,
            _owns: PhantomData,
        }
    }
}

impl Drop for SampleBuffer {
    fn drop(&mut self) {
        // SAFETY: `self` owns one reference and is being destroyed.
        unsafe {
            Self::release_raw(self.ptr);
        }
    }
}

impl AsRef<[u8]> for SampleBuffer {
    fn as_ref(&self) -> &[u8] {
        self.payload()
    }
}

impl fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("sequence", &self.sequence())
            .field("writer", &self.writer())
            .field("len", &self.len())
            .field("refs", &self.ref_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn tracked(seq: u64, payload: &[u8], metrics: &Arc<BufferMetrics>) -> SampleBuffer {
        SampleBuffer::with_header(
            SampleHeader::detached(SequenceNumber(seq)),
            payload,
            Some(Arc::clone(metrics)),
        )
    }

    #[test]
    fn payload_and_header_are_preserved() {
        let buf = SampleBuffer::new(SequenceNumber(7), vec![1u8, 2, 3]);
        assert_eq!(buf.payload(), &[1, 2, 3]);
        assert_eq!(buf.len(), 3);
        assert!(!buf.is_empty());
        assert_eq!(buf.sequence(), SequenceNumber(7));
        assert_eq!(buf.writer(), EndpointId::UNKNOWN);
    }

    #[test]
    fn clone_and_drop_track_count() {
        let metrics = Arc::new(BufferMetrics::new());
        let a = tracked(1, b"abc", &metrics);
        let b = a.clone();
        let c = a.retain();
        assert_eq!(a.ref_count(), 3);
        assert!(SampleBuffer::ptr_eq(&a, &c));

        drop(b);
        assert_eq!(a.ref_count(), 2);
        assert!(!c.release());
        assert_eq!(metrics.live(), 1);
        assert!(a.release());
        assert_eq!(metrics.released(), 1);
        assert_eq!(metrics.live(), 0);
        assert_eq!(metrics.bytes_live(), 0);
    }

    #[test]
    fn freed_exactly_once_across_threads() {
        let metrics = Arc::new(BufferMetrics::new());
        let buf = tracked(1, &[0u8; 64], &metrics);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let local = buf.clone();
                thread::spawn(move || {
                    for _ in 0..5_000 {
                        let extra = local.clone();
                        assert_eq!(extra.len(), 64);
                        drop(extra);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("worker panicked");
        }

        assert_eq!(buf.ref_count(), 1);
        assert_eq!(metrics.released(), 0);
        drop(buf);
        assert_eq!(metrics.allocated(), 1);
        assert_eq!(metrics.released(), 1);
    }

    #[test]
    #[should_panic]
    fn clone_after_release_panics_in_every_profile() {
        // Never dropped: its count is forced to zero below.
        let buf = ManuallyDrop::new(SampleBuffer::new(SequenceNumber(1), vec![0u8]));
        assert!(buf.storage().refs.release());
        let _second = (*buf).clone();
    }
}
