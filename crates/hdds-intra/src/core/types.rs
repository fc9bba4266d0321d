// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Identifier and time value types shared by the runtime and the DDS layer.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Per-writer sample sequence number.
///
/// The first sample published by a writer carries [`SequenceNumber::FIRST`];
/// every following publish increments by one.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    /// Sequence number of a writer's first sample.
    pub const FIRST: Self = Self(1);

    /// Successor of this sequence number.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static NEXT_ENDPOINT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a writer or reader.
///
/// Ids are handed out from a monotonic counter, so ordering by id is
/// ordering by creation. `EndpointId::UNKNOWN` (0) marks samples built
/// outside of a writer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EndpointId(u64);

impl EndpointId {
    /// Id used for samples that were not produced by a registered writer.
    pub const UNKNOWN: Self = Self(0);

    /// Allocate a fresh id.
    pub fn next() -> Self {
        Self(NEXT_ENDPOINT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ep#{}", self.0)
    }
}

/// Type identifier for matching endpoints.
///
/// MD5 hash of the type name truncated to 14 bytes (EquivalenceHash size).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId([u8; 14]);

impl TypeId {
    /// Create TypeId from type name using MD5
    pub fn from_type_name(type_name: &str) -> Self {
        use md5::{Digest, Md5};
        let mut hasher = Md5::new();
        hasher.update(type_name.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 14];
        bytes.copy_from_slice(&digest[..14]);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 14]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 14] {
        &self.0
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId(")?;
        for b in &self.0[..4] {
            write!(f, "{:02x}", b)?;
        }
        write!(f, "..)")
    }
}

/// Wall-clock timestamp in nanoseconds since the UNIX epoch.
///
/// Used as the source timestamp of a sample. [`Time::NEVER`] is the
/// "no time" sentinel.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Time(u64);

impl Time {
    /// Sentinel for "never" / "no timestamp".
    pub const NEVER: Self = Self(u64::MAX);

    /// Current wall-clock time.
    pub fn now() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        Self(u64::try_from(nanos).unwrap_or(u64::MAX - 1))
    }

    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    pub const fn is_never(self) -> bool {
        self.0 == u64::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_start_at_one_and_increment() {
        let first = SequenceNumber::FIRST;
        assert_eq!(first.value(), 1);
        assert_eq!(first.next(), SequenceNumber(2));
        assert!(first < first.next());
    }

    #[test]
    fn endpoint_ids_are_unique_and_ordered() {
        let a = EndpointId::next();
        let b = EndpointId::next();
        assert_ne!(a, b);
        assert!(a < b);
        assert_ne!(a, EndpointId::UNKNOWN);
    }

    #[test]
    fn type_id_depends_only_on_name() {
        assert_eq!(
            TypeId::from_type_name("sensor::Temperature"),
            TypeId::from_type_name("sensor::Temperature")
        );
        assert_ne!(
            TypeId::from_type_name("sensor::Temperature"),
            TypeId::from_type_name("sensor::Pressure")
        );
    }

    #[test]
    fn time_never_is_sentinel() {
        assert!(Time::NEVER.is_never());
        assert!(!Time::now().is_never());
        assert!(Time::from_nanos(5) < Time::from_nanos(6));
    }
}
