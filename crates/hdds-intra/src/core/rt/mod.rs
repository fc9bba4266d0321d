// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime primitives for in-process sample distribution.
//!
//! | Module | Role |
//! |--------|------|
//! | `refcount` | Atomic retain/release counter |
//! | `sample` | Immutable reference-counted sample buffer |
//! | `metrics` | Buffer allocation accounting |
//! | `queue` | Bounded per-reader history queue |
//! | `history_cache` | Writer history for late joiners |
//! | `channel` | Per-topic fan-out hub |
//! | `waitset` | Wakeup driver for condition-based waiting |

pub mod channel;
pub mod history_cache;
pub mod metrics;
pub mod queue;
pub mod refcount;
pub mod sample;
pub mod waitset;

pub use channel::{Delivery, DistributionChannel, FanOutReport, WriterEvents};
pub use history_cache::HistoryCache;
pub use metrics::BufferMetrics;
pub use queue::{
    OfferOutcome, OverflowPolicy, QueueClosed, QueueEvents, QueueStats, ReaderQueue, SampleState,
};
pub use refcount::AtomicRefCount;
pub use sample::{SampleBuffer, SampleHeader};
pub use waitset::{WaitsetDriver, WaitsetSignal};
