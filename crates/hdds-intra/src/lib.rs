// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # HDDS Intra - in-process publish/subscribe core
//!
//! Reference-counted sample distribution between threads of one process:
//! a writer publishes a byte payload once, every matched reader receives a
//! reference to the same buffer, and the buffer is freed when the last
//! reference goes away.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hdds_intra::{Participant, QoS, Result};
//!
//! fn main() -> Result<()> {
//!     let participant = Participant::builder("my_app").domain_id(0).build()?;
//!     let topic = participant.create_topic("sensors/temperature", "Temperature")?;
//!
//!     let reader = participant.create_reader(&topic, QoS::default().keep_last(8))?;
//!     let writer = participant.create_writer(&topic, QoS::default())?;
//!
//!     writer.publish(b"21.5".to_vec())?;
//!     if let Some(sample) = reader.take() {
//!         println!("{} bytes, seq {}", sample.len(), sample.sequence());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  Participant -> Topic -> DataWriter / DataReader         (dds)      |
//! +---------------------------------------------------------------------+
//! |  TopicRegistry (per domain)  |  QoS + YAML profiles  |  config      |
//! +---------------------------------------------------------------------+
//! |  Listeners  |  WaitSet + Conditions                      (dds)      |
//! +---------------------------------------------------------------------+
//! |  DistributionChannel -> ReaderQueue (bounded, condvars)  (core::rt) |
//! |  SampleBuffer + AtomicRefCount  |  HistoryCache  |  BufferMetrics   |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Participant`] | Binds to a domain, factory for endpoints |
//! | [`DataWriter`] | Publishes payloads, fans them out to readers |
//! | [`DataReader`] | Takes or reads samples, can block for new ones |
//! | [`SampleBuffer`] | Shared, reference-counted payload |
//! | [`TopicRegistry`] | Topic name -> type, endpoints and channel |
//! | [`QoS`] | History depth, reliability, durability, blocking time |
//! | [`DataReaderListener`] | Callbacks for arrivals, losses, rejections, matches |
//! | [`WaitSet`] | Blocks until a read, status or guard condition triggers |
//!
//! Diagnostics go through the `log` facade; see [`logging`] for a
//! ready-made backend.

pub mod config;
pub mod core;
pub mod dds;
pub mod logging;

pub use crate::config::RuntimeConfig;
pub use crate::core::rt::{AtomicRefCount, BufferMetrics, SampleState};
pub use dds::{
    DataReader, DataReaderListener, DataWriter, DataWriterListener, Durability, EndpointId,
    Error, GuardCondition, History, Participant, ParticipantBuilder, QoS, ReaderState,
    Reliability, ResourceLimits, Result, SampleBuffer, SampleInfo, SequenceNumber, StatusMask,
    Time, Topic, TopicRegistry, TypeId, WaitSet,
};
