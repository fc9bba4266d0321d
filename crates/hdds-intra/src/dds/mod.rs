// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DDS-style public API: participants, topics, writers, readers and QoS.
//!
//! ```text
//! Participant --(domain id)--> TopicRegistry --(topic name)--> TopicEntry
//!                                                   |
//!                         DataWriter --publish--> DistributionChannel
//!                                                   |  fan-out
//!                                       ReaderQueue ... ReaderQueue
//!                                            |               |
//!                                       DataReader      DataReader
//! ```
//!
//! Endpoint events reach the application through [`listener`] callbacks or
//! through [`condition`]s attached to a [`WaitSet`].

pub mod condition;
pub mod domain_registry;
pub mod listener;
pub mod participant;
pub mod qos;
pub mod reader;
pub mod topic;
pub mod topic_registry;
pub mod waitset;
pub mod writer;

pub use crate::core::rt::{SampleBuffer, SampleState};
pub use crate::core::types::{EndpointId, SequenceNumber, Time, TypeId};
pub use condition::{
    Condition, GuardCondition, HasStatusCondition, ReadCondition, SampleStateMask,
    StatusCondition, StatusMask,
};
pub use listener::{
    ClosureListener, DataReaderListener, DataWriterListener, PublicationMatchedStatus,
    SampleLostStatus, SampleRejectedReason, SampleRejectedStatus, SubscriptionMatchedStatus,
};
pub use participant::{Participant, ParticipantBuilder};
pub use qos::{Durability, History, QoS, Reliability, ResourceLimits};
pub use reader::{DataReader, ReaderState, ReaderStats, SampleInfo};
pub use topic::Topic;
pub use topic_registry::TopicRegistry;
pub use waitset::WaitSet;
pub use writer::{DataWriter, WriterStats};

/// Public error type.
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration could not be applied (bad profile, unknown name).
    Config(String),
    /// QoS policy is invalid (e.g., zero history depth).
    InvalidQos(String),
    /// Configuration file not found at specified path.
    ConfigFileNotFound(String),

    // ========================================================================
    // Entity Errors
    // ========================================================================
    /// Domain ID out of range (0-232).
    InvalidDomainId(u32),
    /// Topic name already bound to a different type.
    TypeMismatch { topic: String },
    /// The reader was destroyed, before or while the call was in progress.
    Unregistered,
    /// A bounded wait ended without the awaited condition.
    WouldBlock,

    // ========================================================================
    // Data Errors
    // ========================================================================
    /// Reliable publish ran out of time. The sample stays with the readers
    /// that accepted it; `undelivered` readers did not get it.
    PublishTimeout {
        sequence: SequenceNumber,
        undelivered: usize,
    },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// I/O error with underlying cause.
    IoError(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::InvalidQos(msg) => write!(f, "Invalid QoS: {}", msg),
            Error::ConfigFileNotFound(path) => write!(f, "Config file not found: {}", path),
            Error::InvalidDomainId(id) => write!(f, "Invalid domain_id: {} (must be 0-232)", id),
            Error::TypeMismatch { topic } => {
                write!(f, "Type mismatch: topic '{}' is bound to another type", topic)
            }
            Error::Unregistered => write!(f, "Reader destroyed"),
            Error::WouldBlock => write!(f, "Operation would block"),
            Error::PublishTimeout {
                sequence,
                undelivered,
            } => write!(
                f,
                "Publish timeout: seq {} not accepted by {} reader(s)",
                sequence, undelivered
            ),
            Error::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e)
    }
}

/// Convenient alias for API results using the public `Error` type.
pub type Result<T> = std::result::Result<T, Error>;
