// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Core Runtime Components
//!
//! Low-level infrastructure under the DDS layer: identifiers, the
//! reference-counted sample buffer and the per-topic distribution machinery.
//!
//! ```text
//! +-----------------------------------------------------+
//! |                    DDS Layer                        |
//! |   Participant, TopicRegistry, DataWriter/Reader     |
//! +-----------------------------------------------------+
//! |                    Core Layer                       |
//! |  SampleBuffer -> DistributionChannel -> ReaderQueue |
//! +-----------------------------------------------------+
//! ```

pub mod rt;
pub mod types;
