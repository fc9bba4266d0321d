// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Quality of Service policies.
//!
//! Only the policies that shape in-process delivery are modelled:
//! reliability, history, durability, resource limits and the reliable
//! publish timeout.
//!
//! ```rust,ignore
//! use hdds_intra::QoS;
//!
//! let sensor = QoS::reliable().keep_last(10).transient_local();
//! let logger = QoS::reliable().keep_all().max_samples(1000);
//! ```

pub mod loaders;
mod policy;
mod profile;

pub use policy::{Durability, History, Reliability, ResourceLimits};
pub use profile::QoS;
