// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! QoS profile loaders.
//!
//! # Example
//!
//! ```rust,ignore
//! use hdds_intra::dds::qos::loaders::YamlLoader;
//!
//! let qos = YamlLoader::load_qos("qos_profiles.yaml", Some("reliable_sensor"))?;
//! ```

#[cfg(feature = "qos-loaders")]
pub mod yaml;

#[cfg(feature = "qos-loaders")]
pub use yaml::{YamlLoader, YamlQosDocument, YamlQosProfile};
