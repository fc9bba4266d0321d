// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! YAML QoS profile loader.
//!
//! # Example YAML
//!
//! ```yaml
//! # qos_profiles.yaml
//! default_profile: telemetry
//! profiles:
//!   reliable_sensor:
//!     reliability: RELIABLE
//!     durability: TRANSIENT_LOCAL
//!     history:
//!       kind: KEEP_LAST
//!       depth: 100
//!     max_blocking_time_ms: 250
//!
//!   audit_log:
//!     reliability: RELIABLE
//!     history:
//!       kind: KEEP_ALL
//!     resource_limits:
//!       max_samples: 4096
//!
//!   telemetry:
//!     reliability: BEST_EFFORT
//! ```
//!
//! Policy values are accepted in upper or lower case. Unknown keys are
//! rejected so that typos do not silently fall back to defaults.

use crate::dds::qos::{Durability, History, QoS, Reliability};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// YAML QoS profile loader.
pub struct YamlLoader;

/// Root of a profile document.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct YamlQosDocument {
    #[serde(default)]
    pub profiles: BTreeMap<String, YamlQosProfile>,

    /// Profile used when no name is given.
    #[serde(default)]
    pub default_profile: Option<String>,
}

/// One named profile. Absent fields keep the `QoS::default()` value.
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct YamlQosProfile {
    pub reliability: Option<YamlReliability>,
    pub durability: Option<YamlDurability>,
    pub history: Option<YamlHistory>,
    pub resource_limits: Option<YamlResourceLimits>,
    /// Takes precedence over `max_blocking_time_secs`.
    pub max_blocking_time_ms: Option<u64>,
    pub max_blocking_time_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum YamlReliability {
    #[serde(rename = "RELIABLE", alias = "reliable")]
    Reliable,
    #[serde(rename = "BEST_EFFORT", alias = "best_effort")]
    BestEffort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum YamlDurability {
    #[serde(rename = "VOLATILE", alias = "volatile")]
    Volatile,
    #[serde(rename = "TRANSIENT_LOCAL", alias = "transient_local")]
    TransientLocal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum YamlHistoryKind {
    #[serde(rename = "KEEP_LAST", alias = "keep_last")]
    KeepLast,
    #[serde(rename = "KEEP_ALL", alias = "keep_all")]
    KeepAll,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlHistory {
    pub kind: YamlHistoryKind,
    /// KEEP_LAST depth; defaults to `DEFAULT_HISTORY_DEPTH`. Ignored for
    /// KEEP_ALL.
    #[serde(default)]
    pub depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlResourceLimits {
    pub max_samples: usize,
}

impl From<YamlReliability> for Reliability {
    fn from(value: YamlReliability) -> Self {
        match value {
            YamlReliability::Reliable => Reliability::Reliable,
            YamlReliability::BestEffort => Reliability::BestEffort,
        }
    }
}

impl From<YamlDurability> for Durability {
    fn from(value: YamlDurability) -> Self {
        match value {
            YamlDurability::Volatile => Durability::Volatile,
            YamlDurability::TransientLocal => Durability::TransientLocal,
        }
    }
}

impl From<&YamlHistory> for History {
    fn from(value: &YamlHistory) -> Self {
        match value.kind {
            YamlHistoryKind::KeepLast => History::KeepLast(
                value
                    .depth
                    .unwrap_or(crate::config::DEFAULT_HISTORY_DEPTH),
            ),
            YamlHistoryKind::KeepAll => History::KeepAll,
        }
    }
}

impl YamlLoader {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<YamlQosDocument, String> {
        let path = path.as_ref();
        let yaml_content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::parse_yaml(&yaml_content)
    }

    pub fn parse_yaml(yaml_content: &str) -> Result<YamlQosDocument, String> {
        serde_yaml::from_str(yaml_content).map_err(|e| format!("Failed to parse YAML: {}", e))
    }

    /// Resolve a named profile to a validated `QoS`.
    pub fn get_profile(doc: &YamlQosDocument, name: &str) -> Result<QoS, String> {
        doc.profiles
            .get(name)
            .ok_or_else(|| format!("Profile '{}' not found", name))
            .and_then(Self::profile_to_qos)
    }

    /// The document's `default_profile`, or `QoS::default()` when unset.
    pub fn get_default_profile(doc: &YamlQosDocument) -> Result<QoS, String> {
        match doc.default_profile.as_deref() {
            Some(name) => Self::get_profile(doc, name),
            None => Ok(QoS::default()),
        }
    }

    /// Overlay a profile on `QoS::default()` and validate the result.
    pub fn profile_to_qos(profile: &YamlQosProfile) -> Result<QoS, String> {
        let mut qos = QoS::default();
        if let Some(reliability) = profile.reliability {
            qos.reliability = reliability.into();
        }
        if let Some(durability) = profile.durability {
            qos.durability = durability.into();
        }
        if let Some(history) = &profile.history {
            qos.history = history.into();
        }
        if let Some(limits) = &profile.resource_limits {
            qos.resource_limits.max_samples = limits.max_samples;
        }
        match (profile.max_blocking_time_ms, profile.max_blocking_time_secs) {
            (Some(ms), _) => qos.max_blocking_time = Duration::from_millis(ms),
            (None, Some(secs)) => qos.max_blocking_time = Duration::from_secs(secs),
            (None, None) => {}
        }

        qos.validate().map_err(|e| e.to_string())?;
        Ok(qos)
    }

    /// Read `path` and resolve one profile (`None` = the default profile).
    pub fn load_qos<P: AsRef<Path>>(path: P, profile_name: Option<&str>) -> Result<QoS, String> {
        let doc = Self::load_from_file(path)?;
        match profile_name {
            Some(name) => Self::get_profile(&doc, name),
            None => Self::get_default_profile(&doc),
        }
    }
}
