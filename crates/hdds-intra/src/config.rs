// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global configuration.
//!
//! - **Level 1 (Static)**: immutable named constants (domain default,
//!   infinite duration, never-time, history defaults).
//! - **Level 2 (Dynamic)**: [`RuntimeConfig`], shared by clone, holding named
//!   QoS profiles, the default QoS and the default domain.
//!
//! # Performance
//!
//! - **Lock-free**: `DashMap` for the profile store (no RwLock contention)
//! - **Atomic swap**: `ArcSwap` for the default QoS (no lock)
//!
//! # Example
//!
//! ```ignore
//! use hdds_intra::config::*;
//! use hdds_intra::QoS;
//!
//! let config = RuntimeConfig::new();
//! config.set_profile("sensor", QoS::reliable().keep_last(8))?;
//! config.load_yaml_file("qos_profiles.yaml")?;
//! let qos = config.qos_or_default(Some("sensor"))?;
//! ```

use crate::core::types::Time;
use crate::dds::{Error, QoS, Result};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Sentinel domain id: "use the configured default domain".
pub const DOMAIN_DEFAULT: u32 = u32::MAX;

/// Maximum domain ID per DDS specification.
///
/// DDS domain_id valid range: 0..232 (inclusive)
pub const MAX_DOMAIN_ID: u32 = 232;

/// Infinite duration (blocking calls wait without limit).
pub const DURATION_INFINITE: Duration = Duration::MAX;

/// "Never" timestamp.
pub const TIME_NEVER: Time = Time::NEVER;

/// Default reader history depth.
pub const DEFAULT_HISTORY_DEPTH: u32 = 1;

/// Default sample limit for KEEP_ALL queues.
pub const KEEP_ALL_DEFAULT_MAX_SAMPLES: usize = 1000;

/// Runtime configuration, cheap to clone and share between participants.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// QoS applied when callers do not name a profile.
    default_qos: Arc<ArcSwap<QoS>>,

    /// Named QoS profiles.
    profiles: Arc<DashMap<Arc<str>, Arc<QoS>>>,

    /// Domain used for `DOMAIN_DEFAULT`.
    default_domain: Arc<AtomicU32>,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self {
            default_qos: Arc::new(ArcSwap::from_pointee(QoS::default())),
            profiles: Arc::new(DashMap::new()),
            default_domain: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn default_qos(&self) -> Arc<QoS> {
        self.default_qos.load_full()
    }

    /// Replace the default QoS. Invalid profiles are rejected.
    pub fn set_default_qos(&self, qos: QoS) -> Result<()> {
        qos.validate()?;
        self.default_qos.store(Arc::new(qos));
        Ok(())
    }

    /// Register (or replace) a named profile.
    pub fn set_profile(&self, name: &str, qos: QoS) -> Result<()> {
        qos.validate()?;
        self.profiles.insert(Arc::from(name), Arc::new(qos));
        Ok(())
    }

    pub fn profile(&self, name: &str) -> Option<Arc<QoS>> {
        self.profiles.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove_profile(&self, name: &str) -> Option<Arc<QoS>> {
        self.profiles.remove(name).map(|(_, qos)| qos)
    }

    /// Profile names, sorted.
    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .profiles
            .iter()
            .map(|entry| entry.key().to_string())
            .collect();
        names.sort();
        names
    }

    /// The named profile, or the default QoS for `None`.
    pub fn qos_or_default(&self, name: Option<&str>) -> Result<QoS> {
        match name {
            Some(name) => self
                .profile(name)
                .map(|qos| (*qos).clone())
                .ok_or_else(|| Error::Config(format!("QoS profile '{}' not found", name))),
            None => Ok((*self.default_qos()).clone()),
        }
    }

    pub fn default_domain(&self) -> u32 {
        self.default_domain.load(Ordering::Relaxed)
    }

    pub fn set_default_domain(&self, domain_id: u32) -> Result<()> {
        if domain_id > MAX_DOMAIN_ID {
            return Err(Error::InvalidDomainId(domain_id));
        }
        self.default_domain.store(domain_id, Ordering::Relaxed);
        Ok(())
    }

    /// Map `DOMAIN_DEFAULT` to the configured domain and range-check the rest.
    pub fn resolve_domain(&self, domain_id: u32) -> Result<u32> {
        match domain_id {
            DOMAIN_DEFAULT => Ok(self.default_domain()),
            id if id > MAX_DOMAIN_ID => Err(Error::InvalidDomainId(id)),
            id => Ok(id),
        }
    }

    /// Load every profile of a YAML document (see
    /// [`YamlLoader`](crate::dds::qos::loaders::YamlLoader) for the format).
    ///
    /// A `default_profile` entry also replaces the default QoS. Returns the
    /// number of profiles loaded. Nothing is applied if any profile is
    /// invalid.
    #[cfg(feature = "qos-loaders")]
    pub fn load_yaml_str(&self, yaml: &str) -> Result<usize> {
        use crate::dds::qos::loaders::YamlLoader;

        let doc = YamlLoader::parse_yaml(yaml).map_err(Error::Config)?;
        let mut parsed = Vec::with_capacity(doc.profiles.len());
        for (name, profile) in &doc.profiles {
            let qos = YamlLoader::profile_to_qos(profile)
                .map_err(|e| Error::Config(format!("profile '{}': {}", name, e)))?;
            parsed.push((name.as_str(), qos));
        }
        let default = match doc.default_profile {
            Some(_) => Some(YamlLoader::get_default_profile(&doc).map_err(Error::Config)?),
            None => None,
        };

        let count = parsed.len();
        for (name, qos) in parsed {
            self.profiles.insert(Arc::from(name), Arc::new(qos));
        }
        if let Some(qos) = default {
            self.default_qos.store(Arc::new(qos));
        }
        log::debug!("[config] loaded {} QoS profiles from YAML", count);
        Ok(count)
    }

    /// [`load_yaml_str`](Self::load_yaml_str) on a file.
    #[cfg(feature = "qos-loaders")]
    pub fn load_yaml_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigFileNotFound(path.display().to_string()));
        }
        let yaml = std::fs::read_to_string(path)?;
        self.load_yaml_str(&yaml)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("default_domain", &self.default_domain())
            .field("profiles", &self.profiles.len())
            .finish()
    }
}
