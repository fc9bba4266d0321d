// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide map from domain id to the domain's topic registry.
//!
//! ```text
//! DomainRegistry (static global)
//! +-- domains: Mutex<HashMap<DomainId, Weak<TopicRegistry>>>
//!
//! TopicRegistry (one per domain, per process)
//! +-- [strong ref held by every Participant on the domain]
//! ```
//!
//! Participants on the same domain share one registry; the registry goes
//! away with the last participant holding it.

use super::topic_registry::TopicRegistry;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};

/// Domain ID type (0-232 per DDS spec)
pub type DomainId = u32;

/// Thread-safe access to per-domain registries across the process.
pub struct DomainRegistry {
    domains: Mutex<HashMap<DomainId, Weak<TopicRegistry>>>,
}

impl DomainRegistry {
    fn new() -> Self {
        Self {
            domains: Mutex::new(HashMap::new()),
        }
    }

    /// Get the global registry instance
    pub fn global() -> &'static DomainRegistry {
        static REGISTRY: OnceLock<DomainRegistry> = OnceLock::new();
        REGISTRY.get_or_init(DomainRegistry::new)
    }

    /// Get or create the topic registry for a domain ID.
    ///
    /// The caller must hold the returned Arc to keep the domain alive.
    /// Range checks happen before this call.
    pub fn get_or_create(&self, domain_id: DomainId) -> Arc<TopicRegistry> {
        let mut domains = self.domains.lock();

        if let Some(strong) = domains.get(&domain_id).and_then(Weak::upgrade) {
            return strong;
        }

        let registry = Arc::new(TopicRegistry::with_domain(domain_id));
        domains.insert(domain_id, Arc::downgrade(&registry));
        domains.retain(|_, weak| weak.strong_count() > 0);

        log::debug!(
            "[DomainRegistry] Created topic registry for domain_id={}",
            domain_id
        );

        registry
    }

    /// Existing registry for a domain, if any participant keeps it alive.
    pub fn get(&self, domain_id: DomainId) -> Option<Arc<TopicRegistry>> {
        self.domains.lock().get(&domain_id).and_then(Weak::upgrade)
    }

    /// Number of domains with a live registry.
    pub fn active_domain_count(&self) -> usize {
        self.domains
            .lock()
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Domain ids above the DDS range keep these tests away from the ones
    // participants use in other tests.
    #[test]
    fn test_same_domain_shares_registry() {
        let registry = DomainRegistry::global();
        let a = registry.get_or_create(9_001);
        let b = registry.get_or_create(9_001);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.domain_id(), 9_001);

        let other = registry.get_or_create(9_002);
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[test]
    fn test_registry_dropped_with_last_holder() {
        let registry = DomainRegistry::global();
        let held = registry.get_or_create(9_003);
        assert!(registry.get(9_003).is_some());
        drop(held);
        assert!(registry.get(9_003).is_none());
    }
}
