// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic Registry: topic name -> (type identity, endpoints, channel).
//!
//! # Architecture
//!
//! ```text
//! TopicRegistry
//! +-- topics: DashMap<Arc<str>, Arc<TopicEntry>>   (lookup / insert / remove only)
//!
//! TopicEntry
//! +-- name, type_id                                 (immutable)
//! +-- channel: Arc<DistributionChannel>
//! +-- members: Mutex<Members>                       (per-entry lock)
//!     +-- writers: BTreeSet<EndpointId>
//!     +-- readers: BTreeSet<EndpointId>
//!     +-- retired: bool
//! ```
//!
//! # Thread Safety
//!
//! Membership changes lock only the entry they touch, so registrations on
//! different topics never wait on each other. When the last endpoint
//! leaves, the entry is marked `retired` and removed from the map before its
//! lock is released. A registration that obtained the entry earlier sees
//! the flag, and its single retry finds the slot free.

use super::listener::{DataReaderListener, DataWriterListener};
use super::reader::DataReader;
use super::writer::DataWriter;
use super::{Error, QoS, Result};
use crate::core::rt::DistributionChannel;
use crate::core::types::{EndpointId, TypeId};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Role {
    Writer,
    Reader,
}

#[derive(Default)]
struct Members {
    writers: BTreeSet<EndpointId>,
    readers: BTreeSet<EndpointId>,
    retired: bool,
}

impl Members {
    fn set_mut(&mut self, role: Role) -> &mut BTreeSet<EndpointId> {
        match role {
            Role::Writer => &mut self.writers,
            Role::Reader => &mut self.readers,
        }
    }

    fn is_empty(&self) -> bool {
        self.writers.is_empty() && self.readers.is_empty()
    }
}

/// One registered topic.
pub struct TopicEntry {
    name: Arc<str>,
    type_id: TypeId,
    channel: Arc<DistributionChannel>,
    members: Mutex<Members>,
}

impl TopicEntry {
    fn new(name: Arc<str>, type_id: TypeId) -> Self {
        Self {
            channel: Arc::new(DistributionChannel::new(Arc::clone(&name))),
            name,
            type_id,
            members: Mutex::new(Members::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn channel(&self) -> &Arc<DistributionChannel> {
        &self.channel
    }

    /// Registered writers in registration order.
    pub fn writers(&self) -> Vec<EndpointId> {
        self.members.lock().writers.iter().copied().collect()
    }

    /// Registered readers in registration order.
    pub fn readers(&self) -> Vec<EndpointId> {
        self.members.lock().readers.iter().copied().collect()
    }
}

impl std::fmt::Debug for TopicEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicEntry")
            .field("name", &self.name)
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}

/// Per-domain topic table.
pub struct TopicRegistry {
    domain_id: u32,
    topics: DashMap<Arc<str>, Arc<TopicEntry>>,
}

impl TopicRegistry {
    /// Standalone registry (not shared through the domain registry).
    pub fn new() -> Self {
        Self::with_domain(0)
    }

    pub(crate) fn with_domain(domain_id: u32) -> Self {
        Self {
            domain_id,
            topics: DashMap::new(),
        }
    }

    pub fn domain_id(&self) -> u32 {
        self.domain_id
    }

    /// Register a writer on `name`.
    ///
    /// Fails with `InvalidQos` or `TypeMismatch` without touching any state.
    pub fn register_writer(
        self: &Arc<Self>,
        name: &str,
        type_id: TypeId,
        qos: &QoS,
    ) -> Result<DataWriter> {
        self.register_writer_with_listener(name, type_id, qos, None)
    }

    /// Register a writer whose status changes are reported to `listener`.
    pub fn register_writer_with_listener(
        self: &Arc<Self>,
        name: &str,
        type_id: TypeId,
        qos: &QoS,
        listener: Option<Arc<dyn DataWriterListener>>,
    ) -> Result<DataWriter> {
        qos.validate()?;
        let id = EndpointId::next();
        let registration = self.register(name, type_id, Role::Writer, id)?;
        Ok(DataWriter::new(id, qos.clone(), registration, listener))
    }

    /// Register a reader on `name` and match it with the topic's channel.
    ///
    /// Fails with `InvalidQos` or `TypeMismatch` without touching any state.
    pub fn register_reader(
        self: &Arc<Self>,
        name: &str,
        type_id: TypeId,
        qos: &QoS,
    ) -> Result<DataReader> {
        self.register_reader_with_listener(name, type_id, qos, None)
    }

    /// Register a reader whose arrivals and status changes are reported to
    /// `listener`.
    pub fn register_reader_with_listener(
        self: &Arc<Self>,
        name: &str,
        type_id: TypeId,
        qos: &QoS,
        listener: Option<Arc<dyn DataReaderListener>>,
    ) -> Result<DataReader> {
        qos.validate()?;
        let id = EndpointId::next();
        let registration = self.register(name, type_id, Role::Reader, id)?;
        Ok(DataReader::new(id, qos.clone(), registration, listener))
    }

    /// Unregister a writer. Same as dropping it.
    pub fn unregister_writer(&self, writer: DataWriter) {
        drop(writer);
    }

    /// Unregister a reader. Same as [`DataReader::destroy`] followed by drop.
    pub fn unregister_reader(&self, reader: DataReader) {
        reader.destroy();
    }

    fn register(
        self: &Arc<Self>,
        name: &str,
        type_id: TypeId,
        role: Role,
        id: EndpointId,
    ) -> Result<Registration> {
        loop {
            let entry = self.entry_for(name, type_id);
            let mut members = entry.members.lock();
            if members.retired {
                // Already gone from the map.
                continue;
            }
            if entry.type_id != type_id {
                log::debug!(
                    "[TopicRegistry] domain {}: '{}' type mismatch ({:?} vs {:?})",
                    self.domain_id,
                    name,
                    entry.type_id,
                    type_id
                );
                return Err(Error::TypeMismatch {
                    topic: name.to_string(),
                });
            }
            members.set_mut(role).insert(id);
            drop(members);

            log::debug!(
                "[TopicRegistry] domain {}: registered {:?} {} on '{}'",
                self.domain_id,
                role,
                id,
                name
            );
            return Ok(Registration {
                registry: Arc::downgrade(self),
                entry,
                role,
                id,
                active: AtomicBool::new(true),
            });
        }
    }

    fn entry_for(&self, name: &str, type_id: TypeId) -> Arc<TopicEntry> {
        if let Some(existing) = self.topics.get(name) {
            return Arc::clone(existing.value());
        }
        let key: Arc<str> = Arc::from(name);
        let entry = self
            .topics
            .entry(Arc::clone(&key))
            .or_insert_with(|| Arc::new(TopicEntry::new(key, type_id)));
        Arc::clone(entry.value())
    }

    fn unregister(&self, entry: &Arc<TopicEntry>, role: Role, id: EndpointId) {
        let mut members = entry.members.lock();
        members.set_mut(role).remove(&id);
        if !members.is_empty() {
            return;
        }
        members.retired = true;
        // Entry lock before shard lock; no path takes them the other way.
        self.topics
            .remove_if(entry.name(), |_, current| Arc::ptr_eq(current, entry));
        drop(members);
        log::debug!(
            "[TopicRegistry] domain {}: topic '{}' removed (no endpoints left)",
            self.domain_id,
            entry.name()
        );
    }

    /// Entry for `name`, if registered.
    pub fn lookup(&self, name: &str) -> Option<Arc<TopicEntry>> {
        self.topics.get(name).map(|e| Arc::clone(e.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.topics.contains_key(name)
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Registered topic names, sorted.
    pub fn topic_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.iter().map(|e| e.key().to_string()).collect();
        names.sort();
        names
    }

    pub fn type_of(&self, name: &str) -> Option<TypeId> {
        self.topics.get(name).map(|e| e.value().type_id())
    }

    pub fn writer_count(&self, name: &str) -> usize {
        self.lookup(name).map_or(0, |e| e.members.lock().writers.len())
    }

    pub fn reader_count(&self, name: &str) -> usize {
        self.lookup(name).map_or(0, |e| e.members.lock().readers.len())
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TopicRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicRegistry")
            .field("domain_id", &self.domain_id)
            .field("topics", &self.topics.len())
            .finish()
    }
}

/// Membership of one endpoint in one topic entry.
///
/// Released explicitly by `release()` or on drop.
pub(crate) struct Registration {
    registry: Weak<TopicRegistry>,
    entry: Arc<TopicEntry>,
    role: Role,
    id: EndpointId,
    active: AtomicBool,
}

impl Registration {
    pub(crate) fn entry(&self) -> &Arc<TopicEntry> {
        &self.entry
    }

    /// Leave the topic. Returns `false` if already released.
    pub(crate) fn release(&self) -> bool {
        if !self.active.swap(false, Ordering::AcqRel) {
            return false;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(&self.entry, self.role, self.id);
        }
        true
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("topic", &self.entry.name())
            .field("role", &self.role)
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
#[path = "topic_registry_tests.rs"]
mod tests;
