// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Participant: entry point that binds an application to a domain.
//!
//! Participants on the same domain id share one [`TopicRegistry`] through
//! the process-wide [`DomainRegistry`], so a writer created by one
//! participant reaches readers created by another.
//!
//! ```rust,no_run
//! use hdds_intra::{Participant, QoS};
//!
//! let participant = Participant::builder("app").domain_id(0).build()?;
//! let topic = participant.create_topic("chatter", "String")?;
//! let writer = participant.create_writer(&topic, QoS::default())?;
//! writer.publish(b"hello".to_vec())?;
//! # Ok::<(), hdds_intra::Error>(())
//! ```

use super::domain_registry::DomainRegistry;
use super::listener::{DataReaderListener, DataWriterListener};
use super::reader::DataReader;
use super::topic::Topic;
use super::topic_registry::TopicRegistry;
use super::writer::DataWriter;
use super::{Error, QoS, Result};
use crate::config::{RuntimeConfig, DOMAIN_DEFAULT};
use std::sync::Arc;

/// Builder for [`Participant`].
#[derive(Debug)]
pub struct ParticipantBuilder {
    name: String,
    domain_id: u32,
    config: Option<RuntimeConfig>,
}

impl ParticipantBuilder {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            domain_id: DOMAIN_DEFAULT,
            config: None,
        }
    }

    /// Set the domain id (default: the config's default domain).
    pub fn domain_id(mut self, domain_id: u32) -> Self {
        self.domain_id = domain_id;
        self
    }

    /// Share a runtime configuration (QoS profiles, default domain).
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<Participant> {
        let config = self.config.unwrap_or_default();
        let domain_id = config.resolve_domain(self.domain_id)?;
        let registry = DomainRegistry::global().get_or_create(domain_id);

        log::debug!(
            "[participant] '{}' joined domain {}",
            self.name,
            domain_id
        );

        Ok(Participant {
            name: self.name,
            domain_id,
            registry,
            config,
        })
    }
}

pub struct Participant {
    name: String,
    domain_id: u32,
    registry: Arc<TopicRegistry>,
    config: RuntimeConfig,
}

impl Participant {
    pub fn builder(name: &str) -> ParticipantBuilder {
        ParticipantBuilder::new(name)
    }

    /// Participant on the default domain with a fresh configuration.
    pub fn new(name: &str) -> Result<Self> {
        Self::builder(name).build()
    }

    /// Describe a topic.
    ///
    /// Fails with `TypeMismatch` if endpoints already use `name` with a
    /// different type. The topic itself registers nothing.
    pub fn create_topic(&self, name: &str, type_name: &str) -> Result<Topic> {
        let topic = Topic::new(name, type_name);
        match self.registry.type_of(name) {
            Some(existing) if existing != topic.type_id() => Err(Error::TypeMismatch {
                topic: name.to_string(),
            }),
            _ => Ok(topic),
        }
    }

    pub fn create_writer(&self, topic: &Topic, qos: QoS) -> Result<DataWriter> {
        self.registry
            .register_writer(topic.name(), topic.type_id(), &qos)
    }

    pub fn create_reader(&self, topic: &Topic, qos: QoS) -> Result<DataReader> {
        self.registry
            .register_reader(topic.name(), topic.type_id(), &qos)
    }

    /// Writer whose matching changes and completed publishes go to
    /// `listener`.
    pub fn create_writer_with_listener(
        &self,
        topic: &Topic,
        qos: QoS,
        listener: Arc<dyn DataWriterListener>,
    ) -> Result<DataWriter> {
        self.registry.register_writer_with_listener(
            topic.name(),
            topic.type_id(),
            &qos,
            Some(listener),
        )
    }

    /// Reader whose arrivals and status changes go to `listener`.
    pub fn create_reader_with_listener(
        &self,
        topic: &Topic,
        qos: QoS,
        listener: Arc<dyn DataReaderListener>,
    ) -> Result<DataReader> {
        self.registry.register_reader_with_listener(
            topic.name(),
            topic.type_id(),
            &qos,
            Some(listener),
        )
    }

    /// Writer using a named profile from the runtime config, or the default
    /// QoS for `None`.
    pub fn create_writer_with_profile(
        &self,
        topic: &Topic,
        profile: Option<&str>,
    ) -> Result<DataWriter> {
        let qos = self.config.qos_or_default(profile)?;
        self.create_writer(topic, qos)
    }

    /// Reader counterpart of
    /// [`create_writer_with_profile`](Self::create_writer_with_profile).
    pub fn create_reader_with_profile(
        &self,
        topic: &Topic,
        profile: Option<&str>,
    ) -> Result<DataReader> {
        let qos = self.config.qos_or_default(profile)?;
        self.create_reader(topic, qos)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain_id(&self) -> u32 {
        self.domain_id
    }

    /// Topic registry shared by every participant on this domain.
    pub fn registry(&self) -> &Arc<TopicRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

impl std::fmt::Debug for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Participant")
            .field("name", &self.name)
            .field("domain_id", &self.domain_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_DOMAIN_ID;

    // Each test uses its own domain so registries do not leak across tests.

    #[test]
    fn test_same_domain_shares_registry() {
        let a = Participant::builder("a").domain_id(101).build().expect("a");
        let b = Participant::builder("b").domain_id(101).build().expect("b");
        assert!(Arc::ptr_eq(a.registry(), b.registry()));

        let topic = a.create_topic("shared", "Blob").expect("topic");
        let writer = a.create_writer(&topic, QoS::default()).expect("writer");
        let reader = b.create_reader(&topic, QoS::default()).expect("reader");

        writer.publish(vec![7u8]).expect("publish");
        let sample = reader.take().expect("cross-participant delivery");
        assert_eq!(sample.payload(), &[7]);
    }

    #[test]
    fn test_domains_are_isolated() {
        let a = Participant::builder("a").domain_id(102).build().expect("a");
        let b = Participant::builder("b").domain_id(103).build().expect("b");
        let topic = a.create_topic("iso", "Blob").expect("topic");
        let writer = a.create_writer(&topic, QoS::default()).expect("writer");
        let reader = b.create_reader(&topic, QoS::default()).expect("reader");
        writer.publish(vec![1u8]).expect("publish");
        assert!(reader.take().is_none());
    }

    #[test]
    fn test_invalid_domain_rejected() {
        let err = Participant::builder("x")
            .domain_id(MAX_DOMAIN_ID + 1)
            .build()
            .expect_err("out of range");
        assert!(matches!(err, Error::InvalidDomainId(_)));
    }

    #[test]
    fn test_default_domain_from_config() {
        let config = RuntimeConfig::new();
        config.set_default_domain(104).expect("in range");
        let p = Participant::builder("cfg")
            .config(config)
            .build()
            .expect("participant");
        assert_eq!(p.domain_id(), 104);
    }

    #[test]
    fn test_create_topic_checks_existing_type() {
        let p = Participant::builder("p").domain_id(105).build().expect("p");
        let topic = p.create_topic("typed", "A").expect("topic");
        let _writer = p.create_writer(&topic, QoS::default()).expect("writer");

        let err = p.create_topic("typed", "B").expect_err("type clash");
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert!(p.create_topic("typed", "A").is_ok());
    }

    #[test]
    fn test_profile_endpoints() {
        let config = RuntimeConfig::new();
        config
            .set_profile("deep", QoS::default().keep_last(4))
            .expect("profile");
        let p = Participant::builder("p")
            .domain_id(106)
            .config(config)
            .build()
            .expect("p");
        let topic = p.create_topic("profiled", "Blob").expect("topic");

        let reader = p
            .create_reader_with_profile(&topic, Some("deep"))
            .expect("reader");
        assert_eq!(reader.qos().history_depth(), 4);
        assert!(matches!(
            p.create_writer_with_profile(&topic, Some("missing")),
            Err(Error::Config(_))
        ));
        let writer = p
            .create_writer_with_profile(&topic, None)
            .expect("default writer");
        assert!(!writer.qos().is_reliable());
    }
}
