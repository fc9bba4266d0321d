// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Topic
//!
//! A [`Topic`] names a data channel and fixes its payload type. It carries
//! no endpoint state: writers and readers are created from it through
//! [`Participant`](crate::Participant), which registers them with the
//! domain's [`TopicRegistry`](crate::TopicRegistry).
//!
//! ```rust,no_run
//! use hdds_intra::{Participant, QoS};
//!
//! let participant = Participant::builder("app").build()?;
//! let topic = participant.create_topic("sensors/temperature", "SensorData")?;
//! let writer = participant.create_writer(&topic, QoS::reliable())?;
//! let reader = participant.create_reader(&topic, QoS::default())?;
//! # Ok::<(), hdds_intra::Error>(())
//! ```

use crate::core::types::TypeId;
use std::sync::Arc;

/// Topic name bound to a type name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topic {
    name: Arc<str>,
    type_name: Arc<str>,
    type_id: TypeId,
}

impl Topic {
    /// Describe a topic. Nothing is registered until an endpoint is created.
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: Arc::from(name),
            type_name: Arc::from(type_name),
            type_id: TypeId::from_type_name(type_name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Type identity derived from the type name.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_id_follows_type_name() {
        let a = Topic::new("t", "Temperature");
        let b = Topic::new("other", "Temperature");
        let c = Topic::new("t", "Pressure");
        assert_eq!(a.type_id(), b.type_id());
        assert_ne!(a.type_id(), c.type_id());
        assert_eq!(a.to_string(), "t (Temperature)");
    }
}
