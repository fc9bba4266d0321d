// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WaitSet: block until one of several conditions triggers.
//!
//! Backed by the runtime [`WaitsetDriver`]. Each attached condition keeps a
//! weak handle to the driver and signals it when its trigger value may have
//! turned `true`; `wait()` re-evaluates every condition after each signal.
//!
//! ```rust,no_run
//! use hdds_intra::dds::{Condition, GuardCondition, SampleStateMask, WaitSet};
//! use hdds_intra::{Participant, QoS};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> hdds_intra::Result<()> {
//! let participant = Participant::builder("app").build()?;
//! let topic = participant.create_topic("cmd", "Command")?;
//! let reader = participant.create_reader(&topic, QoS::default())?;
//!
//! let shutdown = Arc::new(GuardCondition::new());
//! let waitset = WaitSet::new();
//! waitset.attach_condition(reader.create_read_condition(SampleStateMask::ANY))?;
//! waitset.attach_condition(shutdown.clone())?;
//!
//! for condition in waitset.wait(Some(Duration::from_secs(1)))? {
//!     if condition.condition_id() == shutdown.condition_id() {
//!         return Ok(());
//!     }
//!     while let Some(sample) = reader.take() {
//!         println!("{} bytes", sample.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use super::condition::{Condition, HasStatusCondition};
use super::{Error, Result};
use crate::core::rt::{WaitsetDriver, WaitsetSignal};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Wait for any of several conditions.
pub struct WaitSet {
    driver: Arc<WaitsetDriver>,
    conditions: Mutex<Vec<Arc<dyn Condition>>>,
    notified: AtomicBool,
}

impl WaitSet {
    #[must_use]
    pub fn new() -> Self {
        Self {
            driver: Arc::new(WaitsetDriver::new()),
            conditions: Mutex::new(Vec::new()),
            notified: AtomicBool::new(false),
        }
    }

    fn signal(&self) -> Arc<dyn WaitsetSignal> {
        Arc::clone(&self.driver) as Arc<dyn WaitsetSignal>
    }

    /// Attach a condition. Attaching the same condition twice fails.
    pub fn attach_condition(&self, condition: Arc<dyn Condition>) -> Result<()> {
        let condition_id = condition.condition_id();
        {
            let mut conditions = self.conditions.lock();
            if conditions
                .iter()
                .any(|attached| attached.condition_id() == condition_id)
            {
                return Err(Error::Config(format!(
                    "condition {} already attached",
                    condition_id
                )));
            }
            conditions.push(Arc::clone(&condition));
        }
        condition.add_waitset_signal(self.signal());
        Ok(())
    }

    /// Attach an entity's StatusCondition (convenience method).
    pub fn attach<E: HasStatusCondition>(&self, entity: &E) -> Result<()> {
        self.attach_condition(entity.get_status_condition())
    }

    /// Detach a condition. Fails if it is not attached.
    pub fn detach_condition(&self, condition: Arc<dyn Condition>) -> Result<()> {
        let condition_id = condition.condition_id();
        let mut conditions = self.conditions.lock();
        let before = conditions.len();
        conditions.retain(|attached| attached.condition_id() != condition_id);
        if conditions.len() == before {
            return Err(Error::Config(format!(
                "condition {} is not attached",
                condition_id
            )));
        }
        drop(conditions);
        condition.remove_waitset_signal(self.driver.id());
        Ok(())
    }

    #[must_use]
    pub fn get_conditions(&self) -> Vec<Arc<dyn Condition>> {
        self.conditions.lock().clone()
    }

    /// Block until at least one attached condition triggers and return the
    /// triggered ones.
    ///
    /// Returns an empty list after [`notify`](Self::notify), and
    /// [`Error::WouldBlock`] once `timeout` elapses. `None` waits forever.
    pub fn wait(&self, timeout: Option<Duration>) -> Result<Vec<Arc<dyn Condition>>> {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        loop {
            let seen = self.driver.generation();
            if self.notified.swap(false, Ordering::AcqRel) {
                return Ok(Vec::new());
            }
            let triggered: Vec<Arc<dyn Condition>> = self
                .get_conditions()
                .into_iter()
                .filter(|condition| condition.get_trigger_value())
                .collect();
            if !triggered.is_empty() {
                return Ok(triggered);
            }
            if !self.driver.wait_past(seen, deadline) {
                log::debug!("[waitset] wait timed out after {:?}", timeout);
                return Err(Error::WouldBlock);
            }
        }
    }

    /// Wake a blocked `wait()` without triggering any condition.
    pub fn notify(&self) {
        self.notified.store(true, Ordering::Release);
        self.driver.signal();
    }
}

impl Default for WaitSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WaitSet {
    fn drop(&mut self) {
        let signal_id = self.driver.id();
        for condition in self.conditions.get_mut().drain(..) {
            condition.remove_waitset_signal(signal_id);
        }
    }
}

impl std::fmt::Debug for WaitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitSet")
            .field("conditions", &self.conditions.lock().len())
            .finish()
    }
}
