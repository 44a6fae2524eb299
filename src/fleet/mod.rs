use std::sync::Arc;

use dashmap::{DashMap, Entry};
use tracing::info;

use self::error::{DroneAlreadyRegistered, DroneNotFound};
use crate::bridge::Bridge;
use crate::bridge::config::BridgeConfig;
use crate::target::TargetId;

pub mod error;

/// Every drone hosted by this process, each with its own [`Bridge`].
///
/// Request handlers look a drone up by the command's target and hold the bridge only for the
/// duration of the request.
#[derive(Debug)]
pub struct Fleet {
    bridges: DashMap<TargetId, Arc<Bridge>, ahash::RandomState>,
}

impl Fleet {
    /// Construct a new empty [`Fleet`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bridge for `target` configured with `config`.
    pub fn register(
        &self,
        target: TargetId,
        config: BridgeConfig,
    ) -> Result<Arc<Bridge>, DroneAlreadyRegistered> {
        match self.bridges.entry(target) {
            Entry::Occupied(entry) => Err(DroneAlreadyRegistered {
                target: entry.key().clone(),
            }),

            Entry::Vacant(slot) => {
                info!(drone = %slot.key(), "Drone registered");
                let bridge = Arc::new(Bridge::new(slot.key().clone(), config));
                slot.insert(Arc::clone(&bridge));
                Ok(bridge)
            }
        }
    }

    /// Remove the bridge for `target`. Requests already holding it finish normally.
    pub fn remove(&self, target: &TargetId) -> Result<(), DroneNotFound> {
        self.bridges
            .remove(target)
            .ok_or_else(|| DroneNotFound {
                target: target.clone(),
            })?;

        info!(drone = %target, "Drone removed");
        Ok(())
    }

    pub fn get(&self, target: &TargetId) -> Result<Arc<Bridge>, DroneNotFound> {
        self.bridges
            .get(target)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| DroneNotFound {
                target: target.clone(),
            })
    }

    /// Registered drones in id order.
    pub fn targets(&self) -> Vec<TargetId> {
        let mut targets: Vec<_> = self.bridges.iter().map(|entry| entry.key().clone()).collect();
        targets.sort();
        targets
    }

    /// Bridges in id order. An empty `target` selects every drone.
    pub fn select(&self, target: &TargetId) -> Result<Vec<Arc<Bridge>>, DroneNotFound> {
        if !target.is_empty() {
            return self.get(target).map(|bridge| vec![bridge]);
        }

        Ok(self
            .targets()
            .iter()
            .filter_map(|target| self.get(target).ok())
            .collect())
    }

    pub fn len(&self) -> usize {
        self.bridges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }
}

impl Default for Fleet {
    fn default() -> Self {
        Self {
            bridges: DashMap::default(),
        }
    }
}
