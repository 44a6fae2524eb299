use crate::target::TargetId;

/// Indicates that a drone could not be registered because one with the same id already exists.
#[derive(Debug, thiserror::Error)]
#[error("drone {target} is already registered")]
pub struct DroneAlreadyRegistered {
    pub target: TargetId,
}

/// Indicates that no bridge is registered for the requested drone.
#[derive(Debug, thiserror::Error)]
#[error("drone {target} is not registered")]
pub struct DroneNotFound {
    pub target: TargetId,
}
