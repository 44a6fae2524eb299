//! Error types for the request side of the bridge.

use std::time::Duration;

use crate::target::TargetId;

/// Indicates that a blocking command was never reported complete by the stepping side within
/// the configured timeout.
#[derive(Debug, thiserror::Error)]
#[error("return of drone {target} not completed within {waited:?}")]
pub struct ReturnTimedOut {
    pub target: TargetId,
    pub waited: Duration,
}
