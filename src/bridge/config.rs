use std::time::Duration;

use bon::Builder;

pub use crate::state_machine::report::ReportRetention;

/// How long a Return request waits for completion when nothing else is configured.
pub const DEFAULT_RETURN_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration for a single drone [`Bridge`](super::Bridge).
#[derive(Debug, Clone, Builder)]
pub struct BridgeConfig {
    /// Upper bound on how long a blocking command waits for the stepping side to signal
    /// completion before failing with a deadline error.
    #[builder(default = DEFAULT_RETURN_TIMEOUT)]
    pub return_timeout: Duration,

    /// Retention applied to the telemetry, distance and log channels.
    #[builder(default)]
    pub report_retention: ReportRetention,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
