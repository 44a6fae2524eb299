use std::fmt::Display;
use std::sync::Arc;

/// Identifies the drone a command is addressed to.
///
/// On the wire this is the `uri` carried by every mission request. It is an opaque string and the
/// bridge never parses it.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TargetId(Arc<str>);

impl TargetId {
    /// Create a new [`TargetId`] from any type that can be converted into an `Arc<str>`.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty, which the gRPC layer reads as "every drone".
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TargetId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for TargetId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}
