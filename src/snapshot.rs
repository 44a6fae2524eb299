//! Point-in-time captures reported from the stepping side.

use std::fmt;

use crate::command::Action;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Distance to `other` in the horizontal plane.
    pub fn planar_distance(&self, other: &Position) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Telemetry for one tick: what the agent is doing and where it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateSnapshot {
    pub status: Action,
    pub position: Position,
    pub battery_level: f32,
}

/// Obstacle ranges for one tick plus the position they were taken from.
///
/// A reading equal to [`DistanceSnapshot::NO_READING`] means nothing was in range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSnapshot {
    pub front: f32,
    pub back: f32,
    pub left: f32,
    pub right: f32,
    pub position: Position,
}

impl DistanceSnapshot {
    pub const NO_READING: f32 = -1.0;

    pub fn empty(position: Position) -> Self {
        Self {
            front: Self::NO_READING,
            back: Self::NO_READING,
            left: Self::NO_READING,
            right: Self::NO_READING,
            position,
        }
    }

    /// The closest actual reading, ignoring sentinels.
    pub fn nearest(&self) -> Option<f32> {
        [self.front, self.back, self.left, self.right]
            .into_iter()
            .filter(|reading| *reading != Self::NO_READING)
            .reduce(f32::min)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub message: String,
    pub level: LogLevel,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, level: LogLevel) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }
}
