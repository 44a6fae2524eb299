//! Commands issued by the request side and consumed by the stepping side.

use crate::target::TargetId;

/// Revision of the [`Action`] set. Bump whenever a variant is added or renumbered so producers
/// and consumers can detect drift.
pub const ACTION_SET_VERSION: u32 = 2;

/// What the agent is asked to do, or is currently doing.
///
/// The discriminants are the wire values and must stay stable across revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum Action {
    #[default]
    None = 0,
    Identify = 1,
    Start = 2,
    Move = 3,
    Stop = 4,
    EmergencyStop = 5,
    ChooseAngle = 6,
    ChoosePerpendicularAngle = 7,
    Return = 8,
    /// Completion marker for a blocking command. Never delivered to the control algorithm.
    Done = 9,
}

impl Action {
    pub const ALL: [Action; 10] = [
        Action::None,
        Action::Identify,
        Action::Start,
        Action::Move,
        Action::Stop,
        Action::EmergencyStop,
        Action::ChooseAngle,
        Action::ChoosePerpendicularAngle,
        Action::Return,
        Action::Done,
    ];

    pub fn as_wire(self) -> i32 {
        self as i32
    }

    /// Whether the requester must wait for the stepping side to signal completion.
    pub fn is_blocking(self) -> bool {
        matches!(self, Action::Return)
    }
}

/// Indicates that a wire value does not name any [`Action`] in the current revision.
#[derive(Debug, thiserror::Error)]
#[error("unknown action value {value}")]
pub struct UnknownAction {
    pub value: i32,
}

impl TryFrom<i32> for Action {
    type Error = UnknownAction;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_wire() == value)
            .ok_or(UnknownAction { value })
    }
}

/// A single instruction for one drone. Consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub target: TargetId,
    pub action: Action,
}

impl Command {
    pub fn new(target: impl Into<TargetId>, action: Action) -> Self {
        Self {
            target: target.into(),
            action,
        }
    }

    pub fn is_completion_marker(&self) -> bool {
        self.action == Action::Done
    }
}
