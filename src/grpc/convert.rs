//! Mapping between bridge types and the generated protobuf messages.

use tonic::Status;

use crate::bridge::Ack;
use crate::bridge::error::ReturnTimedOut;
use crate::command::Action;
use crate::fleet::error::DroneNotFound;
use crate::simulation_proto as proto;
use crate::snapshot::{DistanceSnapshot, LogEntry, Position, StateSnapshot};
use crate::target::TargetId;

impl From<Action> for proto::AgentAction {
    fn from(action: Action) -> Self {
        match action {
            Action::None => proto::AgentAction::None,
            Action::Identify => proto::AgentAction::Identify,
            Action::Start => proto::AgentAction::Start,
            Action::Move => proto::AgentAction::Move,
            Action::Stop => proto::AgentAction::Stop,
            Action::EmergencyStop => proto::AgentAction::EmergencyStop,
            Action::ChooseAngle => proto::AgentAction::ChooseAngle,
            Action::ChoosePerpendicularAngle => proto::AgentAction::ChoosePerpendicularAngle,
            Action::Return => proto::AgentAction::Return,
            Action::Done => proto::AgentAction::Done,
        }
    }
}

impl From<Position> for proto::Position {
    fn from(position: Position) -> Self {
        proto::Position {
            x: position.x,
            y: position.y,
            z: position.z,
        }
    }
}

impl From<Ack> for proto::MissionReply {
    fn from(ack: Ack) -> Self {
        proto::MissionReply {
            message: ack.message,
        }
    }
}

pub(super) fn telemetric(target: &TargetId, snapshot: StateSnapshot) -> proto::Telemetric {
    proto::Telemetric {
        status: proto::AgentAction::from(snapshot.status).into(),
        position: Some(snapshot.position.into()),
        battery_level: snapshot.battery_level,
        uri: target.to_string(),
    }
}

pub(super) fn distance_obstacle(
    target: &TargetId,
    snapshot: DistanceSnapshot,
) -> proto::DistanceObstacle {
    proto::DistanceObstacle {
        front: snapshot.front,
        back: snapshot.back,
        left: snapshot.left,
        right: snapshot.right,
        position: Some(snapshot.position.into()),
        uri: target.to_string(),
    }
}

pub(super) fn log_data(target: &TargetId, entry: LogEntry) -> proto::LogData {
    proto::LogData {
        message: entry.message,
        level: entry.level.as_str().to_string(),
        uri: target.to_string(),
    }
}

impl From<DroneNotFound> for Status {
    fn from(err: DroneNotFound) -> Self {
        Status::not_found(err.to_string())
    }
}

impl From<ReturnTimedOut> for Status {
    fn from(err: ReturnTimedOut) -> Self {
        Status::deadline_exceeded(err.to_string())
    }
}
