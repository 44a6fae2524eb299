//! The control-loop side of the bridge.
//!
//! A [`SteppingAdapter`] is owned by the single stepping context and called once per tick in a
//! fixed order: take the next command, publish state, publish distances. Completion signals and
//! log entries may be emitted at any point of the tick. None of these calls ever waits on
//! anything but a channel lock.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::bridge::Bridge;
use crate::command::{Action, Command};
use crate::snapshot::{DistanceSnapshot, LogEntry, LogLevel, Position, StateSnapshot};
use crate::target::TargetId;

#[derive(Debug)]
pub struct SteppingAdapter {
    bridge: Arc<Bridge>,
    current_action: Action,
    action_ticks: u64,
}

impl SteppingAdapter {
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self {
            bridge,
            current_action: Action::None,
            action_ticks: 0,
        }
    }

    pub fn target(&self) -> &TargetId {
        self.bridge.target()
    }

    pub fn current_action(&self) -> Action {
        self.current_action
    }

    /// Ticks elapsed since the current action began.
    pub fn action_ticks(&self) -> u64 {
        self.action_ticks
    }

    /// Take at most one command for this tick.
    ///
    /// A delivered command becomes the current action and restarts the action timer. With no
    /// command pending the timer advances by one tick instead.
    pub fn take_next_command(&mut self) -> Option<Command> {
        match self.bridge.try_take_command() {
            Some(cmd) => {
                debug!(
                    drone = %self.bridge.target(),
                    from = ?self.current_action,
                    to = ?cmd.action,
                    "Command delivered to control loop"
                );
                self.current_action = cmd.action;
                self.action_ticks = 0;
                Some(cmd)
            }
            None => {
                self.action_ticks = self.action_ticks.saturating_add(1);
                None
            }
        }
    }

    /// Transition to `action` on the control algorithm's own initiative.
    pub fn set_action(&mut self, action: Action) {
        if action != self.current_action {
            self.current_action = action;
            self.action_ticks = 0;
        }
    }

    /// Build this tick's telemetry from the current action.
    pub fn state_snapshot(&self, position: Position, battery_level: f32) -> StateSnapshot {
        StateSnapshot {
            status: self.current_action,
            position,
            battery_level,
        }
    }

    pub fn publish_state(&self, snapshot: StateSnapshot) {
        self.bridge.publish_state(snapshot);
    }

    pub fn publish_distances(&self, snapshot: DistanceSnapshot) {
        self.bridge.publish_distances(snapshot);
    }

    /// Called once a blocking action has finished.
    pub fn signal_completion(&self) {
        debug!(drone = %self.bridge.target(), action = ?self.current_action, "Signalling completion");
        self.bridge.signal_completion();
    }

    /// Report `message` to pollers and to the local subscriber.
    pub fn log(&self, message: impl Into<String>, level: LogLevel) {
        let entry = LogEntry::new(message, level);
        let drone = self.bridge.target();
        match level {
            LogLevel::Debug => debug!(drone = %drone, "{}", entry.message),
            LogLevel::Info => info!(drone = %drone, "{}", entry.message),
            LogLevel::Warning => warn!(drone = %drone, "{}", entry.message),
            LogLevel::Error => error!(drone = %drone, "{}", entry.message),
        }
        self.bridge.publish_log(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::config::BridgeConfig;

    fn adapter() -> (Arc<Bridge>, SteppingAdapter) {
        let bridge = Arc::new(Bridge::new("drone-1", BridgeConfig::default()));
        let adapter = SteppingAdapter::new(Arc::clone(&bridge));
        (bridge, adapter)
    }

    #[test]
    fn test_three_tick_scenario() {
        let (bridge, mut adapter) = adapter();
        bridge.issue_start("drone-1".into());

        let mut taken = Vec::new();
        for tick in 0..3 {
            taken.push(adapter.take_next_command());
            let position = Position::new(tick as f32, 0.0, 0.0);
            adapter.publish_state(adapter.state_snapshot(position, 90.0));
        }

        assert!(matches!(taken[0], Some(Command { action: Action::Start, .. })));
        assert!(taken[1].is_none());
        assert!(taken[2].is_none());

        let polled = bridge.poll_telemetry();
        assert_eq!(polled.len(), 3);
        let xs: Vec<f32> = polled.iter().map(|s| s.position.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
        assert!(polled.iter().all(|s| s.status == Action::Start));

        assert!(bridge.poll_telemetry().is_empty());
    }

    #[test]
    fn test_action_timer_resets_on_command() {
        let (bridge, mut adapter) = adapter();

        adapter.take_next_command();
        adapter.take_next_command();
        assert_eq!(adapter.action_ticks(), 2);
        assert_eq!(adapter.current_action(), Action::None);

        bridge.issue_stop("drone-1".into());
        adapter.take_next_command();
        assert_eq!(adapter.current_action(), Action::Stop);
        assert_eq!(adapter.action_ticks(), 0);
    }

    #[test]
    fn test_set_action_same_action_keeps_timer() {
        let (_bridge, mut adapter) = adapter();
        adapter.set_action(Action::Move);
        adapter.take_next_command();
        adapter.set_action(Action::Move);
        assert_eq!(adapter.action_ticks(), 1);

        adapter.set_action(Action::ChooseAngle);
        assert_eq!(adapter.action_ticks(), 0);
    }

    #[test]
    fn test_log_is_polled_in_order() {
        let (bridge, adapter) = adapter();
        adapter.log("taking off", LogLevel::Info);
        adapter.log("wall ahead", LogLevel::Warning);

        let logs = bridge.poll_logs();
        assert_eq!(
            logs,
            vec![
                LogEntry::new("taking off", LogLevel::Info),
                LogEntry::new("wall ahead", LogLevel::Warning),
            ]
        );
    }

    #[tokio::test]
    async fn test_completion_from_adapter_unblocks_return() {
        let (bridge, mut adapter) = adapter();

        let waiter = tokio::spawn({
            let bridge = Arc::clone(&bridge);
            async move { bridge.issue_return("drone-1".into()).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let cmd = adapter.take_next_command();
        assert!(matches!(cmd, Some(Command { action: Action::Return, .. })));
        adapter.signal_completion();

        assert!(waiter.await.unwrap().is_ok());
    }
}
