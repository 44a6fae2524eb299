//! The bridge between the request-handling side and the fixed-period stepping side.
//!
//! Every channel is a pure [`StateMachine`] behind its own [`Mutex`]. Each operation takes that
//! lock for the duration of a single enqueue, take, publish or drain and never across an
//! `.await`, so the stepping side only ever waits on a bounded critical section.

pub mod config;
pub mod error;

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::{debug, info, warn};

use self::config::BridgeConfig;
use self::error::ReturnTimedOut;
use crate::command::{Action, Command};
use crate::snapshot::{DistanceSnapshot, LogEntry, StateSnapshot};
use crate::state_machine::StateMachine;
use crate::state_machine::command::{CommandInput, CommandOutput, CommandQueueMachine};
use crate::state_machine::completion::{CompletionInput, CompletionMachine};
use crate::state_machine::report::{ReportInput, ReportMachine};
use crate::target::TargetId;

/// Reply sent to the external caller once a command has been accepted (or, for Return,
/// completed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn success() -> Self {
        Self {
            message: "Success".to_string(),
        }
    }
}

pub struct Bridge {
    target: TargetId,
    config: BridgeConfig,
    commands: Mutex<CommandQueueMachine>,
    completions: Mutex<CompletionMachine>,
    completion_notify: Notify,
    telemetry: Mutex<ReportMachine<StateSnapshot>>,
    distances: Mutex<ReportMachine<DistanceSnapshot>>,
    logs: Mutex<ReportMachine<LogEntry>>,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("target", &self.target)
            .field("config", &self.config)
            .field("commands", &"<CommandQueueMachine>")
            .field("completions", &"<CompletionMachine>")
            .field("telemetry", &"<ReportMachine>")
            .field("distances", &"<ReportMachine>")
            .field("logs", &"<ReportMachine>")
            .finish()
    }
}

// Machine mutations are single queue operations, a poisoned guard never holds a torn machine.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Bridge {
    pub fn new(target: impl Into<TargetId>, config: BridgeConfig) -> Self {
        let retention = config.report_retention;
        Self {
            target: target.into(),
            config,
            commands: Mutex::new(CommandQueueMachine::new()),
            completions: Mutex::new(CompletionMachine::new()),
            completion_notify: Notify::new(),
            telemetry: Mutex::new(ReportMachine::new(retention)),
            distances: Mutex::new(ReportMachine::new(retention)),
            logs: Mutex::new(ReportMachine::new(retention)),
        }
    }

    /// The drone this bridge serves.
    pub fn target(&self) -> &TargetId {
        &self.target
    }

    /// Append `cmd` to the command channel. Never blocks beyond the channel lock.
    ///
    /// A [`Action::Done`] marker is routed to the completion channel instead, so the stepping
    /// side can never receive it as a command.
    pub fn enqueue_command(&self, cmd: Command) {
        if cmd.is_completion_marker() {
            debug!(drone = %cmd.target, "Completion marker routed to completion channel");
            self.signal_completion();
            return;
        }

        debug!(
            drone = %cmd.target,
            action = ?cmd.action,
            blocking = cmd.action.is_blocking(),
            "Command enqueued"
        );
        lock(&self.commands).process_input(CommandInput::Enqueue(cmd));
    }

    /// Remove and return the oldest pending command, if any.
    pub fn try_take_command(&self) -> Option<Command> {
        lock(&self.commands)
            .poll_output()
            .map(|out| match out {
                CommandOutput::Command(cmd) => cmd,
            })
    }

    pub fn pending_commands(&self) -> usize {
        lock(&self.commands).pending_count()
    }

    /// Record that a blocking command finished and wake one waiting requester.
    pub fn signal_completion(&self) {
        lock(&self.completions).process_input(CompletionInput::Signal);
        self.completion_notify.notify_one();
    }

    pub fn pending_completions(&self) -> usize {
        lock(&self.completions).pending_count()
    }

    fn try_take_completion(&self) -> bool {
        lock(&self.completions).poll_output().is_some()
    }

    async fn wait_for_completion(&self) {
        loop {
            // Register before checking so a signal landing between the check and the await
            // still wakes us.
            let notified = self.completion_notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.try_take_completion() {
                return;
            }

            notified.await;
        }
    }

    pub fn publish_state(&self, snapshot: StateSnapshot) {
        self.publish_report(&self.telemetry, "telemetry", snapshot);
    }

    pub fn publish_distances(&self, snapshot: DistanceSnapshot) {
        self.publish_report(&self.distances, "distances", snapshot);
    }

    pub fn publish_log(&self, entry: LogEntry) {
        self.publish_report(&self.logs, "logs", entry);
    }

    fn publish_report<T>(&self, channel: &Mutex<ReportMachine<T>>, name: &'static str, entry: T) {
        let first_overwrite = {
            let mut machine = lock(channel);
            let before = machine.overwritten();
            machine.process_input(ReportInput::Publish(entry));
            before == 0 && machine.overwritten() > 0
        };

        if first_overwrite {
            warn!(
                drone = %self.target,
                channel = name,
                "Report channel full, overwriting oldest entries until the next poll"
            );
        }
    }

    pub fn issue_start(&self, target: TargetId) -> Ack {
        self.enqueue_command(Command::new(target, Action::Start));
        Ack::success()
    }

    pub fn issue_stop(&self, target: TargetId) -> Ack {
        self.enqueue_command(Command::new(target, Action::Stop));
        Ack::success()
    }

    /// Enqueue a Return and wait until the stepping side signals that the drone is home.
    ///
    /// Fails with [`ReturnTimedOut`] once [`BridgeConfig::return_timeout`] elapses. Dropping the
    /// returned future abandons the wait; the Return command itself stays queued.
    pub async fn issue_return(&self, target: TargetId) -> Result<Ack, ReturnTimedOut> {
        let limit = self.config.return_timeout;
        self.enqueue_command(Command::new(target.clone(), Action::Return));

        debug!(drone = %target, timeout = ?limit, "Waiting for return to complete");

        if tokio::time::timeout(limit, self.wait_for_completion())
            .await
            .is_err()
        {
            warn!(drone = %target, waited = ?limit, "Return not completed in time");
            return Err(ReturnTimedOut {
                target,
                waited: limit,
            });
        }

        info!(drone = %target, "Return completed");
        Ok(Ack::success())
    }

    /// Drain every telemetry snapshot published since the previous poll.
    pub fn poll_telemetry(&self) -> Vec<StateSnapshot> {
        lock(&self.telemetry).drain_output()
    }

    pub fn poll_distances(&self) -> Vec<DistanceSnapshot> {
        lock(&self.distances).drain_output()
    }

    pub fn poll_logs(&self) -> Vec<LogEntry> {
        lock(&self.logs).drain_output()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::num::NonZeroUsize;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::snapshot::{LogLevel, Position};
    use crate::state_machine::report::ReportRetention;

    fn bridge_with_timeout(timeout: Duration) -> Bridge {
        Bridge::new(
            "drone-1",
            BridgeConfig::builder().return_timeout(timeout).build(),
        )
    }

    fn state(tick: u32) -> StateSnapshot {
        StateSnapshot {
            status: Action::Move,
            position: Position::new(tick as f32, 0.0, 1.0),
            battery_level: 100.0,
        }
    }

    #[test]
    fn test_commands_taken_in_enqueue_order() {
        let bridge = Bridge::new("drone-1", BridgeConfig::default());
        let actions = [Action::Start, Action::Identify, Action::Stop, Action::Return];

        for action in actions {
            bridge.enqueue_command(Command::new("drone-1", action));
        }

        for action in actions {
            let cmd = bridge.try_take_command().unwrap();
            assert_eq!(cmd.action, action);
        }
        assert!(bridge.try_take_command().is_none());
    }

    #[test]
    fn test_done_marker_never_reaches_command_channel() {
        let bridge = Bridge::new("drone-1", BridgeConfig::default());

        bridge.enqueue_command(Command::new("drone-1", Action::Done));

        assert!(bridge.try_take_command().is_none());
        assert_eq!(bridge.pending_commands(), 0);
        assert_eq!(bridge.pending_completions(), 1);
    }

    #[test]
    fn test_concurrent_enqueue_no_loss_no_duplication() {
        let bridge = Arc::new(Bridge::new("drone-1", BridgeConfig::default()));
        let barrier = Arc::new(Barrier::new(50));

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let bridge = Arc::clone(&bridge);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    bridge.enqueue_command(Command::new(format!("drone-{i}"), Action::Start));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(bridge.pending_commands(), 50);

        // Several takers race for the same queue
        let takers: Vec<_> = (0..5)
            .map(|_| {
                let bridge = Arc::clone(&bridge);
                thread::spawn(move || {
                    let mut taken = Vec::new();
                    while let Some(cmd) = bridge.try_take_command() {
                        taken.push(cmd.target.to_string());
                    }
                    taken
                })
            })
            .collect();

        let all: Vec<String> = takers
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        let unique: HashSet<_> = all.iter().cloned().collect();

        assert_eq!(all.len(), 50);
        assert_eq!(unique.len(), 50);
    }

    #[test]
    fn test_drain_empty_then_publish() {
        let bridge = Bridge::new("drone-1", BridgeConfig::default());
        assert!(bridge.poll_telemetry().is_empty());
        assert!(bridge.poll_distances().is_empty());
        assert!(bridge.poll_logs().is_empty());

        bridge.publish_state(state(0));
        assert_eq!(bridge.poll_telemetry(), vec![state(0)]);
    }

    #[test]
    fn test_single_producer_single_poller_preserves_order() {
        let bridge = Arc::new(Bridge::new("drone-1", BridgeConfig::default()));

        let producer = {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                for tick in 0..500 {
                    bridge.publish_state(state(tick));
                }
            })
        };

        let mut drained = Vec::new();
        while !producer.is_finished() {
            drained.extend(bridge.poll_telemetry());
        }
        producer.join().unwrap();
        drained.extend(bridge.poll_telemetry());

        let expected: Vec<_> = (0..500).map(state).collect();
        assert_eq!(drained, expected);
    }

    #[test]
    fn test_report_retention_applies_to_every_channel() {
        let config = BridgeConfig::builder()
            .report_retention(ReportRetention::KeepLatest(NonZeroUsize::new(1).unwrap()))
            .build();
        let bridge = Bridge::new("drone-1", config);

        bridge.publish_log(LogEntry::new("first", LogLevel::Info));
        bridge.publish_log(LogEntry::new("second", LogLevel::Info));
        bridge.publish_state(state(1));
        bridge.publish_state(state(2));

        assert_eq!(bridge.poll_logs(), vec![LogEntry::new("second", LogLevel::Info)]);
        assert_eq!(bridge.poll_telemetry(), vec![state(2)]);
    }

    #[test]
    fn test_start_and_stop_ack_immediately() {
        let bridge = Bridge::new("drone-1", BridgeConfig::default());

        assert_eq!(bridge.issue_start("drone-1".into()), Ack::success());
        assert_eq!(bridge.issue_stop("drone-1".into()), Ack::success());
        assert_eq!(bridge.pending_commands(), 2);
    }

    #[tokio::test]
    async fn test_return_unblocks_on_completion() {
        let bridge = Arc::new(bridge_with_timeout(Duration::from_secs(5)));

        let stepper = {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                // Wait for the Return to show up, as a control loop would
                loop {
                    if let Some(cmd) = bridge.try_take_command() {
                        assert_eq!(cmd.action, Action::Return);
                        break;
                    }
                    thread::sleep(Duration::from_millis(5));
                }
                thread::sleep(Duration::from_millis(50));
                bridge.signal_completion();
            })
        };

        let ack = bridge.issue_return("drone-1".into()).await.unwrap();
        assert_eq!(ack, Ack::success());
        assert_eq!(bridge.pending_completions(), 0);
        stepper.join().unwrap();
    }

    #[tokio::test]
    async fn test_return_times_out_without_completion() {
        let timeout = Duration::from_millis(100);
        let bridge = bridge_with_timeout(timeout);

        let started = Instant::now();
        let result = bridge.issue_return("drone-1".into()).await;
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(ReturnTimedOut { waited, .. }) if waited == timeout));
        assert!(elapsed >= timeout);
        assert!(elapsed < timeout + Duration::from_millis(1000));
        // The command was still delivered to the stepping side
        assert!(matches!(
            bridge.try_take_command(),
            Some(Command { action: Action::Return, .. })
        ));
    }

    #[tokio::test]
    async fn test_pending_completion_satisfies_next_return() {
        let bridge = bridge_with_timeout(Duration::from_millis(100));
        bridge.signal_completion();

        assert!(bridge.issue_return("drone-1".into()).await.is_ok());
        assert_eq!(bridge.pending_completions(), 0);
    }

    #[tokio::test]
    async fn test_each_signal_releases_one_waiter() {
        let bridge = Arc::new(bridge_with_timeout(Duration::from_secs(5)));

        let first = tokio::spawn({
            let bridge = Arc::clone(&bridge);
            async move { bridge.issue_return("drone-1".into()).await }
        });
        let second = tokio::spawn({
            let bridge = Arc::clone(&bridge);
            async move { bridge.issue_return("drone-1".into()).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        bridge.signal_completion();
        bridge.signal_completion();

        assert!(first.await.unwrap().is_ok());
        assert!(second.await.unwrap().is_ok());
        assert_eq!(bridge.pending_commands(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_return_does_not_consume_signal() {
        let bridge = Arc::new(bridge_with_timeout(Duration::from_secs(5)));

        let cancelled = tokio::spawn({
            let bridge = Arc::clone(&bridge);
            async move { bridge.issue_return("drone-1".into()).await }
        });
        let waiting = tokio::spawn({
            let bridge = Arc::clone(&bridge);
            async move { bridge.issue_return("drone-1".into()).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancelled.abort();
        assert!(cancelled.await.unwrap_err().is_cancelled());

        bridge.signal_completion();

        let result = tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .expect("remaining waiter should be released");
        assert!(result.unwrap().is_ok());
        assert_eq!(bridge.pending_completions(), 0);
    }
}
