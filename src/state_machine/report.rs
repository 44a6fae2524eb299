use std::collections::VecDeque;
use std::num::NonZeroUsize;

use super::StateMachine;

/// How many unpolled entries a report channel keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportRetention {
    /// Keep everything until the next drain. Grows one entry per tick while no poller is
    /// connected.
    #[default]
    Unbounded,
    /// Keep at most this many entries, overwriting the oldest.
    KeepLatest(NonZeroUsize),
}

/// Accumulates snapshots between polls. A poll drains the whole backlog in publish order.
#[derive(Debug)]
pub struct ReportMachine<T> {
    entries: VecDeque<T>,
    retention: ReportRetention,
    overwritten: u64,
}

impl<T> ReportMachine<T> {
    pub fn new(retention: ReportRetention) -> Self {
        Self {
            entries: VecDeque::new(),
            retention,
            overwritten: 0,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of entries discarded by [`ReportRetention::KeepLatest`].
    pub fn overwritten(&self) -> u64 {
        self.overwritten
    }

    fn publish(&mut self, entry: T) {
        if let ReportRetention::KeepLatest(limit) = self.retention {
            while self.entries.len() >= limit.get() {
                self.entries.pop_front();
                self.overwritten += 1;
            }
        }
        self.entries.push_back(entry);
    }
}

impl<T> Default for ReportMachine<T> {
    fn default() -> Self {
        Self::new(ReportRetention::default())
    }
}

pub enum ReportInput<T> {
    Publish(T),
}

impl<T> StateMachine for ReportMachine<T> {
    type Input = ReportInput<T>;
    type Output = T;

    fn process_input(&mut self, input: Self::Input) {
        match input {
            ReportInput::Publish(entry) => self.publish(entry),
        }
    }

    fn poll_output(&mut self) -> Option<Self::Output> {
        self.entries.pop_front()
    }

    fn drain_output(&mut self) -> Vec<Self::Output> {
        self.entries.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_returns_publish_order() {
        let mut machine = ReportMachine::default();
        for tick in 0..4u32 {
            machine.process_input(ReportInput::Publish(tick));
        }

        assert_eq!(machine.drain_output(), vec![0, 1, 2, 3]);
        assert!(machine.is_empty());
    }

    #[test]
    fn test_drain_empty_is_not_an_error() {
        let mut machine: ReportMachine<u32> = ReportMachine::default();
        assert!(machine.drain_output().is_empty());

        // Channel still works after an empty drain
        machine.process_input(ReportInput::Publish(7));
        assert_eq!(machine.drain_output(), vec![7]);
    }

    #[test]
    fn test_keep_latest_overwrites_oldest() {
        let limit = NonZeroUsize::new(2).unwrap();
        let mut machine = ReportMachine::new(ReportRetention::KeepLatest(limit));
        for tick in 0..5u32 {
            machine.process_input(ReportInput::Publish(tick));
        }

        assert_eq!(machine.overwritten(), 3);
        assert_eq!(machine.drain_output(), vec![3, 4]);
    }

    #[test]
    fn test_interleaved_drains_lose_nothing() {
        let mut machine = ReportMachine::default();
        let mut drained = Vec::new();

        for tick in 0..10u32 {
            machine.process_input(ReportInput::Publish(tick));
            if tick % 3 == 0 {
                drained.extend(machine.drain_output());
            }
        }
        drained.extend(machine.drain_output());

        assert_eq!(drained, (0..10).collect::<Vec<_>>());
    }
}
