use super::StateMachine;

/// Counts completion signals that no waiter has consumed yet.
///
/// Signals carry no payload, so a counter is enough to keep queue semantics: every signal is
/// consumed by exactly one poll.
#[derive(Debug, Default)]
pub struct CompletionMachine {
    pending: usize,
}

impl CompletionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending
    }
}

pub enum CompletionInput {
    Signal,
}

pub enum CompletionOutput {
    Completed,
}

impl StateMachine for CompletionMachine {
    type Input = CompletionInput;
    type Output = CompletionOutput;

    fn process_input(&mut self, input: Self::Input) {
        match input {
            CompletionInput::Signal => self.pending = self.pending.saturating_add(1),
        }
    }

    fn poll_output(&mut self) -> Option<Self::Output> {
        let left = self.pending.checked_sub(1)?;
        self.pending = left;
        Some(CompletionOutput::Completed)
    }
}
