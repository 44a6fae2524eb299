use std::collections::VecDeque;

use super::StateMachine;
use crate::command::Command;

/// FIFO of commands waiting for the next control tick.
///
/// Only actionable commands live here. The [`Bridge`](crate::bridge::Bridge) routes the
/// [`Action::Done`](crate::command::Action::Done) marker to the completion channel, so a poll never
/// yields it.
#[derive(Debug)]
pub struct CommandQueueMachine {
    pending_commands: VecDeque<Command>,
}

impl CommandQueueMachine {
    pub fn new() -> Self {
        Self {
            pending_commands: VecDeque::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending_commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending_commands.is_empty()
    }

    fn enqueue(&mut self, cmd: Command) {
        self.pending_commands.push_back(cmd);
    }

    fn dequeue(&mut self) -> Option<Command> {
        self.pending_commands.pop_front()
    }
}

impl Default for CommandQueueMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub enum CommandInput {
    Enqueue(Command),
}

#[derive(Debug)]
pub enum CommandOutput {
    Command(Command),
}

impl StateMachine for CommandQueueMachine {
    type Input = CommandInput;
    type Output = CommandOutput;

    fn process_input(&mut self, input: Self::Input) {
        match input {
            CommandInput::Enqueue(cmd) => self.enqueue(cmd),
        }
    }

    fn poll_output(&mut self) -> Option<Self::Output> {
        self.dequeue().map(CommandOutput::Command)
    }
}
