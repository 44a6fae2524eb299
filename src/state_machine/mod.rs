pub mod command;
pub mod completion;
pub mod report;

/// The [`StateMachine`] trait provides calling semantics for the pure queue machines that back
/// every bridge channel.
///
/// # Functionality
/// Each machine operates on a defined input and output type. Producers push data in through
/// [`process_input`](StateMachine::process_input) and consumers pull it out one item at a time
/// through [`poll_output`](StateMachine::poll_output).
///
/// Keeping the queue logic in a pure machine lets the [`Bridge`](crate::bridge::Bridge) stay
/// focused on synchronization: it wraps each machine in its own lock and never needs to know how
/// the machine orders or retains data.
///
/// # Invariants
/// Implementors *must* uphold all of the following.
///
/// ## No Interior Mutability
/// All state is mutated only through `&mut self`. No [`std::cell`] containers, no [`std::sync`]
/// primitives, no reference counted pointers. Synchronization is the container's job.
///
/// ## No IO, Time or Randomness
/// A machine never touches [`std::io`], [`std::net`], the system clock or system entropy. Anything
/// time dependent is provided through input.
///
/// ## No Blocking
/// Every call completes in bounded time. This is what lets the stepping side call into a locked
/// machine once per tick without risking a stalled control loop.
///
/// # Side Effects
/// Logging is allowed as long as the machine's behavior does not depend on it.
///
/// # Example
/// ```ignore
/// pub struct Counter {
///     pending: u32,
/// }
///
/// impl StateMachine for Counter {
///     type Input = ();
///     type Output = ();
///
///     fn process_input(&mut self, _: Self::Input) {
///         self.pending += 1;
///     }
///
///     fn poll_output(&mut self) -> Option<Self::Output> {
///         self.pending.checked_sub(1).map(|left| self.pending = left)
///     }
/// }
/// ```
pub trait StateMachine {
    /// The type of input that is [processed](StateMachine::process_input) by the state machine.
    type Input;
    /// The type of output that is [polled](StateMachine::poll_output) from the state machine.
    type Output;

    /// Process the provided `input` into the state machine.
    fn process_input(&mut self, input: Self::Input);

    /// Poll the state machine for output, returning the first available output if present.
    fn poll_output(&mut self) -> Option<Self::Output>;

    /// Poll until the machine reports no more output, returning everything in poll order.
    fn drain_output(&mut self) -> Vec<Self::Output> {
        std::iter::from_fn(|| self.poll_output()).collect()
    }
}
