//! Intents: commands that describe one state transition.

use super::state::State;
use std::fmt::Debug;

/// A command value validated and applied against the current state.
///
/// Both methods must be pure: they may only read the state they are given
/// and must not block. Intents are usually a closed `enum` matched
/// exhaustively in both methods.
///
/// # Example
///
/// ```rust
/// use flowstate::core::{Intent, State};
///
/// #[derive(Clone, PartialEq, Debug)]
/// struct Counter(u32);
///
/// impl State for Counter {}
///
/// #[derive(PartialEq, Debug)]
/// enum CounterIntent {
///     Increment,
///     Reset,
/// }
///
/// impl Intent<Counter> for CounterIntent {
///     fn is_valid_for(&self, state: &Counter) -> bool {
///         match self {
///             Self::Increment => true,
///             Self::Reset => state.0 > 0,
///         }
///     }
///
///     fn reduce(&self, state: &Counter) -> Counter {
///         match self {
///             Self::Increment => Counter(state.0 + 1),
///             Self::Reset => Counter(0),
///         }
///     }
/// }
///
/// assert!(!CounterIntent::Reset.is_valid_for(&Counter(0)));
/// assert_eq!(CounterIntent::Increment.reduce(&Counter(1)), Counter(2));
/// ```
pub trait Intent<S: State>: Debug + Send + 'static {
    /// Whether this intent may be applied to `state`.
    ///
    /// Default implementation accepts every state.
    fn is_valid_for(&self, _state: &S) -> bool {
        true
    }

    /// Compute the next state.
    fn reduce(&self, state: &S) -> S;
}
