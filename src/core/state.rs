//! Core State trait for engine states.
//!
//! A state is an immutable snapshot of everything a feature needs to render.
//! The engine never mutates a state in place: every accepted intent produces
//! a new value which replaces the previous one wholesale.

use std::fmt::Debug;

/// Trait for engine states.
///
/// # Required Traits
///
/// - `Clone`: every subscriber receives its own copy
/// - `PartialEq`: consecutive equal states are suppressed
/// - `Debug`: states show up in logs
/// - `Send + Sync + 'static`: states cross from the worker task to subscribers
///
/// # Example
///
/// ```rust
/// use flowstate::core::State;
///
/// #[derive(Clone, PartialEq, Debug)]
/// struct BalanceState {
///     loading: bool,
///     balance: Option<u64>,
/// }
///
/// impl State for BalanceState {}
///
/// let state = BalanceState { loading: true, balance: None };
/// assert!(state.name().ends_with("BalanceState"));
/// ```
pub trait State: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// Get the state's name for display/logging.
    ///
    /// Default implementation returns the Rust type name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
