//! Core engine types and logic.
//!
//! This module contains the pure functional core of the engine:
//! - State definitions via the `State` trait
//! - Intents, each a validity predicate plus a reducer
//! - The distinctness filter applied to incoming intents
//!
//! All logic in this module is pure (no side effects). Effects live in
//! [`crate::effects`] and are driven by [`crate::engine`].

mod filter;
mod intent;
mod state;

pub use filter::IntentFilter;
pub use intent::Intent;
pub use state::State;
