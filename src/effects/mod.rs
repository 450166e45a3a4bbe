//! Side effects around the pure core.
//!
//! This module provides the "imperative shell": for each accepted intent the
//! engine asks a [`SideEffects`] handler for an optional future, spawns it
//! off the worker, and hands it an [`EffectContext`] carrying
//!
//! - an [`IntentSender`] so the effect's outcome comes back as a new intent
//! - a cancellation token that fires when the engine is destroyed
//!
//! Side effects typically compose the resilience primitives in
//! [`crate::auth`], [`crate::cache`] and [`crate::poll`].

mod context;
mod handler;

pub use context::{EffectContext, IntentSender};
pub use handler::{from_fn, EffectFn, EffectFuture, NoEffects, SideEffects};
