//! The state machine engine.
//!
//! One worker task folds intents into states; side effects run on tracked
//! tasks next to it; states fan out to subscribers through a deduplicating
//! broadcast.

mod broadcast;
mod error;
mod machine;

pub use broadcast::StateStream;
pub use error::EngineError;
pub use machine::{EngineStatus, StateMachineEngine};

pub(crate) use machine::{Parts, StateObserver};
