//! Engine error types.

use std::any::Any;
use thiserror::Error;

/// Errors raised inside the engine's processing step.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// `is_valid_for`, `reduce` or the side-effect handler panicked.
    #[error("Reduction failed for intent {intent}: {message}")]
    ReduceFailure { intent: String, message: String },

    /// The worker task ended without returning (aborted or panicked outside a reduction).
    #[error("Engine worker stopped unexpectedly: {0}")]
    WorkerLost(String),
}

impl EngineError {
    pub(crate) fn reduce_failure(intent: &dyn std::fmt::Debug, payload: Box<dyn Any + Send>) -> Self {
        EngineError::ReduceFailure {
            intent: format!("{:?}", intent),
            message: panic_message(payload.as_ref()),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_failure_keeps_panic_text() {
        let payload: Box<dyn Any + Send> = Box::new("index out of range");
        let err = EngineError::reduce_failure(&"Select(3)", payload);

        assert_eq!(
            err.to_string(),
            "Reduction failed for intent \"Select(3)\": index out of range"
        );
    }

    #[test]
    fn owned_and_opaque_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("bad state"));
        assert!(matches!(
            EngineError::reduce_failure(&1, owned),
            EngineError::ReduceFailure { message, .. } if message == "bad state"
        ));

        let opaque: Box<dyn Any + Send> = Box::new(42u8);
        assert!(matches!(
            EngineError::reduce_failure(&1, opaque),
            EngineError::ReduceFailure { message, .. } if message == "non-string panic payload"
        ));
    }
}
