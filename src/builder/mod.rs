//! Builder API for ergonomic engine construction.
//!
//! Engines are composed, not subclassed: a feature picks its state and
//! intent types, then plugs a side-effect handler, a reporter and an
//! optional state observer into an [`EngineBuilder`].

pub mod error;
pub mod machine;

pub use error::BuildError;
pub use machine::EngineBuilder;

use crate::core::{Intent, State};
use crate::engine::StateMachineEngine;

/// Start an engine with pure intents and default settings.
///
/// # Example
///
/// ```
/// use flowstate::builder::pure_engine;
/// use flowstate::core::{Intent, State};
///
/// #[derive(Clone, PartialEq, Debug)]
/// struct Total(u64);
/// impl State for Total {}
///
/// #[derive(PartialEq, Debug)]
/// struct Add(u64);
///
/// impl Intent<Total> for Add {
///     fn reduce(&self, state: &Total) -> Total {
///         Total(state.0 + self.0)
///     }
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let engine = pure_engine::<Total, Add>(Total(0)).unwrap();
/// engine.process(Add(2));
/// # engine.destroy().await.unwrap();
/// # });
/// ```
pub fn pure_engine<S, I>(initial: S) -> Result<StateMachineEngine<S, I>, BuildError>
where
    S: State,
    I: Intent<S> + PartialEq,
{
    EngineBuilder::new().initial(initial).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug)]
    struct Total(u64);

    impl State for Total {}

    #[derive(PartialEq, Debug)]
    struct Add(u64);

    impl Intent<Total> for Add {
        fn reduce(&self, state: &Total) -> Total {
            Total(state.0 + self.0)
        }
    }

    #[tokio::test]
    async fn pure_engine_accumulates() {
        let engine = pure_engine::<Total, Add>(Total(0)).unwrap();
        let mut states = engine.state();

        engine.process(Add(2));
        engine.process(Add(3));

        assert_eq!(states.recv().await, Some(Total(0)));
        assert_eq!(states.recv().await, Some(Total(2)));
        assert_eq!(states.recv().await, Some(Total(5)));
        engine.destroy().await.unwrap();
    }
}
