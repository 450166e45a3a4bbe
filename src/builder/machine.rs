//! Builder for constructing engines.

use crate::builder::error::BuildError;
use crate::config::EngineConfig;
use crate::core::{Intent, IntentFilter, State};
use crate::effects::{NoEffects, SideEffects};
use crate::engine::{Parts, StateMachineEngine, StateObserver};
use crate::report::{ErrorReporter, TracingReporter};
use std::sync::Arc;

/// Builder for constructing engines with a fluent API.
///
/// # Example
///
/// ```rust
/// use flowstate::builder::EngineBuilder;
/// use flowstate::core::{Intent, State};
///
/// #[derive(Clone, PartialEq, Debug)]
/// enum Status {
///     Idle,
///     Loading,
/// }
/// impl State for Status {}
///
/// #[derive(PartialEq, Debug)]
/// struct StartLoading;
///
/// impl Intent<Status> for StartLoading {
///     fn reduce(&self, _state: &Status) -> Status {
///         Status::Loading
///     }
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let engine = EngineBuilder::<Status, StartLoading>::new()
///     .name("status")
///     .initial(Status::Idle)
///     .build()
///     .unwrap();
///
/// let mut states = engine.state();
/// engine.process(StartLoading);
/// assert_eq!(states.recv().await, Some(Status::Idle));
/// assert_eq!(states.recv().await, Some(Status::Loading));
/// engine.destroy().await.unwrap();
/// # });
/// ```
pub struct EngineBuilder<S: State, I: Intent<S>> {
    initial: Option<S>,
    config: EngineConfig,
    filter: IntentFilter<I>,
    effects: Arc<dyn SideEffects<S, I>>,
    reporter: Arc<dyn ErrorReporter>,
    on_state_update: Option<StateObserver<S>>,
}

impl<S: State, I: Intent<S> + PartialEq> EngineBuilder<S, I> {
    /// Create a new builder that drops structurally equal consecutive intents.
    pub fn new() -> Self {
        Self::with_intent_filter(IntentFilter::structural())
    }
}

impl<S: State, I: Intent<S>> EngineBuilder<S, I> {
    /// Create a new builder with an explicit distinctness filter.
    /// Intents need not implement `PartialEq` on this path.
    pub fn with_intent_filter(filter: IntentFilter<I>) -> Self {
        Self {
            initial: None,
            config: EngineConfig::default(),
            filter,
            effects: Arc::new(NoEffects),
            reporter: Arc::new(TracingReporter),
            on_state_update: None,
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Name used in the engine's tracing span.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Re-raise reduction failures from `destroy()`.
    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    /// Replace the distinctness filter.
    pub fn intent_filter(mut self, filter: IntentFilter<I>) -> Self {
        self.filter = filter;
        self
    }

    /// Attach the side-effect handler.
    pub fn effects<E>(mut self, effects: E) -> Self
    where
        E: SideEffects<S, I>,
    {
        self.effects = Arc::new(effects);
        self
    }

    /// Sink for reduction failures. Defaults to [`TracingReporter`].
    pub fn reporter<R>(mut self, reporter: R) -> Self
    where
        R: ErrorReporter,
    {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Observe every distinct published state, on the worker.
    pub fn on_state_update<F>(mut self, observer: F) -> Self
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.on_state_update = Some(Box::new(observer));
        self
    }

    /// Build the engine and start its worker.
    /// Returns an error if required fields are missing or no runtime is running.
    pub fn build(self) -> Result<StateMachineEngine<S, I>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        tokio::runtime::Handle::try_current().map_err(|_| BuildError::NoRuntime)?;

        Ok(StateMachineEngine::spawn(Parts {
            config: self.config,
            initial,
            filter: self.filter,
            effects: self.effects,
            reporter: self.reporter,
            on_state_update: self.on_state_update,
        }))
    }
}

impl<S: State, I: Intent<S> + PartialEq> Default for EngineBuilder<S, I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testing::RecordingReporter;

    #[derive(Clone, PartialEq, Debug)]
    enum TestState {
        Initial,
        Processing,
    }

    impl State for TestState {}

    #[derive(PartialEq, Debug)]
    enum TestIntent {
        Start,
        Fail,
    }

    impl Intent<TestState> for TestIntent {
        fn reduce(&self, _state: &TestState) -> TestState {
            match self {
                Self::Start => TestState::Processing,
                Self::Fail => panic!("cannot fail"),
            }
        }
    }

    #[test]
    fn builder_validates_required_fields() {
        let result = EngineBuilder::<TestState, TestIntent>::new().build();

        assert!(matches!(result, Err(BuildError::MissingInitialState)));
    }

    #[test]
    fn builder_requires_runtime() {
        let result = EngineBuilder::<TestState, TestIntent>::new()
            .initial(TestState::Initial)
            .build();

        assert!(matches!(result, Err(BuildError::NoRuntime)));
    }

    #[tokio::test]
    async fn fluent_api_builds_engine() {
        let engine = EngineBuilder::<TestState, TestIntent>::new()
            .name("fluent")
            .strict(false)
            .initial(TestState::Initial)
            .build()
            .unwrap();
        assert_eq!(engine.current_state(), TestState::Initial);

        let mut states = engine.state();
        engine.process(TestIntent::Start);
        assert_eq!(states.recv().await, Some(TestState::Initial));
        assert_eq!(states.recv().await, Some(TestState::Processing));
        engine.destroy().await.unwrap();
    }

    #[tokio::test]
    async fn reporter_receives_failures() {
        let reporter = Arc::new(RecordingReporter::default());
        let engine = EngineBuilder::new()
            .config(EngineConfig {
                name: "reporting".to_string(),
                strict: false,
            })
            .reporter(Arc::clone(&reporter))
            .initial(TestState::Initial)
            .build()
            .unwrap();

        engine.process(TestIntent::Fail);
        engine
            .status_changes()
            .wait_for(|s| *s == crate::engine::EngineStatus::Halted)
            .await
            .unwrap();

        assert_eq!(reporter.messages()[0].0, "engine");
        engine.destroy().await.unwrap();
    }

    #[tokio::test]
    async fn custom_filter_without_partial_eq() {
        #[derive(Debug)]
        struct Touch;

        impl Intent<TestState> for Touch {
            fn reduce(&self, _state: &TestState) -> TestState {
                TestState::Processing
            }
        }

        let engine = EngineBuilder::with_intent_filter(IntentFilter::allow_all())
            .initial(TestState::Initial)
            .build()
            .unwrap();
        let mut states = engine.state();

        engine.process(Touch);

        assert_eq!(states.recv().await, Some(TestState::Initial));
        assert_eq!(states.recv().await, Some(TestState::Processing));
        engine.destroy().await.unwrap();
    }
}
