//! Engine that serializes intents against a single state.

use crate::config::EngineConfig;
use crate::core::{Intent, IntentFilter, State};
use crate::effects::{EffectContext, IntentSender, SideEffects};
use crate::engine::broadcast::{StateBroadcast, StateStream};
use crate::engine::error::EngineError;
use crate::report::ErrorReporter;
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, Instrument};
use uuid::Uuid;

/// Observable health of an engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineStatus {
    /// Accepting and processing intents.
    Running,

    /// A reduction failed; the state stream will not change again.
    Halted,

    /// `destroy()` was called.
    Destroyed,
}

pub(crate) type StateObserver<S> = Box<dyn Fn(&S) + Send + Sync>;

/// Everything the worker needs, moved onto its task.
pub(crate) struct Parts<S: State, I: Intent<S>> {
    pub(crate) config: EngineConfig,
    pub(crate) initial: S,
    pub(crate) filter: IntentFilter<I>,
    pub(crate) effects: Arc<dyn SideEffects<S, I>>,
    pub(crate) reporter: Arc<dyn ErrorReporter>,
    pub(crate) on_state_update: Option<StateObserver<S>>,
}

/// Unidirectional state machine.
///
/// Intents submitted with [`process`](Self::process) are filtered for
/// accidental repeats, then applied one at a time by a single worker task.
/// Accepted intents may start a side effect which runs concurrently and
/// reports back with further intents. States are published through
/// [`state`](Self::state) with consecutive duplicates removed.
///
/// Build one with [`EngineBuilder`](crate::builder::EngineBuilder).
pub struct StateMachineEngine<S: State, I: Intent<S>> {
    id: Uuid,
    intents: IntentSender<I>,
    broadcast: Arc<StateBroadcast<S>>,
    status: watch::Receiver<EngineStatus>,
    status_tx: Arc<watch::Sender<EngineStatus>>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    worker: Mutex<Option<JoinHandle<Result<(), EngineError>>>>,
}

impl<S: State, I: Intent<S>> StateMachineEngine<S, I> {
    /// Spawn the worker. Must be called inside a tokio runtime.
    pub(crate) fn spawn(parts: Parts<S, I>) -> Self {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        let intents = IntentSender::new(tx);
        let broadcast = Arc::new(StateBroadcast::new(parts.initial.clone()));
        let (status_tx, status) = watch::channel(EngineStatus::Running);
        let status_tx = Arc::new(status_tx);
        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();

        let span = tracing::debug_span!("engine", name = %parts.config.name, id = %id);
        let worker = Worker {
            state: parts.initial,
            last_intent: None,
            filter: parts.filter,
            effects: parts.effects,
            reporter: parts.reporter,
            on_state_update: parts.on_state_update,
            strict: parts.config.strict,
            intents: intents.clone(),
            broadcast: Arc::clone(&broadcast),
            status: Arc::clone(&status_tx),
            shutdown: shutdown.clone(),
            tracker: tracker.clone(),
        };
        let handle = tokio::spawn(worker.run(rx).instrument(span));

        Self {
            id,
            intents,
            broadcast,
            status,
            status_tx,
            shutdown,
            tracker,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Unique id of this engine instance, as recorded in its tracing span.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Enqueue an intent. Never blocks; ignored once the engine has stopped.
    pub fn process(&self, intent: I) {
        if !self.intents.send(intent) {
            debug!(engine = %self.id, "engine stopped, intent ignored");
        }
    }

    /// Handle for submitting intents from elsewhere, e.g. long-lived tasks.
    pub fn intent_sender(&self) -> IntentSender<I> {
        self.intents.clone()
    }

    /// Subscribe to the deduplicated state stream.
    pub fn state(&self) -> StateStream<S> {
        self.broadcast.subscribe()
    }

    /// Last published state.
    pub fn current_state(&self) -> S {
        self.broadcast.current()
    }

    /// Current health of the engine.
    pub fn status(&self) -> EngineStatus {
        *self.status.borrow()
    }

    /// Watch health changes; useful to detect a halted engine.
    pub fn status_changes(&self) -> watch::Receiver<EngineStatus> {
        self.status.clone()
    }

    /// Number of side effects still running.
    pub fn active_effects(&self) -> usize {
        self.tracker.len()
    }

    /// Tear the engine down.
    ///
    /// Stops state delivery, cancels every running side effect and waits for
    /// them to finish, then joins the worker. In strict mode a reduction
    /// failure that halted the engine is returned here.
    pub async fn destroy(&self) -> Result<(), EngineError> {
        self.broadcast.close();
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;

        let handle = self.worker.lock().take();
        let result = match handle {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(join_error) => Err(EngineError::WorkerLost(join_error.to_string())),
            },
            None => Ok(()),
        };

        self.status_tx.send_replace(EngineStatus::Destroyed);
        debug!(engine = %self.id, "engine destroyed");
        result
    }
}

impl<S: State, I: Intent<S>> Drop for StateMachineEngine<S, I> {
    fn drop(&mut self) {
        self.broadcast.close();
        self.shutdown.cancel();
    }
}

struct Worker<S: State, I: Intent<S>> {
    state: S,
    last_intent: Option<I>,
    filter: IntentFilter<I>,
    effects: Arc<dyn SideEffects<S, I>>,
    reporter: Arc<dyn ErrorReporter>,
    on_state_update: Option<StateObserver<S>>,
    strict: bool,
    intents: IntentSender<I>,
    broadcast: Arc<StateBroadcast<S>>,
    status: Arc<watch::Sender<EngineStatus>>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl<S: State, I: Intent<S>> Worker<S, I> {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<I>) -> Result<(), EngineError> {
        loop {
            let intent = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Ok(()),
                next = rx.recv() => match next {
                    Some(intent) => intent,
                    None => return Ok(()),
                },
            };

            let duplicate = self
                .last_intent
                .as_ref()
                .is_some_and(|previous| self.filter.is_duplicate(previous, &intent));

            if duplicate {
                debug!(?intent, "dropping repeated intent");
            } else if let Err(err) = self.step(&intent) {
                return self.halt(err);
            }

            self.last_intent = Some(intent);
        }
    }

    fn step(&mut self, intent: &I) -> Result<(), EngineError> {
        debug!(?intent, "processing intent");
        let current = &self.state;

        let valid = catch_unwind(AssertUnwindSafe(|| intent.is_valid_for(current)))
            .map_err(|payload| EngineError::reduce_failure(intent, payload))?;
        if !valid {
            debug!(?intent, state = current.name(), "dropping invalid intent");
            return Ok(());
        }

        let token = self.shutdown.child_token();
        let ctx = EffectContext::new(self.intents.clone(), token.clone());
        let effect = catch_unwind(AssertUnwindSafe(|| self.effects.perform(current, intent, ctx)))
            .map_err(|payload| EngineError::reduce_failure(intent, payload))?;
        if let Some(effect) = effect {
            self.tracker.spawn(
                async move {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => debug!("side effect cancelled"),
                        _ = effect => {}
                    }
                }
                .in_current_span(),
            );
        }

        let next = catch_unwind(AssertUnwindSafe(|| intent.reduce(current)))
            .map_err(|payload| EngineError::reduce_failure(intent, payload))?;

        if self.broadcast.publish(&next) {
            if let Some(observer) = &self.on_state_update {
                observer(&next);
            }
        }
        self.state = next;
        Ok(())
    }

    fn halt(self, err: EngineError) -> Result<(), EngineError> {
        error!(error = %err, strict = self.strict, "engine halted");
        self.reporter.report("engine", &err);
        self.status.send_replace(EngineStatus::Halted);
        if self.strict {
            Err(err)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{from_fn, EffectContext, NoEffects};
    use crate::report::testing::RecordingReporter;
    use crate::report::TracingReporter;
    use futures::FutureExt;
    use std::time::Duration;

    #[derive(Clone, PartialEq, Debug)]
    enum Status {
        Idle,
        Loading,
        Loaded(u32),
    }

    impl State for Status {}

    #[derive(Clone, PartialEq, Debug)]
    enum StatusIntent {
        SetLoading,
        SetLoaded(u32),
        Explode,
    }

    impl Intent<Status> for StatusIntent {
        fn is_valid_for(&self, state: &Status) -> bool {
            match self {
                Self::SetLoading => true,
                Self::SetLoaded(_) => matches!(state, Status::Loading),
                Self::Explode => true,
            }
        }

        fn reduce(&self, _state: &Status) -> Status {
            match self {
                Self::SetLoading => Status::Loading,
                Self::SetLoaded(value) => Status::Loaded(*value),
                Self::Explode => panic!("reducer exploded"),
            }
        }
    }

    fn parts(strict: bool, reporter: Arc<dyn ErrorReporter>) -> Parts<Status, StatusIntent> {
        Parts {
            config: EngineConfig {
                name: "test".to_string(),
                strict,
            },
            initial: Status::Idle,
            filter: IntentFilter::structural(),
            effects: Arc::new(NoEffects),
            reporter,
            on_state_update: None,
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn processes_intents_in_order() {
        let engine = StateMachineEngine::spawn(parts(true, Arc::new(TracingReporter)));
        let mut states = engine.state();

        engine.process(StatusIntent::SetLoading);
        engine.process(StatusIntent::SetLoaded(42));

        assert_eq!(states.recv().await, Some(Status::Idle));
        assert_eq!(states.recv().await, Some(Status::Loading));
        assert_eq!(states.recv().await, Some(Status::Loaded(42)));
        assert!(engine.destroy().await.is_ok());
    }

    #[tokio::test]
    async fn invalid_intent_leaves_state_untouched() {
        let engine = StateMachineEngine::spawn(parts(true, Arc::new(TracingReporter)));

        engine.process(StatusIntent::SetLoaded(1));
        settle().await;

        assert_eq!(engine.current_state(), Status::Idle);
        assert_eq!(engine.status(), EngineStatus::Running);
        engine.destroy().await.unwrap();
    }

    #[tokio::test]
    async fn reduce_panic_in_normal_mode_halts_silently() {
        let reporter = Arc::new(RecordingReporter::default());
        let engine = StateMachineEngine::spawn(parts(false, reporter.clone()));
        let mut status = engine.status_changes();

        engine.process(StatusIntent::Explode);
        status
            .wait_for(|s| *s == EngineStatus::Halted)
            .await
            .unwrap();

        engine.process(StatusIntent::SetLoading);
        settle().await;

        assert_eq!(engine.current_state(), Status::Idle);
        assert_eq!(reporter.messages().len(), 1);
        assert!(reporter.messages()[0].1.contains("reducer exploded"));
        assert!(engine.destroy().await.is_ok());
        assert_eq!(engine.status(), EngineStatus::Destroyed);
    }

    #[tokio::test]
    async fn reduce_panic_in_strict_mode_surfaces_on_destroy() {
        let engine = StateMachineEngine::spawn(parts(true, Arc::new(TracingReporter)));
        let mut status = engine.status_changes();

        engine.process(StatusIntent::Explode);
        status
            .wait_for(|s| *s == EngineStatus::Halted)
            .await
            .unwrap();

        let err = engine.destroy().await.unwrap_err();
        assert!(matches!(err, EngineError::ReduceFailure { ref intent, .. } if intent == "Explode"));
    }

    #[tokio::test]
    async fn repeated_intent_is_dropped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_effect = Arc::clone(&seen);
        let mut parts = parts(true, Arc::new(TracingReporter));
        parts.effects = Arc::new(from_fn(
            move |_s: &Status, intent: &StatusIntent, _ctx: EffectContext<StatusIntent>| {
                seen_by_effect.lock().push(intent.clone());
                None
            },
        ));
        let engine = StateMachineEngine::spawn(parts);

        engine.process(StatusIntent::SetLoading);
        engine.process(StatusIntent::SetLoading);
        engine.process(StatusIntent::SetLoaded(1));
        engine.process(StatusIntent::SetLoading);
        settle().await;

        assert_eq!(
            *seen.lock(),
            vec![
                StatusIntent::SetLoading,
                StatusIntent::SetLoaded(1),
                StatusIntent::SetLoading
            ]
        );
        engine.destroy().await.unwrap();
    }

    #[tokio::test]
    async fn effect_result_comes_back_as_intent() {
        let mut parts = parts(true, Arc::new(TracingReporter));
        parts.effects = Arc::new(from_fn(
            |_s: &Status, intent: &StatusIntent, ctx: EffectContext<StatusIntent>| match intent {
                StatusIntent::SetLoading => Some(
                    async move {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        ctx.dispatch(StatusIntent::SetLoaded(7));
                    }
                    .boxed(),
                ),
                _ => None,
            },
        ));
        let engine = StateMachineEngine::spawn(parts);
        let mut states = engine.state();

        engine.process(StatusIntent::SetLoading);

        assert_eq!(states.recv().await, Some(Status::Idle));
        assert_eq!(states.recv().await, Some(Status::Loading));
        assert_eq!(states.recv().await, Some(Status::Loaded(7)));
        engine.destroy().await.unwrap();
    }

    #[tokio::test]
    async fn observer_sees_each_distinct_state() {
        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);
        let mut parts = parts(true, Arc::new(TracingReporter));
        parts.on_state_update = Some(Box::new(move |s: &Status| sink.lock().push(s.clone())));
        parts.filter = IntentFilter::allow_all();
        let engine = StateMachineEngine::spawn(parts);

        engine.process(StatusIntent::SetLoading);
        engine.process(StatusIntent::SetLoading);
        engine.process(StatusIntent::SetLoaded(3));
        settle().await;

        assert_eq!(*observed.lock(), vec![Status::Loading, Status::Loaded(3)]);
        engine.destroy().await.unwrap();
    }
}
