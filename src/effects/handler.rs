//! Side-effect handlers attached to an engine.

use crate::core::{Intent, State};
use crate::effects::context::EffectContext;
use futures::future::BoxFuture;
use std::marker::PhantomData;

/// A spawned side effect. Runs on its own task, never on the engine worker.
pub type EffectFuture = BoxFuture<'static, ()>;

/// Decides which side effect, if any, accompanies an accepted intent.
///
/// `perform` is called on the worker right before the intent is reduced, with
/// the state the intent was validated against. It must return quickly: the
/// actual work belongs in the returned future, which the engine spawns and
/// tracks without awaiting it. Results travel back through
/// [`EffectContext::dispatch`].
pub trait SideEffects<S: State, I: Intent<S>>: Send + Sync + 'static {
    fn perform(&self, previous: &S, intent: &I, ctx: EffectContext<I>) -> Option<EffectFuture>;
}

/// Handler for engines whose intents are all pure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEffects;

impl<S: State, I: Intent<S>> SideEffects<S, I> for NoEffects {
    fn perform(&self, _previous: &S, _intent: &I, _ctx: EffectContext<I>) -> Option<EffectFuture> {
        None
    }
}

/// Handler backed by a closure. Built with [`from_fn`].
pub struct EffectFn<S, I, F> {
    f: F,
    _phantom: PhantomData<fn(&S, &I)>,
}

/// Wrap a closure as a [`SideEffects`] handler.
///
/// # Example
///
/// ```rust
/// use flowstate::core::{Intent, State};
/// use flowstate::effects::{from_fn, EffectContext};
/// use futures::FutureExt;
///
/// #[derive(Clone, PartialEq, Debug)]
/// struct Prices(Option<u64>);
/// impl State for Prices {}
///
/// #[derive(PartialEq, Debug)]
/// enum PricesIntent {
///     Load,
///     Loaded(u64),
/// }
///
/// impl Intent<Prices> for PricesIntent {
///     fn reduce(&self, state: &Prices) -> Prices {
///         match self {
///             Self::Load => state.clone(),
///             Self::Loaded(price) => Prices(Some(*price)),
///         }
///     }
/// }
///
/// let effects = from_fn(|_s: &Prices, intent: &PricesIntent, ctx: EffectContext<PricesIntent>| {
///     match intent {
///         PricesIntent::Load => Some(
///             async move {
///                 ctx.dispatch(PricesIntent::Loaded(100));
///             }
///             .boxed(),
///         ),
///         PricesIntent::Loaded(_) => None,
///     }
/// });
/// # let _ = effects;
/// ```
pub fn from_fn<S, I, F>(f: F) -> EffectFn<S, I, F>
where
    S: State,
    I: Intent<S>,
    F: Fn(&S, &I, EffectContext<I>) -> Option<EffectFuture> + Send + Sync + 'static,
{
    EffectFn {
        f,
        _phantom: PhantomData,
    }
}

impl<S, I, F> SideEffects<S, I> for EffectFn<S, I, F>
where
    S: State,
    I: Intent<S>,
    F: Fn(&S, &I, EffectContext<I>) -> Option<EffectFuture> + Send + Sync + 'static,
{
    fn perform(&self, previous: &S, intent: &I, ctx: EffectContext<I>) -> Option<EffectFuture> {
        (self.f)(previous, intent, ctx)
    }
}
