//! Flowstate: an asynchronous state-and-resilience core
//!
//! Flowstate keeps the "pure core, imperative shell" split: intents and
//! states are plain values reduced by pure functions, while everything that
//! touches the outside world runs as a side effect next to the engine and
//! reports back with new intents.
//!
//! # Core Concepts
//!
//! - **State**: immutable snapshot, replaced wholesale on every accepted intent
//! - **Intent**: validity predicate plus reducer, usually a closed `enum`
//! - **Engine**: serializes intents on one worker and broadcasts distinct states
//! - **Resilience primitives**: authenticated requests, single-flight timed
//!   caching and cancellable polling, used from side effects
//!
//! # Example
//!
//! ```rust
//! use flowstate::builder::EngineBuilder;
//! use flowstate::core::{Intent, State};
//!
//! #[derive(Clone, PartialEq, Debug)]
//! enum Status {
//!     Idle,
//!     Loading,
//!     Loaded(u32),
//! }
//!
//! impl State for Status {}
//!
//! #[derive(PartialEq, Debug)]
//! enum StatusIntent {
//!     SetLoading,
//!     SetLoaded(u32),
//! }
//!
//! impl Intent<Status> for StatusIntent {
//!     fn is_valid_for(&self, state: &Status) -> bool {
//!         match self {
//!             Self::SetLoading => true,
//!             Self::SetLoaded(_) => *state == Status::Loading,
//!         }
//!     }
//!
//!     fn reduce(&self, _state: &Status) -> Status {
//!         match self {
//!             Self::SetLoading => Status::Loading,
//!             Self::SetLoaded(value) => Status::Loaded(*value),
//!         }
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let engine = EngineBuilder::new().initial(Status::Idle).build().unwrap();
//! let mut states = engine.state();
//!
//! engine.process(StatusIntent::SetLoading);
//! engine.process(StatusIntent::SetLoaded(42));
//!
//! assert_eq!(states.recv().await, Some(Status::Idle));
//! assert_eq!(states.recv().await, Some(Status::Loading));
//! assert_eq!(states.recv().await, Some(Status::Loaded(42)));
//! engine.destroy().await.unwrap();
//! # });
//! ```

pub mod auth;
pub mod builder;
pub mod cache;
pub mod config;
pub mod core;
pub mod effects;
pub mod engine;
pub mod poll;
pub mod report;

// Re-export commonly used types
pub use auth::{AuthenticatedRequestExecutor, CredentialHolder, SessionToken, TokenSource};
pub use builder::{BuildError, EngineBuilder};
pub use cache::{KeyedTimedCache, TimedCache};
pub use config::{CacheConfig, EngineConfig, PollConfig};
pub use core::{Intent, IntentFilter, State};
pub use effects::{EffectContext, SideEffects};
pub use engine::{EngineError, EngineStatus, StateMachineEngine, StateStream};
pub use poll::{CancellablePoller, PollResult};
pub use report::{ErrorReporter, TracingReporter};
