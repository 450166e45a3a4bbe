//! Bounded, cancellable polling of an asynchronous fetch.

use crate::config::PollConfig;
use crate::poll::result::PollResult;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

type Fetcher<T, E> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;
type Matcher<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Repeats a fetch until `matcher` accepts a value, the retry budget runs
/// out, or [`cancel`](Self::cancel) is called.
///
/// Cancellation is cooperative. It never interrupts a fetch in progress: it
/// is observed when that fetch's value is evaluated, or it cuts short the
/// wait before the next attempt. When a fetched value matches but
/// cancellation was already requested, the session ends with
/// [`PollResult::Cancel`].
///
/// Sessions may overlap; `cancel()` ends every session running at that
/// moment. A `cancel()` issued while no session runs has no effect on the
/// next `start()`.
///
/// # Example
///
/// ```rust
/// use flowstate::poll::{CancellablePoller, PollResult};
/// use std::time::Duration;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let poller = CancellablePoller::new(
///     || async { Ok::<_, String>("ACTIVE") },
///     |state: &&str| *state == "ACTIVE",
/// );
///
/// let result = poller.start(Duration::from_millis(10), 5).await;
/// assert_eq!(result, Ok(PollResult::FinalResult("ACTIVE")));
/// # });
/// ```
pub struct CancellablePoller<T, E> {
    fetcher: Fetcher<T, E>,
    matcher: Matcher<T>,
    sessions: Mutex<Sessions>,
}

/// Token shared by every live session. Replaced when a session starts and
/// none is live, or the current one was already cancelled.
struct Sessions {
    token: CancellationToken,
    live: usize,
}

/// Unregisters a session however `start` ends, including when its future is dropped.
struct SessionGuard<'a> {
    sessions: &'a Mutex<Sessions>,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.sessions.lock().live -= 1;
    }
}

impl<T, E> CancellablePoller<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Poll `fetcher` until `matcher` accepts a value.
    pub fn new<F, Fut, M>(fetcher: F, matcher: M) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        M: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            fetcher: Arc::new(move || fetcher().boxed()),
            matcher: Arc::new(matcher),
            sessions: Mutex::new(Sessions {
                token: CancellationToken::new(),
                live: 0,
            }),
        }
    }

    /// Poll with at most `max_retries` fetches, `interval` apart.
    ///
    /// A budget of zero still performs one fetch, since every result carries
    /// a value. A fetch error ends the session with that error.
    pub async fn start(&self, interval: Duration, max_retries: u32) -> Result<PollResult<T>, E> {
        let token = {
            let mut sessions = self.sessions.lock();
            if sessions.live == 0 || sessions.token.is_cancelled() {
                sessions.token = CancellationToken::new();
            }
            sessions.live += 1;
            sessions.token.clone()
        };
        let _session = SessionGuard {
            sessions: &self.sessions,
        };
        let budget = max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let value = (self.fetcher)().await?;

            if token.is_cancelled() {
                debug!(attempt, "poll cancelled");
                return Ok(PollResult::Cancel(value));
            }
            if (self.matcher)(&value) {
                debug!(attempt, "poll matched");
                return Ok(PollResult::FinalResult(value));
            }
            if attempt >= budget {
                debug!(attempt, "poll retries exhausted");
                return Ok(PollResult::TimeOut(value));
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(attempt, "poll cancelled while waiting");
                    return Ok(PollResult::Cancel(value));
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// [`start`](Self::start) with interval and budget from `config`.
    pub async fn start_with(&self, config: &PollConfig) -> Result<PollResult<T>, E> {
        self.start(config.interval(), config.max_retries).await
    }

    /// Ask every running session to stop.
    pub fn cancel(&self) {
        self.sessions.lock().token.cancel();
    }
}
