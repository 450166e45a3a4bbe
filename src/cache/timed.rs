//! Single-flight, TTL-bounded memoization of one asynchronous fetch.

use crate::config::CacheConfig;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

pub(crate) type Fetch<T, E> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

type InFlight<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

/// A successfully fetched value and when it arrived.
#[derive(Clone, Debug)]
pub struct CacheEntry<T> {
    pub value: T,
    pub fetched_at: Instant,
}

impl<T> CacheEntry<T> {
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}

/// The fetch currently running. `stale` fetches were overtaken by
/// `invalidate()`: their waiters get the result but it is never stored.
struct Pending<T, E> {
    ticket: u64,
    fetch: InFlight<T, E>,
    stale: bool,
}

struct Slot<T, E> {
    entry: Option<CacheEntry<T>>,
    in_flight: Option<Pending<T, E>>,
    next_ticket: u64,
}

/// Caches the result of `refresh` for a fixed time-to-live.
///
/// Concurrent callers that find the cache stale share one fetch, and at most
/// one call to `refresh` runs at any time. Failures reach every caller that
/// shared the fetch and are not stored, so the next call fetches again.
///
/// `refresh` is invoked outside the cache's lock, so it may itself read the
/// cache (e.g. `peek()` to build on the previous value).
///
/// # Example
///
/// ```rust
/// use flowstate::cache::TimedCache;
/// use std::time::Duration;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let cache = TimedCache::new(Duration::from_secs(240), || async {
///     Ok::<_, String>(vec!["BTC", "ETH"])
/// });
///
/// assert_eq!(cache.get().await.unwrap(), vec!["BTC", "ETH"]);
/// # });
/// ```
pub struct TimedCache<T, E> {
    ttl: Duration,
    refresh: Fetch<T, E>,
    slot: Mutex<Slot<T, E>>,
}

impl<T, E> TimedCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Cache the result of `refresh` for `ttl`.
    pub fn new<F, Fut>(ttl: Duration, refresh: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::with_fetch(ttl, Arc::new(move || refresh().boxed()))
    }

    /// Same as [`new`](Self::new), with the TTL taken from `config`.
    pub fn from_config<F, Fut>(config: &CacheConfig, refresh: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::new(config.ttl(), refresh)
    }

    pub(crate) fn with_fetch(ttl: Duration, refresh: Fetch<T, E>) -> Self {
        Self {
            ttl,
            refresh,
            slot: Mutex::new(Slot {
                entry: None,
                in_flight: None,
                next_ticket: 0,
            }),
        }
    }

    /// How long a fetched value stays fresh.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached value if still fresh, otherwise the result of a (shared) refresh.
    ///
    /// After [`invalidate`](Self::invalidate) the next refresh starts only
    /// once the fetch it overtook has settled.
    pub async fn get(&self) -> Result<T, E> {
        let (ticket, fetch) = {
            let mut slot = self.slot.lock();
            if let Some(entry) = slot.entry.as_ref().filter(|e| e.is_fresh(self.ttl)) {
                return Ok(entry.value.clone());
            }
            let joined = slot
                .in_flight
                .as_ref()
                .filter(|p| !p.stale)
                .map(|p| (p.ticket, p.fetch.clone()));
            match joined {
                Some(joined) => joined,
                None => {
                    let overtaken = slot.in_flight.as_ref().map(|p| p.fetch.clone());
                    slot.next_ticket += 1;
                    let ticket = slot.next_ticket;
                    let refresh = Arc::clone(&self.refresh);
                    // `refresh` runs on first poll, after the lock is released.
                    let fetch = async move {
                        if let Some(overtaken) = overtaken {
                            let _ = overtaken.await;
                        }
                        refresh().await
                    }
                    .boxed()
                    .shared();
                    slot.in_flight = Some(Pending {
                        ticket,
                        fetch: fetch.clone(),
                        stale: false,
                    });
                    debug!(ticket, "refreshing cached value");
                    (ticket, fetch)
                }
            }
        };

        Self::join(ticket, fetch, &self.slot).await
    }

    async fn join(ticket: u64, fetch: InFlight<T, E>, slot: &Mutex<Slot<T, E>>) -> Result<T, E> {
        let result = fetch.await;

        let mut slot = slot.lock();
        let finished = slot
            .in_flight
            .as_ref()
            .filter(|p| p.ticket == ticket)
            .map(|p| p.stale);
        if let Some(stale) = finished {
            slot.in_flight = None;
            match &result {
                Ok(value) if !stale => {
                    slot.entry = Some(CacheEntry {
                        value: value.clone(),
                        fetched_at: Instant::now(),
                    });
                }
                Ok(_) => debug!(ticket, "cache invalidated during refresh, result not stored"),
                Err(_) => debug!(ticket, "refresh failed, nothing cached"),
            }
        }
        result
    }

    /// Fresh cached value, without fetching.
    pub fn peek(&self) -> Option<T> {
        self.slot
            .lock()
            .entry
            .as_ref()
            .filter(|e| e.is_fresh(self.ttl))
            .map(|e| e.value.clone())
    }

    /// Force the next `get()` to fetch.
    ///
    /// A fetch already running is not cancelled: its current callers still
    /// get its result, but that result is not stored.
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock();
        slot.entry = None;
        if let Some(pending) = slot.in_flight.as_mut() {
            pending.stale = true;
        }
    }
}
