//! Time-bounded, single-flight response caching.
//!
//! At most one fetch per cache (per key for [`KeyedTimedCache`]) is in flight
//! at a time; every caller arriving while it runs awaits the same result.

mod keyed;
mod timed;

pub use keyed::KeyedTimedCache;
pub use timed::{CacheEntry, TimedCache};
