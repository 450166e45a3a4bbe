//! Cancellable, bounded polling.

mod poller;
mod result;

pub use poller::CancellablePoller;
pub use result::PollResult;
