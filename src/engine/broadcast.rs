//! Last-value broadcast of engine states.
//!
//! Subscribers each own an unbounded channel, so delivery never runs on the
//! worker and a slow subscriber never drops intermediate states. Consecutive
//! equal states are suppressed here, at the single publishing point.

use crate::core::State;
use futures::Stream;
use parking_lot::Mutex;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

pub(crate) struct StateBroadcast<S> {
    inner: Mutex<Inner<S>>,
}

struct Inner<S> {
    last: S,
    subscribers: Vec<mpsc::UnboundedSender<S>>,
    closed: bool,
}

impl<S: State> StateBroadcast<S> {
    pub(crate) fn new(initial: S) -> Self {
        Self {
            inner: Mutex::new(Inner {
                last: initial,
                subscribers: Vec::new(),
                closed: false,
            }),
        }
    }

    /// New subscriber, primed with the current state. Ends immediately once closed.
    pub(crate) fn subscribe(&self) -> StateStream<S> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        if !inner.closed && tx.send(inner.last.clone()).is_ok() {
            inner.subscribers.push(tx);
        }
        StateStream { rx }
    }

    /// Publish `next` unless it equals the last published state.
    /// Returns whether anything was emitted.
    pub(crate) fn publish(&self, next: &S) -> bool {
        let mut inner = self.inner.lock();
        if inner.closed || inner.last == *next {
            return false;
        }
        inner.last = next.clone();
        inner.subscribers.retain(|tx| tx.send(next.clone()).is_ok());
        true
    }

    pub(crate) fn current(&self) -> S {
        self.inner.lock().last.clone()
    }

    /// Stop delivery. Dropping the senders ends every stream.
    pub(crate) fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.subscribers.clear();
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

/// Live, deduplicated stream of states.
///
/// Yields the state current at subscription time first, then every later
/// distinct state, and ends when the engine is destroyed.
#[derive(Debug)]
pub struct StateStream<S> {
    rx: mpsc::UnboundedReceiver<S>,
}

impl<S> StateStream<S> {
    /// Wait for the next state. `None` once the engine is gone.
    pub async fn recv(&mut self) -> Option<S> {
        self.rx.recv().await
    }

    /// Next state if one is already queued.
    pub fn try_recv(&mut self) -> Option<S> {
        self.rx.try_recv().ok()
    }
}

impl<S> Stream for StateStream<S> {
    type Item = S;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S>> {
        self.rx.poll_recv(cx)
    }
}
