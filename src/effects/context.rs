//! Context handed to every spawned side effect.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Cloneable handle that feeds intents back into an engine.
///
/// Sending never blocks. Once the engine has been destroyed sends are
/// rejected and `send` returns `false`.
#[derive(Debug)]
pub struct IntentSender<I> {
    tx: mpsc::UnboundedSender<I>,
}

impl<I> IntentSender<I> {
    pub(crate) fn new(tx: mpsc::UnboundedSender<I>) -> Self {
        Self { tx }
    }

    /// Submit an intent. Returns `false` if the engine no longer accepts intents.
    pub fn send(&self, intent: I) -> bool {
        self.tx.send(intent).is_ok()
    }

    /// Whether the engine behind this handle has stopped receiving.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<I> Clone for IntentSender<I> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

/// Everything a side effect may touch: a way back into the engine and the
/// cancellation signal that fires on `destroy()`.
#[derive(Debug)]
pub struct EffectContext<I> {
    intents: IntentSender<I>,
    token: CancellationToken,
}

impl<I> EffectContext<I> {
    pub(crate) fn new(intents: IntentSender<I>, token: CancellationToken) -> Self {
        Self { intents, token }
    }

    /// Report the effect's outcome as a new intent.
    pub fn dispatch(&self, intent: I) -> bool {
        self.intents.send(intent)
    }

    /// Handle for dispatching from nested tasks.
    pub fn intents(&self) -> IntentSender<I> {
        self.intents.clone()
    }

    /// Cancellation token of this effect. A child of the engine's token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the engine is torn down.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

impl<I> Clone for EffectContext<I> {
    fn clone(&self) -> Self {
        Self {
            intents: self.intents.clone(),
            token: self.token.clone(),
        }
    }
}
