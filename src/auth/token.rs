//! Session tokens and the holder that owns the current one.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Opaque bearer credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at: Some(expires_at),
        }
    }

    pub fn secret(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Value for an `Authorization` header.
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// External source of session tokens, e.g. a login endpoint.
pub trait TokenSource: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch_token(&self) -> BoxFuture<'_, Result<SessionToken, Self::Error>>;
}

struct Cached {
    token: Option<SessionToken>,
    epoch: u64,
}

/// Owns the current credential for one token source.
///
/// The token is fetched on first use and reused until it is invalidated or
/// expires. Concurrent callers that find no usable token share one fetch.
pub struct CredentialHolder<Src: TokenSource> {
    source: Src,
    cached: Mutex<Cached>,
    refresh: tokio::sync::Mutex<()>,
}

impl<Src: TokenSource> CredentialHolder<Src> {
    pub fn new(source: Src) -> Self {
        Self {
            source,
            cached: Mutex::new(Cached {
                token: None,
                epoch: 0,
            }),
            refresh: tokio::sync::Mutex::new(()),
        }
    }

    /// Current usable token, fetching a new one when needed.
    pub async fn current(&self) -> Result<SessionToken, Src::Error> {
        if let Some(token) = self.usable() {
            return Ok(token);
        }

        let _refreshing = self.refresh.lock().await;
        if let Some(token) = self.usable() {
            return Ok(token);
        }

        let epoch = self.cached.lock().epoch;
        debug!("fetching session token");
        let token = self.source.fetch_token().await?;

        let mut cached = self.cached.lock();
        if cached.epoch == epoch {
            cached.token = Some(token.clone());
        }
        Ok(token)
    }

    /// Mark the cached token stale. A fetch already running is not stored.
    pub fn invalidate(&self) {
        let mut cached = self.cached.lock();
        cached.token = None;
        cached.epoch += 1;
        debug!("session token invalidated");
    }

    pub fn has_token(&self) -> bool {
        self.usable().is_some()
    }

    fn usable(&self) -> Option<SessionToken> {
        self.cached
            .lock()
            .token
            .as_ref()
            .filter(|token| !token.is_expired())
            .cloned()
    }
}
