//! Runs requests with the current session token.

use crate::auth::token::{CredentialHolder, SessionToken, TokenSource};
use crate::report::ErrorReporter;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

const BLOCKED_IP_MARKER: &str = "blocked_ip";

/// Reported when a backend refuses the caller's IP address.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Request blocked by IP: {0}")]
pub struct BlockedIpError(pub String);

/// Wraps asynchronous requests with a credential from a [`CredentialHolder`].
///
/// There is no retry policy: when a request fails because the token went
/// stale, the caller invalidates it with
/// [`invalidate_token`](Self::invalidate_token) and retries if it wants to.
///
/// # Example
///
/// ```rust
/// use flowstate::auth::{AuthenticatedRequestExecutor, CredentialHolder, SessionToken, TokenSource};
/// use futures::future::{BoxFuture, FutureExt};
/// use std::sync::Arc;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("login failed")]
/// struct LoginFailed;
///
/// struct StaticSource;
///
/// impl TokenSource for StaticSource {
///     type Error = LoginFailed;
///
///     fn fetch_token(&self) -> BoxFuture<'_, Result<SessionToken, LoginFailed>> {
///         async { Ok(SessionToken::new("abc")) }.boxed()
///     }
/// }
///
/// #[derive(Debug, thiserror::Error)]
/// enum ApiError {
///     #[error(transparent)]
///     Login(#[from] LoginFailed),
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let executor = AuthenticatedRequestExecutor::new(Arc::new(CredentialHolder::new(StaticSource)));
/// let header = executor
///     .authenticate(|token| async move { Ok::<_, ApiError>(token.auth_header()) })
///     .await
///     .unwrap();
/// assert_eq!(header, "Bearer abc");
/// # });
/// ```
pub struct AuthenticatedRequestExecutor<Src: TokenSource> {
    credentials: Arc<CredentialHolder<Src>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl<Src: TokenSource> AuthenticatedRequestExecutor<Src> {
    pub fn new(credentials: Arc<CredentialHolder<Src>>) -> Self {
        Self {
            credentials,
            reporter: None,
        }
    }

    /// Report blocked-IP failures to `reporter`.
    pub fn with_reporter<R: ErrorReporter>(mut self, reporter: R) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    pub fn credentials(&self) -> &Arc<CredentialHolder<Src>> {
        &self.credentials
    }

    /// Run `request` with the current token and return its result unchanged.
    ///
    /// Token acquisition errors are converted with `From`; nothing is retried.
    pub async fn authenticate<F, Fut, T, E>(&self, request: F) -> Result<T, E>
    where
        F: FnOnce(SessionToken) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<Src::Error> + std::error::Error + 'static,
    {
        let result = match self.credentials.current().await {
            Ok(token) => request(token).await,
            Err(err) => Err(E::from(err)),
        };
        if let Err(err) = &result {
            self.inspect(err);
        }
        result
    }

    /// `Authorization` header value for the current token.
    pub async fn auth_header(&self) -> Result<String, Src::Error> {
        match self.credentials.current().await {
            Ok(token) => Ok(token.auth_header()),
            Err(err) => {
                self.inspect(&err);
                Err(err)
            }
        }
    }

    /// Force the next request to fetch a fresh token.
    pub fn invalidate_token(&self) {
        self.credentials.invalidate();
    }

    fn inspect(&self, err: &(dyn std::error::Error + 'static)) {
        let message = err.to_string();
        if !message.to_ascii_lowercase().contains(BLOCKED_IP_MARKER) {
            return;
        }
        warn!(error = %message, "request blocked by IP");
        if let Some(reporter) = &self.reporter {
            reporter.report("auth", &BlockedIpError(message));
        }
    }
}

impl<Src: TokenSource> Clone for AuthenticatedRequestExecutor<Src> {
    fn clone(&self) -> Self {
        Self {
            credentials: Arc::clone(&self.credentials),
            reporter: self.reporter.clone(),
        }
    }
}
