//! Authenticated request execution with manual credential invalidation.
//!
//! A [`CredentialHolder`] owns the current [`SessionToken`] for one
//! [`TokenSource`]; an [`AuthenticatedRequestExecutor`] borrows it to run
//! requests. Invalidation is a state change on the holder, visible to every
//! executor sharing it.

mod executor;
mod token;

pub use executor::{AuthenticatedRequestExecutor, BlockedIpError};
pub use token::{CredentialHolder, SessionToken, TokenSource};
