//! Pool errors.

use thiserror::Error;

use crate::BoxError;

/// Errors surfaced by pool operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport refused or aborted the connection attempt.
    #[error("connect failed: {0}")]
    Connect(#[source] BoxError),

    /// The `on_created` hook rejected a new connection. The connection
    /// is closed before this error is returned.
    #[error("connection setup failed: {0}")]
    Initializer(#[source] BoxError),

    /// An `on_acquired` or `on_released` hook failed.
    #[error("lifecycle hook failed: {0}")]
    Hook(#[source] BoxError),

    /// The pool is shut down.
    #[error("pool is offline")]
    Offline,

    /// The acquire was abandoned before it could complete.
    #[error("acquire canceled")]
    Canceled,
}

impl Error {
    pub(crate) fn connect(err: impl Into<BoxError>) -> Self {
        Self::Connect(err.into())
    }
}
