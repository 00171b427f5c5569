//! Pool configuration.

use serde::{Deserialize, Serialize};

/// Pool configuration.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Config {
    /// Maximum connections concurrently live under a [`BoundedPool`].
    ///
    /// [`BoundedPool`]: super::BoundedPool
    pub max_connections: usize,
    /// Health check connections on release as well as on acquire.
    /// Connections failing the release-side check are closed and not
    /// re-pooled.
    pub release_health_check: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_connections: 10,
            release_health_check: false,
        }
    }
}
