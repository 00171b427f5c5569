//! tether manages outbound connections for network clients.
//!
//! Connections are cached per key, reused in LIFO order, and handed out
//! behind an optional concurrency cap with fair queueing. The transport
//! itself is pluggable: anything that can dial a remote and report its own
//! liveness can be pooled.

pub mod pool;

pub use pool::{
    ActiveHealthCheck, Address, BoundedPool, Config, ConnectKey, Connection, Connector, Error,
    Executor, HealthCheck, Hooks, NoopHooks, Pool, PoolKey, Pooled, SimplePool,
};

/// Boxed error type carried by plug-point failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
