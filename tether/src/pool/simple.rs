//! Connection pool.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use once_cell::sync::Lazy;
use tokio::sync::oneshot;
use tracing::debug;

use super::inner::IdleStacks;
use super::{
    ActiveHealthCheck, Config, Connection, Connector, Error, HealthCheck, Hooks, Pool, PoolKey,
    Pooled,
};

static ID_COUNTER: Lazy<Arc<AtomicU64>> = Lazy::new(|| Arc::new(AtomicU64::new(0)));
fn next_pool_id() -> u64 {
    ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Keyed connection pool.
///
/// Caches idle connections per key and reuses them most-recently-released
/// first. Creates a new connection on a cache miss, with no limit on how
/// many; wrap in a [`BoundedPool`](super::BoundedPool) to cap concurrency.
pub struct SimplePool<T: Connector> {
    inner: Arc<PoolInner<T>>,
}

struct PoolInner<T: Connector> {
    connector: T,
    hooks: Arc<dyn Hooks<T::Conn, T::Key>>,
    health: Arc<dyn HealthCheck<T::Conn, T::Key>>,
    config: Config,
    idle: IdleStacks<T::Conn, T::Key>,
    online: AtomicBool,
    id: u64,
}

impl<T: Connector> Clone for SimplePool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Connector> std::fmt::Debug for SimplePool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimplePool")
            .field("id", &self.inner.id)
            .field("idle", &self.inner.idle.total())
            .finish()
    }
}

impl<T: Connector> SimplePool<T> {
    /// Create new connection pool with the default health check.
    pub fn new(connector: T, hooks: impl Hooks<T::Conn, T::Key> + 'static) -> Self {
        Self::with_health(connector, hooks, ActiveHealthCheck)
    }

    /// Create new connection pool with a custom health check.
    pub fn with_health(
        connector: T,
        hooks: impl Hooks<T::Conn, T::Key> + 'static,
        health: impl HealthCheck<T::Conn, T::Key> + 'static,
    ) -> Self {
        Self::with_config(connector, hooks, health, Config::default())
    }

    /// Create new connection pool with explicit configuration.
    pub fn with_config(
        connector: T,
        hooks: impl Hooks<T::Conn, T::Key> + 'static,
        health: impl HealthCheck<T::Conn, T::Key> + 'static,
        config: Config,
    ) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                connector,
                hooks: Arc::new(hooks),
                health: Arc::new(health),
                config,
                idle: IdleStacks::new(),
                online: AtomicBool::new(true),
                id: next_pool_id(),
            }),
        }
    }

    /// Check a connection out of the pool.
    ///
    /// Reuses the most recently released healthy connection for `key`, or
    /// dials a new one. Unhealthy idle connections are closed and skipped.
    /// Dropping the returned future abandons the attempt, including an
    /// in-flight connect; use [`acquire_into`](Self::acquire_into) for
    /// hand-offs that must survive the caller.
    pub async fn acquire(&self, key: T::Key) -> Result<Pooled<T::Conn, T::Key>, Error> {
        if !self.inner.online.load(Ordering::Acquire) {
            return Err(Error::Offline);
        }

        // Bounded by the number of idle entries at call time: every pass
        // either returns or removes one connection from the stack.
        loop {
            let Some(conn) = self.inner.idle.pop(&key) else {
                return self.connect(&key).await;
            };

            if self.inner.health.check(&conn, &key).await {
                conn.set_key(key.clone());
                if let Err(err) = self.inner.hooks.on_acquired(&conn, &key) {
                    let _ = conn.close().await;
                    return Err(Error::Hook(err));
                }
                return Ok(conn);
            }

            debug!("closing unhealthy connection [{}]", key.remote_address());
            let _ = conn.close().await;
        }
    }

    /// Acquire variant with a caller-supplied completion handle.
    ///
    /// The attempt runs to completion even if the receiver is dropped; a
    /// connection that can no longer be delivered is released back.
    pub fn acquire_into(
        &self,
        key: T::Key,
        promise: oneshot::Sender<Result<Pooled<T::Conn, T::Key>, Error>>,
    ) {
        let pool = self.clone();
        tokio::spawn(async move {
            let result = pool.acquire(key).await;
            if let Err(Ok(conn)) = promise.send(result) {
                let _ = pool.release(conn).await;
            }
        });
    }

    /// Check a connection back into the pool.
    ///
    /// Resolves `true` iff the connection was checked out of this pool and
    /// went back on its idle stack. A handle that was already released, or
    /// that this pool never issued, resolves `false`.
    pub async fn release(&self, conn: Pooled<T::Conn, T::Key>) -> Result<bool, Error> {
        let Some(key) = conn.take_key() else {
            return Ok(false);
        };

        if !self.inner.online.load(Ordering::Acquire) {
            let _ = conn.close().await;
            return Ok(false);
        }

        if self.inner.config.release_health_check && !self.inner.health.check(&conn, &key).await {
            debug!(
                "closing connection that failed release health check [{}]",
                key.remote_address()
            );
            let _ = conn.close().await;
            return Ok(false);
        }

        let hooks = self.inner.hooks.clone();
        self.inner.idle.push_with(key.clone(), conn.clone(), || {
            hooks.on_released(&conn, &key).map_err(Error::Hook)
        })?;

        Ok(true)
    }

    /// Release variant with a caller-supplied completion handle.
    pub fn release_into(
        &self,
        conn: Pooled<T::Conn, T::Key>,
        promise: oneshot::Sender<Result<bool, Error>>,
    ) {
        let pool = self.clone();
        tokio::spawn(async move {
            let _ = promise.send(pool.release(conn).await);
        });
    }

    /// Take the pool offline and close all idle connections.
    ///
    /// Subsequent acquires fail with [`Error::Offline`]; connections still
    /// checked out are closed when released.
    pub async fn shutdown(&self) {
        self.inner.online.store(false, Ordering::Release);
        let idle = self.inner.idle.drain();
        debug!("pool {} offline, closing {} idle connections", self.inner.id, idle.len());
        for conn in idle {
            let _ = conn.close().await;
        }
    }

    /// Dial a new connection for `key`, on the key's executor if pinned.
    async fn connect(&self, key: &T::Key) -> Result<Pooled<T::Conn, T::Key>, Error> {
        let connecting = self.inner.connector.connect(key);

        let conn = match key.executor() {
            Some(executor) => executor
                .handle()
                .spawn(connecting)
                .await
                .map_err(Error::connect)?
                .map_err(Error::Connect)?,
            None => connecting.await.map_err(Error::Connect)?,
        };

        debug!("new connection [{}]", key.remote_address());
        let conn = Pooled::new(conn, key.clone());

        if let Err(err) = self.inner.hooks.on_created(&conn, key) {
            let _ = conn.close().await;
            return Err(Error::Initializer(err));
        }

        Ok(conn)
    }

    /// Number of idle connections for `key`.
    pub fn idle(&self, key: &T::Key) -> usize {
        self.inner.idle.idle(key)
    }

    /// Number of idle connections across all keys.
    pub fn total_idle(&self) -> usize {
        self.inner.idle.total()
    }

    /// Pool unique identifier.
    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }
}

impl<T: Connector> Pool for SimplePool<T> {
    type Conn = T::Conn;
    type Key = T::Key;

    fn acquire(
        &self,
        key: Self::Key,
    ) -> futures::future::BoxFuture<'static, Result<Pooled<Self::Conn, Self::Key>, Error>> {
        let pool = self.clone();
        async move { pool.acquire(key).await }.boxed()
    }

    fn release(
        &self,
        conn: Pooled<Self::Conn, Self::Key>,
    ) -> futures::future::BoxFuture<'static, Result<bool, Error>> {
        let pool = self.clone();
        async move { pool.release(conn).await }.boxed()
    }

    fn shutdown(&self) -> futures::future::BoxFuture<'static, ()> {
        let pool = self.clone();
        async move { pool.shutdown().await }.boxed()
    }
}
