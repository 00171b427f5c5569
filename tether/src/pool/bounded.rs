//! Bounded-admission pool.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::debug;

use super::waiting::{next_waiter_id, Waiter, Waiting};
use super::{Config, Connection, Error, Pool, Pooled};

/// Caps the number of concurrently live connections of an inner pool.
///
/// Acquires past the cap queue in arrival order and are served as budget
/// frees up: when a connection is released, when it closes (locally or
/// remote-initiated), or when a connection attempt fails.
pub struct BoundedPool<P: Pool> {
    inner: Arc<BoundedInner<P>>,
}

pub(super) struct BoundedInner<P: Pool> {
    pool: P,
    max_connections: usize,
    state: Mutex<AdmitState<P::Conn, P::Key>>,
}

/// Admission bookkeeping, one lock for counter and queue so that a freed
/// slot and a queued waiter can never miss each other.
struct AdmitState<C, K> {
    /// Admissions in flight: issued connections plus in-progress connects.
    acquired: usize,
    /// Acquirers waiting for admission, FIFO.
    waiting: VecDeque<Waiter<C, K>>,
    online: bool,
}

/// Where a freed admission goes.
pub(super) trait Gate: Send + Sync {
    fn free_slot(self: Arc<Self>);
}

/// One admission against the budget.
///
/// Freed exactly once, by whichever comes first: the acquire failing, the
/// release completing, or the connection's close future resolving. Holds
/// the pool weakly so idle connections don't keep it alive.
pub(super) struct AdmitSlot {
    released: AtomicBool,
    gate: Weak<dyn Gate>,
}

impl AdmitSlot {
    fn new(gate: Weak<dyn Gate>) -> Arc<Self> {
        Arc::new(Self {
            released: AtomicBool::new(false),
            gate,
        })
    }

    pub(super) fn free(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            if let Some(gate) = self.gate.upgrade() {
                gate.free_slot();
            }
        }
    }
}

/// Frees the slot if the admitted acquire is dropped mid-flight.
struct SlotArm {
    slot: Option<Arc<AdmitSlot>>,
}

impl SlotArm {
    fn new(slot: Arc<AdmitSlot>) -> Self {
        Self { slot: Some(slot) }
    }

    fn disarm(&mut self) {
        self.slot = None;
    }
}

impl Drop for SlotArm {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.free();
        }
    }
}

impl<P: Pool> Clone for BoundedPool<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: Pool> std::fmt::Debug for BoundedPool<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("BoundedPool")
            .field("acquired", &state.acquired)
            .field("waiting", &state.waiting.len())
            .field("max_connections", &self.inner.max_connections)
            .finish()
    }
}

impl<P: Pool> BoundedPool<P> {
    /// Wrap a pool, allowing at most `max_connections` live connections.
    pub fn new(pool: P, max_connections: usize) -> Self {
        assert!(max_connections >= 1, "max_connections must be >= 1");

        Self {
            inner: Arc::new(BoundedInner {
                pool,
                max_connections,
                state: Mutex::new(AdmitState {
                    acquired: 0,
                    waiting: VecDeque::new(),
                    online: true,
                }),
            }),
        }
    }

    /// Wrap a pool with limits from configuration.
    pub fn from_config(pool: P, config: &Config) -> Self {
        Self::new(pool, config.max_connections)
    }

    /// Check a connection out, waiting for admission if the pool is at
    /// capacity. Queued acquirers are served strictly in arrival order.
    ///
    /// Dropping the returned future gives up the spot: an admitted acquire
    /// frees its budget, a queued one leaves the queue.
    pub async fn acquire(&self, key: P::Key) -> Result<Pooled<P::Conn, P::Key>, Error> {
        let queued = {
            let mut state = self.inner.state.lock();
            if !state.online {
                return Err(Error::Offline);
            }

            if state.acquired < self.inner.max_connections && state.waiting.is_empty() {
                state.acquired += 1;
                None
            } else {
                let (tx, rx) = oneshot::channel();
                let id = next_waiter_id();
                state.waiting.push_back(Waiter {
                    id,
                    key: key.clone(),
                    tx,
                });
                Some((id, rx))
            }
        };

        match queued {
            None => self.admitted(key, self.slot()).await,
            Some((id, rx)) => Waiting::new(self.clone(), id, rx).wait().await,
        }
    }

    /// Acquire variant with a caller-supplied completion handle.
    ///
    /// The attempt runs to completion even if the receiver is dropped; a
    /// connection that can no longer be delivered is released back.
    pub fn acquire_into(
        &self,
        key: P::Key,
        promise: oneshot::Sender<Result<Pooled<P::Conn, P::Key>, Error>>,
    ) {
        let pool = self.clone();
        tokio::spawn(async move {
            let result = pool.acquire(key).await;
            if let Err(Ok(conn)) = promise.send(result) {
                let _ = pool.release(conn).await;
            }
        });
    }

    /// Check a connection back in, returning its admission to the budget.
    ///
    /// An inactive connection is not forwarded to the inner pool; its
    /// admission comes back through the close watcher instead.
    pub async fn release(&self, conn: Pooled<P::Conn, P::Key>) -> Result<bool, Error> {
        if !conn.is_active() {
            return Ok(false);
        }

        let slot = conn.take_admission();
        let result = self.inner.pool.release(conn).await;
        if let Some(slot) = slot {
            slot.free();
        }

        result
    }

    /// Release variant with a caller-supplied completion handle.
    pub fn release_into(
        &self,
        conn: Pooled<P::Conn, P::Key>,
        promise: oneshot::Sender<Result<bool, Error>>,
    ) {
        let pool = self.clone();
        tokio::spawn(async move {
            let _ = promise.send(pool.release(conn).await);
        });
    }

    /// Fail all queued acquirers and shut down the inner pool.
    pub async fn shutdown(&self) {
        let waiters = {
            let mut state = self.inner.state.lock();
            state.online = false;
            std::mem::take(&mut state.waiting)
        };

        debug!("bounded pool offline, failing {} waiters", waiters.len());
        for waiter in waiters {
            let _ = waiter.tx.send(Err(Error::Offline));
        }

        self.inner.pool.shutdown().await;
    }

    /// Admissions currently counted against the budget.
    pub fn acquired(&self) -> usize {
        self.inner.state.lock().acquired
    }

    /// Acquirers currently queued for admission.
    pub fn waiting(&self) -> usize {
        self.inner.state.lock().waiting.len()
    }

    /// Configured connection cap.
    #[inline]
    pub fn max_connections(&self) -> usize {
        self.inner.max_connections
    }

    /// Forward an admitted acquire to the inner pool, accounting for every
    /// way the admission can end.
    async fn admitted(
        &self,
        key: P::Key,
        slot: Arc<AdmitSlot>,
    ) -> Result<Pooled<P::Conn, P::Key>, Error> {
        let mut armed = SlotArm::new(slot.clone());
        let result = self.inner.pool.acquire(key).await;
        armed.disarm();

        match result {
            Ok(conn) => {
                conn.set_admission(slot.clone());
                watch_close(&conn, slot);
                Ok(conn)
            }
            Err(err) => {
                slot.free();
                Err(err)
            }
        }
    }

    fn slot(&self) -> Arc<AdmitSlot> {
        let gate: Arc<dyn Gate> = self.inner.clone();
        let gate: Weak<dyn Gate> = Arc::downgrade(&gate);
        AdmitSlot::new(gate)
    }

    /// Hand a freed slot to a dequeued waiter.
    fn forward(&self, waiter: Waiter<P::Conn, P::Key>) {
        let Ok(handle) = Handle::try_current() else {
            // No runtime to drive the hand-off. Undo the slot transfer and
            // let the waiter observe cancellation.
            let mut state = self.inner.state.lock();
            state.acquired = state.acquired.saturating_sub(1);
            return;
        };

        let pool = self.clone();
        handle.spawn(async move {
            let slot = pool.slot();
            let result = pool.admitted(waiter.key, slot).await;
            if let Err(Ok(conn)) = waiter.tx.send(result) {
                let _ = pool.release(conn).await;
            }
        });
    }

    pub(super) fn remove_waiter(&self, id: u64) {
        let mut state = self.inner.state.lock();
        state.waiting.retain(|waiter| waiter.id != id);
    }
}

impl<P: Pool> Gate for BoundedInner<P> {
    fn free_slot(self: Arc<Self>) {
        let waiter = {
            let mut state = self.state.lock();
            match state.waiting.pop_front() {
                // The slot transfers to the waiter; the counter is
                // unchanged.
                Some(waiter) => Some(waiter),
                None => {
                    state.acquired = state.acquired.saturating_sub(1);
                    None
                }
            }
        };

        if let Some(waiter) = waiter {
            BoundedPool { inner: self }.forward(waiter);
        }
    }
}

/// Return the admission once the connection closes, so budget lost to a
/// remote-initiated close is replenished.
fn watch_close<C: Connection, K>(conn: &Pooled<C, K>, slot: Arc<AdmitSlot>) {
    let closed = conn.closed();
    tokio::spawn(async move {
        closed.await;
        slot.free();
    });
}

impl<P: Pool> Pool for BoundedPool<P> {
    type Conn = P::Conn;
    type Key = P::Key;

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
