//! Queued acquirers for the bounded pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use tokio::sync::oneshot::{Receiver, Sender};

use super::{BoundedPool, Error, Pool, Pooled};

static ID_COUNTER: Lazy<Arc<AtomicU64>> = Lazy::new(|| Arc::new(AtomicU64::new(0)));
pub(super) fn next_waiter_id() -> u64 {
    ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Entry in the pending-acquire queue. Holds the caller's key and the
/// promise to complete once admission is granted.
pub(super) struct Waiter<C, K> {
    pub(super) id: u64,
    pub(super) key: K,
    pub(super) tx: Sender<Result<Pooled<C, K>, Error>>,
}

/// Caller side of a queued acquire.
pub(super) struct Waiting<P: Pool> {
    pool: BoundedPool<P>,
    id: u64,
    rx: Option<Receiver<Result<Pooled<P::Conn, P::Key>, Error>>>,
    waiting: bool,
}

impl<P: Pool> Drop for Waiting<P> {
    fn drop(&mut self) {
        if self.waiting {
            self.pool.remove_waiter(self.id);
        }
    }
}

impl<P: Pool> Waiting<P> {
    /// Wrap a queue entry that was already pushed under the admission lock.
    ///
    /// N.B. You must call and await `Waiting::wait`, otherwise you'll leak
    /// waiters.
    pub(super) fn new(
        pool: BoundedPool<P>,
        id: u64,
        rx: Receiver<Result<Pooled<P::Conn, P::Key>, Error>>,
    ) -> Self {
        Self {
            pool,
            id,
            rx: Some(rx),
            waiting: true,
        }
    }

    /// Wait for admission.
    pub(super) async fn wait(&mut self) -> Result<Pooled<P::Conn, P::Key>, Error> {
        let rx = self.rx.take().expect("waiter rx taken");

        // Can be cancelled. Drop will remove the waiter from the queue.
        let result = rx.await;

        // Disarm the guard. We can't be cancelled beyond this point.
        self.waiting = false;

        match result {
            Ok(result) => result,
            // Sender dropped without completing: the slot hand-off could
            // not be driven. The waiter observes cancellation.
            Err(_) => Err(Error::Canceled),
        }
    }
}
