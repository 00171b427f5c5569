//! Pooled connection handle.

use std::ops::Deref;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;

use super::bounded::AdmitSlot;
use crate::BoxError;

/// Capabilities the pool requires of a connection.
///
/// `closed` must resolve once the connection is no longer usable, including
/// when it was closed by the remote; a future taken from an already-closed
/// connection resolves immediately. The pool never closes a connection it
/// still considers healthy.
pub trait Connection: Send + Sync + 'static {
    /// Connection is open and usable.
    fn is_active(&self) -> bool;

    /// Close the connection.
    fn close(&self) -> BoxFuture<'static, Result<(), BoxError>>;

    /// Resolves when the connection is closed, locally or by the remote.
    fn closed(&self) -> BoxFuture<'static, ()>;
}

/// Handle to a pooled connection.
///
/// Cheap to clone; all clones refer to the same connection. Dereferences to
/// the underlying connection for I/O. Return it with the issuing pool's
/// `release`.
pub struct Pooled<C, K> {
    inner: Arc<PooledInner<C, K>>,
}

struct PooledInner<C, K> {
    conn: C,
    /// Key the connection was issued under. Present while checked out,
    /// empty while idle; taking it is how `release` detects double release.
    key: Mutex<Option<K>>,
    /// Admission slot held against a bounded pool's budget.
    admission: Mutex<Option<Arc<AdmitSlot>>>,
}

impl<C, K> Pooled<C, K> {
    pub(super) fn new(conn: C, key: K) -> Self {
        Self {
            inner: Arc::new(PooledInner {
                conn,
                key: Mutex::new(Some(key)),
                admission: Mutex::new(None),
            }),
        }
    }

    /// The two handles refer to the same connection.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub(super) fn take_key(&self) -> Option<K> {
        self.inner.key.lock().take()
    }

    pub(super) fn set_key(&self, key: K) {
        *self.inner.key.lock() = Some(key);
    }

    pub(super) fn set_admission(&self, slot: Arc<AdmitSlot>) {
        *self.inner.admission.lock() = Some(slot);
    }

    pub(super) fn take_admission(&self) -> Option<Arc<AdmitSlot>> {
        self.inner.admission.lock().take()
    }
}

impl<C, K> Clone for Pooled<C, K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C, K> Deref for Pooled<C, K> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.inner.conn
    }
}

impl<C: std::fmt::Debug, K> std::fmt::Debug for Pooled<C, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pooled").field("conn", &self.inner.conn).finish()
    }
}
