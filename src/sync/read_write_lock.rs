//! Submodule providing the reader-writer lock.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A reader-writer lock guarding a structure stored elsewhere.
///
/// The lock carries no data of its own: it serializes access to the
/// row map of a [`SharedSparseRowMatrix`](crate::tensor::SharedSparseRowMatrix),
/// whose row values are deliberately left outside the protocol
/// (Hogwild-style training tolerates value races).
#[derive(Debug, Default)]
pub struct ReadWriteLock {
    inner: RwLock<()>,
}

impl ReadWriteLock {
    /// Creates an unlocked lock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires shared access.
    pub fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.inner.read()
    }

    /// Acquires exclusive access.
    pub fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.inner.write()
    }

    /// Tries to acquire shared access without blocking.
    pub fn try_read(&self) -> Option<RwLockReadGuard<'_, ()>> {
        self.inner.try_read()
    }

    /// Tries to acquire exclusive access without blocking.
    pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, ()>> {
        self.inner.try_write()
    }
}
