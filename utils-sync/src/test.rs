// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 SUSE LLC

//! Testing [`TestNopSyncTypes`] implementation.

use crate::sync_types;
use core::{cell, convert, marker, ops, sync::atomic};

/// Dummy [`RwLock`](sync_types::RwLock) for testing purposes.
///
/// Never blocks: any attempt to take a write lock while any other guard is
/// alive, or a read lock while a write guard is alive, panics.
pub struct TestNopRwLock<T: marker::Send + marker::Sync> {
    // Number of readers, or -1 if write locked.
    state: atomic::AtomicIsize,
    v: cell::UnsafeCell<T>,
}

// Access to the UnsafeCell is serialized by the state word.
unsafe impl<T: marker::Send + marker::Sync> marker::Send for TestNopRwLock<T> {}
unsafe impl<T: marker::Send + marker::Sync> marker::Sync for TestNopRwLock<T> {}

impl<T: marker::Send + marker::Sync> convert::From<T> for TestNopRwLock<T> {
    fn from(value: T) -> Self {
        Self {
            state: atomic::AtomicIsize::new(0),
            v: cell::UnsafeCell::new(value),
        }
    }
}

impl<T: marker::Send + marker::Sync> sync_types::RwLock<T> for TestNopRwLock<T> {
    type ReadGuard<'a>
        = TestNopRwLockReadGuard<'a, T>
    where
        Self: 'a;
    type WriteGuard<'a>
        = TestNopRwLockWriteGuard<'a, T>
    where
        Self: 'a;

    fn read(&self) -> Self::ReadGuard<'_> {
        let readers = self
            .state
            .fetch_update(atomic::Ordering::Acquire, atomic::Ordering::Relaxed, |readers| {
                (readers >= 0).then_some(readers + 1)
            });
        assert!(readers.is_ok(), "TestNopRwLock read locked while write locked.");
        TestNopRwLockReadGuard { lock: self }
    }

    fn write(&self) -> Self::WriteGuard<'_> {
        assert_eq!(
            self.state
                .compare_exchange(0, -1, atomic::Ordering::Acquire, atomic::Ordering::Relaxed),
            Ok(0),
            "TestNopRwLock write locked while locked."
        );
        TestNopRwLockWriteGuard { lock: self }
    }

    fn get_mut(&mut self) -> &mut T {
        self.v.get_mut()
    }
}

/// The [read lock guard](sync_types::RwLock::ReadGuard) associated with
/// [`TestNopRwLock`].
pub struct TestNopRwLockReadGuard<'a, T: marker::Send + marker::Sync> {
    lock: &'a TestNopRwLock<T>,
}

impl<'a, T: marker::Send + marker::Sync> Drop for TestNopRwLockReadGuard<'a, T> {
    fn drop(&mut self) {
        self.lock.state.fetch_sub(1, atomic::Ordering::Release);
    }
}

impl<'a, T: marker::Send + marker::Sync> ops::Deref for TestNopRwLockReadGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // No writer can exist while this guard is alive.
        unsafe { &*self.lock.v.get() }
    }
}

/// The [write lock guard](sync_types::RwLock::WriteGuard) associated with
/// [`TestNopRwLock`].
pub struct TestNopRwLockWriteGuard<'a, T: marker::Send + marker::Sync> {
    lock: &'a TestNopRwLock<T>,
}

impl<'a, T: marker::Send + marker::Sync> Drop for TestNopRwLockWriteGuard<'a, T> {
    fn drop(&mut self) {
        self.lock.state.store(0, atomic::Ordering::Release);
    }
}

impl<'a, T: marker::Send + marker::Sync> ops::Deref for TestNopRwLockWriteGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &*self.lock.v.get() }
    }
}

impl<'a, T: marker::Send + marker::Sync> ops::DerefMut for TestNopRwLockWriteGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // The write guard is exclusive.
        unsafe { &mut *self.lock.v.get() }
    }
}

/// [`SyncTypes`](sync_types::SyncTypes) implementation for testing purposes.
pub struct TestNopSyncTypes {}

impl sync_types::SyncTypes for TestNopSyncTypes {
    type RwLock<T: marker::Send + marker::Sync> = TestNopRwLock<T>;
}

#[test]
fn test_nop_rw_lock_readers() {
    use sync_types::RwLock as _;

    let lock = TestNopRwLock::from(1u8);
    let r0 = lock.read();
    let r1 = lock.read();
    assert_eq!(*r0 + *r1, 2);
    drop(r0);
    drop(r1);
    *lock.write() = 3;
    assert_eq!(*lock.read(), 3);
}

#[test]
#[should_panic(expected = "write locked while locked")]
fn test_nop_rw_lock_write_while_read() {
    use sync_types::RwLock as _;

    let lock = TestNopRwLock::from(());
    let _r = lock.read();
    let _w = lock.write();
}
