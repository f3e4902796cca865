// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 SUSE LLC

//! Implementation of [`SyncTypes`](super::SyncTypes) for the locking types
//! provided by [`parking_lot`].

use super::CheckedRawMutex;
use core::{convert, marker};

/// [`CheckedRawMutex`] over the [`parking_lot`] raw mutex and thread id
/// provider.
pub type StdCheckedRawMutex = CheckedRawMutex<parking_lot::RawMutex, parking_lot::RawThreadId>;

/// [`RwLock`](super::RwLock) trait implementation built on
/// [`parking_lot::RwLock`].
pub struct StdRwLock<T: marker::Send + marker::Sync> {
    rwlock: parking_lot::RwLock<T>,
}

impl<T: marker::Send + marker::Sync> super::RwLock<T> for StdRwLock<T> {
    type ReadGuard<'a>
        = parking_lot::RwLockReadGuard<'a, T>
    where
        T: 'a;
    type WriteGuard<'a>
        = parking_lot::RwLockWriteGuard<'a, T>
    where
        T: 'a;

    fn read(&self) -> Self::ReadGuard<'_> {
        self.rwlock.read()
    }

    fn write(&self) -> Self::WriteGuard<'_> {
        self.rwlock.write()
    }

    fn get_mut(&mut self) -> &mut T {
        self.rwlock.get_mut()
    }
}

impl<T: marker::Send + marker::Sync> convert::From<T> for StdRwLock<T> {
    fn from(value: T) -> Self {
        Self {
            rwlock: parking_lot::RwLock::new(value),
        }
    }
}

/// [`SyncTypes`](super::SyncTypes) trait implementation based on
/// [`parking_lot`].
pub struct StdSyncTypes {}

impl super::SyncTypes for StdSyncTypes {
    type RwLock<T: marker::Send + marker::Sync> = StdRwLock<T>;
}

#[test]
fn std_rw_lock_concurrent_readers() {
    use super::RwLock as _;

    let lock = StdRwLock::from(7u32);
    let r0 = lock.read();
    std::thread::scope(|s| {
        s.spawn(|| assert_eq!(*lock.read(), 7));
    });
    drop(r0);
    *lock.write() += 1;
    assert_eq!(*lock.read(), 8);
}
