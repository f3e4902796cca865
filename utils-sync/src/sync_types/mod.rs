// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 SUSE LLC

//! Lock abstraction traits as well as related functionality.
//!
//! # Lock type abstractions
//!
//! Containers shared across the object graph, like the type registry, are
//! made generic over the [`RwLock`] abstraction trait rather than hardwiring a
//! particular lock implementation. For limiting the amount of generic
//! parameters to get specified all over the place, the lock types are grouped
//! together as associated types of the [`SyncTypes`] trait. [`StdSyncTypes`]
//! provides the implementation used in production,
//! [`TestNopSyncTypes`](crate::test::TestNopSyncTypes) one which turns any
//! contention into a panic.
//!
//! # Per-object mutexes
//!
//! Every managed object carries exactly one mutex. The [`CheckedRawMutex`]
//! wraps a production raw mutex with an instrumentation layer: in debug builds
//! (or with the `lock-debug` feature) it records the owning thread and a
//! recursion depth, making the lock reentrant and enabling ownership queries.
//! Otherwise it forwards to the wrapped raw mutex unchanged and a second
//! acquisition by the owning thread deadlocks.

use core::{convert, marker, ops};

mod checked_mutex;
mod std_sync_types;

pub use checked_mutex::CheckedRawMutex;
pub use std_sync_types::{StdCheckedRawMutex, StdRwLock, StdSyncTypes};

/// Execution environment agnostic read-write-lock abstraction.
///
/// A read-write-lock:
/// * A [`ReadGuard`](Self::ReadGuard) provides read-only access to the wrapped
///   value and there can be multiple concurrent ones at a given point in time.
/// * A [`WriteGuard`](Self::WriteGuard) is exclusive with both, itself and any
///   [`ReadGuards`](Self::ReadGuard) and provides write access.
///
/// Users of the `RwLock` must not acquire it recursively from the same thread.
pub trait RwLock<T>: marker::Send + marker::Sync + convert::From<T> {
    /// Read lock guard type returned by [`read()`](Self::read).
    type ReadGuard<'a>: ops::Deref<Target = T>
    where
        Self: 'a;

    /// Write lock guard type returned by [`write()`](Self::write).
    type WriteGuard<'a>: ops::Deref<Target = T> + ops::DerefMut
    where
        Self: 'a;

    /// Lock the `RwLock` non-exclusively for reading.
    fn read(&self) -> Self::ReadGuard<'_>;

    /// Lock the `RwLock` exclusively for writing.
    fn write(&self) -> Self::WriteGuard<'_>;

    /// Access the wrapped value.
    ///
    /// The existence of the `mut` reference on `Self` implies that it cannot
    /// have been locked concurrently and that access is exclusive.
    fn get_mut(&mut self) -> &mut T;
}

/// Collection of lock types for a given execution environment.
pub trait SyncTypes: 'static {
    type RwLock<T: marker::Send + marker::Sync>: RwLock<T>;
}
