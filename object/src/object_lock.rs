// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 SUSE LLC

//! Scoped acquisition of an object's mutex.
//!
//! [`ObjectLock`] is the only way to acquire the mutex embedded in an
//! [`ObjectCore`]. Funneling every acquisition through it keeps the owner
//! bookkeeping of debug builds accurate. The lock is released when the guard
//! goes out of scope, including on early returns through `?` and on
//! unwinding.

use crate::object::{ObjectBase, ObjectCore};
use crate::utils_sync::sync_types::StdCheckedRawMutex;
use core::{fmt, marker, ops};

/// Locking guard for an object's mutex.
///
/// Dereferences to the object's lock protected state. Guards obtained through
/// [`ObjectCore::lock()`], i.e. from a base handle, protect the object as a
/// whole but provide no access to concrete state.
///
/// In debug builds a thread may nest guards for the same object. In
/// production builds doing so deadlocks.
#[must_use = "the object is unlocked again when the guard is dropped"]
pub struct ObjectLock<'a, S = ()> {
    mutex: &'a StdCheckedRawMutex,
    state: &'a S,
    // The guard must be released by the thread which acquired it and the
    // state must not be shared with other threads.
    _not_send: marker::PhantomData<*const ()>,
}

impl<'a, S> ObjectLock<'a, S> {
    /// Lock `base`, blocking until the mutex is available.
    pub fn new(base: &'a ObjectBase<S>) -> Self {
        let mutex = base.core().mutex();
        mutex.lock();
        Self::from_locked(mutex, base.state())
    }

    /// Try to lock `base` without blocking.
    ///
    /// Returns `None` if the mutex is held by another thread.
    pub fn try_new(base: &'a ObjectBase<S>) -> Option<Self> {
        let mutex = base.core().mutex();
        mutex.try_lock().then(|| Self::from_locked(mutex, base.state()))
    }

    fn from_locked(mutex: &'a StdCheckedRawMutex, state: &'a S) -> Self {
        Self {
            mutex,
            state,
            _not_send: marker::PhantomData,
        }
    }

    /// Release the lock before the end of the scope.
    pub fn unlock(self) {
        drop(self)
    }
}

impl<'a, S> ops::Deref for ObjectLock<'a, S> {
    type Target = S;

    fn deref(&self) -> &Self::Target {
        self.state
    }
}

impl<'a, S> Drop for ObjectLock<'a, S> {
    fn drop(&mut self) {
        // The mutex had been acquired by this thread when constructing the guard.
        unsafe { self.mutex.unlock() };
    }
}

impl<'a, S> fmt::Debug for ObjectLock<'a, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectLock").finish_non_exhaustive()
    }
}

impl ObjectCore {
    /// Lock the object without access to its concrete state.
    pub fn lock(&self) -> ObjectLock<'_> {
        let mutex = self.mutex();
        mutex.lock();
        ObjectLock::from_locked(mutex, &())
    }

    /// Try to lock the object without blocking.
    pub fn try_lock(&self) -> Option<ObjectLock<'_>> {
        let mutex = self.mutex();
        mutex.try_lock().then(|| ObjectLock::from_locked(mutex, &()))
    }
}

#[cfg(test)]
use crate::object::{ManagedObject as _, ObjectHandle, create};
#[cfg(test)]
use crate::test::{Probe, init_logging};
#[cfg(test)]
use std::{sync, thread, time};

#[test]
fn object_lock_released_on_all_paths() {
    fn bump(probe: &Probe, fail: bool) -> Result<u32, ()> {
        let state = ObjectLock::new(&probe.base);
        if fail {
            return Err(());
        }
        state.hits.set(state.hits.get() + 1);
        Ok(state.hits.get())
    }

    let probe = create(Probe::default());
    assert_eq!(bump(&probe, false), Ok(1));
    assert!(!probe.object_core().is_locked());
    assert_eq!(bump(&probe, true), Err(()));
    assert!(!probe.object_core().is_locked());

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _state = ObjectLock::new(&probe.base);
        panic!("bail out");
    }));
    assert!(result.is_err());
    assert!(!probe.object_core().is_locked());
}

#[test]
fn object_lock_through_base_handle() {
    let probe = create(Probe::default());
    let base: ObjectHandle = probe.clone();
    let guard = base.object_core().lock();
    assert!(probe.object_core().is_locked());
    thread::scope(|s| {
        s.spawn(|| assert!(ObjectLock::try_new(&probe.base).is_none()));
    });
    guard.unlock();
    assert!(!probe.object_core().is_locked());
    let state = ObjectLock::try_new(&probe.base).unwrap();
    assert_eq!(state.hits.get(), 0);
}

#[test]
fn object_lock_distinct_objects_independent() {
    let first = create(Probe::default());
    let second = create(Probe::default());
    // Both threads hold their lock when meeting at the barrier.
    let barrier = sync::Barrier::new(2);
    thread::scope(|s| {
        for probe in [&first, &second] {
            let barrier = &barrier;
            s.spawn(move || {
                let state = ObjectLock::new(&probe.base);
                barrier.wait();
                state.hits.set(1);
            });
        }
    });
    assert_eq!(first.get_field(0), second.get_field(0));
}

#[test]
fn object_lock_same_object_serialized() {
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    enum Event {
        Enter(usize),
        Exit(usize),
    }

    init_logging();
    let probe = create(Probe::default());
    let events = parking_lot::Mutex::new(Vec::new());
    thread::scope(|s| {
        for id in 0..4 {
            let probe = &probe;
            let events = &events;
            s.spawn(move || {
                let state = ObjectLock::new(&probe.base);
                events.lock().push(Event::Enter(id));
                state.hits.set(state.hits.get() + 1);
                thread::sleep(time::Duration::from_millis(5));
                events.lock().push(Event::Exit(id));
            });
        }
    });

    let events = events.into_inner();
    assert_eq!(events.len(), 8);
    for pair in events.chunks(2) {
        let Event::Enter(id) = pair[0] else {
            panic!("protected sections interleaved: {events:?}");
        };
        assert_eq!(pair[1], Event::Exit(id), "protected sections interleaved: {events:?}");
    }
    assert_eq!(ObjectLock::new(&probe.base).hits.get(), 4);
}

#[cfg(any(debug_assertions, feature = "debug-checks"))]
#[test]
fn object_lock_ownership_query() {
    let probe = create(Probe::default());
    assert!(!probe.owns_lock());
    let state = ObjectLock::new(&probe.base);
    assert!(probe.owns_lock());
    thread::scope(|s| {
        s.spawn(|| assert!(!probe.owns_lock()));
    });
    drop(state);
    assert!(!probe.owns_lock());

    thread::scope(|s| {
        s.spawn(|| {
            let _state = ObjectLock::new(&probe.base);
            assert!(probe.owns_lock());
        });
    });
    assert!(!probe.owns_lock());
}

#[cfg(any(debug_assertions, feature = "debug-checks"))]
#[test]
fn object_lock_reentrant() {
    let probe = create(Probe::default());
    let outer = ObjectLock::new(&probe.base);
    {
        let inner = ObjectLock::new(&probe.base);
        inner.hits.set(inner.hits.get() + 1);
        let base = probe.object_core().lock();
        drop(base);
    }
    assert!(probe.owns_lock());
    outer.hits.set(outer.hits.get() + 1);
    drop(outer);
    assert!(!probe.owns_lock());
    assert!(!probe.object_core().is_locked());
    assert_eq!(probe.get_field(0).unwrap(), crate::Value::Number(2.0));
}

#[cfg(not(any(debug_assertions, feature = "debug-checks")))]
#[test]
fn object_lock_not_reentrant() {
    let probe = create(Probe::default());
    let state = ObjectLock::new(&probe.base);
    assert!(ObjectLock::try_new(&probe.base).is_none());
    assert!(probe.object_core().try_lock().is_none());
    drop(state);
    let state = ObjectLock::try_new(&probe.base).unwrap();
    assert_eq!(state.hits.get(), 0);
}
