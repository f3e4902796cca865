// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 SUSE LLC

//! Implementation of [`CheckedRawMutex`].

#[cfg(any(debug_assertions, feature = "lock-debug"))]
use core::sync::atomic;
use lock_api::{GetThreadId, RawMutex};

/// Raw mutex with optional owner tracking.
///
/// Wraps a production [`RawMutex`] `R`. With `debug_assertions` or the
/// `lock-debug` feature enabled, the owning thread's id (as obtained through
/// `G`) and a recursion depth get recorded alongside:
/// * a repeated [`lock()`](Self::lock) by the owning thread only bumps the
///   depth instead of blocking,
/// * [`owns_lock()`](Self::owns_lock) and [`lock_depth()`](Self::lock_depth)
///   become available,
/// * [`unlock()`](Self::unlock) from a thread other than the owner panics.
///
/// Without instrumentation, `CheckedRawMutex` is a plain forwarder and a second
/// [`lock()`](Self::lock) from the owning thread deadlocks.
pub struct CheckedRawMutex<R: RawMutex, G: GetThreadId> {
    raw: R,
    #[cfg_attr(not(any(debug_assertions, feature = "lock-debug")), allow(dead_code))]
    get_thread_id: G,
    // Id of the owning thread, zero if unlocked. Only ever set to the id of
    // the current thread by the current thread, so Relaxed is sufficient for
    // the "is it me" comparison.
    #[cfg(any(debug_assertions, feature = "lock-debug"))]
    owner: atomic::AtomicUsize,
    // Only accessed by the owning thread.
    #[cfg(any(debug_assertions, feature = "lock-debug"))]
    depth: atomic::AtomicUsize,
}

impl<R: RawMutex, G: GetThreadId> CheckedRawMutex<R, G> {
    /// Whether the owner tracking instrumentation is compiled in.
    pub const INSTRUMENTED: bool = cfg!(any(debug_assertions, feature = "lock-debug"));

    pub const fn new() -> Self {
        Self {
            raw: R::INIT,
            get_thread_id: G::INIT,
            #[cfg(any(debug_assertions, feature = "lock-debug"))]
            owner: atomic::AtomicUsize::new(0),
            #[cfg(any(debug_assertions, feature = "lock-debug"))]
            depth: atomic::AtomicUsize::new(0),
        }
    }

    #[cfg(any(debug_assertions, feature = "lock-debug"))]
    fn current_thread_id(&self) -> usize {
        self.get_thread_id.nonzero_thread_id().get()
    }

    /// Acquire the mutex, blocking the current thread until it is available.
    pub fn lock(&self) {
        #[cfg(any(debug_assertions, feature = "lock-debug"))]
        {
            let id = self.current_thread_id();
            if self.owner.load(atomic::Ordering::Relaxed) == id {
                self.reenter();
                return;
            }
            self.raw.lock();
            self.set_owner(id);
        }

        #[cfg(not(any(debug_assertions, feature = "lock-debug")))]
        self.raw.lock();
    }

    /// Try to acquire the mutex without blocking.
    ///
    /// Returns `true` if the lock has been acquired. With instrumentation
    /// enabled, this always succeeds for the owning thread.
    pub fn try_lock(&self) -> bool {
        #[cfg(any(debug_assertions, feature = "lock-debug"))]
        {
            let id = self.current_thread_id();
            if self.owner.load(atomic::Ordering::Relaxed) == id {
                self.reenter();
                return true;
            }
            if !self.raw.try_lock() {
                return false;
            }
            self.set_owner(id);
        }

        #[cfg(not(any(debug_assertions, feature = "lock-debug")))]
        if !self.raw.try_lock() {
            return false;
        }

        true
    }

    /// Release one level of ownership.
    ///
    /// # Safety
    ///
    /// The mutex must be held by the current thread, as the result of a prior
    /// [`lock()`](Self::lock) or successful [`try_lock()`](Self::try_lock) not
    /// yet matched by an `unlock()`.
    pub unsafe fn unlock(&self) {
        #[cfg(any(debug_assertions, feature = "lock-debug"))]
        {
            let id = self.current_thread_id();
            if self.owner.load(atomic::Ordering::Relaxed) != id {
                log::error!("object mutex released by thread {id}, which does not hold it");
                panic!("object mutex released by a thread not holding it");
            }
            let depth = self.depth.load(atomic::Ordering::Relaxed) - 1;
            self.depth.store(depth, atomic::Ordering::Relaxed);
            if depth != 0 {
                return;
            }
            self.owner.store(0, atomic::Ordering::Relaxed);
        }

        unsafe { self.raw.unlock() };
    }

    /// Whether the mutex is currently held by any thread.
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    /// Whether the mutex is currently held by the calling thread.
    #[cfg(any(debug_assertions, feature = "lock-debug"))]
    pub fn owns_lock(&self) -> bool {
        self.owner.load(atomic::Ordering::Relaxed) == self.current_thread_id()
    }

    /// Number of nested acquisitions held by the calling thread, zero if it
    /// does not own the mutex.
    #[cfg(any(debug_assertions, feature = "lock-debug"))]
    pub fn lock_depth(&self) -> usize {
        if self.owns_lock() {
            self.depth.load(atomic::Ordering::Relaxed)
        } else {
            0
        }
    }

    #[cfg(any(debug_assertions, feature = "lock-debug"))]
    fn reenter(&self) {
        let depth = self.depth.load(atomic::Ordering::Relaxed);
        assert!(depth < usize::MAX, "object mutex recursion depth overflow");
        self.depth.store(depth + 1, atomic::Ordering::Relaxed);
        log::trace!("reentrant object mutex acquisition, depth {}", depth + 1);
    }

    #[cfg(any(debug_assertions, feature = "lock-debug"))]
    fn set_owner(&self, id: usize) {
        self.owner.store(id, atomic::Ordering::Relaxed);
        self.depth.store(1, atomic::Ordering::Relaxed);
    }
}

impl<R: RawMutex, G: GetThreadId> Default for CheckedRawMutex<R, G> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
type TestMutex = CheckedRawMutex<parking_lot::RawMutex, parking_lot::RawThreadId>;

#[cfg(test)]
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn checked_raw_mutex_lock_unlock() {
    let m = TestMutex::new();
    assert!(!m.is_locked());
    m.lock();
    assert!(m.is_locked());
    unsafe { m.unlock() };
    assert!(!m.is_locked());
}

#[test]
fn checked_raw_mutex_contended_try_lock() {
    let m = TestMutex::new();
    m.lock();
    std::thread::scope(|s| {
        s.spawn(|| assert!(!m.try_lock()));
    });
    unsafe { m.unlock() };
    std::thread::scope(|s| {
        s.spawn(|| {
            assert!(m.try_lock());
            unsafe { m.unlock() };
        });
    });
    assert!(!m.is_locked());
}

#[cfg(any(debug_assertions, feature = "lock-debug"))]
#[test]
fn checked_raw_mutex_reentrant() {
    init_logging();
    assert!(TestMutex::INSTRUMENTED);
    let m = TestMutex::new();
    assert!(!m.owns_lock());
    assert_eq!(m.lock_depth(), 0);
    m.lock();
    m.lock();
    assert!(m.try_lock());
    assert_eq!(m.lock_depth(), 3);
    unsafe { m.unlock() };
    unsafe { m.unlock() };
    assert!(m.owns_lock());
    assert!(m.is_locked());
    unsafe { m.unlock() };
    assert!(!m.owns_lock());
    assert!(!m.is_locked());
}

#[cfg(any(debug_assertions, feature = "lock-debug"))]
#[test]
fn checked_raw_mutex_owner_only() {
    let m = TestMutex::new();
    m.lock();
    assert!(m.owns_lock());
    std::thread::scope(|s| {
        s.spawn(|| {
            assert!(!m.owns_lock());
            assert_eq!(m.lock_depth(), 0);
        });
    });
    unsafe { m.unlock() };
}

#[cfg(any(debug_assertions, feature = "lock-debug"))]
#[test]
#[should_panic(expected = "not holding it")]
fn checked_raw_mutex_unlock_unowned() {
    let m = TestMutex::new();
    unsafe { m.unlock() };
}

#[cfg(not(any(debug_assertions, feature = "lock-debug")))]
#[test]
fn checked_raw_mutex_not_reentrant() {
    assert!(!TestMutex::INSTRUMENTED);
    let m = TestMutex::new();
    m.lock();
    // A blocking lock() would deadlock here.
    assert!(!m.try_lock());
    assert!(m.is_locked());
    unsafe { m.unlock() };
    assert!(!m.is_locked());
}
