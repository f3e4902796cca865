// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 SUSE LLC

//! Identity comparison of weak handles against a raw address.

use core::ptr;
use std::sync;

/// Compares weak handles with a captured object address.
///
/// A weak handle matches only while its target is alive and located at the
/// captured address. Expired handles never match, not even if a new object
/// happens to occupy the same address.
///
/// ```ignore
/// let eq = WeakRefEq::from_ref(&*object);
/// listeners.retain(|listener| !eq.matches(listener));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeakRefEq {
    target: *const (),
}

// The address is only ever compared, never dereferenced.
unsafe impl Send for WeakRefEq {}
unsafe impl Sync for WeakRefEq {}

impl WeakRefEq {
    pub fn new<T: ?Sized>(target: *const T) -> Self {
        Self {
            target: target.cast::<()>(),
        }
    }

    pub fn from_ref<T: ?Sized>(target: &T) -> Self {
        Self::new(target as *const T)
    }

    /// Whether `weak` currently refers to a live object at the captured
    /// address.
    pub fn matches<T: ?Sized>(&self, weak: &sync::Weak<T>) -> bool {
        // Upgrading is atomic with respect to the target's destruction.
        weak.upgrade()
            .is_some_and(|strong| ptr::eq(sync::Arc::as_ptr(&strong).cast::<()>(), self.target))
    }

    /// [`matches()`](Self::matches) as a closure, e.g. for
    /// [`Iterator::position()`].
    pub fn predicate<'a, T: ?Sized>(&'a self) -> impl Fn(&sync::Weak<T>) -> bool + 'a {
        move |weak| self.matches(weak)
    }
}

#[cfg(test)]
use crate::object::{ManagedObject, ObjectHandle, WeakObjectHandle, create};
#[cfg(test)]
use crate::test::{Plain, Probe};

#[test]
fn weak_ref_eq_live_target() {
    let a = create(Plain::default());
    let b = create(Probe::default());
    let eq = WeakRefEq::from_ref(&*a);
    assert!(eq.matches(&sync::Arc::downgrade(&a)));
    assert!(!eq.matches(&sync::Arc::downgrade(&b)));

    let base: ObjectHandle = a.clone();
    assert_eq!(WeakRefEq::new(sync::Arc::as_ptr(&base)), eq);
    let weak: WeakObjectHandle = sync::Arc::downgrade(&base);
    assert!(eq.matches(&weak));
}

#[test]
fn weak_ref_eq_expired_target() {
    let a = create(Plain::default());
    let address = sync::Arc::as_ptr(&a);
    let eq = WeakRefEq::new(address);
    let weak = sync::Arc::downgrade(&a);
    drop(a);
    assert!(!eq.matches(&weak));
    assert!(ptr::eq(weak.as_ptr(), address));
    assert!(!eq.matches(&weak));
}

#[test]
fn weak_ref_eq_search_and_remove() {
    let objects: Vec<ObjectHandle> = vec![
        create(Plain::default()) as ObjectHandle,
        create(Probe::default()) as ObjectHandle,
        create(Plain::default()) as ObjectHandle,
    ];
    let mut weaks: Vec<WeakObjectHandle> = objects.iter().map(sync::Arc::downgrade).collect();

    let eq = WeakRefEq::new(sync::Arc::as_ptr(&objects[1]));
    assert_eq!(weaks.iter().position(eq.predicate::<dyn ManagedObject>()), Some(1));
    weaks.retain(|weak| !eq.matches(weak));
    assert_eq!(weaks.len(), 2);
    assert_eq!(weaks.iter().position(eq.predicate::<dyn ManagedObject>()), None);
    // The search did not extend any lifetime.
    assert!(objects.iter().all(|object| sync::Arc::strong_count(object) == 1));
}
