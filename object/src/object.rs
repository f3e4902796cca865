// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 SUSE LLC

//! The managed base object.
//!
//! Concrete framework types embed an [`ObjectBase`] and implement
//! [`ManagedObject`] by handing out its [`ObjectCore`]:
//!
//! ```ignore
//! #[derive(Default)]
//! struct Host {
//!     base: ObjectBase<HostState>,
//! }
//!
//! impl ManagedObject for Host {
//!     fn object_core(&self) -> &ObjectCore {
//!         self.base.core()
//!     }
//! }
//!
//! impl ObjectImpl for Host {}
//! impl_object_type!(Host, default_factory);
//!
//! let host = create(Host::default());
//! ```
//!
//! Objects are shared through [`Arc`](sync::Arc) handles obtained from
//! [`create()`]. Each object is destroyed exactly once, when the last of them
//! is dropped. Objects wrapped with a plain [`Arc::new()`](sync::Arc::new)
//! work, except for [`ManagedObject::get_self()`], which requires the self
//! reference only [`create()`] establishes.

use crate::reflection;
use crate::typed_handle::TypedHandle;
use crate::utils_sync::sync_types::StdCheckedRawMutex;
use crate::value::Value;
use core::{any, fmt, marker};
use std::sync;

/// Shared handle to a managed object of unknown concrete type.
pub type ObjectHandle = sync::Arc<dyn ManagedObject>;

/// Weak counterpart of [`ObjectHandle`].
pub type WeakObjectHandle = sync::Weak<dyn ManagedObject>;

/// Error type returned by the [`ManagedObject`] field accessors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FieldError {
    /// The object has no field with the given id.
    InvalidFieldId,
    /// The value is not acceptable for the field.
    InvalidValue,
}

/// Type erasure helpers, implemented for every eligible type.
///
/// Call these through a `&dyn ManagedObject` or an [`ObjectHandle`], not on
/// an `Arc` itself: the blanket implementation covers the `Arc` too.
pub trait AsAny: any::Any + marker::Send + marker::Sync {
    fn as_any(&self) -> &dyn any::Any;

    fn into_any_arc(self: sync::Arc<Self>) -> sync::Arc<dyn any::Any + marker::Send + marker::Sync>;

    /// Name of the concrete Rust type, for diagnostics.
    fn type_name(&self) -> &'static str;
}

impl<T: any::Any + marker::Send + marker::Sync> AsAny for T {
    fn as_any(&self) -> &dyn any::Any {
        self
    }

    fn into_any_arc(self: sync::Arc<Self>) -> sync::Arc<dyn any::Any + marker::Send + marker::Sync> {
        self
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

/// Base trait of every object in the framework.
///
/// Runtime type identification goes through the [`Reflect`](reflection::Reflect)
/// supertrait, which gets implemented by
/// [`impl_object_type!()`](crate::impl_object_type).
pub trait ManagedObject: AsAny + reflection::Reflect {
    /// The [`ObjectCore`] embedded in the object, usually through its
    /// [`ObjectBase`].
    fn object_core(&self) -> &ObjectCore;

    /// Set a field by id.
    ///
    /// The default implementation has no fields.
    fn set_field(&self, _id: usize, _value: Value) -> Result<(), FieldError> {
        Err(FieldError::InvalidFieldId)
    }

    /// Get a field by id.
    ///
    /// The default implementation has no fields.
    fn get_field(&self, _id: usize) -> Result<Value, FieldError> {
        Err(FieldError::InvalidFieldId)
    }

    /// Obtain a new shared handle to `self`.
    ///
    /// The returned handle shares the reference count of the existing ones.
    ///
    /// # Panics
    ///
    /// Panics if `self` is not owned by any shared handle, i.e. if it has not
    /// been placed under shared ownership by [`create()`] or if its
    /// destruction is in progress already.
    fn get_self(&self) -> TypedHandle {
        self.object_core().get_self()
    }

    /// Whether the calling thread holds the object's lock.
    #[cfg(any(debug_assertions, feature = "debug-checks"))]
    fn owns_lock(&self) -> bool {
        self.object_core().owns_lock()
    }
}

/// Type independent part of the per-object bookkeeping.
///
/// Holds the weak self reference established by [`create()`] and the
/// object's mutex. The mutex can only be acquired through an
/// [`ObjectLock`](crate::ObjectLock).
///
/// The self reference only exists for objects placed under shared ownership
/// through [`create()`]. An object wrapped with a plain [`Arc::new()`](sync::Arc::new)
/// is shared, but has no self reference: [`get_self()`](Self::get_self)
/// panics for it and [`is_shared()`](Self::is_shared) reports `false`.
pub struct ObjectCore {
    self_ref: sync::OnceLock<WeakObjectHandle>,
    mutex: StdCheckedRawMutex,
}

impl ObjectCore {
    pub const fn new() -> Self {
        Self {
            self_ref: sync::OnceLock::new(),
            mutex: StdCheckedRawMutex::new(),
        }
    }

    fn attach(&self, this: WeakObjectHandle) {
        if self.self_ref.set(this).is_err() {
            log::error!("object placed under shared ownership twice");
            panic!("object placed under shared ownership twice");
        }
    }

    /// Whether the object is currently owned by at least one shared handle.
    pub fn is_shared(&self) -> bool {
        self.self_ref.get().is_some_and(|this| this.strong_count() != 0)
    }

    /// See [`ManagedObject::get_self()`].
    pub fn get_self(&self) -> TypedHandle {
        match self.self_ref.get().and_then(sync::Weak::upgrade) {
            Some(this) => TypedHandle::new(this),
            None => {
                log::error!("self reference requested for an object not under shared ownership");
                panic!("self reference requested for an object not under shared ownership");
            }
        }
    }

    pub(crate) fn mutex(&self) -> &StdCheckedRawMutex {
        &self.mutex
    }

    /// Whether the object's lock is held by any thread.
    pub fn is_locked(&self) -> bool {
        self.mutex.is_locked()
    }

    /// Whether the calling thread holds the object's lock.
    #[cfg(any(debug_assertions, feature = "debug-checks"))]
    pub fn owns_lock(&self) -> bool {
        self.mutex.owns_lock()
    }
}

impl Default for ObjectCore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectCore")
            .field("shared", &self.is_shared())
            .field("locked", &self.is_locked())
            .finish()
    }
}

/// Per-object base to embed in concrete object types.
///
/// Combines the [`ObjectCore`] with the object's lock protected state `S`.
/// The state is accessible only through an [`ObjectLock`](crate::ObjectLock)
/// and only by shared reference, as the lock may be reentered. Mutable
/// members of `S` use interior mutability, e.g. [`Cell`](core::cell::Cell) or
/// [`RefCell`](core::cell::RefCell).
pub struct ObjectBase<S = ()> {
    core: ObjectCore,
    state: S,
}

// The state is reachable only while holding the object's mutex, which
// confines it to a single thread at a time.
unsafe impl<S: marker::Send> marker::Sync for ObjectBase<S> {}

impl<S> ObjectBase<S> {
    pub const fn new(state: S) -> Self {
        Self {
            core: ObjectCore::new(),
            state,
        }
    }

    pub fn core(&self) -> &ObjectCore {
        &self.core
    }

    /// Access the state without locking.
    ///
    /// The `mut` reference on `Self` implies that no lock can be held
    /// concurrently.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn into_inner(self) -> S {
        self.state
    }

    pub(crate) fn state(&self) -> &S {
        &self.state
    }
}

impl<S: Default> Default for ObjectBase<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> fmt::Debug for ObjectBase<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBase").field("core", &self.core).finish_non_exhaustive()
    }
}

/// Place `object` under shared ownership.
///
/// This is the only way to establish the self reference behind
/// [`ManagedObject::get_self()`].
///
/// # Panics
///
/// Panics if `object` had been passed to `create()` before, e.g. after
/// having been moved out of its previous `Arc`.
pub fn create<T: ManagedObject>(object: T) -> sync::Arc<T> {
    let object = sync::Arc::new(object);
    let this: WeakObjectHandle = sync::Arc::downgrade(&object) as sync::Weak<T>;
    object.object_core().attach(this);
    log::trace!("created {}", any::type_name::<T>());
    object
}

#[cfg(test)]
use crate::test::{Plain, Probe, init_logging};
#[cfg(test)]
use core::sync::atomic;

#[test]
fn managed_object_destroyed_once() {
    init_logging();
    let drops = sync::Arc::new(atomic::AtomicUsize::new(0));
    let probe = create(Probe::counting(&drops));
    let weak = sync::Arc::downgrade(&probe);
    assert_eq!(drops.load(atomic::Ordering::Relaxed), 0);
    drop(probe);
    assert_eq!(drops.load(atomic::Ordering::Relaxed), 1);
    assert!(weak.upgrade().is_none());
    drop(weak);
    assert_eq!(drops.load(atomic::Ordering::Relaxed), 1);
}

#[test]
fn managed_object_destroyed_through_base_handle() {
    let drops = sync::Arc::new(atomic::AtomicUsize::new(0));
    let probe: ObjectHandle = create(Probe::counting(&drops));
    let handles: Vec<ObjectHandle> = (0..4).map(|_| probe.clone()).collect();
    drop(probe);
    std::thread::scope(|s| {
        for handle in handles {
            s.spawn(move || drop(handle));
        }
    });
    assert_eq!(drops.load(atomic::Ordering::Relaxed), 1);
}

#[test]
fn get_self_shares_reference_count() {
    let probe = create(Probe::default());
    assert!(probe.object_core().is_shared());
    let count = sync::Arc::strong_count(&probe);
    {
        let this: sync::Arc<Probe> = probe.get_self().shared();
        assert!(sync::Arc::ptr_eq(&this, &probe));
        assert_eq!(sync::Arc::strong_count(&probe), count + 1);
    }
    assert_eq!(sync::Arc::strong_count(&probe), count);

    let base: ObjectHandle = probe.clone();
    let this = base.get_self().into_inner();
    assert!(sync::Arc::ptr_eq(&this, &base));
}

#[test]
#[should_panic(expected = "not under shared ownership")]
fn get_self_without_ownership() {
    init_logging();
    let probe = Probe::default();
    assert!(!probe.object_core().is_shared());
    probe.get_self();
}

#[test]
#[should_panic(expected = "not under shared ownership")]
fn get_self_bypassing_create() {
    let probe = sync::Arc::new(Plain::default());
    probe.get_self();
}

#[test]
#[should_panic(expected = "shared ownership twice")]
fn create_twice() {
    let probe = create(Plain::default());
    let Ok(probe) = sync::Arc::try_unwrap(probe) else {
        unreachable!();
    };
    create(probe);
}

#[test]
fn default_fields_unsupported() {
    let plain: ObjectHandle = create(Plain::default());
    assert_eq!(plain.get_field(0).err(), Some(FieldError::InvalidFieldId));
    assert_eq!(
        plain.set_field(0, Value::Boolean(true)),
        Err(FieldError::InvalidFieldId)
    );
}

#[test]
fn fields_through_base_handle() {
    let probe: ObjectHandle = create(Probe::default());
    probe.set_field(0, Value::Number(3.0)).unwrap();
    probe.set_field(1, Value::from("web01")).unwrap();
    assert_eq!(probe.get_field(0).unwrap(), Value::Number(3.0));
    assert_eq!(probe.get_field(1).unwrap(), Value::from("web01"));
    assert_eq!(probe.set_field(0, Value::Empty), Err(FieldError::InvalidValue));
    assert_eq!(probe.get_field(2).err(), Some(FieldError::InvalidFieldId));
}

#[test]
fn object_base_get_mut() {
    let mut probe = Probe::default();
    probe.base.get_mut().hits.set(5);
    let probe = create(probe);
    assert_eq!(probe.get_field(0).unwrap(), Value::Number(5.0));
}
