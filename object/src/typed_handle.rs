// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 SUSE LLC

//! Conversion of base handles into handles of the concrete type.
//!
//! Interfaces operating on [`ObjectHandle`]s, like
//! [`ManagedObject::get_self()`](crate::ManagedObject::get_self), hand out a
//! [`TypedHandle`] which the call site converts into the concrete handle type
//! it expects. The type check is always performed: a mismatch is either
//! reported as [`CastError`] by the `try_` variants or treated as a fatal
//! programming error by [`shared()`](TypedHandle::shared) and
//! [`weak()`](TypedHandle::weak).

use crate::object::{AsAny, ManagedObject, ObjectHandle};
use crate::value::Value;
use core::{any, convert, fmt};
use std::sync;

/// Error returned by [`TypedHandle::try_shared()`] and
/// [`TypedHandle::try_weak()`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CastError {
    /// The object is not of the requested type.
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Holder of a base handle, convertible to handles of the concrete type.
#[derive(Clone)]
pub struct TypedHandle {
    object: ObjectHandle,
}

impl TypedHandle {
    pub fn new(object: ObjectHandle) -> Self {
        Self { object }
    }

    /// Whether the object is of concrete type `T`.
    pub fn is<T: ManagedObject>(&self) -> bool {
        AsAny::as_any(&*self.object).is::<T>()
    }

    /// Name of the object's concrete type.
    pub fn type_name(&self) -> &'static str {
        AsAny::type_name(&*self.object)
    }

    /// Convert to a shared handle of type `T`.
    pub fn try_shared<T: ManagedObject>(&self) -> Result<sync::Arc<T>, CastError> {
        let actual = self.type_name();
        <dyn ManagedObject as AsAny>::into_any_arc(self.object.clone())
            .downcast::<T>()
            .map_err(|_| CastError::TypeMismatch {
                expected: any::type_name::<T>(),
                actual,
            })
    }

    /// Convert to a shared handle of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if the object is not of type `T`.
    pub fn shared<T: ManagedObject>(&self) -> sync::Arc<T> {
        match self.try_shared() {
            Ok(object) => object,
            Err(CastError::TypeMismatch { expected, actual }) => {
                log::error!("invalid object cast from {actual} to {expected}");
                panic!("invalid object cast from {actual} to {expected}");
            }
        }
    }

    /// Convert to a weak handle of type `T`.
    pub fn try_weak<T: ManagedObject>(&self) -> Result<sync::Weak<T>, CastError> {
        self.try_shared().map(|object| sync::Arc::downgrade(&object))
    }

    /// Convert to a weak handle of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if the object is not of type `T`.
    pub fn weak<T: ManagedObject>(&self) -> sync::Weak<T> {
        sync::Arc::downgrade(&self.shared())
    }

    pub fn as_handle(&self) -> &ObjectHandle {
        &self.object
    }

    pub fn into_inner(self) -> ObjectHandle {
        self.object
    }
}

impl convert::From<ObjectHandle> for TypedHandle {
    fn from(object: ObjectHandle) -> Self {
        Self::new(object)
    }
}

impl convert::From<TypedHandle> for Value {
    fn from(handle: TypedHandle) -> Self {
        Value::Object(handle.object)
    }
}

impl fmt::Debug for TypedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedHandle").field(&self.type_name()).finish()
    }
}

#[cfg(test)]
use crate::object::create;
#[cfg(test)]
use crate::test::{Plain, Probe, init_logging};

#[test]
fn typed_handle_matching_cast() {
    let probe = create(Probe::default());
    let handle = TypedHandle::new(probe.clone());
    assert!(handle.is::<Probe>());
    assert!(!handle.is::<Plain>());
    let shared: sync::Arc<Probe> = handle.shared();
    assert!(sync::Arc::ptr_eq(&shared, &probe));
    let weak: sync::Weak<Probe> = handle.weak();
    assert!(sync::Weak::ptr_eq(&weak, &sync::Arc::downgrade(&probe)));
}

#[test]
fn typed_handle_mismatching_cast() {
    let probe = create(Probe::default());
    let handle = TypedHandle::from(probe.clone() as ObjectHandle);
    assert!(sync::Arc::ptr_eq(handle.as_handle(), &(probe.clone() as ObjectHandle)));
    let count = sync::Arc::strong_count(&probe);
    match handle.try_shared::<Plain>() {
        Err(CastError::TypeMismatch { expected, actual }) => {
            assert_eq!(expected, any::type_name::<Plain>());
            assert_eq!(actual, any::type_name::<Probe>());
        }
        Ok(_) => panic!("cast to unrelated type succeeded"),
    }
    assert!(handle.try_weak::<Plain>().is_err());
    assert_eq!(sync::Arc::strong_count(&probe), count);
}

#[test]
#[should_panic(expected = "invalid object cast")]
fn typed_handle_mismatching_cast_fatal() {
    init_logging();
    let plain = create(Plain::default());
    plain.get_self().shared::<Probe>();
}

#[test]
fn typed_handle_into_value() {
    let plain = create(Plain::default());
    let value = Value::from(plain.get_self());
    let object = value.as_object().unwrap();
    assert!(TypedHandle::new(object.clone()).is::<Plain>());
    assert_eq!(format!("{:?}", plain.get_self()), format!("TypedHandle({:?})", any::type_name::<Plain>()));
}
