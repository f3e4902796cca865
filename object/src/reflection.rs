// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 SUSE LLC

//! Runtime type identification and default factories.
//!
//! Each concrete object class owns a static [`TypeSlot`], populated with the
//! class' [`Type`] descriptor when the class gets registered with a
//! [`TypeRegistry`](crate::TypeRegistry). Code holding a base handle
//! discovers the concrete type through [`Reflect::reflection_type()`]. An
//! empty slot means the class has not been registered; that is a bootstrap
//! fault and the `None` must not be used for dispatch, see [`Type::of()`].
//!
//! The per-class boilerplate is provided by
//! [`impl_object_type!()`](crate::impl_object_type).

use crate::object::{self, ManagedObject, ObjectHandle};
use core::{any, fmt};
use std::sync;

/// Error type returned by [`Type`] operations.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TypeError {
    /// The object's class has no descriptor.
    Unregistered,
    /// The class provides no factory.
    NoFactory,
}

/// Creates a new default constructed object.
pub type ObjectFactory = fn() -> ObjectHandle;

/// [`ObjectFactory`] default constructing a `T` under shared ownership.
pub fn default_object_factory<T: ManagedObject + Default>() -> ObjectHandle {
    object::create(T::default())
}

/// Extension point for generated per-class field glue.
///
/// The default implementation describes a class without fields.
pub trait ObjectImpl {
    /// Field names, indexed by field id.
    fn field_names() -> &'static [&'static str] {
        &[]
    }
}

/// Runtime type descriptor of a concrete object class.
pub struct Type {
    name: String,
    type_id: any::TypeId,
    rust_name: &'static str,
    factory: Option<ObjectFactory>,
    fields: &'static [&'static str],
}

impl Type {
    pub fn new<T: ManagedObject + ObjectType + ObjectImpl>(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            type_id: any::TypeId::of::<T>(),
            rust_name: any::type_name::<T>(),
            factory: T::factory(),
            fields: T::field_names(),
        }
    }

    /// Look up the descriptor of `object`'s class.
    ///
    /// Maps a missing descriptor to [`TypeError::Unregistered`].
    pub fn of(object: &dyn ManagedObject) -> Result<sync::Arc<Type>, TypeError> {
        object.reflection_type().ok_or_else(|| {
            log::error!("no type descriptor for {}", object::AsAny::type_name(object));
            TypeError::Unregistered
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the descriptor describes the Rust type `T`.
    pub fn is_class<T: 'static>(&self) -> bool {
        self.type_id == any::TypeId::of::<T>()
    }

    pub fn factory(&self) -> Option<ObjectFactory> {
        self.factory
    }

    /// Create a new object through the class' factory.
    pub fn instantiate(&self) -> Result<ObjectHandle, TypeError> {
        let factory = self.factory.ok_or(TypeError::NoFactory)?;
        Ok(factory())
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field_name(&self, id: usize) -> Option<&'static str> {
        self.fields.get(id).copied()
    }

    pub fn field_id(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| *field == name)
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Type")
            .field("name", &self.name)
            .field("class", &self.rust_name)
            .field("has_factory", &self.factory.is_some())
            .field("fields", &self.fields)
            .finish()
    }
}

/// Per-class static slot for the class' [`Type`] descriptor.
pub struct TypeSlot {
    descriptor: sync::OnceLock<sync::Arc<Type>>,
}

impl TypeSlot {
    pub const fn new() -> Self {
        Self {
            descriptor: sync::OnceLock::new(),
        }
    }

    pub fn get(&self) -> Option<sync::Arc<Type>> {
        self.descriptor.get().cloned()
    }

    pub fn is_populated(&self) -> bool {
        self.descriptor.get().is_some()
    }

    /// Populate the slot, handing `descriptor` back if it is populated
    /// already.
    pub(crate) fn populate(&self, descriptor: sync::Arc<Type>) -> Result<(), sync::Arc<Type>> {
        self.descriptor.set(descriptor)
    }
}

impl Default for TypeSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Static per-class type information.
///
/// Implement through [`impl_object_type!()`](crate::impl_object_type).
pub trait ObjectType: 'static {
    /// The class' descriptor slot.
    fn type_slot() -> &'static TypeSlot;

    /// Factory used for registration driven object creation.
    fn factory() -> Option<ObjectFactory> {
        None
    }
}

/// Runtime type lookup through a base reference.
pub trait Reflect {
    /// The descriptor of the object's class, `None` if unregistered.
    fn reflection_type(&self) -> Option<sync::Arc<Type>>;
}

impl<T: ObjectType> Reflect for T {
    fn reflection_type(&self) -> Option<sync::Arc<Type>> {
        T::type_slot().get()
    }
}

/// Implement [`ObjectType`] for an object class.
///
/// Declares the class' static [`TypeSlot`]. With `default_factory`, the class
/// gets [`default_object_factory()`] as its [`ObjectType::factory()`], which
/// requires it to implement [`Default`].
///
/// ```ignore
/// impl_object_type!(Host, default_factory);
/// impl_object_type!(Downtime);
/// ```
#[macro_export]
macro_rules! impl_object_type {
    ($ty:ty) => {
        impl $crate::reflection::ObjectType for $ty {
            fn type_slot() -> &'static $crate::reflection::TypeSlot {
                static TYPE_SLOT: $crate::reflection::TypeSlot = $crate::reflection::TypeSlot::new();
                &TYPE_SLOT
            }
        }
    };
    ($ty:ty, default_factory) => {
        impl $crate::reflection::ObjectType for $ty {
            fn type_slot() -> &'static $crate::reflection::TypeSlot {
                static TYPE_SLOT: $crate::reflection::TypeSlot = $crate::reflection::TypeSlot::new();
                &TYPE_SLOT
            }

            fn factory() -> Option<$crate::reflection::ObjectFactory> {
                Some($crate::reflection::default_object_factory::<$ty>)
            }
        }
    };
}

#[cfg(test)]
use crate::test::{Plain, Probe};

#[test]
fn type_unregistered_class() {
    let probe: ObjectHandle = object::create(Probe::default());
    assert!(probe.reflection_type().is_none());
    assert!(!<Probe as ObjectType>::type_slot().is_populated());
    assert_eq!(Type::of(&*probe).err(), Some(TypeError::Unregistered));
}

#[test]
fn type_descriptor_from_class() {
    let probe = Type::new::<Probe>("Probe");
    assert_eq!(probe.name(), "Probe");
    assert!(probe.is_class::<Probe>());
    assert!(!probe.is_class::<Plain>());
    assert_eq!(probe.field_count(), 2);
    assert_eq!(probe.field_name(1), Some("label"));
    assert_eq!(probe.field_id("hits"), Some(0));
    assert_eq!(probe.field_id("state"), None);

    assert!(probe.factory().is_some());
    let object = probe.instantiate().unwrap();
    assert!(crate::TypedHandle::new(object).is::<Probe>());

    let plain = Type::new::<Plain>("Plain");
    assert_eq!(plain.field_count(), 0);
    assert!(plain.factory().is_none());
    assert_eq!(plain.instantiate().err(), Some(TypeError::NoFactory));
}

#[test]
fn type_default_factory_shared() {
    let object = default_object_factory::<Probe>();
    assert!(object.object_core().is_shared());
    assert!(object.get_self().is::<Probe>());
}
