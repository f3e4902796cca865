// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 SUSE LLC

//! Name based registration of object classes.
//!
//! Registering a class creates its [`Type`] descriptor, populates the class'
//! [`TypeSlot`](crate::TypeSlot) and makes the descriptor available by name
//! for registration driven object creation. Registration is meant to happen
//! once at startup, before any code relies on
//! [`Reflect::reflection_type()`](crate::Reflect::reflection_type).

use crate::object::{ManagedObject, ObjectHandle};
use crate::reflection::{ObjectImpl, ObjectType, Type, TypeError};
use crate::utils_sync::sync_types::{self, RwLock as _};
use core::{any, convert};
use std::{collections, sync};

/// Error type returned by [`TypeRegistry`] operations.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RegistryError {
    /// Another class has been registered under the same name.
    DuplicateName,
    /// The class has been registered already, possibly with another
    /// registry.
    AlreadyRegistered,
    /// No class has been registered under the name.
    UnknownType,
    /// Error reported by the class' [`Type`].
    Type(TypeError),
}

impl convert::From<TypeError> for RegistryError {
    fn from(value: TypeError) -> Self {
        Self::Type(value)
    }
}

/// Registry of [`Type`] descriptors by name.
pub struct TypeRegistry<ST: sync_types::SyncTypes> {
    types: ST::RwLock<collections::BTreeMap<String, sync::Arc<Type>>>,
}

impl<ST: sync_types::SyncTypes> TypeRegistry<ST> {
    pub fn new() -> Self {
        Self {
            types: convert::From::from(collections::BTreeMap::new()),
        }
    }

    /// Register class `T` under `name`.
    ///
    /// A class can be registered only once per process, as its
    /// [`TypeSlot`](crate::TypeSlot) is static.
    pub fn register<T: ManagedObject + ObjectType + ObjectImpl>(
        &self,
        name: &str,
    ) -> Result<sync::Arc<Type>, RegistryError> {
        let mut types = self.types.write();
        if types.contains_key(name) {
            log::warn!("type name {name} registered twice");
            return Err(RegistryError::DuplicateName);
        }

        let descriptor = sync::Arc::new(Type::new::<T>(name));
        if T::type_slot().populate(descriptor.clone()).is_err() {
            log::warn!("class {} registered twice", any::type_name::<T>());
            return Err(RegistryError::AlreadyRegistered);
        }
        types.insert(name.to_owned(), descriptor.clone());
        log::debug!("registered type {name} for {}", any::type_name::<T>());
        Ok(descriptor)
    }

    pub fn by_name(&self, name: &str) -> Option<sync::Arc<Type>> {
        self.types.read().get(name).cloned()
    }

    /// Registered names in lexicographical order.
    pub fn names(&self) -> Vec<String> {
        self.types.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// Create a new object of the class registered under `name`.
    pub fn instantiate(&self, name: &str) -> Result<ObjectHandle, RegistryError> {
        let descriptor = self.by_name(name).ok_or(RegistryError::UnknownType)?;
        Ok(descriptor.instantiate()?)
    }
}

impl<ST: sync_types::SyncTypes> Default for TypeRegistry<ST> {
    fn default() -> Self {
        Self::new()
    }
}

/// The process wide registry.
pub fn global() -> &'static TypeRegistry<sync_types::StdSyncTypes> {
    static GLOBAL: sync::LazyLock<TypeRegistry<sync_types::StdSyncTypes>> = sync::LazyLock::new(TypeRegistry::new);
    &GLOBAL
}

#[cfg(test)]
use crate::{ObjectBase, ObjectCore, Reflect as _, TypedHandle, impl_object_type, object::create};
#[cfg(test)]
use crate::test::init_logging;
#[cfg(test)]
use crate::utils_sync::test::TestNopSyncTypes;

#[cfg(test)]
macro_rules! test_class {
    ($name:ident) => {
        #[derive(Default)]
        struct $name {
            base: ObjectBase,
        }

        impl ManagedObject for $name {
            fn object_core(&self) -> &ObjectCore {
                self.base.core()
            }
        }

        impl ObjectImpl for $name {}
    };
}

// Slots are static, so every class below is registered by at most one test.
#[cfg(test)]
test_class!(Host);
#[cfg(test)]
impl_object_type!(Host, default_factory);
#[cfg(test)]
test_class!(Service);
#[cfg(test)]
impl_object_type!(Service, default_factory);
#[cfg(test)]
test_class!(Notification);
#[cfg(test)]
impl_object_type!(Notification);
#[cfg(test)]
test_class!(Endpoint);
#[cfg(test)]
impl_object_type!(Endpoint);
#[cfg(test)]
test_class!(Downtime);
#[cfg(test)]
impl_object_type!(Downtime, default_factory);
#[cfg(test)]
test_class!(Zone);
#[cfg(test)]
impl_object_type!(Zone);
#[cfg(test)]
test_class!(Comment);
#[cfg(test)]
impl_object_type!(Comment, default_factory);

#[test]
fn type_registry_register_and_lookup() {
    init_logging();
    let registry = TypeRegistry::<TestNopSyncTypes>::new();
    assert!(registry.is_empty());
    let host_type = registry.register::<Host>("Host").unwrap();
    assert!(host_type.is_class::<Host>());
    assert!(sync::Arc::ptr_eq(&registry.by_name("Host").unwrap(), &host_type));
    assert_eq!(registry.names(), ["Host"]);
    assert_eq!(registry.len(), 1);

    let host = create(Host::default());
    assert!(sync::Arc::ptr_eq(&host.reflection_type().unwrap(), &host_type));

    let host = registry.instantiate("Host").unwrap();
    assert!(TypedHandle::new(host.clone()).is::<Host>());
    assert!(sync::Arc::ptr_eq(&Type::of(&*host).unwrap(), &host_type));
}

#[test]
fn type_registry_duplicates() {
    let registry = TypeRegistry::<TestNopSyncTypes>::new();
    registry.register::<Service>("Service").unwrap();
    assert_eq!(
        registry.register::<Notification>("Service").err(),
        Some(RegistryError::DuplicateName)
    );
    assert!(!Notification::type_slot().is_populated());
    assert_eq!(
        registry.register::<Service>("OtherService").err(),
        Some(RegistryError::AlreadyRegistered)
    );
    assert_eq!(registry.names(), ["Service"]);
}

#[test]
fn type_registry_unregistered_distinguishable() {
    let registry = TypeRegistry::<TestNopSyncTypes>::new();
    let endpoint_type = registry.register::<Endpoint>("Endpoint").unwrap();

    let endpoint: ObjectHandle = create(Endpoint::default());
    let downtime: ObjectHandle = create(Downtime::default());
    assert!(sync::Arc::ptr_eq(&endpoint.reflection_type().unwrap(), &endpoint_type));
    assert!(downtime.reflection_type().is_none());
    assert_eq!(Type::of(&*downtime).err(), Some(TypeError::Unregistered));
    assert!(registry.by_name("Downtime").is_none());
}

#[test]
fn type_registry_instantiate_errors() {
    let registry = TypeRegistry::<TestNopSyncTypes>::new();
    assert_eq!(registry.instantiate("Zone").err(), Some(RegistryError::UnknownType));
    registry.register::<Zone>("Zone").unwrap();
    assert_eq!(
        registry.instantiate("Zone").err(),
        Some(RegistryError::Type(TypeError::NoFactory))
    );
}

#[test]
fn type_registry_global() {
    let comment_type = global().register::<Comment>("Comment").unwrap();
    assert!(sync::Arc::ptr_eq(&global().by_name("Comment").unwrap(), &comment_type));
    let comment = global().instantiate("Comment").unwrap();
    assert!(comment.object_core().is_shared());
    assert_eq!(comment.reflection_type().unwrap().name(), "Comment");
}
