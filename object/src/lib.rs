// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 SUSE LLC

//! Base object layer of the Lattice object framework.
//!
//! Every heap allocated entity of the framework implements [`ManagedObject`]
//! and embeds an [`ObjectBase`]. The crate provides
//! * shared ownership through [`create()`] with a safe self reference
//!   ([`ManagedObject::get_self()`]),
//! * one mutex per object, acquired exclusively through the scoped
//!   [`ObjectLock`],
//! * per-class type descriptor slots and default factories
//!   ([`reflection`], [`type_registry`]),
//! * checked conversion from base handles to concrete ones
//!   ([`TypedHandle`]),
//! * identity comparison of weak handles ([`WeakRefEq`]).
//!
//! # Build configurations
//!
//! In builds with `debug_assertions`, or with the `debug-checks` feature, the
//! object mutex is reentrant and tracks its owner, which enables
//! [`ManagedObject::owns_lock()`]. Otherwise the mutex is plain and a second
//! acquisition by the holding thread deadlocks.

// Lifetimes are not always obvious at first sight, allow for making them explicit even if
// redundant.
#![allow(clippy::needless_lifetimes)]

use lattice_utils_sync as utils_sync;

pub mod object;
pub mod object_lock;
pub mod reflection;
pub mod type_registry;
pub mod typed_handle;
pub mod value;
pub mod weak_eq;

#[cfg(test)]
mod test;

pub use object::{AsAny, FieldError, ManagedObject, ObjectBase, ObjectCore, ObjectHandle, WeakObjectHandle, create};
pub use object_lock::ObjectLock;
pub use reflection::{ObjectFactory, ObjectImpl, ObjectType, Reflect, Type, TypeError, TypeSlot};
pub use type_registry::{RegistryError, TypeRegistry};
pub use typed_handle::{CastError, TypedHandle};
pub use value::Value;
pub use weak_eq::WeakRefEq;
