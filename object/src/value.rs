// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 SUSE LLC

//! Dynamically typed field values.

use crate::object::{AsAny, ObjectHandle};
use core::{convert, fmt};
use std::sync;

/// Field value exchanged through
/// [`ManagedObject::set_field()`](crate::ManagedObject::set_field) and
/// [`ManagedObject::get_field()`](crate::ManagedObject::get_field).
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Empty,
    Boolean(bool),
    Number(f64),
    String(String),
    Object(ObjectHandle),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectHandle> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }
}

// Objects compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => sync::Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Object(object) => f
                .debug_tuple("Object")
                .field(&AsAny::type_name(&**object))
                .finish(),
        }
    }
}

impl convert::From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl convert::From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl convert::From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl convert::From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl convert::From<ObjectHandle> for Value {
    fn from(value: ObjectHandle) -> Self {
        Self::Object(value)
    }
}

#[test]
fn value_object_identity() {
    use crate::object::create;
    use crate::test::Plain;

    let a: ObjectHandle = create(Plain::default());
    let b: ObjectHandle = create(Plain::default());
    assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
    assert_ne!(Value::from(a), Value::from(b));
    assert_ne!(Value::Number(1.0), Value::from("1"));
    assert!(Value::default().is_empty());
}

#[test]
fn value_accessors() {
    assert_eq!(Value::from(true).as_bool(), Some(true));
    assert_eq!(Value::from(2.5).as_number(), Some(2.5));
    assert_eq!(Value::from("web01").as_str(), Some("web01"));
    assert_eq!(Value::from(String::from("db")).as_str(), Some("db"));
    assert_eq!(Value::Empty.as_bool(), None);
    assert_eq!(Value::from(1.0).as_str(), None);
    assert_eq!(Value::from("1").as_number(), None);
    assert!(Value::from(false).as_object().is_none());
}
