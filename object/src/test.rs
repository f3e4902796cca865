// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 SUSE LLC

//! Object classes and helpers shared by the unit tests.

use crate::object::{FieldError, ManagedObject, ObjectBase, ObjectCore};
use crate::object_lock::ObjectLock;
use crate::reflection::ObjectImpl;
use crate::value::Value;
use crate::impl_object_type;
use core::{cell, sync::atomic};
use std::sync;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Lock protected state of [`Probe`].
#[derive(Default)]
pub struct ProbeState {
    pub hits: cell::Cell<u32>,
    pub label: cell::RefCell<String>,
}

/// Object class with two fields, optionally counting its destructions.
///
/// Never registered with any registry.
#[derive(Default)]
pub struct Probe {
    pub base: ObjectBase<ProbeState>,
    pub drops: Option<sync::Arc<atomic::AtomicUsize>>,
}

impl Probe {
    pub fn counting(drops: &sync::Arc<atomic::AtomicUsize>) -> Self {
        Self {
            base: ObjectBase::default(),
            drops: Some(drops.clone()),
        }
    }
}

impl Drop for Probe {
    fn drop(&mut self) {
        if let Some(drops) = &self.drops {
            drops.fetch_add(1, atomic::Ordering::Relaxed);
        }
    }
}

impl ManagedObject for Probe {
    fn object_core(&self) -> &ObjectCore {
        self.base.core()
    }

    fn set_field(&self, id: usize, value: Value) -> Result<(), FieldError> {
        let state = ObjectLock::new(&self.base);
        match (id, value) {
            (0, Value::Number(hits)) => state.hits.set(hits as u32),
            (1, Value::String(label)) => *state.label.borrow_mut() = label,
            (0 | 1, _) => return Err(FieldError::InvalidValue),
            _ => return Err(FieldError::InvalidFieldId),
        }
        Ok(())
    }

    fn get_field(&self, id: usize) -> Result<Value, FieldError> {
        let state = ObjectLock::new(&self.base);
        match id {
            0 => Ok(Value::Number(state.hits.get() as f64)),
            1 => Ok(Value::String(state.label.borrow().clone())),
            _ => Err(FieldError::InvalidFieldId),
        }
    }
}

impl ObjectImpl for Probe {
    fn field_names() -> &'static [&'static str] {
        &["hits", "label"]
    }
}

impl_object_type!(Probe, default_factory);

/// Object class without fields or factory.
#[derive(Default)]
pub struct Plain {
    pub base: ObjectBase,
}

impl ManagedObject for Plain {
    fn object_core(&self) -> &ObjectCore {
        self.base.core()
    }
}

impl ObjectImpl for Plain {}

impl_object_type!(Plain);
