// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 SUSE LLC

//! Lock abstractions shared by the Lattice object framework crates.

// Lifetimes are not always obvious at first sight, allow for making them explicit even if
// redundant.
#![allow(clippy::needless_lifetimes)]

pub mod sync_types;
pub mod test;
