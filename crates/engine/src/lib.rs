// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # CodeHem Engine
//!
//! The query-and-patch half of CodeHem: resolve a path expression against an
//! element tree, read the addressed text and its fragment hash, and apply
//! replace/prepend/append patches with indentation-aware formatting and
//! hash-based conflict detection.
//!
//! The [`Engine`] handle owns the shared parse and extraction caches; the
//! free functions in [`ops`] run against a lazily-built process default so
//! simple embedders never touch the handle.

pub mod builder;
pub mod diff;
pub mod format;
pub mod manipulate;
pub mod ops;
pub mod resolver;

pub use manipulate::{PatchMode, PatchRequest, PatchResult, PatchStatus};
pub use ops::Engine;
pub use resolver::{resolve, Resolved};
