// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # CodeHem Core
//!
//! Language-agnostic data model shared by every CodeHem crate.
//!
//! ## Key Types
//!
//! - [`Element`] / [`ElementTree`] - The typed element forest extracted from a
//!   source file
//! - [`ElementKind`] - Closed enumeration of element kinds
//! - [`PathExpr`] - Compact path expressions such as `C.f[body]`
//! - [`Error`] - The error taxonomy used across the workspace
//! - [`LruCache`] - Minimal recency-evicting cache backing the parse and
//!   extraction caches
//! - [`LineIndex`] - 1-based line/column to byte-offset mapping

pub mod cache;
pub mod element;
pub mod error;
pub mod hash;
pub mod path;
pub mod text;

pub use cache::LruCache;
pub use element::{Element, ElementKind, ElementRange, ElementTree};
pub use error::{Error, Result};
pub use hash::{canonicalize, content_key, fragment_hash, ContentKey};
pub use path::{PathExpr, PathTag};
pub use text::LineIndex;
