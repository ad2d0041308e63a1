// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # CodeHem Languages
//!
//! Language plug-ins and their registry. A plug-in is a value implementing
//! [`LanguageService`]: grammar binding, element-extraction queries, a
//! post-processor folding raw records into the element tree, a formatter
//! family and a manipulator configuration. The core never names a concrete
//! language; adding one means adding a module here and registering it.
//!
//! Two reference plug-ins ship built in:
//!
//! - [`python`] - the indent family (`:` block marker, 4-space indent)
//! - [`typescript`] - the brace family (`{`/`}`, 2-space indent), with
//!   `javascript` registered as an alias of the same service
//!
//! The registry is populated at startup and treated as read-only afterwards;
//! late registration is possible but must be externally synchronized.

pub mod postprocess;
pub mod python;
pub mod raw;
pub mod registry;
pub mod service;
pub mod typescript;

pub use registry::{default_registry, LanguageRegistry};
pub use service::{FormatterFamily, LanguageService, ManipulatorConfig};
