// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # CodeHem FS
//!
//! The workspace layer: an indexed view of a directory tree serving
//! cross-file element queries and strictly serialized, atomic per-file
//! writes. This crate owns all filesystem access; no other CodeHem component
//! touches disk.

pub mod retry;
pub mod workspace;

pub use retry::RetryPolicy;
pub use workspace::{Location, Workspace};
