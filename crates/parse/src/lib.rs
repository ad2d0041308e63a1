// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # CodeHem Parse
//!
//! Thin layer over tree-sitter: the [`ParserFacade`] drives grammar parsers
//! and caches trees by content hash, and the [`navigator`] module executes
//! queries and normalizes tree-sitter's 0-based coordinates to CodeHem's
//! 1-based public interface.
//!
//! Partial source is parsed best-effort: grammars produce error nodes that
//! downstream extractors tolerate. [`codehem_core::Error::Parse`] is only
//! raised when a grammar cannot initialize or returns no tree at all.

pub mod facade;
pub mod navigator;

pub use facade::{ParsedTree, ParserFacade};
pub use navigator::{element_range, execute_query, find_first_ancestor, node_line_range, node_text, QueryHit};
