// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Plug-in Contract
//!
//! The fixed capability set a language plug-in provides to the engine.

use codehem_core::{ElementTree, Result};
use tree_sitter::{Language, Tree};

/// The two block-structure families the formatter knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatterFamily {
    /// Blocks are introduced by `:` and delimited by indentation (Python).
    Indent,
    /// Blocks are delimited by `{`/`}` (TypeScript, JavaScript).
    Brace,
}

/// Static manipulation parameters of a language.
#[derive(Debug, Clone, Copy)]
pub struct ManipulatorConfig {
    /// Token that introduces a block after a header (`:` or `{`).
    pub block_token: &'static str,
    /// One level of indentation for generated code.
    pub indent_unit: &'static str,
}

/// A language plug-in: grammar, extraction, formatting and manipulation
/// capabilities registered under a language code.
///
/// Implementations are stateless values (compiled queries aside) shared
/// behind `Arc` across threads.
pub trait LanguageService: Send + Sync {
    /// Canonical language code, e.g. `python`.
    fn code(&self) -> &'static str;

    /// Codes that resolve to this same service, e.g. `javascript`.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// File extensions (lowercase, no dot) handled by this service.
    fn file_extensions(&self) -> &'static [&'static str];

    /// The tree-sitter grammar.
    fn grammar(&self) -> &Language;

    fn formatter_family(&self) -> FormatterFamily;

    fn manipulator_config(&self) -> ManipulatorConfig;

    /// Heuristic score that `source` is written in this language. Higher
    /// wins; zero means "not mine". Only the leading bytes are inspected.
    fn sniff(&self, source: &str) -> u32;

    /// Run the extraction pipeline: queries against `tree`, raw records,
    /// post-processing into the typed element tree.
    fn build_elements(&self, source: &str, tree: &Tree) -> Result<ElementTree>;
}
