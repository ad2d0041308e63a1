// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! Tree-sitter queries for Python element extraction, one per supported kind.
//!
//! Every query captures the element node as `@element`; name captures are
//! `@name`. Methods are not queried separately from functions - the extractor
//! classifies a `function_definition` by its nearest class ancestor.

pub const CLASS: &str = "(class_definition name: (identifier) @name) @element";

pub const FUNCTION: &str = "(function_definition name: (identifier) @name) @element";

pub const IMPORT: &str = "[
  (import_statement)
  (import_from_statement)
  (future_import_statement)
] @element";

/// Class-body assignments: plain `x = 1`, annotated `x: int = 1` and
/// annotation-only `x: int` all parse as `assignment`.
pub const CLASS_FIELD: &str =
    "(class_definition body: (block (expression_statement (assignment) @element)))";

/// PEP 695 `type X = ...` statements.
pub const TYPE_ALIAS: &str = "(type_alias_statement) @element";
