// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! Tree-sitter queries for TypeScript element extraction, one per supported
//! kind. JavaScript buffers parse through the same grammar and queries.

pub const CLASS: &str = "[
  (class_declaration name: (type_identifier) @name)
  (abstract_class_declaration name: (type_identifier) @name)
] @element";

pub const INTERFACE: &str = "(interface_declaration name: (type_identifier) @name) @element";

pub const FUNCTION: &str = "(function_declaration name: (identifier) @name) @element";

/// `const f = (...) => ...` declarations count as functions.
pub const ARROW_FUNCTION: &str = "(lexical_declaration
  (variable_declarator
    name: (identifier) @name
    value: (arrow_function) @function)) @element";

pub const METHOD: &str = "(method_definition name: (property_identifier) @name) @element";

pub const FIELD: &str = "(public_field_definition name: (property_identifier) @name) @element";

pub const IMPORT: &str = "(import_statement) @element";

pub const TYPE_ALIAS: &str = "(type_alias_declaration name: (type_identifier) @name) @element";

pub const ENUM: &str = "(enum_declaration name: (identifier) @name) @element";

pub const NAMESPACE: &str = "(internal_module name: (identifier) @name) @element";
