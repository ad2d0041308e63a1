// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Raw Extraction Records
//!
//! What the per-language extractors emit before post-processing. A raw record
//! carries everything the post-processor needs to build a typed element
//! without touching the syntax tree again: ranges, kind-specific fields and
//! decorator positions.

use codehem_core::{ElementKind, ElementRange, LineIndex};
use serde_json::{Map, Value};
use tree_sitter::Node;

/// Property accessor role of a callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    Getter,
    Setter,
}

#[derive(Debug, Clone)]
pub struct RawDecorator {
    /// Decorator expression without `@` or call arguments, e.g. `app.route`.
    pub name: String,
    pub range: ElementRange,
}

#[derive(Debug, Clone)]
pub struct RawParameter {
    pub name: String,
    pub value_type: Option<String>,
    pub default_value: Option<String>,
    pub optional: bool,
    pub range: ElementRange,
}

/// One extracted element before folding.
#[derive(Debug, Clone)]
pub struct RawElement {
    pub kind: ElementKind,
    pub name: String,
    /// Default range: decorators excluded.
    pub range: ElementRange,
    pub parent_name: Option<String>,
    pub value_type: Option<String>,
    pub accessor: Option<Accessor>,
    pub is_static: bool,
    pub decorators: Vec<RawDecorator>,
    pub parameters: Vec<RawParameter>,
    pub return_type: Option<String>,
    /// Suite/block interior for callables, initializer for properties.
    pub body_range: Option<ElementRange>,
    /// Return-type annotation range when present.
    pub return_range: Option<ElementRange>,
    pub additional: Map<String, Value>,
}

impl RawElement {
    #[must_use]
    pub fn new(kind: ElementKind, name: impl Into<String>, range: ElementRange) -> Self {
        Self {
            kind,
            name: name.into(),
            range,
            parent_name: None,
            value_type: None,
            accessor: None,
            is_static: false,
            decorators: Vec::new(),
            parameters: Vec::new(),
            return_type: None,
            body_range: None,
            return_range: None,
            additional: Map::new(),
        }
    }
}

/// Interior range of a `{...}` block: the span of its named children, or a
/// collapsed (empty) range right after the opening brace when the block has
/// none.
#[must_use]
pub fn block_interior(block: Node<'_>, index: &LineIndex, source: &str) -> ElementRange {
    let mut cursor = block.walk();
    let named: Vec<Node<'_>> = block.named_children(&mut cursor).collect();
    match (named.first(), named.last()) {
        (Some(first), Some(last)) => span_range(first.start_byte(), last.end_byte(), index, source),
        _ => {
            let after_brace = block.start_byte() + 1;
            span_range(after_brace, after_brace, index, source)
        }
    }
}

/// Element range for an arbitrary byte span, with the same end-of-line
/// adjustment as [`codehem_parse::element_range`].
#[must_use]
pub fn span_range(start: usize, end: usize, index: &LineIndex, source: &str) -> ElementRange {
    let (start_line, start_col) = index.position(start);
    let (mut end_line, mut end_col) = index.position(end);
    if end_col == 1 && end_line > start_line {
        end_line -= 1;
        end_col = index.line_end(end_line, source) - index.line_start(end_line) + 1;
    }
    ElementRange::new(start_line, start_col, end_line, end_col)
}

/// Decorator display name: the decorated expression without call arguments.
#[must_use]
pub fn decorator_name(expression_text: &str) -> String {
    let text = expression_text.trim_start_matches('@').trim();
    match text.find('(') {
        Some(open) => text[..open].trim().to_string(),
        None => text.to_string(),
    }
}
