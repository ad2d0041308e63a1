// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # TypeScript Element Extractor
//!
//! Brace-family raw-record extraction. TypeScript-specific semantics:
//!
//! - decorators are *children* of the declaration node, so the default
//!   element range is narrowed to start at the first non-decorator token,
//! - `get`/`set` modifier tokens turn methods into property accessors,
//! - `static` fields become static properties,
//! - `method_definition` nodes inside object literals are not elements;
//!   only class members count,
//! - enum members land in `additional_data["members"]`.

use crate::raw::{
    block_interior, decorator_name, span_range, Accessor, RawDecorator, RawElement, RawParameter,
};
use crate::typescript::TypeScriptService;
use codehem_core::{ElementKind, ElementRange, LineIndex, Result};
use codehem_parse::navigator::{element_range, execute_query, find_first_ancestor, node_text};
use serde_json::Value;
use tracing::debug;
use tree_sitter::{Node, Tree};

const FUNCTION_SCOPES: &[&str] = &[
    "function_declaration",
    "function_expression",
    "arrow_function",
    "method_definition",
];

pub(crate) fn extract(
    service: &TypeScriptService,
    source: &str,
    index: &LineIndex,
    tree: &Tree,
) -> Result<Vec<RawElement>> {
    let bytes = source.as_bytes();
    let root = tree.root_node();
    let mut raws = Vec::new();

    for hit in execute_query(&service.queries.class, root, bytes) {
        let (Some(node), Some(name_node)) = (hit.node("element"), hit.node("name")) else {
            debug!("class hit without expected captures, skipping");
            continue;
        };
        if find_first_ancestor(node, FUNCTION_SCOPES).is_some() {
            continue;
        }
        let name = node_text(name_node, bytes)?;
        let (range, decorators) = narrowed_range(node, index, source, bytes)?;
        let mut raw = RawElement::new(ElementKind::Class, name, range);
        raw.decorators = decorators;
        raws.push(raw);
    }

    for hit in execute_query(&service.queries.interface, root, bytes) {
        let (Some(node), Some(name_node)) = (hit.node("element"), hit.node("name")) else {
            continue;
        };
        let name = node_text(name_node, bytes)?;
        raws.push(RawElement::new(
            ElementKind::Interface,
            name,
            element_range(node, index, source),
        ));
    }

    for hit in execute_query(&service.queries.function, root, bytes) {
        let (Some(node), Some(name_node)) = (hit.node("element"), hit.node("name")) else {
            debug!("function hit without expected captures, skipping");
            continue;
        };
        if find_first_ancestor(node, FUNCTION_SCOPES).is_some() {
            continue;
        }
        let name = node_text(name_node, bytes)?;
        let mut raw = RawElement::new(
            ElementKind::Function,
            name,
            element_range(node, index, source),
        );
        fill_callable(&mut raw, node, index, source, bytes)?;
        raws.push(raw);
    }

    for hit in execute_query(&service.queries.arrow_function, root, bytes) {
        let (Some(node), Some(name_node), Some(function)) =
            (hit.node("element"), hit.node("name"), hit.node("function"))
        else {
            continue;
        };
        if find_first_ancestor(node, FUNCTION_SCOPES).is_some() {
            continue;
        }
        let name = node_text(name_node, bytes)?;
        let mut raw = RawElement::new(
            ElementKind::Function,
            name,
            element_range(node, index, source),
        );
        fill_callable(&mut raw, function, index, source, bytes)?;
        raws.push(raw);
    }

    for hit in execute_query(&service.queries.method, root, bytes) {
        let (Some(node), Some(name_node)) = (hit.node("element"), hit.node("name")) else {
            debug!("method hit without expected captures, skipping");
            continue;
        };
        // Object-literal methods are not class members.
        let Some(scope) = find_first_ancestor(node, &["class_body", "object"]) else {
            continue;
        };
        if scope.kind() != "class_body" {
            continue;
        }
        let name = node_text(name_node, bytes)?;
        let (range, decorators) = narrowed_range(node, index, source, bytes)?;
        let mut raw = RawElement::new(ElementKind::Method, name, range);
        raw.decorators = decorators;
        raw.accessor = accessor_of(node);
        raw.is_static = has_modifier(node, "static");
        fill_callable(&mut raw, node, index, source, bytes)?;
        raws.push(raw);
    }

    for hit in execute_query(&service.queries.field, root, bytes) {
        let (Some(node), Some(name_node)) = (hit.node("element"), hit.node("name")) else {
            continue;
        };
        let name = node_text(name_node, bytes)?;
        let (range, decorators) = narrowed_range(node, index, source, bytes)?;
        let kind = if has_modifier(node, "static") {
            ElementKind::StaticProperty
        } else {
            ElementKind::Property
        };
        let mut raw = RawElement::new(kind, name, range);
        raw.decorators = decorators;
        raw.is_static = kind == ElementKind::StaticProperty;
        if let Some(annotation) = node.child_by_field_name("type") {
            raw.value_type = Some(annotation_text(annotation, bytes)?);
        }
        if let Some(value) = node.child_by_field_name("value") {
            raw.body_range = Some(element_range(value, index, source));
        }
        raws.push(raw);
    }

    for hit in execute_query(&service.queries.import, root, bytes) {
        let Some(node) = hit.node("element") else {
            continue;
        };
        raws.push(RawElement::new(
            ElementKind::Import,
            "",
            element_range(node, index, source),
        ));
    }

    for hit in execute_query(&service.queries.type_alias, root, bytes) {
        let (Some(node), Some(name_node)) = (hit.node("element"), hit.node("name")) else {
            continue;
        };
        let name = node_text(name_node, bytes)?;
        let mut raw = RawElement::new(
            ElementKind::TypeAlias,
            name,
            element_range(node, index, source),
        );
        if let Some(value) = node.child_by_field_name("value") {
            raw.body_range = Some(element_range(value, index, source));
        }
        raws.push(raw);
    }

    for hit in execute_query(&service.queries.enum_, root, bytes) {
        let (Some(node), Some(name_node)) = (hit.node("element"), hit.node("name")) else {
            continue;
        };
        let name = node_text(name_node, bytes)?;
        let mut raw = RawElement::new(ElementKind::Enum, name, element_range(node, index, source));
        if let Some(body) = node.child_by_field_name("body") {
            let members = enum_members(body, bytes)?;
            if !members.is_empty() {
                raw.additional
                    .insert("members".to_string(), Value::Array(members));
            }
        }
        raws.push(raw);
    }

    for hit in execute_query(&service.queries.namespace, root, bytes) {
        let (Some(node), Some(name_node)) = (hit.node("element"), hit.node("name")) else {
            continue;
        };
        let name = node_text(name_node, bytes)?;
        raws.push(RawElement::new(
            ElementKind::Namespace,
            name,
            element_range(node, index, source),
        ));
    }

    Ok(raws)
}

/// Default range with leading decorator children stripped, plus the stripped
/// decorators as raw records.
fn narrowed_range(
    node: Node<'_>,
    index: &LineIndex,
    source: &str,
    bytes: &[u8],
) -> Result<(ElementRange, Vec<RawDecorator>)> {
    let mut decorators = Vec::new();
    let mut start_byte = node.start_byte();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "decorator" {
            decorators.push(RawDecorator {
                name: decorator_name(node_text(child, bytes)?),
                range: element_range(child, index, source),
            });
        } else if child.kind() != "comment" {
            start_byte = child.start_byte();
            break;
        }
    }
    Ok((
        span_range(start_byte, node.end_byte(), index, source),
        decorators,
    ))
}

fn fill_callable(
    raw: &mut RawElement,
    node: Node<'_>,
    index: &LineIndex,
    source: &str,
    bytes: &[u8],
) -> Result<()> {
    if let Some(params) = node.child_by_field_name("parameters") {
        raw.parameters = parameters(params, index, source, bytes)?;
    }
    if let Some(return_type) = node.child_by_field_name("return_type") {
        raw.return_type = Some(annotation_text(return_type, bytes)?);
        raw.return_range = Some(element_range(return_type, index, source));
    }
    if let Some(body) = node.child_by_field_name("body") {
        raw.body_range = Some(if body.kind() == "statement_block" {
            block_interior(body, index, source)
        } else {
            // Expression-bodied arrow function.
            element_range(body, index, source)
        });
    }
    Ok(())
}

fn accessor_of(node: Node<'_>) -> Option<Accessor> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.is_named() {
            continue;
        }
        match child.kind() {
            "get" => return Some(Accessor::Getter),
            "set" => return Some(Accessor::Setter),
            _ => {}
        }
    }
    None
}

fn has_modifier(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token)
}

fn annotation_text(annotation: Node<'_>, bytes: &[u8]) -> Result<String> {
    let text = node_text(annotation, bytes)?;
    Ok(text.trim_start_matches(':').trim().to_string())
}

fn parameters(
    params: Node<'_>,
    index: &LineIndex,
    source: &str,
    bytes: &[u8],
) -> Result<Vec<RawParameter>> {
    let mut out = Vec::new();
    let mut cursor = params.walk();
    for child in params.named_children(&mut cursor) {
        if !matches!(
            child.kind(),
            "required_parameter" | "optional_parameter" | "rest_parameter"
        ) {
            continue;
        }
        let name = child
            .child_by_field_name("pattern")
            .map(|n| node_text(n, bytes))
            .transpose()?
            .unwrap_or_default()
            .to_string();
        let value_type = child
            .child_by_field_name("type")
            .map(|n| annotation_text(n, bytes))
            .transpose()?;
        let default_value = child
            .child_by_field_name("value")
            .map(|n| node_text(n, bytes).map(ToString::to_string))
            .transpose()?;
        out.push(RawParameter {
            name,
            value_type,
            default_value,
            optional: child.kind() == "optional_parameter",
            range: element_range(child, index, source),
        });
    }
    Ok(out)
}

fn enum_members(body: Node<'_>, bytes: &[u8]) -> Result<Vec<Value>> {
    let mut members = Vec::new();
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        let name = match child.kind() {
            "property_identifier" => Some(node_text(child, bytes)?.to_string()),
            "enum_assignment" => child
                .child_by_field_name("name")
                .map(|n| node_text(n, bytes).map(ToString::to_string))
                .transpose()?,
            _ => None,
        };
        if let Some(name) = name {
            members.push(Value::String(name));
        }
    }
    Ok(members)
}
