// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Python Element Extractor
//!
//! Turns query hits into raw records. Python-specific semantics live here:
//!
//! - a `function_definition` is a method iff its nearest enclosing definition
//!   is a class; local defs (inside functions) are not elements,
//! - decorators come from the wrapping `decorated_definition` node, so the
//!   default element range naturally excludes them,
//! - `@property` / `@<name>.setter` turn methods into property accessors,
//! - a class whose superclass list names an `Enum` variant becomes an enum.

use crate::python::PythonService;
use crate::raw::{decorator_name, Accessor, RawDecorator, RawElement, RawParameter};
use codehem_core::{ElementKind, LineIndex, Result};
use codehem_parse::navigator::{element_range, execute_query, find_first_ancestor, node_text};
use tracing::debug;
use tree_sitter::{Node, Tree};

const ENUM_BASES: &[&str] = &["Enum", "IntEnum", "StrEnum", "Flag", "IntFlag"];

pub(crate) fn extract(
    service: &PythonService,
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
        // Local classes declared inside a function body are not elements.
        if enclosing_definition(node).is_some_and(|a| a.kind() == "function_definition") {
            continue;
        }
        let name = node_text(name_node, bytes)?;
        let kind = if is_enum_class(node, bytes) {
            ElementKind::Enum
        } else {
            ElementKind::Class
        };
        let mut raw = RawElement::new(kind, name, element_range(node, index, source));
        raw.decorators = decorators_of(node, index, source, bytes)?;
        raws.push(raw);
    }

    for hit in execute_query(&service.queries.function, root, bytes) {
        let (Some(node), Some(name_node)) = (hit.node("element"), hit.node("name")) else {
            debug!("function hit without expected captures, skipping");
            continue;
        };
        let name = node_text(name_node, bytes)?.to_string();
        let enclosing = enclosing_definition(node);
        let kind = match enclosing.map(|a| a.kind()) {
            None => ElementKind::Function,
            Some("class_definition") => ElementKind::Method,
            // Local def inside a function body.
            Some(_) => continue,
        };

        let mut raw = RawElement::new(kind, name.clone(), element_range(node, index, source));
        raw.decorators = decorators_of(node, index, source, bytes)?;
        raw.accessor = accessor_of(&name, &raw.decorators);
        raw.is_static = raw
            .decorators
            .iter()
            .any(|d| d.name == "staticmethod" || d.name == "classmethod");

        if let Some(params) = node.child_by_field_name("parameters") {
            raw.parameters = parameters(params, index, source, bytes)?;
        }
        if let Some(return_type) = node.child_by_field_name("return_type") {
            raw.return_type = Some(node_text(return_type, bytes)?.to_string());
            raw.return_range = Some(element_range(return_type, index, source));
        }
        if let Some(body) = node.child_by_field_name("body") {
            // Python block nodes end at the last statement, which keeps the
            // body range clear of trailing blank lines.
            raw.body_range = Some(element_range(body, index, source));
        }
        raws.push(raw);
    }

    for hit in execute_query(&service.queries.class_field, root, bytes) {
        let Some(node) = hit.node("element") else {
            continue;
        };
        let Some(left) = node.child_by_field_name("left") else {
            debug!("class field without a left-hand side, skipping");
            continue;
        };
        if left.kind() != "identifier" {
            // Tuple or attribute targets are not addressable properties.
            continue;
        }
        let name = node_text(left, bytes)?;
        let mut raw = RawElement::new(
            ElementKind::StaticProperty,
            name,
            element_range(node, index, source),
        );
        if let Some(annotation) = node.child_by_field_name("type") {
            raw.value_type = Some(node_text(annotation, bytes)?.to_string());
        }
        if let Some(right) = node.child_by_field_name("right") {
            raw.body_range = Some(element_range(right, index, source));
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
        let Some(node) = hit.node("element") else {
            continue;
        };
        let Some(name) = alias_name(node, bytes) else {
            debug!("type alias without an identifier, skipping");
            continue;
        };
        let mut raw = RawElement::new(
            ElementKind::TypeAlias,
            name,
            element_range(node, index, source),
        );
        if let Some(right) = node.child_by_field_name("right") {
            raw.body_range = Some(element_range(right, index, source));
        }
        raws.push(raw);
    }

    Ok(raws)
}

/// Nearest enclosing class or function definition, skipping the
/// `decorated_definition` wrapper.
fn enclosing_definition(node: Node<'_>) -> Option<Node<'_>> {
    find_first_ancestor(node, &["class_definition", "function_definition"])
}

fn is_enum_class(class_node: Node<'_>, bytes: &[u8]) -> bool {
    let Some(superclasses) = class_node.child_by_field_name("superclasses") else {
        return false;
    };
    let mut cursor = superclasses.walk();
    superclasses.named_children(&mut cursor).any(|base| {
        node_text(base, bytes).is_ok_and(|text| {
            let tail = text.rsplit('.').next().unwrap_or(text);
            ENUM_BASES.contains(&tail)
        })
    })
}

/// Decorators of a definition wrapped in `decorated_definition`, in source
/// order. Empty for undecorated definitions.
fn decorators_of(
    node: Node<'_>,
    index: &LineIndex,
    source: &str,
    bytes: &[u8],
) -> Result<Vec<RawDecorator>> {
    let Some(parent) = node.parent() else {
        return Ok(Vec::new());
    };
    if parent.kind() != "decorated_definition" {
        return Ok(Vec::new());
    }
    let mut decorators = Vec::new();
    let mut cursor = parent.walk();
    for child in parent.named_children(&mut cursor) {
        if child.kind() == "decorator" && child.end_byte() <= node.start_byte() {
            decorators.push(RawDecorator {
                name: decorator_name(node_text(child, bytes)?),
                range: element_range(child, index, source),
            });
        }
    }
    Ok(decorators)
}

fn accessor_of(name: &str, decorators: &[RawDecorator]) -> Option<Accessor> {
    for decorator in decorators {
        if decorator.name == "property" {
            return Some(Accessor::Getter);
        }
        if let Some(owner) = decorator.name.strip_suffix(".setter") {
            if owner == name {
                return Some(Accessor::Setter);
            }
        }
        if let Some(owner) = decorator.name.strip_suffix(".getter") {
            if owner == name {
                return Some(Accessor::Getter);
            }
        }
    }
    None
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
        let range = element_range(child, index, source);
        let param = match child.kind() {
            "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => RawParameter {
                name: node_text(child, bytes)?.to_string(),
                value_type: None,
                default_value: None,
                optional: false,
                range,
            },
            "typed_parameter" => {
                let name = child
                    .named_child(0)
                    .map(|n| node_text(n, bytes))
                    .transpose()?
                    .unwrap_or_default();
                RawParameter {
                    name: name.to_string(),
                    value_type: typed_text(child, "type", bytes)?,
                    default_value: None,
                    optional: false,
                    range,
                }
            }
            "default_parameter" | "typed_default_parameter" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, bytes))
                    .transpose()?
                    .unwrap_or_default();
                RawParameter {
                    name: name.to_string(),
                    value_type: typed_text(child, "type", bytes)?,
                    default_value: typed_text(child, "value", bytes)?,
                    optional: false,
                    range,
                }
            }
            _ => continue,
        };
        out.push(param);
    }
    Ok(out)
}

fn typed_text(node: Node<'_>, field: &str, bytes: &[u8]) -> Result<Option<String>> {
    node.child_by_field_name(field)
        .map(|n| node_text(n, bytes).map(ToString::to_string))
        .transpose()
}

/// First identifier inside the alias left-hand side (`type Alias[T] = ...`).
fn alias_name(node: Node<'_>, bytes: &[u8]) -> Option<String> {
    let left = node.child_by_field_name("left")?;
    let mut stack = vec![left];
    while let Some(candidate) = stack.pop() {
        if candidate.kind() == "identifier" {
            return node_text(candidate, bytes).ok().map(ToString::to_string);
        }
        let mut cursor = candidate.walk();
        let children: Vec<_> = candidate.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}
