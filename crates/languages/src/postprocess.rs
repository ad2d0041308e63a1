// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Post-Processing
//!
//! Folds raw extraction records into the typed [`ElementTree`]:
//!
//! - builds byte-exact `content` slices for every element and decorator,
//! - nests elements by lexical containment and normalizes `parent_name`,
//! - folds all import records into one synthetic element,
//! - folds enum member assignments into `additional_data`,
//! - materializes parameters and return values as child elements.
//!
//! Both built-in plug-ins share this folding; everything language-specific
//! (decorator semantics, accessor detection, enum detection) happens earlier,
//! in the extractors.

use crate::raw::{Accessor, RawElement};
use codehem_core::{Element, ElementKind, ElementRange, ElementTree, LineIndex};
use serde_json::Value;

/// Fold raw records into the element forest for one file.
#[must_use]
pub fn fold(source: &str, index: &LineIndex, raws: Vec<RawElement>) -> ElementTree {
    let mut imports = Vec::new();
    let mut elements = Vec::new();
    for raw in raws {
        if raw.kind == ElementKind::Import {
            imports.push(raw);
        } else {
            elements.push(build_element(source, index, raw));
        }
    }

    let mut top_level = nest_by_containment(elements);
    fold_enum_members(&mut top_level);

    if let Some(import_element) = fold_imports(source, index, imports) {
        top_level.push(import_element);
    }
    top_level.sort_by_key(|e| (e.range.start_line, e.range.start_col));
    ElementTree::new(top_level)
}

fn slice<'s>(source: &'s str, index: &LineIndex, range: &ElementRange) -> &'s str {
    &source[index.span(range)]
}

fn build_element(source: &str, index: &LineIndex, raw: RawElement) -> Element {
    let kind = match raw.accessor {
        Some(Accessor::Getter) => ElementKind::PropertyGetter,
        Some(Accessor::Setter) => ElementKind::PropertySetter,
        None => raw.kind,
    };
    let mut element = Element::new(kind, raw.name, raw.range);
    element.content = slice(source, index, &raw.range).to_string();
    element.parent_name = raw.parent_name;
    element.value_type = raw.value_type;
    element.body_range = raw.body_range;
    element.additional_data = raw.additional;
    if raw.is_static {
        element
            .additional_data
            .insert("static".to_string(), Value::Bool(true));
    }

    for decorator in raw.decorators {
        let mut el = Element::new(ElementKind::Decorator, decorator.name, decorator.range);
        el.content = slice(source, index, &decorator.range).to_string();
        element.decorators.push(el);
    }

    for (position, param) in raw.parameters.into_iter().enumerate() {
        let mut el = Element::new(ElementKind::Parameter, param.name, param.range);
        el.content = slice(source, index, &param.range).to_string();
        el.value_type = param.value_type;
        el.additional_data
            .insert("index".to_string(), Value::from(position));
        if let Some(default) = param.default_value {
            el.additional_data
                .insert("default".to_string(), Value::String(default));
        }
        if param.optional {
            el.additional_data
                .insert("optional".to_string(), Value::Bool(true));
        }
        element.children.push(el);
    }

    if let Some(return_type) = raw.return_type {
        let range = raw
            .return_range
            .unwrap_or(ElementRange::new(raw.range.start_line, raw.range.start_col, raw.range.start_line, raw.range.start_col));
        let mut el = Element::new(ElementKind::ReturnValue, "return", range);
        el.content = slice(source, index, &range).to_string();
        el.value_type = Some(return_type);
        element.children.push(el);
    }

    element
}

/// Nest elements by lexical containment. Input elements may arrive in any
/// order; output is the top-level forest in declaration order, with
/// `parent_name` rewritten to the adopting container's name.
fn nest_by_containment(mut elements: Vec<Element>) -> Vec<Element> {
    // Outer elements first: earlier start, later end.
    elements.sort_by(|a, b| {
        (a.range.start_line, a.range.start_col)
            .cmp(&(b.range.start_line, b.range.start_col))
            .then_with(|| (b.range.end_line, b.range.end_col).cmp(&(a.range.end_line, a.range.end_col)))
    });

    let mut top_level: Vec<Element> = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    fn close(stack: &mut Vec<Element>, top_level: &mut Vec<Element>) {
        let closed = stack.pop().expect("close on empty stack");
        match stack.last_mut() {
            Some(parent) => parent.children.push(closed),
            None => top_level.push(closed),
        }
    }

    for mut element in elements {
        while let Some(top) = stack.last() {
            if top.range.contains(&element.range) {
                break;
            }
            close(&mut stack, &mut top_level);
        }
        if let Some(parent) = stack.last() {
            element.parent_name = Some(parent.name.clone());
        } else {
            element.parent_name = None;
        }
        stack.push(element);
    }
    while !stack.is_empty() {
        close(&mut stack, &mut top_level);
    }
    top_level
}

/// Enum containers carry their members in `additional_data["members"]`, not
/// as child elements.
fn fold_enum_members(elements: &mut [Element]) {
    for element in elements {
        if element.kind == ElementKind::Enum && !element.children.is_empty() {
            let members: Vec<Value> = element
                .children
                .iter()
                .filter(|child| {
                    matches!(
                        child.kind,
                        ElementKind::StaticProperty | ElementKind::Property
                    )
                })
                .map(|child| Value::String(child.name.clone()))
                .collect();
            if !members.is_empty() {
                element
                    .additional_data
                    .entry("members".to_string())
                    .or_insert(Value::Array(members));
                element.children.retain(|child| {
                    !matches!(
                        child.kind,
                        ElementKind::StaticProperty | ElementKind::Property
                    )
                });
            }
        }
        fold_enum_members(&mut element.children);
    }
}

/// All import records fold into one synthetic element spanning from the first
/// to the last physical import line.
fn fold_imports(
    source: &str,
    index: &LineIndex,
    mut imports: Vec<RawElement>,
) -> Option<Element> {
    if imports.is_empty() {
        return None;
    }
    imports.sort_by_key(|raw| (raw.range.start_line, raw.range.start_col));
    let first = imports.first().expect("non-empty imports");
    let last = imports.last().expect("non-empty imports");
    let range = ElementRange::new(
        first.range.start_line,
        first.range.start_col,
        last.range.end_line,
        last.range.end_col,
    );
    let mut element = Element::new(ElementKind::Import, "", range);
    element.content = slice(source, index, &range).to_string();
    element.additional_data.insert(
        "statements".to_string(),
        Value::from(imports.len()),
    );
    Some(element)
}

#[cfg(test)]
mod test {
    use super::*;
    use codehem_core::ElementKind;

    const SRC: &str = "\
import os
import sys

class C:
    x = 1

    def f(self):
        return 1
";

    fn raw(kind: ElementKind, name: &str, range: ElementRange) -> RawElement {
        RawElement::new(kind, name, range)
    }

    #[test]
    fn nests_members_under_their_class() {
        let index = LineIndex::new(SRC);
        let raws = vec![
            raw(ElementKind::Class, "C", ElementRange::new(4, 1, 8, 17)),
            raw(ElementKind::StaticProperty, "x", ElementRange::new(5, 5, 5, 10)),
            raw(ElementKind::Method, "f", ElementRange::new(7, 5, 8, 17)),
        ];
        let tree = fold(SRC, &index, raws);
        let class = tree
            .elements
            .iter()
            .find(|e| e.kind == ElementKind::Class)
            .unwrap();
        let kinds: Vec<_> = class.children.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, [ElementKind::StaticProperty, ElementKind::Method]);
        assert_eq!(class.children[1].parent_name.as_deref(), Some("C"));
    }

    #[test]
    fn imports_fold_into_one_synthetic_element() {
        let index = LineIndex::new(SRC);
        let raws = vec![
            raw(ElementKind::Import, "", ElementRange::new(1, 1, 1, 10)),
            raw(ElementKind::Import, "", ElementRange::new(2, 1, 2, 11)),
        ];
        let tree = fold(SRC, &index, raws);
        let imports = tree.imports().unwrap();
        assert_eq!(imports.content, "import os\nimport sys");
        assert_eq!(imports.range.start_line, 1);
        assert_eq!(imports.range.end_line, 2);
    }

    #[test]
    fn content_matches_source_slice() {
        let index = LineIndex::new(SRC);
        let raws = vec![raw(ElementKind::Method, "f", ElementRange::new(7, 5, 8, 17))];
        let tree = fold(SRC, &index, raws);
        let method = &tree.elements[0];
        assert_eq!(method.content, "def f(self):\n        return 1");
    }
}
