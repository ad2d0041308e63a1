// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Element Model
//!
//! Typed, ranged pieces of source code. Extraction produces an [`ElementTree`]
//! per file: a forest of [`Element`]s in declaration order, each owning its
//! children top-down. Parents are referenced by name only (`parent_name`),
//! never by pointer, so trees serialize cleanly and carry no cycles.
//!
//! Elements are immutable snapshots of one parse. Any patch applied to the
//! file invalidates every element previously derived from it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Closed enumeration of element kinds.
///
/// `MetaElement` is reserved for synthetic grouping nodes that are not backed
/// by a single syntax node; the only synthetic element the built-in plug-ins
/// emit today is the folded imports element, which uses `Import`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Class,
    Interface,
    Function,
    Method,
    Property,
    PropertyGetter,
    PropertySetter,
    StaticProperty,
    Import,
    TypeAlias,
    Enum,
    Namespace,
    Decorator,
    Parameter,
    ReturnValue,
    MetaElement,
}

impl ElementKind {
    /// The snake_case name used in serialized trees and path kind tags.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Function => "function",
            Self::Method => "method",
            Self::Property => "property",
            Self::PropertyGetter => "property_getter",
            Self::PropertySetter => "property_setter",
            Self::StaticProperty => "static_property",
            Self::Import => "import",
            Self::TypeAlias => "type_alias",
            Self::Enum => "enum",
            Self::Namespace => "namespace",
            Self::Decorator => "decorator",
            Self::Parameter => "parameter",
            Self::ReturnValue => "return_value",
            Self::MetaElement => "meta_element",
        }
    }

    /// Kinds that carry a body suite/block (candidates for `[body]` ranges).
    #[must_use]
    pub const fn has_body(self) -> bool {
        matches!(
            self,
            Self::Function
                | Self::Method
                | Self::PropertyGetter
                | Self::PropertySetter
                | Self::Property
                | Self::StaticProperty
        )
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "class" => Self::Class,
            "interface" => Self::Interface,
            "function" => Self::Function,
            "method" => Self::Method,
            "property" => Self::Property,
            "property_getter" => Self::PropertyGetter,
            "property_setter" => Self::PropertySetter,
            "static_property" => Self::StaticProperty,
            "import" | "imports" => Self::Import,
            "type_alias" => Self::TypeAlias,
            "enum" => Self::Enum,
            "namespace" => Self::Namespace,
            "decorator" => Self::Decorator,
            "parameter" => Self::Parameter,
            "return_value" => Self::ReturnValue,
            "meta_element" => Self::MetaElement,
            other => return Err(format!("unknown element kind `{other}`")),
        })
    }
}

/// A 1-based, line-inclusive source range.
///
/// `start_col` is the column of the first byte; `end_col` points one past the
/// final byte, so the covered byte span is `[start, end)` once mapped through
/// a [`crate::LineIndex`]. Columns count bytes, not characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRange {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl ElementRange {
    #[must_use]
    pub const fn new(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Number of lines the range touches (inclusive).
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }

    /// True when `other` lies fully inside `self`.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        (self.start_line, self.start_col) <= (other.start_line, other.start_col)
            && (other.end_line, other.end_col) <= (self.end_line, self.end_col)
    }

    /// True when the two ranges share no position.
    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        (self.end_line, self.end_col) <= (other.start_line, other.start_col)
            || (other.end_line, other.end_col) <= (self.start_line, self.start_col)
    }
}

/// A typed, ranged piece of source with children and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementKind,
    /// Identifier. Empty for the synthetic imports element.
    pub name: String,
    /// Byte-exact source slice the element occupies (decorators excluded).
    pub content: String,
    pub range: ElementRange,
    /// Name of the enclosing container element, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    /// Type annotation for properties and parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    /// Decorators preceding the element, in source order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub decorators: Vec<Element>,
    /// Child elements in declaration order: members of a class, parameters
    /// and return value of a callable.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<Element>,
    /// For callables: the suite/block interior. For properties: the
    /// initializer expression. `None` on kinds without a body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_range: Option<ElementRange>,
    /// Free-form bag: default values, `static` flags, enum members, import
    /// module lists.
    #[serde(skip_serializing_if = "Map::is_empty", default)]
    pub additional_data: Map<String, Value>,
}

impl Element {
    /// A bare element with the given kind, name and range. Content and the
    /// optional attributes are filled in by the extractors.
    #[must_use]
    pub fn new(kind: ElementKind, name: impl Into<String>, range: ElementRange) -> Self {
        Self {
            kind,
            name: name.into(),
            content: String::new(),
            range,
            parent_name: None,
            value_type: None,
            decorators: Vec::new(),
            children: Vec::new(),
            body_range: None,
            additional_data: Map::new(),
        }
    }

    /// The range widened to include attached decorator lines, used by
    /// `include_extra` lookups. Equals `range` when there are no decorators.
    #[must_use]
    pub fn range_with_decorators(&self) -> ElementRange {
        let Some(first) = self.decorators.first() else {
            return self.range;
        };
        ElementRange {
            start_line: first.range.start_line.min(self.range.start_line),
            start_col: if first.range.start_line < self.range.start_line {
                first.range.start_col
            } else {
                self.range.start_col.min(first.range.start_col)
            },
            ..self.range
        }
    }

    /// Depth-first iterator over this element and all descendants.
    pub fn walk(&self) -> impl Iterator<Item = &Element> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// The element forest extracted from one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementTree {
    /// Top-level elements in declaration order.
    pub elements: Vec<Element>,
}

impl ElementTree {
    #[must_use]
    pub const fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    /// Depth-first iterator over every element in the tree.
    pub fn walk(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().flat_map(Element::walk)
    }

    /// The synthetic imports element, if the file has any imports.
    #[must_use]
    pub fn imports(&self) -> Option<&Element> {
        self.elements.iter().find(|e| e.kind == ElementKind::Import)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [
            ElementKind::Class,
            ElementKind::PropertyGetter,
            ElementKind::StaticProperty,
            ElementKind::ReturnValue,
        ] {
            assert_eq!(kind.as_str().parse::<ElementKind>().unwrap(), kind);
        }
        assert!("classs".parse::<ElementKind>().is_err());
    }

    #[test]
    fn range_containment_and_disjointness() {
        let outer = ElementRange::new(1, 1, 10, 1);
        let inner = ElementRange::new(2, 5, 3, 9);
        let after = ElementRange::new(10, 1, 12, 1);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(inner.is_disjoint(&after));
        assert!(!outer.is_disjoint(&inner));
    }

    #[test]
    fn decorated_range_extends_upwards() {
        let mut el = Element::new(ElementKind::Method, "f", ElementRange::new(3, 5, 5, 1));
        el.decorators.push(Element::new(
            ElementKind::Decorator,
            "property",
            ElementRange::new(2, 5, 2, 15),
        ));
        let extended = el.range_with_decorators();
        assert_eq!(extended.start_line, 2);
        assert_eq!(extended.end_line, 5);
    }

    #[test]
    fn walk_visits_children_in_order() {
        let mut class = Element::new(ElementKind::Class, "C", ElementRange::new(1, 1, 9, 1));
        class
            .children
            .push(Element::new(ElementKind::Method, "a", ElementRange::new(2, 5, 3, 1)));
        class
            .children
            .push(Element::new(ElementKind::Method, "b", ElementRange::new(4, 5, 5, 1)));
        let tree = ElementTree::new(vec![class]);
        let names: Vec<_> = tree.walk().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["C", "a", "b"]);
    }
}
