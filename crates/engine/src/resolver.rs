// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Path Resolver
//!
//! Walks an element tree along a parsed [`PathExpr`] and computes the typed
//! sub-range the caller addressed: whole element, `[def]`, `[body]` or a
//! property accessor.
//!
//! Resolution is total: a path either resolves to a concrete range or to
//! `None`, never to a partial match. Name collisions resolve by kind
//! preference (method over property over static property over nested class);
//! same-kind duplicates resolve to the last declaration in source order. Both
//! cases set the `ambiguous` flag on the result instead of failing.

use codehem_core::hash::fragment_hash;
use codehem_core::{Element, ElementKind, ElementRange, ElementTree, LineIndex, PathExpr, PathTag, Result};

/// Kind preference for untagged name lookups, most preferred first.
const KIND_PREFERENCE: &[ElementKind] = &[
    ElementKind::Method,
    ElementKind::Property,
    ElementKind::PropertyGetter,
    ElementKind::PropertySetter,
    ElementKind::StaticProperty,
    ElementKind::Class,
    ElementKind::Interface,
    ElementKind::Function,
    ElementKind::Enum,
    ElementKind::Namespace,
    ElementKind::TypeAlias,
    ElementKind::Import,
];

/// A successful path resolution.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub element: Element,
    /// The sub-range the path addressed (whole element, body, ...).
    pub effective_range: ElementRange,
    /// Byte-exact content of `effective_range`.
    pub content: String,
    /// Fragment hash of `content`.
    pub hash: String,
    /// Set when the path matched more than one candidate along the walk.
    pub ambiguous: bool,
}

/// Resolve `path` against `tree`. `Ok(None)` means the path walked to nothing
/// addressable (unknown name, or `[body]` on a body-less kind).
pub fn resolve(
    tree: &ElementTree,
    source: &str,
    index: &LineIndex,
    path: &PathExpr,
    include_extra: bool,
) -> Result<Option<Resolved>> {
    let mut ambiguous = false;
    let mut level: &[Element] = &tree.elements;
    let mut current: Option<&Element> = None;

    let last = path.segments.len() - 1;
    for (position, segment) in path.segments.iter().enumerate() {
        let tag_kind = if position == last {
            match path.tag {
                Some(PathTag::Kind(kind)) => Some(kind),
                _ => None,
            }
        } else {
            None
        };
        let Some(found) = lookup(level, segment, tag_kind, &mut ambiguous) else {
            return Ok(None);
        };
        level = &found.children;
        current = Some(found);
    }

    let element = current.expect("non-empty path walked");
    let effective_range = match path.tag {
        Some(PathTag::Body) => match element.body_range {
            Some(range) => range,
            None => return Ok(None),
        },
        Some(PathTag::Def | PathTag::Kind(_)) | None => {
            if include_extra {
                element.range_with_decorators()
            } else {
                element.range
            }
        }
    };

    let content = source[index.span(&effective_range)].to_string();
    let hash = fragment_hash(&content);
    Ok(Some(Resolved {
        element: element.clone(),
        effective_range,
        content,
        hash,
        ambiguous,
    }))
}

/// Find `name` among `level`, honoring an exact kind filter or the untagged
/// preference order. Same-kind duplicates yield the last declaration.
fn lookup<'e>(
    level: &'e [Element],
    name: &str,
    kind: Option<ElementKind>,
    ambiguous: &mut bool,
) -> Option<&'e Element> {
    let matches_name = |element: &Element| {
        element.name == name || (element.kind == ElementKind::Import && name == "imports")
    };
    let candidates: Vec<&Element> = match kind {
        Some(kind) => level
            .iter()
            .filter(|e| matches_name(e) && e.kind == kind)
            .collect(),
        None => level.iter().filter(|e| matches_name(e)).collect(),
    };

    match candidates.len() {
        0 => None,
        1 => Some(candidates[0]),
        _ => {
            *ambiguous = true;
            let winning_kind = KIND_PREFERENCE
                .iter()
                .copied()
                .find(|preferred| candidates.iter().any(|c| c.kind == *preferred))
                .unwrap_or(candidates[0].kind);
            candidates
                .into_iter()
                .filter(|c| c.kind == winning_kind)
                .next_back()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use codehem_core::Element;

    fn element(kind: ElementKind, name: &str, start_line: usize, end_line: usize) -> Element {
        let mut el = Element::new(
            kind,
            name,
            ElementRange::new(start_line, 1, end_line, 10),
        );
        el.content = format!("<{name}>");
        el
    }

    fn sample_source() -> String {
        // 30 lines of 9 columns so test ranges always slice.
        "abcdefgh\n".repeat(30)
    }

    #[test]
    fn walks_nested_segments() {
        let mut class = element(ElementKind::Class, "C", 1, 10);
        class.children.push(element(ElementKind::Method, "f", 2, 3));
        let tree = ElementTree::new(vec![class]);
        let source = sample_source();
        let index = LineIndex::new(&source);

        let path = PathExpr::parse("C.f").unwrap();
        let resolved = resolve(&tree, &source, &index, &path, false)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.element.name, "f");
        assert!(!resolved.ambiguous);

        let missing = PathExpr::parse("C.g").unwrap();
        assert!(resolve(&tree, &source, &index, &missing, false)
            .unwrap()
            .is_none());
    }

    #[test]
    fn duplicate_methods_resolve_to_the_last_declared() {
        let mut class = element(ElementKind::Class, "C", 1, 20);
        class.children.push(element(ElementKind::Method, "dup", 2, 4));
        class.children.push(element(ElementKind::Method, "dup", 6, 8));
        let tree = ElementTree::new(vec![class]);
        let source = sample_source();
        let index = LineIndex::new(&source);

        let path = PathExpr::parse("C.dup").unwrap();
        let resolved = resolve(&tree, &source, &index, &path, false)
            .unwrap()
            .unwrap();
        assert!(resolved.ambiguous);
        assert_eq!(resolved.element.range.start_line, 6);

        let def = PathExpr::parse("C.dup[def]").unwrap();
        let resolved = resolve(&tree, &source, &index, &def, false)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.effective_range.start_line, 6);
    }

    #[test]
    fn kind_preference_picks_method_over_property() {
        let mut class = element(ElementKind::Class, "C", 1, 20);
        class
            .children
            .push(element(ElementKind::StaticProperty, "x", 2, 2));
        class.children.push(element(ElementKind::Method, "x", 4, 6));
        let tree = ElementTree::new(vec![class]);
        let source = sample_source();
        let index = LineIndex::new(&source);

        let path = PathExpr::parse("C.x").unwrap();
        let resolved = resolve(&tree, &source, &index, &path, false)
            .unwrap()
            .unwrap();
        assert!(resolved.ambiguous);
        assert_eq!(resolved.element.kind, ElementKind::Method);

        let tagged = PathExpr::parse("C.x[static_property]").unwrap();
        let resolved = resolve(&tree, &source, &index, &tagged, false)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.element.kind, ElementKind::StaticProperty);
        assert!(!resolved.ambiguous);
    }

    #[test]
    fn accessor_tags_select_the_accessor_element() {
        let mut class = element(ElementKind::Class, "C", 1, 20);
        class
            .children
            .push(element(ElementKind::PropertyGetter, "v", 2, 4));
        class
            .children
            .push(element(ElementKind::PropertySetter, "v", 6, 8));
        let tree = ElementTree::new(vec![class]);
        let source = sample_source();
        let index = LineIndex::new(&source);

        let setter = PathExpr::parse("C.v[property_setter]").unwrap();
        let resolved = resolve(&tree, &source, &index, &setter, false)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.element.kind, ElementKind::PropertySetter);
        assert_eq!(resolved.element.range.start_line, 6);
    }

    #[test]
    fn body_on_bodyless_kind_is_none() {
        let tree = ElementTree::new(vec![element(ElementKind::Class, "C", 1, 5)]);
        let source = sample_source();
        let index = LineIndex::new(&source);
        let path = PathExpr::parse("C[body]").unwrap();
        assert!(resolve(&tree, &source, &index, &path, false)
            .unwrap()
            .is_none());
    }

    #[test]
    fn imports_path_matches_the_synthetic_element() {
        let mut imports = element(ElementKind::Import, "", 1, 2);
        imports.name = String::new();
        let tree = ElementTree::new(vec![imports]);
        let source = sample_source();
        let index = LineIndex::new(&source);
        let path = PathExpr::parse("imports").unwrap();
        let resolved = resolve(&tree, &source, &index, &path, false)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.element.kind, ElementKind::Import);
    }
}
