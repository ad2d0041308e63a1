// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! Structural invariants of extraction, checked over richer fixtures for
//! both families: byte-exact content slices, disjoint sibling ranges,
//! parent-contains-child, and stable child ordering.

use codehem_core::{Element, ElementKind, ElementTree, LineIndex};
use codehem_languages::service::LanguageService;
use codehem_languages::{python::PythonService, typescript::TypeScriptService};
use codehem_parse::ParserFacade;

const PYTHON_FIXTURE: &str = r#"
import os
from typing import Optional

class Store:
    backend: str = "disk"

    def __init__(self, root):
        self.root = root

    @property
    def size(self):
        return len(self._items)

    @size.setter
    def size(self, value):
        raise AttributeError("read-only")

    @staticmethod
    def default():
        return Store("/tmp")

class Color(Enum):
    RED = 1
    BLUE = 2

def helper(a: int, b: int = 2) -> int:
    return a + b
"#;

const TYPESCRIPT_FIXTURE: &str = r#"
import { readFile } from 'fs';

enum Level { Low, High = 5 }

interface Options {
  root: string;
}

type Result = string | null;

@Injectable()
class Store {
  private root: string;
  static instances = 0;

  constructor(root: string) {
    this.root = root;
  }

  get size(): number {
    return this.items.length;
  }

  load(name: string): Promise<Result> {
    return read(this.root, name);
  }
}

namespace Util {
  export function join(a: string, b: string): string {
    return a + '/' + b;
  }
}

const shortcut = (x: number) => x * 2;
"#;

fn extract(service: &dyn LanguageService, source: &str) -> ElementTree {
    let facade = ParserFacade::default();
    let parsed = facade
        .parse(service.code(), service.grammar(), source.as_bytes())
        .unwrap();
    service.build_elements(source, &parsed.tree).unwrap()
}

fn fixtures() -> Vec<(&'static str, ElementTree)> {
    vec![
        (
            PYTHON_FIXTURE,
            extract(&PythonService::new().unwrap(), PYTHON_FIXTURE),
        ),
        (
            TYPESCRIPT_FIXTURE,
            extract(&TypeScriptService::new().unwrap(), TYPESCRIPT_FIXTURE),
        ),
    ]
}

fn assert_invariants(source: &str, elements: &[Element]) {
    let index = LineIndex::new(source);
    for (i, element) in elements.iter().enumerate() {
        assert_eq!(
            element.content,
            &source[index.span(&element.range)],
            "content of `{}` is not the byte-exact slice",
            element.name
        );
        for decorator in &element.decorators {
            assert_eq!(decorator.content, &source[index.span(&decorator.range)]);
        }
        for sibling in &elements[i + 1..] {
            assert!(
                element.range.is_disjoint(&sibling.range),
                "siblings `{}` and `{}` overlap",
                element.name,
                sibling.name
            );
        }
        for child in &element.children {
            assert!(
                element.range.contains(&child.range),
                "`{}` does not contain child `{}`",
                element.name,
                child.name
            );
        }
        assert_invariants(source, &element.children);
    }
}

#[test]
fn slices_disjointness_and_containment_hold() {
    for (source, tree) in fixtures() {
        assert_invariants(source, &tree.elements);
    }
}

#[test]
fn children_are_in_declaration_order() {
    for (_, tree) in fixtures() {
        for element in tree.walk() {
            let positions: Vec<_> = element
                .children
                .iter()
                .map(|c| (c.range.start_line, c.range.start_col))
                .collect();
            let mut sorted = positions.clone();
            sorted.sort_unstable();
            assert_eq!(positions, sorted, "children of `{}` unordered", element.name);
        }
    }
}

#[test]
fn python_fixture_shape() {
    let tree = extract(&PythonService::new().unwrap(), PYTHON_FIXTURE);
    let top: Vec<_> = tree
        .elements
        .iter()
        .map(|e| (e.kind, e.name.as_str()))
        .collect();
    assert_eq!(
        top,
        [
            (ElementKind::Import, ""),
            (ElementKind::Class, "Store"),
            (ElementKind::Enum, "Color"),
            (ElementKind::Function, "helper"),
        ]
    );
    let store = &tree.elements[1];
    let members: Vec<_> = store
        .children
        .iter()
        .map(|c| (c.kind, c.name.as_str()))
        .collect();
    assert_eq!(
        members,
        [
            (ElementKind::StaticProperty, "backend"),
            (ElementKind::Method, "__init__"),
            (ElementKind::PropertyGetter, "size"),
            (ElementKind::PropertySetter, "size"),
            (ElementKind::Method, "default"),
        ]
    );
    assert_eq!(
        store.children[0].value_type.as_deref(),
        Some("str"),
        "annotated class attribute keeps its type"
    );
}

#[test]
fn typescript_fixture_shape() {
    let tree = extract(&TypeScriptService::new().unwrap(), TYPESCRIPT_FIXTURE);
    let top: Vec<_> = tree
        .elements
        .iter()
        .map(|e| (e.kind, e.name.as_str()))
        .collect();
    assert_eq!(
        top,
        [
            (ElementKind::Import, ""),
            (ElementKind::Enum, "Level"),
            (ElementKind::Interface, "Options"),
            (ElementKind::TypeAlias, "Result"),
            (ElementKind::Class, "Store"),
            (ElementKind::Namespace, "Util"),
            (ElementKind::Function, "shortcut"),
        ]
    );
    let store = &tree.elements[4];
    assert_eq!(store.decorators.len(), 1);
    assert_eq!(store.decorators[0].name, "Injectable");
    let members: Vec<_> = store
        .children
        .iter()
        .map(|c| (c.kind, c.name.as_str()))
        .collect();
    assert_eq!(
        members,
        [
            (ElementKind::Property, "root"),
            (ElementKind::StaticProperty, "instances"),
            (ElementKind::Method, "constructor"),
            (ElementKind::PropertyGetter, "size"),
            (ElementKind::Method, "load"),
        ]
    );
}
