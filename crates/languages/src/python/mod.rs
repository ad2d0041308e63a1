// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Python Plug-in
//!
//! Indent-family reference plug-in: `:` block marker, 4-space indent unit,
//! extraction for classes, functions, methods, property accessors, class
//! attributes, imports, enums (classes deriving `Enum`) and PEP 695 type
//! aliases.

mod extractor;
pub mod queries;

use crate::postprocess;
use crate::service::{FormatterFamily, LanguageService, ManipulatorConfig};
use codehem_core::{ElementTree, Error, LineIndex, Result};
use tree_sitter::{Language, Query, Tree};

pub(crate) struct PythonQueries {
    pub class: Query,
    pub function: Query,
    pub class_field: Query,
    pub import: Query,
    pub type_alias: Query,
}

pub struct PythonService {
    grammar: Language,
    pub(crate) queries: PythonQueries,
}

impl PythonService {
    pub fn new() -> Result<Self> {
        let grammar: Language = tree_sitter_python::LANGUAGE.into();
        let compile = |name: &str, text: &str| {
            Query::new(&grammar, text).map_err(|e| {
                Error::plugin("python", format!("query `{name}` failed to compile: {e}"))
            })
        };
        let queries = PythonQueries {
            class: compile("class", queries::CLASS)?,
            function: compile("function", queries::FUNCTION)?,
            class_field: compile("class_field", queries::CLASS_FIELD)?,
            import: compile("import", queries::IMPORT)?,
            type_alias: compile("type_alias", queries::TYPE_ALIAS)?,
        };
        Ok(Self { grammar, queries })
    }
}

impl LanguageService for PythonService {
    fn code(&self) -> &'static str {
        "python"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn grammar(&self) -> &Language {
        &self.grammar
    }

    fn formatter_family(&self) -> FormatterFamily {
        FormatterFamily::Indent
    }

    fn manipulator_config(&self) -> ManipulatorConfig {
        ManipulatorConfig {
            block_token: ":",
            indent_unit: "    ",
        }
    }

    fn sniff(&self, source: &str) -> u32 {
        let mut score = 0;
        let mut lines = source.lines();
        if let Some(first) = lines.next() {
            if first.starts_with("#!") && first.contains("python") {
                score += 10;
            } else {
                score += line_score(first);
            }
        }
        for line in lines.take(40) {
            score += line_score(line);
        }
        score
    }

    fn build_elements(&self, source: &str, tree: &Tree) -> Result<ElementTree> {
        let index = LineIndex::new(source);
        let raws = extractor::extract(self, source, &index, tree)?;
        Ok(postprocess::fold(source, &index, raws))
    }
}

fn line_score(line: &str) -> u32 {
    let trimmed = line.trim_start();
    if (trimmed.starts_with("def ") || trimmed.starts_with("class ")) && trimmed.ends_with(':') {
        3
    } else if trimmed.starts_with("from ") && trimmed.contains(" import ") {
        3
    } else if trimmed.starts_with("import ") {
        2
    } else if trimmed.starts_with("elif ") || trimmed == "pass" {
        2
    } else {
        0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use codehem_core::ElementKind;
    use codehem_parse::ParserFacade;

    fn extract(source: &str) -> ElementTree {
        let service = PythonService::new().unwrap();
        let facade = ParserFacade::default();
        let parsed = facade
            .parse("python", service.grammar(), source.as_bytes())
            .unwrap();
        service.build_elements(source, &parsed.tree).unwrap()
    }

    #[test]
    fn extracts_class_with_method_and_attribute() {
        let tree = extract(
            "class C:\n    x = 1\n\n    def f(self):\n        return 1\n",
        );
        let class = &tree.elements[0];
        assert_eq!(class.kind, ElementKind::Class);
        assert_eq!(class.name, "C");
        let kinds: Vec<_> = class.children.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, [ElementKind::StaticProperty, ElementKind::Method]);
        let method = &class.children[1];
        assert_eq!(method.parent_name.as_deref(), Some("C"));
        assert_eq!(method.content, "def f(self):\n        return 1");
    }

    #[test]
    fn method_body_range_covers_the_suite() {
        let source = "class C:\n    def f(self):\n        return 1\n";
        let tree = extract(source);
        let method = &tree.elements[0].children[0];
        let body = method.body_range.unwrap();
        assert_eq!((body.start_line, body.end_line), (3, 3));
        let index = LineIndex::new(source);
        assert_eq!(&source[index.span(&body)], "return 1");
    }

    #[test]
    fn decorators_are_excluded_from_the_default_range() {
        let source = "class C:\n    @staticmethod\n    def f():\n        return 1\n";
        let tree = extract(source);
        let method = &tree.elements[0].children[0];
        assert_eq!(method.range.start_line, 3);
        assert_eq!(method.decorators.len(), 1);
        assert_eq!(method.decorators[0].name, "staticmethod");
        assert_eq!(method.decorators[0].content, "@staticmethod");
        assert_eq!(method.range_with_decorators().start_line, 2);
        assert_eq!(method.additional_data["static"], true);
    }

    #[test]
    fn property_accessors_pair_as_siblings() {
        let source = "\
class C:
    @property
    def v(self):
        return self._v

    @v.setter
    def v(self, value):
        self._v = value
";
        let tree = extract(source);
        let class = &tree.elements[0];
        let kinds: Vec<_> = class
            .children
            .iter()
            .map(|c| (c.kind, c.name.as_str()))
            .collect();
        assert_eq!(
            kinds,
            [
                (ElementKind::PropertyGetter, "v"),
                (ElementKind::PropertySetter, "v")
            ]
        );
    }

    #[test]
    fn imports_fold_and_local_defs_are_skipped() {
        let source = "\
import os
from sys import path

def outer():
    def inner():
        pass
    return inner
";
        let tree = extract(source);
        let imports = tree.imports().unwrap();
        assert_eq!(imports.content, "import os\nfrom sys import path");
        let functions: Vec<_> = tree
            .elements
            .iter()
            .filter(|e| e.kind == ElementKind::Function)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(functions, ["outer"]);
    }

    #[test]
    fn enum_classes_carry_members() {
        let source = "\
from enum import Enum

class Color(Enum):
    RED = 1
    GREEN = 2
";
        let tree = extract(source);
        let color = tree
            .elements
            .iter()
            .find(|e| e.kind == ElementKind::Enum)
            .unwrap();
        assert_eq!(color.name, "Color");
        let members: Vec<_> = color.additional_data["members"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(members, ["RED", "GREEN"]);
    }

    #[test]
    fn parameters_and_return_type_become_children() {
        let source = "def f(a, b: int, c: str = \"x\") -> bool:\n    return True\n";
        let tree = extract(source);
        let func = &tree.elements[0];
        let params: Vec<_> = func
            .children
            .iter()
            .filter(|c| c.kind == ElementKind::Parameter)
            .collect();
        assert_eq!(params.len(), 3);
        assert_eq!(params[1].name, "b");
        assert_eq!(params[1].value_type.as_deref(), Some("int"));
        assert_eq!(params[2].additional_data["default"], "\"x\"");
        let ret = func
            .children
            .iter()
            .find(|c| c.kind == ElementKind::ReturnValue)
            .unwrap();
        assert_eq!(ret.value_type.as_deref(), Some("bool"));
    }

    #[test]
    fn every_content_is_a_byte_exact_slice() {
        let source = "\
import os

class C:
    x: int = 1

    @property
    def v(self):
        return self.x

def free(a=1):
    return a
";
        let tree = extract(source);
        let index = LineIndex::new(source);
        for element in tree.walk() {
            assert_eq!(
                element.content,
                &source[index.span(&element.range)],
                "content mismatch for {}",
                element.name
            );
        }
    }

    #[test]
    fn sibling_ranges_are_disjoint() {
        let source = "class A:\n    def f(self):\n        pass\n\nclass B:\n    pass\n";
        let tree = extract(source);
        for (i, a) in tree.elements.iter().enumerate() {
            for b in &tree.elements[i + 1..] {
                assert!(a.range.is_disjoint(&b.range));
            }
        }
    }
}
