// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # TypeScript Plug-in
//!
//! Brace-family reference plug-in. JavaScript registers as an alias of this
//! service: the TypeScript grammar is a superset that parses plain JS, which
//! keeps both languages behind one extraction pipeline.

mod extractor;
pub mod queries;

use crate::postprocess;
use crate::service::{FormatterFamily, LanguageService, ManipulatorConfig};
use codehem_core::{ElementTree, Error, LineIndex, Result};
use tree_sitter::{Language, Query, Tree};

pub(crate) struct TypeScriptQueries {
    pub class: Query,
    pub interface: Query,
    pub function: Query,
    pub arrow_function: Query,
    pub method: Query,
    pub field: Query,
    pub import: Query,
    pub type_alias: Query,
    pub enum_: Query,
    pub namespace: Query,
}

pub struct TypeScriptService {
    grammar: Language,
    pub(crate) queries: TypeScriptQueries,
}

impl TypeScriptService {
    pub fn new() -> Result<Self> {
        let grammar: Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
        let compile = |name: &str, text: &str| {
            Query::new(&grammar, text).map_err(|e| {
                Error::plugin("typescript", format!("query `{name}` failed to compile: {e}"))
            })
        };
        let queries = TypeScriptQueries {
            class: compile("class", queries::CLASS)?,
            interface: compile("interface", queries::INTERFACE)?,
            function: compile("function", queries::FUNCTION)?,
            arrow_function: compile("arrow_function", queries::ARROW_FUNCTION)?,
            method: compile("method", queries::METHOD)?,
            field: compile("field", queries::FIELD)?,
            import: compile("import", queries::IMPORT)?,
            type_alias: compile("type_alias", queries::TYPE_ALIAS)?,
            enum_: compile("enum", queries::ENUM)?,
            namespace: compile("namespace", queries::NAMESPACE)?,
        };
        Ok(Self { grammar, queries })
    }
}

impl LanguageService for TypeScriptService {
    fn code(&self) -> &'static str {
        "typescript"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["javascript"]
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["ts", "mts", "cts", "js", "mjs", "cjs"]
    }

    fn grammar(&self) -> &Language {
        &self.grammar
    }

    fn formatter_family(&self) -> FormatterFamily {
        FormatterFamily::Brace
    }

    fn manipulator_config(&self) -> ManipulatorConfig {
        ManipulatorConfig {
            block_token: "{",
            indent_unit: "  ",
        }
    }

    fn sniff(&self, source: &str) -> u32 {
        let mut score = 0;
        for line in source.lines().take(40) {
            let trimmed = line.trim_start();
            if trimmed.starts_with("import ") && (trimmed.contains(" from ") || trimmed.contains('{'))
            {
                score += 3;
            } else if trimmed.starts_with("function ")
                || trimmed.starts_with("interface ")
                || trimmed.starts_with("enum ")
                || trimmed.starts_with("namespace ")
            {
                score += 3;
            } else if trimmed.starts_with("const ")
                || trimmed.starts_with("let ")
                || trimmed.starts_with("export ")
            {
                score += 2;
            } else if trimmed.contains("=>") {
                score += 2;
            }
        }
        score
    }

    fn build_elements(&self, source: &str, tree: &Tree) -> Result<ElementTree> {
        let index = LineIndex::new(source);
        let raws = extractor::extract(self, source, &index, tree)?;
        Ok(postprocess::fold(source, &index, raws))
    }
}
