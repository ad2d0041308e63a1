// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Builder Helpers
//!
//! Synthesize new functions, classes and methods from structured input and
//! hand them to the manipulator. Rendering queries the target language's
//! family (block token, indent unit), so the same builder produces
//! `def f():` suites for Python and `f() { ... }` blocks for TypeScript.

use crate::manipulate::{PatchMode, PatchRequest, PatchResult, PatchStatus};
use crate::ops::Engine;
use codehem_core::hash::fragment_hash;
use codehem_core::{ElementKind, Error, LineIndex, Result};
use codehem_languages::{FormatterFamily, LanguageService};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ParamSpec {
    pub name: String,
    pub value_type: Option<String>,
    pub default_value: Option<String>,
}

impl ParamSpec {
    fn render(&self, family: FormatterFamily) -> String {
        let mut out = self.name.clone();
        if let Some(ty) = &self.value_type {
            out.push_str(": ");
            out.push_str(ty);
        }
        if let Some(default) = &self.default_value {
            match family {
                FormatterFamily::Indent if self.value_type.is_some() => {
                    out.push_str(" = ");
                    out.push_str(default);
                }
                FormatterFamily::Indent => {
                    out.push('=');
                    out.push_str(default);
                }
                FormatterFamily::Brace => {
                    out.push_str(" = ");
                    out.push_str(default);
                }
            }
        }
        out
    }
}

/// Common structured input for callables.
#[derive(Debug, Clone, Default)]
struct CallableSpec {
    name: String,
    params: Vec<ParamSpec>,
    return_type: Option<String>,
    body: Vec<String>,
    decorators: Vec<String>,
}

impl CallableSpec {
    fn signature(&self, family: FormatterFamily, keyword: Option<&str>) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.render(family)).collect();
        let params = params.join(", ");
        match family {
            FormatterFamily::Indent => {
                let ret = self
                    .return_type
                    .as_ref()
                    .map(|t| format!(" -> {t}"))
                    .unwrap_or_default();
                format!("def {}({params}){ret}:", self.name)
            }
            FormatterFamily::Brace => {
                let ret = self
                    .return_type
                    .as_ref()
                    .map(|t| format!(": {t}"))
                    .unwrap_or_default();
                let keyword = keyword.map(|k| format!("{k} ")).unwrap_or_default();
                format!("{keyword}{}({params}){ret} {{", self.name)
            }
        }
    }

    fn render(&self, service: &dyn LanguageService, keyword: Option<&str>) -> String {
        let family = service.formatter_family();
        let unit = service.manipulator_config().indent_unit;
        let mut out = String::new();
        for decorator in &self.decorators {
            out.push('@');
            out.push_str(decorator.trim_start_matches('@'));
            out.push('\n');
        }
        out.push_str(&self.signature(family, keyword));
        out.push('\n');
        let pass_line = [String::from("pass")];
        let body: &[String] = if self.body.is_empty() {
            match family {
                FormatterFamily::Indent => &pass_line,
                FormatterFamily::Brace => &[],
            }
        } else {
            &self.body
        };
        for line in body {
            if line.trim().is_empty() {
                out.push('\n');
                continue;
            }
            out.push_str(unit);
            out.push_str(line);
            out.push('\n');
        }
        if family == FormatterFamily::Brace {
            out.push('}');
        } else {
            // Drop the trailing newline; the manipulator owns separators.
            out.pop();
        }
        out
    }
}

macro_rules! callable_setters {
    () => {
        #[must_use]
        pub fn param(mut self, name: impl Into<String>) -> Self {
            self.spec.params.push(ParamSpec {
                name: name.into(),
                ..ParamSpec::default()
            });
            self
        }

        #[must_use]
        pub fn typed_param(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
            self.spec.params.push(ParamSpec {
                name: name.into(),
                value_type: Some(ty.into()),
                ..ParamSpec::default()
            });
            self
        }

        #[must_use]
        pub fn returns(mut self, ty: impl Into<String>) -> Self {
            self.spec.return_type = Some(ty.into());
            self
        }

        #[must_use]
        pub fn line(mut self, body_line: impl Into<String>) -> Self {
            self.spec.body.push(body_line.into());
            self
        }

        #[must_use]
        pub fn decorator(mut self, decorator: impl Into<String>) -> Self {
            self.spec.decorators.push(decorator.into());
            self
        }
    };
}

/// Builds a new top-level function.
#[derive(Debug, Clone)]
pub struct FunctionBuilder {
    spec: CallableSpec,
}

impl FunctionBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            spec: CallableSpec {
                name: name.into(),
                ..CallableSpec::default()
            },
        }
    }

    callable_setters!();

    /// The synthesized source fragment.
    pub fn render(&self, engine: &Engine, language_code: &str) -> Result<String> {
        let service = engine.registry().get(language_code)?;
        let keyword = brace_keyword(&service);
        Ok(self.spec.render(service.as_ref(), keyword))
    }

    /// Render and append after the last top-level element of `source`.
    pub fn apply(&self, engine: &Engine, source: &str, language_code: &str) -> Result<PatchResult> {
        let fragment = self.render(engine, language_code)?;
        append_top_level(engine, source, language_code, &fragment)
    }
}

/// Builds a new method inside an existing class.
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    parent_class: String,
    spec: CallableSpec,
}

impl MethodBuilder {
    #[must_use]
    pub fn new(parent_class: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            parent_class: parent_class.into(),
            spec: CallableSpec {
                name: name.into(),
                ..CallableSpec::default()
            },
        }
    }

    callable_setters!();

    pub fn render(&self, engine: &Engine, language_code: &str) -> Result<String> {
        let service = engine.registry().get(language_code)?;
        // Methods never take the `function` keyword in the brace family.
        Ok(self.spec.render(service.as_ref(), None))
    }

    /// Render and append as the last member of the parent class.
    pub fn apply(&self, engine: &Engine, source: &str, language_code: &str) -> Result<PatchResult> {
        let fragment = self.render(engine, language_code)?;
        let tree = engine.extract(source, language_code)?;
        let class = tree
            .elements
            .iter()
            .find(|e| {
                e.name == self.parent_class
                    && matches!(e.kind, ElementKind::Class | ElementKind::Namespace)
            })
            .ok_or_else(|| Error::not_found(self.parent_class.clone()))?;

        let last_member = class
            .children
            .iter()
            .filter(|child| {
                !matches!(child.kind, ElementKind::Parameter | ElementKind::ReturnValue)
            })
            .next_back();
        if let Some(member) = last_member {
            let request = PatchRequest::new(
                format!("{}.{}", self.parent_class, member.name),
                fragment,
                PatchMode::Append,
            );
            return engine.apply_patch(source, language_code, &request);
        }
        insert_into_empty_class(engine, source, language_code, &class.range, &fragment)
    }
}

/// Builds a new top-level class.
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    name: String,
    bases: Vec<String>,
    decorators: Vec<String>,
    body: Vec<String>,
}

impl ClassBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            decorators: Vec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.bases.push(base.into());
        self
    }

    #[must_use]
    pub fn decorator(mut self, decorator: impl Into<String>) -> Self {
        self.decorators.push(decorator.into());
        self
    }

    #[must_use]
    pub fn line(mut self, body_line: impl Into<String>) -> Self {
        self.body.push(body_line.into());
        self
    }

    pub fn render(&self, engine: &Engine, language_code: &str) -> Result<String> {
        let service = engine.registry().get(language_code)?;
        let family = service.formatter_family();
        let unit = service.manipulator_config().indent_unit;
        let mut out = String::new();
        for decorator in &self.decorators {
            out.push('@');
            out.push_str(decorator.trim_start_matches('@'));
            out.push('\n');
        }
        let bases = if self.bases.is_empty() {
            String::new()
        } else {
            match family {
                FormatterFamily::Indent => format!("({})", self.bases.join(", ")),
                FormatterFamily::Brace => format!(" extends {}", self.bases.join(", ")),
            }
        };
        match family {
            FormatterFamily::Indent => {
                out.push_str(&format!("class {}{bases}:", self.name));
                out.push('\n');
                let pass_line = [String::from("pass")];
                let body: &[String] = if self.body.is_empty() {
                    &pass_line
                } else {
                    &self.body
                };
                for line in body {
                    if line.trim().is_empty() {
                        out.push('\n');
                        continue;
                    }
                    out.push_str(unit);
                    out.push_str(line);
                    out.push('\n');
                }
                out.pop();
            }
            FormatterFamily::Brace => {
                out.push_str(&format!("class {}{bases} {{", self.name));
                out.push('\n');
                for line in &self.body {
                    if line.trim().is_empty() {
                        out.push('\n');
                        continue;
                    }
                    out.push_str(unit);
                    out.push_str(line);
                    out.push('\n');
                }
                out.push('}');
            }
        }
        Ok(out)
    }

    pub fn apply(&self, engine: &Engine, source: &str, language_code: &str) -> Result<PatchResult> {
        let fragment = self.render(engine, language_code)?;
        append_top_level(engine, source, language_code, &fragment)
    }
}

fn brace_keyword(service: &Arc<dyn LanguageService>) -> Option<&'static str> {
    match service.formatter_family() {
        FormatterFamily::Brace => Some("function"),
        FormatterFamily::Indent => None,
    }
}

/// Append a rendered fragment after the last top-level element, or to the end
/// of an element-free buffer.
fn append_top_level(
    engine: &Engine,
    source: &str,
    language_code: &str,
    fragment: &str,
) -> Result<PatchResult> {
    let tree = engine.extract(source, language_code)?;
    if let Some(last) = tree.elements.last() {
        let path = if last.kind == ElementKind::Import {
            String::from("imports")
        } else {
            last.name.clone()
        };
        let request = PatchRequest::new(path, fragment, PatchMode::Append);
        return engine.apply_patch(source, language_code, &request);
    }

    // Element-free buffer: plain concatenation.
    let mut modified = source.to_string();
    if !modified.is_empty() && !modified.ends_with('\n') {
        modified.push('\n');
    }
    modified.push_str(fragment);
    modified.push('\n');
    Ok(synthesized_result(fragment, modified))
}

/// Insert a member into a class with no members yet.
fn insert_into_empty_class(
    engine: &Engine,
    source: &str,
    language_code: &str,
    class_range: &codehem_core::ElementRange,
    fragment: &str,
) -> Result<PatchResult> {
    let service = engine.registry().get(language_code)?;
    let unit = service.manipulator_config().indent_unit;
    let index = LineIndex::new(source);
    let span = index.span(class_range);
    let class_indent = index.indent_of(class_range.start_line, source).to_string();
    let eol = index.dominant_line_ending();
    let member_indent = format!("{class_indent}{unit}");
    let indented = crate::format::normalize_fragment(fragment, &member_indent, eol);

    let mut modified = String::with_capacity(source.len() + indented.len() + 8);
    match service.formatter_family() {
        FormatterFamily::Indent => {
            // After the last line of the class suite.
            modified.push_str(&source[..span.end]);
            modified.push_str(eol);
            modified.push_str(&member_indent);
            modified.push_str(&indented);
            modified.push_str(&source[span.end..]);
        }
        FormatterFamily::Brace => {
            // Before the closing brace of the class body.
            let close = source[..span.end]
                .rfind('}')
                .ok_or_else(|| Error::validation("class body has no closing brace"))?;
            let head = source[..close].trim_end_matches([' ', '\t']);
            let needs_newline = !head.ends_with('\n');
            modified.push_str(head);
            if needs_newline {
                modified.push_str(eol);
            }
            modified.push_str(&member_indent);
            modified.push_str(&indented);
            modified.push_str(eol);
            modified.push_str(&class_indent);
            modified.push_str(&source[close..]);
        }
    }
    Ok(synthesized_result(fragment, modified))
}

fn synthesized_result(fragment: &str, modified: String) -> PatchResult {
    PatchResult {
        status: PatchStatus::Ok,
        lines_added: fragment.lines().count(),
        lines_removed: 0,
        new_hash: Some(fragment_hash(fragment)),
        modified_code: Some(modified),
        diff: None,
        ambiguous: false,
        error: None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn renders_python_function() {
        let engine = Engine::new();
        let rendered = FunctionBuilder::new("fetch")
            .typed_param("url", "str")
            .returns("bytes")
            .decorator("cache")
            .line("return download(url)")
            .render(&engine, "python")
            .unwrap();
        assert_eq!(
            rendered,
            "@cache\ndef fetch(url: str) -> bytes:\n    return download(url)"
        );
    }

    #[test]
    fn renders_typescript_function_and_method() {
        let engine = Engine::new();
        let function = FunctionBuilder::new("fetch")
            .typed_param("url", "string")
            .returns("Promise<Response>")
            .line("return get(url);")
            .render(&engine, "typescript")
            .unwrap();
        assert_eq!(
            function,
            "function fetch(url: string): Promise<Response> {\n  return get(url);\n}"
        );
        let method = MethodBuilder::new("C", "run")
            .returns("void")
            .line("this.go();")
            .render(&engine, "typescript")
            .unwrap();
        assert_eq!(method, "run(): void {\n  this.go();\n}");
    }

    #[test]
    fn empty_python_body_renders_pass() {
        let engine = Engine::new();
        let rendered = FunctionBuilder::new("noop").render(&engine, "python").unwrap();
        assert_eq!(rendered, "def noop():\n    pass");
    }

    #[test]
    fn method_builder_appends_after_the_last_member() {
        let engine = Engine::new();
        let source = "class C:\n    def f(self):\n        return 1\n";
        let result = MethodBuilder::new("C", "g")
            .param("self")
            .line("return 2")
            .apply(&engine, source, "python")
            .unwrap();
        let modified = result.modified_code.unwrap();
        assert_eq!(
            modified,
            "class C:\n    def f(self):\n        return 1\n    def g(self):\n        return 2\n"
        );
        let tree = engine.extract(&modified, "python").unwrap();
        let names: Vec<_> = tree.elements[0]
            .children
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["f", "g"]);
    }

    #[test]
    fn method_builder_fills_an_empty_class() {
        let engine = Engine::new();
        let source = "class C:\n    pass\n";
        let result = MethodBuilder::new("C", "g")
            .param("self")
            .line("return 2")
            .apply(&engine, source, "python")
            .unwrap();
        let modified = result.modified_code.unwrap();
        assert_eq!(
            modified,
            "class C:\n    pass\n    def g(self):\n        return 2\n"
        );
        let ts_result = MethodBuilder::new("C", "g")
            .line("return 2;")
            .apply(&engine, "class C {}\n", "typescript")
            .unwrap();
        let ts_modified = ts_result.modified_code.unwrap();
        assert_eq!(ts_modified, "class C {\n  g() {\n    return 2;\n  }\n}\n");
        let tree = engine.extract(&ts_modified, "typescript").unwrap();
        assert_eq!(tree.elements[0].children[0].name, "g");
    }

    #[test]
    fn class_builder_appends_at_top_level() {
        let engine = Engine::new();
        let source = "def existing():\n    return 0\n";
        let result = ClassBuilder::new("Thing")
            .base("Base")
            .line("kind = \"thing\"")
            .apply(&engine, source, "python")
            .unwrap();
        let modified = result.modified_code.unwrap();
        assert_eq!(
            modified,
            "def existing():\n    return 0\nclass Thing(Base):\n    kind = \"thing\"\n"
        );
        let tree = engine.extract(&modified, "python").unwrap();
        assert!(tree.elements.iter().any(|e| e.name == "Thing"));
    }

    #[test]
    fn builders_handle_empty_buffers() {
        let engine = Engine::new();
        let result = FunctionBuilder::new("main")
            .line("print(\"hi\")")
            .apply(&engine, "", "python")
            .unwrap();
        assert_eq!(
            result.modified_code.as_deref(),
            Some("def main():\n    print(\"hi\")\n")
        );
    }
}
