// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Manipulator
//!
//! Applies replace/prepend/append patches at element boundaries:
//!
//! 1. resolve the path - [`Error::ElementNotFound`] when it walks to nothing,
//! 2. compare the caller's `original_hash` against the current fragment hash -
//!    [`Error::WriteConflict`] on mismatch,
//! 3. normalize the fragment through the formatter with the insertion point's
//!    indent,
//! 4. splice bytes; everything outside the touched span is preserved
//!    byte-for-byte,
//! 5. recompute the fragment hash by re-extracting the patched buffer at the
//!    same path.
//!
//! Insertions share the addressed element's indent and line. Appending to an
//! element that does not end its line (single-line brace members) stays on
//! that line; everything else inserts as new lines.

use crate::diff::unified_diff;
use crate::format::{normalize_fragment, normalize_replacement};
use crate::resolver::{resolve, Resolved};
use codehem_core::hash::fragment_hash;
use codehem_core::{Error, LineIndex, PathExpr, Result};
use codehem_languages::LanguageService;
use codehem_parse::ParserFacade;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchMode {
    Replace,
    Prepend,
    Append,
}

impl fmt::Display for PatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Replace => "replace",
            Self::Prepend => "prepend",
            Self::Append => "append",
        })
    }
}

impl FromStr for PatchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "replace" => Ok(Self::Replace),
            "prepend" => Ok(Self::Prepend),
            "append" => Ok(Self::Append),
            other => Err(Error::validation(format!(
                "unknown mode `{other}`; expected replace, prepend or append"
            ))),
        }
    }
}

/// One patch operation against a buffer or workspace file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchRequest {
    pub xpath: String,
    pub new_code: String,
    pub mode: PatchMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_hash: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
    /// Include attached decorators in the addressed range.
    #[serde(default)]
    pub include_extra: bool,
}

impl PatchRequest {
    #[must_use]
    pub fn new(xpath: impl Into<String>, new_code: impl Into<String>, mode: PatchMode) -> Self {
        Self {
            xpath: xpath.into(),
            new_code: new_code.into(),
            mode,
            original_hash: None,
            dry_run: false,
            include_extra: false,
        }
    }

    #[must_use]
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.original_hash = Some(hash.into());
        self
    }

    #[must_use]
    pub fn dry(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchErrorInfo {
    pub kind: String,
    pub message: String,
}

/// Structured patch outcome, serializable as the public result form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchResult {
    pub status: PatchStatus,
    pub lines_added: usize,
    pub lines_removed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ambiguous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PatchErrorInfo>,
}

impl PatchResult {
    /// The error form of a result, for callers that want structure instead of
    /// a propagated [`Error`].
    #[must_use]
    pub fn failure(error: &Error) -> Self {
        Self {
            status: PatchStatus::Error,
            lines_added: 0,
            lines_removed: 0,
            new_hash: None,
            modified_code: None,
            diff: None,
            ambiguous: false,
            error: Some(PatchErrorInfo {
                kind: error.kind().to_string(),
                message: error.to_string(),
            }),
        }
    }
}

/// Apply one patch to an in-memory buffer.
pub fn apply(
    service: &dyn LanguageService,
    facade: &ParserFacade,
    source: &str,
    request: &PatchRequest,
) -> Result<PatchResult> {
    if request.new_code.trim().is_empty() {
        return Err(Error::validation("new_code is empty"));
    }
    let path = PathExpr::parse(&request.xpath)?;

    let index = LineIndex::new(source);
    let parsed = facade.parse(service.code(), service.grammar(), source.as_bytes())?;
    let tree = service.build_elements(source, &parsed.tree)?;
    let resolved = resolve(&tree, source, &index, &path, request.include_extra)?
        .ok_or_else(|| Error::not_found(request.xpath.clone()))?;

    if let Some(expected) = &request.original_hash {
        if *expected != resolved.hash {
            return Err(Error::WriteConflict {
                path: request.xpath.clone(),
                file: None,
                expected: expected.clone(),
                actual: resolved.hash,
            });
        }
    }

    let eol = index.dominant_line_ending();
    let new_source = match request.mode {
        PatchMode::Replace => splice_replace(source, &index, &resolved, &request.new_code, eol),
        PatchMode::Prepend => splice_insert(source, &index, &resolved, &request.new_code, eol, true),
        PatchMode::Append => splice_insert(source, &index, &resolved, &request.new_code, eol, false),
    };

    let fragment_lines = request
        .new_code
        .trim_end_matches(['\n', '\r'])
        .lines()
        .count();
    let (lines_added, lines_removed) = match request.mode {
        PatchMode::Replace => (fragment_lines, resolved.effective_range.line_count()),
        PatchMode::Prepend | PatchMode::Append => (fragment_lines, 0),
    };

    let new_hash = rehash(service, facade, &new_source, &path, request.include_extra)
        .unwrap_or_else(|| fragment_hash(&request.new_code));
    debug!(
        path = %request.xpath,
        mode = %request.mode,
        lines_added,
        lines_removed,
        "patch applied"
    );

    let diff = request
        .dry_run
        .then(|| unified_diff(source, &new_source));
    Ok(PatchResult {
        status: PatchStatus::Ok,
        lines_added,
        lines_removed,
        new_hash: Some(new_hash),
        modified_code: Some(new_source),
        diff,
        ambiguous: resolved.ambiguous,
        error: None,
    })
}

fn splice_replace(
    source: &str,
    index: &LineIndex,
    resolved: &Resolved,
    fragment: &str,
    eol: &str,
) -> String {
    let span = index.span(&resolved.effective_range);
    let indent = index.indent_of(resolved.effective_range.start_line, source);
    let normalized = normalize_replacement(fragment, indent, eol);
    let mut out = String::with_capacity(source.len() + normalized.len());
    out.push_str(&source[..span.start]);
    out.push_str(&normalized);
    out.push_str(&source[span.end..]);
    out
}

fn splice_insert(
    source: &str,
    index: &LineIndex,
    resolved: &Resolved,
    fragment: &str,
    eol: &str,
    before: bool,
) -> String {
    let span = index.span(&resolved.effective_range);
    let range = &resolved.effective_range;
    let indent = index.indent_of(range.start_line, source);
    let normalized = normalize_fragment(fragment, indent, eol);

    let (point, insert_text) = if before {
        let starts_line = source[index.line_start(range.start_line)..span.start]
            .trim()
            .is_empty();
        let text = if starts_line {
            format!("{normalized}{eol}{indent}")
        } else {
            format!("{normalized} ")
        };
        (span.start, text)
    } else {
        let ends_line = source[span.end..index.line_end(range.end_line, source)]
            .trim()
            .is_empty();
        let text = if ends_line {
            format!("{eol}{indent}{normalized}")
        } else {
            format!(" {normalized}")
        };
        (span.end, text)
    };

    let mut out = String::with_capacity(source.len() + insert_text.len());
    out.push_str(&source[..point]);
    out.push_str(&insert_text);
    out.push_str(&source[point..]);
    out
}

/// Fragment hash of the addressed element re-extracted from the patched
/// buffer. `None` when the path no longer resolves (e.g. a replace renamed
/// the element).
fn rehash(
    service: &dyn LanguageService,
    facade: &ParserFacade,
    new_source: &str,
    path: &PathExpr,
    include_extra: bool,
) -> Option<String> {
    let parsed = facade
        .parse(service.code(), service.grammar(), new_source.as_bytes())
        .ok()?;
    let tree = service.build_elements(new_source, &parsed.tree).ok()?;
    let index = LineIndex::new(new_source);
    resolve(&tree, new_source, &index, path, include_extra)
        .ok()
        .flatten()
        .map(|resolved| resolved.hash)
}
