// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! CodeHem - a syntax-aware, multi-language source-code query and patching
//! engine.
//!
//! This is the main library crate; it re-exports the component crates and
//! offers the flat convenience surface over a process-wide default engine.
//!
//! ```no_run
//! let source = b"class C:\n    def f(self):\n        return 1\n";
//! let lang = codehem::detect(source, None).unwrap();
//! let (text, hash) = codehem::get_text_by_path(source, lang, "C.f", false)
//!     .unwrap()
//!     .unwrap();
//! println!("{text} @ {hash}");
//! ```

// Re-export component crates
pub use codehem_core as core;
pub use codehem_engine as engine;
pub use codehem_fs as fs;
pub use codehem_languages as languages;
pub use codehem_parse as parse;

use codehem_core::{Error, Result};
use codehem_engine::ops::default_engine;
use std::path::Path;

pub use codehem_core::{Element, ElementKind, ElementRange, ElementTree, PathExpr};
pub use codehem_engine::builder::{ClassBuilder, FunctionBuilder, MethodBuilder};
pub use codehem_engine::{Engine, PatchMode, PatchRequest, PatchResult, PatchStatus};
pub use codehem_fs::Workspace;
pub use codehem_languages::{default_registry, LanguageRegistry};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Detect the language of a buffer (extension first, prefix sniffing second).
pub fn detect(source: &[u8], path: Option<&Path>) -> Result<&'static str> {
    default_engine().detect(source, path)
}

/// Extract the element tree of a buffer.
pub fn extract(source: &[u8], language_code: &str) -> Result<ElementTree> {
    let text = utf8(source)?;
    Ok(default_engine().extract(text, language_code)?.as_ref().clone())
}

/// Text and fragment hash of the element at `path`, or `None`.
pub fn get_text_by_path(
    source: &[u8],
    language_code: &str,
    path: &str,
    include_extra: bool,
) -> Result<Option<(String, String)>> {
    default_engine().get_text_by_path(utf8(source)?, language_code, path, include_extra)
}

/// Fragment hash of the element at `path`, or `None`.
pub fn get_element_hash(source: &[u8], language_code: &str, path: &str) -> Result<Option<String>> {
    default_engine().get_element_hash(utf8(source)?, language_code, path)
}

/// Apply one patch to an in-memory buffer.
pub fn apply_patch(source: &[u8], language_code: &str, request: &PatchRequest) -> Result<PatchResult> {
    default_engine().apply_patch(utf8(source)?, language_code, request)
}

/// Open a workspace over a directory tree.
pub fn open_workspace(root: impl AsRef<Path>) -> Result<Workspace> {
    Workspace::open(root)
}

fn utf8(source: &[u8]) -> Result<&str> {
    std::str::from_utf8(source).map_err(|_| Error::validation("source buffer is not valid UTF-8"))
}
