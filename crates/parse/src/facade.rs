// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Parser Facade
//!
//! Drives tree-sitter parsers and caches parse results keyed by
//! `(language_code, sha1(source))`. Parsing the same bytes twice returns the
//! cached [`ParsedTree`]; a patch produces new bytes and therefore a new key.
//!
//! The facade is a handle, not a hidden singleton: embedders that need
//! isolated cache state construct their own.

use codehem_core::hash::{content_key, ContentKey};
use codehem_core::{Error, LruCache, Result};
use std::sync::{Arc, Mutex};
use tracing::trace;
use tree_sitter::{Language, Parser, Tree};

/// An immutable parse result shared between consumers.
#[derive(Debug)]
pub struct ParsedTree {
    pub tree: Tree,
    pub key: ContentKey,
}

/// Caching front door to tree-sitter parsing.
pub struct ParserFacade {
    cache: Mutex<LruCache<ContentKey, Arc<ParsedTree>>>,
}

impl ParserFacade {
    /// `capacity` is clamped to at least [`codehem_core::cache::MIN_CAPACITY`].
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Parse `source` with `grammar`, reusing the cached tree when the same
    /// bytes were parsed before.
    ///
    /// Partial or syntactically broken source still yields a tree (with error
    /// nodes); only grammar initialization failures and tree-sitter bailing
    /// out entirely raise [`Error::Parse`].
    pub fn parse(
        &self,
        language_code: &'static str,
        grammar: &Language,
        source: &[u8],
    ) -> Result<Arc<ParsedTree>> {
        let key = content_key(language_code, source);
        if let Some(hit) = self.cache.lock().expect("parser cache poisoned").get(&key) {
            trace!(language = language_code, "parse cache hit");
            return Ok(hit);
        }

        let mut parser = Parser::new();
        parser
            .set_language(grammar)
            .map_err(|e| Error::parse(language_code.to_string(), e.to_string()))?;
        let tree = parser.parse(source, None).ok_or_else(|| {
            Error::parse(
                language_code.to_string(),
                "tree-sitter returned no tree for the buffer",
            )
        })?;

        let parsed = Arc::new(ParsedTree { tree, key });
        self.cache
            .lock()
            .expect("parser cache poisoned")
            .insert(key, Arc::clone(&parsed));
        Ok(parsed)
    }
}

impl Default for ParserFacade {
    fn default() -> Self {
        Self::new(codehem_core::cache::MIN_CAPACITY)
    }
}
