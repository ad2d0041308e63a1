// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Operation Facade
//!
//! The [`Engine`] handle ties the registry, the parser facade and the
//! extraction cache together and exposes the in-memory library surface:
//! detect, extract, read-by-path, hash-by-path and patch.
//!
//! Caches are keyed by content hash, so a patched buffer never observes
//! stale trees. The handle is cheap to share (`&Engine`) across threads; a
//! process-wide default instance backs embedders that do not need isolated
//! cache state.

use crate::manipulate::{self, PatchRequest, PatchResult};
use crate::resolver::resolve;
use codehem_core::hash::{content_key, ContentKey};
use codehem_core::{ElementTree, Error, LineIndex, LruCache, PathExpr, Result};
use codehem_languages::{default_registry, LanguageRegistry};
use codehem_parse::ParserFacade;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

pub struct Engine {
    registry: Arc<LanguageRegistry>,
    facade: ParserFacade,
    trees: Mutex<LruCache<ContentKey, Arc<ElementTree>>>,
}

impl Engine {
    /// An engine over the built-in registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(default_registry())
    }

    /// An engine over a caller-owned registry, with isolated caches.
    #[must_use]
    pub fn with_registry(registry: Arc<LanguageRegistry>) -> Self {
        Self {
            registry,
            facade: ParserFacade::default(),
            trees: Mutex::new(LruCache::default()),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<LanguageRegistry> {
        &self.registry
    }

    #[must_use]
    pub const fn facade(&self) -> &ParserFacade {
        &self.facade
    }

    /// Detect the language of a buffer, using the path's extension first and
    /// prefix sniffing as fallback.
    pub fn detect(&self, source: &[u8], path: Option<&Path>) -> Result<&'static str> {
        let text = std::str::from_utf8(source)
            .map_err(|_| Error::validation("source buffer is not valid UTF-8"))?;
        let service = match path {
            Some(path) => self.registry.detect_path(path, Some(text))?,
            None => self.registry.detect(text)?,
        };
        Ok(service.code())
    }

    /// Extract the element tree of a buffer, cached by content hash.
    pub fn extract(&self, source: &str, language_code: &str) -> Result<Arc<ElementTree>> {
        let service = self.registry.get(language_code)?;
        let key = content_key(service.code(), source.as_bytes());
        if let Some(tree) = self.trees.lock().expect("tree cache poisoned").get(&key) {
            return Ok(tree);
        }
        let parsed = self
            .facade
            .parse(service.code(), service.grammar(), source.as_bytes())?;
        let tree = Arc::new(service.build_elements(source, &parsed.tree)?);
        self.trees
            .lock()
            .expect("tree cache poisoned")
            .insert(key, Arc::clone(&tree));
        Ok(tree)
    }

    /// Text and fragment hash of the element a path addresses, or `None`.
    pub fn get_text_by_path(
        &self,
        source: &str,
        language_code: &str,
        path: &str,
        include_extra: bool,
    ) -> Result<Option<(String, String)>> {
        let parsed_path = PathExpr::parse(path)?;
        let tree = self.extract(source, language_code)?;
        let index = LineIndex::new(source);
        Ok(
            resolve(&tree, source, &index, &parsed_path, include_extra)?
                .map(|resolved| (resolved.content, resolved.hash)),
        )
    }

    /// Fragment hash of the element a path addresses, or `None`.
    pub fn get_element_hash(
        &self,
        source: &str,
        language_code: &str,
        path: &str,
    ) -> Result<Option<String>> {
        Ok(self
            .get_text_by_path(source, language_code, path, false)?
            .map(|(_, hash)| hash))
    }

    /// Apply one patch to an in-memory buffer.
    pub fn apply_patch(
        &self,
        source: &str,
        language_code: &str,
        request: &PatchRequest,
    ) -> Result<PatchResult> {
        let service = self.registry.get(language_code)?;
        manipulate::apply(service.as_ref(), &self.facade, source, request)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide engine behind the crate-level convenience functions.
pub fn default_engine() -> &'static Engine {
    static ENGINE: OnceLock<Engine> = OnceLock::new();
    ENGINE.get_or_init(Engine::new)
}
