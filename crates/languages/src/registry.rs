// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Plug-in Registry
//!
//! Maps language codes, aliases and file extensions to registered services,
//! and detects languages from paths or leading bytes. Populated at startup;
//! registration afterwards is allowed but must be externally synchronized -
//! readers take the maps as effectively frozen.

use crate::python::PythonService;
use crate::service::LanguageService;
use crate::typescript::TypeScriptService;
use codehem_core::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::debug;

#[derive(Default)]
pub struct LanguageRegistry {
    services: RwLock<HashMap<&'static str, Arc<dyn LanguageService>>>,
    extensions: RwLock<HashMap<&'static str, &'static str>>,
}

impl LanguageRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with the built-in plug-ins: `python`, `typescript` and
    /// the `javascript` alias.
    pub fn builtin() -> Result<Self> {
        let registry = Self::new();
        registry.register(Arc::new(PythonService::new()?))?;
        registry.register(Arc::new(TypeScriptService::new()?))?;
        Ok(registry)
    }

    /// Register a service under its code, aliases and file extensions.
    ///
    /// Registering the same service twice is a no-op; registering a
    /// *different* implementation under an already-taken code is a
    /// [`Error::Plugin`] contract violation.
    pub fn register(&self, service: Arc<dyn LanguageService>) -> Result<()> {
        let mut services = self.services.write().expect("registry lock poisoned");
        let code = service.code();
        if let Some(existing) = services.get(code) {
            if Arc::ptr_eq(existing, &service) {
                debug!(code, "service already registered, skipping");
                return Ok(());
            }
            return Err(Error::plugin(
                code.to_string(),
                "a different service is already registered under this code",
            ));
        }

        let mut extensions = self.extensions.write().expect("registry lock poisoned");
        for ext in service.file_extensions() {
            if let Some(taken) = extensions.get(ext) {
                if *taken != code {
                    return Err(Error::plugin(
                        code.to_string(),
                        format!("extension `.{ext}` is already claimed by `{taken}`"),
                    ));
                }
            }
            extensions.insert(ext, code);
        }
        for alias in service.aliases() {
            services.insert(alias, Arc::clone(&service));
        }
        services.insert(code, service);
        Ok(())
    }

    /// Register an extra alias for an existing language code.
    pub fn register_alias(&self, alias: &'static str, code: &str) -> Result<()> {
        let mut services = self.services.write().expect("registry lock poisoned");
        let Some(service) = services.get(code).cloned() else {
            return Err(Error::UnsupportedLanguage {
                what: format!("code `{code}`"),
            });
        };
        services.insert(alias, service);
        Ok(())
    }

    /// Resolve a language code or alias.
    pub fn get(&self, code: &str) -> Result<Arc<dyn LanguageService>> {
        self.services
            .read()
            .expect("registry lock poisoned")
            .get(code)
            .cloned()
            .ok_or_else(|| Error::UnsupportedLanguage {
                what: format!("code `{code}`"),
            })
    }

    /// Resolve by file extension (lowercase comparison, dot optional).
    pub fn for_extension(&self, ext: &str) -> Result<Arc<dyn LanguageService>> {
        let normalized = ext.trim_start_matches('.').to_ascii_lowercase();
        let code = self
            .extensions
            .read()
            .expect("registry lock poisoned")
            .get(normalized.as_str())
            .copied();
        match code {
            Some(code) => self.get(code),
            None => Err(Error::UnsupportedLanguage {
                what: format!("extension `.{normalized}`"),
            }),
        }
    }

    /// Resolve by path: extension first, content sniffing as fallback.
    pub fn detect_path(&self, path: &Path, source: Option<&str>) -> Result<Arc<dyn LanguageService>> {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if let Ok(service) = self.for_extension(ext) {
                return Ok(service);
            }
        }
        match source {
            Some(source) => self.detect(source),
            None => Err(Error::UnsupportedLanguage {
                what: format!("path `{}`", path.display()),
            }),
        }
    }

    /// Detect the language of a buffer by sniffing its leading bytes.
    pub fn detect(&self, source: &str) -> Result<Arc<dyn LanguageService>> {
        let services = self.services.read().expect("registry lock poisoned");
        let mut seen: Vec<&str> = Vec::new();
        let mut best: Option<(u32, Arc<dyn LanguageService>)> = None;
        for service in services.values() {
            if seen.contains(&service.code()) {
                continue;
            }
            seen.push(service.code());
            let score = service.sniff(source);
            debug!(language = service.code(), score, "sniffed buffer");
            if score > 0 && best.as_ref().is_none_or(|(top, _)| score > *top) {
                best = Some((score, Arc::clone(service)));
            }
        }
        best.map(|(_, service)| service)
            .ok_or_else(|| Error::UnsupportedLanguage {
                what: "buffer matched no registered language".to_string(),
            })
    }

    /// Registered canonical codes, sorted.
    #[must_use]
    pub fn codes(&self) -> Vec<&'static str> {
        let services = self.services.read().expect("registry lock poisoned");
        let mut codes: Vec<&'static str> = services
            .iter()
            .filter(|&(key, service)| service.code() == *key)
            .map(|(key, _)| *key)
            .collect();
        codes.sort_unstable();
        codes
    }
}

/// The process-wide registry backing the convenience facade. Built on first
/// use and read-only afterwards.
pub fn default_registry() -> Arc<LanguageRegistry> {
    static REGISTRY: OnceLock<Arc<LanguageRegistry>> = OnceLock::new();
    Arc::clone(REGISTRY.get_or_init(|| {
        Arc::new(LanguageRegistry::builtin().expect("built-in language plug-ins must initialize"))
    }))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builtin_resolves_codes_aliases_and_extensions() {
        let registry = LanguageRegistry::builtin().unwrap();
        assert_eq!(registry.get("python").unwrap().code(), "python");
        assert_eq!(registry.get("javascript").unwrap().code(), "typescript");
        assert_eq!(registry.for_extension("py").unwrap().code(), "python");
        assert_eq!(registry.for_extension(".TS").unwrap().code(), "typescript");
        assert!(registry.get("cobol").is_err());
        assert_eq!(registry.codes(), ["python", "typescript"]);
    }

    #[test]
    fn double_registration_is_idempotent_for_same_service() {
        let registry = LanguageRegistry::builtin().unwrap();
        let service = registry.get("python").unwrap();
        registry.register(service).unwrap();
        let different: Arc<dyn LanguageService> = Arc::new(PythonService::new().unwrap());
        let err = registry.register(different).unwrap_err();
        assert_eq!(err.kind(), "PluginError");
    }

    #[test]
    fn sniffing_detects_the_obvious() {
        let registry = LanguageRegistry::builtin().unwrap();
        let python = "#!/usr/bin/env python\nimport os\n\ndef main():\n    pass\n";
        let typescript = "import { x } from './x';\n\nexport function main(): void {}\n";
        assert_eq!(registry.detect(python).unwrap().code(), "python");
        assert_eq!(registry.detect(typescript).unwrap().code(), "typescript");
        assert!(registry.detect("12 34 56").is_err());
    }

    #[test]
    fn detect_path_prefers_extension() {
        let registry = LanguageRegistry::builtin().unwrap();
        let service = registry
            .detect_path(Path::new("src/app.py"), Some("function f() {}"))
            .unwrap();
        assert_eq!(service.code(), "python");
        let sniffed = registry
            .detect_path(Path::new("script"), Some("def f():\n    pass\n"))
            .unwrap();
        assert_eq!(sniffed.code(), "python");
    }
}
