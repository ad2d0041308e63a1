// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Workspace
//!
//! An indexed view of a directory tree. Opening a workspace enumerates every
//! file whose extension maps to a registered language (gitignore respected)
//! and indexes its elements as `name -> (file, path)` locations.
//!
//! Writes are strictly serialized per file: a FIFO-fair lock is held from the
//! hash check through the rename, writes land in a temporary sibling first,
//! and readers going through the workspace block while a write is in flight -
//! they observe pre-patch or post-patch bytes, never an interleaving. Across
//! files no ordering is promised.

use crate::retry::RetryPolicy;
use codehem_core::{Element, ElementKind, Error, Result};
use codehem_engine::{Engine, PatchRequest, PatchResult};
use dashmap::DashMap;
use ignore::WalkBuilder;
use parking_lot::FairMutex;
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Where an element lives: file plus the path expression addressing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: PathBuf,
    pub path: String,
    pub kind: ElementKind,
}

struct FileEntry {
    language: &'static str,
    // (mtime, size) pair; size guards against coarse mtime granularity.
    stamp: (Option<SystemTime>, u64),
    elements: Vec<(String, String, ElementKind)>,
}

fn stamp_of(path: &Path) -> (Option<SystemTime>, u64) {
    match std::fs::metadata(path) {
        Ok(meta) => (meta.modified().ok(), meta.len()),
        Err(_) => (None, 0),
    }
}

/// Revised `(new_code, original_hash)` supplied by a conflict callback.
pub type ConflictRevision = Option<(String, String)>;
type ConflictCallback = Box<dyn Fn(&[u8], &str, &str) -> ConflictRevision + Send + Sync>;

pub struct Workspace {
    root: PathBuf,
    engine: Engine,
    files: DashMap<PathBuf, FileEntry>,
    locks: DashMap<PathBuf, Arc<FairMutex<()>>>,
    retry: RetryPolicy,
    on_conflict: RwLock<Option<ConflictCallback>>,
}

impl Workspace {
    /// Open and index a directory using the built-in language registry.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = root
            .canonicalize()
            .map_err(|e| Error::io(format!("opening workspace at {}", root.display()), e))?;
        let workspace = Self {
            root,
            engine: Engine::new(),
            files: DashMap::new(),
            locks: DashMap::new(),
            retry: RetryPolicy::default(),
            on_conflict: RwLock::new(None),
        };
        workspace.reindex()?;
        Ok(workspace)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Register the conflict callback invoked on hash mismatches; it may
    /// return revised code plus a fresh hash, triggering at most one retry.
    pub fn set_on_conflict(&self, callback: ConflictCallback) {
        *self.on_conflict.write().expect("conflict callback lock poisoned") = Some(callback);
    }

    /// Walk the tree and (re)build the whole index.
    pub fn reindex(&self) -> Result<()> {
        let mut candidates = Vec::new();
        for entry in WalkBuilder::new(&self.root).build() {
            let entry = entry.map_err(|e| {
                Error::io(
                    format!("walking {}", self.root.display()),
                    std::io::Error::other(e),
                )
            })?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.into_path();
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if self.engine.registry().for_extension(ext).is_ok() {
                candidates.push(path);
            }
        }
        info!(files = candidates.len(), root = %self.root.display(), "indexing workspace");

        let entries: Vec<(PathBuf, FileEntry)> = candidates
            .into_par_iter()
            .filter_map(|path| match self.index_file(&path) {
                Ok(entry) => Some((path, entry)),
                Err(error) => {
                    warn!(file = %path.display(), %error, "skipping unindexable file");
                    None
                }
            })
            .collect();
        self.files.clear();
        for (path, entry) in entries {
            self.files.insert(path, entry);
        }
        Ok(())
    }

    /// Find elements by name, kind and/or file glob (relative to the root).
    pub fn find(
        &self,
        name: Option<&str>,
        kind: Option<ElementKind>,
        file_glob: Option<&str>,
    ) -> Result<Vec<Location>> {
        let pattern = file_glob
            .map(glob::Pattern::new)
            .transpose()
            .map_err(|e| Error::validation(format!("invalid file glob: {e}")))?;

        let paths: Vec<PathBuf> = self.files.iter().map(|entry| entry.key().clone()).collect();
        let mut locations = Vec::new();
        for file in paths {
            self.refresh_if_stale(&file)?;
            let Some(entry) = self.files.get(&file) else {
                continue;
            };
            let relative = file.strip_prefix(&self.root).unwrap_or(&file);
            if let Some(pattern) = &pattern {
                if !pattern.matches_path(relative) {
                    continue;
                }
            }
            for (element_name, element_path, element_kind) in &entry.elements {
                if let Some(name) = name {
                    if element_name != name {
                        continue;
                    }
                }
                if let Some(kind) = kind {
                    if *element_kind != kind {
                        continue;
                    }
                }
                locations.push(Location {
                    file: relative.to_path_buf(),
                    path: element_path.clone(),
                    kind: *element_kind,
                });
            }
        }
        locations.sort_by(|a, b| (&a.file, &a.path).cmp(&(&b.file, &b.path)));
        Ok(locations)
    }

    /// Apply a patch end-to-end: read, patch, atomically write back.
    ///
    /// The per-file lock is held from the hash check through the rename, so
    /// concurrent appliers to one file serialize in FIFO order.
    pub fn apply_patch(&self, file: impl AsRef<Path>, request: &PatchRequest) -> Result<PatchResult> {
        let path = self.absolute(file.as_ref());
        let lock = self.lock_for(&path);
        let _guard = lock.lock();

        let bytes = self.read_locked(&path)?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| Error::validation("file is not valid UTF-8"))?;
        let language = self.language_of(&path, text)?;

        let mut outcome = self.engine.apply_patch(text, language, request);
        let conflict_hash = match &outcome {
            Err(Error::WriteConflict { actual, .. }) => Some(actual.clone()),
            _ => None,
        };
        if let Some(actual) = conflict_hash {
            let callback = self.on_conflict.read().expect("conflict callback lock poisoned");
            if let Some(callback) = callback.as_ref() {
                debug!(file = %path.display(), "write conflict, invoking on_conflict callback");
                if let Some((new_code, fresh_hash)) = callback(&bytes, &actual, &request.new_code) {
                    let mut revised = request.clone();
                    revised.new_code = new_code;
                    revised.original_hash = Some(fresh_hash);
                    outcome = self.engine.apply_patch(text, language, &revised);
                }
            }
        }
        let mut result = outcome.map_err(|e| e.with_file(&path))?;

        if request.dry_run {
            // Dry runs against files report the diff only, never the buffer.
            result.modified_code = None;
        } else {
            let modified = result
                .modified_code
                .as_deref()
                .ok_or_else(|| Error::validation("patch produced no modified buffer"))?;
            self.write_atomic(&path, modified.as_bytes())?;
            self.update_entry(&path, language, modified);
        }
        Ok(result)
    }

    /// Read a file through the workspace lock: sees pre- or post-patch bytes,
    /// never a torn write.
    pub fn read(&self, file: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = self.absolute(file.as_ref());
        let lock = self.lock_for(&path);
        let _guard = lock.lock();
        self.read_locked(&path)
    }

    /// Release the workspace.
    pub fn close(self) {}

    fn absolute(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.root.join(file)
        }
    }

    fn lock_for(&self, path: &Path) -> Arc<FairMutex<()>> {
        self.locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(FairMutex::new(())))
            .clone()
    }

    fn read_locked(&self, path: &Path) -> Result<Vec<u8>> {
        self.retry.run("read file", || {
            std::fs::read(path).map_err(|e| Error::io(format!("reading {}", path.display()), e))
        })
    }

    fn language_of(&self, path: &Path, text: &str) -> Result<&'static str> {
        if let Some(entry) = self.files.get(path) {
            return Ok(entry.language);
        }
        let service = self.engine.registry().detect_path(path, Some(text))?;
        Ok(service.code())
    }

    fn index_file(&self, path: &Path) -> Result<FileEntry> {
        let bytes = self.read_locked(path)?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| Error::validation("file is not valid UTF-8"))?;
        let service = self.engine.registry().detect_path(path, Some(text))?;
        let stamp = stamp_of(path);
        let tree = self.engine.extract(text, service.code())?;

        let mut elements = Vec::new();
        for element in &tree.elements {
            collect_locations(element, None, &mut elements);
        }
        Ok(FileEntry {
            language: service.code(),
            stamp,
            elements,
        })
    }

    fn refresh_if_stale(&self, path: &Path) -> Result<()> {
        let stale = match self.files.get(path) {
            Some(entry) => stamp_of(path) != entry.stamp,
            None => true,
        };
        if stale {
            match self.index_file(path) {
                Ok(entry) => {
                    self.files.insert(path.to_path_buf(), entry);
                }
                Err(error) => {
                    debug!(file = %path.display(), %error, "dropping stale index entry");
                    self.files.remove(path);
                }
            }
        }
        Ok(())
    }

    fn update_entry(&self, path: &Path, language: &'static str, modified: &str) {
        let stamp = stamp_of(path);
        match self.engine.extract(modified, language) {
            Ok(tree) => {
                let mut elements = Vec::new();
                for element in &tree.elements {
                    collect_locations(element, None, &mut elements);
                }
                self.files.insert(
                    path.to_path_buf(),
                    FileEntry {
                        language,
                        stamp,
                        elements,
                    },
                );
            }
            Err(error) => {
                warn!(file = %path.display(), %error, "post-write reindex failed");
                self.files.remove(path);
            }
        }
    }

    /// Write to a temporary sibling, then rename into place.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::validation("file has no parent directory"))?;
        self.retry.run("write file", || {
            let mut temp = tempfile::NamedTempFile::new_in(parent)
                .map_err(|e| Error::io(format!("creating temp file in {}", parent.display()), e))?;
            temp.write_all(bytes)
                .map_err(|e| Error::io(format!("writing {}", path.display()), e))?;
            temp.persist(path)
                .map_err(|e| Error::io(format!("renaming into {}", path.display()), e.error))?;
            Ok(())
        })
    }
}

/// Flatten an element subtree into `(name, path, kind)` index rows.
fn collect_locations(
    element: &Element,
    parent_path: Option<&str>,
    out: &mut Vec<(String, String, ElementKind)>,
) {
    if matches!(
        element.kind,
        ElementKind::Parameter | ElementKind::ReturnValue | ElementKind::Decorator
    ) {
        return;
    }
    let display_name = if element.kind == ElementKind::Import {
        "imports"
    } else {
        element.name.as_str()
    };
    let path = match parent_path {
        Some(parent) => format!("{parent}.{display_name}"),
        None => display_name.to_string(),
    };
    out.push((display_name.to_string(), path.clone(), element.kind));
    for child in &element.children {
        collect_locations(child, Some(&path), out);
    }
}
