/*
 * memory.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * In-memory virtual file store.
 *
 * This store keeps every file in a map keyed by its logical path. It is the
 * natural backing for packaging steps that assemble a tree in memory, and for
 * tests that need deterministic modification times.
 */

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::SystemTime;

use crate::traits::{ArtifactWriter, RuntimeResult, VirtualFileStore};

#[derive(Debug, Clone)]
struct MemoryFile {
    contents: Vec<u8>,
    modified: SystemTime,
}

/// In-memory virtual file store.
///
/// Paths are stored exactly as given; no normalization is applied, so
/// `/virtual/a/../b.scss` and `/virtual/b.scss` are distinct entries.
///
/// Thread safety: uses an RwLock to satisfy the `Send + Sync` trait bounds.
/// Compilation is sequential so the lock is never contended in practice.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RwLock<HashMap<String, MemoryFile>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`MemoryStore::add_file`].
    pub fn with_file(self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.add_file(path, contents);
        self
    }

    /// Add (or replace) a file, stamped with the current time.
    pub fn add_file(&self, path: &str, contents: impl Into<Vec<u8>>) {
        self.add_file_with_mtime(path, contents, SystemTime::now());
    }

    /// Add (or replace) a file with an explicit modification time.
    pub fn add_file_with_mtime(
        &self,
        path: &str,
        contents: impl Into<Vec<u8>>,
        modified: SystemTime,
    ) {
        let file = MemoryFile {
            contents: contents.into(),
            modified,
        };
        self.files
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path.to_string(), file);
    }

    /// Remove a file. Returns true if the file existed.
    pub fn remove_file(&self, path: &str) -> bool {
        self.files
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(path)
            .is_some()
    }

    /// Check whether a file exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.files
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(path)
    }

    /// Read a file as UTF-8 text (lossy), mainly for inspecting outputs.
    pub fn read_string(&self, path: &str) -> Option<String> {
        self.find(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Number of files in the store.
    pub fn len(&self) -> usize {
        self.files
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VirtualFileStore for MemoryStore {
    fn find(&self, path: &str) -> Option<Vec<u8>> {
        self.files
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(path)
            .map(|f| f.contents.clone())
    }

    fn mtime(&self, path: &str) -> Option<SystemTime> {
        self.files
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(path)
            .map(|f| f.modified)
    }

    fn list(&self, root: &str) -> Vec<String> {
        let prefix = format!("{}/", root.trim_end_matches('/'));
        self.files
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .filter(|p| p.starts_with(&prefix))
            .cloned()
            .collect()
    }
}

impl ArtifactWriter for MemoryStore {
    fn write(&self, path: &str, contents: &[u8]) -> RuntimeResult<()> {
        self.add_file(path, contents);
        Ok(())
    }
}
