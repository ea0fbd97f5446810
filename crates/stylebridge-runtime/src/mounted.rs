/*
 * mounted.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Disk-backed virtual file store built from ordered mount layers.
 *
 * Each layer maps a logical prefix (such as `/virtual`) onto a directory on
 * disk. Several layers may share a prefix; lookups walk the layers in the
 * order they were mounted and the first layer holding the file wins, so a
 * project directory can overlay a directory of shared fragments.
 */

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::traits::{
    ArtifactWriter, RuntimeError, RuntimeResult, VirtualFileStore, join_logical, map_under,
};

/// A single mount: a logical prefix backed by a disk directory.
#[derive(Debug, Clone)]
pub struct Mount {
    prefix: String,
    root: PathBuf,
}

impl Mount {
    pub fn new(prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let prefix = prefix.into();
        let prefix = prefix.trim_end_matches('/').to_string();
        Self {
            prefix,
            root: root.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        map_under(&self.prefix, &self.root, path)
    }
}

/// Virtual file store over ordered disk mounts.
#[derive(Debug, Clone, Default)]
pub struct MountedStore {
    layers: Vec<Mount>,
}

impl MountedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer. Earlier layers shadow later ones.
    pub fn mount(mut self, prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.layers.push(Mount::new(prefix, root));
        self
    }

    pub fn layers(&self) -> &[Mount] {
        &self.layers
    }

    /// First disk path, across all layers, that holds a file for `path`.
    fn locate(&self, path: &str) -> Option<PathBuf> {
        self.layers
            .iter()
            .filter_map(|layer| layer.resolve(path))
            .find(|candidate| candidate.is_file())
    }
}

impl VirtualFileStore for MountedStore {
    fn find(&self, path: &str) -> Option<Vec<u8>> {
        let disk_path = self.locate(path)?;
        match fs::read(&disk_path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::debug!("Failed to read {}: {}", disk_path.display(), e);
                None
            }
        }
    }

    fn mtime(&self, path: &str) -> Option<SystemTime> {
        let disk_path = self.locate(path)?;
        fs::metadata(disk_path).and_then(|m| m.modified()).ok()
    }

    fn list(&self, root: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        for layer in &self.layers {
            let Some(dir) = layer.resolve(root) else {
                continue;
            };
            for entry in WalkDir::new(&dir)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let Ok(relative) = entry.path().strip_prefix(&dir) else {
                    continue;
                };
                let relative = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                seen.insert(join_logical(root, &relative));
            }
        }
        seen.into_iter().collect()
    }
}

impl ArtifactWriter for MountedStore {
    fn write(&self, path: &str, contents: &[u8]) -> RuntimeResult<()> {
        let disk_path = self
            .layers
            .iter()
            .find_map(|layer| layer.resolve(path))
            .ok_or_else(|| RuntimeError::Unmounted(path.to_string()))?;
        if let Some(parent) = disk_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&disk_path, contents)?;
        Ok(())
    }
}
