/*
 * traits.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Defines the host capability traits and supporting types.
 *
 * A stylesheet compile never touches the real filesystem directly. Instead
 * the host hands in three capabilities:
 * - VirtualFileStore: read-only view of the logical file tree
 * - ArtifactWriter: where compiled CSS is written
 * - LogSink: a verbose channel and a warning channel
 */

use std::io;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::encoding::Encoding;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug)]
pub enum RuntimeError {
    /// Standard I/O error
    Io(io::Error),

    /// No mount covers the logical path
    Unmounted(String),

    /// Operation not supported by this store (e.g., writing to a read-only layer)
    NotSupported(String),

    /// Bytes could not be decoded with the requested encoding
    Decode {
        /// Logical path of the offending file
        path: String,
        /// Encoding that was used
        encoding: Encoding,
    },

    /// Encoding name not recognized
    UnknownEncoding(String),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::Io(e) => write!(f, "I/O error: {}", e),
            RuntimeError::Unmounted(path) => write!(f, "No mount covers path: {}", path),
            RuntimeError::NotSupported(msg) => write!(f, "Operation not supported: {}", msg),
            RuntimeError::Decode { path, encoding } => {
                write!(f, "{} is not valid {}", path, encoding)
            }
            RuntimeError::UnknownEncoding(name) => write!(f, "Unknown encoding: {}", name),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RuntimeError {
    fn from(e: io::Error) -> Self {
        RuntimeError::Io(e)
    }
}

/// Read-only view of the logical file tree.
///
/// Paths are `/`-separated logical strings such as `/virtual/css/site.scss`.
/// Implementations never normalize `.` or `..` segments; a lookup is for the
/// exact string given.
///
/// Every `find` goes to the backing structure. Stores do not cache.
pub trait VirtualFileStore: Send + Sync {
    /// Read a file's bytes, or `None` if no file exists at `path`.
    fn find(&self, path: &str) -> Option<Vec<u8>>;

    /// Last modification time of the file at `path`, if it exists.
    fn mtime(&self, path: &str) -> Option<SystemTime>;

    /// All logical file paths under `root`, in no particular order.
    ///
    /// Stores that cannot enumerate return an empty list.
    fn list(&self, root: &str) -> Vec<String> {
        let _ = root;
        Vec::new()
    }
}

/// Host capability for writing compiled artifacts.
pub trait ArtifactWriter: Send + Sync {
    /// Write `contents` to the logical `path`, creating or overwriting it.
    fn write(&self, path: &str, contents: &[u8]) -> RuntimeResult<()>;
}

/// Logging capability split into a verbose channel and a warning channel.
pub trait LogSink: Send + Sync {
    /// Verbose progress output.
    fn debug(&self, message: &str);

    /// User-facing warnings and diagnostics.
    fn warn(&self, message: &str);
}

/// The capability record handed to sessions and batch runs.
///
/// Everything a compile needs from its environment travels through this
/// value; there are no process-wide bindings.
#[derive(Clone, Copy)]
pub struct Host<'a> {
    pub store: &'a dyn VirtualFileStore,
    pub writer: &'a dyn ArtifactWriter,
    pub log: &'a dyn LogSink,
}

impl<'a> Host<'a> {
    pub fn new(
        store: &'a dyn VirtualFileStore,
        writer: &'a dyn ArtifactWriter,
        log: &'a dyn LogSink,
    ) -> Self {
        Self { store, writer, log }
    }

    /// Read a file as text, or `None` if it is absent or not decodable.
    pub fn read_file(&self, path: &str, encoding: Encoding) -> Option<String> {
        let bytes = self.store.find(path)?;
        match encoding.decode(path, &bytes) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::debug!("{}", e);
                None
            }
        }
    }
}

impl std::fmt::Debug for Host<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("store", &"<VirtualFileStore>")
            .field("writer", &"<ArtifactWriter>")
            .field("log", &"<LogSink>")
            .finish()
    }
}

/// Join a logical directory and a relative name with exactly one `/`.
pub fn join_logical(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if dir.is_empty() {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Map a logical path under `prefix` onto a directory on disk.
///
/// Returns `None` when `path` is not under `prefix`.
pub(crate) fn map_under(prefix: &str, root: &std::path::Path, path: &str) -> Option<PathBuf> {
    let prefix = prefix.trim_end_matches('/');
    let rest = path.strip_prefix(prefix)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }
    let mut mapped = root.to_path_buf();
    for segment in rest.split('/').filter(|s| !s.is_empty()) {
        mapped.push(segment);
    }
    Some(mapped)
}
