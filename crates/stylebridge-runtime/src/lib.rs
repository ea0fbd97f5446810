/*
 * stylebridge-runtime
 * Copyright (c) 2025 Posit, PBC
 *
 * Host capability layer for stylesheet compilation.
 *
 * Stylesheet compiles run against a virtual file tree rather than the real
 * filesystem. This crate defines the capabilities a host hands in and ships
 * the stores the command-line tool and tests need:
 *
 * - MemoryStore: in-memory tree (packaging steps, tests)
 * - MountedStore: ordered disk directories mounted at logical prefixes
 * - TracingSink / RecordingSink: log channel implementations
 */

mod encoding;
mod log;
mod memory;
mod mounted;
mod traits;

// Re-export core types (API surface)
pub use encoding::Encoding;
pub use traits::{
    ArtifactWriter, Host, LogSink, RuntimeError, RuntimeResult, VirtualFileStore, join_logical,
};

// Re-export store and sink implementations
pub use log::{LogLevel, RecordingSink, TracingSink};
pub use memory::MemoryStore;
pub use mounted::{Mount, MountedStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_read_file() {
        let store = MemoryStore::new().with_file("/virtual/a.scss", "a { b: c; }");
        let sink = RecordingSink::new();
        let host = Host::new(&store, &store, &sink);

        assert_eq!(
            host.read_file("/virtual/a.scss", Encoding::Utf8).as_deref(),
            Some("a { b: c; }")
        );
        assert_eq!(host.read_file("/virtual/b.scss", Encoding::Utf8), None);
    }

    #[test]
    fn test_host_read_file_undecodable() {
        let store = MemoryStore::new().with_file("/virtual/a.scss", b"\xFF\xFE".to_vec());
        let sink = RecordingSink::new();
        let host = Host::new(&store, &store, &sink);

        assert_eq!(host.read_file("/virtual/a.scss", Encoding::Utf8), None);
        assert!(host.read_file("/virtual/a.scss", Encoding::Latin1).is_some());
    }
}
