//! Import resolution against the virtual file store.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! A stylesheet reference such as `@import "buttons"` is mapped to exactly one
//! backing file. Candidates are tried in a fixed order and the first one the
//! store holds wins:
//!
//! 1. the reference itself, when it already carries a recognized extension
//! 2. `<reference>.<ext>` for each recognized extension, in priority order
//! 3. `<dir>_<base>.<ext>` for each recognized extension (the partial
//!    convention for fragments that are never compiled on their own)
//!
//! Nothing is cached. Two references to the same file are two store reads.

use std::time::SystemTime;

use stylebridge_runtime::{Encoding, VirtualFileStore};

use crate::error::CompileError;
use crate::syntax::{Dialect, Syntax};

/// A reference encountered while parsing, plus the file that made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesheetReference {
    pub uri: String,
    /// `None` for a top-level lookup (the entry file itself).
    pub requesting_file_path: Option<String>,
}

impl StylesheetReference {
    pub fn top_level(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            requesting_file_path: None,
        }
    }

    pub fn relative(uri: impl Into<String>, requesting_file_path: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            requesting_file_path: Some(requesting_file_path.into()),
        }
    }

    /// The path lookups start from.
    pub fn lookup_root(&self) -> String {
        match &self.requesting_file_path {
            Some(base) => relative_root(&self.uri, base),
            None => self.uri.clone(),
        }
    }
}

/// The single result of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub backing_path: String,
    pub syntax: Syntax,
    pub content: Vec<u8>,
}

impl ResolvedSource {
    /// Decode the content as text.
    pub fn text(&self, encoding: Encoding) -> Result<String, CompileError> {
        encoding
            .decode(&self.backing_path, &self.content)
            .map_err(CompileError::Decode)
    }

    /// Fail with [`CompileError::Decode`] unless the content decodes.
    pub fn validate(&self, encoding: Encoding) -> Result<(), CompileError> {
        self.text(encoding).map(drop)
    }
}

/// Identity of an import for backends that key their own bookkeeping on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportKey {
    pub importer: &'static str,
    pub uri: String,
}

/// The resolver interface backends call back into.
pub trait Importer {
    /// Resolve a top-level reference.
    fn find(&self, uri: &str) -> Option<ResolvedSource>;

    /// Resolve `uri` relative to the file at `base`.
    fn find_relative(&self, uri: &str, base: &str) -> Option<ResolvedSource> {
        self.find(&relative_root(uri, base))
    }

    /// Read the file at `path` exactly as written, with no candidate lookup.
    fn load(&self, path: &str) -> Option<Vec<u8>>;

    /// Modification time of a backing file.
    fn mtime(&self, uri: &str) -> Option<SystemTime>;

    fn key(&self, uri: &str) -> ImportKey;

    /// Encoding used to decode resolved sources.
    fn encoding(&self) -> Encoding;

    fn resolve(&self, reference: &StylesheetReference) -> Option<ResolvedSource> {
        match &reference.requesting_file_path {
            Some(base) => self.find_relative(&reference.uri, base),
            None => self.find(&reference.uri),
        }
    }
}

/// Drop the final `/`-separated segment of `base` and prepend the remainder
/// to `uri`. No `.` or `..` processing happens.
pub fn relative_root(uri: &str, base: &str) -> String {
    match base.rfind('/') {
        Some(idx) => format!("{}/{}", &base[..idx], uri),
        None => uri.to_string(),
    }
}

/// A lookup root split into directory, base name and extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceParts<'a> {
    /// Everything up to and including the last `/`, or empty.
    pub dir: &'a str,
    /// The remainder after `dir`.
    pub base: &'a str,
    /// Suffix after the last `.` within `base` only.
    pub ext: Option<&'a str>,
}

impl<'a> ReferenceParts<'a> {
    pub fn split(root: &'a str) -> Self {
        let (dir, base) = match root.rfind('/') {
            Some(idx) => root.split_at(idx + 1),
            None => ("", root),
        };
        let ext = base.rfind('.').map(|dot| &base[dot + 1..]);
        Self { dir, base, ext }
    }
}

/// One path the resolver will try, and the syntax it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: String,
    pub syntax: Syntax,
}

/// Every candidate for `root`, in the order they are tried.
pub fn candidates(root: &str, dialect: Dialect) -> Vec<Candidate> {
    let parts = ReferenceParts::split(root);
    let extensions = dialect.extensions();
    let mut out = Vec::with_capacity(extensions.len() * 2 + 1);

    if let Some(syntax) = parts.ext.and_then(|ext| dialect.syntax_for(ext)) {
        out.push(Candidate {
            path: root.to_string(),
            syntax,
        });
    }
    for (ext, syntax) in extensions {
        out.push(Candidate {
            path: format!("{}.{}", root, ext),
            syntax: *syntax,
        });
    }
    for (ext, syntax) in extensions {
        out.push(Candidate {
            path: format!("{}_{}.{}", parts.dir, parts.base, ext),
            syntax: *syntax,
        });
    }
    out
}

/// Importer backed by a [`VirtualFileStore`].
pub struct StoreImporter<'a> {
    store: &'a dyn VirtualFileStore,
    dialect: Dialect,
    encoding: Encoding,
}

impl<'a> StoreImporter<'a> {
    pub fn new(store: &'a dyn VirtualFileStore, dialect: Dialect, encoding: Encoding) -> Self {
        Self {
            store,
            dialect,
            encoding,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn store(&self) -> &'a dyn VirtualFileStore {
        self.store
    }
}

impl std::fmt::Debug for StoreImporter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreImporter")
            .field("store", &"<VirtualFileStore>")
            .field("dialect", &self.dialect)
            .field("encoding", &self.encoding)
            .finish()
    }
}

impl Importer for StoreImporter<'_> {
    fn find(&self, uri: &str) -> Option<ResolvedSource> {
        for candidate in candidates(uri, self.dialect) {
            if let Some(content) = self.store.find(&candidate.path) {
                tracing::trace!(uri, path = %candidate.path, "resolved");
                return Some(ResolvedSource {
                    backing_path: candidate.path,
                    syntax: candidate.syntax,
                    content,
                });
            }
            tracing::trace!(uri, path = %candidate.path, "miss");
        }
        None
    }

    fn load(&self, path: &str) -> Option<Vec<u8>> {
        self.store.find(path)
    }

    fn mtime(&self, uri: &str) -> Option<SystemTime> {
        self.store.mtime(uri)
    }

    fn key(&self, uri: &str) -> ImportKey {
        ImportKey {
            importer: "store",
            uri: uri.to_string(),
        }
    }

    fn encoding(&self) -> Encoding {
        self.encoding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use stylebridge_runtime::MemoryStore;

    /// Wraps a MemoryStore and records every path read.
    struct CountingStore {
        inner: MemoryStore,
        reads: Mutex<Vec<String>>,
    }

    impl CountingStore {
        fn new(files: &[&str]) -> Self {
            let inner = MemoryStore::new();
            for f in files {
                inner.add_file(f, format!("/* {} */", f));
            }
            Self {
                inner,
                reads: Mutex::new(Vec::new()),
            }
        }

        fn reads(&self) -> Vec<String> {
            self.reads.lock().unwrap().clone()
        }
    }

    impl VirtualFileStore for CountingStore {
        fn find(&self, path: &str) -> Option<Vec<u8>> {
            self.reads.lock().unwrap().push(path.to_string());
            self.inner.find(path)
        }

        fn mtime(&self, path: &str) -> Option<SystemTime> {
            self.inner.mtime(path)
        }
    }

    fn importer(store: &CountingStore) -> StoreImporter<'_> {
        StoreImporter::new(store, Dialect::Sass, Encoding::Utf8)
    }

    #[test]
    fn test_explicit_extension_hit_reads_once() {
        let store = CountingStore::new(&["/v/theme.scss", "/v/theme.scss.sass", "/v/_theme.scss.sass"]);
        let resolved = importer(&store).find("/v/theme.scss").unwrap();

        assert_eq!(resolved.backing_path, "/v/theme.scss");
        assert_eq!(resolved.syntax, Syntax::Scss);
        assert_eq!(store.reads(), vec!["/v/theme.scss"]);
    }

    #[test]
    fn test_sass_preferred_over_scss() {
        let store = CountingStore::new(&["/v/name.sass", "/v/name.scss"]);
        let resolved = importer(&store).find("/v/name").unwrap();

        assert_eq!(resolved.backing_path, "/v/name.sass");
        assert_eq!(resolved.syntax, Syntax::IndentedSass);
    }

    #[test]
    fn test_partial_tried_only_after_direct_pass() {
        let store = CountingStore::new(&["/v/_mixins.scss"]);
        let resolved = importer(&store).find("/v/mixins").unwrap();

        assert_eq!(resolved.backing_path, "/v/_mixins.scss");
        assert_eq!(resolved.syntax, Syntax::Scss);
        assert_eq!(
            store.reads(),
            vec![
                "/v/mixins.sass",
                "/v/mixins.scss",
                "/v/_mixins.sass",
                "/v/_mixins.scss"
            ]
        );
    }

    #[test]
    fn test_direct_beats_partial() {
        let store = CountingStore::new(&["/v/_grid.sass", "/v/grid.scss"]);
        let resolved = importer(&store).find("/v/grid").unwrap();
        assert_eq!(resolved.backing_path, "/v/grid.scss");
    }

    #[test]
    fn test_relative_lookup_drops_only_last_segment() {
        let reference = StylesheetReference::relative("foo", "a/b/c.scss");
        assert_eq!(reference.lookup_root(), "a/b/foo");

        let reference = StylesheetReference::relative("../shared/foo", "a/b/c.scss");
        assert_eq!(reference.lookup_root(), "a/b/../shared/foo");

        let store = CountingStore::new(&["a/b/foo.scss"]);
        let resolved = importer(&store).find_relative("foo", "a/b/c.scss").unwrap();
        assert_eq!(resolved.backing_path, "a/b/foo.scss");
    }

    #[test]
    fn test_relative_from_bare_file_name() {
        assert_eq!(relative_root("foo", "c.scss"), "foo");
        assert_eq!(relative_root("foo", "/c.scss"), "/foo");
    }

    #[test]
    fn test_dot_in_directory_is_not_an_extension() {
        let parts = ReferenceParts::split("/v/lib.d/colors");
        assert_eq!(parts.dir, "/v/lib.d/");
        assert_eq!(parts.base, "colors");
        assert_eq!(parts.ext, None);

        let store = CountingStore::new(&["/v/lib.d/colors.sass"]);
        let resolved = importer(&store).find("/v/lib.d/colors").unwrap();
        assert_eq!(resolved.backing_path, "/v/lib.d/colors.sass");
        assert_eq!(store.reads(), vec!["/v/lib.d/colors.sass"]);
    }

    #[test]
    fn test_missing_explicit_extension_falls_through() {
        let store = CountingStore::new(&["/v/_print.scss.scss"]);
        let resolved = importer(&store).find("/v/print.scss").unwrap();

        assert_eq!(resolved.backing_path, "/v/_print.scss.scss");
        assert_eq!(
            store.reads(),
            vec![
                "/v/print.scss",
                "/v/print.scss.sass",
                "/v/print.scss.scss",
                "/v/_print.scss.sass",
                "/v/_print.scss.scss"
            ]
        );
    }

    #[test]
    fn test_unrecognized_extension_skips_direct_read() {
        let store = CountingStore::new(&["/v/bootstrap.min"]);
        assert!(importer(&store).find("/v/bootstrap.min").is_none());
        assert_eq!(store.reads()[0], "/v/bootstrap.min.sass");
        assert_eq!(store.reads().len(), 4);
    }

    #[test]
    fn test_unresolved_is_none() {
        let store = CountingStore::new(&[]);
        assert!(importer(&store).find("/v/nothing").is_none());
    }

    #[test]
    fn test_no_memoization() {
        let store = CountingStore::new(&["/v/a.scss"]);
        let importer = importer(&store);
        importer.find("/v/a.scss").unwrap();
        importer.find("/v/a.scss").unwrap();

        assert_eq!(store.reads(), vec!["/v/a.scss", "/v/a.scss"]);
    }

    #[test]
    fn test_less_dialect_table() {
        let store = CountingStore::new(&["/v/_vars.less", "/v/vars.scss"]);
        let importer = StoreImporter::new(&store, Dialect::Less, Encoding::Utf8);
        let resolved = importer.find("/v/vars").unwrap();

        assert_eq!(resolved.backing_path, "/v/_vars.less");
        assert_eq!(resolved.syntax, Syntax::LessLike);
    }

    #[test]
    fn test_resolve_dispatches_on_requesting_file() {
        let store = CountingStore::new(&["/v/css/_a.scss", "/v/b.scss"]);
        let importer = importer(&store);

        let nested = StylesheetReference::relative("a", "/v/css/site.scss");
        assert_eq!(
            importer.resolve(&nested).unwrap().backing_path,
            "/v/css/_a.scss"
        );

        let top = StylesheetReference::top_level("/v/b");
        assert_eq!(importer.resolve(&top).unwrap().backing_path, "/v/b.scss");
    }

    #[test]
    fn test_load_reads_only_the_exact_path() {
        let store = CountingStore::new(&["/v/_a.scss.scss"]);
        let importer = importer(&store);

        assert!(importer.load("/v/a.scss").is_none());
        assert!(importer.find("/v/a.scss").is_some());
        assert_eq!(store.reads()[0], "/v/a.scss");
    }

    #[test]
    fn test_validate_rejects_undecodable_content() {
        let source = ResolvedSource {
            backing_path: "/v/a.scss".to_string(),
            syntax: Syntax::Scss,
            content: b"a { b: \xFF; }".to_vec(),
        };
        assert!(matches!(
            source.validate(Encoding::Utf8),
            Err(CompileError::Decode(_))
        ));
        assert!(source.validate(Encoding::Latin1).is_ok());
    }

    #[test]
    fn test_key() {
        let store = CountingStore::new(&[]);
        let key = importer(&store).key("/v/a");
        assert_eq!(key.importer, "store");
        assert_eq!(key.uri, "/v/a");
    }
}
