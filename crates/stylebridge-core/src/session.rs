//! Compile sessions: one entry file through resolve, parse and render.
//!
//! Copyright (c) 2025 Posit, PBC

use stylebridge_runtime::{Encoding, Host};

use crate::backend::{Backends, RenderOptions};
use crate::error::{CompileError, CompileOutcome};
use crate::resolve::{ReferenceParts, ResolvedSource, StoreImporter};
use crate::syntax::Dialect;

/// Per-compile options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompileOptions {
    pub compress: bool,
    pub encoding: Encoding,
}

impl CompileOptions {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            compress: false,
            encoding,
        }
    }

    /// A copy of these options with compression set to `compress`.
    pub fn with_compress(self, compress: bool) -> Self {
        Self { compress, ..self }
    }
}

/// Drives single entry files through a backend.
///
/// A session holds no per-compile state, so one session can compile any
/// number of entries.
pub struct Session<'a> {
    host: Host<'a>,
    backends: &'a Backends,
    default_dialect: Dialect,
}

impl<'a> Session<'a> {
    pub fn new(host: Host<'a>, backends: &'a Backends) -> Self {
        Self {
            host,
            backends,
            default_dialect: Dialect::default(),
        }
    }

    /// Dialect used for entries whose extension names none.
    pub fn with_default_dialect(mut self, dialect: Dialect) -> Self {
        self.default_dialect = dialect;
        self
    }

    pub fn host(&self) -> Host<'a> {
        self.host
    }

    /// Compile `entry` to CSS.
    ///
    /// The entry is read at exactly `entry`. Candidate lookup applies only
    /// to the imports it makes.
    pub fn compile(&self, entry: &str, options: &CompileOptions) -> CompileOutcome {
        let dialect = Dialect::detect(entry).unwrap_or(self.default_dialect);
        let syntax = ReferenceParts::split(entry)
            .ext
            .and_then(|ext| dialect.syntax_for(ext))
            .unwrap_or_else(|| dialect.default_syntax());

        let content = self
            .host
            .store
            .find(entry)
            .ok_or_else(|| CompileError::FileNotFound {
                path: entry.to_string(),
            })?;
        let source = ResolvedSource {
            backing_path: entry.to_string(),
            syntax,
            content,
        };

        let backend = self
            .backends
            .for_syntax(source.syntax)
            .ok_or_else(|| CompileError::NoBackend {
                syntax: source.syntax,
                path: source.backing_path.clone(),
            })?;

        source.validate(options.encoding)?;
        let importer = StoreImporter::new(self.host.store, dialect, options.encoding);

        tracing::debug!(
            entry,
            %syntax,
            backend = backend.name(),
            compress = options.compress,
            "compiling"
        );

        let tree = backend.parse(&source, &importer)?;
        let css = tree.render(&RenderOptions {
            compress: options.compress,
        })?;

        if css.is_empty() {
            return Err(CompileError::EmptyOutput {
                path: source.backing_path,
            });
        }
        Ok(css)
    }

    /// The single-compile embed contract: compile one file and hand the
    /// failure, if any, straight back to the caller.
    pub fn compile_one(
        &self,
        path: &str,
        encoding: Encoding,
        compress: bool,
    ) -> Result<String, CompileError> {
        self.host.log.debug(&format!("Compiling {} ...", path));
        self.compile(path, &CompileOptions::new(encoding).with_compress(compress))
    }
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("backends", self.backends)
            .field("default_dialect", &self.default_dialect)
            .finish()
    }
}
