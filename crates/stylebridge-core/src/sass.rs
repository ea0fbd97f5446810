//! Sass and SCSS backend built on the grass crate.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! grass is a pure Rust implementation of dart-sass. It looks for import
//! candidates on its own, through the `grass::Fs` trait, and its search order
//! differs from the resolver's. [`ImporterFs`] recovers the reference each
//! `@import` was written as from the first path grass checks for it, asks the
//! [`Importer`] for that reference once, and then reports only the chosen
//! backing file as present.

use std::cell::RefCell;
use std::fmt::Debug;
use std::io;
use std::path::Path;

use grass::OutputStyle;

use crate::backend::{Backend, RenderOptions, RenderTree};
use crate::error::{CompileError, ParseError};
use crate::resolve::{Importer, ResolvedSource};
use crate::syntax::Syntax;

/// State of the import grass is currently looking up.
#[derive(Debug, Default)]
struct ImportLookup {
    /// Backing path the resolver chose for the current import.
    chosen: Option<String>,
    /// The next check is the partial twin of the opening check.
    skip_next: bool,
}

/// Adapter that implements `grass::Fs` on top of an [`Importer`].
pub struct ImporterFs<'a> {
    importer: &'a dyn Importer,
    lookup: RefCell<ImportLookup>,
}

impl<'a> ImporterFs<'a> {
    pub fn new(importer: &'a dyn Importer) -> Self {
        Self {
            importer,
            lookup: RefCell::new(ImportLookup::default()),
        }
    }
}

impl Debug for ImporterFs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImporterFs")
            .field("importer", &"<Importer>")
            .field("lookup", &self.lookup)
            .finish()
    }
}

const EXPLICIT_EXTENSIONS: [&str; 3] = ["scss", "sass", "css"];

/// The reference an import was written as, when `candidate` is the first
/// path grass tries for it.
///
/// grass opens every lookup with an `.import` variant: `<ref>.import.sass`
/// for a bare reference, and `<stem>..import<ext>` for one written with an
/// explicit extension. Any other path returns `None`.
fn written_reference(candidate: &str) -> Option<String> {
    if let Some(reference) = candidate.strip_suffix(".import.sass") {
        return Some(reference.to_string());
    }
    EXPLICIT_EXTENSIONS.iter().find_map(|ext| {
        candidate
            .strip_suffix(&format!("..import{}", ext))
            .map(|stem| format!("{}.{}", stem, ext))
    })
}

impl grass::Fs for ImporterFs<'_> {
    fn is_dir(&self, _path: &Path) -> bool {
        // Directory index imports are not part of the lookup convention.
        false
    }

    fn is_file(&self, path: &Path) -> bool {
        let Some(candidate) = path.to_str() else {
            return false;
        };
        let mut lookup = self.lookup.borrow_mut();
        if std::mem::take(&mut lookup.skip_next) {
            return false;
        }
        if let Some(reference) = written_reference(candidate) {
            lookup.chosen = self
                .importer
                .find(&reference)
                .map(|resolved| resolved.backing_path);
            lookup.skip_next = true;
            tracing::trace!(
                reference = %reference,
                chosen = ?lookup.chosen,
                "import lookup"
            );
            return false;
        }
        lookup.chosen.as_deref() == Some(candidate)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let path = path.to_string_lossy();
        let content = self.importer.load(&path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("File not found: {}", path))
        })?;
        let text = self
            .importer
            .encoding()
            .decode(&path, &content)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        Ok(text.into_bytes())
    }
}

/// Convert a grass failure into the structured taxonomy.
fn convert_error(err: grass::Error, entry: &str) -> CompileError {
    match err.kind() {
        grass::ErrorKind::ParseError { message, loc, .. } => {
            let file = loc.file.name();
            let mut error = ParseError::new(message, loc.begin.line + 1, loc.begin.column)
                .with_extract_from(loc.file.source());
            if file != entry {
                error = error.with_origin(file);
            }
            CompileError::Parse(error)
        }
        grass::ErrorKind::IoError(e) => CompileError::Raw {
            message: e.to_string(),
            trace: None,
        },
        grass::ErrorKind::FromUtf8Error(message) => CompileError::raw(message),
        #[allow(unreachable_patterns)]
        _ => CompileError::raw(format!("grass failed on {}", entry)),
    }
}

/// The grass-backed engine for `.sass` and `.scss` sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrassBackend;

impl GrassBackend {
    pub fn new() -> Self {
        Self
    }
}

const GRASS_SYNTAXES: &[Syntax] = &[Syntax::IndentedSass, Syntax::Scss];

impl Backend for GrassBackend {
    fn name(&self) -> &'static str {
        "grass"
    }

    fn syntaxes(&self) -> &[Syntax] {
        GRASS_SYNTAXES
    }

    /// grass has no separate parse step, so parsing compiles once in
    /// expanded style. That surfaces syntax errors here and leaves the
    /// expanded output ready for an uncompressed render.
    fn parse<'a>(
        &self,
        source: &ResolvedSource,
        importer: &'a dyn Importer,
    ) -> Result<Box<dyn RenderTree + 'a>, CompileError> {
        let mut tree = GrassTree {
            entry: source.backing_path.clone(),
            importer,
            expanded: String::new(),
        };
        tree.expanded = tree.compile(OutputStyle::Expanded)?;
        Ok(Box::new(tree))
    }
}

struct GrassTree<'a> {
    entry: String,
    importer: &'a dyn Importer,
    expanded: String,
}

impl GrassTree<'_> {
    fn compile(&self, style: OutputStyle) -> Result<String, CompileError> {
        let fs = ImporterFs::new(self.importer);
        let options = grass::Options::default().fs(&fs).style(style);
        grass::from_path(&self.entry, &options).map_err(|e| convert_error(*e, &self.entry))
    }
}

impl RenderTree for GrassTree<'_> {
    fn render(&self, options: &RenderOptions) -> Result<String, CompileError> {
        if options.compress {
            self.compile(OutputStyle::Compressed)
        } else {
            Ok(self.expanded.clone())
        }
    }
}
