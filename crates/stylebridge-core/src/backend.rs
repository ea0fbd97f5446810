//! The seam between compile sessions and preprocessor engines.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! A backend turns one resolved source into a render tree, calling back into
//! an [`Importer`] for every import it meets, and the tree renders to CSS.
//! Grammars live entirely on the far side of this trait.

use std::collections::HashMap;

use crate::error::CompileError;
use crate::resolve::{Importer, ResolvedSource};
use crate::sass::GrassBackend;
use crate::syntax::Syntax;

/// Options that only affect rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub compress: bool,
}

/// A parsed stylesheet, ready to render.
pub trait RenderTree {
    fn render(&self, options: &RenderOptions) -> Result<String, CompileError>;
}

/// A preprocessor engine.
pub trait Backend: Send + Sync {
    /// Human-readable engine name, used in log output.
    fn name(&self) -> &'static str;

    /// Syntaxes this backend parses.
    fn syntaxes(&self) -> &[Syntax];

    /// Parse `source`, resolving nested imports through `importer`.
    ///
    /// Syntax errors come back as [`CompileError::Parse`].
    fn parse<'a>(
        &self,
        source: &ResolvedSource,
        importer: &'a dyn Importer,
    ) -> Result<Box<dyn RenderTree + 'a>, CompileError>;
}

/// Registry of backends keyed by syntax. Later registrations replace earlier
/// ones for the syntaxes they claim.
#[derive(Default)]
pub struct Backends {
    backends: Vec<Box<dyn Backend>>,
    by_syntax: HashMap<Syntax, usize>,
}

impl Backends {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with every built-in backend (grass for Sass and SCSS).
    pub fn with_defaults() -> Self {
        Self::new().register(GrassBackend::new())
    }

    pub fn register(mut self, backend: impl Backend + 'static) -> Self {
        let idx = self.backends.len();
        for syntax in backend.syntaxes() {
            self.by_syntax.insert(*syntax, idx);
        }
        self.backends.push(Box::new(backend));
        self
    }

    pub fn for_syntax(&self, syntax: Syntax) -> Option<&dyn Backend> {
        self.by_syntax
            .get(&syntax)
            .map(|idx| self.backends[*idx].as_ref())
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.backends.iter().map(|b| b.name()))
            .finish()
    }
}
