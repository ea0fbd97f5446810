//! Stylesheet compilation against a virtual file tree.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! This crate provides:
//! - Import resolution with the partial (`_name`) convention ([`StoreImporter`])
//! - The backend seam and a grass-backed Sass/SCSS backend
//! - Compile sessions and the single-compile embed contract ([`Session`])
//! - Batch runs over command-line tokens ([`BatchRunner`])
//! - Diagnostic formatting ([`ErrorReporter`])
//! - TOML configuration and scanned builds ([`BridgeConfig`], [`BuildTask`])

mod backend;
mod batch;
mod config;
mod error;
mod report;
mod resolve;
mod sass;
mod session;
mod syntax;
mod task;

pub use backend::{Backend, Backends, RenderOptions, RenderTree};
pub use batch::{BatchResult, BatchRunner, COMPRESS_FLAG, Layout, output_name};
pub use config::{BridgeConfig, ConfigError, DialectConfig};
pub use error::{CompileError, CompileOutcome, ParseError, extract_lines};
pub use report::{Diagnostic, ErrorReporter};
pub use resolve::{
    Candidate, ImportKey, Importer, ReferenceParts, ResolvedSource, StoreImporter,
    StylesheetReference, candidates, relative_root,
};
pub use sass::{GrassBackend, ImporterFs};
pub use session::{CompileOptions, Session};
pub use syntax::{Dialect, Syntax};
pub use task::{BuildError, BuildReport, BuildTask};
