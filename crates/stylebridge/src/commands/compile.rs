/*
 * compile.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Compile command implementation
 */

//! Compile command implementation.
//!
//! `stylebridge compile` is the raw batch mode: every token is either the
//! compression flag or an input name, processed in order.

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use stylebridge_core::{Backends, BatchRunner, ErrorReporter, Layout};
use stylebridge_runtime::{Encoding, Host, TracingSink};

/// Arguments for the compile command
#[derive(Debug)]
pub struct CompileArgs {
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    pub config: Option<PathBuf>,
    /// Overrides the configured encoding
    pub encoding: Option<Encoding>,
    pub show_extracts: bool,
    pub tokens: Vec<String>,
}

/// Execute the compile command, returning the process exit status
pub fn execute(args: CompileArgs) -> Result<i32> {
    let config = super::load_config(args.config.as_deref())?;
    let store = super::mount(&config, &args.source_dir, &args.target_dir)?;
    let sink = TracingSink;
    let host = Host::new(&store, &store, &sink);
    let backends = Backends::with_defaults();

    let runner = BatchRunner::new(host, &backends)
        .with_layout(Layout::new(&config.source_root, &config.target_root))
        .with_encoding(args.encoding.unwrap_or(config.encoding))
        .with_reporter(ErrorReporter::new(
            args.show_extracts || config.show_error_extracts,
        ))
        .with_default_dialect(config.default_dialect);

    let result = runner.run(&args.tokens);

    info!(
        "Processed {} files: {} succeeded, {} failed",
        result.per_file.len(),
        result.succeeded(),
        result.failed()
    );

    Ok(result.exit_code())
}
