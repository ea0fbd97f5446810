/*
 * build.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Build command implementation
 */

//! Build command implementation.
//!
//! `stylebridge build` scans the source root for each dialect and compiles
//! the sources whose outputs are missing or older than they are.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, warn};

use stylebridge_core::{Backends, BuildError, BuildTask, Dialect};
use stylebridge_runtime::{Host, TracingSink};

/// Arguments for the build command
#[derive(Debug)]
pub struct BuildArgs {
    pub config: Option<PathBuf>,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    /// Only this dialect; both when absent
    pub dialect: Option<Dialect>,
    pub force: bool,
}

/// Execute the build command, returning the process exit status
pub fn execute(args: BuildArgs) -> Result<i32> {
    let config = super::load_config(args.config.as_deref())?;
    let store = super::mount(&config, &args.source_dir, &args.target_dir)?;
    let sink = TracingSink;
    let host = Host::new(&store, &store, &sink);
    let backends = Backends::with_defaults();

    let dialects = match args.dialect {
        Some(dialect) => vec![dialect],
        None => vec![Dialect::Sass, Dialect::Less],
    };

    let mut status = 0;
    for dialect in dialects {
        let mut settings = config.dialect(dialect);
        settings.force_if_older |= args.force;
        let task = BuildTask::new(host, &backends, &config, dialect).with_settings(settings);

        match task.execute() {
            Ok(report) if report.skipped => {}
            Ok(report) => info!(
                "{}: {} compiled, {} up to date, {} failed",
                dialect, report.compiled, report.up_to_date, report.failed
            ),
            Err(e @ BuildError::CompilationFailed { .. }) => {
                warn!("{}", e);
                status = 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(status)
}
