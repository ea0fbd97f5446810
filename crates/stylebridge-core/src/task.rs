//! Scanned builds: find every source of a dialect and compile what is stale.
//!
//! Copyright (c) 2025 Posit, PBC

use glob::{MatchOptions, Pattern};
use stylebridge_runtime::Host;
use thiserror::Error;

use crate::backend::Backends;
use crate::batch::{BatchRunner, Layout};
use crate::config::{BridgeConfig, DialectConfig};
use crate::report::ErrorReporter;
use crate::syntax::Dialect;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("{failed} of {total} {dialect} file(s) failed to compile")]
    CompilationFailed {
        dialect: Dialect,
        failed: usize,
        total: usize,
    },
}

/// Counts from a finished build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// The task was configured to skip and did nothing.
    pub skipped: bool,
    pub compiled: usize,
    pub up_to_date: usize,
    pub failed: usize,
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, BuildError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|source| BuildError::Pattern {
                pattern: p.clone(),
                source,
            })
        })
        .collect()
}

/// Builds every source of one dialect under the source root.
pub struct BuildTask<'a> {
    host: Host<'a>,
    backends: &'a Backends,
    dialect: Dialect,
    settings: DialectConfig,
    config: BridgeConfig,
}

impl<'a> BuildTask<'a> {
    pub fn new(
        host: Host<'a>,
        backends: &'a Backends,
        config: &BridgeConfig,
        dialect: Dialect,
    ) -> Self {
        Self {
            host,
            backends,
            dialect,
            settings: config.dialect(dialect),
            config: config.clone(),
        }
    }

    /// Replace the settings taken from the configuration.
    pub fn with_settings(mut self, settings: DialectConfig) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &DialectConfig {
        &self.settings
    }

    fn layout(&self) -> Layout {
        Layout::new(&self.config.source_root, &self.config.target_root)
    }

    /// Source names, relative to the source root, that the include and
    /// exclude patterns select. Sorted.
    pub fn scan(&self) -> Result<Vec<String>, BuildError> {
        let includes = compile_patterns(&self.settings.includes)?;
        let excludes = compile_patterns(&self.settings.excludes)?;
        let prefix = format!("{}/", self.config.source_root.trim_end_matches('/'));

        let mut names: Vec<String> = self
            .host
            .store
            .list(&self.config.source_root)
            .into_iter()
            .filter_map(|path| path.strip_prefix(&prefix).map(str::to_string))
            .filter(|name| includes.iter().any(|p| p.matches_with(name, MATCH_OPTIONS)))
            .filter(|name| !excludes.iter().any(|p| p.matches_with(name, MATCH_OPTIONS)))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// True when the output exists and its source is older than it.
    fn is_up_to_date(&self, layout: &Layout, name: &str) -> bool {
        let store = self.host.store;
        match (
            store.mtime(&layout.input_path(name)),
            store.mtime(&layout.output_path(name)),
        ) {
            (Some(source), Some(output)) => source < output,
            _ => false,
        }
    }

    pub fn execute(&self) -> Result<BuildReport, BuildError> {
        let log = self.host.log;
        if self.settings.skip {
            log.debug(&format!("{} compilation skipped", self.dialect));
            return Ok(BuildReport {
                skipped: true,
                ..BuildReport::default()
            });
        }

        let layout = self.layout();
        let names = self.scan()?;
        if names.is_empty() {
            log.debug(&format!(
                "No {} sources found under {}",
                self.dialect, layout.source_root
            ));
            return Ok(BuildReport::default());
        }

        let (stale, fresh): (Vec<String>, Vec<String>) = names
            .into_iter()
            .partition(|name| self.settings.force_if_older || !self.is_up_to_date(&layout, name));
        for name in &fresh {
            log.debug(&format!("{} is up to date", name));
        }

        tracing::debug!(
            dialect = %self.dialect,
            stale = stale.len(),
            fresh = fresh.len(),
            "scanned sources"
        );

        let mut report = BuildReport {
            up_to_date: fresh.len(),
            ..BuildReport::default()
        };
        if stale.is_empty() {
            return Ok(report);
        }

        log.debug(&format!(
            "Compiling {} {} file(s) to {}",
            stale.len(),
            self.dialect,
            layout.target_root
        ));
        let runner = BatchRunner::new(self.host, self.backends)
            .with_layout(layout)
            .with_encoding(self.config.encoding)
            .with_reporter(ErrorReporter::new(self.config.show_error_extracts))
            .with_default_dialect(self.dialect);
        let result = runner.run_all(&stale, self.settings.compress);

        report.compiled = result.succeeded();
        report.failed = result.failed();

        if result.any_failure && self.settings.fail_on_error {
            return Err(BuildError::CompilationFailed {
                dialect: self.dialect,
                failed: report.failed,
                total: result.per_file.len(),
            });
        }
        Ok(report)
    }
}

impl std::fmt::Debug for BuildTask<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildTask")
            .field("dialect", &self.dialect)
            .field("settings", &self.settings)
            .field("backends", self.backends)
            .finish()
    }
}
