//! Batch compilation over a list of command-line style tokens.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Tokens are scanned left to right. [`COMPRESS_FLAG`] turns compression on
//! for every input that follows it in the same run; any other token is an
//! input name under the source root. Each input is compiled on its own and a
//! failure never stops the run. It only shows up in the aggregate result.

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use stylebridge_runtime::{Encoding, Host, join_logical};

use crate::backend::Backends;
use crate::error::{CompileError, CompileOutcome};
use crate::report::ErrorReporter;
use crate::session::{CompileOptions, Session};
use crate::syntax::Dialect;

/// Token that enables compression for the rest of the run.
pub const COMPRESS_FLAG: &str = "-x";

/// Where inputs are read from and outputs written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub source_root: String,
    pub target_root: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            source_root: "/virtual".to_string(),
            target_root: "/target".to_string(),
        }
    }
}

impl Layout {
    pub fn new(source_root: impl Into<String>, target_root: impl Into<String>) -> Self {
        Self {
            source_root: source_root.into(),
            target_root: target_root.into(),
        }
    }

    pub fn input_path(&self, name: &str) -> String {
        join_logical(&self.source_root, name)
    }

    pub fn output_path(&self, name: &str) -> String {
        join_logical(&self.target_root, &output_name(name))
    }
}

/// `name` with the extension of its final segment replaced by `.css`.
pub fn output_name(name: &str) -> String {
    let (dir, base) = match name.rfind('/') {
        Some(idx) => name.split_at(idx + 1),
        None => ("", name),
    };
    let stem = base.rfind('.').map_or(base, |dot| &base[..dot]);
    format!("{}{}.css", dir, stem)
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Every input in the order it was processed.
    pub per_file: Vec<(String, CompileOutcome)>,
    pub any_failure: bool,
}

impl BatchResult {
    fn record(&mut self, name: &str, outcome: CompileOutcome) {
        self.any_failure |= outcome.is_err();
        self.per_file.push((name.to_string(), outcome));
    }

    pub fn succeeded(&self) -> usize {
        self.per_file.iter().filter(|(_, o)| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.per_file.len() - self.succeeded()
    }

    /// Process exit status for this run: 1 if anything failed, otherwise 0.
    pub fn exit_code(&self) -> i32 {
        if self.any_failure { 1 } else { 0 }
    }
}

/// Compiles inputs one after another and writes one artifact per success.
pub struct BatchRunner<'a> {
    session: Session<'a>,
    reporter: ErrorReporter,
    layout: Layout,
    encoding: Encoding,
}

impl<'a> BatchRunner<'a> {
    pub fn new(host: Host<'a>, backends: &'a Backends) -> Self {
        Self {
            session: Session::new(host, backends),
            reporter: ErrorReporter::default(),
            layout: Layout::default(),
            encoding: Encoding::default(),
        }
    }

    pub fn with_reporter(mut self, reporter: ErrorReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_default_dialect(mut self, dialect: Dialect) -> Self {
        self.session = self.session.with_default_dialect(dialect);
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Scan `argv` and compile every input named in it.
    pub fn run<S: AsRef<str>>(&self, argv: &[S]) -> BatchResult {
        let start = (CompileOptions::new(self.encoding), BatchResult::default());
        let (_, result) = argv
            .iter()
            .fold(start, |(options, mut result), token| match token.as_ref() {
                COMPRESS_FLAG => (options.with_compress(true), result),
                name => {
                    result.record(name, self.process(name, &options));
                    (options, result)
                }
            });
        self.finish(result)
    }

    /// Compile `names` with the same options for every input.
    pub fn run_all<S: AsRef<str>>(&self, names: &[S], compress: bool) -> BatchResult {
        let options = CompileOptions::new(self.encoding).with_compress(compress);
        let mut result = BatchResult::default();
        for name in names {
            let name = name.as_ref();
            result.record(name, self.process(name, &options));
        }
        self.finish(result)
    }

    fn finish(&self, result: BatchResult) -> BatchResult {
        tracing::debug!(
            compiled = result.succeeded(),
            failed = result.failed(),
            "batch finished"
        );
        self.session.host().log.debug("Finished");
        result
    }

    fn process(&self, name: &str, options: &CompileOptions) -> CompileOutcome {
        let host = self.session.host();
        let input = self.layout.input_path(name);
        let output = self.layout.output_path(name);

        if host.store.find(&input).is_none() {
            host.log.warn(&format!("{}: File not found", name));
            return Err(CompileError::FileNotFound { path: input });
        }

        host.log.debug(&format!("Compiling {} to {} ...", name, output));

        let compiled = guard_backend(|| self.session.compile(&input, options));

        let written = compiled.and_then(|css| {
            host.writer
                .write(&output, css.as_bytes())
                .map_err(|source| CompileError::Write {
                    path: output.clone(),
                    source,
                })?;
            Ok(css)
        });

        match written {
            Ok(css) => {
                host.log.debug(&format!("Compiled {}", output));
                Ok(css)
            }
            Err(e) => {
                self.reporter.report(&e, name, host.log);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for BatchRunner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("session", &self.session)
            .field("reporter", &self.reporter)
            .field("layout", &self.layout)
            .field("encoding", &self.encoding)
            .finish()
    }
}

thread_local! {
    static IN_BACKEND: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Wrap the process panic hook so it stays silent while a backend runs on
/// this thread. The failure is reported as [`CompileError::Raw`] instead.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !IN_BACKEND.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

/// Run one compile, turning a backend panic into a failed outcome.
fn guard_backend(compile: impl FnOnce() -> CompileOutcome) -> CompileOutcome {
    install_quiet_hook();
    IN_BACKEND.with(|flag| flag.set(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(compile));
    IN_BACKEND.with(|flag| flag.set(false));
    outcome.unwrap_or_else(|payload| Err(CompileError::raw(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("backend panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("backend panicked: {}", s)
    } else {
        "backend panicked".to_string()
    }
}
