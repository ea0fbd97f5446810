//! Tests for host-registered backends.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! The delimiter dialect has no built-in engine, so hosts register their own.
//! These tests register a tiny line-oriented engine and drive it through the
//! public session, batch and reporting APIs.

use std::sync::Mutex;
use std::time::SystemTime;

use stylebridge_core::{
    Backend, Backends, BatchRunner, CompileError, CompileOptions, ErrorReporter, Importer,
    ParseError, RenderOptions, RenderTree, ResolvedSource, Session, Syntax,
};
use stylebridge_runtime::{Host, MemoryStore, RecordingSink, VirtualFileStore};

/// Inlines `@import "x";` lines, fails on `!error`, copies everything else.
struct LineEngine;

struct Flat(String);

impl RenderTree for Flat {
    fn render(&self, options: &RenderOptions) -> Result<String, CompileError> {
        if options.compress {
            Ok(self.0.lines().map(str::trim).collect())
        } else {
            Ok(self.0.clone())
        }
    }
}

fn expand(
    entry: &str,
    source: &ResolvedSource,
    importer: &dyn Importer,
) -> Result<String, CompileError> {
    let text = source.text(importer.encoding())?;
    let mut out = String::new();
    for (idx, line) in text.lines().enumerate() {
        if let Some(uri) = line
            .strip_prefix("@import \"")
            .and_then(|rest| rest.strip_suffix("\";"))
        {
            let nested = importer
                .find_relative(uri, &source.backing_path)
                .ok_or_else(|| CompileError::FileNotFound {
                    path: uri.to_string(),
                })?;
            out.push_str(&expand(entry, &nested, importer)?);
        } else if let Some(column) = line.find("!error") {
            let mut error =
                ParseError::new("Unrecognised input", idx + 1, column).with_extract_from(&text);
            if source.backing_path != entry {
                error = error.with_origin(&source.backing_path);
            }
            return Err(error.into());
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    Ok(out)
}

impl Backend for LineEngine {
    fn name(&self) -> &'static str {
        "line-engine"
    }

    fn syntaxes(&self) -> &[Syntax] {
        &[Syntax::LessLike]
    }

    fn parse<'a>(
        &self,
        source: &ResolvedSource,
        importer: &'a dyn Importer,
    ) -> Result<Box<dyn RenderTree + 'a>, CompileError> {
        let body = expand(&source.backing_path, source, importer)?;
        Ok(Box::new(Flat(body)))
    }
}

/// Records every path read from the wrapped store.
struct CountingStore {
    inner: MemoryStore,
    reads: Mutex<Vec<String>>,
}

impl CountingStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            reads: Mutex::new(Vec::new()),
        }
    }

    fn reads_of(&self, path: &str) -> usize {
        self.reads.lock().unwrap().iter().filter(|p| *p == path).count()
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

fn less_site() -> MemoryStore {
    MemoryStore::new()
        .with_file(
            "/virtual/site.less",
            "@import \"lib/colors\";\n.site { color: @brand; }\n",
        )
        .with_file("/virtual/lib/_colors.less", "@brand: red;\n@import \"mixins\";\n")
        .with_file("/virtual/lib/mixins.less", ".m { margin: 0; }\n")
}

#[test]
fn test_nested_imports_resolve_relative_to_importing_file() {
    let store = less_site();
    let sink = RecordingSink::new();
    let backends = Backends::with_defaults().register(LineEngine);
    let session = Session::new(Host::new(&store, &store, &sink), &backends);

    let css = session
        .compile("/virtual/site.less", &CompileOptions::default())
        .unwrap();

    assert_eq!(
        css,
        "@brand: red;\n.m { margin: 0; }\n.site { color: @brand; }\n"
    );
}

#[test]
fn test_repeated_imports_are_read_every_time() {
    let store = CountingStore::new(
        MemoryStore::new()
            .with_file(
                "/virtual/site.less",
                "@import \"shared\";\n@import \"shared\";\n",
            )
            .with_file("/virtual/shared.less", ".s { a: b; }\n"),
    );
    let writer = MemoryStore::new();
    let sink = RecordingSink::new();
    let backends = Backends::new().register(LineEngine);
    let session = Session::new(Host::new(&store, &writer, &sink), &backends);

    let css = session
        .compile("/virtual/site.less", &CompileOptions::default())
        .unwrap();

    assert_eq!(css.matches(".s").count(), 2);
    assert_eq!(store.reads_of("/virtual/shared.less"), 2);
}

#[test]
fn test_error_in_import_is_attributed_to_that_file() {
    let store = MemoryStore::new()
        .with_file("/virtual/site.less", "@import \"broken\";\n")
        .with_file("/virtual/_broken.less", ".a {\n  b: c !error;\n}\n");
    let sink = RecordingSink::new();
    let backends = Backends::new().register(LineEngine);
    let session = Session::new(Host::new(&store, &store, &sink), &backends);

    let err = session
        .compile("/virtual/site.less", &CompileOptions::default())
        .unwrap_err();
    let diagnostic = ErrorReporter::new(true).report(&err, "/virtual/site.less", &sink);

    assert_eq!(
        diagnostic.lines,
        vec![
            "/virtual/_broken.less:[2,8] Unrecognised input",
            "  1:.a {",
            "  2:  b: c !error;",
            "  3:}",
        ]
    );
    assert_eq!(sink.warnings().len(), 1);
}

#[test]
fn test_compile_one_raises_to_caller() {
    let store = MemoryStore::new().with_file("/virtual/site.less", "@import \"nowhere\";\n");
    let sink = RecordingSink::new();
    let backends = Backends::new().register(LineEngine);
    let session = Session::new(Host::new(&store, &store, &sink), &backends);

    let err = session
        .compile_one("/virtual/site.less", Default::default(), false)
        .unwrap_err();

    assert!(matches!(err, CompileError::FileNotFound { path } if path == "nowhere"));
    assert!(sink.warnings().is_empty());
}

#[test]
fn test_mixed_batch() {
    let store = less_site()
        .with_file("/virtual/theme.scss", ".t { margin: 0; }\n")
        .with_file("/virtual/broken.less", "!error\n");
    let sink = RecordingSink::new();
    let backends = Backends::with_defaults().register(LineEngine);
    let runner = BatchRunner::new(Host::new(&store, &store, &sink), &backends);

    let result = runner.run(&["theme.scss", "-x", "site.less", "broken.less", "gone.less"]);

    assert!(result.any_failure);
    assert_eq!(result.exit_code(), 1);
    assert_eq!(result.succeeded(), 2);
    assert_eq!(result.failed(), 2);

    assert!(store.read_string("/target/theme.css").unwrap().contains("{\n"));
    assert_eq!(
        store.read_string("/target/site.css").unwrap(),
        "@brand: red;.m { margin: 0; }.site { color: @brand; }"
    );
    assert_eq!(
        sink.warnings(),
        vec![
            "broken.less:[1,1] Unrecognised input",
            "gone.less: File not found",
        ]
    );
}

#[test]
fn test_less_entry_without_engine() {
    let store = less_site();
    let sink = RecordingSink::new();
    let backends = Backends::with_defaults();
    let runner = BatchRunner::new(Host::new(&store, &store, &sink), &backends);

    let result = runner.run(&["site.less"]);

    assert!(result.any_failure);
    assert!(matches!(
        result.per_file[0].1,
        Err(CompileError::NoBackend {
            syntax: Syntax::LessLike,
            ..
        })
    ));
}
