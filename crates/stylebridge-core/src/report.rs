//! Turning compile failures into user-facing diagnostics.
//!
//! Copyright (c) 2025 Posit, PBC

use std::fmt;

use stylebridge_runtime::LogSink;

use crate::error::CompileError;

/// A formatted diagnostic, one entry per emitted line.
///
/// A raw failure's trace is kept as a single entry so it is reproduced
/// verbatim, embedded newlines included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub lines: Vec<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorReporter {
    pub show_extracts: bool,
}

impl ErrorReporter {
    pub fn new(show_extracts: bool) -> Self {
        Self { show_extracts }
    }

    /// Format `error`, attributing it to `fallback` unless the error records
    /// the file it came from.
    pub fn format(&self, error: &CompileError, fallback: &str) -> Diagnostic {
        let mut lines = Vec::new();
        match error {
            CompileError::Parse(parse) => {
                let filename = parse.origin_file.as_deref().unwrap_or(fallback);
                lines.push(format!("{}:{}", filename, parse));
                if self.show_extracts {
                    for (offset, slot) in parse.extract.iter().enumerate() {
                        if let Some(text) = slot {
                            let number = (parse.line + offset).saturating_sub(1);
                            lines.push(format!("  {}:{}", number, text));
                        }
                    }
                }
            }
            CompileError::Raw { message, trace } => {
                lines.push(format!("{}: {}", fallback, message));
                if let Some(trace) = trace {
                    lines.push(trace.clone());
                }
            }
            other => lines.push(format!("{}: {}", fallback, other)),
        }
        Diagnostic { lines }
    }

    /// Format `error` and emit it on the warning channel.
    pub fn report(&self, error: &CompileError, fallback: &str, log: &dyn LogSink) -> Diagnostic {
        let diagnostic = self.format(error, fallback);
        log.warn(&diagnostic.to_string());
        diagnostic
    }
}
