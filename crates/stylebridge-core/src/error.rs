//! Error types for stylesheet compilation.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Failures are classified where they are captured. A structured syntax
//! diagnostic from a backend is a [`ParseError`]; anything that only has a
//! message (and perhaps a trace) is [`CompileError::Raw`]. Reporting never
//! has to guess which one it is holding.

use std::fmt;

use stylebridge_runtime::RuntimeError;
use thiserror::Error;

use crate::syntax::Syntax;

/// A structured syntax-level diagnostic reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    /// 1-based line number.
    pub line: usize,
    /// 0-based column. Displayed 1-based.
    pub column: usize,
    /// Previous line, error line, next line. Outer slots are `None` at file
    /// boundaries.
    pub extract: [Option<String>; 3],
    /// The file the error originated in, when it differs from the entry file.
    pub origin_file: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            extract: [None, None, None],
            origin_file: None,
        }
    }

    /// Attach an extract taken from `source` around this error's line.
    pub fn with_extract_from(mut self, source: &str) -> Self {
        self.extract = extract_lines(source, self.line);
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin_file = Some(origin.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}] {}", self.line, self.column + 1, self.message)
    }
}

impl std::error::Error for ParseError {}

/// The three-line window around 1-based `line` in `source`.
pub fn extract_lines(source: &str, line: usize) -> [Option<String>; 3] {
    let lines: Vec<&str> = source.lines().collect();
    let at = |n: usize| -> Option<String> {
        if n == 0 {
            return None;
        }
        lines.get(n - 1).map(|l| l.to_string())
    };
    [at(line.saturating_sub(1)), at(line), at(line + 1)]
}

/// Errors that can occur while compiling one entry file.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The entry file (or an import target) is absent from the store.
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Structured syntax diagnostic from a backend.
    #[error("{0}")]
    Parse(ParseError),

    /// The backend reported success but produced no CSS.
    #[error("Could not parse included file: no output produced for {path}")]
    EmptyOutput { path: String },

    /// A host-level failure with only a message and possibly a trace.
    #[error("{message}")]
    Raw {
        message: String,
        trace: Option<String>,
    },

    /// No backend is registered for the resolved syntax.
    #[error("No backend registered for {syntax} sources ({path})")]
    NoBackend { syntax: Syntax, path: String },

    /// Source bytes could not be decoded.
    #[error("{0}")]
    Decode(#[source] RuntimeError),

    /// Writing the compiled artifact failed.
    #[error("Could not write CSS file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: RuntimeError,
    },
}

impl CompileError {
    pub fn raw(message: impl Into<String>) -> Self {
        CompileError::Raw {
            message: message.into(),
            trace: None,
        }
    }

    /// The structured diagnostic, if this is one.
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            CompileError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError::Parse(e)
    }
}

/// Either a compiled stylesheet or the reason it failed.
pub type CompileOutcome = Result<String, CompileError>;
