//! Stylesheet syntaxes and the dialects that group them.
//!
//! Copyright (c) 2025 Posit, PBC

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Concrete syntax of a resolved source.
///
/// Always determined by which lookup rule matched, never by sniffing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
    /// Indented Sass (`.sass`)
    IndentedSass,
    /// Brace-delimited Sass (`.scss`)
    Scss,
    /// LESS-like delimiter syntax (`.less`)
    LessLike,
}

impl Syntax {
    pub fn extension(self) -> &'static str {
        match self {
            Syntax::IndentedSass => "sass",
            Syntax::Scss => "scss",
            Syntax::LessLike => "less",
        }
    }

    pub fn dialect(self) -> Dialect {
        match self {
            Syntax::IndentedSass | Syntax::Scss => Dialect::Sass,
            Syntax::LessLike => Dialect::Less,
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A preprocessor family: one backend, one extension priority table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Sass,
    Less,
}

const SASS_EXTENSIONS: &[(&str, Syntax)] = &[("sass", Syntax::IndentedSass), ("scss", Syntax::Scss)];
const LESS_EXTENSIONS: &[(&str, Syntax)] = &[("less", Syntax::LessLike)];

impl Dialect {
    /// Recognized extensions in lookup priority order.
    pub fn extensions(self) -> &'static [(&'static str, Syntax)] {
        match self {
            Dialect::Sass => SASS_EXTENSIONS,
            Dialect::Less => LESS_EXTENSIONS,
        }
    }

    /// The syntax mapped to `ext`, if this dialect recognizes it.
    pub fn syntax_for(self, ext: &str) -> Option<Syntax> {
        self.extensions()
            .iter()
            .find(|(candidate, _)| *candidate == ext)
            .map(|(_, syntax)| *syntax)
    }

    /// Syntax assumed for an entry whose extension names none.
    pub fn default_syntax(self) -> Syntax {
        match self {
            Dialect::Sass => Syntax::Scss,
            Dialect::Less => Syntax::LessLike,
        }
    }

    /// Detect the dialect of a path from its extension.
    pub fn detect(path: &str) -> Option<Dialect> {
        let base = path.rsplit('/').next().unwrap_or(path);
        let (_, ext) = base.rsplit_once('.')?;
        [Dialect::Sass, Dialect::Less]
            .into_iter()
            .find(|d| d.syntax_for(ext).is_some())
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Sass => "SASS",
            Dialect::Less => "LESS",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sass" | "scss" => Ok(Dialect::Sass),
            "less" => Ok(Dialect::Less),
            other => Err(format!("unknown dialect '{}' (expected sass or less)", other)),
        }
    }
}
