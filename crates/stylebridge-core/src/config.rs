//! Bridge configuration loaded from TOML.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Every key is optional. A missing file section falls back to the defaults
//! for that dialect, and a partially filled section only overrides the keys
//! it names.
//!
//! ```toml
//! source_root = "/virtual"
//! target_root = "/target"
//! encoding = "utf-8"
//! show_error_extracts = true
//!
//! [sass]
//! excludes = ["**/_*.scss", "vendor/**"]
//!
//! [less]
//! compress = false
//! ```

use std::path::Path;

use serde::Deserialize;
use stylebridge_runtime::Encoding;
use thiserror::Error;

use crate::syntax::Dialect;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config{}: {source}", .path.as_ref().map(|p| format!(" in {}", p)).unwrap_or_default())]
    Parse {
        path: Option<String>,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Logical root inputs are read from.
    pub source_root: String,
    /// Logical root outputs are written to.
    pub target_root: String,
    pub encoding: Encoding,
    /// Print the three-line source window under parse errors.
    pub show_error_extracts: bool,
    /// Dialect for entries whose extension does not name one.
    pub default_dialect: Dialect,
    sass: DialectOverrides,
    less: DialectOverrides,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            source_root: "/virtual".to_string(),
            target_root: "/target".to_string(),
            encoding: Encoding::Utf8,
            show_error_extracts: false,
            default_dialect: Dialect::Sass,
            sass: DialectOverrides::default(),
            less: DialectOverrides::default(),
        }
    }
}

impl BridgeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse { path: None, source })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: Some(display),
            source,
        })
    }

    /// Effective settings for `dialect`, with its defaults filled in.
    pub fn dialect(&self, dialect: Dialect) -> DialectConfig {
        let overrides = match dialect {
            Dialect::Sass => &self.sass,
            Dialect::Less => &self.less,
        };
        overrides.apply(DialectConfig::defaults(dialect))
    }
}

/// Keys of a `[sass]` or `[less]` section as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DialectOverrides {
    skip: Option<bool>,
    force_if_older: Option<bool>,
    fail_on_error: Option<bool>,
    compress: Option<bool>,
    includes: Option<Vec<String>>,
    excludes: Option<Vec<String>>,
}

impl DialectOverrides {
    fn apply(&self, base: DialectConfig) -> DialectConfig {
        DialectConfig {
            skip: self.skip.unwrap_or(base.skip),
            force_if_older: self.force_if_older.unwrap_or(base.force_if_older),
            fail_on_error: self.fail_on_error.unwrap_or(base.fail_on_error),
            compress: self.compress.unwrap_or(base.compress),
            includes: self.includes.clone().unwrap_or(base.includes),
            excludes: self.excludes.clone().unwrap_or(base.excludes),
        }
    }
}

/// Resolved settings for one dialect's build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectConfig {
    /// Do nothing at all.
    pub skip: bool,
    /// Recompile even when the output is newer than the source.
    pub force_if_older: bool,
    /// Turn any per-file failure into a build failure.
    pub fail_on_error: bool,
    pub compress: bool,
    /// Glob patterns, relative to the source root.
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

impl DialectConfig {
    pub fn defaults(dialect: Dialect) -> Self {
        let patterns = |list: &[&str]| list.iter().map(|p| p.to_string()).collect();
        match dialect {
            Dialect::Sass => Self {
                skip: false,
                force_if_older: false,
                fail_on_error: true,
                compress: false,
                includes: patterns(&["**/*.sass", "**/*.scss"]),
                excludes: patterns(&["**/_*.sass", "**/_*.scss"]),
            },
            Dialect::Less => Self {
                skip: false,
                force_if_older: false,
                fail_on_error: true,
                compress: true,
                includes: patterns(&["**/*.less"]),
                excludes: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_is_default() {
        let config = BridgeConfig::from_toml_str("").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.source_root, "/virtual");
        assert_eq!(config.target_root, "/target");
    }

    #[test]
    fn test_dialect_defaults() {
        let config = BridgeConfig::default();

        let sass = config.dialect(Dialect::Sass);
        assert!(!sass.compress);
        assert!(sass.fail_on_error);
        assert_eq!(sass.excludes, vec!["**/_*.sass", "**/_*.scss"]);

        let less = config.dialect(Dialect::Less);
        assert!(less.compress);
        assert_eq!(less.includes, vec!["**/*.less"]);
        assert!(less.excludes.is_empty());
    }

    #[test]
    fn test_partial_section_keeps_dialect_defaults() {
        let config = BridgeConfig::from_toml_str(
            r#"
            encoding = "ISO-8859-1"
            show_error_extracts = true
            default_dialect = "less"

            [less]
            skip = true
            "#,
        )
        .unwrap();

        assert_eq!(config.encoding, Encoding::Latin1);
        assert!(config.show_error_extracts);
        assert_eq!(config.default_dialect, Dialect::Less);

        let less = config.dialect(Dialect::Less);
        assert!(less.skip);
        assert!(less.compress);
        assert_eq!(config.dialect(Dialect::Sass), DialectConfig::defaults(Dialect::Sass));
    }

    #[test]
    fn test_unknown_encoding_is_rejected() {
        let err = BridgeConfig::from_toml_str("encoding = \"ebcdic\"").unwrap_err();
        assert!(err.to_string().contains("ebcdic"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(BridgeConfig::from_toml_str("[sass]\ncompres = true\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "target_root = \"/out\"\n[sass]\nforce_if_older = true").unwrap();

        let config = BridgeConfig::load(file.path()).unwrap();

        assert_eq!(config.target_root, "/out");
        assert!(config.dialect(Dialect::Sass).force_if_older);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = BridgeConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
