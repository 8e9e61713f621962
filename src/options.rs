//! Translator configuration.
//!
//! Options can be loaded from a TOML file; every field is optional.
//!
//! ```toml
//! indent_width = 4
//! module_name = "numerics"
//! explicit_return = true
//!
//! [emit]
//! keep_blank_lines = false
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error_msg::{Result, TranslateError};
use crate::helpers::indent_str;

/// Output writer policy
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmitOptions {
    /// Keep blank lines produced by the translator
    pub keep_blank_lines: bool,
    /// Start the output with a `! Translated from C to Fortran` line
    pub header_comment: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions {
            keep_blank_lines: true,
            header_comment: true,
        }
    }
}

/// Settings for one translation run
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TranslatorOptions {
    /// Spaces per indent level
    pub indent_width: usize,
    /// Name of the emitted `program` unit
    pub program_name: String,
    /// Name of the module holding non-entry procedures
    pub module_name: String,
    /// Emit `return` after every result assignment
    pub explicit_return: bool,
    pub emit: EmitOptions,
}

impl Default for TranslatorOptions {
    fn default() -> Self {
        TranslatorOptions {
            indent_width: 2,
            program_name: "main".to_string(),
            module_name: "translated_procedures".to_string(),
            explicit_return: false,
            emit: EmitOptions::default(),
        }
    }
}

impl TranslatorOptions {
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load options from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| TranslateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| TranslateError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Indentation for `level`
    pub fn indent(&self, level: usize) -> String {
        indent_str(level, self.indent_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let options = TranslatorOptions::default();
        assert_eq!(options.indent_width, 2);
        assert_eq!(options.module_name, "translated_procedures");
        assert!(options.emit.keep_blank_lines);
        assert_eq!(options.indent(2), "    ");
    }

    #[test]
    fn test_partial_toml() {
        let options = TranslatorOptions::from_toml_str("indent_width = 4\n[emit]\nheader_comment = false\n").unwrap();
        assert_eq!(options.indent_width, 4);
        assert_eq!(options.program_name, "main");
        assert!(!options.emit.header_comment);
        assert!(options.emit.keep_blank_lines);
    }

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c2fortran.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "module_name = \"numerics\"\nexplicit_return = true").unwrap();

        let options = TranslatorOptions::load(&path).unwrap();
        assert_eq!(options.module_name, "numerics");
        assert!(options.explicit_return);
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        let missing = TranslatorOptions::load(&dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(TranslateError::Io { .. })));

        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "indent_width = \"wide\"").unwrap();
        assert!(matches!(TranslatorOptions::load(&path), Err(TranslateError::Config { .. })));
    }
}
