//! Preprocessor directive handling
//!
//! Directives are removed from the source before functions are extracted:
//! - `#include <x>` becomes a `! #include <x>` comment at the top of the output
//! - `#define NAME literal` becomes a named Fortran constant
//! - any other directive is kept as a comment so it stays visible

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::error_msg::Diagnostic;

static OBJECT_DEFINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s*define\s+([A-Za-z_]\w*)\s+(.+?)\s*$").unwrap());

static INTEGER_LITERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+[uUlL]*$").unwrap());

static REAL_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(\d+\.\d*|\.\d+)([eE][+-]?\d+)?[fF]?$").unwrap());

/// A `#define` turned into a Fortran parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedConstant {
    pub name: String,
    pub fortran_type: String,
    pub value: String,
}

impl NamedConstant {
    fn from_define(name: &str, value: &str) -> Option<NamedConstant> {
        let value = value.trim();
        let (fortran_type, value) = if INTEGER_LITERAL.is_match(value) {
            ("integer", value.trim_end_matches(['u', 'U', 'l', 'L']).to_string())
        } else if REAL_LITERAL.is_match(value) {
            if value.ends_with(['f', 'F']) {
                ("real", value.trim_end_matches(['f', 'F']).to_string())
            } else {
                ("double precision", value.to_string())
            }
        } else if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
            ("character(len=*)", value.to_string())
        } else {
            return None;
        };

        Some(NamedConstant {
            name: name.to_string(),
            fortran_type: fortran_type.to_string(),
            value,
        })
    }

    pub fn to_fortran(&self) -> String {
        format!("{}, parameter :: {} = {}", self.fortran_type, self.name, self.value)
    }
}

/// Source with directives removed
#[derive(Debug, Clone, Default)]
pub struct Preprocessed {
    /// Source text; each directive line is replaced by an empty line
    pub source: String,
    /// Comment lines for the top of the output
    pub header_comments: Vec<String>,
    pub constants: Vec<NamedConstant>,
}

/// Strip preprocessor directives from C source
pub fn remove_preprocessor_directives(source: &str) -> Preprocessed {
    let mut out = Preprocessed::default();
    let mut kept = Vec::new();
    let mut continued: Option<String> = None;

    for line in source.lines() {
        let directive = match continued.take() {
            Some(mut acc) => {
                acc.push(' ');
                acc.push_str(line.trim());
                acc
            }
            None if line.trim_start().starts_with('#') => line.trim().to_string(),
            None => {
                kept.push(line.to_string());
                continue;
            }
        };

        kept.push(String::new());
        if let Some(stripped) = directive.strip_suffix('\\') {
            continued = Some(stripped.trim_end().to_string());
            continue;
        }

        handle_directive(&directive, &mut out);
    }

    if let Some(directive) = continued {
        handle_directive(&directive, &mut out);
    }

    out.source = kept.join("\n");
    out
}

fn handle_directive(directive: &str, out: &mut Preprocessed) {
    let constant = OBJECT_DEFINE
        .captures(directive)
        .and_then(|caps| NamedConstant::from_define(&caps[1], &caps[2]));
    if let Some(constant) = constant {
        debug!("#define {} becomes a named constant", constant.name);
        out.constants.push(constant);
        return;
    }

    let is_define = directive[1..].trim_start().starts_with("define");
    if is_define {
        out.header_comments
            .push(Diagnostic::Untranslated(directive.to_string()).to_comment());
    } else {
        out.header_comments.push(format!("! {}", directive));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_includes_become_comments() {
        let p = remove_preprocessor_directives("#include <stdio.h>\nint main() {\n}\n");
        assert_eq!(p.header_comments, vec!["! #include <stdio.h>"]);
        assert!(!p.source.contains('#'));
        assert_eq!(p.source.lines().count(), 3);
    }

    #[test]
    fn test_numeric_define() {
        let p = remove_preprocessor_directives("#define MAX 100\n#define PI 3.14159\n");
        assert_eq!(p.constants.len(), 2);
        assert_eq!(p.constants[0].to_fortran(), "integer, parameter :: MAX = 100");
        assert_eq!(p.constants[1].to_fortran(), "double precision, parameter :: PI = 3.14159");
    }

    #[test]
    fn test_function_macro_is_visible() {
        let p = remove_preprocessor_directives("#define SQ(x) \\\n  ((x) * (x))\n");
        assert!(p.constants.is_empty());
        assert_eq!(p.header_comments.len(), 1);
        assert!(p.header_comments[0].starts_with("! Untranslated: #define SQ(x)"));
    }
}
