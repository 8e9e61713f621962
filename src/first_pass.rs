//! First pass analysis for the C to Fortran translator
//!
//! This module isolates the units the body translator works on:
//! - Function headers, matched by pattern, with their brace-balanced bodies
//! - The signature of every function, registered for later lookups
//! - File-scope declarations (globals)
//! - Top-level lines that are neither, kept so they stay visible in the output

use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

use crate::function::{FunctionRegistry, FunctionSignature};
use crate::lowering::logical_lines;
use crate::variable::{is_declaration, parse_declaration, DeclarationSet, TYPE_KEYWORDS};
use crate::helpers::starts_with_keyword;

/// Words that can precede `(` without being a function name
const NOT_FUNCTION_NAMES: &[&str] = &["if", "while", "for", "switch", "return", "sizeof", "else", "do"];

static FUNCTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*((?:[A-Za-z_]\w*[ \t\*]+)+?)\**([A-Za-z_]\w*)[ \t]*\(([^()]*)\)[ \t\r\n]*\{").unwrap()
});

/// One function definition, body without the outer braces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBody {
    pub name: String,
    pub body: String,
    /// `//` comment lines directly above the definition
    pub leading_comments: Vec<String>,
}

/// Result of first pass analysis
#[derive(Debug, Default)]
pub struct FirstPassResult {
    pub registry: FunctionRegistry,
    pub bodies: Vec<FunctionBody>,
    pub globals: DeclarationSet,
    /// Top-level lines that were not understood
    pub unhandled: Vec<String>,
}

/// Find the `}` matching the `{` at `open_idx`, skipping comments and literals
pub fn find_body_end(source: &str, open_idx: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut i = open_idx;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 2;
                continue;
            }
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Run the first pass over preprocessed source text
pub fn run_first_pass(source: &str) -> FirstPassResult {
    let mut result = FirstPassResult::default();
    let mut consumed = 0usize;

    for caps in FUNCTION_HEADER.captures_iter(source) {
        let (whole, return_type, name, params) = match (caps.get(0), caps.get(1), caps.get(2), caps.get(3)) {
            (Some(w), Some(r), Some(n), Some(p)) => (w, r.as_str(), n.as_str(), p.as_str()),
            _ => continue,
        };

        if whole.start() < consumed {
            continue;
        }
        let first_word = return_type.split_whitespace().next().unwrap_or("");
        if NOT_FUNCTION_NAMES.contains(&name) || NOT_FUNCTION_NAMES.contains(&first_word) {
            continue;
        }

        let top_level = &source[consumed..whole.start()];
        let leading_comments = scan_top_level(top_level, &mut result);

        let open_idx = whole.end() - 1;
        let (body, end) = match find_body_end(source, open_idx) {
            Some(close) => (&source[open_idx + 1..close], close + 1),
            None => {
                warn!("function `{}` has no closing brace; taking the rest of the input", name);
                (&source[open_idx + 1..], source.len())
            }
        };

        debug!("found function `{}` returning `{}`", name, return_type.trim());
        result
            .registry
            .register(FunctionSignature::parse(return_type, name, params));
        result.bodies.push(FunctionBody {
            name: name.to_string(),
            body: body.to_string(),
            leading_comments,
        });
        consumed = end;
    }

    let tail = &source[consumed.min(source.len())..];
    scan_top_level(tail, &mut result);

    result
}

/// Record globals and unhandled lines from top-level text.
///
/// Returns the comment lines at the end of the text, which belong to the
/// function that follows.
fn scan_top_level(text: &str, result: &mut FirstPassResult) -> Vec<String> {
    let mut comments = Vec::new();

    for line in logical_lines(text) {
        if let Some(comment) = line.strip_prefix("//") {
            comments.push(comment.trim().to_string());
            continue;
        }
        comments.clear();

        if is_declaration(&line) {
            for decl in parse_declaration(&line).unwrap_or_default() {
                result.globals.insert(decl);
            }
        } else if is_prototype(&line) {
            debug!("skipping prototype `{}`", line);
        } else {
            result.unhandled.push(line);
        }
    }

    comments
}

fn is_prototype(line: &str) -> bool {
    let typed = TYPE_KEYWORDS
        .iter()
        .chain(["void", "static", "extern", "const"].iter())
        .any(|kw| starts_with_keyword(line, kw));
    typed && line.ends_with(';') && line.contains('(')
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
int counter = 0;

int square(int x);

// Square a number
int square(int x) {
    if (x < 0) {
        x = -x;
    }
    return x * x;
}

void greet(void)
{
    printf("}");
}

int main() {
    return square(3);
}
"#;

    #[test]
    fn test_extracts_bodies_in_order() {
        let result = run_first_pass(SOURCE);
        let names: Vec<&str> = result.bodies.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["square", "greet", "main"]);
        assert!(result.bodies[0].body.contains("return x * x;"));
        assert!(result.bodies[1].body.contains(r#"printf("}");"#));
    }

    #[test]
    fn test_registers_signatures() {
        let result = run_first_pass(SOURCE);
        assert!(result.registry.returns_value("square"));
        assert!(result.registry.get("greet").unwrap().is_void());
        assert_eq!(result.registry.get("square").unwrap().parameter_names(), vec!["x"]);
    }

    #[test]
    fn test_globals_and_comments() {
        let result = run_first_pass(SOURCE);
        assert!(result.globals.contains("counter"));
        assert!(result.unhandled.is_empty());
        assert_eq!(result.bodies[0].leading_comments, vec!["Square a number"]);
    }

    #[test]
    fn test_unbalanced_body_takes_rest() {
        let result = run_first_pass("int f() {\n  x = 1;\n");
        assert_eq!(result.bodies.len(), 1);
        assert!(result.bodies[0].body.contains("x = 1;"));
    }

    #[test]
    fn test_find_body_end_skips_comments() {
        let src = "{ /* } */ a = '}'; }";
        assert_eq!(find_body_end(src, 0), Some(src.len() - 1));
    }
}
