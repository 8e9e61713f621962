//! Fortran Sanity Check Module
//!
//! Validates the structure of generated Fortran before it is written out.
//! Translation never fails, so findings are reported as warnings; they
//! point at constructs the translator could not map cleanly.
//!
//! Checks performed:
//! - Balanced parentheses outside strings and comments
//! - Every `if ... then` / `do` / `block` / unit closed by its own `end`
//! - No unclosed string literals
//! - No C operators or statement terminators left in executable lines

use std::sync::LazyLock;

use regex::Regex;

use crate::block_restructure::unit_header_kind;

/// Result of sanity check
#[derive(Debug, Clone)]
pub struct SanityCheckResult {
    pub is_valid: bool,
    pub errors: Vec<SanityError>,
}

#[derive(Debug, Clone)]
pub struct SanityError {
    pub line: usize,
    pub message: String,
    pub kind: SanityErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanityErrorKind {
    UnbalancedDelimiter,
    UnbalancedConstruct,
    UnclosedString,
    /// C syntax that survived expression rewriting
    LeakedCSyntax,
}

impl SanityCheckResult {
    pub fn ok() -> Self {
        SanityCheckResult {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn error(errors: Vec<SanityError>) -> Self {
        SanityCheckResult {
            is_valid: false,
            errors,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Construct {
    If,
    Do,
    Block,
    Unit,
}

impl Construct {
    fn name(self) -> &'static str {
        match self {
            Construct::If => "if",
            Construct::Do => "do",
            Construct::Block => "block",
            Construct::Unit => "program unit",
        }
    }
}

static IF_THEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^if\s*\(.*\)\s*then$").unwrap());
static ELSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^else(\s+if\s*\(.*\)\s*then)?$").unwrap());
static DO_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^do(\s+while\s*\(|\s+\w+\s*=|$)").unwrap());
static END_CONSTRUCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^end\s*(if|do|block|program|module|function|subroutine)\b").unwrap());
static LEAKED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&&|\|\||\+\+|--|;\s*$|[\w)\]]\s*&\s*[\w(]").unwrap());

/// Code part of a Fortran line, string contents blanked, comment removed.
/// The flag is true when a string literal is still open at the end.
fn code_part(line: &str) -> (String, bool) {
    let mut out = String::new();
    let mut quote: Option<char> = None;
    for c in line.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                out.push(c);
            }
            Some(_) => out.push(' '),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                out.push(c);
            }
            None if c == '!' => break,
            None => out.push(c),
        }
    }
    (out, quote.is_some())
}

/// Perform the sanity check on generated Fortran code
pub fn check_fortran_output(code: &str) -> SanityCheckResult {
    let mut errors = Vec::new();
    let mut constructs: Vec<(Construct, usize)> = Vec::new();

    for (idx, line) in code.lines().enumerate() {
        let line_num = idx + 1;
        let (code_text, open_string) = code_part(line);
        let stmt = code_text.trim();
        if open_string {
            errors.push(SanityError {
                line: line_num,
                message: "Unclosed string literal".to_string(),
                kind: SanityErrorKind::UnclosedString,
            });
        }
        if stmt.is_empty() {
            continue;
        }

        // Check 1: parentheses
        let mut depth = 0i32;
        for c in stmt.chars() {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                break;
            }
        }
        if depth != 0 {
            errors.push(SanityError {
                line: line_num,
                message: format!("Unbalanced parentheses: {}", stmt),
                kind: SanityErrorKind::UnbalancedDelimiter,
            });
        }

        // Check 2: leaked C syntax
        if LEAKED.is_match(stmt) {
            errors.push(SanityError {
                line: line_num,
                message: format!("C syntax in output: {}", stmt),
                kind: SanityErrorKind::LeakedCSyntax,
            });
        }

        // Check 3: construct nesting
        let opened = if IF_THEN.is_match(stmt) {
            Some(Construct::If)
        } else if DO_START.is_match(stmt) {
            Some(Construct::Do)
        } else if stmt.eq_ignore_ascii_case("block") {
            Some(Construct::Block)
        } else if unit_header_kind(stmt).is_some() {
            Some(Construct::Unit)
        } else {
            None
        };
        if let Some(construct) = opened {
            constructs.push((construct, line_num));
            continue;
        }

        if ELSE.is_match(stmt) {
            if constructs.last().map(|(c, _)| *c) != Some(Construct::If) {
                errors.push(SanityError {
                    line: line_num,
                    message: "`else` outside an if construct".to_string(),
                    kind: SanityErrorKind::UnbalancedConstruct,
                });
            }
            continue;
        }

        if let Some(caps) = END_CONSTRUCT.captures(stmt) {
            let expected = match caps[1].to_ascii_lowercase().as_str() {
                "if" => Construct::If,
                "do" => Construct::Do,
                "block" => Construct::Block,
                _ => Construct::Unit,
            };
            match constructs.pop() {
                Some((found, _)) if found == expected => {}
                Some((found, opened_at)) => errors.push(SanityError {
                    line: line_num,
                    message: format!(
                        "`{}` closes the {} opened at line {}",
                        stmt,
                        found.name(),
                        opened_at
                    ),
                    kind: SanityErrorKind::UnbalancedConstruct,
                }),
                None => errors.push(SanityError {
                    line: line_num,
                    message: format!("`{}` without an open construct", stmt),
                    kind: SanityErrorKind::UnbalancedConstruct,
                }),
            }
        }
    }

    for (construct, opened_at) in constructs {
        errors.push(SanityError {
            line: opened_at,
            message: format!("Unclosed {}", construct.name()),
            kind: SanityErrorKind::UnbalancedConstruct,
        });
    }

    if errors.is_empty() {
        SanityCheckResult::ok()
    } else {
        SanityCheckResult::error(errors)
    }
}

/// Format findings for display
pub fn format_sanity_report(result: &SanityCheckResult) -> String {
    let mut output = String::new();
    output.push_str("generated Fortran needs review:\n");
    for error in &result.errors {
        output.push_str(&format!("  --> line {}: {} ({:?})\n", error.line, error.message, error.kind));
    }
    output
}
