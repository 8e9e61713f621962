//! Diagnostics and error types for the C to Fortran translator
//!
//! Translation never aborts on bad input. Every line the translator cannot
//! handle leaves a `!` comment in the output, produced from [`Diagnostic`]
//! so each kind has a stable prefix and category.
//!
//! The only failures that stop a run are I/O and configuration problems,
//! reported as [`TranslateError`].
//!
//! ## Diagnostic Code Format
//!
//! `C2Fxxx` where code ranges are:
//! - 001-019: Unrecognized constructs
//! - 020-039: Malformed control headers and statements
//! - 040-059: Unbalanced block nesting

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// DIAGNOSTIC CATEGORIES
// ============================================================================

/// Diagnostic category for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A line matches no known shape (C2F001-019)
    Unrecognized,
    /// A loop, branch or I/O statement does not split as expected (C2F020-039)
    MalformedHeader,
    /// Closing delimiter with no open frame, or frames left open (C2F040-059)
    Unbalanced,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Unrecognized => write!(f, "unrecognized"),
            ErrorCategory::MalformedHeader => write!(f, "malformed-header"),
            ErrorCategory::Unbalanced => write!(f, "unbalanced"),
        }
    }
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

/// A translation problem, rendered into the output as a Fortran comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Line matched no known statement shape
    Untranslated(String),
    /// Declaration line that could not be split into declarators
    DeclarationUnparsed(String),
    /// Known non-void function called as a statement
    DiscardedResult(String),
    /// `for` header without three clauses
    MalformedFor(String),
    /// `for` init clause is not `v = start`
    ForInitUnparsed(String),
    /// `for` condition is not a single comparison on the loop variable
    ForConditionUnparsed(String),
    /// `for` increment clause gives no recognizable step
    ForIncrementUnparsed(String),
    /// `if` / `while` / `else if` header without a parenthesized condition
    MalformedHeader(String),
    /// `printf` / `puts` whose argument list cannot be split
    PrintfUnparsed(String),
    /// `scanf` without a format string or targets
    ScanfUnparsed(String),
    /// `}` with no open frame
    UnmatchedBrace,
    /// `}` closing a construct that was not translated
    EndOfUntranslatedBlock,
    /// Frame still open when the body ended
    UnclosedBlock,
}

/// Stable diagnostic codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    C2F001,
    C2F002,
    C2F003,
    C2F020,
    C2F021,
    C2F022,
    C2F023,
    C2F024,
    C2F025,
    C2F026,
    C2F040,
    C2F041,
    C2F042,
}

impl ErrorCode {
    pub fn code_str(&self) -> &'static str {
        match self {
            ErrorCode::C2F001 => "C2F001",
            ErrorCode::C2F002 => "C2F002",
            ErrorCode::C2F003 => "C2F003",
            ErrorCode::C2F020 => "C2F020",
            ErrorCode::C2F021 => "C2F021",
            ErrorCode::C2F022 => "C2F022",
            ErrorCode::C2F023 => "C2F023",
            ErrorCode::C2F024 => "C2F024",
            ErrorCode::C2F025 => "C2F025",
            ErrorCode::C2F026 => "C2F026",
            ErrorCode::C2F040 => "C2F040",
            ErrorCode::C2F041 => "C2F041",
            ErrorCode::C2F042 => "C2F042",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorCode::C2F001 | ErrorCode::C2F002 | ErrorCode::C2F003 => ErrorCategory::Unrecognized,
            ErrorCode::C2F040 | ErrorCode::C2F041 | ErrorCode::C2F042 => ErrorCategory::Unbalanced,
            _ => ErrorCategory::MalformedHeader,
        }
    }
}

impl Diagnostic {
    pub fn code(&self) -> ErrorCode {
        match self {
            Diagnostic::Untranslated(_) => ErrorCode::C2F001,
            Diagnostic::DeclarationUnparsed(_) => ErrorCode::C2F002,
            Diagnostic::DiscardedResult(_) => ErrorCode::C2F003,
            Diagnostic::MalformedFor(_) => ErrorCode::C2F020,
            Diagnostic::ForInitUnparsed(_) => ErrorCode::C2F021,
            Diagnostic::ForConditionUnparsed(_) => ErrorCode::C2F022,
            Diagnostic::ForIncrementUnparsed(_) => ErrorCode::C2F023,
            Diagnostic::MalformedHeader(_) => ErrorCode::C2F024,
            Diagnostic::PrintfUnparsed(_) => ErrorCode::C2F025,
            Diagnostic::ScanfUnparsed(_) => ErrorCode::C2F026,
            Diagnostic::UnmatchedBrace => ErrorCode::C2F040,
            Diagnostic::EndOfUntranslatedBlock => ErrorCode::C2F041,
            Diagnostic::UnclosedBlock => ErrorCode::C2F042,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }

    /// The full comment line, without indentation
    pub fn to_comment(&self) -> String {
        format!("! {}", self)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Untranslated(line) => write!(f, "Untranslated: {}", line),
            Diagnostic::DeclarationUnparsed(line) => write!(f, "Failed to parse declaration: {}", line),
            Diagnostic::DiscardedResult(line) => write!(f, "Result discarded: {}", line),
            Diagnostic::MalformedFor(line) => write!(f, "Malformed for loop: {}", line),
            Diagnostic::ForInitUnparsed(init) => write!(f, "Failed to parse for loop init: {}", init),
            Diagnostic::ForConditionUnparsed(cond) => {
                write!(f, "Failed to parse for loop condition: {}", cond)
            }
            Diagnostic::ForIncrementUnparsed(inc) => {
                write!(f, "Failed to parse for loop increment: {}", inc)
            }
            Diagnostic::MalformedHeader(line) => write!(f, "Malformed header: {}", line),
            Diagnostic::PrintfUnparsed(line) => write!(f, "Failed to parse printf: {}", line),
            Diagnostic::ScanfUnparsed(line) => write!(f, "Failed to parse scanf: {}", line),
            Diagnostic::UnmatchedBrace => write!(f, "Warning: unmatched closing brace"),
            Diagnostic::EndOfUntranslatedBlock => write!(f, "End of untranslated block"),
            Diagnostic::UnclosedBlock => write!(f, "Warning: block closed at end of body"),
        }
    }
}

// ============================================================================
// RUN-LEVEL ERRORS
// ============================================================================

/// Failures that abort a whole translation run
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, TranslateError>;
