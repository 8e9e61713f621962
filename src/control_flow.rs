//! Control Flow System for the C to Fortran translator
//!
//! Holds the block frame stack used by the body translator, and the
//! parsing of control headers:
//!
//! ```text
//! C                                   Fortran
//! if (c) {          ... }             if (c) then ... end if
//! for (i = 0; i < n; i++) { ... }     do i = 0, n - 1 ... end do
//! while (c) { ... }                   do while (c) ... end do
//! do { ... } while (c);               do ... if (.not. (c)) exit; end do
//! { ... }                             block ... end block
//! ```
//!
//! Counted loops become a [`CountedRange`]: the comparison in the C
//! condition decides whether the bound is inclusive and whether the range
//! runs downwards.

use std::sync::LazyLock;

use regex::Regex;

use crate::error_msg::Diagnostic;
use crate::expression_translate::{offset_expression, rewrite_expression};
use crate::helpers::{find_assignment_eq, find_matching_delimiter, is_valid_identifier, split_top_level, starts_with_keyword};
use crate::variable::{parse_declaration, TYPE_KEYWORDS};

// ============================================================================
// BLOCK FRAMES
// ============================================================================

/// Kind of open compound statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// `if` / `else if` / `else` chain
    Conditional,
    /// `for` with a translatable range
    CountedLoop,
    /// `while`, or `for (;;)`
    ConditionLoop,
    /// `do { } while (c);`
    PostConditionLoop,
    /// bare `{ }`
    Scope,
    /// Braced construct whose header could not be translated
    Untranslated,
}

impl FrameKind {
    /// Fortran terminator emitted when the frame closes
    pub fn terminator(self) -> Option<&'static str> {
        match self {
            FrameKind::Conditional => Some("end if"),
            FrameKind::CountedLoop | FrameKind::ConditionLoop | FrameKind::PostConditionLoop => Some("end do"),
            FrameKind::Scope => Some("end block"),
            FrameKind::Untranslated => None,
        }
    }

    pub fn is_loop(self) -> bool {
        matches!(
            self,
            FrameKind::CountedLoop | FrameKind::ConditionLoop | FrameKind::PostConditionLoop
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFrame {
    pub kind: FrameKind,
    /// Indent level of the header; restored on close
    pub saved_indent_level: usize,
    /// Body is a single statement without braces
    pub closes_after_statement: bool,
    /// Header seen, body not started yet (a `{` may still follow)
    pub awaiting_body: bool,
    /// Closed branch waiting for its `else` / `else if`
    pub awaiting_chain: bool,
}

impl BlockFrame {
    pub fn braced(kind: FrameKind, saved_indent_level: usize) -> Self {
        BlockFrame {
            kind,
            saved_indent_level,
            closes_after_statement: false,
            awaiting_body: false,
            awaiting_chain: false,
        }
    }

    pub fn braceless(kind: FrameKind, saved_indent_level: usize) -> Self {
        BlockFrame {
            kind,
            saved_indent_level,
            closes_after_statement: true,
            awaiting_body: true,
            awaiting_chain: false,
        }
    }

    /// Frame whose branch already ended and is waiting for an `else`
    pub fn chained(saved_indent_level: usize) -> Self {
        BlockFrame {
            kind: FrameKind::Conditional,
            saved_indent_level,
            closes_after_statement: false,
            awaiting_body: false,
            awaiting_chain: true,
        }
    }
}

/// Explicit stack of open compound statements
#[derive(Debug, Default)]
pub struct BlockStack {
    stack: Vec<BlockFrame>,
}

impl BlockStack {
    pub fn new() -> Self {
        BlockStack { stack: Vec::new() }
    }

    pub fn push(&mut self, frame: BlockFrame) {
        self.stack.push(frame);
    }

    pub fn pop(&mut self) -> Option<BlockFrame> {
        self.stack.pop()
    }

    pub fn top(&self) -> Option<&BlockFrame> {
        self.stack.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut BlockFrame> {
        self.stack.last_mut()
    }

    /// Is there an enclosing loop (for `break` / `continue`)?
    pub fn in_loop(&self) -> bool {
        self.stack.iter().any(|f| f.kind.is_loop())
    }
}

// ============================================================================
// HEADER PARSING
// ============================================================================

/// Split `keyword (inner) rest` into `(inner, rest)`
pub fn extract_parenthesized(line: &str, keyword: &str) -> Option<(String, String)> {
    let line = line.trim();
    if !starts_with_keyword(line, keyword) {
        return None;
    }
    let after = &line[keyword.len()..];
    let offset = keyword.len() + (after.len() - after.trim_start().len());
    if !line[offset..].starts_with('(') {
        return None;
    }
    let close = find_matching_delimiter(line, offset)?;
    Some((
        line[offset + 1..close].trim().to_string(),
        line[close + 1..].trim().to_string(),
    ))
}

/// Translated range of a counted `for` loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountedRange {
    pub var: String,
    pub lower: String,
    pub upper: String,
    pub step: String,
}

impl CountedRange {
    pub fn is_descending(&self) -> bool {
        self.step.starts_with('-')
    }

    /// The `do` line. A descending range iterates from `upper` down to `lower`.
    pub fn do_header(&self) -> String {
        if self.step == "1" {
            format!("do {} = {}, {}", self.var, self.lower, self.upper)
        } else if self.is_descending() {
            format!("do {} = {}, {}, {}", self.var, self.upper, self.lower, self.step)
        } else {
            format!("do {} = {}, {}, {}", self.var, self.lower, self.upper, self.step)
        }
    }
}

/// Result of parsing a `for (...)` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForHeader {
    Counted(CountedRange),
    /// `for (;;)`
    Endless,
    Malformed(Diagnostic),
}

static COMPARISON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(.+?)\s*(<=|>=|==|!=|<|>)\s*(.+?)\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl BoundOp {
    fn parse(op: &str) -> Option<BoundOp> {
        match op {
            "<" => Some(BoundOp::Lt),
            "<=" => Some(BoundOp::Le),
            ">" => Some(BoundOp::Gt),
            ">=" => Some(BoundOp::Ge),
            "==" => Some(BoundOp::Eq),
            "!=" => Some(BoundOp::Ne),
            _ => None,
        }
    }

    /// `n > i` is `i < n`
    fn flipped(self) -> BoundOp {
        match self {
            BoundOp::Lt => BoundOp::Gt,
            BoundOp::Le => BoundOp::Ge,
            BoundOp::Gt => BoundOp::Lt,
            BoundOp::Ge => BoundOp::Le,
            other => other,
        }
    }
}

/// `v = start` or `int v = start`; a comma list of several variables is rejected
fn parse_init(init: &str) -> Option<(String, String)> {
    if split_top_level(init, ',').len() != 1 {
        return None;
    }

    let typed = TYPE_KEYWORDS.iter().any(|kw| starts_with_keyword(init, kw));
    if typed {
        let decl = parse_declaration(init)?.into_iter().next()?;
        let start = decl.initializer?;
        return Some((decl.name, start));
    }

    let eq = find_assignment_eq(init)?;
    let var = init[..eq].trim();
    if !is_valid_identifier(var) {
        return None;
    }
    Some((var.to_string(), init[eq + 1..].trim().to_string()))
}

fn parse_condition(cond: &str, var: &str) -> Option<(BoundOp, String)> {
    if cond.contains("&&") || cond.contains("||") {
        return None;
    }
    let caps = COMPARISON.captures(cond)?;
    let op = BoundOp::parse(&caps[2])?;
    let (lhs, rhs) = (caps[1].trim(), caps[3].trim());

    // Exactly one comparison
    if COMPARISON.is_match(lhs) || COMPARISON.is_match(rhs) {
        return None;
    }

    if lhs == var {
        Some((op, rhs.to_string()))
    } else if rhs == var {
        Some((op.flipped(), lhs.to_string()))
    } else {
        None
    }
}

fn negate(step: &str) -> String {
    if let Some(n) = step.parse::<i64>().ok().and_then(i64::checked_neg) {
        return n.to_string();
    }
    if is_valid_identifier(step) {
        format!("-{}", step)
    } else {
        format!("-({})", step)
    }
}

fn parse_increment(inc: &str, var: &str) -> Option<String> {
    let inc = inc.trim();
    let compact: String = inc.chars().filter(|c| !c.is_whitespace()).collect();

    if compact == format!("{}++", var) || compact == format!("++{}", var) {
        return Some("1".to_string());
    }
    if compact == format!("{}--", var) || compact == format!("--{}", var) {
        return Some("-1".to_string());
    }

    if let Some(rest) = inc.strip_prefix(var) {
        let rest = rest.trim_start();
        if let Some(k) = rest.strip_prefix("+=") {
            return Some(rewrite_expression(k.trim()));
        }
        if let Some(k) = rest.strip_prefix("-=") {
            return Some(negate(&rewrite_expression(k.trim())));
        }
    }

    // v = v + k / v = v - k
    let eq = find_assignment_eq(inc)?;
    if inc[..eq].trim() != var {
        return None;
    }
    let rhs = inc[eq + 1..].trim();
    let rest = rhs.strip_prefix(var)?.trim_start();
    if let Some(k) = rest.strip_prefix('+') {
        return Some(rewrite_expression(k.trim()));
    }
    if let Some(k) = rest.strip_prefix('-') {
        return Some(negate(&rewrite_expression(k.trim())));
    }
    None
}

/// Parse the inside of a `for (...)` header.
///
/// `line` is only used for the malformed-header diagnostic.
pub fn parse_for_header(header: &str, line: &str) -> ForHeader {
    let clauses = split_top_level(header, ';');
    if clauses.len() != 3 {
        return ForHeader::Malformed(Diagnostic::MalformedFor(line.trim().to_string()));
    }
    let (init, cond, inc) = (&clauses[0], &clauses[1], &clauses[2]);

    if init.is_empty() && cond.is_empty() && inc.is_empty() {
        return ForHeader::Endless;
    }

    let (var, start) = match parse_init(init) {
        Some(parsed) => parsed,
        None => return ForHeader::Malformed(Diagnostic::ForInitUnparsed(init.to_string())),
    };

    let (op, bound) = match parse_condition(cond, &var) {
        Some(parsed) => parsed,
        None => return ForHeader::Malformed(Diagnostic::ForConditionUnparsed(cond.to_string())),
    };

    let step = match parse_increment(inc, &var) {
        Some(step) => step,
        None => return ForHeader::Malformed(Diagnostic::ForIncrementUnparsed(inc.to_string())),
    };

    let start = rewrite_expression(&start);
    let bound = rewrite_expression(&bound);
    let descending = step.starts_with('-');

    let (lower, upper) = match op {
        BoundOp::Le | BoundOp::Eq => (start, bound),
        BoundOp::Lt => (start, offset_expression(&bound, -1)),
        BoundOp::Ge => (bound, start),
        BoundOp::Gt => (offset_expression(&bound, 1), start),
        BoundOp::Ne if descending => (offset_expression(&bound, 1), start),
        BoundOp::Ne => (start, offset_expression(&bound, -1)),
    };

    ForHeader::Counted(CountedRange { var, lower, upper, step })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counted(header: &str) -> CountedRange {
        match parse_for_header(header, header) {
            ForHeader::Counted(range) => range,
            other => panic!("expected counted loop, got {:?}", other),
        }
    }

    #[test]
    fn test_strict_upper_bound() {
        let r = counted("i = 0; i < n; i++");
        assert_eq!((r.lower.as_str(), r.upper.as_str(), r.step.as_str()), ("0", "n - 1", "1"));
        assert_eq!(r.do_header(), "do i = 0, n - 1");
    }

    #[test]
    fn test_inclusive_bound_with_step() {
        let r = counted("i = 1; i <= n; i += 2");
        assert_eq!((r.lower.as_str(), r.upper.as_str(), r.step.as_str()), ("1", "n", "2"));
        assert_eq!(r.do_header(), "do i = 1, n, 2");
    }

    #[test]
    fn test_strict_lower_bound_descending() {
        let r = counted("i = n; i > 0; i--");
        assert_eq!((r.lower.as_str(), r.upper.as_str(), r.step.as_str()), ("1", "n", "-1"));
        assert_eq!(r.do_header(), "do i = n, 1, -1");
    }

    #[test]
    fn test_inclusive_lower_bound() {
        let r = counted("int i = 10; i >= 0; i -= 2");
        assert_eq!(r.var, "i");
        assert_eq!((r.lower.as_str(), r.upper.as_str(), r.step.as_str()), ("0", "10", "-2"));
    }

    #[test]
    fn test_composite_increment_and_flipped_condition() {
        let r = counted("k = 0; n > k; k = k + 3");
        assert_eq!((r.lower.as_str(), r.upper.as_str(), r.step.as_str()), ("0", "n - 1", "3"));
    }

    #[test]
    fn test_endless_and_malformed() {
        assert_eq!(parse_for_header(";;", "for (;;)"), ForHeader::Endless);
        assert!(matches!(
            parse_for_header("i = 0; i < n", "for (i = 0; i < n)"),
            ForHeader::Malformed(Diagnostic::MalformedFor(_))
        ));
        assert!(matches!(
            parse_for_header("i = 0; i < n && ok; i++", ""),
            ForHeader::Malformed(Diagnostic::ForConditionUnparsed(_))
        ));
    }

    #[test]
    fn test_comma_init_is_not_a_counted_loop() {
        assert_eq!(
            parse_for_header("i = 0, j = n; i < j; i++", "for (i = 0, j = n; i < j; i++)"),
            ForHeader::Malformed(Diagnostic::ForInitUnparsed("i = 0, j = n".to_string()))
        );
        assert!(matches!(
            parse_for_header("int i = 0, j = 10; i < j; i++", ""),
            ForHeader::Malformed(Diagnostic::ForInitUnparsed(_))
        ));
        // A comma inside a call is not a second variable
        let r = counted("i = min(a, b); i < n; i++");
        assert_eq!(r.lower, "min(a, b)");
    }

    #[test]
    fn test_bounds_at_integer_limits() {
        let r = counted("i = 0; i < -9223372036854775808; i++");
        assert_eq!(r.upper, "-9223372036854775808 - 1");
        assert_eq!(r.do_header(), "do i = 0, -9223372036854775808 - 1");

        let r = counted("i = 0; i > 9223372036854775807; i--");
        assert_eq!(r.lower, "9223372036854775807 + 1");
    }

    #[test]
    fn test_negated_step_at_integer_limit() {
        let r = counted("i = 0; i >= n; i -= -9223372036854775808");
        assert_eq!(r.step, "-(-9223372036854775808)");
        assert_eq!(negate("9223372036854775807"), "-9223372036854775807");
        assert_eq!(negate("k"), "-k");
    }

    #[test]
    fn test_extract_parenthesized() {
        let (cond, rest) = extract_parenthesized("if (a && (b)) return 1;", "if").unwrap();
        assert_eq!(cond, "a && (b)");
        assert_eq!(rest, "return 1;");
        assert!(extract_parenthesized("iffy(x);", "if").is_none());
    }

    #[test]
    fn test_frame_terminators() {
        assert_eq!(FrameKind::Conditional.terminator(), Some("end if"));
        assert_eq!(FrameKind::PostConditionLoop.terminator(), Some("end do"));
        assert_eq!(FrameKind::Untranslated.terminator(), None);
    }
}
