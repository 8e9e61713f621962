//! Expression Translation
//!
//! C expressions are rewritten into Fortran by an ordered table of
//! `(pattern, replacement)` rules applied left to right. The order is part
//! of the contract:
//!
//! 1. constants (`INT_MAX`, `NULL`, `true`, ...)
//! 2. float literal suffixes
//! 3. `sizeof`
//! 4. array indexing (`a[i]` → `a(i + 1)`)
//! 5. brace initializer lists (`{1, 2}` → `[1, 2]`)
//! 6. numeric casts
//! 7. modulo
//! 8. comparison operators
//! 9. logical and/or
//! 10. address-of
//! 11. logical not
//! 12. ternary
//!
//! Array rules run before operator rules so index arithmetic is formatted
//! by the later rules. String and char literals are masked before any rule
//! runs and restored afterwards, so no rule ever sees their contents.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::helpers::tag_literals;
use crate::type_resolution::CType;

/// Upper bound on passes of a repeating rule
const MAX_REPEAT: usize = 64;

/// How a rule produces its replacement text
pub enum Replacement {
    /// Regex template with `$1`-style group references
    Template(&'static str),
    /// Computed replacement
    Func(fn(&Captures) -> String),
}

/// One entry of the rewrite table
pub struct RewriteRule {
    pub name: &'static str,
    pattern: Regex,
    replacement: Replacement,
    /// Re-apply until the text stops changing (nested arrays, nested lists)
    repeat: bool,
}

impl RewriteRule {
    fn new(name: &'static str, pattern: &str, replacement: Replacement, repeat: bool) -> Self {
        RewriteRule {
            name,
            pattern: Regex::new(pattern).unwrap(),
            replacement,
            repeat,
        }
    }

    fn apply_once(&self, text: &str) -> String {
        match &self.replacement {
            Replacement::Template(t) => self.pattern.replace_all(text, *t).into_owned(),
            Replacement::Func(f) => self.pattern.replace_all(text, |caps: &Captures| f(caps)).into_owned(),
        }
    }

    pub fn apply(&self, text: &str) -> String {
        let mut current = self.apply_once(text);
        if self.repeat {
            for _ in 0..MAX_REPEAT {
                let next = self.apply_once(&current);
                if next == current {
                    break;
                }
                current = next;
            }
        }
        current
    }
}

/// Ordered rule table
pub struct ExpressionRewriter {
    rules: Vec<RewriteRule>,
}

impl ExpressionRewriter {
    /// The standard C → Fortran table
    pub fn standard() -> Self {
        use Replacement::{Func, Template};

        let operand = r"(\w+(?:\([^()]*\))?|\([^()]*\))";
        let type_words = r"(?:unsigned|signed|short|long|int|char|float|double)";

        let rules = vec![
            RewriteRule::new("int_max", r"\b(?:INT_MAX|LONG_MAX)\b", Template("huge(0)"), false),
            RewriteRule::new("int_min", r"\bINT_MIN\b", Template("-huge(0)"), false),
            RewriteRule::new("null", r"\bNULL\b", Template("null()"), false),
            RewriteRule::new("true", r"\btrue\b", Template(".true."), false),
            RewriteRule::new("false", r"\bfalse\b", Template(".false."), false),
            RewriteRule::new(
                "float_suffix",
                r"\b(\d+\.\d*(?:[eE][+-]?\d+)?|\d+[eE][+-]?\d+)[fF]\b",
                Template("$1"),
                false,
            ),
            RewriteRule::new(
                "sizeof_type",
                &format!(r"\bsizeof\s*\(\s*({tw}(?:\s+{tw})*\s*\**)\s*\)", tw = type_words),
                Func(sizeof_type),
                false,
            ),
            RewriteRule::new(
                "sizeof_expr",
                r"\bsizeof\s*\(\s*([^()]+?)\s*\)",
                Template("(storage_size($1) / 8)"),
                false,
            ),
            RewriteRule::new("array_index", r"(\w+|\))\s*\[([^\[\]]+)\]", Func(array_index), true),
            RewriteRule::new("brace_list", r"\{([^{}]*)\}", Template("[$1]"), true),
            RewriteRule::new(
                "cast",
                &format!(r"\(\s*((?:{tw}\s*)+)\)\s*{op}", tw = type_words, op = operand),
                Func(numeric_cast),
                false,
            ),
            RewriteRule::new(
                "modulo",
                &format!(r"{op}\s*%\s*{op}", op = operand),
                Template("mod($1, $2)"),
                true,
            ),
            RewriteRule::new("comparison", r"\s*(==|!=|>=|<=|>|<)\s*", Func(comparison), false),
            RewriteRule::new("and", r"\s*&&\s*", Template(" .and. "), false),
            RewriteRule::new("or", r"\s*\|\|\s*", Template(" .or. "), false),
            // Only in operand position; a binary `&` is left for the sanity check
            RewriteRule::new(
                "address_of",
                r"(^\s*|[(,=+\-*/<>.?:]\s*)&\s*(\w)",
                Template("$1$2"),
                false,
            ),
            RewriteRule::new("not", r"!\s*", Template(".not. "), false),
            RewriteRule::new(
                "ternary",
                r"^\s*([^?]+?)\s*\?\s*([^:]+?)\s*:\s*(.+?)\s*$",
                Template("merge($2, $3, $1)"),
                false,
            ),
        ];

        ExpressionRewriter { rules }
    }

    /// Rule names in application order
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    pub fn rewrite(&self, expr: &str) -> String {
        if expr.trim().is_empty() {
            return expr.to_string();
        }

        let (masked, literals) = mask_literals(expr);
        let mut text = masked;
        for rule in &self.rules {
            text = rule.apply(&text);
        }
        unmask_literals(text.trim(), &literals)
    }
}

impl Default for ExpressionRewriter {
    fn default() -> Self {
        Self::standard()
    }
}

static STANDARD_REWRITER: LazyLock<ExpressionRewriter> = LazyLock::new(ExpressionRewriter::standard);

/// Rewrite a C expression into Fortran with the standard rule table
pub fn rewrite_expression(text: &str) -> String {
    STANDARD_REWRITER.rewrite(text)
}

// ============================================================================
// RULE FUNCTIONS
// ============================================================================

fn sizeof_type(caps: &Captures) -> String {
    match CType::parse(&caps[1]).and_then(|t| if caps[1].contains('*') { Some(8) } else { t.byte_size() }) {
        Some(bytes) => bytes.to_string(),
        None => caps[0].to_string(),
    }
}

fn array_index(caps: &Captures) -> String {
    let index = offset_expression(&caps[2], 1);
    if &caps[1] == ")" {
        // a(i + 1)[j] → a(i + 1, j + 1)
        format!(", {})", index)
    } else {
        format!("{}({})", &caps[1], index)
    }
}

fn numeric_cast(caps: &Captures) -> String {
    let func = match CType::parse(&caps[1]) {
        Some(CType::Float) => "real",
        Some(CType::Double) => "dble",
        Some(CType::Char) => "achar",
        Some(CType::Long) | Some(CType::LongLong) => return format!("int({}, kind=8)", strip_outer_parens(&caps[2])),
        _ => "int",
    };
    format!("{}({})", func, strip_outer_parens(&caps[2]))
}

fn comparison(caps: &Captures) -> String {
    let op = match &caps[1] {
        "!=" => "/=",
        other => other,
    };
    format!(" {} ", op)
}

fn strip_outer_parens(s: &str) -> &str {
    let s = s.trim();
    if s.starts_with('(') && s.ends_with(')') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

// ============================================================================
// LITERAL ARITHMETIC
// ============================================================================

static TRAILING_CONSTANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*[\w)\]])\s*([+-])\s*(\d+)$").unwrap());

/// Add `delta` to an expression, folding integer literals.
///
/// `0` + 1 → `1`, `n - 1` + 1 → `n`, `i` + 1 → `i + 1`.
pub fn offset_expression(expr: &str, delta: i64) -> String {
    let expr = expr.trim();

    if let Ok(n) = expr.parse::<i64>() {
        return match n.checked_add(delta) {
            Some(folded) => folded.to_string(),
            None => append_offset(expr, delta),
        };
    }

    if delta == 0 {
        return expr.to_string();
    }

    let (base, constant) = match TRAILING_CONSTANT.captures(expr) {
        Some(caps) => match caps[3].parse::<i64>() {
            Ok(k) => {
                let signed = if &caps[2] == "-" { -k } else { k };
                (caps[1].trim().to_string(), signed)
            }
            Err(_) => (expr.to_string(), 0),
        },
        None => (expr.to_string(), 0),
    };

    match constant.checked_add(delta) {
        Some(0) => base,
        Some(total) => append_offset(&base, total),
        None => append_offset(expr, delta),
    }
}

/// `base + delta` / `base - |delta|`, without folding
fn append_offset(base: &str, delta: i64) -> String {
    if delta < 0 {
        format!("{} - {}", base, delta.unsigned_abs())
    } else {
        format!("{} + {}", base, delta)
    }
}

// ============================================================================
// LITERAL MASKING
// ============================================================================

fn literal_placeholder(n: usize) -> String {
    format!("__lit{}__", n)
}

/// Replace every string and char literal with a placeholder token
fn mask_literals(s: &str) -> (String, Vec<String>) {
    let mut masked = String::with_capacity(s.len());
    let mut literals = Vec::new();
    let mut current: Option<String> = None;
    let mut prev_in_literal = false;

    for (_, c, in_literal) in tag_literals(s) {
        // A closing quote immediately followed by an opening one
        let restarts = in_literal
            && prev_in_literal
            && (c == '"' || c == '\'')
            && current.as_ref().map(|lit| literal_closed(lit)).unwrap_or(false);

        if restarts || (!in_literal && prev_in_literal) {
            if let Some(lit) = current.take() {
                masked.push_str(&literal_placeholder(literals.len()));
                literals.push(lit);
            }
        }

        if in_literal {
            current.get_or_insert_with(String::new).push(c);
        } else {
            masked.push(c);
        }
        prev_in_literal = in_literal;
    }

    if let Some(lit) = current.take() {
        masked.push_str(&literal_placeholder(literals.len()));
        literals.push(lit);
    }

    (masked, literals)
}

fn literal_closed(lit: &str) -> bool {
    let mut chars = lit.chars();
    let open = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    lit.len() >= 2 && lit.ends_with(open) && !lit[..lit.len() - 1].ends_with('\\')
}

fn unmask_literals(s: &str, literals: &[String]) -> String {
    let mut out = s.to_string();
    for (i, lit) in literals.iter().enumerate().rev() {
        out = out.replace(&literal_placeholder(i), lit);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_order_is_stable() {
        let names = ExpressionRewriter::standard().rule_names();
        let array = names.iter().position(|n| *n == "array_index").unwrap();
        let cmp = names.iter().position(|n| *n == "comparison").unwrap();
        let not = names.iter().position(|n| *n == "not").unwrap();
        assert!(array < cmp);
        assert!(cmp < not);
    }

    #[test]
    fn test_constants() {
        assert_eq!(rewrite_expression("result > INT_MAX / i"), "result > huge(0) / i");
        assert_eq!(rewrite_expression("p == NULL"), "p == null()");
        assert_eq!(rewrite_expression("done = true"), "done = .true.");
    }

    #[test]
    fn test_array_index_folds_literals() {
        assert_eq!(rewrite_expression("a[0]"), "a(1)");
        assert_eq!(rewrite_expression("a[i]"), "a(i + 1)");
        assert_eq!(rewrite_expression("a[n-1]"), "a(n)");
        assert_eq!(rewrite_expression("m[i][j]"), "m(i + 1, j + 1)");
    }

    #[test]
    fn test_comparisons_and_logic() {
        assert_eq!(rewrite_expression("a!=b"), "a /= b");
        assert_eq!(rewrite_expression("x>0 && y<=1"), "x > 0 .and. y <= 1");
        assert_eq!(rewrite_expression("result > 0 || n == 0"), "result > 0 .or. n == 0");
        assert_eq!(rewrite_expression("!done"), ".not. done");
    }

    #[test]
    fn test_literals_untouched() {
        assert_eq!(rewrite_expression(r#"s == "a<b && !c""#), r#"s == "a<b && !c""#);
    }

    #[test]
    fn test_sizeof() {
        assert_eq!(rewrite_expression("sizeof(int)"), "4");
        assert_eq!(rewrite_expression("sizeof(double)"), "8");
        assert_eq!(rewrite_expression("sizeof(a[0])"), "(storage_size(a(1)) / 8)");
    }

    #[test]
    fn test_modulo_and_cast() {
        assert_eq!(rewrite_expression("i % 2 == 0"), "mod(i, 2) == 0");
        assert_eq!(rewrite_expression("(double)sum / n"), "dble(sum) / n");
    }

    #[test]
    fn test_ternary() {
        assert_eq!(rewrite_expression("a > b ? a : b"), "merge(a, b, a > b)");
    }

    #[test]
    fn test_brace_list() {
        assert_eq!(rewrite_expression("{0, 1, 5}"), "[0, 1, 5]");
    }

    #[test]
    fn test_offset_expression() {
        assert_eq!(offset_expression("0", 1), "1");
        assert_eq!(offset_expression("n", -1), "n - 1");
        assert_eq!(offset_expression("n - 1", 1), "n");
        assert_eq!(offset_expression("i + 2", 1), "i + 3");
    }

    #[test]
    fn test_offset_at_integer_limits() {
        assert_eq!(offset_expression("9223372036854775807", 1), "9223372036854775807 + 1");
        assert_eq!(offset_expression("-9223372036854775808", -1), "-9223372036854775808 - 1");
        assert_eq!(offset_expression("n + 9223372036854775807", 1), "n + 9223372036854775807 + 1");
        assert_eq!(rewrite_expression("a[9223372036854775807]"), "a(9223372036854775807 + 1)");
    }

    #[test]
    fn test_address_of_only_in_operand_position() {
        assert_eq!(rewrite_expression("&x"), "x");
        assert_eq!(rewrite_expression("f(&x, &y)"), "f(x, y)");
        assert_eq!(rewrite_expression("p = &a[0]"), "p = a(1)");
        assert_eq!(rewrite_expression("x & mask"), "x & mask");
        assert_eq!(rewrite_expression("ok && &flag"), "ok .and. flag");
    }
}
