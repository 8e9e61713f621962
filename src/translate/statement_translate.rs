//! Statement classification and simple statement translation
//!
//! [`classify`] assigns every logical line exactly one [`LineKind`], in a
//! fixed priority order. The simple statement kinds are translated here;
//! the block-structured kinds are handled by the body translator.

use crate::control_flow::extract_parenthesized;
use crate::helpers::{find_assignment_eq, is_valid_identifier, starts_with_keyword, tag_literals};
use crate::variable::{is_declaration, starts_with_type};

/// Classification of one logical line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `// text` or a single-line `/* text */`
    Comment(String),
    Declaration,
    /// Type-led line that is not a plain declaration (`int f(int);`, `int (*fp)(int);`)
    UnparsedDeclaration,
    /// `return expr;` / `return;`
    Return(Option<String>),
    /// `} else ...` on one line; carries the `else ...` part
    CloseThenElse(String),
    If { cond: String, rest: String },
    ElseIf { cond: String, rest: String },
    Else { rest: String },
    For { header: String, rest: String },
    While { cond: String, rest: String },
    Do { rest: String },
    /// A control keyword whose condition is not parenthesized
    MalformedHeader { braced: bool },
    OpenBrace,
    CloseBrace,
    Break,
    Continue,
    /// `printf` / `fprintf` / `puts`
    Print,
    /// `scanf`
    Read,
    Increment { target: String, delta: i64 },
    CompoundAssign { target: String, op: char, value: String },
    Assignment { target: String, value: String },
    /// A call or other expression statement
    Statement(String),
    /// Empty statement `;`
    Empty,
    Unrecognized,
}

impl LineKind {
    /// Does this kind open (or continue) a compound construct?
    pub fn is_header(&self) -> bool {
        matches!(
            self,
            LineKind::If { .. }
                | LineKind::ElseIf { .. }
                | LineKind::Else { .. }
                | LineKind::For { .. }
                | LineKind::While { .. }
                | LineKind::Do { .. }
                | LineKind::OpenBrace
                | LineKind::CloseBrace
                | LineKind::CloseThenElse(_)
                | LineKind::MalformedHeader { .. }
        )
    }
}

fn header(line: &str, keyword: &str) -> Option<(String, String)> {
    extract_parenthesized(line, keyword)
}

/// Find a compound assignment operator (`+=`, `-=`, `*=`, `/=`, `%=`) at top level
fn split_compound(stmt: &str) -> Option<(String, char, String)> {
    let tagged = tag_literals(stmt);
    let mut depth = 0i32;
    for (pos, &(i, c, lit)) in tagged.iter().enumerate() {
        if lit {
            continue;
        }
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            '=' if depth == 0 && pos > 0 => {
                let (_, prev, _) = tagged[pos - 1];
                let next = tagged.get(pos + 1).map(|t| t.1);
                let before_prev = if pos > 1 { Some(tagged[pos - 2].1) } else { None };
                if matches!(prev, '+' | '-' | '*' | '/' | '%')
                    && next != Some('=')
                    && before_prev != Some(prev)
                {
                    let op_start = tagged[pos - 1].0;
                    let target = stmt[..op_start].trim();
                    if target.is_empty() {
                        return None;
                    }
                    return Some((target.to_string(), prev, stmt[i + 1..].trim().to_string()));
                }
                return None;
            }
            _ => {}
        }
    }
    None
}

/// `i++`, `++i`, `i--`, `--i`
fn split_increment(stmt: &str) -> Option<(String, i64)> {
    let s = stmt.trim();
    let (target, delta) = if let Some(t) = s.strip_suffix("++") {
        (t, 1)
    } else if let Some(t) = s.strip_suffix("--") {
        (t, -1)
    } else if let Some(t) = s.strip_prefix("++") {
        (t, 1)
    } else if let Some(t) = s.strip_prefix("--") {
        (t, -1)
    } else {
        return None;
    };
    let target = target.trim();
    let simple = target
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '[' || c == ']' || c == ' ' || c == '.');
    if target.is_empty() || !simple {
        return None;
    }
    Some((target.to_string(), delta))
}

/// Classify one logical line
pub fn classify(line: &str) -> LineKind {
    let line = line.trim();

    // 1. comments
    if let Some(text) = line.strip_prefix("//") {
        return LineKind::Comment(text.trim().to_string());
    }
    if line.starts_with("/*") && line.ends_with("*/") && line.len() >= 4 {
        return LineKind::Comment(line[2..line.len() - 2].trim().to_string());
    }

    // 2. declarations
    if is_declaration(line) {
        return LineKind::Declaration;
    }
    if starts_with_type(line) {
        return LineKind::UnparsedDeclaration;
    }

    // 3. return
    if starts_with_keyword(line, "return") {
        let value = line["return".len()..].trim().trim_end_matches(';').trim();
        return LineKind::Return(if value.is_empty() { None } else { Some(value.to_string()) });
    }

    // 4. `} else ...`
    if let Some(rest) = line.strip_prefix('}') {
        let rest = rest.trim();
        if starts_with_keyword(rest, "else") {
            return LineKind::CloseThenElse(rest.to_string());
        }
    }

    // 5-7. conditionals
    if starts_with_keyword(line, "if") {
        return match header(line, "if") {
            Some((cond, rest)) => LineKind::If { cond, rest },
            None => LineKind::MalformedHeader { braced: line.ends_with('{') },
        };
    }
    if starts_with_keyword(line, "else") {
        let rest = line["else".len()..].trim();
        if starts_with_keyword(rest, "if") {
            return match header(rest, "if") {
                Some((cond, rest)) => LineKind::ElseIf { cond, rest },
                None => LineKind::MalformedHeader { braced: line.ends_with('{') },
            };
        }
        return LineKind::Else { rest: rest.to_string() };
    }

    // 8-10. loops
    if starts_with_keyword(line, "for") {
        return match header(line, "for") {
            Some((header, rest)) => LineKind::For { header, rest },
            None => LineKind::MalformedHeader { braced: line.ends_with('{') },
        };
    }
    if starts_with_keyword(line, "while") {
        return match header(line, "while") {
            Some((cond, rest)) => LineKind::While { cond, rest },
            None => LineKind::MalformedHeader { braced: line.ends_with('{') },
        };
    }
    if starts_with_keyword(line, "do") {
        return LineKind::Do { rest: line["do".len()..].trim().to_string() };
    }

    // 11-12. braces
    if line == "{" {
        return LineKind::OpenBrace;
    }
    if line == "}" || line == "};" {
        return LineKind::CloseBrace;
    }

    // 13. loop control
    if line == "break;" {
        return LineKind::Break;
    }
    if line == "continue;" {
        return LineKind::Continue;
    }

    if line == ";" {
        return LineKind::Empty;
    }
    if !line.ends_with(';') {
        return LineKind::Unrecognized;
    }
    let stmt = line.trim_end_matches(';').trim();

    // 14-15. I/O
    if ["printf", "fprintf", "puts"].iter().any(|kw| starts_with_keyword(stmt, kw)) {
        return LineKind::Print;
    }
    if starts_with_keyword(stmt, "scanf") {
        return LineKind::Read;
    }

    // 16. increment / decrement
    if let Some((target, delta)) = split_increment(stmt) {
        return LineKind::Increment { target, delta };
    }

    // 17. compound assignment
    if let Some((target, op, value)) = split_compound(stmt) {
        return LineKind::CompoundAssign { target, op, value };
    }

    // 18. assignment
    if let Some(eq) = find_assignment_eq(stmt) {
        let target = stmt[..eq].trim();
        if !target.is_empty() {
            return LineKind::Assignment {
                target: target.to_string(),
                value: stmt[eq + 1..].trim().to_string(),
            };
        }
    }

    // 19. other statements
    if stmt.ends_with(')') && stmt.contains('(') {
        return LineKind::Statement(stmt.to_string());
    }

    LineKind::Unrecognized
}

// ============================================================================
// SIMPLE STATEMENT TRANSLATION
// ============================================================================

fn is_simple_operand(expr: &str) -> bool {
    let e = expr.trim();
    if e.parse::<f64>().is_ok() || is_valid_identifier(e) {
        return true;
    }
    // A single call or indexed name
    match e.find('(') {
        Some(open) => {
            is_valid_identifier(&e[..open]) && crate::helpers::find_matching_delimiter(e, open) == Some(e.len() - 1)
        }
        None => false,
    }
}

/// `x op= e` → `x = x op e`, with `%=` going through `mod`
pub fn translate_compound(target: &str, op: char, value: &str) -> String {
    let value = if is_simple_operand(value) {
        value.trim().to_string()
    } else {
        format!("({})", value.trim())
    };
    match op {
        '%' => format!("{} = mod({}, {})", target, target, value),
        _ => format!("{} = {} {} {}", target, target, op, value),
    }
}

/// `i++` → `i = i + 1`
pub fn translate_increment(target: &str, delta: i64) -> String {
    if delta >= 0 {
        format!("{} = {} + {}", target, target, delta)
    } else {
        format!("{} = {} - {}", target, target, -delta)
    }
}

/// Split a chained assignment `a = b = e` into its targets and final value
pub fn split_chained_assignment(target: &str, value: &str) -> (Vec<String>, String) {
    let mut targets = vec![target.trim().to_string()];
    let mut value = value.trim().to_string();
    while let Some(eq) = find_assignment_eq(&value) {
        let next_target = value[..eq].trim();
        if !is_valid_identifier(next_target) {
            break;
        }
        targets.push(next_target.to_string());
        value = value[eq + 1..].trim().to_string();
    }
    (targets, value)
}

/// Name of the function called by `name(args)`, if the statement is a call
pub fn called_function(stmt: &str) -> Option<&str> {
    let open = stmt.find('(')?;
    let name = stmt[..open].trim();
    if is_valid_identifier(name) {
        Some(name)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_priority() {
        assert_eq!(classify("// note"), LineKind::Comment("note".to_string()));
        assert_eq!(classify("int x = 1;"), LineKind::Declaration);
        assert_eq!(classify("int helper(int);"), LineKind::UnparsedDeclaration);
        assert_eq!(classify("double_it(x);"), LineKind::Statement("double_it(x)".to_string()));
        assert_eq!(classify("return x;"), LineKind::Return(Some("x".to_string())));
        assert_eq!(classify("return;"), LineKind::Return(None));
        assert_eq!(classify("{"), LineKind::OpenBrace);
        assert_eq!(classify("}"), LineKind::CloseBrace);
        assert_eq!(classify("break;"), LineKind::Break);
        assert_eq!(classify(r#"printf("hi\n");"#), LineKind::Print);
        assert_eq!(classify(r#"scanf("%d", &x);"#), LineKind::Read);
        assert_eq!(classify("goto end;"), LineKind::Unrecognized);
    }

    #[test]
    fn test_classify_headers() {
        assert_eq!(
            classify("if (x > 0) return x;"),
            LineKind::If { cond: "x > 0".to_string(), rest: "return x;".to_string() }
        );
        assert_eq!(
            classify("else if (y) {"),
            LineKind::ElseIf { cond: "y".to_string(), rest: "{".to_string() }
        );
        assert_eq!(classify("else"), LineKind::Else { rest: String::new() });
        assert_eq!(classify("} else {"), LineKind::CloseThenElse("else {".to_string()));
        assert_eq!(classify("do {"), LineKind::Do { rest: "{".to_string() });
        assert_eq!(classify("if x > 0 {"), LineKind::MalformedHeader { braced: true });
    }

    #[test]
    fn test_classify_assignments() {
        assert_eq!(classify("i++;"), LineKind::Increment { target: "i".to_string(), delta: 1 });
        assert_eq!(classify("--count;"), LineKind::Increment { target: "count".to_string(), delta: -1 });
        assert_eq!(
            classify("result *= i;"),
            LineKind::CompoundAssign { target: "result".to_string(), op: '*', value: "i".to_string() }
        );
        assert_eq!(
            classify("x = a == b;"),
            LineKind::Assignment { target: "x".to_string(), value: "a == b".to_string() }
        );
        assert_eq!(classify("swap(a, b);"), LineKind::Statement("swap(a, b)".to_string()));
    }

    #[test]
    fn test_do_keyword_not_prefix() {
        assert!(matches!(classify("done = 1;"), LineKind::Assignment { .. }));
        assert!(matches!(classify("format(x);"), LineKind::Statement(_)));
    }

    #[test]
    fn test_translate_compound_and_increment() {
        assert_eq!(translate_compound("result", '*', "i"), "result = result * i");
        assert_eq!(translate_compound("s", '+', "a * b"), "s = s + (a * b)");
        assert_eq!(translate_compound("r", '%', "10"), "r = mod(r, 10)");
        assert_eq!(translate_increment("i", 1), "i = i + 1");
        assert_eq!(translate_increment("i", -1), "i = i - 1");
    }

    #[test]
    fn test_chained_assignment() {
        let (targets, value) = split_chained_assignment("a", "b = 0");
        assert_eq!(targets, vec!["a", "b"]);
        assert_eq!(value, "0");
    }
}
