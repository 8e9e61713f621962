//! I/O statement translation
//!
//! - `printf` / `fprintf` / `puts` → `print *` and non-advancing `write`
//! - `scanf` → `read(*, *, iostat=io_status)`
//! - `while (scanf(...) == 1 && ...)` → the read moves into the loop body
//!
//! A printf format is split at `\n`: every completed line becomes one
//! `print *` statement, and trailing text without a newline becomes a
//! `write` with `advance='no'` so prompts stay on the same line.

use std::sync::LazyLock;

use regex::Regex;

use crate::error_msg::Diagnostic;
use crate::helpers::{find_matching_delimiter, is_string_literal, split_top_level, tag_literals};

/// Name of the status variable filled by translated reads
pub const IO_STATUS: &str = "io_status";

static CONVERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^%[-+ #0]*(\d+|\*)?(\.(\d+|\*))?(hh|h|ll|l|L|z|j|t)?[diouxXeEfFgGcsp]").unwrap()
});

static SCANF_COMPARISON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(==|!=|>=|>|<)\s*(-?\d+|EOF)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
enum FormatToken {
    Text(String),
    Conversion,
    Newline,
}

/// Tokenize the inside of a C format string
fn tokenize_format(raw: &str) -> Vec<FormatToken> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut chars = raw.char_indices().peekable();

    let flush = |text: &mut String, tokens: &mut Vec<FormatToken>| {
        if !text.is_empty() {
            tokens.push(FormatToken::Text(std::mem::take(text)));
        }
    };

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => {
                    flush(&mut text, &mut tokens);
                    tokens.push(FormatToken::Newline);
                }
                Some((_, 't')) => text.push_str("    "),
                Some((_, other)) => text.push(other),
                None => text.push('\\'),
            },
            '%' => {
                if raw[i + 1..].starts_with('%') {
                    chars.next();
                    text.push('%');
                } else if let Some(m) = CONVERSION.find(&raw[i..]) {
                    flush(&mut text, &mut tokens);
                    tokens.push(FormatToken::Conversion);
                    // Skip the rest of the conversion spec
                    while let Some(&(j, _)) = chars.peek() {
                        if j >= i + m.end() {
                            break;
                        }
                        chars.next();
                    }
                } else {
                    text.push('%');
                }
            }
            _ => text.push(c),
        }
    }
    flush(&mut text, &mut tokens);
    tokens
}

/// Quote text as a Fortran string literal
pub fn fortran_string(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Arguments of a call statement `name(args);`, split at top level
fn call_arguments(stmt: &str) -> Option<Vec<String>> {
    let open = stmt.find('(')?;
    let close = find_matching_delimiter(stmt, open)?;
    let inner = stmt[open + 1..close].trim();
    if inner.is_empty() {
        return Some(Vec::new());
    }
    Some(split_top_level(inner, ','))
}

/// Translate `printf(...)` / `fprintf(stream, ...)` into output statements
pub fn translate_printf<F>(stmt: &str, rewrite: F) -> Result<Vec<String>, Diagnostic>
where
    F: Fn(&str) -> String,
{
    let unparsed = || Diagnostic::PrintfUnparsed(stmt.trim().to_string());
    let mut args = call_arguments(stmt).ok_or_else(unparsed)?;
    if stmt.trim_start().starts_with("fprintf") {
        if args.is_empty() {
            return Err(unparsed());
        }
        args.remove(0);
    }
    if args.is_empty() || !is_string_literal(&args[0]) {
        return Err(unparsed());
    }

    let format = args.remove(0);
    let raw = &format.trim()[1..format.trim().len() - 1];
    let mut values = args.into_iter();

    let mut lines = Vec::new();
    let mut items: Vec<String> = Vec::new();
    for token in tokenize_format(raw) {
        match token {
            FormatToken::Text(t) => items.push(fortran_string(&t)),
            FormatToken::Conversion => match values.next() {
                Some(v) => items.push(rewrite(&v)),
                None => return Err(unparsed()),
            },
            FormatToken::Newline => {
                if items.is_empty() {
                    lines.push("print *".to_string());
                } else {
                    lines.push(format!("print *, {}", items.join(", ")));
                }
                items.clear();
            }
        }
    }
    if !items.is_empty() {
        lines.push(format!("write(*, '(*(g0))', advance='no') {}", items.join(", ")));
    }
    Ok(lines)
}

/// Translate `puts("text")`, which always ends the line
pub fn translate_puts<F>(stmt: &str, rewrite: F) -> Result<Vec<String>, Diagnostic>
where
    F: Fn(&str) -> String,
{
    let args = call_arguments(stmt).ok_or_else(|| Diagnostic::PrintfUnparsed(stmt.trim().to_string()))?;
    match args.as_slice() {
        [arg] if is_string_literal(arg) => {
            let inner = &arg.trim()[1..arg.trim().len() - 1];
            let text: String = tokenize_format(inner)
                .into_iter()
                .map(|t| match t {
                    FormatToken::Text(s) => s,
                    FormatToken::Conversion => String::new(),
                    FormatToken::Newline => String::new(),
                })
                .collect();
            Ok(vec![format!("print *, {}", fortran_string(&text))])
        }
        [arg] => Ok(vec![format!("print *, {}", rewrite(arg))]),
        _ => Err(Diagnostic::PrintfUnparsed(stmt.trim().to_string())),
    }
}

/// Translate the argument list of `scanf(...)` into a read statement
pub fn translate_scanf_args<F>(args_text: &str, rewrite: F) -> Result<String, Diagnostic>
where
    F: Fn(&str) -> String,
{
    let unparsed = || Diagnostic::ScanfUnparsed(args_text.trim().to_string());
    let args = split_top_level(args_text, ',');
    if args.len() < 2 || !is_string_literal(&args[0]) {
        return Err(unparsed());
    }
    let targets: Vec<String> = args[1..]
        .iter()
        .map(|a| rewrite(a.trim().trim_start_matches('&').trim()))
        .collect();
    if targets.iter().any(|t| t.is_empty()) {
        return Err(unparsed());
    }
    Ok(format!("read(*, *, iostat={}) {}", IO_STATUS, targets.join(", ")))
}

/// Translate a `scanf(...);` statement
pub fn translate_scanf<F>(stmt: &str, rewrite: F) -> Result<String, Diagnostic>
where
    F: Fn(&str) -> String,
{
    let open = stmt.find('(').ok_or_else(|| Diagnostic::ScanfUnparsed(stmt.trim().to_string()))?;
    let close = find_matching_delimiter(stmt, open).ok_or_else(|| Diagnostic::ScanfUnparsed(stmt.trim().to_string()))?;
    translate_scanf_args(&stmt[open + 1..close], rewrite)
}

/// A loop condition that reads input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanfCondition {
    /// Arguments of the scanf call
    pub scanf_args: String,
    /// The condition with the call replaced by an `io_status` test
    pub condition: String,
}

/// Split a `scanf(...)` call out of a loop condition.
///
/// `scanf(...) == 1`, `!= EOF` and a bare call all mean "the read
/// succeeded"; `== EOF` and `== 0` mean it failed.
pub fn split_scanf_condition(cond: &str) -> Option<ScanfCondition> {
    let start = cond.match_indices("scanf").map(|(i, _)| i).find(|&i| {
        let in_literal = tag_literals(cond)
            .iter()
            .any(|&(j, _, lit)| j == i && lit);
        let word_start = cond[..i]
            .chars()
            .last()
            .map(|c| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(true);
        !in_literal && word_start
    })?;

    let open = start + cond[start..].find('(')?;
    if cond[start + "scanf".len()..open].trim() != "" {
        return None;
    }
    let close = find_matching_delimiter(cond, open)?;
    let scanf_args = cond[open + 1..close].to_string();

    let tail = &cond[close + 1..];
    let (test, consumed) = match SCANF_COMPARISON.captures(tail) {
        Some(caps) => {
            let op = &caps[1];
            let value = &caps[2];
            let failed = (op == "==" && (value == "EOF" || value == "0")) || op == "<";
            let test = if failed {
                format!("{} /= 0", IO_STATUS)
            } else {
                format!("{} == 0", IO_STATUS)
            };
            (test, caps[0].len())
        }
        None => (format!("{} == 0", IO_STATUS), 0),
    };

    let condition = format!("{}{}{}", &cond[..start], test, &tail[consumed..]);
    Some(ScanfCondition { scanf_args, condition })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn same(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn test_printf_lines_and_prompt() {
        let out = translate_printf(r#"printf("=====\n\n");"#, same).unwrap();
        assert_eq!(out, vec![r#"print *, "=====""#, "print *"]);

        let prompt = translate_printf(r#"printf("factorial(%d) = ", n);"#, same).unwrap();
        assert_eq!(
            prompt,
            vec![r#"write(*, '(*(g0))', advance='no') "factorial(", n, ") = ""#]
        );
    }

    #[test]
    fn test_printf_only_value() {
        let out = translate_printf(r#"printf("%llu\n", result);"#, same).unwrap();
        assert_eq!(out, vec!["print *, result"]);
    }

    #[test]
    fn test_printf_quotes_and_percent() {
        let out = translate_printf(r#"printf("say \"hi\" 100%%\n");"#, same).unwrap();
        assert_eq!(out, vec![r#"print *, "say ""hi"" 100%""#]);
    }

    #[test]
    fn test_printf_missing_argument() {
        assert!(translate_printf(r#"printf("%d %d\n", a);"#, same).is_err());
        assert!(translate_printf("printf(msg);", same).is_err());
    }

    #[test]
    fn test_scanf() {
        let read = translate_scanf(r#"scanf("%d %d", &a, &b);"#, same).unwrap();
        assert_eq!(read, "read(*, *, iostat=io_status) a, b");
    }

    #[test]
    fn test_split_scanf_condition() {
        let c = split_scanf_condition(r#"scanf("%d", &num) == 1 && num != -1"#).unwrap();
        assert_eq!(c.scanf_args, r#""%d", &num"#);
        assert_eq!(c.condition, "io_status == 0 && num != -1");

        let eof = split_scanf_condition(r#"scanf("%d", &x) != EOF"#).unwrap();
        assert_eq!(eof.condition, "io_status == 0");

        assert!(split_scanf_condition("x < 10").is_none());
    }
}
