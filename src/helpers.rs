//! Helper utility functions for the C to Fortran translator
//!
//! Contains general-purpose text utilities used throughout the translator:
//! - Literal-aware scanning (string and char literals are never split or rewritten)
//! - Inline comment splitting
//! - Delimiter matching and top-level splitting
//! - Keyword and identifier checks

/// Tag every character of `s` with whether it sits inside a string or char literal.
///
/// Returns `(byte_index, char, inside_literal)` triples. Quote characters
/// themselves count as part of the literal.
pub fn tag_literals(s: &str) -> Vec<(usize, char, bool)> {
    let mut tagged = Vec::with_capacity(s.len());
    let mut quote: Option<char> = None;
    let mut escape_next = false;

    for (i, c) in s.char_indices() {
        match quote {
            Some(q) => {
                tagged.push((i, c, true));
                if escape_next {
                    escape_next = false;
                } else if c == '\\' {
                    escape_next = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                    tagged.push((i, c, true));
                } else {
                    tagged.push((i, c, false));
                }
            }
        }
    }

    tagged
}

/// Split a line into its code part and a trailing `//` comment, preserving string literals
pub fn split_inline_comment(line: &str) -> (String, Option<String>) {
    let tagged = tag_literals(line);
    for (pos, &(i, c, in_literal)) in tagged.iter().enumerate() {
        if in_literal || c != '/' {
            continue;
        }
        if let Some(&(_, '/', false)) = tagged.get(pos + 1) {
            let code = line[..i].trim_end().to_string();
            let comment = line[i + 2..].trim().to_string();
            return (code, Some(comment));
        }
    }
    (line.trim_end().to_string(), None)
}

/// Strip inline comments from a line, preserving string literals
pub fn strip_inline_comment(line: &str) -> String {
    split_inline_comment(line).0
}

/// Find the byte index of the delimiter closing the one at `open_idx`.
///
/// Works for `(`, `[` and `{`; nested delimiters of the same kind and
/// anything inside literals are skipped.
pub fn find_matching_delimiter(s: &str, open_idx: usize) -> Option<usize> {
    let open = s[open_idx..].chars().next()?;
    let close = match open {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        _ => return None,
    };

    let mut depth = 0usize;
    for (i, c, in_literal) in tag_literals(s) {
        if i < open_idx || in_literal {
            continue;
        }
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Split `s` at every `sep` that is outside literals and outside any
/// parenthesis, bracket or brace nesting. Pieces are trimmed.
pub fn split_top_level(s: &str, sep: char) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;

    for (i, c, in_literal) in tag_literals(s) {
        if in_literal {
            continue;
        }
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = (depth - 1).max(0),
            _ if c == sep && depth == 0 => {
                pieces.push(s[start..i].trim().to_string());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(s[start..].trim().to_string());
    pieces
}

/// Find the first bare `=` (not part of `==`, `<=`, `>=`, `!=` or a
/// compound operator) outside literals and nesting.
pub fn find_assignment_eq(s: &str) -> Option<usize> {
    let tagged = tag_literals(s);
    let mut depth: i32 = 0;

    for (pos, &(i, c, in_literal)) in tagged.iter().enumerate() {
        if in_literal {
            continue;
        }
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            '=' if depth == 0 => {
                let prev = if pos > 0 { Some(tagged[pos - 1].1) } else { None };
                let next = tagged.get(pos + 1).map(|t| t.1);
                let is_comparison = matches!(prev, Some('=' | '<' | '>' | '!')) || next == Some('=');
                let is_compound = matches!(prev, Some('+' | '-' | '*' | '/' | '%' | '&' | '|' | '^'));
                if !is_comparison && !is_compound {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// True if `s` contains `pat` outside string and char literals
pub fn contains_outside_literals(s: &str, pat: &str) -> bool {
    let tagged = tag_literals(s);
    s.match_indices(pat).any(|(idx, _)| {
        tagged
            .iter()
            .find(|(i, _, _)| *i == idx)
            .map(|(_, _, in_literal)| !in_literal)
            .unwrap_or(false)
    })
}

/// Apply `f` to every code segment of `s`, copying literal segments verbatim
pub fn map_code_segments<F>(s: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut result = String::with_capacity(s.len());
    let mut segment_start = 0;
    let mut segment_is_literal = false;

    for (i, _, in_literal) in tag_literals(s) {
        if in_literal != segment_is_literal {
            let segment = &s[segment_start..i];
            if segment_is_literal {
                result.push_str(segment);
            } else {
                result.push_str(&f(segment));
            }
            segment_start = i;
            segment_is_literal = in_literal;
        }
    }

    let tail = &s[segment_start..];
    if segment_is_literal {
        result.push_str(tail);
    } else {
        result.push_str(&f(tail));
    }
    result
}

/// True if `line` starts with keyword `kw` as a whole word (`if(`, `if (`, but not `ifx`)
pub fn starts_with_keyword(line: &str, kw: &str) -> bool {
    match line.strip_prefix(kw) {
        Some(rest) => rest
            .chars()
            .next()
            .map(|c| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(true),
        None => false,
    }
}

/// Check if a string is a valid C identifier
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// True if `s` is a complete string literal (`"..."`)
pub fn is_string_literal(s: &str) -> bool {
    let s = s.trim();
    s.len() >= 2 && s.starts_with('"') && s.ends_with('"')
}

/// Leading indentation for `level` at `width` spaces per level
pub fn indent_str(level: usize, width: usize) -> String {
    " ".repeat(level * width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_inline_comment() {
        assert_eq!(strip_inline_comment("x = 10; // comment"), "x = 10;");
        assert_eq!(strip_inline_comment(r#"printf("a // b");"#), r#"printf("a // b");"#);
    }

    #[test]
    fn test_split_inline_comment_returns_text() {
        let (code, comment) = split_inline_comment("i++; // next");
        assert_eq!(code, "i++;");
        assert_eq!(comment.as_deref(), Some("next"));
    }

    #[test]
    fn test_find_matching_delimiter_skips_literals() {
        let s = r#"printf(")", f(x))"#;
        assert_eq!(find_matching_delimiter(s, 6), Some(s.len() - 1));
    }

    #[test]
    fn test_split_top_level_respects_nesting() {
        let parts = split_top_level(r#""%d, %d", f(a, b), c[1]"#, ',');
        assert_eq!(parts, vec![r#""%d, %d""#, "f(a, b)", "c[1]"]);
    }

    #[test]
    fn test_find_assignment_eq() {
        assert_eq!(find_assignment_eq("x = a == b"), Some(2));
        assert_eq!(find_assignment_eq("a == b"), None);
        assert_eq!(find_assignment_eq("a <= b"), None);
        assert_eq!(find_assignment_eq("x += 1"), None);
    }

    #[test]
    fn test_map_code_segments_leaves_strings() {
        let out = map_code_segments(r#"a<b, "a<b""#, |seg| seg.replace('<', " < "));
        assert_eq!(out, r#"a < b, "a<b""#);
    }

    #[test]
    fn test_starts_with_keyword() {
        assert!(starts_with_keyword("if(x)", "if"));
        assert!(starts_with_keyword("else", "else"));
        assert!(!starts_with_keyword("ifdef", "if"));
        assert!(!starts_with_keyword("return_value = 1;", "return"));
    }
}
