//! Logical Line Lowering
//!
//! Splits a C function body into logical lines, one statement or control
//! header per line:
//!
//! ```text
//! if (x) { a = 1; b = 2; }      if (x) {
//!                         ==>   a = 1;
//!                               b = 2;
//!                               }
//! ```
//!
//! - Semicolons inside parentheses, literals and initializer braces never split
//! - A block `{` stays on its header line; a `}` always stands alone
//! - `//` and `/* */` comments become `// text` lines
//! - A statement continued over several physical lines is joined

/// Scanner state while walking the body text
struct LineSplitter {
    lines: Vec<String>,
    current: String,
    /// Comments seen while a statement was still open
    pending_comments: Vec<String>,
    paren_depth: usize,
    init_brace_depth: usize,
}

impl LineSplitter {
    fn new() -> Self {
        LineSplitter {
            lines: Vec::new(),
            current: String::new(),
            pending_comments: Vec::new(),
            paren_depth: 0,
            init_brace_depth: 0,
        }
    }

    fn flush(&mut self) {
        let text = self.current.trim().to_string();
        self.current.clear();
        if !text.is_empty() {
            self.lines.push(text);
        }
        self.lines.append(&mut self.pending_comments);
    }

    fn comment(&mut self, text: &str) {
        let text = text.trim().trim_start_matches('*').trim();
        if text.is_empty() {
            return;
        }
        let line = format!("// {}", text);
        if self.current.trim().is_empty() {
            self.lines.push(line);
        } else {
            self.pending_comments.push(line);
        }
    }

    fn last_code_char(&self) -> Option<char> {
        self.current.trim_end().chars().last()
    }

    /// At a newline: does the open text end a logical line?
    fn ends_logical_line(&self) -> bool {
        let text = self.current.trim();
        if text.is_empty() || self.paren_depth > 0 || self.init_brace_depth > 0 {
            return false;
        }
        text.ends_with(')') || text == "else" || text == "do"
    }
}

/// Split a function body into logical lines
pub fn logical_lines(body: &str) -> Vec<String> {
    let mut sp = LineSplitter::new();
    let chars: Vec<char> = body.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match c {
            '/' if next == Some('/') => {
                let start = i + 2;
                let mut end = start;
                while end < chars.len() && chars[end] != '\n' {
                    end += 1;
                }
                let text: String = chars[start..end].iter().collect();
                sp.comment(&text);
                i = end;
                continue;
            }
            '/' if next == Some('*') => {
                let mut j = i + 2;
                let mut text = String::new();
                while j < chars.len() && !(chars[j] == '*' && chars.get(j + 1) == Some(&'/')) {
                    if chars[j] == '\n' {
                        sp.comment(&text);
                        text.clear();
                    } else {
                        text.push(chars[j]);
                    }
                    j += 1;
                }
                sp.comment(&text);
                i = (j + 2).min(chars.len());
                continue;
            }
            '"' | '\'' => {
                sp.current.push(c);
                let mut j = i + 1;
                while j < chars.len() {
                    let lc = chars[j];
                    sp.current.push(lc);
                    if lc == '\\' {
                        if let Some(&escaped) = chars.get(j + 1) {
                            sp.current.push(escaped);
                            j += 2;
                            continue;
                        }
                    }
                    j += 1;
                    if lc == c {
                        break;
                    }
                }
                i = j;
                continue;
            }
            '(' => {
                sp.paren_depth += 1;
                sp.current.push(c);
            }
            ')' => {
                sp.paren_depth = sp.paren_depth.saturating_sub(1);
                sp.current.push(c);
            }
            ';' => {
                sp.current.push(c);
                if sp.paren_depth == 0 && sp.init_brace_depth == 0 {
                    sp.flush();
                }
            }
            '{' => {
                let is_initializer = sp.init_brace_depth > 0
                    || sp.paren_depth > 0
                    || matches!(sp.last_code_char(), Some('=') | Some(','));
                if is_initializer {
                    sp.init_brace_depth += 1;
                    sp.current.push(c);
                } else {
                    let header = sp.current.trim().to_string();
                    sp.current.clear();
                    if header.is_empty() {
                        sp.current.push('{');
                    } else {
                        sp.current = format!("{} {{", header);
                    }
                    sp.flush();
                }
            }
            '}' => {
                if sp.init_brace_depth > 0 {
                    sp.init_brace_depth -= 1;
                    sp.current.push(c);
                } else {
                    sp.flush();
                    sp.lines.push("}".to_string());
                }
            }
            '\n' => {
                if sp.ends_logical_line() {
                    sp.flush();
                } else if !sp.current.is_empty() {
                    sp.current.push(' ');
                }
            }
            '\r' => {}
            '\t' => sp.current.push(' '),
            _ => sp.current.push(c),
        }
        i += 1;
    }

    sp.flush();
    sp.lines
        .into_iter()
        .map(|l| collapse_spaces_outside_literals(&l))
        .collect()
}

/// Collapse runs of whitespace in code while keeping literals intact
fn collapse_spaces_outside_literals(line: &str) -> String {
    crate::helpers::map_code_segments(line, |seg| {
        let mut out = String::with_capacity(seg.len());
        let mut prev_space = false;
        for c in seg.chars() {
            if c.is_whitespace() {
                if !prev_space {
                    out.push(' ');
                }
                prev_space = true;
            } else {
                out.push(c);
                prev_space = false;
            }
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_same_line_statements() {
        let lines = logical_lines("a = 1; b = 2;\nc = 3;");
        assert_eq!(lines, vec!["a = 1;", "b = 2;", "c = 3;"]);
    }

    #[test]
    fn test_braced_body_on_header_line() {
        let lines = logical_lines("if (x) { a = 1; }");
        assert_eq!(lines, vec!["if (x) {", "a = 1;", "}"]);
    }

    #[test]
    fn test_for_header_semicolons_do_not_split() {
        let lines = logical_lines("for (i = 0; i < n; i++) {\n  s += i;\n}");
        assert_eq!(lines, vec!["for (i = 0; i < n; i++) {", "s += i;", "}"]);
    }

    #[test]
    fn test_braceless_header_on_own_line() {
        let lines = logical_lines("if (n == 0)\n    return 1;");
        assert_eq!(lines, vec!["if (n == 0)", "return 1;"]);
    }

    #[test]
    fn test_initializer_braces_stay_inline() {
        let lines = logical_lines("int a[] = {1, 2, 3};\nx = 1;");
        assert_eq!(lines, vec!["int a[] = {1, 2, 3};", "x = 1;"]);
    }

    #[test]
    fn test_comments_become_lines() {
        let lines = logical_lines("// base case\nx = 1; /* done */");
        assert_eq!(lines, vec!["// base case", "x = 1;", "// done"]);
    }

    #[test]
    fn test_else_chain_split() {
        let lines = logical_lines("} else {\n  y = 2;\n}");
        assert_eq!(lines, vec!["}", "else {", "y = 2;", "}"]);
    }

    #[test]
    fn test_string_with_semicolon() {
        let lines = logical_lines(r#"printf("a; {b}\n");"#);
        assert_eq!(lines, vec![r#"printf("a; {b}\n");"#]);
    }

    #[test]
    fn test_multiline_statement_joined() {
        let lines = logical_lines("total =\n    a +\n    b;");
        assert_eq!(lines, vec!["total = a + b;"]);
    }
}
