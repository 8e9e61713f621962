//! Look-ahead Lowering Utilities
//!
//! Functions that look ahead in the logical lines to make translation
//! decisions: whether a closing `}` continues into an `else` chain, and
//! whether a `do` block ends in `while (...)`.

use crate::helpers::{starts_with_keyword, strip_inline_comment};

/// Index and text of the next non-empty, non-comment line after `idx`
fn next_code_line(lines: &[String], idx: usize) -> Option<(usize, &str)> {
    for (offset, future) in lines.iter().enumerate().skip(idx + 1) {
        let ft = future.trim();
        if ft.is_empty() || ft.starts_with("//") {
            continue;
        }
        return Some((offset, ft));
    }
    None
}

/// Check if the next code line starts with `else`
///
/// Used to keep a conditional frame open across `}` for `else` chains.
pub fn check_next_is_else(lines: &[String], idx: usize) -> bool {
    match next_code_line(lines, idx) {
        Some((_, ft)) => {
            let ft = strip_inline_comment(ft);
            starts_with_keyword(&ft, "else") || ft.starts_with("} else")
        }
        None => false,
    }
}

/// If the next code line is the `while (c);` tail of a do-while loop,
/// return its index
pub fn find_do_while_tail(lines: &[String], idx: usize) -> Option<usize> {
    let (pos, ft) = next_code_line(lines, idx)?;
    if starts_with_keyword(ft, "while") && ft.ends_with(';') {
        Some(pos)
    } else {
        None
    }
}
