//! Output block restructuring
//!
//! Fortran wants every declaration of a unit before its first executable
//! statement, while the body translator emits some declarations where they
//! are first needed (`integer :: io_status`). This pass re-scans the emitted
//! text and moves every declaration-shaped line of a unit up to just after
//! its `implicit none`.
//!
//! Units are found by header and matched to their `end` line at the same
//! nesting level. A unit with a `contains` line only has its specification
//! part rearranged; the procedures after `contains` are queued on a
//! worklist and restructured on their own. Declarations never move from
//! one unit into another, and running the pass twice changes nothing.

use std::sync::LazyLock;

use log::trace;
use regex::Regex;

use crate::helpers::contains_outside_literals;

static UNIT_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:recursive|pure|elemental|impure|integer|real|logical|complex|character|double\s+precision)(?:\s*\([^)]*\))?\s+)*(program|module|function|subroutine)\b",
    )
    .unwrap()
});

static UNIT_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*end\s*(program|module|function|subroutine)\b").unwrap());

static MODULE_PROCEDURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*module\s+procedure\b").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Program,
    Module,
    Procedure,
}

impl BlockKind {
    fn from_keyword(keyword: &str) -> BlockKind {
        match keyword.to_ascii_lowercase().as_str() {
            "program" => BlockKind::Program,
            "module" => BlockKind::Module,
            _ => BlockKind::Procedure,
        }
    }
}

/// One program unit, by line index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBlock {
    pub kind: BlockKind,
    pub header: usize,
    /// Index of the `end ...` line
    pub end: usize,
    /// Index of the unit's own `contains` line
    pub contains: Option<usize>,
}

impl OutputBlock {
    /// Exclusive end of the specification and execution part
    fn own_part_end(&self) -> usize {
        self.contains.unwrap_or(self.end)
    }
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('!')
}

/// Kind of unit opened by this line, if it is a unit header
pub fn unit_header_kind(line: &str) -> Option<BlockKind> {
    if is_comment(line) || UNIT_END.is_match(line) || MODULE_PROCEDURE.is_match(line) {
        return None;
    }
    let trimmed = line.trim_start();
    if trimmed.len() >= 3 && trimmed[..3].eq_ignore_ascii_case("end") {
        return None;
    }
    UNIT_HEADER
        .captures(line)
        .map(|caps| BlockKind::from_keyword(&caps[1]))
}

fn is_unit_end(line: &str) -> bool {
    !is_comment(line) && UNIT_END.is_match(line)
}

/// A line the pass moves: `type :: name` outside string literals
pub fn is_declaration_line(line: &str) -> bool {
    !is_comment(line) && contains_outside_literals(line, "::")
}

fn is_implicit_none(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("implicit none")
}

fn is_use_line(line: &str) -> bool {
    let t = line.trim_start();
    t.len() > 4 && t[..4].eq_ignore_ascii_case("use ")
}

/// Match the unit starting at `header` to its `end` line, looking no further than `limit`
fn scan_block(lines: &[String], header: usize, limit: usize) -> Option<OutputBlock> {
    let kind = unit_header_kind(&lines[header])?;
    let mut depth = 0usize;
    let mut contains = None;
    for (i, line) in lines.iter().enumerate().take(limit).skip(header) {
        if unit_header_kind(line).is_some() {
            depth += 1;
        } else if is_unit_end(line) {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(OutputBlock {
                    kind,
                    header,
                    end: i,
                    contains,
                });
            }
        } else if depth == 1 && contains.is_none() && line.trim().eq_ignore_ascii_case("contains") {
            contains = Some(i);
        }
    }
    None
}

/// Stable-partition the unit's own part so declarations follow `implicit none`
fn hoist_declarations(lines: &mut [String], block: &OutputBlock) {
    let start = block.header + 1;
    let stop = block.own_part_end();
    if start >= stop {
        return;
    }

    let region: Vec<String> = lines[start..stop].to_vec();
    let marker = region.iter().position(|l| is_implicit_none(l));

    let mut prefix = Vec::new();
    let mut declarations = Vec::new();
    let mut rest = Vec::new();
    match marker {
        Some(m) => {
            for (i, line) in region.iter().enumerate() {
                if i == m {
                    prefix.push(line.clone());
                } else if is_declaration_line(line) {
                    declarations.push(line.clone());
                } else if i < m {
                    prefix.push(line.clone());
                } else {
                    rest.push(line.clone());
                }
            }
        }
        None => {
            let uses = region.iter().take_while(|l| is_use_line(l)).count();
            prefix.extend(region[..uses].iter().cloned());
            for line in &region[uses..] {
                if is_declaration_line(line) {
                    declarations.push(line.clone());
                } else {
                    rest.push(line.clone());
                }
            }
        }
    }

    let reordered = prefix.into_iter().chain(declarations).chain(rest);
    for (slot, line) in lines[start..stop].iter_mut().zip(reordered) {
        *slot = line;
    }
}

/// Restructure every unit in `lines`
pub fn restructure_lines(mut lines: Vec<String>) -> Vec<String> {
    let mut worklist = vec![(0usize, lines.len())];
    while let Some((from, to)) = worklist.pop() {
        let mut i = from;
        while i < to {
            let Some(block) = scan_block(&lines, i, to) else {
                i += 1;
                continue;
            };
            trace!("{:?} unit at line {} ends at {}", block.kind, block.header + 1, block.end + 1);
            hoist_declarations(&mut lines, &block);
            if let Some(c) = block.contains {
                worklist.push((c + 1, block.end));
            }
            i = block.end + 1;
        }
    }
    lines
}

/// Restructure emitted Fortran text
pub fn restructure_output(text: &str) -> String {
    let lines: Vec<String> = text.lines().map(String::from).collect();
    let mut out = restructure_lines(lines).join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCATTERED: &str = "\
module m
  implicit none
  integer :: g
contains
  function f(x) result(f_result)
    implicit none
    integer, intent(in) :: x
    integer :: f_result

    f_result = x
    integer :: late
    late = 1
  end function f
end module m
program main
  use m
  implicit none
  print *, \"a :: b\"
  integer :: io_status
  read(*, *, iostat=io_status) n
end program main
";

    #[test]
    fn test_header_detection() {
        assert_eq!(unit_header_kind("program main"), Some(BlockKind::Program));
        assert_eq!(unit_header_kind("  recursive function f(n) result(r)"), Some(BlockKind::Procedure));
        assert_eq!(unit_header_kind("integer function g(x)"), Some(BlockKind::Procedure));
        assert_eq!(unit_header_kind("MODULE Things"), Some(BlockKind::Module));
        assert_eq!(unit_header_kind("end function f"), None);
        assert_eq!(unit_header_kind("module procedure foo"), None);
        assert_eq!(unit_header_kind("! function in a comment"), None);
        assert_eq!(unit_header_kind("x = function_count"), None);
    }

    #[test]
    fn test_declarations_hoisted_within_unit() {
        let out = restructure_output(SCATTERED);
        let lines: Vec<&str> = out.lines().collect();

        let late = lines.iter().position(|l| l.contains(":: late")).unwrap();
        let result = lines.iter().position(|l| l.contains(":: f_result")).unwrap();
        let assign = lines.iter().position(|l| l.contains("f_result = x")).unwrap();
        assert_eq!(late, result + 1);
        assert!(late < assign);

        let io = lines.iter().position(|l| l.contains(":: io_status")).unwrap();
        let implicit = lines.iter().rposition(|l| l.trim() == "implicit none").unwrap();
        assert_eq!(io, implicit + 1);

        // The module's own declaration stays before `contains`
        let g = lines.iter().position(|l| l.contains(":: g")).unwrap();
        assert_eq!(g, 2);
        // String literals containing `::` are not declarations
        assert!(lines[io + 1].contains("print"));
    }

    #[test]
    fn test_idempotent() {
        let once = restructure_output(SCATTERED);
        let twice = restructure_output(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_no_marker_goes_after_uses() {
        let text = "subroutine s()\n  use m\n  call t()\n  integer :: k\nend subroutine s\n";
        let out = restructure_output(text);
        assert_eq!(
            out,
            "subroutine s()\n  use m\n  integer :: k\n  call t()\nend subroutine s\n"
        );
    }

    #[test]
    fn test_lines_outside_units_untouched() {
        let text = "! header\ninteger :: stray\nx = 1\n";
        assert_eq!(restructure_output(text), text);
    }

    #[test]
    fn test_contains_in_program() {
        let text = "program p\n  implicit none\n  x = 1\n  integer :: x\ncontains\n  subroutine s()\n    implicit none\n    y = 2\n    integer :: y\n  end subroutine s\nend program p\n";
        let out = restructure_output(text);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[2].trim(), "integer :: x");
        assert_eq!(lines[7].trim(), "integer :: y");
    }
}
