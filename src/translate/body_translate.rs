//! Body translation
//!
//! Walks the logical lines of one function body and emits Fortran
//! statements. Open compound statements live on an explicit
//! [`BlockStack`]; closing a frame (by `}` or by the end of a brace-less
//! single statement) emits the matching terminator and may cascade into the
//! frames below it. Lines produced while translating a line (the body of
//! `if (c) for (...) x++;`) are fed back through a pending-line loop, so
//! nesting depth never turns into recursion.

use std::sync::LazyLock;

use log::{debug, trace, warn};
use regex::Regex;

use crate::control_flow::{extract_parenthesized, parse_for_header, BlockFrame, ForHeader, FrameKind};
use crate::error_msg::Diagnostic;
use crate::expression_translate::rewrite_expression;
use crate::function::{CurrentFunctionContext, SourceContext};
use crate::helpers::indent_str;
use crate::lowering::{check_next_is_else, find_do_while_tail, logical_lines};
use crate::options::TranslatorOptions;
use crate::translate::io_translate::{
    split_scanf_condition, translate_printf, translate_puts, translate_scanf, translate_scanf_args, IO_STATUS,
};
use crate::translate::statement_translate::{
    called_function, classify, split_chained_assignment, translate_compound, translate_increment, LineKind,
};
use crate::transpiler_state::TranspilerState;
use crate::variable::{collect_declarations, parse_declaration, DeclarationSet, VariableTypes};

static ARRAY_SIZEOF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bsizeof\s*\(\s*([A-Za-z_]\w*)\s*\)").unwrap());

/// Result of translating one body
#[derive(Debug, Clone, Default)]
pub struct BodyTranslation {
    pub declarations: DeclarationSet,
    /// Indented declaration lines
    pub declaration_lines: Vec<String>,
    /// Indented statement lines
    pub statements: Vec<String>,
    /// Block-open classifications
    pub opened: usize,
    /// Terminators emitted
    pub terminated: usize,
}

impl BodyTranslation {
    /// Declarations, a separating blank line, then statements
    pub fn lines(&self) -> Vec<String> {
        let mut out = self.declaration_lines.clone();
        if !out.is_empty() && !self.statements.is_empty() {
            out.push(String::new());
        }
        out.extend(self.statements.iter().cloned());
        out
    }

    pub fn is_balanced(&self) -> bool {
        self.opened == self.terminated
    }
}

/// How `close_top` left the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closed {
    /// Frame popped and terminated
    Closed,
    /// Conditional branch ended, frame kept for the coming `else`
    Chained,
    /// Nothing to close
    Unmatched,
}

struct BodyTranslator<'a> {
    ctx: &'a SourceContext,
    func: &'a CurrentFunctionContext,
    options: &'a TranslatorOptions,
    types: &'a VariableTypes,
    lines: Vec<String>,
    base_indent: usize,
    state: TranspilerState,
    out: Vec<String>,
}

/// Translate one function body
///
/// `base_indent` is the indent level of the body inside the emitted unit.
/// Declarations found in the body are recorded in `types`.
pub fn translate_body(
    body: &str,
    func: &CurrentFunctionContext,
    ctx: &SourceContext,
    options: &TranslatorOptions,
    base_indent: usize,
    types: &mut VariableTypes,
) -> BodyTranslation {
    let lines = logical_lines(body);
    let declarations = collect_declarations(&lines);
    types.record(&declarations);
    debug!(
        "translating body of {}: {} logical lines, {} declarations",
        func.name,
        lines.len(),
        declarations.len()
    );

    let mut translator = BodyTranslator {
        ctx,
        func,
        options,
        types,
        lines,
        base_indent,
        state: TranspilerState::new(),
        out: Vec::new(),
    };
    translator.run();

    let indent = options.indent(base_indent);
    let declaration_lines = declarations
        .iter()
        .map(|d| format!("{}{}", indent, d.to_fortran()))
        .collect();

    if !translator.state.is_balanced() {
        warn!(
            "{}: {} blocks opened, {} terminated",
            func.name, translator.state.opened, translator.state.terminated
        );
    }

    BodyTranslation {
        declarations,
        declaration_lines,
        opened: translator.state.opened,
        terminated: translator.state.terminated,
        statements: translator.out,
    }
}

impl<'a> BodyTranslator<'a> {
    fn run(&mut self) {
        while self.state.cursor < self.lines.len() {
            let line = self.lines[self.state.cursor].clone();
            self.state.cursor += 1;

            let mut pending = Some(line);
            while let Some(text) = pending.take() {
                pending = self.step(&text);
            }
        }
        self.flush_open_frames();
    }

    // ========================================================================
    // EMISSION
    // ========================================================================

    fn emit(&mut self, text: &str) {
        let level = self.base_indent + self.state.indent_level;
        self.out
            .push(format!("{}{}", indent_str(level, self.options.indent_width), text));
    }

    fn emit_diagnostic(&mut self, diag: Diagnostic) {
        trace!("{} {}", diag.code().code_str(), diag);
        self.emit(&diag.to_comment());
    }

    fn declare_io_status(&mut self) {
        if !self.state.io_status_declared {
            self.state.io_status_declared = true;
            self.emit(&format!("integer :: {}", IO_STATUS));
        }
    }

    /// `sizeof(array)` → total byte size, for names declared as arrays
    fn lower_sizeof(&self, expr: &str) -> String {
        ARRAY_SIZEOF
            .replace_all(expr, |caps: &regex::Captures| {
                let name = &caps[1];
                if self.types.is_array(name) {
                    format!("(size({}) * storage_size({}) / 8)", name, name)
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned()
    }

    fn rewrite(&self, expr: &str) -> String {
        rewrite_expression(&self.lower_sizeof(expr))
    }

    // ========================================================================
    // LINE DISPATCH
    // ========================================================================

    /// Process one line; returns a line still to be processed
    fn step(&mut self, text: &str) -> Option<String> {
        let kind = classify(text);
        trace!("{:?} <- {}", kind, text);

        if !matches!(kind, LineKind::OpenBrace | LineKind::Comment(_)) {
            if let Some(top) = self.state.frames.top_mut() {
                top.awaiting_body = false;
            }
        }

        // Inside an untranslated block every line stays a comment
        let in_untranslated = self
            .state
            .frames
            .top()
            .map(|f| f.kind == FrameKind::Untranslated)
            .unwrap_or(false);
        if in_untranslated && !matches!(kind, LineKind::CloseBrace | LineKind::Comment(_)) {
            self.emit_diagnostic(Diagnostic::Untranslated(text.trim().to_string()));
            if text.trim_end().ends_with('{') {
                self.push_untranslated();
            }
            return None;
        }

        match kind {
            LineKind::Comment(c) => {
                if c.is_empty() {
                    self.emit("!");
                } else {
                    self.emit(&format!("! {}", c));
                }
                None
            }
            LineKind::CloseThenElse(rest) => {
                self.close_top(true);
                Some(rest)
            }
            LineKind::If { cond, rest } => {
                let header = format!("if ({}) then", self.rewrite(&cond));
                self.open_construct(FrameKind::Conditional, &header, Vec::new(), &rest)
            }
            LineKind::ElseIf { cond, rest } => self.continue_chain(text, Some(&cond), &rest),
            LineKind::Else { rest } => self.continue_chain(text, None, &rest),
            LineKind::For { header, rest } => match parse_for_header(&self.lower_sizeof(&header), text) {
                ForHeader::Counted(range) => {
                    self.open_construct(FrameKind::CountedLoop, &range.do_header(), Vec::new(), &rest)
                }
                ForHeader::Endless => self.open_construct(FrameKind::ConditionLoop, "do", Vec::new(), &rest),
                ForHeader::Malformed(diag) => self.malformed(diag, &rest),
            },
            LineKind::While { cond, rest } => self.open_while(&cond, &rest),
            LineKind::Do { rest } => self.open_construct(FrameKind::PostConditionLoop, "do", Vec::new(), &rest),
            LineKind::MalformedHeader { braced } => {
                let rest = if braced { "{" } else { "" };
                self.malformed(Diagnostic::MalformedHeader(text.trim().to_string()), rest)
            }
            LineKind::OpenBrace => {
                self.open_brace();
                None
            }
            LineKind::CloseBrace => {
                if self.close_top(false) == Closed::Closed {
                    self.complete_statement();
                }
                None
            }
            LineKind::Unrecognized if text.trim_end().ends_with('{') => {
                self.emit_diagnostic(Diagnostic::Untranslated(text.trim().to_string()));
                self.push_untranslated();
                None
            }
            kind => {
                self.simple_statement(kind, text);
                self.complete_statement();
                None
            }
        }
    }

    /// Emit a statement that opens no block
    fn simple_statement(&mut self, kind: LineKind, text: &str) {
        let text = text.trim();
        match kind {
            LineKind::Comment(c) => self.emit(&format!("! {}", c)),
            LineKind::Declaration => {
                for decl in parse_declaration(text).unwrap_or_default() {
                    if let Some(assign) = decl.initial_assignment(|e| self.rewrite(e)) {
                        self.emit(&assign);
                    }
                }
            }
            LineKind::UnparsedDeclaration => {
                self.emit_diagnostic(Diagnostic::DeclarationUnparsed(text.to_string()));
            }
            LineKind::Return(value) => self.translate_return(value.as_deref()),
            LineKind::Break | LineKind::Continue if !self.state.frames.in_loop() => {
                self.emit_diagnostic(Diagnostic::Untranslated(text.to_string()));
            }
            LineKind::Break => self.emit("exit"),
            LineKind::Continue => self.emit("cycle"),
            LineKind::Print => {
                let stmt = text.trim_end_matches(';');
                let result = if stmt.starts_with("puts") {
                    translate_puts(stmt, |e| self.rewrite(e))
                } else {
                    translate_printf(stmt, |e| self.rewrite(e))
                };
                match result {
                    Ok(lines) => lines.iter().for_each(|l| self.emit(l)),
                    Err(diag) => self.emit_diagnostic(diag),
                }
            }
            LineKind::Read => {
                let result = translate_scanf(text.trim_end_matches(';'), |e| self.rewrite(e));
                match result {
                    Ok(read) => {
                        self.declare_io_status();
                        self.emit(&read);
                    }
                    Err(diag) => self.emit_diagnostic(diag),
                }
            }
            LineKind::Increment { target, delta } => {
                let line = translate_increment(&self.rewrite(&target), delta);
                self.emit(&line);
            }
            LineKind::CompoundAssign { target, op, value } => {
                let line = translate_compound(&self.rewrite(&target), op, &self.rewrite(&value));
                self.emit(&line);
            }
            LineKind::Assignment { target, value } => {
                let (targets, value) = split_chained_assignment(&target, &value);
                let mut source = self.rewrite(&value);
                for t in targets.iter().rev() {
                    let t = self.rewrite(t);
                    self.emit(&format!("{} = {}", t, source));
                    source = t;
                }
            }
            LineKind::Statement(stmt) => self.translate_call(&stmt),
            LineKind::Empty => {}
            _ => self.emit_diagnostic(Diagnostic::Untranslated(text.to_string())),
        }
    }

    fn translate_return(&mut self, value: Option<&str>) {
        if self.func.is_entry {
            match value {
                Some(v) => self.emit(&format!("! return {} (ignored in program)", v)),
                None => self.emit("! return (ignored in program)"),
            }
            return;
        }
        match (&self.func.result_variable, value) {
            (Some(result), Some(v)) => {
                let line = format!("{} = {}", result, self.rewrite(v));
                self.emit(&line);
                if self.options.explicit_return {
                    self.emit("return");
                }
            }
            _ => self.emit("return"),
        }
    }

    fn translate_call(&mut self, stmt: &str) {
        match called_function(stmt) {
            Some(name) if self.ctx.registry.returns_value(name) => {
                self.emit_diagnostic(Diagnostic::DiscardedResult(stmt.to_string()));
            }
            Some("exit") => self.emit("stop"),
            Some(_) => {
                let call = format!("call {}", self.rewrite(stmt));
                self.emit(&call);
            }
            None => self.emit_diagnostic(Diagnostic::Untranslated(format!("{};", stmt))),
        }
    }

    // ========================================================================
    // BLOCK OPENING
    // ========================================================================

    /// Emit a header and open its frame according to what follows it
    ///
    /// `rest` is the header line after the condition: `{`, empty (body on the
    /// next line), a simple statement, or another header.
    fn open_construct(&mut self, kind: FrameKind, header: &str, prologue: Vec<String>, rest: &str) -> Option<String> {
        self.emit(header);
        self.state.opened += 1;
        let saved = self.state.indent_level;
        self.state.indent_level += 1;
        for line in &prologue {
            self.emit(line);
        }

        match rest.trim() {
            "{" => {
                self.state.frames.push(BlockFrame::braced(kind, saved));
                None
            }
            "" => {
                self.state.frames.push(BlockFrame::braceless(kind, saved));
                None
            }
            stmt => {
                let stmt_kind = classify(stmt);
                if stmt_kind.is_header() || kind == FrameKind::PostConditionLoop {
                    let mut frame = BlockFrame::braceless(kind, saved);
                    frame.awaiting_body = false;
                    self.state.frames.push(frame);
                    return Some(stmt.to_string());
                }

                self.simple_statement(stmt_kind, stmt);
                self.state.indent_level = saved;
                if kind == FrameKind::Conditional && check_next_is_else(&self.lines, self.state.current_line()) {
                    self.state.frames.push(BlockFrame::chained(saved));
                } else {
                    self.emit_terminator(kind);
                    self.complete_statement();
                }
                None
            }
        }
    }

    fn open_while(&mut self, cond: &str, rest: &str) -> Option<String> {
        if matches!(cond.trim(), "1" | "true") {
            return self.open_construct(FrameKind::ConditionLoop, "do", Vec::new(), rest);
        }
        let Some(scanf) = split_scanf_condition(cond) else {
            let header = format!("do while ({})", self.rewrite(cond));
            return self.open_construct(FrameKind::ConditionLoop, &header, Vec::new(), rest);
        };

        match translate_scanf_args(&scanf.scanf_args, |e| self.rewrite(e)) {
            Ok(read) => {
                self.declare_io_status();
                let prologue = vec![read, format!("if (.not. ({})) exit", self.rewrite(&scanf.condition))];
                self.open_construct(FrameKind::ConditionLoop, "do", prologue, rest)
            }
            Err(diag) => {
                self.emit_diagnostic(diag);
                let header = format!("do while ({})", self.rewrite(cond));
                self.open_construct(FrameKind::ConditionLoop, &header, Vec::new(), rest)
            }
        }
    }

    /// `else` / `else if` continuing an open conditional
    fn continue_chain(&mut self, text: &str, cond: Option<&str>, rest: &str) -> Option<String> {
        let chained = self
            .state
            .frames
            .top()
            .filter(|f| f.kind == FrameKind::Conditional && f.awaiting_chain)
            .map(|f| f.saved_indent_level);
        let Some(saved) = chained else {
            self.emit_diagnostic(Diagnostic::Untranslated(text.trim().to_string()));
            return match rest.trim() {
                "{" => {
                    self.push_untranslated();
                    None
                }
                "" => None,
                stmt => Some(stmt.to_string()),
            };
        };

        self.state.indent_level = saved;
        match cond {
            Some(c) => {
                let header = format!("else if ({}) then", self.rewrite(c));
                self.emit(&header);
            }
            None => self.emit("else"),
        }
        self.state.indent_level = saved + 1;

        let stmt = rest.trim();
        let stmt_kind = classify(stmt);
        let simple = !stmt.is_empty() && stmt != "{" && !stmt_kind.is_header();
        if let Some(top) = self.state.frames.top_mut() {
            top.awaiting_chain = false;
            top.closes_after_statement = stmt != "{";
            top.awaiting_body = stmt.is_empty();
        }

        match stmt {
            "{" | "" => None,
            _ if !simple => Some(stmt.to_string()),
            _ => {
                self.simple_statement(stmt_kind, stmt);
                if self.close_top(false) == Closed::Closed {
                    self.complete_statement();
                }
                None
            }
        }
    }

    /// Malformed header: diagnostic, plus a frame that swallows a braced body
    fn malformed(&mut self, diag: Diagnostic, rest: &str) -> Option<String> {
        self.emit_diagnostic(diag);
        match rest.trim() {
            "{" => {
                self.push_untranslated();
                None
            }
            "" => None,
            stmt => Some(stmt.to_string()),
        }
    }

    fn push_untranslated(&mut self) {
        let saved = self.state.indent_level;
        self.state.frames.push(BlockFrame::braced(FrameKind::Untranslated, saved));
        self.state.indent_level += 1;
    }

    /// A `{` on its own line: body of the pending header, or a bare scope
    fn open_brace(&mut self) {
        if let Some(top) = self.state.frames.top_mut() {
            if top.awaiting_body {
                top.awaiting_body = false;
                top.closes_after_statement = false;
                return;
            }
        }
        self.emit("block");
        self.state.opened += 1;
        let saved = self.state.indent_level;
        self.state.frames.push(BlockFrame::braced(FrameKind::Scope, saved));
        self.state.indent_level += 1;
    }

    // ========================================================================
    // BLOCK CLOSING
    // ========================================================================

    fn emit_terminator(&mut self, kind: FrameKind) {
        if let Some(term) = kind.terminator() {
            self.emit(term);
            self.state.terminated += 1;
        }
    }

    /// Close the innermost frame
    ///
    /// A conditional followed by `else` stays open as a chained frame;
    /// `chain` forces that for `} else ...` lines.
    fn close_top(&mut self, chain: bool) -> Closed {
        let idx = self.state.current_line();
        let Some(frame) = self.state.frames.top().cloned() else {
            warn!("{}: unmatched closing brace at logical line {}", self.func.name, idx + 1);
            self.emit_diagnostic(Diagnostic::UnmatchedBrace);
            return Closed::Unmatched;
        };

        match frame.kind {
            FrameKind::Conditional if chain || check_next_is_else(&self.lines, idx) => {
                if let Some(top) = self.state.frames.top_mut() {
                    top.awaiting_chain = true;
                    top.awaiting_body = false;
                    top.closes_after_statement = false;
                }
                self.state.indent_level = frame.saved_indent_level;
                Closed::Chained
            }
            FrameKind::PostConditionLoop => {
                self.state.frames.pop();
                if let Some(tail) = find_do_while_tail(&self.lines, idx) {
                    self.state.indent_level = frame.saved_indent_level + 1;
                    if let Some((cond, _)) = extract_parenthesized(&self.lines[tail], "while") {
                        let exit = format!("if (.not. ({})) exit", self.rewrite(&cond));
                        self.emit(&exit);
                    }
                    self.state.cursor = tail + 1;
                }
                self.state.indent_level = frame.saved_indent_level;
                self.emit_terminator(frame.kind);
                Closed::Closed
            }
            FrameKind::Untranslated => {
                self.state.frames.pop();
                self.state.indent_level = frame.saved_indent_level;
                self.emit_diagnostic(Diagnostic::EndOfUntranslatedBlock);
                Closed::Closed
            }
            kind => {
                self.state.frames.pop();
                self.state.indent_level = frame.saved_indent_level;
                self.emit_terminator(kind);
                Closed::Closed
            }
        }
    }

    /// A statement finished: close every brace-less frame it completes
    fn complete_statement(&mut self) {
        loop {
            let closable = self
                .state
                .frames
                .top()
                .map(|f| f.closes_after_statement && !f.awaiting_body && !f.awaiting_chain)
                .unwrap_or(false);
            if !closable || self.close_top(false) != Closed::Closed {
                break;
            }
        }
    }

    /// End of body: close whatever is still open, innermost first
    fn flush_open_frames(&mut self) {
        while let Some(frame) = self.state.frames.pop() {
            let unclosed = !frame.awaiting_chain;
            self.state.indent_level = frame.saved_indent_level + 1;
            if unclosed {
                warn!("{}: {:?} block still open at end of body", self.func.name, frame.kind);
                self.emit_diagnostic(Diagnostic::UnclosedBlock);
            }
            self.state.indent_level = frame.saved_indent_level;
            match frame.kind {
                FrameKind::Untranslated => self.emit_diagnostic(Diagnostic::EndOfUntranslatedBlock),
                kind => self.emit_terminator(kind),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{FunctionRegistry, FunctionSignature};

    fn translate(body: &str) -> BodyTranslation {
        translate_with(body, &CurrentFunctionContext::entry(), FunctionRegistry::new())
    }

    fn translate_with(body: &str, func: &CurrentFunctionContext, registry: FunctionRegistry) -> BodyTranslation {
        let ctx = SourceContext::new(registry);
        let options = TranslatorOptions::default();
        let mut types = VariableTypes::new();
        translate_body(body, func, &ctx, &options, 0, &mut types)
    }

    fn statements(body: &str) -> Vec<String> {
        translate(body).statements.iter().map(|s| s.trim().to_string()).collect()
    }

    #[test]
    fn test_counted_loop() {
        let out = statements("int i;\nfor (i = 0; i < n; i++) {\n  s += i;\n}\n");
        assert_eq!(out, vec!["do i = 0, n - 1", "s = s + i", "end do"]);
    }

    #[test]
    fn test_single_statement_if() {
        let out = statements("if (x > 0) y = 1;\nz = 2;\n");
        assert_eq!(out, vec!["if (x > 0) then", "y = 1", "end if", "z = 2"]);
    }

    #[test]
    fn test_else_chain() {
        let out = statements("if (a) {\n x = 1;\n} else if (b) {\n x = 2;\n} else {\n x = 3;\n}\n");
        assert_eq!(
            out,
            vec!["if (a) then", "x = 1", "else if (b) then", "x = 2", "else", "x = 3", "end if"]
        );
    }

    #[test]
    fn test_braceless_else() {
        let out = statements("if (a)\n  x = 1;\nelse\n  x = 2;\ny = 3;\n");
        assert_eq!(out, vec!["if (a) then", "x = 1", "else", "x = 2", "end if", "y = 3"]);
    }

    #[test]
    fn test_nested_braceless() {
        let out = statements("if (a) for (i = 1; i <= 3; i++) s += i;\nt = 0;\n");
        assert_eq!(out, vec!["if (a) then", "do i = 1, 3", "s = s + i", "end do", "end if", "t = 0"]);
    }

    #[test]
    fn test_do_while() {
        let out = statements("do {\n  n--;\n} while (n > 0);\nx = 1;\n");
        assert_eq!(out, vec!["do", "n = n - 1", "if (.not. (n > 0)) exit", "end do", "x = 1"]);
    }

    #[test]
    fn test_scanf_loop() {
        let out = statements("while (scanf(\"%d\", &n) == 1) {\n  s += n;\n}\n");
        assert_eq!(
            out,
            vec![
                "integer :: io_status",
                "do",
                "read(*, *, iostat=io_status) n",
                "if (.not. (io_status == 0)) exit",
                "s = s + n",
                "end do",
            ]
        );
    }

    #[test]
    fn test_unbalanced_body_is_closed() {
        let t = translate("while (x) {\n  x--;\n");
        assert!(t.is_balanced());
        let out: Vec<&str> = t.statements.iter().map(|s| s.trim()).collect();
        assert!(out.contains(&"! Warning: block closed at end of body"));
        assert_eq!(out.last(), Some(&"end do"));
    }

    #[test]
    fn test_stray_close_brace() {
        let t = translate("x = 1;\n}\n");
        assert!(t.is_balanced());
        assert!(t.statements.iter().any(|s| s.contains("unmatched closing brace")));
    }

    #[test]
    fn test_malformed_header_block() {
        let t = translate("if x > 0 {\n  y = 1;\n}\nz = 2;\n");
        assert!(t.is_balanced());
        let out: Vec<&str> = t.statements.iter().map(|s| s.trim()).collect();
        assert_eq!(out[0], "! Malformed header: if x > 0 {");
        assert!(out.contains(&"! End of untranslated block"));
        assert_eq!(out.last(), Some(&"z = 2"));
    }

    #[test]
    fn test_return_in_procedure() {
        let sig = FunctionSignature::parse("int", "f", "int x");
        let func = CurrentFunctionContext::for_signature(&sig);
        let t = translate_with("if (x > 0) return x;\nreturn 0;\n", &func, FunctionRegistry::new());
        let out: Vec<&str> = t.statements.iter().map(|s| s.trim()).collect();
        assert_eq!(out, vec!["if (x > 0) then", "f_result = x", "end if", "f_result = 0"]);
    }

    #[test]
    fn test_return_in_program_is_comment() {
        assert_eq!(statements("return 0;\n"), vec!["! return 0 (ignored in program)"]);
    }

    #[test]
    fn test_discarded_result() {
        let mut registry = FunctionRegistry::new();
        registry.register(FunctionSignature::parse("int", "f", "int x"));
        registry.register(FunctionSignature::parse("void", "g", "int x"));
        let t = translate_with("f(1);\ng(2);\n", &CurrentFunctionContext::entry(), registry);
        let out: Vec<&str> = t.statements.iter().map(|s| s.trim()).collect();
        assert_eq!(out, vec!["! Result discarded: f(1)", "call g(2)"]);
    }

    #[test]
    fn test_declarations_and_initializers() {
        let t = translate("int n = 5;\ndouble x;\nx = n * 2.0;\n");
        assert_eq!(t.declaration_lines, vec!["integer :: n", "double precision :: x"]);
        let out: Vec<&str> = t.statements.iter().map(|s| s.trim()).collect();
        assert_eq!(out, vec!["n = 5", "x = n * 2.0"]);
    }

    #[test]
    fn test_array_sizeof() {
        let t = translate("int a[] = {1, 2, 3};\nint n = sizeof(a) / sizeof(a[0]);\n");
        assert_eq!(
            t.statements[0].trim(),
            "n = (size(a) * storage_size(a) / 8) / (storage_size(a(1)) / 8)"
        );
    }

    #[test]
    fn test_break_and_continue() {
        let out = statements("while (1) {\n  if (x) break;\n  continue;\n}\n");
        assert_eq!(
            out,
            vec!["do", "if (x) then", "exit", "end if", "cycle", "end do"]
        );
    }

    #[test]
    fn test_loop_control_outside_loop() {
        let t = translate("break;
if (x) continue;
continue;
y = 1;
");
        assert!(t.is_balanced());
        let out: Vec<&str> = t.statements.iter().map(|s| s.trim()).collect();
        assert_eq!(
            out,
            vec![
                "! Untranslated: break;",
                "if (x) then",
                "! Untranslated: continue;",
                "end if",
                "! Untranslated: continue;",
                "y = 1",
            ]
        );
        assert!(!out.contains(&"cycle"));
    }

    #[test]
    fn test_comma_for_init_is_diagnosed() {
        let t = translate("for (i = 0, j = n; i < j; i++) {
  s += i;
}
t = 0;
");
        assert!(t.is_balanced());
        let out: Vec<&str> = t.statements.iter().map(|s| s.trim()).collect();
        assert_eq!(
            out,
            vec![
                "! Failed to parse for loop init: i = 0, j = n",
                "! Untranslated: s += i;",
                "! End of untranslated block",
                "t = 0",
            ]
        );
    }

    #[test]
    fn test_integer_limit_literals() {
        let out = statements("for (i = 0; i < -9223372036854775808; i++) {
}
x = a[9223372036854775807];
");
        assert_eq!(
            out,
            vec!["do i = 0, -9223372036854775808 - 1", "end do", "x = a(9223372036854775807 + 1)"]
        );
    }

    #[test]
    fn test_unparsed_declaration_is_diagnosed() {
        let out = statements("int helper(int);
int (*fp)(int);
x = 1;
");
        assert_eq!(
            out,
            vec![
                "! Failed to parse declaration: int helper(int);",
                "! Failed to parse declaration: int (*fp)(int);",
                "x = 1",
            ]
        );
    }
}
