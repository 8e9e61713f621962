//! Procedure wrapping
//!
//! - non-void functions → `function f(args) result(f_result)`
//! - void functions → `subroutine f(args)`
//! - `main` → statements of the `program` unit
//!
//! A procedure that calls itself gets the `recursive` prefix.

use log::debug;
use regex::Regex;

use crate::function::{CurrentFunctionContext, FunctionSignature, SourceContext};
use crate::options::TranslatorOptions;
use crate::translate::body_translate::{translate_body, BodyTranslation};
use crate::type_resolution::map_type;
use crate::variable::VariableTypes;

/// Does the body call the procedure itself?
pub fn is_recursive(name: &str, body: &str) -> bool {
    Regex::new(&format!(r"\b{}\s*\(", regex::escape(name)))
        .map(|re| re.is_match(body))
        .unwrap_or(false)
}

/// Does the body write to the scalar `name`?
pub fn is_assigned(name: &str, body: &str) -> bool {
    let name = regex::escape(name);
    let pattern = format!(
        r"\b{n}\s*(?:=[^=]|\+\+|--|[-+*/%]=)|(?:\+\+|--)\s*{n}\b",
        n = name
    );
    Regex::new(&pattern).map(|re| re.is_match(body)).unwrap_or(false)
}

/// Translate a non-entry function into a complete procedure unit
pub fn translate_procedure(
    sig: &FunctionSignature,
    body: &str,
    ctx: &SourceContext,
    options: &TranslatorOptions,
    base_indent: usize,
    types: &mut VariableTypes,
) -> Vec<String> {
    let head = options.indent(base_indent);
    let inner = options.indent(base_indent + 1);
    let params = sig.parameter_names().join(", ");
    let prefix = if is_recursive(&sig.name, body) { "recursive " } else { "" };
    let (unit, header) = if sig.is_void() {
        ("subroutine", format!("{}subroutine {}({})", prefix, sig.name, params))
    } else {
        (
            "function",
            format!("{}function {}({}) result({})", prefix, sig.name, params, sig.result_variable()),
        )
    };
    debug!("translating {} {}", unit, sig.name);

    let mut lines = vec![format!("{}{}", head, header), format!("{}implicit none", inner)];
    for param in &sig.parameters {
        let assigned = is_assigned(&param.name, body);
        lines.push(format!("{}{}", inner, param.to_fortran(assigned)));
    }
    if !sig.is_void() {
        lines.push(format!("{}{} :: {}", inner, map_type(&sig.return_type), sig.result_variable()));
    }

    let func = CurrentFunctionContext::for_signature(sig);
    let translated = translate_body(body, &func, ctx, options, base_indent + 1, types);
    lines.extend(body_lines(&translated, !sig.parameters.is_empty() || !sig.is_void()));

    lines.push(format!("{}end {} {}", head, unit, sig.name));
    lines
}

/// Translate the entry body into program statements
pub fn translate_program_body(
    body: &str,
    ctx: &SourceContext,
    options: &TranslatorOptions,
    base_indent: usize,
    types: &mut VariableTypes,
) -> Vec<String> {
    let translated = translate_body(body, &CurrentFunctionContext::entry(), ctx, options, base_indent, types);
    body_lines(&translated, false)
}

fn body_lines(translated: &BodyTranslation, has_header_declarations: bool) -> Vec<String> {
    let mut out = Vec::new();
    if has_header_declarations && translated.declaration_lines.is_empty() && !translated.statements.is_empty() {
        out.push(String::new());
    }
    out.extend(translated.lines());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionRegistry;

    fn procedure(ret: &str, name: &str, params: &str, body: &str) -> Vec<String> {
        let sig = FunctionSignature::parse(ret, name, params);
        let mut registry = FunctionRegistry::new();
        registry.register(sig.clone());
        let ctx = SourceContext::new(registry);
        let mut types = VariableTypes::new();
        translate_procedure(&sig, body, &ctx, &TranslatorOptions::default(), 0, &mut types)
    }

    #[test]
    fn test_function_wrapper() {
        let out = procedure("int", "square", "int x", "\n  return x * x;\n");
        assert_eq!(
            out,
            vec![
                "function square(x) result(square_result)",
                "  implicit none",
                "  integer, intent(in) :: x",
                "  integer :: square_result",
                "",
                "  square_result = x * x",
                "end function square",
            ]
        );
    }

    #[test]
    fn test_recursive_function() {
        let out = procedure("long", "fact", "int n", "if (n <= 1) return 1;\nreturn n * fact(n - 1);\n");
        assert_eq!(out[0], "recursive function fact(n) result(fact_result)");
        assert!(out.contains(&"  integer(kind=8) :: fact_result".to_string()));
    }

    #[test]
    fn test_subroutine_with_assigned_param() {
        let out = procedure("void", "countdown", "int n", "while (n > 0) n--;\n");
        assert_eq!(out[0], "subroutine countdown(n)");
        assert!(out.contains(&"  integer, value :: n".to_string()));
        assert_eq!(out.last().map(String::as_str), Some("end subroutine countdown"));
    }

    #[test]
    fn test_empty_non_void_body() {
        let out = procedure("int", "nothing", "", "");
        assert_eq!(
            out,
            vec![
                "function nothing() result(nothing_result)",
                "  implicit none",
                "  integer :: nothing_result",
                "end function nothing",
            ]
        );
    }

    #[test]
    fn test_assignment_detection() {
        assert!(is_assigned("n", "n = n - 1;"));
        assert!(is_assigned("n", "n--;"));
        assert!(is_assigned("n", "--n;"));
        assert!(is_assigned("n", "n *= 2;"));
        assert!(!is_assigned("n", "if (n == 0) return;"));
        assert!(!is_assigned("n", "x = n <= 5;"));
    }
}
