//! c2fortran: a line-oriented translator from a C subset to Fortran 90+.
//!
//! The translation runs in stages:
//!
//! 1. `preprocess` turns directives into comments and named constants
//! 2. `first_pass` extracts function bodies, signatures and file-scope
//!    declarations
//! 3. every body goes through the block-stack translator
//!    (`translate::body_translate`), wrapped as a procedure or as the
//!    program body
//! 4. `block_restructure` moves declarations to the top of their unit
//!
//! Translation never fails: anything that cannot be mapped shows up as a
//! `! ...` diagnostic comment in the output.

// Core modules
pub mod variable;
pub mod function;
pub mod control_flow;
pub mod error_msg;
pub mod type_resolution;
pub mod options;
pub mod fortran_sanity;

// Modularized translator components
pub mod helpers;
pub mod preprocess;
pub mod first_pass;
pub mod expression_translate;
pub mod transpiler_state;
pub mod block_restructure;
pub mod postprocess_output;

// Lowering and translation passes
pub mod lowering;
pub mod translate;


use std::path::Path;

use log::{debug, info};

pub use error_msg::{Diagnostic, ErrorCode, Result, TranslateError};
pub use fortran_sanity::{check_fortran_output, SanityCheckResult};
pub use options::{EmitOptions, TranslatorOptions};

use first_pass::{run_first_pass, FirstPassResult};
use function::{SourceContext, ENTRY_POINT};
use postprocess_output::apply_postprocessing;
use preprocess::remove_preprocessor_directives;
use translate::{translate_procedure, translate_program_body};
use variable::{VariableType, VariableTypes};

/// Header line of every translation
pub const HEADER_COMMENT: &str = "! Translated from C to Fortran";

/// Translates C source text to Fortran
///
/// Variable types seen while translating are kept until the next call to
/// [`Translator::translate`].
pub struct Translator {
    options: TranslatorOptions,
    variable_types: VariableTypes,
}

impl Translator {
    pub fn new(options: TranslatorOptions) -> Self {
        Translator {
            options,
            variable_types: VariableTypes::new(),
        }
    }

    pub fn options(&self) -> &TranslatorOptions {
        &self.options
    }

    /// C type recorded for a variable during the last translation
    pub fn variable_type(&self, name: &str) -> Option<&VariableType> {
        self.variable_types.get(name)
    }

    /// Translate a whole C source file
    pub fn translate(&mut self, source: &str) -> String {
        self.variable_types = VariableTypes::new();
        let preprocessed = remove_preprocessor_directives(source);
        let FirstPassResult {
            registry,
            bodies,
            globals,
            unhandled,
        } = run_first_pass(&preprocessed.source);
        self.variable_types.record(&globals);
        info!(
            "{} functions, {} file-scope declarations, {} constants",
            bodies.len(),
            globals.len(),
            preprocessed.constants.len()
        );

        let ctx = SourceContext::new(registry);
        let opts = &self.options;
        let indent = opts.indent(1);
        let mut out: Vec<String> = Vec::new();

        if opts.emit.header_comment {
            out.push(HEADER_COMMENT.to_string());
        }
        out.extend(preprocessed.header_comments.iter().cloned());
        if !out.is_empty() {
            out.push(String::new());
        }

        let procedures: Vec<_> = bodies.iter().filter(|b| b.name != ENTRY_POINT).collect();
        let entry = bodies.iter().find(|b| b.name == ENTRY_POINT);
        let needs_module = !procedures.is_empty()
            || !globals.is_empty()
            || !preprocessed.constants.is_empty()
            || !unhandled.is_empty();

        // =====================================================================
        // Module with constants, file-scope variables and procedures
        // =====================================================================
        if needs_module {
            out.push(format!("module {}", opts.module_name));
            out.push(format!("{}implicit none", indent));
            for constant in &preprocessed.constants {
                out.push(format!("{}{}", indent, constant.to_fortran()));
            }
            for decl in globals.iter() {
                out.push(format!("{}{}", indent, decl.to_module_fortran()));
            }
            for line in &unhandled {
                out.push(format!("{}{}", indent, Diagnostic::Untranslated(line.clone()).to_comment()));
            }

            if !procedures.is_empty() {
                out.push(String::new());
                out.push("contains".to_string());
            }
            for body in &procedures {
                let Some(sig) = ctx.registry.get(&body.name) else {
                    continue;
                };
                out.push(String::new());
                for comment in &body.leading_comments {
                    out.push(format!("{}! {}", indent, comment));
                }
                debug!("procedure {}", sig.name);
                out.extend(translate_procedure(sig, &body.body, &ctx, opts, 1, &mut self.variable_types));
            }
            out.push(String::new());
            out.push(format!("end module {}", opts.module_name));
            out.push(String::new());
        }

        // =====================================================================
        // Program unit
        // =====================================================================
        out.push(format!("program {}", opts.program_name));
        if needs_module {
            out.push(format!("{}use {}", indent, opts.module_name));
        }
        out.push(format!("{}implicit none", indent));
        match entry {
            Some(main) => {
                let lines = translate_program_body(&main.body, &ctx, opts, 1, &mut self.variable_types);
                if !lines.is_empty() {
                    out.push(String::new());
                    for comment in &main.leading_comments {
                        out.push(format!("{}! {}", indent, comment));
                    }
                    out.extend(lines);
                }
            }
            None => out.push(format!("{}! No main function found", indent)),
        }
        out.push(format!("end program {}", opts.program_name));

        apply_postprocessing(out, &opts.emit)
    }
}

impl Default for Translator {
    fn default() -> Self {
        Translator::new(TranslatorOptions::default())
    }
}

/// Translate C source with default options
pub fn translate_c(source: &str) -> String {
    Translator::default().translate(source)
}

/// Read and translate a C file
pub fn translate_file(input: &Path, options: &TranslatorOptions) -> Result<String> {
    let source = std::fs::read_to_string(input).map_err(|source| TranslateError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    Ok(Translator::new(options.clone()).translate(&source))
}

/// Write translated text to `output`
pub fn write_output(output: &Path, text: &str) -> Result<()> {
    std::fs::write(output, text).map_err(|source| TranslateError::Io {
        path: output.to_path_buf(),
        source,
    })
}
