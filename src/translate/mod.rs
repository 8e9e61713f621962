//! Translation Module
//!
//! Contains modules for translating C constructs to Fortran.
//! Each module handles a specific kind of construct.

// Statement translations
pub mod statement_translate;
pub mod io_translate;

// Body and procedure translations
pub mod body_translate;
pub mod procedure_translate;

// Re-exports for convenience
pub use statement_translate::{classify, LineKind};
pub use io_translate::{split_scanf_condition, translate_printf, translate_scanf, ScanfCondition};
pub use body_translate::{translate_body, BodyTranslation};
pub use procedure_translate::{translate_procedure, translate_program_body};
