//! Lowering Module
//!
//! Preparation passes that run before a body is translated: splitting the
//! body into logical lines and looking ahead across them.

// Logical line splitting
pub mod logical_lines_lowering;

// Look-ahead utilities
pub mod lookahead_lowering;

// Re-exports for convenience
pub use logical_lines_lowering::logical_lines;
pub use lookahead_lowering::{check_next_is_else, find_do_while_tail};
