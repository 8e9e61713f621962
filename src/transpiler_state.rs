//! Transpiler State Management
//!
//! Contains the `TranspilerState` struct which holds all mutable state
//! while one function body is translated.

use crate::control_flow::BlockStack;

/// State of one body translation
///
/// Created per body and dropped once the body is emitted.
pub struct TranspilerState {
    /// Current indent, relative to the body's base indent
    pub indent_level: usize,
    /// Open compound statements
    pub frames: BlockStack,
    /// Index of the next logical line to process
    pub cursor: usize,
    /// `integer :: io_status` already emitted
    pub io_status_declared: bool,
    /// Block-open classifications seen
    pub opened: usize,
    /// Terminators emitted
    pub terminated: usize,
}

impl TranspilerState {
    /// Create a new TranspilerState with default values
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            frames: BlockStack::new(),
            cursor: 0,
            io_status_declared: false,
            opened: 0,
            terminated: 0,
        }
    }

    /// Index of the line currently being processed
    pub fn current_line(&self) -> usize {
        self.cursor.saturating_sub(1)
    }

    pub fn is_balanced(&self) -> bool {
        self.opened == self.terminated
    }
}

impl Default for TranspilerState {
    fn default() -> Self {
        Self::new()
    }
}
