//! Output post-processing pipeline
//!
//! This module contains the final steps applied to the emitted lines
//! before they are returned as text.

use crate::block_restructure::restructure_lines;
use crate::options::EmitOptions;

/// Apply all post-processing transformations to the output lines
pub fn apply_postprocessing(output_lines: Vec<String>, emit: &EmitOptions) -> String {
    // =========================================================================
    // Declarations emitted mid-body move up to their unit's `implicit none`
    // =========================================================================
    let restructured = restructure_lines(output_lines);

    let trimmed = restructured.into_iter().map(|line| line.trim_end().to_string());

    let kept: Vec<String> = if emit.keep_blank_lines {
        let mut out: Vec<String> = Vec::new();
        // Collapse runs of blank lines
        for line in trimmed {
            if line.is_empty() && out.last().map(|l| l.is_empty()).unwrap_or(true) {
                continue;
            }
            out.push(line);
        }
        out
    } else {
        trimmed.filter(|line| !line.is_empty()).collect()
    };

    let mut text = kept.join("\n");
    text.push('\n');
    text
}
