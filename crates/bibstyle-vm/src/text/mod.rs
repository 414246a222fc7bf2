/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Brace-aware text algorithms used by the string built-ins.
//!
//! All algorithms scan left to right tracking brace depth. A `{\` that
//! opens depth 1 starts a *special character* (an accented or foreign
//! letter such as `{\'e}` or `{\oe}`), which several algorithms treat as a
//! single unit. The functions here are pure: brace problems are reported
//! back as [`BraceWarning`]s instead of being logged.

pub mod case;
pub mod prefix;
pub mod purify;
pub mod width;

pub use case::{CaseFormat, change_case};
pub use prefix::{text_length, text_prefix};
pub use purify::purify;
pub use width::{char_width, width};

use std::fmt;

/// Control sequences that name a foreign letter or ligature.
const SPECIAL_CHARS: [&str; 13] = [
    "oe", "OE", "ae", "AE", "ss", "AA", "aa", "i", "j", "o", "O", "l", "L",
];

/// Whether a whole control sequence is one of the recognized special characters.
pub(crate) fn is_special_char(control_sequence: &str) -> bool {
    SPECIAL_CHARS.contains(&control_sequence)
}

/// A non-fatal brace problem found while scanning a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BraceWarning {
    /// A `}` appeared at depth zero.
    UnmatchedClose { text: String },
    /// The string ended inside a brace group.
    Unclosed { text: String },
}

impl fmt::Display for BraceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BraceWarning::UnmatchedClose { text } => {
                write!(f, "Too many closing braces in string \"{}\"", text)
            }
            BraceWarning::Unclosed { text } => {
                write!(f, "Not enough closing braces in string \"{}\"", text)
            }
        }
    }
}

/// Result of a text algorithm plus the brace warnings it raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed<T> {
    pub value: T,
    pub warnings: Vec<BraceWarning>,
}

impl<T> Transformed<T> {
    pub(crate) fn new(value: T, warnings: Vec<BraceWarning>) -> Self {
        Self { value, warnings }
    }
}

/// Shared brace bookkeeping for the scanners.
#[derive(Debug, Default)]
pub(crate) struct BraceDepth {
    pub depth: usize,
    warnings: Vec<BraceWarning>,
}

impl BraceDepth {
    pub fn open(&mut self) {
        self.depth += 1;
    }

    /// Close a group; closing at depth zero is reported, not fatal.
    pub fn close(&mut self, text: &str) {
        if self.depth == 0 {
            self.warnings.push(BraceWarning::UnmatchedClose {
                text: text.to_string(),
            });
        } else {
            self.depth -= 1;
        }
    }

    pub fn finish(mut self, text: &str) -> Vec<BraceWarning> {
        if self.depth > 0 {
            self.warnings.push(BraceWarning::Unclosed {
                text: text.to_string(),
            });
        }
        self.warnings
    }

    /// The warnings so far, without checking for unclosed groups.
    pub fn into_warnings(self) -> Vec<BraceWarning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_char_names_are_exact() {
        assert!(is_special_char("oe"));
        assert!(is_special_char("AA"));
        assert!(!is_special_char("oex"));
        assert!(!is_special_char("LaTeX"));
        assert!(!is_special_char(""));
    }

    #[test]
    fn test_brace_depth_warnings() {
        let mut braces = BraceDepth::default();
        braces.close("a}");
        braces.open();
        let warnings = braces.finish("a}{");
        assert_eq!(warnings.len(), 2);
        assert_eq!(
            warnings[0].to_string(),
            "Too many closing braces in string \"a}\""
        );
    }
}
