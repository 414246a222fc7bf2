/*
 * eval_context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Engine configuration and diagnostics.
//!
//! [`EngineOptions`] configures a [`crate::Vm`]. Non-fatal problems found
//! while a program runs are reported as [`Warning`]s to a [`WarningSink`];
//! [`DiagnosticCollector`] is the sink that simply keeps them.

use crate::program::SourcePosition;
use serde::Deserialize;
use std::fmt;

/// Default limit for nested user-function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

/// Options that change how programs are executed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Assigning to an undeclared variable is an error instead of a no-op.
    pub strict_assignment: bool,

    /// Maximum nesting of user-defined function calls.
    pub max_call_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            strict_assignment: false,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable strict assignment.
    pub fn with_strict_assignment(mut self, strict: bool) -> Self {
        self.strict_assignment = strict;
        self
    }

    /// Set the maximum user-function nesting depth.
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}

/// What produced a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Unbalanced braces found by a text algorithm.
    Braces,
    /// An operand had an unexpected kind or value but the operation continued.
    Operand,
    /// Output of `stack$` or `top$`.
    StackDump,
    /// A message from the style program itself (`warning$`).
    Style,
}

/// A non-fatal diagnostic raised during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
    pub position: Option<SourcePosition>,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
        }
    }

    pub fn with_position(mut self, position: Option<SourcePosition>) -> Self {
        self.position = position;
        self
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(position) = self.position {
            write!(f, " (line {}, column {})", position.line, position.column)?;
        }
        Ok(())
    }
}

/// Receiver for warnings raised during a run.
pub trait WarningSink {
    fn warn(&mut self, warning: Warning);
}

/// Sink that keeps every warning in order.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    warnings: Vec<Warning>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Messages only, in the order they were raised.
    pub fn messages(&self) -> Vec<&str> {
        self.warnings.iter().map(|w| w.message.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl WarningSink for DiagnosticCollector {
    fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults_and_builders() {
        let options = EngineOptions::new();
        assert!(!options.strict_assignment);
        assert_eq!(options.max_call_depth, 1000);

        let options = options.with_strict_assignment(true).with_max_call_depth(8);
        assert!(options.strict_assignment);
        assert_eq!(options.max_call_depth, 8);
    }

    #[test]
    fn test_options_from_partial_json() {
        let options: EngineOptions = serde_json::from_str(r#"{ "strict_assignment": true }"#).unwrap();
        assert!(options.strict_assignment);
        assert_eq!(options.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
    }

    #[test]
    fn test_collector_keeps_order() {
        let mut collector = DiagnosticCollector::new();
        collector.warn(Warning::new(WarningKind::Style, "first"));
        collector.warn(
            Warning::new(WarningKind::Braces, "second")
                .with_position(Some(SourcePosition { line: 3, column: 1 })),
        );
        assert_eq!(collector.messages(), vec!["first", "second"]);
        assert_eq!(
            collector.warnings()[1].to_string(),
            "second (line 3, column 1)"
        );
    }
}
