/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for style program execution.
//!
//! Every error aborts the current run. Errors raised by a built-in do not
//! know where in the program they happened; the evaluator attaches the
//! position of the token it was evaluating via [`BstError::at`].

use crate::program::SourcePosition;
use thiserror::Error;

/// Errors that abort a style program run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BstError {
    /// An operation needed more operands than the stack held.
    #[error("Not enough operands on stack for operation {operation}{}", fmt_position(.position))]
    StackUnderflow {
        operation: String,
        position: Option<SourcePosition>,
    },

    /// A popped value had the wrong kind for the operation.
    #[error("{operation} expects {expected} but found {found}{}", fmt_position(.position))]
    TypeMismatch {
        operation: String,
        expected: String,
        found: String,
        position: Option<SourcePosition>,
    },

    /// No table in the scope chain declares the name.
    #[error("No matching identifier found: {name}{}", fmt_position(.position))]
    UnresolvedIdentifier {
        name: String,
        position: Option<SourcePosition>,
    },

    /// An index operand pointed outside its collection.
    #[error("{operation}: index {index} is out of bounds (1..={len}){}", fmt_position(.position))]
    IndexOutOfBounds {
        operation: String,
        index: i32,
        len: usize,
        position: Option<SourcePosition>,
    },

    /// User-defined function nesting exceeded the configured limit.
    #[error("Recursion limit of {limit} exceeded while calling {name}{}", fmt_position(.position))]
    RecursionLimitExceeded {
        name: String,
        limit: usize,
        position: Option<SourcePosition>,
    },

    /// A built-in that needs the current record was used outside ITERATE/REVERSE.
    #[error("{operation} can only be called from within a record context (ITERATE or REVERSE){}", fmt_position(.position))]
    NoRecordContext {
        operation: String,
        position: Option<SourcePosition>,
    },

    /// The operand kind was right but its value is not acceptable.
    #[error("{operation}: {message}{}", fmt_position(.position))]
    InvalidArgument {
        operation: String,
        message: String,
        position: Option<SourcePosition>,
    },
}

fn fmt_position(position: &Option<SourcePosition>) -> String {
    match position {
        Some(pos) => format!(" (line {}, column {})", pos.line, pos.column),
        None => String::new(),
    }
}

impl BstError {
    pub fn stack_underflow(operation: impl Into<String>) -> Self {
        BstError::StackUnderflow {
            operation: operation.into(),
            position: None,
        }
    }

    pub fn type_mismatch(
        operation: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        BstError::TypeMismatch {
            operation: operation.into(),
            expected: expected.into(),
            found: found.into(),
            position: None,
        }
    }

    pub fn unresolved(name: impl Into<String>) -> Self {
        BstError::UnresolvedIdentifier {
            name: name.into(),
            position: None,
        }
    }

    pub fn index_out_of_bounds(operation: impl Into<String>, index: i32, len: usize) -> Self {
        BstError::IndexOutOfBounds {
            operation: operation.into(),
            index,
            len,
            position: None,
        }
    }

    pub fn recursion_limit(name: impl Into<String>, limit: usize) -> Self {
        BstError::RecursionLimitExceeded {
            name: name.into(),
            limit,
            position: None,
        }
    }

    pub fn no_record_context(operation: impl Into<String>) -> Self {
        BstError::NoRecordContext {
            operation: operation.into(),
            position: None,
        }
    }

    pub fn invalid_argument(operation: impl Into<String>, message: impl Into<String>) -> Self {
        BstError::InvalidArgument {
            operation: operation.into(),
            message: message.into(),
            position: None,
        }
    }

    /// The source position attached to this error, if any.
    pub fn position(&self) -> Option<SourcePosition> {
        match self {
            BstError::StackUnderflow { position, .. }
            | BstError::TypeMismatch { position, .. }
            | BstError::UnresolvedIdentifier { position, .. }
            | BstError::IndexOutOfBounds { position, .. }
            | BstError::RecursionLimitExceeded { position, .. }
            | BstError::NoRecordContext { position, .. }
            | BstError::InvalidArgument { position, .. } => *position,
        }
    }

    /// Attach a source position unless one is already set.
    ///
    /// Errors propagate outwards through nested blocks, so the innermost
    /// position is the one that survives.
    pub fn at(mut self, at: Option<SourcePosition>) -> Self {
        let slot = match &mut self {
            BstError::StackUnderflow { position, .. }
            | BstError::TypeMismatch { position, .. }
            | BstError::UnresolvedIdentifier { position, .. }
            | BstError::IndexOutOfBounds { position, .. }
            | BstError::RecursionLimitExceeded { position, .. }
            | BstError::NoRecordContext { position, .. }
            | BstError::InvalidArgument { position, .. } => position,
        };
        if slot.is_none() {
            *slot = at;
        }
        self
    }
}

/// Result type for engine operations.
pub type BstResult<T> = Result<T, BstError>;
