/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Runtime values.
//!
//! Everything the stack holds is a [`Value`]. Code blocks borrow from the
//! program tree, which outlives the run, so pushing a block never copies it.

use crate::program::Block;
use std::fmt;

/// A value on the execution stack.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'p> {
    /// A string literal or string variable value.
    Str(String),

    /// An integer literal or integer variable value.
    Int(i32),

    /// A quoted identifier (`'name`), used to pass functions and variables by name.
    Symbol(String),

    /// An inline function literal (`{ ... }`).
    CodeBlock(&'p Block),

    /// A field or string variable without a value.
    Missing,
}

impl<'p> Value<'p> {
    /// Human readable kind name used in type errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::Symbol(_) => "symbol",
            Value::CodeBlock(_) => "code block",
            Value::Missing => "missing value",
        }
    }

    pub fn from_optional(value: Option<String>) -> Self {
        value.map_or(Value::Missing, Value::Str)
    }

    /// Whether the value can be executed by `if$` / `while$`.
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Symbol(_) | Value::CodeBlock(_))
    }
}

impl From<&str> for Value<'_> {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value<'_> {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i32> for Value<'_> {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Int(i32::from(b))
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Int(i) => write!(f, "#{}", i),
            Value::Symbol(name) => write!(f, "'{}", name),
            Value::CodeBlock(block) => write!(f, "{{ <{} tokens> }}", block.tokens.len()),
            Value::Missing => write!(f, "<missing>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_conversion_uses_legacy_integers() {
        assert_eq!(Value::from(true), Value::Int(1));
        assert_eq!(Value::from(false), Value::Int(0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("a b").to_string(), "\"a b\"");
        assert_eq!(Value::Int(-3).to_string(), "#-3");
        assert_eq!(Value::Symbol("skip$".into()).to_string(), "'skip$");
        assert_eq!(Value::Missing.to_string(), "<missing>");
    }

    #[test]
    fn test_optional_maps_none_to_missing() {
        assert_eq!(Value::from_optional(None), Value::Missing);
        assert_eq!(
            Value::from_optional(Some("x".into())),
            Value::Str("x".into())
        );
    }
}
