/*
 * stack.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The execution stack shared by all operations of a run.

use crate::error::{BstError, BstResult};
use crate::value::Value;

/// LIFO stack of values. Popping an empty stack is always an error.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExecutionStack<'p> {
    values: Vec<Value<'p>>,
}

impl<'p> ExecutionStack<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: impl Into<Value<'p>>) {
        self.values.push(value.into());
    }

    /// Pop the top value on behalf of `operation`.
    pub fn pop(&mut self, operation: &str) -> BstResult<Value<'p>> {
        self.values
            .pop()
            .ok_or_else(|| BstError::stack_underflow(operation))
    }

    /// Fail early if fewer than `arity` values are available.
    ///
    /// Built-ins call this before popping so that an underflow leaves the
    /// stack untouched.
    pub fn require(&self, operation: &str, arity: usize) -> BstResult<()> {
        if self.values.len() < arity {
            return Err(BstError::stack_underflow(operation));
        }
        Ok(())
    }

    pub fn pop_int(&mut self, operation: &str) -> BstResult<i32> {
        match self.pop(operation)? {
            Value::Int(i) => Ok(i),
            other => Err(BstError::type_mismatch(
                operation,
                "integer",
                other.kind_name(),
            )),
        }
    }

    pub fn pop_string(&mut self, operation: &str) -> BstResult<String> {
        match self.pop(operation)? {
            Value::Str(s) => Ok(s),
            other => Err(BstError::type_mismatch(
                operation,
                "string",
                other.kind_name(),
            )),
        }
    }

    pub fn peek(&self) -> Option<&Value<'p>> {
        self.values.last()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Remove every value, top first.
    pub fn drain(&mut self) -> Vec<Value<'p>> {
        let mut drained = std::mem::take(&mut self.values);
        drained.reverse();
        drained
    }

    pub fn into_vec(self) -> Vec<Value<'p>> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_empty_is_underflow() {
        let mut stack = ExecutionStack::new();
        assert_eq!(
            stack.pop("pop$"),
            Err(BstError::stack_underflow("pop$"))
        );
    }

    #[test]
    fn test_typed_pops() {
        let mut stack = ExecutionStack::new();
        stack.push("text");
        stack.push(7);
        assert_eq!(stack.pop_int("+").unwrap(), 7);
        assert!(matches!(
            stack.pop_int("+"),
            Err(BstError::TypeMismatch { .. })
        ));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_drain_returns_top_first() {
        let mut stack = ExecutionStack::new();
        stack.push(1);
        stack.push(2);
        assert_eq!(stack.drain(), vec![Value::Int(2), Value::Int(1)]);
        assert!(stack.is_empty());
    }
}
