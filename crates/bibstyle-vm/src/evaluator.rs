/*
 * evaluator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Program execution.
//!
//! [`Vm`] holds a program and its configuration and never changes after
//! construction. Each call to [`Vm::execute`] creates a fresh [`Run`] that
//! owns all mutable state: the stack, the global tables, the record
//! bindings and the output buffer.

use crate::bibliography::{BibRecord, Bibliography};
use crate::builtins;
use crate::environment::{Binding, Function, GlobalEnvironment, RecordBinding};
use crate::error::{BstError, BstResult};
use crate::eval_context::{DiagnosticCollector, EngineOptions, Warning, WarningKind, WarningSink};
use crate::names::{BibtexNameFormatter, NameFormatter};
use crate::program::{Block, Command, Program, SourcePosition, Token, TokenKind};
use crate::records;
use crate::stack::ExecutionStack;
use crate::text::Transformed;
use crate::value::Value;
use hashlink::LinkedHashMap;
use std::fmt;
use tracing::{debug, warn};

/// Grow the native stack when less than this remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment.
const STACK_GROWTH: usize = 1024 * 1024;

/// A style program ready to run against bibliographies.
pub struct Vm {
    program: Program,
    options: EngineOptions,
    name_formatter: Box<dyn NameFormatter + Send + Sync>,
}

impl fmt::Debug for Vm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vm")
            .field("program", &self.program)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Everything a successful run leaves behind.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution<'p> {
    /// The text written with `write$` and `newline$`.
    pub output: String,
    /// Values left on the stack, bottom to top.
    pub stack: Vec<Value<'p>>,
    pub strings: LinkedHashMap<String, Option<String>>,
    pub integers: LinkedHashMap<String, i32>,
    /// Citation keys in final record order (after any SORT).
    pub records: Vec<String>,
}

impl Vm {
    pub fn new(program: Program) -> Self {
        Self {
            program,
            options: EngineOptions::default(),
            name_formatter: Box::new(BibtexNameFormatter),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the name handling used by `num.names$` and `format.name$`.
    pub fn with_name_formatter(
        mut self,
        formatter: impl NameFormatter + Send + Sync + 'static,
    ) -> Self {
        self.name_formatter = Box::new(formatter);
        self
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Run the program and return the output buffer. Warnings are only logged.
    pub fn run(&self, bibliography: &dyn Bibliography) -> BstResult<String> {
        let mut diagnostics = DiagnosticCollector::new();
        let execution = self.execute(bibliography, &mut diagnostics)?;
        Ok(execution.output)
    }

    /// Run the program, reporting warnings to `sink`.
    ///
    /// Any error aborts the run; no partial output is returned.
    pub fn execute<'p>(
        &'p self,
        bibliography: &dyn Bibliography,
        sink: &mut dyn WarningSink,
    ) -> BstResult<Execution<'p>> {
        let mut run = Run::new(self, bibliography, sink);
        for command in &self.program.commands {
            run.execute_command(command)?;
        }
        Ok(run.finish())
    }
}

/// Mutable state of one program execution.
pub struct Run<'p, 'a> {
    vm: &'p Vm,
    pub(crate) stack: ExecutionStack<'p>,
    pub(crate) env: GlobalEnvironment<'p>,
    /// Record bindings in current list order.
    pub(crate) records: Vec<RecordBinding>,
    /// Source records, indexed by [`RecordBinding::index`].
    pub(crate) sources: Vec<&'a dyn BibRecord>,
    sink: &'a mut dyn WarningSink,
    call_depth: usize,
    style_warnings: usize,
    position: Option<SourcePosition>,
}

impl<'p, 'a> Run<'p, 'a> {
    fn new(vm: &'p Vm, bibliography: &'a dyn Bibliography, sink: &'a mut dyn WarningSink) -> Self {
        let sources = bibliography.records();
        let records = sources
            .iter()
            .enumerate()
            .map(|(index, record)| RecordBinding::new(index, *record))
            .collect();
        Self {
            vm,
            stack: ExecutionStack::new(),
            env: GlobalEnvironment::new(bibliography.preamble().map(str::to_string)),
            records,
            sources,
            sink,
            call_depth: 0,
            style_warnings: 0,
            position: None,
        }
    }

    fn finish(self) -> Execution<'p> {
        Execution {
            output: self.env.output,
            stack: self.stack.into_vec(),
            strings: self.env.strings,
            integers: self.env.integers,
            records: self
                .records
                .into_iter()
                .map(|record| record.citation_key)
                .collect(),
        }
    }

    pub(crate) fn options(&self) -> &'p EngineOptions {
        &self.vm.options
    }

    pub(crate) fn name_formatter(&self) -> &'p dyn NameFormatter {
        self.vm.name_formatter.as_ref()
    }

    fn execute_command(&mut self, command: &'p Command) -> BstResult<()> {
        debug!(command = command.keyword(), "executing command");
        self.position = None;
        match command {
            Command::Strings { names } => {
                for name in names {
                    self.env.declare_string(name);
                }
            }
            Command::Integers { names } => {
                for name in names {
                    self.env.declare_integer(name);
                }
            }
            Command::Function { name, body } => {
                self.env.define_function(name, Function::UserDefined(body));
            }
            Command::Macro { name, replacement } => {
                self.env
                    .define_function(name, Function::Macro(replacement.clone()));
            }
            Command::Execute { name } => self.invoke(name, None)?,
            Command::Entry {
                fields,
                integers,
                strings,
            } => records::declare_entry(self, fields, integers, strings),
            Command::Read => records::read(self),
            Command::Sort => records::sort(self),
            Command::Iterate { name } => records::iterate(self, name, false)?,
            Command::Reverse { name } => records::iterate(self, name, true)?,
        }
        Ok(())
    }

    /// Resolve `name` through the scope chain: push a variable's value or
    /// invoke a function.
    pub(crate) fn invoke(&mut self, name: &str, record: Option<usize>) -> BstResult<()> {
        let binding = self
            .env
            .resolve(name, record.and_then(|index| self.records.get(index)))
            .ok_or_else(|| BstError::unresolved(name))?;
        match binding {
            Binding::Value(value) => {
                self.stack.push(value);
                Ok(())
            }
            Binding::Function(function) => self.call_function(name, function, record),
        }
    }

    pub(crate) fn call_function(
        &mut self,
        name: &str,
        function: Function<'p>,
        record: Option<usize>,
    ) -> BstResult<()> {
        match function {
            Function::BuiltIn(op) => builtins::execute(op, self, record),
            Function::UserDefined(body) => {
                let limit = self.options().max_call_depth;
                if self.call_depth >= limit {
                    return Err(BstError::recursion_limit(name, limit));
                }
                self.call_depth += 1;
                let result = self.execute_block(body, record);
                self.call_depth -= 1;
                result
            }
            Function::Macro(replacement) => {
                self.stack.push(replacement);
                Ok(())
            }
        }
    }

    /// Execute a function value popped from the stack (`if$`, `while$`).
    pub(crate) fn call(&mut self, function: Value<'p>, record: Option<usize>) -> BstResult<()> {
        match function {
            Value::Symbol(name) => self.invoke(&name, record),
            Value::CodeBlock(block) => self.execute_block(block, record),
            other => Err(BstError::type_mismatch(
                "function call",
                "function",
                other.kind_name(),
            )),
        }
    }

    /// Every recursive path runs through here, so the call depth limit is
    /// reached before the native stack runs out.
    fn execute_block(&mut self, block: &'p Block, record: Option<usize>) -> BstResult<()> {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || self.execute_tokens(block, record))
    }

    fn execute_tokens(&mut self, block: &'p Block, record: Option<usize>) -> BstResult<()> {
        for token in &block.tokens {
            self.position = token.position.or(self.position);
            self.execute_token(token, record)
                .map_err(|err| err.at(token.position))?;
        }
        Ok(())
    }

    fn execute_token(&mut self, token: &'p Token, record: Option<usize>) -> BstResult<()> {
        match &token.kind {
            TokenKind::String(text) => self.stack.push(text.as_str()),
            TokenKind::Integer(value) => self.stack.push(*value),
            TokenKind::Quoted(name) => self.stack.push(Value::Symbol(name.clone())),
            TokenKind::Stack(block) => self.stack.push(Value::CodeBlock(block)),
            TokenKind::Identifier(name) => return self.invoke(name, record),
        }
        Ok(())
    }

    /// The binding for a record-only operation.
    pub(crate) fn record(&self, operation: &str, record: Option<usize>) -> BstResult<&RecordBinding> {
        record
            .and_then(|index| self.records.get(index))
            .ok_or_else(|| BstError::no_record_context(operation))
    }

    /// Report a warning to the sink and the log.
    pub(crate) fn warn(&mut self, kind: WarningKind, message: impl Into<String>) {
        let warning = Warning::new(kind, message).with_position(self.position);
        warn!("{}", warning);
        self.sink.warn(warning);
    }

    /// `warning$`: numbered messages from the program itself.
    pub(crate) fn style_warning(&mut self, text: &str) {
        self.style_warnings += 1;
        let message = format!("Warning (#{}): {}", self.style_warnings, text);
        self.warn(WarningKind::Style, message);
    }

    /// Route the brace warnings of a text algorithm and keep its value.
    pub(crate) fn take_warnings<T>(&mut self, transformed: Transformed<T>) -> T {
        for warning in transformed.warnings {
            self.warn(WarningKind::Braces, warning.to_string());
        }
        transformed.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibliography::{Database, Entry};
    use crate::eval_context::DEFAULT_MAX_CALL_DEPTH;
    use pretty_assertions::assert_eq;

    fn function(name: &str, tokens: Vec<Token>) -> Command {
        Command::Function {
            name: name.to_string(),
            body: Block::new(tokens),
        }
    }

    fn execute(name: &str) -> Command {
        Command::Execute {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_assign_and_write() {
        let program = Program::new(vec![
            Command::Strings {
                names: vec!["s".into()],
            },
            function(
                "test",
                vec![
                    Token::string("abc"),
                    Token::quoted("s"),
                    Token::ident(":="),
                    Token::ident("s"),
                    Token::ident("write$"),
                ],
            ),
            execute("test"),
        ]);
        let output = Vm::new(program).run(&Database::default()).unwrap();
        assert_eq!(output, "abc");
    }

    #[test]
    fn test_unresolved_identifier_carries_position() {
        let program = Program::new(vec![
            function(
                "test",
                vec![
                    Token::string("partial"),
                    Token::ident("write$"),
                    Token::ident("nope").with_position(4, 9),
                ],
            ),
            execute("test"),
        ]);
        let err = Vm::new(program).run(&Database::default()).unwrap_err();
        assert_eq!(
            err,
            BstError::UnresolvedIdentifier {
                name: "nope".into(),
                position: Some(SourcePosition { line: 4, column: 9 }),
            }
        );
    }

    #[test]
    fn test_recursion_limit() {
        let program = Program::new(vec![
            function("loop", vec![Token::ident("loop")]),
            execute("loop"),
        ]);
        let vm = Vm::new(program).with_options(EngineOptions::new().with_max_call_depth(16));
        assert_eq!(
            vm.run(&Database::default()).unwrap_err(),
            BstError::recursion_limit("loop", 16)
        );
    }

    #[test]
    fn test_recursion_through_if_hits_default_limit() {
        let program = Program::new(vec![
            function(
                "f",
                vec![
                    Token::integer(1),
                    Token::block(vec![Token::ident("f")]),
                    Token::block(vec![Token::ident("skip$")]),
                    Token::ident("if$"),
                ],
            ),
            execute("f"),
        ]);
        assert_eq!(
            Vm::new(program).run(&Database::default()).unwrap_err(),
            BstError::recursion_limit("f", DEFAULT_MAX_CALL_DEPTH)
        );
    }

    #[test]
    fn test_direct_recursion_hits_default_limit() {
        let program = Program::new(vec![
            function("g", vec![Token::ident("g")]),
            execute("g"),
        ]);
        assert_eq!(
            Vm::new(program).run(&Database::default()).unwrap_err(),
            BstError::recursion_limit("g", DEFAULT_MAX_CALL_DEPTH)
        );
    }

    #[test]
    fn test_macro_pushes_replacement() {
        let program = Program::new(vec![
            Command::Macro {
                name: "jan".into(),
                replacement: "January".into(),
            },
            execute("jan"),
        ]);
        let vm = Vm::new(program);
        let mut sink = DiagnosticCollector::new();
        let execution = vm.execute(&Database::default(), &mut sink).unwrap();
        assert_eq!(execution.stack, vec![Value::Str("January".into())]);
    }

    #[test]
    fn test_execute_resolves_variables_too() {
        let program = Program::new(vec![execute("global.max$")]);
        let vm = Vm::new(program);
        let mut sink = DiagnosticCollector::new();
        let execution = vm.execute(&Database::default(), &mut sink).unwrap();
        assert_eq!(execution.stack, vec![Value::Int(i32::MAX)]);
    }

    #[test]
    fn test_record_builtin_needs_record_context() {
        let program = Program::new(vec![function("f", vec![Token::ident("cite$")]), execute("f")]);
        let database = Database::new(vec![Entry::new("a", "book")]);
        assert!(matches!(
            Vm::new(program).run(&database),
            Err(BstError::NoRecordContext { .. })
        ));
    }
}
