/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Execution engine for BibTeX bibliography style programs.
//!
//! A style program (historically a `.bst` file) turns bibliographic records
//! into formatted reference-list text. This crate runs such programs:
//!
//! - A typed value stack shared by all operations of a run
//! - Per-record and global variables, resolved through one scope chain
//! - The 37 built-in operations (`write$`, `format.name$`, `if$`, ...)
//! - Brace-aware text algorithms with the exact legacy semantics
//!   (`change.case$`, `purify$`, `width$`, `text.prefix$`)
//! - BibTeX name list parsing and name formatting
//!
//! # Architecture
//!
//! The engine does **not** parse style source. It executes a [`Program`]
//! tree built in Rust or deserialized from JSON, against any
//! [`Bibliography`] implementation. [`Vm`] is immutable; every call to
//! [`Vm::execute`] runs in a fresh state.
//!
//! # Example
//!
//! ```ignore
//! use bibstyle_vm::{Block, Command, Database, Program, Token, Vm};
//!
//! let program = Program::new(vec![
//!     Command::Function {
//!         name: "hello".into(),
//!         body: Block::new(vec![Token::string("Hello"), Token::ident("write$")]),
//!     },
//!     Command::Execute { name: "hello".into() },
//! ]);
//!
//! let output = Vm::new(program).run(&Database::default())?;
//! assert_eq!(output, "Hello");
//! ```

pub mod bibliography;
pub mod builtins;
pub mod environment;
pub mod error;
pub mod eval_context;
pub mod evaluator;
pub mod names;
pub mod program;
mod records;
pub mod stack;
pub mod text;
pub mod value;

// Re-export main types at crate root
pub use bibliography::{BibRecord, Bibliography, Database, Entry};
pub use builtins::BuiltinOp;
pub use environment::{Function, GlobalEnvironment, RecordBinding};
pub use error::{BstError, BstResult};
pub use eval_context::{
    DiagnosticCollector, EngineOptions, Warning, WarningKind, WarningSink,
};
pub use evaluator::{Execution, Vm};
pub use names::{BibtexNameFormatter, NameFormatter, Person, parse_name_list};
pub use program::{Block, Command, Program, SourcePosition, Token, TokenKind};
pub use stack::ExecutionStack;
pub use value::Value;
