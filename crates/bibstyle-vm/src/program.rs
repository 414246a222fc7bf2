/*
 * program.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Program tree types.
//!
//! The engine receives style programs already parsed. These types are the
//! read-only tree it executes; they can be built in Rust or deserialized
//! from JSON. Tokens and blocks optionally carry a source position for
//! error reporting.

use serde::{Deserialize, Serialize};

/// A line/column position in the original style source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

/// A parsed style program: the top-level commands in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub commands: Vec<Command>,
}

impl Program {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    /// Parse a program tree from its JSON form.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// A top-level command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// `STRINGS { a b }`: declare global string variables.
    Strings { names: Vec<String> },

    /// `INTEGERS { a b }`: declare global integer variables.
    Integers { names: Vec<String> },

    /// `FUNCTION {name} { ... }`
    Function { name: String, body: Block },

    /// `MACRO {name} {"text"}`
    Macro { name: String, replacement: String },

    /// `EXECUTE {name}`: call once without a record.
    Execute { name: String },

    /// `ENTRY {fields} {integers} {strings}`
    Entry {
        #[serde(default)]
        fields: Vec<String>,
        #[serde(default)]
        integers: Vec<String>,
        #[serde(default)]
        strings: Vec<String>,
    },

    /// `READ`: load field values from the database.
    Read,

    /// `SORT`: order records by `sort.key$`.
    Sort,

    /// `ITERATE {name}`: call once per record, in list order.
    Iterate { name: String },

    /// `REVERSE {name}`: call once per record, in reverse list order.
    Reverse { name: String },
}

impl Command {
    /// The command keyword as written in style source.
    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Strings { .. } => "STRINGS",
            Command::Integers { .. } => "INTEGERS",
            Command::Function { .. } => "FUNCTION",
            Command::Macro { .. } => "MACRO",
            Command::Execute { .. } => "EXECUTE",
            Command::Entry { .. } => "ENTRY",
            Command::Read => "READ",
            Command::Sort => "SORT",
            Command::Iterate { .. } => "ITERATE",
            Command::Reverse { .. } => "REVERSE",
        }
    }
}

/// A brace-delimited stack block: a function body or an inline function literal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub tokens: Vec<Token>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<SourcePosition>,
}

impl Block {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: None,
        }
    }

    pub fn with_position(mut self, position: SourcePosition) -> Self {
        self.position = Some(position);
        self
    }
}

/// One item inside a stack block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(flatten)]
    pub kind: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<SourcePosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// `"text"`
    String(String),
    /// `#42`
    Integer(i32),
    /// `'name`
    Quoted(String),
    /// A nested `{ ... }` block, pushed as a value.
    Stack(Block),
    /// A bare name, resolved through the scope chain.
    Identifier(String),
}

impl Token {
    pub fn string(text: impl Into<String>) -> Self {
        TokenKind::String(text.into()).into()
    }

    pub fn integer(value: i32) -> Self {
        TokenKind::Integer(value).into()
    }

    pub fn quoted(name: impl Into<String>) -> Self {
        TokenKind::Quoted(name.into()).into()
    }

    pub fn block(tokens: Vec<Token>) -> Self {
        TokenKind::Stack(Block::new(tokens)).into()
    }

    pub fn ident(name: impl Into<String>) -> Self {
        TokenKind::Identifier(name.into()).into()
    }

    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.position = Some(SourcePosition { line, column });
        self
    }
}

impl From<TokenKind> for Token {
    fn from(kind: TokenKind) -> Self {
        Token {
            kind,
            position: None,
        }
    }
}
