/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Shared helpers for the integration tests.
 */

#![allow(dead_code)]

use bibstyle_vm::{
    Block, Command, Database, DiagnosticCollector, EngineOptions, Execution, Program, Token, Value,
    Vm,
};
use std::path::{Path, PathBuf};

/// Path to a file in `test-fixtures/`.
pub fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir).join("test-fixtures").join(name)
}

pub fn load_program(name: &str) -> Program {
    let json = std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to read program: {}", name));
    Program::from_json(&json).unwrap_or_else(|e| panic!("Invalid program {}: {}", name, e))
}

pub fn load_database(name: &str) -> Database {
    let json = std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to read database: {}", name));
    Database::from_json(&json).unwrap_or_else(|e| panic!("Invalid database {}: {}", name, e))
}

/// Tokenize a stack block written in style syntax, e.g.
/// `"abc" 's := s write$ { #1 } { #2 } if$`.
pub fn block(source: &str) -> Block {
    let chars: Vec<char> = source.chars().collect();
    let mut pos = 0;
    let tokens = tokens(&chars, &mut pos);
    assert_eq!(pos, chars.len(), "unbalanced block in {:?}", source);
    Block::new(tokens)
}

fn tokens(chars: &[char], pos: &mut usize) -> Vec<Token> {
    let mut out = Vec::new();
    while *pos < chars.len() {
        let c = chars[*pos];
        if c.is_whitespace() {
            *pos += 1;
        } else if c == '}' {
            return out;
        } else if c == '{' {
            *pos += 1;
            let inner = tokens(chars, pos);
            assert_eq!(chars.get(*pos), Some(&'}'), "unclosed block");
            *pos += 1;
            out.push(Token::block(inner));
        } else if c == '"' {
            let start = *pos + 1;
            let end = start
                + chars[start..]
                    .iter()
                    .position(|&c| c == '"')
                    .expect("unterminated string");
            out.push(Token::string(chars[start..end].iter().collect::<String>()));
            *pos = end + 1;
        } else {
            let start = *pos;
            while *pos < chars.len() && !chars[*pos].is_whitespace() && !"{}".contains(chars[*pos]) {
                *pos += 1;
            }
            let word: String = chars[start..*pos].iter().collect();
            out.push(if let Some(number) = word.strip_prefix('#') {
                Token::integer(number.parse().expect("integer literal"))
            } else if let Some(name) = word.strip_prefix('\'') {
                Token::quoted(name)
            } else {
                Token::ident(word)
            });
        }
    }
    out
}

/// A `FUNCTION {name} { body }` command.
pub fn function(name: &str, body: &str) -> Command {
    Command::Function {
        name: name.to_string(),
        body: block(body),
    }
}

pub fn execute(name: &str) -> Command {
    Command::Execute {
        name: name.to_string(),
    }
}

pub fn strings(names: &[&str]) -> Command {
    Command::Strings {
        names: names.iter().map(|n| n.to_string()).collect(),
    }
}

pub fn integers(names: &[&str]) -> Command {
    Command::Integers {
        names: names.iter().map(|n| n.to_string()).collect(),
    }
}

/// Run `body` once via EXECUTE and return the values left on the stack.
pub fn eval_stack(body: &str) -> Vec<Value<'static>> {
    let program = Program::new(vec![function("test", body), execute("test")]);
    let vm = Vm::new(program);
    let mut sink = DiagnosticCollector::new();
    let execution = vm
        .execute(&Database::default(), &mut sink)
        .unwrap_or_else(|e| panic!("{:?} failed: {}", body, e));
    execution
        .stack
        .into_iter()
        .map(|value| match value {
            Value::Str(s) => Value::Str(s),
            Value::Int(i) => Value::Int(i),
            Value::Symbol(s) => Value::Symbol(s),
            Value::Missing => Value::Missing,
            Value::CodeBlock(_) => panic!("code block left on the stack"),
        })
        .collect()
}

/// Run `body` and return the single string it leaves on the stack.
pub fn eval_string(body: &str) -> String {
    match eval_stack(body).as_slice() {
        [Value::Str(s)] => s.clone(),
        other => panic!("expected one string for {:?}, got {:?}", body, other),
    }
}

/// Run `body` and return the single integer it leaves on the stack.
pub fn eval_int(body: &str) -> i32 {
    match eval_stack(body).as_slice() {
        [Value::Int(i)] => *i,
        other => panic!("expected one integer for {:?}, got {:?}", body, other),
    }
}

/// Run a whole program against `database`, collecting warnings.
pub fn execute_program<'p>(
    vm: &'p Vm,
    database: &Database,
) -> (bibstyle_vm::BstResult<Execution<'p>>, DiagnosticCollector) {
    let mut sink = DiagnosticCollector::new();
    let result = vm.execute(database, &mut sink);
    (result, sink)
}

pub fn vm(commands: Vec<Command>) -> Vm {
    Vm::new(Program::new(commands))
}

pub fn strict_vm(commands: Vec<Command>) -> Vm {
    vm(commands).with_options(EngineOptions::new().with_strict_assignment(true))
}
