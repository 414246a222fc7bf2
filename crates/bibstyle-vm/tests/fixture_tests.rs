/*
 * fixture_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Runs the style programs in test-fixtures/ against the fixture database.
 *
 * plain-style.json is the program tree of plain-style.bst; token positions
 * in error reports refer to lines and columns of the .bst source.
 */

mod common;

use bibstyle_vm::{BstError, Command, Database, SourcePosition, Vm};
use common::{execute_program, load_database, load_program};
use pretty_assertions::assert_eq;

#[test]
fn test_plain_style_renders_references() {
    let vm = Vm::new(load_program("plain-style.json"));
    let database = load_database("references.json");

    let (result, sink) = execute_program(&vm, &database);
    let execution = result.unwrap_or_else(|e| panic!("plain-style failed: {}", e));

    assert!(sink.is_empty(), "unexpected warnings: {:?}", sink.messages());
    assert!(execution.stack.is_empty());
    insta::assert_snapshot!("plain-style", execution.output);
}

#[test]
fn test_plain_style_sorts_and_labels() {
    let vm = Vm::new(load_program("plain-style.json"));
    let database = load_database("references.json");

    let (result, _) = execute_program(&vm, &database);
    let execution = result.unwrap();

    assert_eq!(
        execution.records,
        vec!["knuth84", "lamport94", "patashnik88", "vallee1899"]
    );
    assert_eq!(execution.integers.get("number.label"), Some(&4));
    assert_eq!(execution.integers.get("longest.label.width"), Some(&500));
    assert_eq!(
        execution.strings.get("longest.label"),
        Some(&Some("1".to_string()))
    );
}

#[test]
fn test_runs_are_independent() {
    let vm = Vm::new(load_program("plain-style.json"));
    let database = load_database("references.json");

    let first = vm.run(&database).unwrap();
    let second = vm.run(&database).unwrap();
    assert_eq!(first, second);

    let empty = vm.run(&Database::default()).unwrap();
    assert_eq!(
        empty,
        "\\begin{thebibliography}{}\n\n\\end{thebibliography}\n"
    );
}

#[test]
fn test_error_reports_innermost_position() {
    let mut program = load_program("plain-style.json");
    program
        .commands
        .retain(|command| !matches!(command, Command::Macro { name, .. } if name == "ann"));
    let vm = Vm::new(program);

    let err = vm.run(&load_database("references.json")).unwrap_err();
    assert_eq!(
        err,
        BstError::UnresolvedIdentifier {
            name: "ann".into(),
            position: Some(SourcePosition {
                line: 65,
                column: 20
            }),
        }
    );
    assert_eq!(
        err.to_string(),
        "No matching identifier found: ann (line 65, column 20)"
    );
}
