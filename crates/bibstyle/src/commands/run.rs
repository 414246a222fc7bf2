/*
 * run.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Run command implementation
 */

//! Run command implementation.
//!
//! Loads a program tree and a database from JSON, applies engine options
//! from an optional TOML file and the command-line flags, runs the program
//! and writes the output buffer.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use bibstyle_vm::{Database, DiagnosticCollector, EngineOptions, Program, Vm};

/// Arguments for the run command
#[derive(Debug)]
pub struct RunArgs {
    /// Program tree (JSON)
    pub program: PathBuf,
    /// Bibliography database (JSON)
    pub database: PathBuf,
    /// Engine options (TOML)
    pub config: Option<PathBuf>,
    /// Force strict assignment
    pub strict: bool,
    /// Override the call depth limit
    pub max_depth: Option<usize>,
    /// Output file; stdout when absent
    pub output: Option<PathBuf>,
}

/// Execute the run command
pub fn execute(args: RunArgs) -> Result<()> {
    let options = apply_flags(load_options(args.config.as_deref())?, &args);
    debug!(?options, "engine options");

    let source = read(&args.program, "program")?;
    let program = Program::from_json(&source)
        .with_context(|| format!("Invalid program tree in {}", args.program.display()))?;

    let source = read(&args.database, "database")?;
    let database = Database::from_json(&source)
        .with_context(|| format!("Invalid database in {}", args.database.display()))?;

    let vm = Vm::new(program).with_options(options);
    let mut diagnostics = DiagnosticCollector::new();
    let execution = vm
        .execute(&database, &mut diagnostics)
        .with_context(|| format!("Failed to run {}", args.program.display()))?;

    info!(
        records = execution.records.len(),
        warnings = diagnostics.warnings().len(),
        "bibliography rendered"
    );

    match &args.output {
        Some(path) => fs::write(path, &execution.output)
            .with_context(|| format!("Failed to write output to {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(execution.output.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn read(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {} {}", what, path.display()))
}

/// Options from the config file, or the defaults.
fn load_options(config: Option<&Path>) -> Result<EngineOptions> {
    let Some(path) = config else {
        return Ok(EngineOptions::default());
    };
    let source = read(path, "config")?;
    parse_options(&source).with_context(|| format!("Invalid engine options in {}", path.display()))
}

fn parse_options(source: &str) -> Result<EngineOptions, toml::de::Error> {
    toml::from_str(source)
}

/// Command-line flags win over the config file.
fn apply_flags(mut options: EngineOptions, args: &RunArgs) -> EngineOptions {
    if args.strict {
        options = options.with_strict_assignment(true);
    }
    if let Some(depth) = args.max_depth {
        options = options.with_max_call_depth(depth);
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args() -> RunArgs {
        RunArgs {
            program: PathBuf::from("style.json"),
            database: PathBuf::from("refs.json"),
            config: None,
            strict: false,
            max_depth: None,
            output: None,
        }
    }

    #[test]
    fn test_parse_partial_options() {
        let options = parse_options("strict_assignment = true\n").unwrap();
        assert_eq!(
            options,
            EngineOptions::default().with_strict_assignment(true)
        );
        assert_eq!(parse_options("").unwrap(), EngineOptions::default());
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        assert!(parse_options("max_call_depth = \"deep\"").is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let config = parse_options("strict_assignment = false\nmax_call_depth = 50\n").unwrap();
        let mut args = args();
        args.strict = true;
        args.max_depth = Some(10);
        assert_eq!(
            apply_flags(config, &args),
            EngineOptions::new()
                .with_strict_assignment(true)
                .with_max_call_depth(10)
        );
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let config = parse_options("max_call_depth = 50\n").unwrap();
        assert_eq!(apply_flags(config.clone(), &args()), config);
    }
}
