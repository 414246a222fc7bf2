/*
 * builtins.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `bibstyle builtins`: print the built-in operation table.

use std::io::{self, Write};

use anyhow::Result;
use bibstyle_vm::BuiltinOp;

/// Execute the builtins command
pub fn execute() -> Result<()> {
    let mut stdout = io::stdout().lock();
    for op in BuiltinOp::ALL {
        writeln!(stdout, "{:<14} {}", op.name(), op.arity())?;
    }
    Ok(())
}
