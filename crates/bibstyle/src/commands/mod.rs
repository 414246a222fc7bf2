//! Command implementations for the bibstyle CLI
//!
//! Each command module handles the CLI interface and delegates to
//! bibstyle-vm for execution.

pub mod builtins;
pub mod run;
