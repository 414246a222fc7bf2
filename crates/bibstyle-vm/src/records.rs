/*
 * records.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The record commands: ENTRY, READ, SORT, ITERATE and REVERSE.
//!
//! Commands run in the order the program gives them; nothing here checks
//! that READ came after ENTRY or that SORT came after READ.

use crate::environment::CROSSREF;
use crate::error::BstResult;
use crate::evaluator::Run;
use tracing::debug;

/// Declare fields and entry variables on every record.
pub(crate) fn declare_entry(
    run: &mut Run<'_, '_>,
    fields: &[String],
    integers: &[String],
    strings: &[String],
) {
    for record in &mut run.records {
        for field in fields {
            record.declare_field(field);
        }
        if !record.fields.contains_key(CROSSREF) {
            record.declare_field(CROSSREF);
        }
        for name in integers {
            record.declare_integer(name);
        }
        for name in strings {
            record.declare_string(name);
        }
    }
}

/// Copy the declared fields from the source records.
pub(crate) fn read(run: &mut Run<'_, '_>) {
    for record in &mut run.records {
        if !record.fields.contains_key(CROSSREF) {
            record.declare_field(CROSSREF);
        }
        record.read_fields(run.sources[record.index]);
    }
    debug!(records = run.records.len(), "read fields");
}

/// Stable sort by `sort.key$`, comparing code points.
pub(crate) fn sort(run: &mut Run<'_, '_>) {
    run.records.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
}

/// Call `name` once per record, forwards or backwards.
pub(crate) fn iterate(run: &mut Run<'_, '_>, name: &str, reverse: bool) -> BstResult<()> {
    let count = run.records.len();
    let order: Box<dyn Iterator<Item = usize>> = if reverse {
        Box::new((0..count).rev())
    } else {
        Box::new(0..count)
    };
    for index in order {
        run.invoke(name, Some(index))?;
    }
    Ok(())
}
