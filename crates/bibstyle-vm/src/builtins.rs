/*
 * builtins.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The built-in operations.
//!
//! Every built-in is a [`BuiltinOp`] variant. [`BuiltinOp::name`] gives the
//! name programs call it by, and [`execute`] dispatches to one function per
//! operation. Built-ins check the stack depth before popping anything, so
//! a `StackUnderflow` leaves the stack as it was.

use crate::error::{BstError, BstResult};
use crate::eval_context::WarningKind;
use crate::evaluator::Run;
use crate::text::{self, CaseFormat};
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

/// Function called by `call.type$` for entry types without their own function.
pub const DEFAULT_TYPE: &str = "default.type";

static ADD_PERIOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^\.\?\!\}\s])(\}|\s)*$").expect("add.period$ pattern is valid")
});

/// Identifies a built-in operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinOp {
    Greater,
    Less,
    Equals,
    Plus,
    Minus,
    Concat,
    Assign,
    AddPeriod,
    CallType,
    ChangeCase,
    ChrToInt,
    Cite,
    Duplicate,
    Empty,
    FormatName,
    If,
    IntToChr,
    IntToStr,
    Missing,
    Newline,
    NumNames,
    Pop,
    Preamble,
    Purify,
    Quote,
    Skip,
    Stack,
    Substring,
    Swap,
    TextLength,
    TextPrefix,
    Top,
    Type,
    Warning,
    While,
    Width,
    Write,
}

impl BuiltinOp {
    pub const ALL: [BuiltinOp; 37] = [
        BuiltinOp::Greater,
        BuiltinOp::Less,
        BuiltinOp::Equals,
        BuiltinOp::Plus,
        BuiltinOp::Minus,
        BuiltinOp::Concat,
        BuiltinOp::Assign,
        BuiltinOp::AddPeriod,
        BuiltinOp::CallType,
        BuiltinOp::ChangeCase,
        BuiltinOp::ChrToInt,
        BuiltinOp::Cite,
        BuiltinOp::Duplicate,
        BuiltinOp::Empty,
        BuiltinOp::FormatName,
        BuiltinOp::If,
        BuiltinOp::IntToChr,
        BuiltinOp::IntToStr,
        BuiltinOp::Missing,
        BuiltinOp::Newline,
        BuiltinOp::NumNames,
        BuiltinOp::Pop,
        BuiltinOp::Preamble,
        BuiltinOp::Purify,
        BuiltinOp::Quote,
        BuiltinOp::Skip,
        BuiltinOp::Stack,
        BuiltinOp::Substring,
        BuiltinOp::Swap,
        BuiltinOp::TextLength,
        BuiltinOp::TextPrefix,
        BuiltinOp::Top,
        BuiltinOp::Type,
        BuiltinOp::Warning,
        BuiltinOp::While,
        BuiltinOp::Width,
        BuiltinOp::Write,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinOp::Greater => ">",
            BuiltinOp::Less => "<",
            BuiltinOp::Equals => "=",
            BuiltinOp::Plus => "+",
            BuiltinOp::Minus => "-",
            BuiltinOp::Concat => "*",
            BuiltinOp::Assign => ":=",
            BuiltinOp::AddPeriod => "add.period$",
            BuiltinOp::CallType => "call.type$",
            BuiltinOp::ChangeCase => "change.case$",
            BuiltinOp::ChrToInt => "chr.to.int$",
            BuiltinOp::Cite => "cite$",
            BuiltinOp::Duplicate => "duplicate$",
            BuiltinOp::Empty => "empty$",
            BuiltinOp::FormatName => "format.name$",
            BuiltinOp::If => "if$",
            BuiltinOp::IntToChr => "int.to.chr$",
            BuiltinOp::IntToStr => "int.to.str$",
            BuiltinOp::Missing => "missing$",
            BuiltinOp::Newline => "newline$",
            BuiltinOp::NumNames => "num.names$",
            BuiltinOp::Pop => "pop$",
            BuiltinOp::Preamble => "preamble$",
            BuiltinOp::Purify => "purify$",
            BuiltinOp::Quote => "quote$",
            BuiltinOp::Skip => "skip$",
            BuiltinOp::Stack => "stack$",
            BuiltinOp::Substring => "substring$",
            BuiltinOp::Swap => "swap$",
            BuiltinOp::TextLength => "text.length$",
            BuiltinOp::TextPrefix => "text.prefix$",
            BuiltinOp::Top => "top$",
            BuiltinOp::Type => "type$",
            BuiltinOp::Warning => "warning$",
            BuiltinOp::While => "while$",
            BuiltinOp::Width => "width$",
            BuiltinOp::Write => "write$",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == name)
    }

    /// Number of operands the operation pops.
    pub fn arity(self) -> usize {
        match self {
            BuiltinOp::CallType
            | BuiltinOp::Cite
            | BuiltinOp::Newline
            | BuiltinOp::Preamble
            | BuiltinOp::Quote
            | BuiltinOp::Skip
            | BuiltinOp::Stack
            | BuiltinOp::Type => 0,
            BuiltinOp::AddPeriod
            | BuiltinOp::ChrToInt
            | BuiltinOp::Duplicate
            | BuiltinOp::Empty
            | BuiltinOp::IntToChr
            | BuiltinOp::IntToStr
            | BuiltinOp::Missing
            | BuiltinOp::NumNames
            | BuiltinOp::Pop
            | BuiltinOp::Purify
            | BuiltinOp::TextLength
            | BuiltinOp::Top
            | BuiltinOp::Warning
            | BuiltinOp::Width
            | BuiltinOp::Write => 1,
            BuiltinOp::Greater
            | BuiltinOp::Less
            | BuiltinOp::Equals
            | BuiltinOp::Plus
            | BuiltinOp::Minus
            | BuiltinOp::Concat
            | BuiltinOp::Assign
            | BuiltinOp::ChangeCase
            | BuiltinOp::Swap
            | BuiltinOp::TextPrefix
            | BuiltinOp::While => 2,
            BuiltinOp::FormatName | BuiltinOp::If | BuiltinOp::Substring => 3,
        }
    }
}

/// Run a built-in. `record` is the index of the current record binding.
pub(crate) fn execute(op: BuiltinOp, run: &mut Run<'_, '_>, record: Option<usize>) -> BstResult<()> {
    run.stack.require(op.name(), op.arity())?;
    match op {
        BuiltinOp::Greater => compare(run, op, |a, b| a > b),
        BuiltinOp::Less => compare(run, op, |a, b| a < b),
        BuiltinOp::Equals => equals(run),
        BuiltinOp::Plus => arithmetic(run, op, i32::wrapping_add),
        BuiltinOp::Minus => arithmetic(run, op, i32::wrapping_sub),
        BuiltinOp::Concat => concat(run),
        BuiltinOp::Assign => assign(run, record),
        BuiltinOp::AddPeriod => add_period(run),
        BuiltinOp::CallType => call_type(run, record),
        BuiltinOp::ChangeCase => change_case(run),
        BuiltinOp::ChrToInt => chr_to_int(run),
        BuiltinOp::Cite => {
            let key = run.record(op.name(), record)?.citation_key.clone();
            run.stack.push(key);
            Ok(())
        }
        BuiltinOp::Duplicate => {
            let value = run.stack.pop(op.name())?;
            run.stack.push(value.clone());
            run.stack.push(value);
            Ok(())
        }
        BuiltinOp::Empty => empty(run),
        BuiltinOp::FormatName => format_name(run),
        BuiltinOp::If => if_then_else(run, record),
        BuiltinOp::IntToChr => int_to_chr(run),
        BuiltinOp::IntToStr => {
            let value = run.stack.pop_int(op.name())?;
            run.stack.push(value.to_string());
            Ok(())
        }
        BuiltinOp::Missing => missing(run),
        BuiltinOp::Newline => {
            run.env.output.push('\n');
            Ok(())
        }
        BuiltinOp::NumNames => num_names(run),
        BuiltinOp::Pop => run.stack.pop(op.name()).map(|_| ()),
        BuiltinOp::Preamble => {
            let preamble = run.env.preamble.clone().unwrap_or_default();
            run.stack.push(preamble);
            Ok(())
        }
        BuiltinOp::Purify => {
            let value = run.stack.pop_string(op.name())?;
            let purified = run.take_warnings(text::purify(&value));
            run.stack.push(purified);
            Ok(())
        }
        BuiltinOp::Quote => {
            run.stack.push("\"");
            Ok(())
        }
        BuiltinOp::Skip => Ok(()),
        BuiltinOp::Stack => {
            for value in run.stack.drain() {
                run.warn(WarningKind::StackDump, value.to_string());
            }
            Ok(())
        }
        BuiltinOp::Substring => substring(run),
        BuiltinOp::Swap => {
            let first = run.stack.pop(op.name())?;
            let second = run.stack.pop(op.name())?;
            run.stack.push(first);
            run.stack.push(second);
            Ok(())
        }
        BuiltinOp::TextLength => {
            let value = run.stack.pop_string(op.name())?;
            let length = text::text_length(&value);
            run.stack.push(i32::try_from(length).unwrap_or(i32::MAX));
            Ok(())
        }
        BuiltinOp::TextPrefix => {
            let count = run.stack.pop_int(op.name())?;
            let value = run.stack.pop_string(op.name())?;
            let prefix = run.take_warnings(text::text_prefix(&value, count));
            run.stack.push(prefix);
            Ok(())
        }
        BuiltinOp::Top => {
            let value = run.stack.pop(op.name())?;
            run.warn(WarningKind::StackDump, value.to_string());
            Ok(())
        }
        BuiltinOp::Type => {
            let entry_type = run.record(op.name(), record)?.entry_type.clone();
            run.stack.push(entry_type);
            Ok(())
        }
        BuiltinOp::Warning => {
            let message = run.stack.pop_string(op.name())?;
            run.style_warning(&message);
            Ok(())
        }
        BuiltinOp::While => while_loop(run, record),
        BuiltinOp::Width => {
            let value = run.stack.pop_string(op.name())?;
            let width = run.take_warnings(text::width(&value));
            run.stack.push(width);
            Ok(())
        }
        BuiltinOp::Write => {
            let value = run.stack.pop_string(op.name())?;
            trace!(text = %value, "write$");
            run.env.output.push_str(&value);
            Ok(())
        }
    }
}

fn compare(run: &mut Run<'_, '_>, op: BuiltinOp, holds: fn(i32, i32) -> bool) -> BstResult<()> {
    let right = run.stack.pop_int(op.name())?;
    let left = run.stack.pop_int(op.name())?;
    run.stack.push(holds(left, right));
    Ok(())
}

fn arithmetic(run: &mut Run<'_, '_>, op: BuiltinOp, apply: fn(i32, i32) -> i32) -> BstResult<()> {
    let right = run.stack.pop_int(op.name())?;
    let left = run.stack.pop_int(op.name())?;
    run.stack.push(apply(left, right));
    Ok(())
}

fn equals(run: &mut Run<'_, '_>) -> BstResult<()> {
    let name = BuiltinOp::Equals.name();
    let right = run.stack.pop(name)?;
    let left = run.stack.pop(name)?;
    let equal = match (&left, &right) {
        (Value::Missing, Value::Missing) => true,
        (Value::Missing, _) | (_, Value::Missing) => false,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        _ => {
            return Err(BstError::type_mismatch(
                name,
                left.kind_name(),
                right.kind_name(),
            ));
        }
    };
    run.stack.push(equal);
    Ok(())
}

/// Pop a string operand, treating a missing value as empty.
fn pop_text_or_empty(run: &mut Run<'_, '_>, name: &str) -> BstResult<String> {
    match run.stack.pop(name)? {
        Value::Str(s) => Ok(s),
        Value::Missing => Ok(String::new()),
        other => Err(BstError::type_mismatch(name, "string", other.kind_name())),
    }
}

fn concat(run: &mut Run<'_, '_>) -> BstResult<()> {
    let name = BuiltinOp::Concat.name();
    let right = pop_text_or_empty(run, name)?;
    let mut left = pop_text_or_empty(run, name)?;
    left.push_str(&right);
    run.stack.push(left);
    Ok(())
}

fn assign(run: &mut Run<'_, '_>, record: Option<usize>) -> BstResult<()> {
    let op = BuiltinOp::Assign.name();
    let target = match run.stack.pop(op)? {
        Value::Symbol(target) => target,
        other => return Err(BstError::type_mismatch(op, "symbol", other.kind_name())),
    };
    let value = run.stack.pop(op)?;

    let binding = record.and_then(|index| run.records.get_mut(index));
    let assigned = match value {
        Value::Str(text) => run.env.assign_string(&target, text, binding),
        Value::Int(number) => run.env.assign_integer(&target, number, binding),
        other => {
            return Err(BstError::type_mismatch(
                op,
                "string or integer",
                other.kind_name(),
            ));
        }
    };

    if !assigned {
        if run.options().strict_assignment {
            return Err(BstError::unresolved(target));
        }
        debug!(name = %target, "assignment to undeclared variable ignored");
    }
    Ok(())
}

fn add_period(run: &mut Run<'_, '_>) -> BstResult<()> {
    let value = run.stack.pop_string(BuiltinOp::AddPeriod.name())?;
    // Only the last trailing brace or space survives, so "x} }}" becomes "x.}".
    let result = match ADD_PERIOD.captures(&value) {
        Some(caps) => {
            let end = caps.get(1).map_or(0, |last| last.end());
            let mut result = String::with_capacity(end + 2);
            result.push_str(&value[..end]);
            result.push('.');
            result.push_str(caps.get(2).map_or("", |tail| tail.as_str()));
            result
        }
        None => value,
    };
    run.stack.push(result);
    Ok(())
}

fn call_type(run: &mut Run<'_, '_>, record: Option<usize>) -> BstResult<()> {
    let entry_type = run
        .record(BuiltinOp::CallType.name(), record)?
        .entry_type
        .to_lowercase();
    let function = run
        .env
        .functions
        .get(&entry_type)
        .or_else(|| run.env.functions.get(DEFAULT_TYPE))
        .cloned()
        .ok_or_else(|| BstError::unresolved(&entry_type))?;
    run.call_function(&entry_type, function, record)
}

fn change_case(run: &mut Run<'_, '_>) -> BstResult<()> {
    let op = BuiltinOp::ChangeCase.name();
    let spec = run.stack.pop_string(op)?;
    let value = run.stack.pop_string(op)?;

    let mut letters = spec.chars();
    let (Some(letter), None) = (letters.next(), letters.next()) else {
        return Err(BstError::invalid_argument(
            op,
            format!("format must be a single character, got \"{}\"", spec),
        ));
    };

    match CaseFormat::from_spec(letter) {
        Some(format) => {
            let changed = run.take_warnings(text::change_case(&value, format));
            run.stack.push(changed);
        }
        None => {
            run.warn(
                WarningKind::Operand,
                format!("Unknown case format \"{}\" for change.case$", spec),
            );
            run.stack.push(value);
        }
    }
    Ok(())
}

fn chr_to_int(run: &mut Run<'_, '_>) -> BstResult<()> {
    let op = BuiltinOp::ChrToInt.name();
    let value = run.stack.pop_string(op)?;
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            run.stack.push(c as i32);
            Ok(())
        }
        _ => Err(BstError::invalid_argument(
            op,
            format!("expected a single character, got \"{}\"", value),
        )),
    }
}

fn int_to_chr(run: &mut Run<'_, '_>) -> BstResult<()> {
    let op = BuiltinOp::IntToChr.name();
    let code = run.stack.pop_int(op)?;
    let c = u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| BstError::invalid_argument(op, format!("{} is not a character code", code)))?;
    run.stack.push(c.to_string());
    Ok(())
}

fn empty(run: &mut Run<'_, '_>) -> BstResult<()> {
    let is_empty = match run.stack.pop(BuiltinOp::Empty.name())? {
        Value::Missing => true,
        Value::Str(s) => s.trim().is_empty(),
        _ => false,
    };
    run.stack.push(is_empty);
    Ok(())
}

fn missing(run: &mut Run<'_, '_>) -> BstResult<()> {
    match run.stack.pop(BuiltinOp::Missing.name())? {
        Value::Missing => run.stack.push(true),
        Value::Str(_) => run.stack.push(false),
        other => {
            run.warn(
                WarningKind::Operand,
                format!("missing$ expects a string or missing field, found {}", other),
            );
            run.stack.push(true);
        }
    }
    Ok(())
}

fn num_names(run: &mut Run<'_, '_>) -> BstResult<()> {
    let names = run.stack.pop_string(BuiltinOp::NumNames.name())?;
    let count = run.name_formatter().num_names(&names);
    run.stack.push(i32::try_from(count).unwrap_or(i32::MAX));
    Ok(())
}

fn format_name(run: &mut Run<'_, '_>) -> BstResult<()> {
    let op = BuiltinOp::FormatName.name();
    let format = run.stack.pop_string(op)?;
    let index = run.stack.pop_int(op)?;
    let names = match run.stack.pop(op)? {
        Value::Str(names) => names,
        Value::Missing => {
            run.stack.push("");
            return Ok(());
        }
        other => return Err(BstError::type_mismatch(op, "string", other.kind_name())),
    };

    let formatter = run.name_formatter();
    let count = formatter.num_names(&names);
    let formatted = usize::try_from(index)
        .ok()
        .filter(|i| (1..=count).contains(i))
        .and_then(|i| formatter.format_name(&names, i, &format))
        .ok_or_else(|| BstError::index_out_of_bounds(op, index, count))?;
    run.stack.push(formatted);
    Ok(())
}

/// Pop a function operand for `if$` / `while$`.
fn pop_callable<'p>(run: &mut Run<'p, '_>, op: BuiltinOp) -> BstResult<Value<'p>> {
    let value = run.stack.pop(op.name())?;
    if !value.is_callable() {
        return Err(BstError::type_mismatch(
            op.name(),
            "function",
            value.kind_name(),
        ));
    }
    Ok(value)
}

fn if_then_else(run: &mut Run<'_, '_>, record: Option<usize>) -> BstResult<()> {
    let otherwise = pop_callable(run, BuiltinOp::If)?;
    let then = pop_callable(run, BuiltinOp::If)?;
    let condition = run.stack.pop_int(BuiltinOp::If.name())?;
    if condition > 0 {
        run.call(then, record)
    } else {
        run.call(otherwise, record)
    }
}

fn while_loop(run: &mut Run<'_, '_>, record: Option<usize>) -> BstResult<()> {
    let body = pop_callable(run, BuiltinOp::While)?;
    let condition = pop_callable(run, BuiltinOp::While)?;
    loop {
        run.call(condition.clone(), record)?;
        if run.stack.pop_int(BuiltinOp::While.name())? <= 0 {
            return Ok(());
        }
        run.call(body.clone(), record)?;
    }
}

fn substring(run: &mut Run<'_, '_>) -> BstResult<()> {
    let op = BuiltinOp::Substring.name();
    let len = run.stack.pop_int(op)?;
    let start = run.stack.pop_int(op)?;
    let value = run.stack.pop_string(op)?;
    let result = substring_of(&value, start, len);
    run.stack.push(result);
    Ok(())
}

/// `substring$` on Unicode scalar values.
///
/// `start` is 1-based; a negative start counts from the end and the
/// substring then ends at that position. Out-of-range requests are
/// clipped, never rejected.
pub fn substring_of(text: &str, start: i32, len: i32) -> String {
    const LIMIT: i64 = (i32::MAX / 2) as i64;
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len() as i64;
    let len = i64::from(len).min(LIMIT);
    let mut start = i64::from(start).clamp(-LIMIT, LIMIT);

    if start == 0 || len <= 0 {
        return String::new();
    }
    if start < 0 {
        start += n + 1;
        start = (start + 1 - len).max(1);
    }

    let begin = start - 1;
    if begin >= n {
        return String::new();
    }
    let end = (begin + len).min(n);
    chars[begin as usize..end as usize].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique_and_round_trip() {
        for op in BuiltinOp::ALL {
            assert_eq!(BuiltinOp::from_name(op.name()), Some(op));
        }
        let mut names: Vec<&str> = BuiltinOp::ALL.iter().map(|op| op.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BuiltinOp::ALL.len());
    }

    #[test]
    fn test_substring() {
        let s = "123456789";
        assert_eq!(substring_of(s, 2, 1), "2");
        assert_eq!(substring_of(s, 4, i32::MAX), "456789");
        assert_eq!(substring_of(s, 1, 9), s);
        assert_eq!(substring_of(s, 1, 10), s);
        assert_eq!(substring_of(s, 1, 99), s);
        assert_eq!(substring_of(s, -7, 3), "123");
        assert_eq!(substring_of(s, -1, 1), "9");
        assert_eq!(substring_of(s, -1, 3), "789");
        assert_eq!(substring_of(s, -2, 2), "78");
        assert_eq!(substring_of("hello", 1, 3), "hel");
        assert_eq!(substring_of("hello", -1, 3), "llo");
    }

    #[test]
    fn test_substring_never_fails_on_range() {
        assert_eq!(substring_of("abc", 0, 2), "");
        assert_eq!(substring_of("abc", 2, 0), "");
        assert_eq!(substring_of("abc", 2, -5), "");
        assert_eq!(substring_of("abc", 10, 2), "");
        assert_eq!(substring_of("abc", i32::MIN, 2), "ab");
        assert_eq!(substring_of("", 1, 1), "");
        assert_eq!(substring_of("äöü", 2, 1), "ö");
    }

    #[test]
    fn test_add_period_pattern() {
        let cases = [
            ("Johnny", true),
            ("Johnny.", false),
            ("Johnny!", false),
            ("Johnny?", false),
            ("Johnny} }}}", true),
            ("Johnny!}", false),
            ("", false),
        ];
        for (text, matches) in cases {
            assert_eq!(ADD_PERIOD.is_match(text), matches, "{text}");
        }
    }
}
