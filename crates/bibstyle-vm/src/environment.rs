/*
 * environment.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Variable and function tables.
//!
//! A run has one [`GlobalEnvironment`] and one [`RecordBinding`] per
//! record. Names are looked up in this order, first match wins:
//!
//! 1. record fields
//! 2. record-local strings
//! 3. record-local integers
//! 4. global strings
//! 5. global integers
//! 6. functions
//!
//! Steps 1-3 only apply inside ITERATE/REVERSE (or `call.type$` from there).

use crate::bibliography::BibRecord;
use crate::builtins::BuiltinOp;
use crate::program::Block;
use crate::value::Value;
use hashlink::LinkedHashMap;

/// Record-local string that SORT orders by.
pub const SORT_KEY: &str = "sort.key$";

/// Field that every record has once ENTRY has run.
pub const CROSSREF: &str = "crossref";

/// Something callable by name.
#[derive(Debug, Clone, PartialEq)]
pub enum Function<'p> {
    BuiltIn(BuiltinOp),
    UserDefined(&'p Block),
    /// Invoking a macro pushes its replacement text.
    Macro(String),
}

/// What a name resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding<'p> {
    /// A variable or field; its value is pushed.
    Value(Value<'p>),
    /// A function; it is invoked.
    Function(Function<'p>),
}

/// Global tables, fresh for every run.
#[derive(Debug, Clone)]
pub struct GlobalEnvironment<'p> {
    pub strings: LinkedHashMap<String, Option<String>>,
    pub integers: LinkedHashMap<String, i32>,
    pub functions: LinkedHashMap<String, Function<'p>>,
    pub output: String,
    pub preamble: Option<String>,
}

impl<'p> GlobalEnvironment<'p> {
    /// Tables seeded with the built-ins and the two legacy integer constants.
    pub fn new(preamble: Option<String>) -> Self {
        let mut integers = LinkedHashMap::new();
        integers.insert("entry.max$".to_string(), i32::MAX);
        integers.insert("global.max$".to_string(), i32::MAX);

        let functions = BuiltinOp::ALL
            .iter()
            .map(|op| (op.name().to_string(), Function::BuiltIn(*op)))
            .collect();

        Self {
            strings: LinkedHashMap::new(),
            integers,
            functions,
            output: String::new(),
            preamble,
        }
    }

    pub fn declare_string(&mut self, name: &str) {
        self.strings.insert(name.to_string(), None);
    }

    pub fn declare_integer(&mut self, name: &str) {
        self.integers.insert(name.to_string(), 0);
    }

    pub fn define_function(&mut self, name: &str, function: Function<'p>) {
        self.functions.insert(name.to_string(), function);
    }

    /// Resolve `name`, consulting `record` first when given.
    pub fn resolve(&self, name: &str, record: Option<&RecordBinding>) -> Option<Binding<'p>> {
        if let Some(record) = record {
            if let Some(value) = record.lookup(name) {
                return Some(Binding::Value(value));
            }
        }
        if let Some(value) = self.strings.get(name) {
            return Some(Binding::Value(Value::from_optional(value.clone())));
        }
        if let Some(value) = self.integers.get(name) {
            return Some(Binding::Value(Value::Int(*value)));
        }
        self.functions
            .get(name)
            .map(|function| Binding::Function(function.clone()))
    }

    /// Store a string value.
    ///
    /// Returns `false` when no string table declares `name`.
    pub fn assign_string(
        &mut self,
        name: &str,
        value: String,
        record: Option<&mut RecordBinding>,
    ) -> bool {
        if let Some(record) = record {
            if let Some(slot) = record.local_strings.get_mut(name) {
                *slot = Some(value);
                return true;
            }
        }
        match self.strings.get_mut(name) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    /// Store an integer value.
    ///
    /// Returns `false` when no integer table declares `name`.
    pub fn assign_integer(
        &mut self,
        name: &str,
        value: i32,
        record: Option<&mut RecordBinding>,
    ) -> bool {
        if let Some(record) = record {
            if let Some(slot) = record.local_integers.get_mut(name) {
                *slot = value;
                return true;
            }
        }
        match self.integers.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// Per-record tables.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBinding {
    /// Position of the source record in the bibliography.
    pub index: usize,
    pub citation_key: String,
    pub entry_type: String,
    pub fields: LinkedHashMap<String, Option<String>>,
    pub local_strings: LinkedHashMap<String, Option<String>>,
    pub local_integers: LinkedHashMap<String, i32>,
}

impl RecordBinding {
    pub fn new(index: usize, record: &dyn BibRecord) -> Self {
        let mut local_strings = LinkedHashMap::new();
        local_strings.insert(SORT_KEY.to_string(), None);
        Self {
            index,
            citation_key: record.citation_key().to_string(),
            entry_type: record.entry_type().to_string(),
            fields: LinkedHashMap::new(),
            local_strings,
            local_integers: LinkedHashMap::new(),
        }
    }

    pub fn declare_field(&mut self, name: &str) {
        self.fields.insert(name.to_string(), None);
    }

    pub fn declare_string(&mut self, name: &str) {
        self.local_strings.insert(name.to_string(), None);
    }

    pub fn declare_integer(&mut self, name: &str) {
        self.local_integers.insert(name.to_string(), 0);
    }

    /// Copy every declared field's value from the source record.
    pub fn read_fields(&mut self, record: &dyn BibRecord) {
        for (name, value) in self.fields.iter_mut() {
            *value = record.field(name).map(str::to_string);
        }
    }

    pub fn sort_key(&self) -> &str {
        self.local_strings
            .get(SORT_KEY)
            .and_then(|key| key.as_deref())
            .unwrap_or("")
    }

    fn lookup<'p>(&self, name: &str) -> Option<Value<'p>> {
        if let Some(value) = self.fields.get(name) {
            return Some(Value::from_optional(value.clone()));
        }
        if let Some(value) = self.local_strings.get(name) {
            return Some(Value::from_optional(value.clone()));
        }
        self.local_integers.get(name).map(|value| Value::Int(*value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibliography::Entry;

    fn record() -> RecordBinding {
        let entry = Entry::new("knuth84", "book").with_field("title", "The TeXbook");
        let mut binding = RecordBinding::new(0, &entry);
        binding.declare_field("title");
        binding.declare_field("author");
        binding.declare_string("label");
        binding.read_fields(&entry);
        binding
    }

    #[test]
    fn test_seeded_tables() {
        let env = GlobalEnvironment::new(None);
        assert_eq!(
            env.resolve("global.max$", None),
            Some(Binding::Value(Value::Int(i32::MAX)))
        );
        assert_eq!(
            env.resolve("write$", None),
            Some(Binding::Function(Function::BuiltIn(BuiltinOp::Write)))
        );
        assert_eq!(env.resolve("nothing", None), None);
    }

    #[test]
    fn test_record_shadows_globals() {
        let mut env = GlobalEnvironment::new(None);
        env.declare_string("title");
        let record = record();
        assert_eq!(
            env.resolve("title", Some(&record)),
            Some(Binding::Value(Value::Str("The TeXbook".into())))
        );
        assert_eq!(
            env.resolve("title", None),
            Some(Binding::Value(Value::Missing))
        );
        assert_eq!(
            env.resolve("author", Some(&record)),
            Some(Binding::Value(Value::Missing))
        );
    }

    #[test]
    fn test_assignment_prefers_record_locals() {
        let mut env = GlobalEnvironment::new(None);
        env.declare_string("label");
        let mut record = record();

        assert!(env.assign_string("label", "K84".into(), Some(&mut record)));
        assert_eq!(record.local_strings.get("label"), Some(&Some("K84".into())));
        assert_eq!(env.strings.get("label"), Some(&None));

        assert!(env.assign_string("label", "global".into(), None));
        assert_eq!(env.strings.get("label"), Some(&Some("global".into())));

        assert!(!env.assign_string("title", "x".into(), Some(&mut record)));
        assert!(!env.assign_integer("label", 1, Some(&mut record)));
    }

    #[test]
    fn test_sort_key_defaults_to_empty() {
        let mut record = record();
        assert_eq!(record.sort_key(), "");
        record
            .local_strings
            .insert(SORT_KEY.to_string(), Some("knuth".into()));
        assert_eq!(record.sort_key(), "knuth");
    }
}
