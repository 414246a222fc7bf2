/*
 * bibliography.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Bibliography input.
//!
//! The engine reads records only through the [`Bibliography`] and
//! [`BibRecord`] traits. [`Database`] is a simple in-memory implementation
//! that can be deserialized from JSON:
//!
//! ```json
//! {
//!   "preamble": "\\newcommand{\\noop}[1]{}",
//!   "entries": [
//!     { "key": "knuth84", "type": "book",
//!       "fields": { "author": "Donald E. Knuth", "title": "The {\\TeX}book" } }
//!   ]
//! }
//! ```

use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};

/// A single bibliographic record.
pub trait BibRecord {
    /// The citation key (`cite$`).
    fn citation_key(&self) -> &str;

    /// The entry type, e.g. `article` (`type$`).
    fn entry_type(&self) -> &str;

    /// Field value by name. Field names are case-insensitive.
    fn field(&self, name: &str) -> Option<&str>;
}

/// A set of records plus the database preamble.
pub trait Bibliography {
    /// The records in citation order.
    fn records(&self) -> Vec<&dyn BibRecord>;

    /// The `@PREAMBLE` text, if any (`preamble$`).
    fn preamble(&self) -> Option<&str> {
        None
    }
}

/// In-memory bibliography.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl Database {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            preamble: None,
            entries,
        }
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    /// Parse a database from its JSON form.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Bibliography for Database {
    fn records(&self) -> Vec<&dyn BibRecord> {
        self.entries
            .iter()
            .map(|entry| entry as &dyn BibRecord)
            .collect()
    }

    fn preamble(&self) -> Option<&str> {
        self.preamble.as_deref()
    }
}

/// One record of a [`Database`]. Fields keep their insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default)]
    pub fields: LinkedHashMap<String, String>,
}

impl Entry {
    pub fn new(key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entry_type: entry_type.into(),
            fields: LinkedHashMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

impl BibRecord for Entry {
    fn citation_key(&self) -> &str {
        &self.key
    }

    fn entry_type(&self) -> &str {
        &self.entry_type
    }

    fn field(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.fields.get(name) {
            return Some(value);
        }
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
