//! Attribute storage for service-defined entity fields
//!
//! Every entity (show, episode, actor, banner) exposes the fields delivered
//! by the service through an [`AttributeBag`]: a name → typed-value store
//! with optional case-insensitive lookup. The bag is what survives a
//! snapshot/restore cycle, so it serializes completely, including the
//! lookup mode.

use crate::error::{Result, TvdbError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single typed attribute value as mapped from the service XML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Plain text
    Text(String),
    /// Whole number
    Int(i64),
    /// Decimal number
    Float(f64),
    /// A `YYYY-MM-DD` calendar date
    Date(NaiveDate),
    /// Pipe-separated list, already split
    List(Vec<String>),
}

impl AttributeValue {
    /// Returns the text content, if this value is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content, if this value is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float content, if this value is a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the date content, if this value is a date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            AttributeValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the list content, if this value is a list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AttributeValue::List(l) => Some(l),
            _ => None,
        }
    }
}

/// Name → value store backing every entity's field access.
///
/// Canonical names are preserved exactly as inserted and enumerated in
/// insertion order. In ignore-case mode a secondary lowercase index makes
/// `get("imdb_id")` and `get("IMDB_ID")` hit the same slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeBag {
    ignore_case: bool,
    /// Canonical insertion order, one entry per canonical name
    order: Vec<String>,
    values: HashMap<String, AttributeValue>,
    /// lowercase name → canonical name; only maintained in ignore-case mode
    lower: HashMap<String, String>,
}

impl AttributeBag {
    /// Creates an empty bag with the given lookup mode.
    pub fn new(ignore_case: bool) -> Self {
        Self {
            ignore_case,
            order: Vec::new(),
            values: HashMap::new(),
            lower: HashMap::new(),
        }
    }

    /// Whether lookups normalize case.
    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Inserts or replaces a value under its canonical name.
    ///
    /// In ignore-case mode two distinct canonical names that lowercase to
    /// the same key collide; the collision resolves last-write-wins, which
    /// is the behaviour inherited from the service's own field naming.
    pub fn set(&mut self, name: &str, value: AttributeValue) {
        if self.ignore_case {
            let key = name.to_lowercase();
            if let Some(previous) = self.lower.insert(key, name.to_string()) {
                if previous != name {
                    tracing::debug!(previous, canonical = name, "case-colliding attribute names");
                }
            }
        }
        if !self.values.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.values.insert(name.to_string(), value);
    }

    /// Looks a value up, honouring the lookup mode.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        if let Some(value) = self.values.get(name) {
            return Some(value);
        }
        if self.ignore_case {
            let canonical = self.lower.get(&name.to_lowercase())?;
            return self.values.get(canonical);
        }
        None
    }

    /// Like [`get`](Self::get) but failing with the typed attribute error.
    pub fn get_or_err(&self, kind: &'static str, name: &str) -> Result<&AttributeValue> {
        self.get(name)
            .ok_or_else(|| TvdbError::attribute(kind, name, false))
    }

    /// True if a value exists under the given name (mode-sensitive).
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Canonical names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of stored attributes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no attribute is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merges `other` into `self`: new and changed names win, names only
    /// present in `self` persist. `other`'s canonical spelling wins on
    /// case-colliding names.
    pub fn merge(&mut self, other: &AttributeBag) {
        for name in other.names() {
            if let Some(value) = other.values.get(name) {
                self.set(name, value.clone());
            }
        }
    }
}

impl PartialEq for AttributeBag {
    fn eq(&self, other: &Self) -> bool {
        self.ignore_case == other.ignore_case && self.values == other.values
    }
}
