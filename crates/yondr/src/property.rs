//! # Property Registry: Indexed Schema of a Group
//!
//! Every entity group owns one [`PropertyRegistry`]: the ordered list of
//! properties its entities carry, each with a type and a default value.
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │ PropertyRegistry                           │
//! │                                            │
//! │  properties: Vec<Property>                 │
//! │    [0] health  number  10                  │
//! │    [1] name    text    ""                  │
//! │    [2] pos     vec3    [0, 0, 0]           │
//! │                                            │
//! │  by_name: HashMap<String, usize>           │
//! │    "health" → 0, "name" → 1, "pos" → 2     │
//! └────────────────────────────────────────────┘
//! ```
//!
//! Indices are handed out sequentially and never change, so entity bases and
//! materialized entities can refer to properties by index alone. Properties
//! are never removed.

use std::collections::HashMap;

use crate::naming::{display_name, simplify};
use crate::value::{Value, ValueType};

/// One registered property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: String,
    display_name: String,
    value: Value,
    index: usize,
}

impl Property {
    /// Canonical (simplified) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `lowerCamelCase` name for scripts and tooling.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Default value. Its type is the property's type.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn ty(&self) -> ValueType {
        self.value.ty()
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Errors raised while registering properties.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyError {
    /// A property with the same canonical name already exists.
    #[error("property '{name}' is already registered (index {index})")]
    Duplicate { name: String, index: usize },
}

/// Ordered, name-unique collection of typed properties with defaults.
#[derive(Debug, Clone, Default)]
pub struct PropertyRegistry {
    properties: Vec<Property>,
    by_name: HashMap<String, usize>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a property. `default` provides both its type and its default.
    ///
    /// Returns the new property's index. Fails, leaving the registry
    /// untouched, if the canonical name is already taken.
    pub fn add(&mut self, name: &str, default: Value) -> Result<usize, PropertyError> {
        let canonical = simplify(name);
        if let Some(&index) = self.by_name.get(&canonical) {
            return Err(PropertyError::Duplicate { name: canonical, index });
        }

        let index = self.properties.len();
        self.by_name.insert(canonical.clone(), index);
        self.properties.push(Property {
            name: canonical,
            display_name: display_name(name),
            value: default,
            index,
        });
        Ok(index)
    }

    /// Look up a property by name (any spelling).
    pub fn with_name(&self, name: &str) -> Option<&Property> {
        let index = *self.by_name.get(&simplify(name))?;
        Some(&self.properties[index])
    }

    /// The property at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range. Indices come only from this
    /// registry, so an unknown one is a bug in the caller.
    pub fn at(&self, index: usize) -> &Property {
        self.properties.get(index).unwrap_or_else(|| {
            panic!(
                "Property index {index} out of range (registry has {} properties)",
                self.properties.len()
            )
        })
    }

    pub fn count(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Properties in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    /// Default values in index order: the starting point of every entity.
    pub fn defaults(&self) -> Vec<Value> {
        self.properties.iter().map(|p| p.value.clone()).collect()
    }
}
