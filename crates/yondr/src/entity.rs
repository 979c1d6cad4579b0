//! # Entity Bases: Sparse Overrides Over a Registry
//!
//! A base (an entity archetype such as `ogre` or `chest`) only records the
//! properties it changes. Everything else falls back to the registry default.
//!
//! ```text
//! registry defaults   [ health: 10 | name: "" | speed: 1 ]
//! base "ogre"         { 0 → 25.5 }
//!                         │
//!                         ▼   copy defaults, then apply overrides
//! entity              [ health: 25.5 | name: "" | speed: 1 ]
//! ```
//!
//! Materialization lives on [`EntityGroup::create_entity`](crate::group::EntityGroup::create_entity);
//! a base never touches the registry it was built against.

use std::collections::BTreeMap;
use std::fmt;

use crate::group::GroupId;
use crate::naming::simplify;
use crate::value::Value;

/// A named, sparse set of property overrides, keyed by property index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityBase {
    name: String,
    overrides: BTreeMap<usize, Value>,
}

impl EntityBase {
    pub fn new(name: &str) -> Self {
        Self {
            name: simplify(name),
            overrides: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Override the property at `index`. Returns the previous override, if any.
    pub fn set(&mut self, index: usize, value: Value) -> Option<Value> {
        self.overrides.insert(index, value)
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.overrides.get(&index)
    }

    /// Overrides in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.overrides.iter().map(|(&index, value)| (index, value))
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// A fully materialized entity: one value per registered property.
#[derive(Clone, PartialEq)]
pub struct Entity {
    pub(crate) group: GroupId,
    pub(crate) base: String,
    pub(crate) values: Vec<Value>,
}

impl Entity {
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Name of the base this entity was created from.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}:{}) ", self.group, self.base)?;
        f.debug_list().entries(&self.values).finish()
    }
}
