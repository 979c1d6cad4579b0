//! Authored form of a world resource.
//!
//! ```yaml
//! npc:
//!   components: [graphical, spatial]
//!   properties:
//!     - { name: health, type: number, default: 10 }
//!     - { name: name, type: text }
//!     - { name: position, type: vec3, default: [0, 0, 0] }
//!   bases:
//!     - ogre: { health: 25.5 }
//!     - goblin: { health: 4, name: Grik }
//! item: items.yaml
//! ```

use indexmap::IndexMap;
use serde::Deserialize;

use crate::de::{Field, Schema, Shape};
use crate::group::ComponentKind;
use crate::value::{Literal, ValueType};

/// Overrides of one base: property name → authored value.
pub type BaseDef = IndexMap<String, Option<Literal>>;

/// Everything one world resource says about one group.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GroupDef {
    pub components: Vec<ComponentKind>,
    pub properties: Vec<PropertyDef>,
    /// Each entry maps base names to their overrides; usually one base per entry.
    pub bases: Vec<IndexMap<String, BaseDef>>,
}

impl Schema for GroupDef {
    fn shape() -> Shape {
        Shape::Record(vec![
            Field::of::<Vec<ComponentKind>>("components"),
            Field::of::<Vec<PropertyDef>>("properties"),
            Field::of::<Vec<IndexMap<String, BaseDef>>>("bases"),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ValueType,
    #[serde(default)]
    pub default: Option<Literal>,
}

impl Schema for PropertyDef {
    fn shape() -> Shape {
        Shape::Record(vec![
            Field::of::<String>("name"),
            Field::of::<ValueType>("type"),
            Field::of::<Option<Literal>>("default"),
        ])
    }
}

/// Group name → definition, in authored order.
pub type WorldDef = IndexMap<String, GroupDef>;

/// Action → keys, as authored in a controls resource.
pub type ControlsDef = IndexMap<String, Vec<String>>;
