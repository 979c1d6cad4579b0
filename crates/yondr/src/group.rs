//! # Entity Groups
//!
//! A group is a named category of entities (`npc`, `item`, `self`, ...). It
//! owns everything the loader learns about that category:
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ EntityGroup "npc" (id 0)                      │
//! │                                               │
//! │  registry: PropertyRegistry                   │
//! │  bases:    IndexMap<String, EntityBase>       │
//! │  components: Vec<Box<dyn Component>>          │
//! │    graphical, spatial (grid: not implemented) │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Groups are created lazily the first time a world file names them, and grow
//! as later packages add properties, bases and components.

use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::de::{Schema, Shape};
use crate::entity::{Entity, EntityBase};
use crate::naming::simplify;
use crate::property::PropertyRegistry;
use crate::value::ValueType;

/// Dense group identifier. At most 256 groups exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub(crate) u8);

impl GroupId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Components ──────────────────────────────────────────────────────────

/// Capability kinds a group can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Graphical,
    Grid,
    Spatial,
}

impl ComponentKind {
    pub const NAMES: &'static [&'static str] = &["graphical", "grid", "spatial"];

    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Graphical => "graphical",
            ComponentKind::Grid => "grid",
            ComponentKind::Spatial => "spatial",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Schema for ComponentKind {
    fn shape() -> Shape {
        Shape::Enum(Self::NAMES)
    }
}

/// A capability attached to a group. Runtime behavior (rendering, spatial
/// indexing) lives outside this crate; the loader only attaches components
/// and runs their init hook once every package is loaded.
pub trait Component: fmt::Debug {
    fn kind(&self) -> ComponentKind;

    /// Called once after all packages are processed.
    fn init(&mut self, _registry: &PropertyRegistry) {}

    /// Index of the property this capability drives, once initialized.
    fn property(&self) -> Option<usize> {
        None
    }
}

/// Renders entities of the group. Drives the `model` text property.
#[derive(Debug, Default)]
pub struct GraphicalComponent {
    model: Option<usize>,
}

impl GraphicalComponent {
    pub const PROPERTY: &'static str = "model";
}

impl Component for GraphicalComponent {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Graphical
    }

    fn init(&mut self, registry: &PropertyRegistry) {
        self.model = bind(registry, Self::PROPERTY, ValueType::Text);
    }

    fn property(&self) -> Option<usize> {
        self.model
    }
}

/// Places entities of the group in space. Drives the `position` vec3 property.
#[derive(Debug, Default)]
pub struct SpatialComponent {
    position: Option<usize>,
}

impl SpatialComponent {
    pub const PROPERTY: &'static str = "position";
}

impl Component for SpatialComponent {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Spatial
    }

    fn init(&mut self, registry: &PropertyRegistry) {
        self.position = bind(registry, Self::PROPERTY, ValueType::Vec3);
    }

    fn property(&self) -> Option<usize> {
        self.position
    }
}

fn bind(registry: &PropertyRegistry, name: &str, ty: ValueType) -> Option<usize> {
    let property = registry.with_name(name)?;
    if property.ty() != ty {
        log::warn!(
            "Property '{}' is {}, expected {ty}; component left unbound.",
            property.name(),
            property.ty()
        );
        return None;
    }
    Some(property.index())
}

// ── Errors ──────────────────────────────────────────────────────────────

/// Errors raised while assembling a group.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GroupError {
    /// The component kind is declared but has no implementation.
    #[error("component '{0}' is not implemented")]
    NotImplemented(ComponentKind),
}

// ── EntityGroup ─────────────────────────────────────────────────────────

/// A named category of entities with its own property schema and bases.
#[derive(Debug)]
pub struct EntityGroup {
    name: String,
    id: GroupId,
    registry: PropertyRegistry,
    bases: IndexMap<String, EntityBase>,
    components: Vec<Box<dyn Component>>,
    initialized: bool,
}

impl EntityGroup {
    pub fn new(name: &str, id: GroupId) -> Self {
        Self {
            name: simplify(name),
            id,
            registry: PropertyRegistry::new(),
            bases: IndexMap::new(),
            components: Vec::new(),
            initialized: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn registry(&self) -> &PropertyRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PropertyRegistry {
        &mut self.registry
    }

    // ── Bases ────────────────────────────────────────────────────────

    /// Store a base under its name. A later base with the same name replaces
    /// the earlier one.
    pub fn add_base(&mut self, base: EntityBase) {
        if let Some(old) = self.bases.insert(base.name().to_owned(), base) {
            log::warn!("Base '{}' in group '{}' was redefined.", old.name(), self.name);
        }
    }

    pub fn base(&self, name: &str) -> Option<&EntityBase> {
        self.bases.get(&simplify(name))
    }

    /// Bases in the order they were first added.
    pub fn bases(&self) -> impl Iterator<Item = &EntityBase> {
        self.bases.values()
    }

    /// Materialize an entity: registry defaults, then the base's overrides.
    pub fn create_entity(&self, base: &EntityBase) -> Entity {
        let mut values = self.registry.defaults();
        for (index, value) in base.iter() {
            debug_assert!(
                index < values.len(),
                "base '{}' overrides unknown property index {index}",
                base.name()
            );
            if let Some(slot) = values.get_mut(index) {
                *slot = value.clone();
            }
        }
        Entity {
            group: self.id,
            base: base.name().to_owned(),
            values,
        }
    }

    // ── Components ───────────────────────────────────────────────────

    /// Attach a capability. Attaching a kind twice is a no-op.
    pub fn add_component(&mut self, kind: ComponentKind) -> Result<(), GroupError> {
        if self.has_component(kind) {
            return Ok(());
        }
        let component: Box<dyn Component> = match kind {
            ComponentKind::Graphical => Box::new(GraphicalComponent::default()),
            ComponentKind::Spatial => Box::new(SpatialComponent::default()),
            ComponentKind::Grid => return Err(GroupError::NotImplemented(kind)),
        };
        self.components.push(component);
        Ok(())
    }

    pub fn has_component(&self, kind: ComponentKind) -> bool {
        self.components.iter().any(|c| c.kind() == kind)
    }

    pub fn components(&self) -> impl Iterator<Item = &dyn Component> {
        self.components.iter().map(|c| c.as_ref())
    }

    /// Run every component's init hook. Later calls do nothing.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        for component in &mut self.components {
            component.init(&self.registry);
        }
        self.initialized = true;
        log::debug!(
            "Initialized group '{}' ({} properties, {} bases, {} components).",
            self.name,
            self.registry.count(),
            self.bases.len(),
            self.components.len()
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}
