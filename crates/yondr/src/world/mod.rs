//! # World: Groups Known to the Game
//!
//! The world is what loading produces: every entity group any package
//! mentioned, in creation order, plus the implicit `self` entity.
//!
//! ```text
//! World
//!  ├─ groups: Vec<EntityGroup>      id = position, dense from 0
//!  │    [0] npc   [1] item   [2] self
//!  ├─ by_name: HashMap<String, usize>
//!  └─ self_entity: Option<Entity>   default entity of the self group
//! ```
//!
//! Group ids are a single byte, so a world holds at most 256 groups.

mod loader;
pub mod schema;

pub use loader::{LoadConfig, LoadReport, LoadWarning, PackageLoader};

use std::collections::HashMap;

use crate::entity::{Entity, EntityBase};
use crate::error::LoadError;
use crate::group::{EntityGroup, GroupId};
use crate::naming::simplify;

/// Upper bound on groups, from the width of [`GroupId`].
pub const MAX_GROUPS: usize = u8::MAX as usize + 1;

#[derive(Debug)]
pub struct World {
    groups: Vec<EntityGroup>,
    by_name: HashMap<String, usize>,
    self_entity: Option<Entity>,
    max_groups: usize,
}

impl World {
    /// An empty world holding at most `max_groups` groups (capped at 256).
    pub fn new(max_groups: usize) -> Self {
        Self {
            groups: Vec::new(),
            by_name: HashMap::new(),
            self_entity: None,
            max_groups: max_groups.min(MAX_GROUPS),
        }
    }

    pub fn max_groups(&self) -> usize {
        self.max_groups
    }

    /// The group called `name`, created with the next id if it does not
    /// exist yet.
    pub fn get_or_create_group(&mut self, name: &str) -> Result<&mut EntityGroup, LoadError> {
        let name = simplify(name);
        let index = match self.by_name.get(&name) {
            Some(&index) => index,
            None => {
                let index = self.groups.len();
                let id = match u8::try_from(index) {
                    Ok(id) if index < self.max_groups => GroupId(id),
                    _ => {
                        return Err(LoadError::TooManyGroups {
                            name,
                            limit: self.max_groups,
                        });
                    }
                };
                log::debug!("Created group '{name}' with id {id}.");
                self.groups.push(EntityGroup::new(&name, id));
                self.by_name.insert(name, index);
                index
            }
        };
        Ok(&mut self.groups[index])
    }

    pub fn group(&self, name: &str) -> Option<&EntityGroup> {
        self.by_name.get(&simplify(name)).map(|&i| &self.groups[i])
    }

    pub fn group_by_id(&self, id: GroupId) -> Option<&EntityGroup> {
        self.groups.get(id.index())
    }

    /// Groups in id order.
    pub fn groups(&self) -> impl Iterator<Item = &EntityGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Run every group's init hook.
    pub fn init_groups(&mut self) {
        for group in &mut self.groups {
            group.init();
        }
    }

    /// Create the self group if needed and materialize its default entity
    /// from an empty base. Bases authored on the self group never apply to it.
    pub fn create_self(&mut self, name: &str) -> Result<&Entity, LoadError> {
        let group = self.get_or_create_group(name)?;
        let base = EntityBase::new(group.name());
        group.init();

        let entity = group.create_entity(&base);
        log::debug!("Created self entity {entity:?}.");
        let entity: &Entity = self.self_entity.insert(entity);
        Ok(entity)
    }

    /// The default entity of the self group, once loading has finished.
    pub fn self_entity(&self) -> Option<&Entity> {
        self.self_entity.as_ref()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(MAX_GROUPS)
    }
}

#[cfg(test)]
mod tests;
