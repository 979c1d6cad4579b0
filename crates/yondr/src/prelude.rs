//! Common imports.
//!
//! ```ignore
//! use yondr::prelude::*;
//! ```

pub use crate::controls::{Controls, KeyBindings};
pub use crate::de::{DeError, DeErrorKind, Field, NodeResolver, Pipeline, ResolveContext, Schema, Shape};
pub use crate::entity::{Entity, EntityBase};
pub use crate::error::LoadError;
pub use crate::group::{Component, ComponentKind, EntityGroup, GroupError, GroupId};
pub use crate::property::{Property, PropertyError, PropertyRegistry};
pub use crate::res::{Package, Resource, ResourceKind, ResourceManager};
pub use crate::value::{Literal, Value, ValueType, Vec2, Vec3, Vec4};
pub use crate::world::{LoadConfig, LoadReport, LoadWarning, PackageLoader, World};
