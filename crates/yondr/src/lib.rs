//! # Yondr: World Definition Loading
//!
//! Builds a game world's *definition* from YAML resources grouped into
//! packages: property schemas per entity group, entity bases that sparsely
//! override those schemas, capability components, and control bindings.
//!
//! Start with [`PackageLoader`](world::PackageLoader) and a
//! [`ResourceManager`](res::ResourceManager), or `use yondr::prelude::*`.

pub mod controls;
pub mod de;
pub mod entity;
pub mod error;
pub mod group;
pub mod naming;
pub mod prelude;
pub mod property;
pub mod res;
pub mod value;
pub mod world;

pub use error::{LoadError, Result};
