//! Load errors.
//!
//! Anything that stops [`PackageLoader::load`](crate::world::PackageLoader::load)
//! ends up here. Recoverable problems are not errors; they are reported as
//! [`LoadWarning`](crate::world::LoadWarning)s and loading carries on.

use crate::de::DeError;
use crate::group::GroupError;
use crate::property::PropertyError;

/// A fatal load failure.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A deps, world or controls resource failed to parse.
    #[error("package '{package}': {source}")]
    Deserialize {
        package: String,
        #[source]
        source: DeError,
    },
    #[error("group '{group}': {source}")]
    Property {
        group: String,
        #[source]
        source: PropertyError,
    },
    #[error("group '{group}': {source}")]
    Group {
        group: String,
        #[source]
        source: GroupError,
    },
    #[error("cannot create group '{name}': all {limit} group ids are taken")]
    TooManyGroups { name: String, limit: usize },
}

pub type Result<T, E = LoadError> = std::result::Result<T, E>;
