//! Deserialization errors.
//!
//! Every [`DeError`] names the resource being parsed and the node path inside
//! it, e.g. `world.yaml: npc.properties[1].type: 'nmber' is not one of: ...`.

use std::fmt;

use crate::res::{Resource, ResourceKind};

/// What went wrong while resolving a node.
#[derive(Debug, thiserror::Error)]
pub enum DeErrorKind {
    #[error("malformed YAML: {0}")]
    Syntax(#[source] serde_yaml::Error),
    #[error("resource is not valid UTF-8")]
    NotUtf8,
    #[error("expected {expected}, found {found}")]
    Mismatch { expected: String, found: &'static str },
    #[error("'{value}' is not a valid {expected}")]
    InvalidScalar { expected: &'static str, value: String },
    #[error("'{value}' is not one of: {expected}")]
    UnknownVariant { value: String, expected: String },
    #[error("unknown field '{field}', expected one of: {expected}")]
    UnknownField { field: String, expected: String },
    #[error("expected a {expected}-component vector, found {found} components")]
    VectorArity { expected: usize, found: usize },
    #[error("mapping keys must be scalars")]
    NonScalarKey,
    #[error("no resource named '{name}' in this package")]
    MissingResource { name: String },
    #[error("resource '{name}' is a {kind} resource, not a schema")]
    NotSchema { name: String, kind: ResourceKind },
    #[error("circular import of '{name}' ({chain})")]
    CircularImport { name: String, chain: String },
    #[error("{0}")]
    Build(#[source] serde_yaml::Error),
}

/// A deserialization failure with its location.
#[derive(Debug)]
pub struct DeError {
    pub(crate) resource: String,
    pub(crate) path: String,
    pub(crate) kind: DeErrorKind,
}

impl DeError {
    pub(crate) fn new(resource: &Resource, path: String, kind: DeErrorKind) -> Self {
        Self {
            resource: resource.path().display().to_string(),
            path,
            kind,
        }
    }

    pub fn kind(&self) -> &DeErrorKind {
        &self.kind
    }

    /// Path of the resource being parsed when the error occurred.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Node path inside the resource; empty for the document root.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for DeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.resource, self.kind)
        } else {
            write!(f, "{}: {}: {}", self.resource, self.path, self.kind)
        }
    }
}

impl std::error::Error for DeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}
