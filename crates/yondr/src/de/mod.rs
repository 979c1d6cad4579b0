//! # Deserialization Pipeline
//!
//! Schema resources are YAML, but plain `serde_yaml::from_str` is not enough:
//! a scalar where a mapping is expected names *another resource* to import,
//! enum names ignore case, and vectors must have exactly the right number of
//! components. The pipeline resolves a raw YAML node tree against a run-time
//! [`Shape`] first, then hands the normalized tree to serde.
//!
//! ```text
//! text ──parse──► serde_yaml::Value ──resolve(shape)──► normalized Value ──serde──► T
//!                                         │
//!                    ┌────────────────────┴─────────────────────┐
//!                    │ resolvers, first claim wins:             │
//!                    │  1. null        null → empty value       │
//!                    │  2. import      "stats.yaml" → contents  │
//!                    │  3. enum        "Spatial" → "spatial"    │
//!                    │  4. scalar      numbers, text, booleans  │
//!                    │  5. collection  sequences, mappings      │
//!                    │  6. vector      [x, y, z] exact arity    │
//!                    │  7. record      field by field           │
//!                    └──────────────────────────────────────────┘
//! ```
//!
//! An `Option<T>` field has shape [`Shape::Optional`]: null means absent, and
//! any other node resolves against `T`'s shape.
//!
//! Each resolver is a stateless [`NodeResolver`]. Per-parse state (current
//! package, resources on the import path, node path for messages) travels in
//! an explicit [`ResolveContext`].
//!
//! ## Import Cycles
//!
//! Importing sets the target resource's in-use flag for the duration of the
//! nested parse, through a guard that restores it on every exit path. Reaching a
//! resource whose flag is already set is a circular import. A resource may be
//! imported again once an earlier import of it has finished.

mod error;
mod resolvers;
mod shape;

use std::fmt;

use serde_yaml::Value;

pub use error::{DeError, DeErrorKind};
pub use resolvers::{
    CollectionResolver, EnumResolver, ImportResolver, NullResolver, RecordResolver,
    ScalarResolver, VectorResolver,
};
pub use shape::{Field, Schema, Shape};

use crate::res::{Package, Resource};

// ── Resolve Context ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Saved position of the outer resource while an import is parsed.
struct Frame {
    resource: String,
    path: Vec<Segment>,
}

/// Per-parse state handed to every resolver.
#[derive(Debug)]
pub struct ResolveContext<'a> {
    package: Option<&'a Package>,
    resource: String,
    active: Vec<String>,
    path: Vec<Segment>,
}

impl<'a> ResolveContext<'a> {
    /// A context that resolves imports against `package`.
    pub fn new(package: &'a Package) -> Self {
        Self {
            package: Some(package),
            ..Self::detached()
        }
    }

    /// A context with no package: every import is a missing resource.
    pub fn detached() -> Self {
        Self {
            package: None,
            resource: "<input>".to_owned(),
            active: Vec::new(),
            path: Vec::new(),
        }
    }

    pub fn package(&self) -> Option<&'a Package> {
        self.package
    }

    /// Names of the resources currently being parsed, outermost first.
    pub fn active(&self) -> &[String] {
        &self.active
    }

    /// Current node path, e.g. `npc.properties[0].type`.
    pub fn path(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            match segment {
                Segment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                Segment::Index(i) => out.push_str(&format!("[{i}]")),
            }
        }
        out
    }

    /// Build an error located at the current node.
    pub fn error(&self, kind: DeErrorKind) -> DeError {
        DeError {
            resource: self.resource.clone(),
            path: self.path(),
            kind,
        }
    }

    /// Run `f` one mapping key deeper.
    pub fn at_key<R>(&mut self, key: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.path.push(Segment::Key(key.to_owned()));
        let result = f(self);
        self.path.pop();
        result
    }

    /// Run `f` one sequence index deeper.
    pub fn at_index<R>(&mut self, index: usize, f: impl FnOnce(&mut Self) -> R) -> R {
        self.path.push(Segment::Index(index));
        let result = f(self);
        self.path.pop();
        result
    }

    fn enter(&mut self, resource: &Resource) -> Frame {
        self.active.push(resource.name().to_owned());
        Frame {
            resource: std::mem::replace(&mut self.resource, resource.path().display().to_string()),
            path: std::mem::take(&mut self.path),
        }
    }

    fn leave(&mut self, frame: Frame) {
        self.active.pop();
        self.resource = frame.resource;
        self.path = frame.path;
    }
}

// ── Pipeline ────────────────────────────────────────────────────────────

/// One strategy for turning a node into a value of the expected shape.
pub trait NodeResolver {
    fn name(&self) -> &'static str;

    /// Resolve `node` as `shape`. `Ok(None)` passes the node to the next
    /// resolver; `Ok(Some(_))` and `Err(_)` end the search.
    fn resolve(
        &self,
        node: &Value,
        shape: &Shape,
        cx: &mut ResolveContext<'_>,
        pipeline: &Pipeline,
    ) -> Result<Option<Value>, DeError>;
}

/// An ordered chain of [`NodeResolver`]s.
pub struct Pipeline {
    resolvers: Vec<Box<dyn NodeResolver>>,
}

impl Pipeline {
    pub fn new(resolvers: Vec<Box<dyn NodeResolver>>) -> Self {
        Self { resolvers }
    }

    /// The full chain, in the order that gives imports, enums and vectors
    /// their special handling.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(NullResolver),
            Box::new(ImportResolver),
            Box::new(EnumResolver),
            Box::new(ScalarResolver),
            Box::new(CollectionResolver),
            Box::new(VectorResolver),
            Box::new(RecordResolver),
        ])
    }

    pub fn resolver_names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Resolve one node. The first resolver to claim it decides the result.
    pub fn resolve(
        &self,
        node: &Value,
        shape: &Shape,
        cx: &mut ResolveContext<'_>,
    ) -> Result<Value, DeError> {
        let node = match node {
            Value::Tagged(tagged) => &tagged.value,
            other => other,
        };
        if let Shape::Optional(inner) = shape
            && !node.is_null()
        {
            return self.resolve(node, inner, cx);
        }
        for resolver in &self.resolvers {
            if let Some(value) = resolver.resolve(node, shape, cx, self)? {
                return Ok(value);
            }
        }
        Err(cx.error(DeErrorKind::Mismatch {
            expected: shape.to_string(),
            found: node_kind(node),
        }))
    }

    /// Parse and resolve `text` as `T`.
    pub fn deserialize<T: Schema>(&self, cx: &mut ResolveContext<'_>, text: &str) -> Result<T, DeError> {
        let node = parse(text, cx)?;
        let value = self.resolve(&node, &T::shape(), cx)?;
        build(value, cx)
    }

    /// Parse and resolve a whole resource as `T`. The resource counts as in
    /// use while it is parsed, so it cannot import itself.
    pub fn deserialize_resource<T: Schema>(
        &self,
        cx: &mut ResolveContext<'_>,
        resource: &Resource,
    ) -> Result<T, DeError> {
        let _in_use = InUse::acquire(resource);
        let frame = cx.enter(resource);
        let result = match self.read(resource, &T::shape(), cx) {
            Ok(value) => build(value, cx),
            Err(e) => Err(e),
        };
        cx.leave(frame);
        result
    }

    /// Resolve the contents of `resource` in place of an import reference.
    pub(crate) fn import(
        &self,
        resource: &Resource,
        shape: &Shape,
        cx: &mut ResolveContext<'_>,
    ) -> Result<Value, DeError> {
        let _in_use = InUse::acquire(resource);
        let frame = cx.enter(resource);
        let result = self.read(resource, shape, cx);
        cx.leave(frame);
        result
    }

    fn read(&self, resource: &Resource, shape: &Shape, cx: &mut ResolveContext<'_>) -> Result<Value, DeError> {
        let text = resource.text().map_err(|_| cx.error(DeErrorKind::NotUtf8))?;
        let node = parse(text, cx)?;
        self.resolve(&node, shape, cx)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.resolver_names()).finish()
    }
}

/// Marks a resource in use for as long as it lives, then restores the
/// previous flag. Resources the loader reserved stay marked.
struct InUse<'r> {
    resource: &'r Resource,
    previous: bool,
}

impl<'r> InUse<'r> {
    fn acquire(resource: &'r Resource) -> Self {
        let previous = resource.in_use();
        resource.set_in_use(true);
        Self { resource, previous }
    }
}

impl Drop for InUse<'_> {
    fn drop(&mut self) {
        self.resource.set_in_use(self.previous);
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn parse(text: &str, cx: &ResolveContext<'_>) -> Result<Value, DeError> {
    serde_yaml::from_str(text).map_err(|e| cx.error(DeErrorKind::Syntax(e)))
}

fn build<T: Schema>(value: Value, cx: &ResolveContext<'_>) -> Result<T, DeError> {
    serde_yaml::from_value(value).map_err(|e| cx.error(DeErrorKind::Build(e)))
}

/// Text of a scalar node; `None` for null, sequences and mappings.
pub(crate) fn scalar_text(node: &Value) -> Option<String> {
    match node {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn node_kind(node: &Value) -> &'static str {
    match node {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
