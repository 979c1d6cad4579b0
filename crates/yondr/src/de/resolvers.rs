//! The standard resolvers, in pipeline order.

use std::path::Path;

use serde_yaml::{Mapping, Number, Value};

use super::{DeError, DeErrorKind, NodeResolver, Pipeline, ResolveContext, Shape, node_kind, scalar_text};
use crate::naming::simplify;
use crate::res::ResourceKind;
use crate::value::{parse_bool, parse_number};

// ── 1. Null ─────────────────────────────────────────────────────────────

/// `~`, `null` and empty values become the empty value of nullable shapes.
pub struct NullResolver;

impl NodeResolver for NullResolver {
    fn name(&self) -> &'static str {
        "null"
    }

    fn resolve(
        &self,
        node: &Value,
        shape: &Shape,
        _cx: &mut ResolveContext<'_>,
        _pipeline: &Pipeline,
    ) -> Result<Option<Value>, DeError> {
        if node.is_null() && shape.is_nullable() {
            Ok(Some(shape.empty()))
        } else {
            Ok(None)
        }
    }
}

// ── 2. Import ───────────────────────────────────────────────────────────

/// A bare scalar where a sequence, mapping or record is expected names a
/// schema resource in the current package, whose contents are used instead.
///
/// Sequences of primitives are the exception: there a scalar is shorthand
/// for a one-element sequence.
pub struct ImportResolver;

impl NodeResolver for ImportResolver {
    fn name(&self) -> &'static str {
        "import"
    }

    fn resolve(
        &self,
        node: &Value,
        shape: &Shape,
        cx: &mut ResolveContext<'_>,
        pipeline: &Pipeline,
    ) -> Result<Option<Value>, DeError> {
        if !shape.is_reference() {
            return Ok(None);
        }
        let Some(reference) = scalar_text(node) else {
            return Ok(None);
        };

        if let Shape::Seq(inner) = shape {
            if inner.is_primitive() {
                let item = cx.at_index(0, |cx| pipeline.resolve(node, inner, cx))?;
                return Ok(Some(Value::Sequence(vec![item])));
            }
        }

        let stem = Path::new(&reference)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&reference);
        let name = simplify(stem);

        let Some(resource) = cx.package().and_then(|p| p.resource(&name)) else {
            return Err(cx.error(DeErrorKind::MissingResource { name }));
        };
        if resource.kind() != ResourceKind::Schema {
            return Err(cx.error(DeErrorKind::NotSchema {
                name,
                kind: resource.kind(),
            }));
        }
        if resource.in_use() {
            let mut chain = cx.active().to_vec();
            chain.push(name.clone());
            return Err(cx.error(DeErrorKind::CircularImport {
                name,
                chain: chain.join(" -> "),
            }));
        }

        log::debug!("Importing {} as {shape}.", resource.path().display());
        pipeline.import(resource, shape, cx).map(Some)
    }
}

// ── 3. Enum ─────────────────────────────────────────────────────────────

/// Enum members match regardless of case and resolve to their canonical name.
pub struct EnumResolver;

impl NodeResolver for EnumResolver {
    fn name(&self) -> &'static str {
        "enum"
    }

    fn resolve(
        &self,
        node: &Value,
        shape: &Shape,
        cx: &mut ResolveContext<'_>,
        _pipeline: &Pipeline,
    ) -> Result<Option<Value>, DeError> {
        let Shape::Enum(members) = shape else {
            return Ok(None);
        };
        let Some(text) = scalar_text(node) else {
            return Ok(None);
        };

        match members.iter().find(|m| m.eq_ignore_ascii_case(text.trim())) {
            Some(member) => Ok(Some(Value::String((*member).to_owned()))),
            None => Err(cx.error(DeErrorKind::UnknownVariant {
                value: text,
                expected: members.join(", "),
            })),
        }
    }
}

// ── 4. Scalar ───────────────────────────────────────────────────────────

/// Booleans, numbers and text. Numbers and booleans written as strings are
/// parsed; text accepts any scalar. Literal scalars are kept as text.
pub struct ScalarResolver;

impl NodeResolver for ScalarResolver {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn resolve(
        &self,
        node: &Value,
        shape: &Shape,
        cx: &mut ResolveContext<'_>,
        _pipeline: &Pipeline,
    ) -> Result<Option<Value>, DeError> {
        let Some(text) = scalar_text(node) else {
            return Ok(None);
        };

        let value = match (shape, node) {
            (Shape::Text | Shape::Literal, _) => Value::String(text),
            (Shape::Boolean, Value::Bool(_)) => node.clone(),
            (Shape::Boolean, Value::String(s)) => match parse_bool(s) {
                Some(b) => Value::Bool(b),
                None => return Err(invalid(cx, "boolean", text)),
            },
            (Shape::Boolean, _) => return Err(invalid(cx, "boolean", text)),
            (Shape::Number, Value::Number(_)) => node.clone(),
            (Shape::Number, Value::String(s)) => match parse_number(s) {
                Some(n) => Value::Number(Number::from(n)),
                None => return Err(invalid(cx, "number", text)),
            },
            (Shape::Number, _) => return Err(invalid(cx, "number", text)),
            _ => return Ok(None),
        };
        Ok(Some(value))
    }
}

fn invalid(cx: &ResolveContext<'_>, expected: &'static str, value: String) -> DeError {
    cx.error(DeErrorKind::InvalidScalar { expected, value })
}

// ── 5. Collection ───────────────────────────────────────────────────────

/// Homogeneous sequences and string-keyed mappings, element by element.
/// Literal sequences resolve to lists of numbers.
pub struct CollectionResolver;

impl NodeResolver for CollectionResolver {
    fn name(&self) -> &'static str {
        "collection"
    }

    fn resolve(
        &self,
        node: &Value,
        shape: &Shape,
        cx: &mut ResolveContext<'_>,
        pipeline: &Pipeline,
    ) -> Result<Option<Value>, DeError> {
        match (shape, node) {
            (Shape::Seq(inner), Value::Sequence(items)) => {
                resolve_items(items, inner, cx, pipeline).map(Some)
            }
            (Shape::Literal, Value::Sequence(items)) => {
                resolve_items(items, &Shape::Number, cx, pipeline).map(Some)
            }
            (Shape::Map(inner), Value::Mapping(map)) => {
                let mut out = Mapping::with_capacity(map.len());
                for (key, value) in map {
                    let Some(key) = scalar_text(key) else {
                        return Err(cx.error(DeErrorKind::NonScalarKey));
                    };
                    let resolved = cx.at_key(&key, |cx| pipeline.resolve(value, inner, cx))?;
                    out.insert(Value::String(key), resolved);
                }
                Ok(Some(Value::Mapping(out)))
            }
            _ => Ok(None),
        }
    }
}

fn resolve_items(
    items: &[Value],
    shape: &Shape,
    cx: &mut ResolveContext<'_>,
    pipeline: &Pipeline,
) -> Result<Value, DeError> {
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        out.push(cx.at_index(i, |cx| pipeline.resolve(item, shape, cx))?);
    }
    Ok(Value::Sequence(out))
}

// ── 6. Vector ───────────────────────────────────────────────────────────

/// Fixed-arity vectors: a sequence of exactly N numbers. Any other length is
/// an error, never truncated or padded.
pub struct VectorResolver;

impl NodeResolver for VectorResolver {
    fn name(&self) -> &'static str {
        "vector"
    }

    fn resolve(
        &self,
        node: &Value,
        shape: &Shape,
        cx: &mut ResolveContext<'_>,
        pipeline: &Pipeline,
    ) -> Result<Option<Value>, DeError> {
        let Shape::Vector(arity) = *shape else {
            return Ok(None);
        };
        let Value::Sequence(items) = node else {
            return Ok(None);
        };
        if items.len() != arity {
            return Err(cx.error(DeErrorKind::VectorArity {
                expected: arity,
                found: items.len(),
            }));
        }
        resolve_items(items, &Shape::Number, cx, pipeline).map(Some)
    }
}

// ── 7. Record ───────────────────────────────────────────────────────────

/// Records, field by field. Keys must name a declared field; absent fields
/// are left for serde defaults.
pub struct RecordResolver;

impl NodeResolver for RecordResolver {
    fn name(&self) -> &'static str {
        "record"
    }

    fn resolve(
        &self,
        node: &Value,
        shape: &Shape,
        cx: &mut ResolveContext<'_>,
        pipeline: &Pipeline,
    ) -> Result<Option<Value>, DeError> {
        let Shape::Record(fields) = shape else {
            return Ok(None);
        };
        let Value::Mapping(map) = node else {
            return Err(cx.error(DeErrorKind::Mismatch {
                expected: shape.to_string(),
                found: node_kind(node),
            }));
        };

        let mut out = Mapping::with_capacity(map.len());
        for (key, value) in map {
            let Some(key) = scalar_text(key) else {
                return Err(cx.error(DeErrorKind::NonScalarKey));
            };
            let Some(field) = fields.iter().find(|f| f.name == key) else {
                let expected: Vec<&str> = fields.iter().map(|f| f.name).collect();
                return Err(cx.error(DeErrorKind::UnknownField {
                    field: key,
                    expected: expected.join(", "),
                }));
            };
            let resolved = cx.at_key(&key, |cx| pipeline.resolve(value, &field.shape, cx))?;
            out.insert(Value::String(key), resolved);
        }
        Ok(Some(Value::Mapping(out)))
    }
}
