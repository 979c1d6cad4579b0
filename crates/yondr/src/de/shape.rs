//! Run-time description of the type a node is resolved against.

use std::fmt;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::value::{Vec2, Vec3, Vec4};

/// The expected type of a YAML node.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Boolean,
    Number,
    Text,
    /// One of a fixed set of names, matched case-insensitively.
    Enum(&'static [&'static str]),
    /// A fixed-arity numeric vector, authored as a sequence.
    Vector(usize),
    /// A scalar kept as text, or a flat sequence of numbers.
    Literal,
    Seq(Box<Shape>),
    /// String-keyed mapping; authored key order is kept.
    Map(Box<Shape>),
    /// A record with hyphenated field names.
    Record(Vec<Field>),
    /// The inner shape, or an explicit null for "absent".
    Optional(Box<Shape>),
}

/// One field of a [`Shape::Record`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub shape: Shape,
}

impl Field {
    pub fn new(name: &'static str, shape: Shape) -> Self {
        Self { name, shape }
    }

    /// Field whose shape comes from a [`Schema`] type.
    pub fn of<T: Schema>(name: &'static str) -> Self {
        Self::new(name, T::shape())
    }
}

impl Shape {
    pub fn seq(inner: Shape) -> Self {
        Shape::Seq(Box::new(inner))
    }

    pub fn map(inner: Shape) -> Self {
        Shape::Map(Box::new(inner))
    }

    pub fn optional(inner: Shape) -> Self {
        Shape::Optional(Box::new(inner))
    }

    /// Shapes that accept an explicit null.
    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            Shape::Text
                | Shape::Literal
                | Shape::Seq(_)
                | Shape::Map(_)
                | Shape::Record(_)
                | Shape::Optional(_)
        )
    }

    /// Shapes a bare scalar may name a file for.
    pub fn is_reference(&self) -> bool {
        matches!(self, Shape::Seq(_) | Shape::Map(_) | Shape::Record(_))
    }

    /// Shapes whose values are written as a single scalar.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Shape::Boolean | Shape::Number | Shape::Text | Shape::Enum(_))
    }

    /// The value an explicit null stands for.
    pub(crate) fn empty(&self) -> serde_yaml::Value {
        use serde_yaml::Value;
        match self {
            Shape::Text => Value::String(String::new()),
            Shape::Seq(_) => Value::Sequence(Vec::new()),
            Shape::Map(_) | Shape::Record(_) => Value::Mapping(serde_yaml::Mapping::new()),
            _ => Value::Null,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Boolean => f.write_str("boolean"),
            Shape::Number => f.write_str("number"),
            Shape::Text => f.write_str("text"),
            Shape::Enum(members) => write!(f, "one of [{}]", members.join(", ")),
            Shape::Vector(n) => write!(f, "{n}-component vector"),
            Shape::Literal => f.write_str("scalar or number list"),
            Shape::Seq(inner) => write!(f, "sequence of {inner}"),
            Shape::Map(inner) => write!(f, "mapping to {inner}"),
            Shape::Optional(inner) => write!(f, "optional {inner}"),
            Shape::Record(fields) => {
                let names: Vec<&str> = fields.iter().map(|field| field.name).collect();
                write!(f, "record {{{}}}", names.join(", "))
            }
        }
    }
}

// ── Schema ──────────────────────────────────────────────────────────────

/// A type the pipeline can produce: it describes its [`Shape`], and serde
/// builds it from the resolved node.
pub trait Schema: DeserializeOwned {
    fn shape() -> Shape;
}

impl Schema for bool {
    fn shape() -> Shape {
        Shape::Boolean
    }
}

impl Schema for f64 {
    fn shape() -> Shape {
        Shape::Number
    }
}

impl Schema for f32 {
    fn shape() -> Shape {
        Shape::Number
    }
}

impl Schema for String {
    fn shape() -> Shape {
        Shape::Text
    }
}

impl Schema for Vec2 {
    fn shape() -> Shape {
        Shape::Vector(2)
    }
}

impl Schema for Vec3 {
    fn shape() -> Shape {
        Shape::Vector(3)
    }
}

impl Schema for Vec4 {
    fn shape() -> Shape {
        Shape::Vector(4)
    }
}

impl<T: Schema> Schema for Option<T> {
    fn shape() -> Shape {
        Shape::optional(T::shape())
    }
}

impl<T: Schema> Schema for Vec<T> {
    fn shape() -> Shape {
        Shape::seq(T::shape())
    }
}

impl<T: Schema> Schema for IndexMap<String, T> {
    fn shape() -> Shape {
        Shape::map(T::shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_shapes_nest() {
        let shape = <IndexMap<String, Vec<String>>>::shape();
        assert_eq!(shape, Shape::map(Shape::seq(Shape::Text)));
        assert_eq!(shape.to_string(), "mapping to sequence of text");
        assert!(shape.is_reference());
        assert!(!Shape::Vector(3).is_reference());
        assert!(Shape::Text.is_nullable() && !Shape::Number.is_nullable());
    }

    #[test]
    fn option_wraps_any_shape_as_nullable() {
        let shape = <Option<f64>>::shape();
        assert_eq!(shape, Shape::optional(Shape::Number));
        assert_eq!(shape.to_string(), "optional number");
        assert!(shape.is_nullable());
        assert_eq!(shape.empty(), serde_yaml::Value::Null);
    }
}
