//! # Values: Typed Property Contents
//!
//! A [`Value`] is the currency of the whole loader: property defaults, base
//! overrides and materialized entities are all lists of values. The set of
//! types is closed ([`ValueType`]), so every consumer matches exhaustively.
//!
//! ```text
//! ValueType   authored as            Value
//! ─────────   ────────────────────   ──────────────────────
//! number      10, "2.5"              Number(f64)
//! text        anything               Text(String)
//! boolean     true, "False"          Boolean(bool)
//! vec2..vec4  [1, 2, 3], "1, 2, 3"   Vec2/Vec3/Vec4 (glam)
//! ```
//!
//! Parsing never coerces across types: `"abc"` is not a number, `1` is not a
//! boolean, and `[1, 2]` is not a `vec3`. A mismatch yields `None` and the
//! caller decides whether that is a warning or an error.
//!
//! The glam vector types are re-exported so users don't need to depend on it
//! directly.

use std::fmt;

pub use glam::{Vec2, Vec3, Vec4};
use serde::Deserialize;

use crate::de::{Schema, Shape};

/// The type of a property. Names are matched case-insensitively in schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Number,
    Text,
    Boolean,
    Vec2,
    Vec3,
    Vec4,
}

impl ValueType {
    /// Every type, in declaration order.
    pub const ALL: [ValueType; 6] = [
        ValueType::Number,
        ValueType::Text,
        ValueType::Boolean,
        ValueType::Vec2,
        ValueType::Vec3,
        ValueType::Vec4,
    ];

    /// Authored names, matching the serde representation.
    pub const NAMES: &'static [&'static str] = &["number", "text", "boolean", "vec2", "vec3", "vec4"];

    pub fn name(self) -> &'static str {
        match self {
            ValueType::Number => "number",
            ValueType::Text => "text",
            ValueType::Boolean => "boolean",
            ValueType::Vec2 => "vec2",
            ValueType::Vec3 => "vec3",
            ValueType::Vec4 => "vec4",
        }
    }

    /// Component count for vector types, `None` otherwise.
    pub fn arity(self) -> Option<usize> {
        match self {
            ValueType::Vec2 => Some(2),
            ValueType::Vec3 => Some(3),
            ValueType::Vec4 => Some(4),
            ValueType::Number | ValueType::Text | ValueType::Boolean => None,
        }
    }

    /// The value a property of this type holds when no default is given.
    pub fn zero(self) -> Value {
        match self {
            ValueType::Number => Value::Number(0.0),
            ValueType::Text => Value::Text(String::new()),
            ValueType::Boolean => Value::Boolean(false),
            ValueType::Vec2 => Value::Vec2(Vec2::ZERO),
            ValueType::Vec3 => Value::Vec3(Vec3::ZERO),
            ValueType::Vec4 => Value::Vec4(Vec4::ZERO),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Schema for ValueType {
    fn shape() -> Shape {
        Shape::Enum(Self::NAMES)
    }
}

// ── Value ───────────────────────────────────────────────────────────────

/// A typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Boolean(bool),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl Value {
    /// Parse `text` as a value of type `ty`. Returns `None` on mismatch.
    pub fn from_string(ty: ValueType, text: &str) -> Option<Value> {
        match ty {
            ValueType::Number => parse_number(text).map(Value::Number),
            ValueType::Text => Some(Value::Text(text.to_owned())),
            ValueType::Boolean => parse_bool(text).map(Value::Boolean),
            ValueType::Vec2 | ValueType::Vec3 | ValueType::Vec4 => {
                let components = parse_components(text)?;
                Value::from_components(ty, &components)
            }
        }
    }

    /// Build a vector value from its components. `None` unless `ty` is a
    /// vector type with exactly `components.len()` components.
    pub fn from_components(ty: ValueType, components: &[f32]) -> Option<Value> {
        match (ty, components) {
            (ValueType::Vec2, &[x, y]) => Some(Value::Vec2(Vec2::new(x, y))),
            (ValueType::Vec3, &[x, y, z]) => Some(Value::Vec3(Vec3::new(x, y, z))),
            (ValueType::Vec4, &[x, y, z, w]) => Some(Value::Vec4(Vec4::new(x, y, z, w))),
            _ => None,
        }
    }

    /// Interpret an authored [`Literal`] as a value of type `ty`.
    pub fn from_literal(ty: ValueType, literal: &Literal) -> Option<Value> {
        match literal {
            Literal::Text(text) => Value::from_string(ty, text),
            Literal::Components(components) => Value::from_components(ty, components),
        }
    }

    pub fn ty(&self) -> ValueType {
        match self {
            Value::Number(_) => ValueType::Number,
            Value::Text(_) => ValueType::Text,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Vec2(_) => ValueType::Vec2,
            Value::Vec3(_) => ValueType::Vec3,
            Value::Vec4(_) => ValueType::Vec4,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// Canonical text form. Parsing it back with [`Value::from_string`] yields an
/// equal value.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Vec2(v) => write!(f, "[{}, {}]", v.x, v.y),
            Value::Vec3(v) => write!(f, "[{}, {}, {}]", v.x, v.y, v.z),
            Value::Vec4(v) => write!(f, "[{}, {}, {}, {}]", v.x, v.y, v.z, v.w),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec2> for Value {
    fn from(v: Vec2) -> Self {
        Value::Vec2(v)
    }
}

impl From<Vec3> for Value {
    fn from(v: Vec3) -> Self {
        Value::Vec3(v)
    }
}

impl From<Vec4> for Value {
    fn from(v: Vec4) -> Self {
        Value::Vec4(v)
    }
}

// ── Literal ─────────────────────────────────────────────────────────────

/// A value as authored, before the property type is known: either a scalar
/// (kept as text) or a flat list of numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Text(String),
    Components(Vec<f32>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(s) => f.write_str(s),
            Literal::Components(c) => write!(f, "{c:?}"),
        }
    }
}

impl Schema for Literal {
    fn shape() -> Shape {
        Shape::Literal
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Rust float syntax plus YAML's `.inf`, `-.inf` and `.nan` in any case.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    match text.to_ascii_lowercase().as_str() {
        ".inf" | "+.inf" => Some(f64::INFINITY),
        "-.inf" => Some(f64::NEG_INFINITY),
        ".nan" => Some(f64::NAN),
        _ => text.parse().ok(),
    }
}

/// Accepts `1, 2, 3`, `[1, 2, 3]`, `(1 2 3)`.
fn parse_components(text: &str) -> Option<Vec<f32>> {
    let text = text.trim();
    let inner = text
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .or_else(|| text.strip_prefix('(').and_then(|t| t.strip_suffix(')')))
        .unwrap_or(text);

    inner
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().ok())
        .collect()
}
