//! Name canonicalization.
//!
//! Authors spell the same name many ways: `Max Health`, `max-health`,
//! `maxHealth` and `MAX_HEALTH` all refer to one property. Every lookup key
//! (groups, properties, bases, packages, resources) goes through [`simplify`]
//! before it is stored or searched.

use heck::{ToLowerCamelCase, ToSnakeCase};

/// Canonical lookup form of a name: `snake_case`, surrounding whitespace dropped.
pub fn simplify(name: &str) -> String {
    name.trim().to_snake_case()
}

/// Human-facing form of a name, used by scripts and tooling: `lowerCamelCase`.
pub fn display_name(name: &str) -> String {
    name.trim().to_lower_camel_case()
}
