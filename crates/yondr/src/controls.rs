//! Key → action bindings.
//!
//! Packages author controls as `action: [key, ...]`. The loader inverts that
//! into `(key, action)` pairs and hands them to a [`Controls`] sink. Input
//! handling itself happens elsewhere; [`KeyBindings`] is the plain table
//! implementation.

use indexmap::IndexMap;

/// Receives key bindings from loaded packages.
pub trait Controls {
    /// Bind `key` to `action`.
    fn bind(&mut self, key: &str, action: &str);

    /// The action bound to `key`, if any.
    fn action(&self, key: &str) -> Option<&str>;
}

/// Ordered key → action table. Rebinding a key keeps the latest action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyBindings {
    bindings: IndexMap<String, String>,
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// `(key, action)` pairs in first-bound order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(k, a)| (k.as_str(), a.as_str()))
    }
}

impl Controls for KeyBindings {
    fn bind(&mut self, key: &str, action: &str) {
        let key = key.trim();
        if let Some(old) = self.bindings.insert(key.to_owned(), action.to_owned()) {
            if old != action {
                log::warn!("Key '{key}' rebound from '{old}' to '{action}'.");
            }
        }
    }

    fn action(&self, key: &str) -> Option<&str> {
        self.bindings.get(key.trim()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_binding_wins() {
        let mut controls = KeyBindings::new();
        controls.bind("W", "forward");
        controls.bind("Space", "jump");
        controls.bind("W", "sprint");

        assert_eq!(controls.len(), 2);
        assert_eq!(controls.action("W"), Some("sprint"));
        assert_eq!(controls.action("Space"), Some("jump"));
        assert_eq!(controls.action("Q"), None);
        assert_eq!(controls.iter().next(), Some(("W", "sprint")));
    }
}
