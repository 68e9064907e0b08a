//! Tracks which image each display target was most recently asked to show.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::trace;

use crate::domain::entities::{ImageKey, TargetId};

/// Most recent binding per display target.
///
/// Keyed by [`TargetId`] so the registry never keeps a UI element alive.
/// The UI layer calls [`TargetRegistry::release`] when it discards one.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    bindings: Mutex<HashMap<TargetId, ImageKey>>,
}

impl TargetRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `target` to `key`, replacing any previous binding.
    pub fn bind(&self, target: TargetId, key: ImageKey) {
        trace!(target = %target, key = %key, "Bound display target");
        self.bindings.lock().insert(target, key);
    }

    /// Returns true if `target` is no longer bound to `key`.
    ///
    /// Must be checked right before any paint: the binding can change while
    /// a fetch is in flight.
    pub fn is_stale(&self, target: TargetId, key: &ImageKey) -> bool {
        self.bindings.lock().get(&target) != Some(key)
    }

    /// Returns the key `target` is currently bound to.
    pub fn current(&self, target: TargetId) -> Option<ImageKey> {
        self.bindings.lock().get(&target).cloned()
    }

    /// Forgets `target`. Any in-flight result for it becomes stale.
    pub fn release(&self, target: TargetId) {
        if self.bindings.lock().remove(&target).is_some() {
            trace!(target = %target, "Released display target");
        }
    }

    /// Returns the number of bound targets.
    pub fn len(&self) -> usize {
        self.bindings.lock().len()
    }

    /// Returns true if no target is bound.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> ImageKey {
        ImageKey::parse(&format!("https://example.com/{name}.jpg")).unwrap()
    }

    #[test]
    fn test_unbound_target_is_stale() {
        let registry = TargetRegistry::new();
        assert!(registry.is_stale(TargetId::next(), &key("a")));
    }

    #[test]
    fn test_rebind_makes_previous_key_stale() {
        let registry = TargetRegistry::new();
        let target = TargetId::next();

        registry.bind(target, key("a"));
        assert!(!registry.is_stale(target, &key("a")));

        registry.bind(target, key("b"));
        assert!(registry.is_stale(target, &key("a")));
        assert!(!registry.is_stale(target, &key("b")));
        assert_eq!(registry.current(target), Some(key("b")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_targets_are_independent() {
        let registry = TargetRegistry::new();
        let first = TargetId::next();
        let second = TargetId::next();

        registry.bind(first, key("a"));
        registry.bind(second, key("a"));
        registry.bind(first, key("b"));

        assert!(!registry.is_stale(second, &key("a")));
    }

    #[test]
    fn test_release_drops_binding() {
        let registry = TargetRegistry::new();
        let target = TargetId::next();

        registry.bind(target, key("a"));
        registry.release(target);

        assert!(registry.is_stale(target, &key("a")));
        assert!(registry.is_empty());
    }
}
