//! Node kind registry.
//!
//! A [`SerializationContext`](super::SerializationContext) may carry a
//! registry of the node kinds the runtime knows how to execute. Restoring a
//! description that mentions any other kind then fails up front instead of
//! producing a model the runtime cannot run.

use indexmap::IndexSet;

#[derive(Debug, Clone, Default)]
pub struct NodeKindRegistry {
    kinds: IndexSet<String>,
}

impl NodeKindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a kind. Returns `false` if it was already registered.
    pub fn register(&mut self, kind: impl Into<String>) -> bool {
        self.kinds.insert(kind.into())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains(kind)
    }

    /// Registered kinds in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for NodeKindRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            kinds: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_tracks_kinds() {
        let mut registry: NodeKindRegistry = ["Input", "Sum"].into_iter().collect();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("Sum"));
        assert!(!registry.contains("Delay"));

        assert!(registry.register("Delay"));
        assert!(!registry.register("Sum"));
        assert_eq!(registry.kinds().collect::<Vec<_>>(), vec!["Input", "Sum", "Delay"]);
    }
}
