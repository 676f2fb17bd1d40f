//! Serialization Context
//!
//! Restoring a model happens in two passes: every persisted node is first
//! registered under a freshly allocated live id, then every node resolves its
//! recorded parent ids through that mapping. The mapping lives in a
//! [`ModelSerializationContext`] frame.
//!
//! # Implementation
//!
//! Frames are kept on a stack inside the outer [`SerializationContext`].
//! Starting a model restoration pushes a frame and hands back a
//! [`ModelScope`] guard; dropping the guard pops it. Only the innermost
//! frame is ever consulted, so a model restored while another restoration
//! is in progress cannot see, or pollute, the outer mapping.
//!
//! The guard dereferences to the outer context, which is how a nested
//! restoration pushes its own frame. Because that goes through a mutable
//! borrow of the guard, frames can only ever be popped in the order they
//! were pushed.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;

use super::registry::NodeKindRegistry;
use crate::error::{ModelError, Result};
use crate::graph::NodeId;

/// Outer context shared by every restoration in one decoding pass.
#[derive(Debug, Default)]
pub struct SerializationContext {
    /// Kinds accepted on restore. `None` accepts every kind.
    registry: Option<NodeKindRegistry>,

    scopes: Vec<ModelSerializationContext>,
}

impl SerializationContext {
    /// Create a context that accepts every node kind.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context that rejects node kinds missing from `registry`.
    pub fn with_registry(registry: NodeKindRegistry) -> Self {
        Self {
            registry: Some(registry),
            scopes: Vec::new(),
        }
    }

    /// The kind registry restorations are checked against, if any.
    pub fn registry(&self) -> Option<&NodeKindRegistry> {
        self.registry.as_ref()
    }

    /// Number of model scopes currently open.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// The innermost open frame, if any.
    pub fn current(&self) -> Option<&ModelSerializationContext> {
        self.scopes.last()
    }

    /// Open a new id-remapping frame for one model restoration.
    ///
    /// The frame is closed automatically when the returned guard is dropped.
    pub fn push_model_scope(&mut self) -> ModelScope<'_> {
        self.scopes.push(ModelSerializationContext::default());
        let depth = self.scopes.len();
        tracing::trace!(depth, "opened model serialization scope");
        ModelScope {
            context: self,
            depth,
        }
    }
}

/// Maps the ids recorded in a model description to the live ids of the
/// nodes rebuilt from it.
#[derive(Debug, Default, Clone)]
pub struct ModelSerializationContext {
    old_to_new: IndexMap<NodeId, NodeId>,

    /// Reverse of `old_to_new`.
    new_to_old: HashMap<NodeId, NodeId>,
}

impl ModelSerializationContext {
    /// Record that the node persisted as `old_id` now lives at `new_id`.
    pub fn register(&mut self, old_id: NodeId, new_id: NodeId) -> Result<()> {
        if self.old_to_new.contains_key(&old_id) {
            return Err(ModelError::DuplicateNode(old_id));
        }
        self.old_to_new.insert(old_id, new_id);
        self.new_to_old.insert(new_id, old_id);
        Ok(())
    }

    /// Look up the live id registered for `old_id`.
    pub fn get(&self, old_id: NodeId) -> Option<NodeId> {
        self.old_to_new.get(&old_id).copied()
    }

    /// Resolve a parent id recorded by the node persisted as `referrer`.
    ///
    /// An id that was never registered is a dangling reference.
    pub fn resolve(&self, referrer: NodeId, old_id: NodeId) -> Result<NodeId> {
        self.get(old_id).ok_or(ModelError::DanglingReference {
            node: referrer,
            parent: old_id,
        })
    }

    /// Reverse lookup: the persisted id of the node now living at `new_id`.
    pub fn persisted_id(&self, new_id: NodeId) -> Option<NodeId> {
        self.new_to_old.get(&new_id).copied()
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.old_to_new.len()
    }

    pub fn is_empty(&self) -> bool {
        self.old_to_new.is_empty()
    }
}

/// Guard for an open [`ModelSerializationContext`] frame.
pub struct ModelScope<'a> {
    context: &'a mut SerializationContext,
    depth: usize,
}

impl ModelScope<'_> {
    /// The frame owned by this scope.
    pub fn frame(&self) -> &ModelSerializationContext {
        &self.context.scopes[self.depth - 1]
    }

    /// Mutable access to the frame owned by this scope.
    pub fn frame_mut(&mut self) -> &mut ModelSerializationContext {
        &mut self.context.scopes[self.depth - 1]
    }

    /// Shorthand for `frame_mut().register(..)`.
    pub fn register(&mut self, old_id: NodeId, new_id: NodeId) -> Result<()> {
        self.frame_mut().register(old_id, new_id)
    }
}

impl Deref for ModelScope<'_> {
    type Target = SerializationContext;

    fn deref(&self) -> &SerializationContext {
        &*self.context
    }
}

impl DerefMut for ModelScope<'_> {
    fn deref_mut(&mut self) -> &mut SerializationContext {
        &mut *self.context
    }
}

impl Drop for ModelScope<'_> {
    fn drop(&mut self) {
        // Verify we're popping our own frame.
        debug_assert_eq!(
            self.context.scopes.len(),
            self.depth,
            "ModelScope mismatch: expected depth {}, got {}",
            self.depth,
            self.context.scopes.len()
        );
        self.context.scopes.pop();
        tracing::trace!(depth = self.depth, "closed model serialization scope");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_is_popped_on_drop() {
        let mut context = SerializationContext::new();
        assert_eq!(context.depth(), 0);
        assert!(context.current().is_none());

        {
            let mut scope = context.push_model_scope();
            scope.register(NodeId::from(5), NodeId::from(0)).unwrap();
            assert_eq!(scope.depth(), 1);
            assert_eq!(scope.frame().get(NodeId::from(5)), Some(NodeId::from(0)));
        }

        // Context should be cleaned up after drop
        assert_eq!(context.depth(), 0);
        assert!(context.current().is_none());
    }

    #[test]
    fn nested_scopes_do_not_share_mappings() {
        let mut context = SerializationContext::new();
        let mut outer = context.push_model_scope();
        outer.register(NodeId::from(1), NodeId::from(100)).unwrap();

        {
            let mut inner = outer.push_model_scope();
            assert_eq!(inner.depth(), 2);
            assert!(inner.frame().get(NodeId::from(1)).is_none());

            inner.register(NodeId::from(1), NodeId::from(200)).unwrap();
            assert_eq!(
                inner.frame().resolve(NodeId::from(9), NodeId::from(1)).unwrap(),
                NodeId::from(200)
            );
        }

        // After inner scope drops, outer mapping is current and untouched
        assert_eq!(outer.depth(), 1);
        assert_eq!(outer.frame().get(NodeId::from(1)), Some(NodeId::from(100)));
        assert_eq!(outer.frame().len(), 1);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut frame = ModelSerializationContext::default();
        frame.register(NodeId::from(3), NodeId::from(0)).unwrap();

        let err = frame.register(NodeId::from(3), NodeId::from(1)).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateNode(id) if id == NodeId::from(3)));
        assert_eq!(frame.get(NodeId::from(3)), Some(NodeId::from(0)));
    }

    #[test]
    fn unregistered_ids_do_not_resolve() {
        let frame = ModelSerializationContext::default();
        assert!(frame.is_empty());
        assert!(frame.get(NodeId::from(8)).is_none());

        let err = frame.resolve(NodeId::from(2), NodeId::from(8)).unwrap_err();
        assert!(matches!(
            err,
            ModelError::DanglingReference { node, parent }
                if node == NodeId::from(2) && parent == NodeId::from(8)
        ));
    }

    #[test]
    fn persisted_id_reverses_mapping() {
        let mut frame = ModelSerializationContext::default();
        frame.register(NodeId::from(40), NodeId::from(2)).unwrap();
        assert_eq!(frame.persisted_id(NodeId::from(2)), Some(NodeId::from(40)));
        assert_eq!(frame.persisted_id(NodeId::from(3)), None);
    }

    #[test]
    fn reverse_lookup_scales_with_large_frames() {
        let mut frame = ModelSerializationContext::default();
        for i in 0..50_000u64 {
            frame.register(NodeId::from(i * 3), NodeId::from(i)).unwrap();
        }

        assert_eq!(frame.len(), 50_000);
        assert_eq!(frame.persisted_id(NodeId::from(49_999)), Some(NodeId::from(149_997)));
        assert_eq!(frame.persisted_id(NodeId::from(0)), Some(NodeId::from(0)));
        assert_eq!(frame.persisted_id(NodeId::from(50_000)), None);
    }
}
