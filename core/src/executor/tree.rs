use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};

use super::types::{KeyedChildren, NodeBehavior, NodeRef, TreeNode};

type CommitFn = Arc<dyn Fn(ChildSlots) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Default)]
struct Slots {
    delegate: RwLock<Option<NodeRef>>,
    children: RwLock<Option<KeyedChildren>>,
}

/// Shared handle to a [`TaskNode`]'s delegate and keyed children.
///
/// Handed to the commit callback so it can reveal children that only exist
/// once the node's work has resolved.
#[derive(Clone, Default)]
pub struct ChildSlots {
    inner: Arc<Slots>,
}

impl ChildSlots {
    pub fn set_delegate(&self, delegate: Option<NodeRef>) {
        *self
            .inner
            .delegate
            .write()
            .unwrap_or_else(PoisonError::into_inner) = delegate;
    }

    /// Inserts a child, creating the keyed map on first use. Re-using a key
    /// replaces the node in place.
    pub fn insert_child(&self, key: impl Into<String>, child: NodeRef) -> Option<NodeRef> {
        self.inner
            .children
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(KeyedChildren::new)
            .insert(key.into(), child)
    }

    /// Removes a child; the map stays in place even once it is empty.
    pub fn remove_child(&self, key: &str) -> Option<NodeRef> {
        self.inner
            .children
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
            .and_then(|children| children.shift_remove(key))
    }

    /// Replaces the whole keyed map; `None` drops it.
    pub fn set_children(&self, children: Option<KeyedChildren>) {
        *self
            .inner
            .children
            .write()
            .unwrap_or_else(PoisonError::into_inner) = children;
    }

    pub fn delegate(&self) -> Option<NodeRef> {
        self.inner
            .delegate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn keyed_children(&self) -> Option<KeyedChildren> {
        self.inner
            .children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// In-memory [`TreeNode`] for driving the scheduler without a host framework.
pub struct TaskNode {
    id: String,
    behavior: Option<NodeBehavior>,
    slots: ChildSlots,
    on_commit: Option<CommitFn>,
}

impl TaskNode {
    /// Pass-through node: no behavior attached.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            behavior: None,
            slots: ChildSlots::default(),
            on_commit: None,
        }
    }

    pub fn with_behavior(id: impl Into<String>, behavior: NodeBehavior) -> Self {
        Self {
            behavior: Some(behavior),
            ..Self::new(id)
        }
    }

    /// Runs `commit` every time the node is committed. Without one, commit
    /// completes immediately.
    pub fn on_commit<F, Fut>(mut self, commit: F) -> Self
    where
        F: Fn(ChildSlots) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_commit = Some(Arc::new(move |slots| commit(slots).boxed()));
        self
    }

    pub fn slots(&self) -> ChildSlots {
        self.slots.clone()
    }

    pub fn set_delegate(&self, delegate: Option<NodeRef>) {
        self.slots.set_delegate(delegate);
    }

    pub fn insert_child(&self, key: impl Into<String>, child: NodeRef) -> Option<NodeRef> {
        self.slots.insert_child(key, child)
    }

    pub fn remove_child(&self, key: &str) -> Option<NodeRef> {
        self.slots.remove_child(key)
    }

    pub fn set_children(&self, children: Option<KeyedChildren>) {
        self.slots.set_children(children);
    }

    pub fn into_ref(self) -> NodeRef {
        Arc::new(self)
    }
}

#[async_trait]
impl TreeNode for TaskNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn instance(&self) -> Option<&NodeBehavior> {
        self.behavior.as_ref()
    }

    async fn commit(&self) {
        if let Some(commit) = &self.on_commit {
            commit(self.slots.clone()).await;
        }
    }

    fn delegate(&self) -> Option<NodeRef> {
        self.slots.delegate()
    }

    fn keyed_children(&self) -> Option<KeyedChildren> {
        self.slots.keyed_children()
    }
}
