use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use super::behavior::NodeBehavior;

/// Shared handle to a node owned by the tree collaborator.
pub type NodeRef = Arc<dyn TreeNode>;

/// Insertion-ordered, uniquely keyed children of a node.
pub type KeyedChildren = IndexMap<String, NodeRef>;

/// A vertex of an externally-owned task tree.
///
/// The scheduler only reads the tree through this trait. It never mutates a
/// node and never holds on to one after the traversal call that reached it
/// returns.
#[async_trait]
pub trait TreeNode: Send + Sync {
    /// Label used in logs, events and errors. Not required to be unique.
    fn id(&self) -> &str;

    /// Capability bag attached to this node; `None` makes it a pass-through.
    fn instance(&self) -> Option<&NodeBehavior>;

    /// Finalizes the node after its work resolved.
    ///
    /// Precondition: the returned future always completes, exactly once per
    /// call. There is no failure channel and the scheduler applies no
    /// timeout; children are only read after it completes.
    async fn commit(&self) {}

    /// Single substituted child, when this node renders as another one.
    fn delegate(&self) -> Option<NodeRef>;

    /// Keyed children in insertion order.
    ///
    /// `None` means the node never had a keyed map. `Some` with an empty map
    /// is a map that exists but holds nothing, which still replaces the
    /// keyed children of a node delegating here.
    fn keyed_children(&self) -> Option<KeyedChildren>;

    fn has_work(&self) -> bool {
        self.instance().is_some_and(NodeBehavior::has_work)
    }
}
