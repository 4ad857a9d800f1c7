use super::types::{NodeRef, TreeNode};

/// Lists the nodes the scheduler recurses into after `node` committed.
///
/// A delegate that carries work is a child of its own and comes first. A
/// delegate without work is flattened: whenever it has a keyed map, even an
/// empty one, that map stands in for the node's keyed children. Keyed
/// children always follow in insertion order.
pub fn effective_children(node: &dyn TreeNode) -> Vec<NodeRef> {
    let mut children = Vec::new();

    let keyed = match node.delegate() {
        Some(delegate) if delegate.has_work() => {
            let keyed = node.keyed_children();
            children.push(delegate);
            keyed
        }
        Some(delegate) => delegate
            .keyed_children()
            .or_else(|| node.keyed_children()),
        None => node.keyed_children(),
    };

    if let Some(keyed) = keyed {
        children.extend(keyed.into_values());
    }
    children
}
