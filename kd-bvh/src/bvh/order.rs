// src/bvh/order.rs
use super::{HierarchyNode, NodeId};

/// Assigns depth-first, left-first visit orders and skip pointers.
///
/// A node's `next` is where traversal resumes when its subtree is
/// skipped: the right sibling for a left child, the parent's own `next`
/// for a right child, `None` past the end of the tree.
pub fn linearize(nodes: &mut [HierarchyNode], root: NodeId) -> u32 {
    let mut order = 0;
    let mut stack = vec![(root, None)];

    while let Some((id, skip)) = stack.pop() {
        let node = &mut nodes[id.index()];
        node.visit_order = Some(order);
        node.next = skip;
        order += 1;

        if let Some((left, right)) = node.children {
            // right is popped after the whole left subtree
            stack.push((right, skip));
            stack.push((left, Some(right)));
        }
    }
    order
}
