//! Depth-first linearization with skip pointers.
//!
//! After linearization the nodes are laid out in pre-order. The first child of an internal
//! node is the node directly behind it, and every node carries a `next` index: the node to
//! continue with once its subtree has been visited or skipped. A traversal therefore needs
//! a single cursor instead of a stack:
//!
//! ```text
//! cursor = 0
//! while cursor != INVALID:
//!     if nodes[cursor] is internal and worth entering: cursor += 1
//!     else:                                             cursor = nodes[cursor].next
//! ```

use crate::bvh::{BuildNode, BvhNode, INVALID};
use crate::utils::to_u32;

/// Assigns the pre-order `visit_order` and the `next` skip pointer of every node of the
/// subtree rooted at `nodes[root]`, and returns the depth of its deepest node.
///
/// The left child of a node continues with its right sibling, the right child with
/// whatever its parent continues with, and the root ends the traversal. `next` still refers
/// to working-array indices, [`reorder_by_visit_order`] translates it.
///
/// [`reorder_by_visit_order`]: fn.reorder_by_visit_order.html
pub fn set_depth_first_visit_order(nodes: &mut [BuildNode], root: usize) -> usize {
    let mut visit_order = 0;
    let mut max_depth = 0;

    let mut stack = vec![(root, INVALID, 0)];
    while let Some((index, next, depth)) = stack.pop() {
        let node = &mut nodes[index];
        node.visit_order = visit_order;
        node.next = next;
        visit_order += 1;
        max_depth = max_depth.max(depth);

        if !node.is_leaf() {
            let (left, right) = (node.left, node.right);
            stack.push((right as usize, next, depth + 1));
            stack.push((left as usize, right, depth + 1));
        }
    }

    max_depth
}

/// Writes all nodes which have been given a visit order into a new array in that order,
/// translating their `next` pointers into the same index space.
///
/// # Examples
/// ```
/// use nalgebra::Point3;
/// use stackless_bvh::bvh::{
///     build_node_hierarchy, reorder_by_visit_order, set_depth_first_visit_order, BuildNode,
///     SplitStats, INVALID,
/// };
/// use stackless_bvh::triangle::FastTriangle;
///
/// let mut nodes = (0..4)
///     .map(|i| {
///         let x = 10.0 * i as f32;
///         let triangle = FastTriangle::new(
///             Point3::new(x, 0.0, 0.0),
///             Point3::new(x + 1.0, 0.0, 0.0),
///             Point3::new(x, 1.0, 0.0),
///             [0, 1, 2],
///             0,
///         );
///         BuildNode::leaf(i, &triangle)
///     })
///     .collect::<Vec<_>>();
/// let root = build_node_hierarchy(&mut nodes, 0, 4, 1000, &mut SplitStats::default());
/// set_depth_first_visit_order(&mut nodes, root);
/// let linear = reorder_by_visit_order(&nodes);
///
/// assert_eq!(linear.len(), 7);
/// assert!(!linear[0].is_leaf());
/// assert_eq!(linear[0].next, INVALID);
/// ```
pub fn reorder_by_visit_order(nodes: &[BuildNode]) -> Vec<BvhNode> {
    let mut order = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.visit_order != INVALID)
        .map(|(index, node)| (node.visit_order, index))
        .collect::<Vec<_>>();
    order.sort_unstable();
    debug_assert!(order
        .iter()
        .enumerate()
        .all(|(position, &(visit_order, _))| visit_order == to_u32(position)));

    order
        .into_iter()
        .map(|(_, index)| {
            let node = &nodes[index];
            let next = if node.next == INVALID {
                INVALID
            } else {
                nodes[node.next as usize].visit_order
            };
            node.to_bvh_node(next)
        })
        .collect()
}
