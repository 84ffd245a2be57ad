//! Top-down construction of the binary node tree.

use log::trace;

use crate::bvh::{joint_aabb_of_nodes, split, BuildNode, SplitStats, INVALID};
use crate::utils::to_u32;

/// A range of leaves waiting to become a subtree, together with the slot of its parent it
/// has to be linked into.
#[derive(Debug, Copy, Clone)]
struct Task {
    begin: usize,
    end: usize,
    parent: u32,
    is_left: bool,
}

/// Builds the subtree over the leaves `nodes[begin..end]` and returns the index of its root.
///
/// The leaves get reordered within the range by the split search. Internal nodes are
/// appended to `nodes` in pre-order, so the left subtree of a node is always allocated before
/// its right subtree. A single leaf is its own root and allocates nothing.
///
/// Once the tree is complete the children of every internal node are swapped so that the
/// child with the strictly larger surface area is `left`, and `parent` links are set.
///
/// The tree is built from an explicit worklist, so arbitrarily unbalanced inputs do not
/// grow the thread stack.
///
/// # Panics
///
/// Panics if the range is empty.
pub fn build_node_hierarchy(
    nodes: &mut Vec<BuildNode>,
    begin: usize,
    end: usize,
    sah_threshold: u32,
    stats: &mut SplitStats,
) -> usize {
    assert!(end > begin, "cannot build a hierarchy over an empty range");
    let first_internal = nodes.len();
    let mut root = begin;

    let mut tasks = vec![Task {
        begin,
        end,
        parent: INVALID,
        is_left: true,
    }];
    while let Some(task) = tasks.pop() {
        let index = if task.end - task.begin == 1 {
            task.begin
        } else {
            let bounds = joint_aabb_of_nodes(&nodes[task.begin..task.end]);
            let split = split(nodes, task.begin, task.end, &bounds, sah_threshold);
            stats.record(&split, task.end - task.begin);
            trace!(
                "Split [{}, {}) at {} along {} ({:?}).",
                task.begin,
                task.end,
                split.index,
                split.axis,
                split.strategy
            );

            let index = nodes.len();
            nodes.push(BuildNode::internal(&bounds));

            // Popped in reverse, so the left subtree is allocated first.
            tasks.push(Task {
                begin: split.index,
                end: task.end,
                parent: to_u32(index),
                is_left: false,
            });
            tasks.push(Task {
                begin: task.begin,
                end: split.index,
                parent: to_u32(index),
                is_left: true,
            });
            index
        };

        if task.parent == INVALID {
            root = index;
        } else if task.is_left {
            nodes[task.parent as usize].left = to_u32(index);
        } else {
            nodes[task.parent as usize].right = to_u32(index);
        }
    }

    for index in first_internal..nodes.len() {
        let (left, right) = (nodes[index].left as usize, nodes[index].right as usize);
        if nodes[right].surface_area() > nodes[left].surface_area() {
            nodes[index].left = to_u32(right);
            nodes[index].right = to_u32(left);
        }
        nodes[left].parent = to_u32(index);
        nodes[right].parent = to_u32(index);
    }

    root
}

/// Returns true if `nodes[root]` and everything below it is a well-formed subtree: every
/// internal node has two children pointing back at it, encloses their bounds and the larger
/// child is on the left.
#[cfg(test)]
pub(crate) fn is_consistent_subtree(nodes: &[BuildNode], root: usize) -> bool {
    use crate::aabb::Bounded;

    let mut stack = vec![root];
    while let Some(index) = stack.pop() {
        let node = &nodes[index];
        if node.is_leaf() {
            if node.left != INVALID || node.right != INVALID {
                return false;
            }
            continue;
        }
        let (left, right) = (node.left as usize, node.right as usize);
        if left >= nodes.len() || right >= nodes.len() || left == right {
            return false;
        }
        let aabb = node.aabb();
        for child in [left, right] {
            if nodes[child].parent as usize != index
                || !aabb.approx_contains_aabb_eps(&nodes[child].aabb(), f32::EPSILON)
            {
                return false;
            }
        }
        if nodes[right].surface_area() > nodes[left].surface_area() {
            return false;
        }
        stack.push(right);
        stack.push(left);
    }
    true
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::aabb::{Aabb, Bounded};
    use crate::bvh::hierarchy::is_consistent_subtree;
    use crate::bvh::{build_node_hierarchy, SplitStats, INVALID};
    use crate::testbase::{create_n_random_triangles, leaf_nodes, triangle_at};
    use nalgebra::Point3;
    use proptest::prelude::*;

    /// Collects the triangle indices of all leaves below `root`.
    fn collect_leaves(nodes: &[crate::bvh::BuildNode], root: usize) -> Vec<u32> {
        let mut leaves = Vec::new();
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            let node = &nodes[index];
            if node.is_leaf() {
                leaves.push(node.triangle_index);
            } else {
                stack.push(node.right as usize);
                stack.push(node.left as usize);
            }
        }
        leaves
    }

    #[test]
    fn test_three_far_apart_triangles() {
        let triangles = [
            triangle_at(Point3::new(-100.0, 0.0, 0.0), 0),
            triangle_at(Point3::new(0.0, 50.0, 0.0), 1),
            triangle_at(Point3::new(100.0, 0.0, 30.0), 2),
        ];
        let mut nodes = leaf_nodes(&triangles);
        let mut stats = SplitStats::default();

        let root = build_node_hierarchy(&mut nodes, 0, 3, 1_000, &mut stats);

        assert_eq!(nodes.len(), 5);
        assert_eq!(nodes.iter().filter(|node| node.is_leaf()).count(), 3);
        assert_eq!(root, 3);
        assert_eq!(nodes[root].parent, INVALID);
        assert_eq!(stats.sah_splits, 2);
        assert_eq!(stats.median_splits, 0);

        let expected = triangles
            .iter()
            .fold(Aabb::empty(), |aabb, triangle| aabb.join(&triangle.aabb()));
        assert_eq!(nodes[root].aabb(), expected);

        let (left, right) = (nodes[root].left as usize, nodes[root].right as usize);
        assert!(nodes[left].surface_area() >= nodes[right].surface_area());
        assert!(is_consistent_subtree(&nodes, root));
    }

    #[test]
    fn test_singleton_range_is_its_own_root() {
        let triangles = create_n_random_triangles(4, 5);
        let mut nodes = leaf_nodes(&triangles);
        let mut stats = SplitStats::default();

        let root = build_node_hierarchy(&mut nodes, 2, 3, 1_000, &mut stats);

        assert_eq!(root, 2);
        assert_eq!(nodes.len(), 4);
        assert_eq!(stats, SplitStats::default());
    }

    #[test]
    fn test_internal_nodes_allocated_in_pre_order() {
        let triangles = create_n_random_triangles(64, 11);
        let mut nodes = leaf_nodes(&triangles);
        let root = build_node_hierarchy(&mut nodes, 0, 64, 1_000, &mut SplitStats::default());

        // Every internal node is allocated after its parent.
        assert_eq!(root, 64);
        for (index, node) in nodes.iter().enumerate().skip(65) {
            assert!((node.parent as usize) < index);
        }
    }

    #[test]
    fn test_coincident_triangles_do_not_overflow_stack() {
        // Every median split peels off a single triangle, giving a chain of depth n - 1.
        let count = 5_000;
        let triangles = (0..count)
            .map(|i| triangle_at(Point3::new(0.0, 0.0, 0.0), i))
            .collect::<Vec<_>>();
        let mut nodes = leaf_nodes(&triangles);
        let mut stats = SplitStats::default();

        let root = build_node_hierarchy(&mut nodes, 0, count as usize, 0, &mut stats);

        assert_eq!(nodes.len(), 2 * count as usize - 1);
        assert_eq!(stats.median_splits, count as usize - 1);
        assert!(is_consistent_subtree(&nodes, root));
    }

    proptest! {
        // Test whether the tree references every triangle exactly once.
        #[test]
        fn test_complete_and_unique(seed in any::<u64>(),
                                    count in 1usize..200,
                                    sah_threshold in prop_oneof![Just(0u32), Just(16u32), Just(1_000u32)]) {
            let triangles = create_n_random_triangles(count, seed);
            let mut nodes = leaf_nodes(&triangles);
            let root = build_node_hierarchy(&mut nodes, 0, count, sah_threshold, &mut SplitStats::default());

            prop_assert_eq!(nodes.len(), 2 * count - 1);
            let leaves = collect_leaves(&nodes, root);
            prop_assert_eq!(leaves.len(), count);
            let unique = leaves.iter().copied().collect::<HashSet<_>>();
            prop_assert_eq!(unique, (0..count as u32).collect::<HashSet<_>>());
            prop_assert!(is_consistent_subtree(&nodes, root));
        }
    }
}
