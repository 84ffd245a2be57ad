//! Partitioning of a node range into two non-empty halves.

use std::cmp::Ordering;

use crate::aabb::{Aabb, Bounded};
use crate::axis::Axis;
use crate::bvh::BuildNode;

/// How a range of primitives gets split.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SplitStrategy {
    /// Exhaustive surface area heuristic over all three axes, `O(n log n)` per range.
    SurfaceAreaHeuristic,

    /// Split at the spatial median of the longest axis.
    Median,
}

impl SplitStrategy {
    /// Picks the strategy for a range of `count` primitives.
    ///
    /// # Examples
    /// ```
    /// use stackless_bvh::bvh::SplitStrategy;
    ///
    /// assert_eq!(SplitStrategy::for_count(1000, 1000), SplitStrategy::SurfaceAreaHeuristic);
    /// assert_eq!(SplitStrategy::for_count(1001, 1000), SplitStrategy::Median);
    /// ```
    pub fn for_count(count: usize, sah_threshold: u32) -> SplitStrategy {
        if count <= sah_threshold as usize {
            SplitStrategy::SurfaceAreaHeuristic
        } else {
            SplitStrategy::Median
        }
    }
}

/// Outcome of [`split`].
///
/// [`split`]: fn.split.html
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Split {
    /// First index of the right half. Always strictly inside `(begin, end)`.
    pub index: usize,

    /// The strategy which chose `index`.
    pub strategy: SplitStrategy,

    /// The axis the range is now sorted by.
    pub axis: Axis,
}

/// Orders nodes by their center on `axis`. Ties are broken by triangle index, so the
/// resulting order does not depend on the order the nodes came in.
fn compare_centers(a: &BuildNode, b: &BuildNode, axis: Axis) -> Ordering {
    a.bbox_center[axis]
        .total_cmp(&b.bbox_center[axis])
        .then(a.triangle_index.cmp(&b.triangle_index))
}

fn sort_by_center(range: &mut [BuildNode], axis: Axis) {
    range.sort_unstable_by(|a, b| compare_centers(a, b, axis));
}

/// Reorders `nodes[begin..end]` and returns where to split it.
///
/// Ranges with at most `sah_threshold` nodes are split with the surface area heuristic,
/// larger ranges at the spatial median of the longest axis of `bounds`, which must be the
/// joint bounds of the range. The returned index is always strictly inside `(begin, end)`,
/// so both halves are non-empty even for degenerate input.
///
/// # Panics
///
/// Panics if the range holds fewer than two nodes.
///
/// # Examples
/// ```
/// use nalgebra::Point3;
/// use stackless_bvh::bvh::{joint_aabb_of_nodes, split, BuildNode, SplitStrategy};
/// use stackless_bvh::triangle::FastTriangle;
///
/// let mut nodes = [40.0, 0.0, 41.0, 1.0]
///     .iter()
///     .enumerate()
///     .map(|(i, &x)| {
///         let triangle = FastTriangle::new(
///             Point3::new(x, 0.0, 0.0),
///             Point3::new(x + 0.5, 0.0, 0.0),
///             Point3::new(x, 0.5, 0.0),
///             [0, 1, 2],
///             0,
///         );
///         BuildNode::leaf(i as u32, &triangle)
///     })
///     .collect::<Vec<_>>();
///
/// let bounds = joint_aabb_of_nodes(&nodes);
/// let split = split(&mut nodes, 0, 4, &bounds, 1000);
///
/// assert_eq!(split.index, 2);
/// assert_eq!(split.strategy, SplitStrategy::SurfaceAreaHeuristic);
/// assert!(nodes[..2].iter().all(|node| node.bbox_center.x < 2.0));
/// ```
pub fn split(
    nodes: &mut [BuildNode],
    begin: usize,
    end: usize,
    bounds: &Aabb,
    sah_threshold: u32,
) -> Split {
    assert!(
        end > begin + 1,
        "cannot split the range [{}, {}) into two non-empty halves",
        begin,
        end
    );
    let range = &mut nodes[begin..end];
    let (mid, strategy, axis) = match SplitStrategy::for_count(range.len(), sah_threshold) {
        SplitStrategy::SurfaceAreaHeuristic => {
            let (mid, axis) = split_sah(range);
            (mid, SplitStrategy::SurfaceAreaHeuristic, axis)
        }
        SplitStrategy::Median => {
            let (mid, axis) = split_median(range, bounds);
            (mid, SplitStrategy::Median, axis)
        }
    };
    debug_assert!(mid > 0 && mid < range.len());
    Split {
        index: begin + mid,
        strategy,
        axis,
    }
}

/// Surface area heuristic over all axes. Returns the split relative to `range` and the
/// winning axis, leaving `range` sorted by it.
fn split_sah(range: &mut [BuildNode]) -> (usize, Axis) {
    let count = range.len();

    // If no axis yields a finite cost the first candidate on the first axis is used.
    let mut global_best_split = 1;
    let mut global_best_cost = f32::INFINITY;
    let mut best_axis = Axis::X;

    for axis in Axis::ALL {
        sort_by_center(range, axis);

        // Sweep from both ends, recording the area of everything left of and including
        // `index_left`, and of everything right of and including `index_right`.
        let mut bounds_left = Aabb::empty();
        let mut bounds_right = Aabb::empty();
        for index_left in 0..count {
            let index_right = count - index_left - 1;

            bounds_left.join_mut(&range[index_left].aabb());
            bounds_right.join_mut(&range[index_right].aabb());

            range[index_left].surface_area_left = bounds_left.surface_area();
            range[index_right].surface_area_right = bounds_right.surface_area();
        }

        let mut best_split = 1;
        let mut best_cost = f32::INFINITY;
        for mid in 1..count {
            let cost_left = range[mid - 1].surface_area_left * mid as f32;
            let cost_right = range[mid].surface_area_right * (count - mid) as f32;

            let cost = cost_left + cost_right;
            if cost < best_cost {
                best_split = mid;
                best_cost = cost;
            }
        }

        if best_cost < global_best_cost {
            global_best_split = best_split;
            global_best_cost = best_cost;
            best_axis = axis;
        }
    }

    // The range is still sorted by the last axis scanned.
    if best_axis != Axis::Z {
        sort_by_center(range, best_axis);
    }

    (global_best_split, best_axis)
}

/// Spatial median split along the longest axis of `bounds`. Returns the split relative to
/// `range` and the axis, leaving `range` sorted by it.
fn split_median(range: &mut [BuildNode], bounds: &Aabb) -> (usize, Axis) {
    let axis = bounds.largest_axis();
    sort_by_center(range, axis);

    let split_pos = (bounds.min[axis] + bounds.max[axis]) * 0.5;
    let first_above = range.partition_point(|node| node.bbox_center[axis] < split_pos);

    // Everything on one side of the midpoint still has to give two non-empty halves.
    (first_above.clamp(1, range.len() - 1), axis)
}

#[cfg(test)]
mod tests {
    use crate::axis::Axis;
    use crate::bvh::{joint_aabb_of_nodes, split, SplitStrategy};
    use crate::testbase::{create_n_random_triangles, leaf_nodes, triangle_at};
    use crate::triangle::FastTriangle;
    use nalgebra::Point3;
    use proptest::prelude::*;

    proptest! {
        // Test whether every split of a random range leaves both halves non-empty.
        #[test]
        fn test_split_index_inside_range(seed in any::<u64>(),
                                         count in 2usize..64,
                                         offset in 0usize..8,
                                         sah_threshold in prop_oneof![Just(0u32), Just(1_000u32)]) {
            let triangles = create_n_random_triangles(count + 2 * offset, seed);
            let mut nodes = leaf_nodes(&triangles);
            let (begin, end) = (offset, offset + count);
            let bounds = joint_aabb_of_nodes(&nodes[begin..end]);
            let untouched = [&nodes[..begin], &nodes[end..]].concat();

            let split = split(&mut nodes, begin, end, &bounds, sah_threshold);

            prop_assert!(split.index > begin && split.index < end);
            prop_assert_eq!([&nodes[..begin], &nodes[end..]].concat(), untouched);
            let axis = split.axis;
            prop_assert!(nodes[begin..end]
                .windows(2)
                .all(|pair| pair[0].bbox_center[axis] <= pair[1].bbox_center[axis]));
        }
    }

    #[test]
    fn test_sah_separates_clusters() {
        // Two clusters far apart along Y, interleaved in the input.
        let triangles = [0.0, 100.0, 1.0, 101.0, 2.0, 102.0]
            .iter()
            .enumerate()
            .map(|(i, &y)| triangle_at(Point3::new(0.0, y, 0.0), i as u32))
            .collect::<Vec<_>>();
        let mut nodes = leaf_nodes(&triangles);
        let bounds = joint_aabb_of_nodes(&nodes);

        let split = split(&mut nodes, 0, 6, &bounds, 1_000);

        assert_eq!(split.strategy, SplitStrategy::SurfaceAreaHeuristic);
        assert_eq!(split.axis, Axis::Y);
        assert_eq!(split.index, 3);
        assert!(nodes[..3].iter().all(|node| node.bbox_center.y < 50.0));
        assert!(nodes[3..].iter().all(|node| node.bbox_center.y > 50.0));
    }

    #[test]
    fn test_sah_prefers_first_axis_on_ties() {
        // A diagonal row is equally well split along X, Y and Z.
        let triangles = (0..8)
            .map(|i| {
                let t = (i * 10) as f32;
                triangle_at(Point3::new(t, t, t), i)
            })
            .collect::<Vec<_>>();
        let mut nodes = leaf_nodes(&triangles);
        let bounds = joint_aabb_of_nodes(&nodes);

        let split = split(&mut nodes, 0, 8, &bounds, 1_000);

        assert_eq!(split.axis, Axis::X);
        assert_eq!(split.index, 4);
    }

    #[test]
    fn test_median_splits_longest_axis_at_midpoint() {
        let triangles = [0.0, 1.0, 2.0, 3.0, 10.0, 11.0]
            .iter()
            .enumerate()
            .map(|(i, &z)| triangle_at(Point3::new(0.0, 0.0, z), i as u32))
            .collect::<Vec<_>>();
        let mut nodes = leaf_nodes(&triangles);
        let bounds = joint_aabb_of_nodes(&nodes);

        let split = split(&mut nodes, 0, 6, &bounds, 0);

        assert_eq!(split.strategy, SplitStrategy::Median);
        assert_eq!(split.axis, Axis::Z);
        // The midpoint of the Z extent lies between the fourth and the fifth triangle.
        assert_eq!(split.index, 4);
    }

    #[test]
    fn test_coincident_primitives_still_split() {
        let triangles = (0..5)
            .map(|i| triangle_at(Point3::new(1.0, 2.0, 3.0), i))
            .collect::<Vec<_>>();

        for sah_threshold in [0, 1_000] {
            let mut nodes = leaf_nodes(&triangles);
            let bounds = joint_aabb_of_nodes(&nodes);
            let split = split(&mut nodes, 0, 5, &bounds, sah_threshold);

            assert_eq!(split.index, 1);
            assert_eq!(split.axis, Axis::X);
        }
    }

    #[test]
    fn test_non_finite_costs_fall_back_to_first_candidate() {
        // Surface areas overflow to infinity, so no candidate ever improves on the start.
        let triangles = (0..4)
            .map(|i| {
                FastTriangle::new(
                    Point3::new(-3.0e38, -3.0e38, -3.0e38),
                    Point3::new(3.0e38, 3.0e38, 3.0e38),
                    Point3::new(0.0, 0.0, i as f32),
                    [0, 1, 2],
                    0,
                )
            })
            .collect::<Vec<_>>();
        let mut nodes = leaf_nodes(&triangles);
        let bounds = joint_aabb_of_nodes(&nodes);

        let split = split(&mut nodes, 0, 4, &bounds, 1_000);

        assert_eq!(split.index, 1);
        assert_eq!(split.axis, Axis::X);
    }

    #[test]
    #[should_panic]
    fn test_singleton_range_panics() {
        let triangles = create_n_random_triangles(3, 1);
        let mut nodes = leaf_nodes(&triangles);
        let bounds = joint_aabb_of_nodes(&nodes[1..2]);
        split(&mut nodes, 1, 2, &bounds, 1_000);
    }
}
