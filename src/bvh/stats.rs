use std::fmt;
use std::time::Duration;

use crate::bvh::{Split, SplitStrategy};

/// Counts the split decisions taken while building a hierarchy.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SplitStats {
    /// Number of ranges split with the surface area heuristic.
    pub sah_splits: usize,

    /// Number of ranges split at the spatial median.
    pub median_splits: usize,

    /// Size of the largest range the surface area heuristic was evaluated on.
    pub largest_sah_range: usize,

    /// Size of the smallest range split at the median, if any.
    pub smallest_median_range: Option<usize>,
}

impl SplitStats {
    /// Records the split of a range of `count` primitives.
    pub fn record(&mut self, split: &Split, count: usize) {
        match split.strategy {
            SplitStrategy::SurfaceAreaHeuristic => {
                self.sah_splits += 1;
                self.largest_sah_range = self.largest_sah_range.max(count);
            }
            SplitStrategy::Median => {
                self.median_splits += 1;
                self.smallest_median_range = Some(
                    self.smallest_median_range
                        .map_or(count, |smallest| smallest.min(count)),
                );
            }
        }
    }
}

/// Summary of a finished build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildStats {
    /// Number of input triangles, equal to the number of leaves.
    pub triangle_count: usize,

    /// Number of leaf nodes.
    pub leaf_count: usize,

    /// Number of internal nodes, always `leaf_count - 1`.
    pub internal_count: usize,

    /// Depth of the deepest leaf, the root being at depth 0.
    pub max_depth: usize,

    /// Split decisions.
    pub splits: SplitStats,

    /// Size of the packed node buffer in bytes.
    pub packed_bytes: usize,

    /// Wall-clock time of the build.
    pub duration: Duration,
}

impl BuildStats {
    /// Returns the total number of nodes.
    pub fn node_count(&self) -> usize {
        self.leaf_count + self.internal_count
    }
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} triangles, {} nodes ({} bytes), depth {}, {} SAH / {} median splits, {:.3} ms",
            self.triangle_count,
            self.node_count(),
            self.packed_bytes,
            self.max_depth,
            self.splits.sah_splits,
            self.splits.median_splits,
            self.duration.as_secs_f64() * 1000.0
        )
    }
}
