//! This module defines [`Bvh`], the result of a build, and [`BvhBuilder`], which owns the
//! buffers of the most recent successful build.
//!
//! [`Bvh`]: struct.Bvh.html
//! [`BvhBuilder`]: struct.BvhBuilder.html

use std::time::Instant;

use log::{debug, info};

use crate::aabb::{Aabb, Bounded};
use crate::bvh::{
    build_node_hierarchy, pack, reorder_by_visit_order, set_depth_first_visit_order, BuildNode,
    BuildStats, BvhNode, PackedNode, SplitStats, StacklessWalk, INVALID,
};
use crate::config::BuildConfig;
use crate::error::{BvhError, Result};
use crate::triangle::{
    FastTriangle, FastTriangleFirstHalf, FastTriangleSecondHalf, TriangleHalves, TriangleSource,
};
use crate::utils::to_u32;

/// Largest number of triangles a [`Bvh`] can index. The `2n - 1` nodes have to be
/// addressable by `u32` with [`INVALID`] reserved.
///
/// [`Bvh`]: struct.Bvh.html
/// [`INVALID`]: constant.INVALID.html
pub const MAX_TRIANGLES: usize = 1 << 31;

/// A linearized bounding volume hierarchy over triangles, ready for stackless traversal.
///
/// Holds the nodes in depth-first visit order and the packed GPU node buffer built from them.
#[derive(Debug, Clone)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    packed_nodes: Vec<PackedNode>,
    stats: BuildStats,
}

impl Bvh {
    /// Builds a [`Bvh`] over `triangles`.
    ///
    /// # Examples
    /// ```
    /// use nalgebra::Point3;
    /// use stackless_bvh::{BuildConfig, Bvh, FastTriangle};
    ///
    /// let triangles = (0..16)
    ///     .map(|i| {
    ///         let x = i as f32;
    ///         FastTriangle::new(
    ///             Point3::new(x, 0.0, 0.0),
    ///             Point3::new(x + 1.0, 0.0, 0.0),
    ///             Point3::new(x, 1.0, 0.0),
    ///             [3 * i, 3 * i + 1, 3 * i + 2],
    ///             0,
    ///         )
    ///     })
    ///     .collect::<Vec<_>>();
    ///
    /// let bvh = Bvh::build(&triangles, &BuildConfig::default()).unwrap();
    ///
    /// assert_eq!(bvh.nodes().len(), 31);
    /// assert_eq!(bvh.packed_nodes().len(), 62);
    /// bvh.assert_consistent(triangles.as_slice());
    /// ```
    ///
    /// # Errors
    ///
    /// Fails with [`BvhError::EmptyInput`] for an empty slice and with
    /// [`BvhError::TooManyTriangles`] if the nodes would not fit the 32-bit index space.
    ///
    /// [`Bvh`]: struct.Bvh.html
    /// [`BvhError::EmptyInput`]: ../error/enum.BvhError.html
    /// [`BvhError::TooManyTriangles`]: ../error/enum.BvhError.html
    pub fn build(triangles: &[FastTriangle], config: &BuildConfig) -> Result<Bvh> {
        Bvh::build_from_source(triangles, config)
    }

    /// Builds a [`Bvh`] over the triangles stored as two parallel half arrays.
    ///
    /// [`Bvh`]: struct.Bvh.html
    pub fn build_from_halves(
        first: &[FastTriangleFirstHalf],
        second: &[FastTriangleSecondHalf],
        config: &BuildConfig,
    ) -> Result<Bvh> {
        let halves = TriangleHalves::new(first, second)?;
        Bvh::build_from_source(&halves, config)
    }

    /// Builds a [`Bvh`] over any [`TriangleSource`].
    ///
    /// The input is validated before anything is allocated.
    ///
    /// [`Bvh`]: struct.Bvh.html
    /// [`TriangleSource`]: ../triangle/trait.TriangleSource.html
    pub fn build_from_source<S>(triangles: &S, config: &BuildConfig) -> Result<Bvh>
    where
        S: TriangleSource + ?Sized,
    {
        let count = triangles.triangle_count();
        if count == 0 {
            return Err(BvhError::EmptyInput);
        }
        if count > MAX_TRIANGLES {
            return Err(BvhError::TooManyTriangles {
                count,
                max: MAX_TRIANGLES,
            });
        }

        let start = Instant::now();
        debug!(
            "Building BVH over {} triangles, SAH for ranges of up to {} triangles.",
            count, config.sah_threshold
        );

        let mut build_nodes = Vec::with_capacity(2 * count - 1);
        build_nodes.extend(
            (0..count).map(|index| BuildNode::leaf(to_u32(index), &triangles.triangle(index))),
        );

        let mut splits = SplitStats::default();
        let root = build_node_hierarchy(
            &mut build_nodes,
            0,
            count,
            config.sah_threshold,
            &mut splits,
        );
        let max_depth = set_depth_first_visit_order(&mut build_nodes, root);
        let nodes = reorder_by_visit_order(&build_nodes);
        drop(build_nodes);

        let packed_nodes = pack(&nodes, triangles);

        let stats = BuildStats {
            triangle_count: count,
            leaf_count: count,
            internal_count: count - 1,
            max_depth,
            splits,
            packed_bytes: packed_nodes.len() * std::mem::size_of::<PackedNode>(),
            duration: start.elapsed(),
        };
        info!(
            "BVH construction took {:.3} ms ({} triangles, {} nodes, {} bytes).",
            stats.duration.as_secs_f64() * 1000.0,
            stats.triangle_count,
            stats.node_count(),
            stats.packed_bytes
        );
        debug!(
            "{} SAH splits, {} median splits, maximum depth {}.",
            splits.sah_splits, splits.median_splits, max_depth
        );

        Ok(Bvh {
            nodes,
            packed_nodes,
            stats,
        })
    }

    /// Returns the nodes in depth-first visit order.
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Returns the GPU node buffer, two records per node.
    pub fn packed_nodes(&self) -> &[PackedNode] {
        &self.packed_nodes
    }

    /// Returns the GPU node buffer as raw bytes, ready for upload.
    pub fn packed_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.packed_nodes)
    }

    /// Consumes the [`Bvh`] and returns the GPU node buffer.
    ///
    /// [`Bvh`]: struct.Bvh.html
    pub fn into_packed_nodes(self) -> Vec<PackedNode> {
        self.packed_nodes
    }

    /// Returns the statistics of the build which produced this [`Bvh`].
    ///
    /// [`Bvh`]: struct.Bvh.html
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Walks the nodes the way the shader does. `descend` decides for every internal node
    /// whether its subtree is entered or skipped.
    pub fn walk<F>(&self, descend: F) -> StacklessWalk<'_, F>
    where
        F: FnMut(&BvhNode) -> bool,
    {
        StacklessWalk::new(&self.nodes, descend)
    }

    /// Prints the [`Bvh`] in a tree-like visualization.
    ///
    /// [`Bvh`]: struct.Bvh.html
    pub fn pretty_print(&self) {
        let mut stack = vec![(0, 0)];
        while let Some((index, depth)) = stack.pop() {
            let node = &self.nodes[index];
            let padding = " ".repeat(depth);
            match node.shape_index() {
                Some(triangle_index) => {
                    println!(
                        "{}node={} next={} triangle={}",
                        padding,
                        index,
                        Next(node.next),
                        triangle_index
                    );
                }
                None => {
                    println!(
                        "{}node={} next={} {}",
                        padding,
                        index,
                        Next(node.next),
                        node.aabb()
                    );
                    stack.push((self.nodes[index + 1].next as usize, depth + 1));
                    stack.push((index + 1, depth + 1));
                }
            }
        }
    }

    /// Returns a description of the first defect found in the [`Bvh`], if any.
    ///
    /// Walks the tree from the root, expecting every node at the position of its depth-first
    /// visit, every child inside its parent's bounds, the larger child first, the skip
    /// pointers as the linearization sets them and every triangle in exactly one leaf.
    ///
    /// [`Bvh`]: struct.Bvh.html
    fn find_defect<S>(&self, triangles: &S) -> Option<String>
    where
        S: TriangleSource + ?Sized,
    {
        let count = triangles.triangle_count();
        if count == 0 || self.nodes.len() != 2 * count - 1 {
            return Some(format!(
                "Expected {} nodes for {} triangles, found {}.",
                (2 * count).saturating_sub(1),
                count,
                self.nodes.len()
            ));
        }

        // The root node of the bvh is not bounded by anything.
        let space = Aabb::infinite();
        let mut seen = vec![false; count];
        let mut visited = 0;

        let mut stack = vec![(0, INVALID, space)];
        while let Some((index, expected_next, outer_aabb)) = stack.pop() {
            if index != visited {
                return Some(format!(
                    "Node {} is visited at position {}.",
                    index, visited
                ));
            }
            visited += 1;

            let node = &self.nodes[index];
            let aabb = node.aabb();
            if node.next != expected_next {
                return Some(format!(
                    "Node {} skips to {}, expected {}.",
                    index,
                    Next(node.next),
                    Next(expected_next)
                ));
            }
            if !outer_aabb.approx_contains_aabb_eps(&aabb, f32::EPSILON) {
                return Some(format!(
                    "Node {} lies outside its parent.\n\tBounds: {}\n\tNode: {}",
                    index, outer_aabb, aabb
                ));
            }

            if let Some(triangle_index) = node.shape_index() {
                if triangle_index >= count || seen[triangle_index] {
                    return Some(format!(
                        "Leaf {} references triangle {} twice or out of range.",
                        index, triangle_index
                    ));
                }
                seen[triangle_index] = true;
                let triangle_aabb = triangles.triangle(triangle_index).aabb();
                if !aabb.approx_contains_aabb_eps(&triangle_aabb, f32::EPSILON) {
                    return Some(format!(
                        "Triangle {} lies outside its leaf {}.\n\tLeaf: {}\n\tTriangle: {}",
                        triangle_index, index, aabb, triangle_aabb
                    ));
                }
                continue;
            }

            let left = index + 1;
            let right = self.nodes.get(left).map_or(INVALID, |node| node.next) as usize;
            if right >= self.nodes.len() {
                return Some(format!("Node {} has no second child.", index));
            }
            if self.nodes[right].aabb().surface_area() > self.nodes[left].aabb().surface_area() {
                return Some(format!(
                    "The second child {} of node {} is larger than the first.",
                    right, index
                ));
            }
            stack.push((right, node.next, aabb));
            stack.push((left, to_u32(right), aabb));
        }

        if visited != self.nodes.len() {
            return Some(format!(
                "Only {} of {} nodes are reachable.",
                visited,
                self.nodes.len()
            ));
        }
        None
    }

    /// Checks if every node sits at its depth-first position with correct skip pointers,
    /// lies inside its parent, and that every triangle is referenced by exactly one leaf.
    pub fn is_consistent<S>(&self, triangles: &S) -> bool
    where
        S: TriangleSource + ?Sized,
    {
        self.find_defect(triangles).is_none()
    }

    /// Assert version of [`is_consistent`].
    ///
    /// [`is_consistent`]: struct.Bvh.html#method.is_consistent
    pub fn assert_consistent<S>(&self, triangles: &S)
    where
        S: TriangleSource + ?Sized,
    {
        if let Some(defect) = self.find_defect(triangles) {
            panic!("Inconsistent BVH: {}", defect);
        }
    }
}

impl Bounded for Bvh {
    fn aabb(&self) -> Aabb {
        self.nodes
            .first()
            .map_or_else(Aabb::empty, |root| root.aabb())
    }
}

/// Displays a skip pointer, spelling out the end of the traversal.
struct Next(u32);

impl std::fmt::Display for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.0 == INVALID {
            write!(f, "end")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Builds BVHs and owns the buffers of the last successful build.
///
/// A failed build leaves the previous buffers untouched, so a renderer can keep drawing the
/// old scene.
///
/// # Examples
/// ```
/// use nalgebra::Point3;
/// use stackless_bvh::{BuildConfig, BvhBuilder, FastTriangle};
///
/// let triangle = FastTriangle::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     [0, 1, 2],
///     0,
/// );
/// let mut builder = BvhBuilder::new(BuildConfig::default());
/// assert!(builder.nodes().is_empty());
///
/// builder.build(&[triangle, triangle]).unwrap();
/// assert_eq!(builder.nodes().len(), 3);
///
/// assert!(builder.build(&[]).is_err());
/// assert_eq!(builder.nodes().len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BvhBuilder {
    config: BuildConfig,
    bvh: Option<Bvh>,
}

impl BvhBuilder {
    /// Creates a builder without any buffers.
    pub fn new(config: BuildConfig) -> BvhBuilder {
        BvhBuilder { config, bvh: None }
    }

    /// Returns the configuration used by the next build.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Replaces the configuration used by the next build.
    pub fn set_config(&mut self, config: BuildConfig) {
        self.config = config;
    }

    /// Rebuilds from `triangles`. The previous buffers are only replaced on success.
    pub fn build(&mut self, triangles: &[FastTriangle]) -> Result<&Bvh> {
        let bvh = Bvh::build(triangles, &self.config)?;
        Ok(&*self.bvh.insert(bvh))
    }

    /// Rebuilds from two parallel half arrays. The previous buffers are only replaced on
    /// success.
    pub fn build_from_halves(
        &mut self,
        first: &[FastTriangleFirstHalf],
        second: &[FastTriangleSecondHalf],
    ) -> Result<&Bvh> {
        let bvh = Bvh::build_from_halves(first, second, &self.config)?;
        Ok(&*self.bvh.insert(bvh))
    }

    /// Returns the result of the last successful build.
    pub fn bvh(&self) -> Option<&Bvh> {
        self.bvh.as_ref()
    }

    /// Takes the result of the last successful build out of the builder.
    pub fn take(&mut self) -> Option<Bvh> {
        self.bvh.take()
    }

    /// Returns the linearized nodes of the last successful build, or nothing.
    pub fn nodes(&self) -> &[BvhNode] {
        self.bvh.as_ref().map(Bvh::nodes).unwrap_or_default()
    }

    /// Returns the GPU node buffer of the last successful build, or nothing.
    pub fn packed_nodes(&self) -> &[PackedNode] {
        self.bvh.as_ref().map(Bvh::packed_nodes).unwrap_or_default()
    }
}


#[cfg(all(feature = "bench", test))]
mod bench {
    use crate::bvh::Bvh;
    use crate::config::BuildConfig;
    use crate::testbase::create_n_random_triangles;

    fn build_n_triangles(n: usize, sah_threshold: u32, b: &mut ::test::Bencher) {
        let triangles = create_n_random_triangles(n, 0);
        let config = BuildConfig::new(sah_threshold);
        b.iter(|| Bvh::build(&triangles, &config));
    }

    #[bench]
    /// Benchmark the construction of a `Bvh` with 1,200 triangles.
    fn bench_build_1200_triangles_bvh(b: &mut ::test::Bencher) {
        build_n_triangles(1_200, 1_000_000, b);
    }

    #[bench]
    /// Benchmark the construction of a `Bvh` with 12,000 triangles.
    fn bench_build_12k_triangles_bvh(b: &mut ::test::Bencher) {
        build_n_triangles(12_000, 1_000_000, b);
    }

    #[bench]
    /// Benchmark the construction of a `Bvh` with 120,000 triangles, median splits above
    /// 1,000 triangles.
    fn bench_build_120k_triangles_bvh_median(b: &mut ::test::Bencher) {
        build_n_triangles(120_000, 1_000, b);
    }
}
