use nalgebra::Point3;

use crate::aabb::{Aabb, Bounded};

/// Sentinel used for "no index": the triangle index of internal nodes, the `next` pointer
/// at the end of a traversal and unset links during construction.
pub const INVALID: u32 = 0xFFFF_FFFF;

/// A node of a linearized [`Bvh`], stored in depth-first visit order.
///
/// `triangle_index == INVALID` marks an internal node, any other value a leaf referencing
/// exactly one triangle. The first child of an internal node is always the following node.
/// `next` is the node to continue with once this subtree is done or skipped, or [`INVALID`]
/// at the end of the traversal.
///
/// [`Bvh`]: struct.Bvh.html
/// [`INVALID`]: constant.INVALID.html
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BvhNode {
    /// Minimum corner of the node's bounding box.
    pub bbox_min: Point3<f32>,

    /// Index of the referenced triangle, [`INVALID`] for internal nodes.
    pub triangle_index: u32,

    /// Maximum corner of the node's bounding box.
    pub bbox_max: Point3<f32>,

    /// Visit-order index to jump to when this subtree is skipped.
    pub next: u32,
}

impl BvhNode {
    /// Returns true if this node references a triangle.
    pub fn is_leaf(&self) -> bool {
        self.triangle_index != INVALID
    }

    /// Returns the referenced triangle index of a leaf node.
    pub fn shape_index(&self) -> Option<usize> {
        if self.is_leaf() {
            Some(self.triangle_index as usize)
        } else {
            None
        }
    }
}

impl Bounded for BvhNode {
    fn aabb(&self) -> Aabb {
        Aabb::with_bounds(self.bbox_min, self.bbox_max)
    }
}
