use nalgebra::Point3;

use crate::aabb::{Aabb, Bounded};
use crate::bvh::{BvhNode, INVALID};
use crate::triangle::FastTriangle;

/// A node of the construction-time tree.
///
/// The builder's working array starts with one leaf per triangle, in input order. Internal
/// nodes are appended behind the leaves as ranges get split. Links are indices into that
/// array until [`reorder_by_visit_order`] maps them into visit order.
///
/// [`reorder_by_visit_order`]: fn.reorder_by_visit_order.html
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BuildNode {
    /// Minimum corner of the bounding box.
    pub bbox_min: Point3<f32>,

    /// Triangle of a leaf, [`INVALID`] for internal nodes.
    pub triangle_index: u32,

    /// Maximum corner of the bounding box.
    pub bbox_max: Point3<f32>,

    /// Skip pointer as a working-array index, set by the linearizer.
    pub next: u32,

    /// Depth-first position, [`INVALID`] until the linearizer ran.
    pub visit_order: u32,

    /// Parent node, [`INVALID`] for the root.
    pub parent: u32,

    /// Left child, [`INVALID`] for leaves.
    pub left: u32,

    /// Right child, [`INVALID`] for leaves.
    pub right: u32,

    /// Center of the bounding box, the sort key of the split search.
    pub bbox_center: Point3<f32>,

    /// Surface area of the referenced triangle.
    pub prim_area: f32,

    /// SAH sweep scratch: area of the bounds of everything up to and including this node.
    pub surface_area_left: f32,

    /// SAH sweep scratch: area of the bounds of everything from this node on.
    pub surface_area_right: f32,
}

impl BuildNode {
    /// Creates the leaf of the triangle with index `triangle_index`.
    pub fn leaf(triangle_index: u32, triangle: &FastTriangle) -> BuildNode {
        let aabb = triangle.aabb();
        BuildNode {
            bbox_min: aabb.min,
            triangle_index,
            bbox_max: aabb.max,
            next: INVALID,
            visit_order: INVALID,
            parent: INVALID,
            left: INVALID,
            right: INVALID,
            bbox_center: aabb.center(),
            prim_area: triangle.area(),
            surface_area_left: 0.0,
            surface_area_right: 0.0,
        }
    }

    /// Creates an internal node enclosing `bounds`, with no children linked yet.
    pub fn internal(bounds: &Aabb) -> BuildNode {
        BuildNode {
            bbox_min: bounds.min,
            triangle_index: INVALID,
            bbox_max: bounds.max,
            next: INVALID,
            visit_order: INVALID,
            parent: INVALID,
            left: INVALID,
            right: INVALID,
            bbox_center: bounds.center(),
            prim_area: 0.0,
            surface_area_left: 0.0,
            surface_area_right: 0.0,
        }
    }

    /// Returns true if this node references a triangle.
    pub fn is_leaf(&self) -> bool {
        self.triangle_index != INVALID
    }

    /// Returns the surface area of the node's bounding box.
    pub fn surface_area(&self) -> f32 {
        self.aabb().surface_area()
    }

    /// Strips the construction bookkeeping. `next` has to be given in visit order.
    pub fn to_bvh_node(&self, next: u32) -> BvhNode {
        BvhNode {
            bbox_min: self.bbox_min,
            triangle_index: self.triangle_index,
            bbox_max: self.bbox_max,
            next,
        }
    }
}

impl Bounded for BuildNode {
    fn aabb(&self) -> Aabb {
        Aabb::with_bounds(self.bbox_min, self.bbox_max)
    }
}

#[cfg(test)]
mod tests {
    use crate::aabb::Bounded;
    use crate::bvh::{BuildNode, INVALID};
    use crate::triangle::FastTriangle;
    use nalgebra::Point3;

    #[test]
    fn test_leaf_from_triangle() {
        let triangle = FastTriangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            [0, 1, 2],
            3,
        );
        let leaf = BuildNode::leaf(5, &triangle);

        assert!(leaf.is_leaf());
        assert_eq!(leaf.triangle_index, 5);
        assert_eq!(leaf.aabb(), triangle.aabb());
        assert_eq!(leaf.bbox_center, Point3::new(1.0, 1.0, 0.0));
        assert_eq!(leaf.prim_area, 2.0);
        assert_eq!(leaf.left, INVALID);
        assert_eq!(leaf.right, INVALID);
        assert_eq!(leaf.visit_order, INVALID);
    }

    #[test]
    fn test_internal_node_has_no_triangle() {
        let triangle = FastTriangle::new(
            Point3::new(-1.0, -1.0, -1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 0.0, 0.0),
            [0, 1, 2],
            0,
        );
        let node = BuildNode::internal(&triangle.aabb());

        assert!(!node.is_leaf());
        assert_eq!(node.surface_area(), 24.0);
        assert_eq!(node.to_bvh_node(7).next, 7);
        assert_eq!(node.to_bvh_node(7).triangle_index, INVALID);
    }
}
