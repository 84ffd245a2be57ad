//! Union of the bounding boxes of a node range.
//!
//! This is the reduction every split starts with, so it has an explicit 4-wide SIMD
//! version behind the `simd` feature. Both versions use `minps`/`maxps` semantics and the
//! reduction is associative and commutative, so they produce identical boxes.

use nalgebra::Point3;

use crate::aabb::Aabb;
use crate::bvh::BuildNode;

/// Returns the joint [`Aabb`] of `nodes`, or an empty [`Aabb`] for an empty slice.
///
/// [`Aabb`]: ../aabb/struct.Aabb.html
#[cfg(not(feature = "simd"))]
pub fn joint_aabb_of_nodes(nodes: &[BuildNode]) -> Aabb {
    use crate::axis::Axis;
    use crate::utils::{fast_max, fast_min};

    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for node in nodes {
        for axis in Axis::ALL {
            min[axis] = fast_min(min[axis], node.bbox_min[axis]);
            max[axis] = fast_max(max[axis], node.bbox_max[axis]);
        }
    }
    Aabb::with_bounds(Point3::from(min), Point3::from(max))
}

/// Returns the joint [`Aabb`] of `nodes`, or an empty [`Aabb`] for an empty slice.
///
/// [`Aabb`]: ../aabb/struct.Aabb.html
#[cfg(feature = "simd")]
pub fn joint_aabb_of_nodes(nodes: &[BuildNode]) -> Aabb {
    use wide::f32x4;

    #[inline(always)]
    fn to_register(point: &Point3<f32>) -> f32x4 {
        f32x4::new([point.x, point.y, point.z, point.z])
    }

    let mut min = f32x4::splat(f32::INFINITY);
    let mut max = f32x4::splat(f32::NEG_INFINITY);
    for node in nodes {
        min = min.fast_min(to_register(&node.bbox_min));
        max = max.fast_max(to_register(&node.bbox_max));
    }
    let min = min.to_array();
    let max = max.to_array();
    Aabb::with_bounds(
        Point3::new(min[0], min[1], min[2]),
        Point3::new(max[0], max[1], max[2]),
    )
}
