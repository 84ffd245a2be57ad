//! This module defines the [`FastTriangle`] primitive and its two GPU buffer halves.
//!
//! A [`FastTriangle`] stores its first vertex (the origin) and two edge vectors instead of
//! three vertices. The first half, origin and first edge, is inlined into the BVH leaf
//! records so that the primary traversal never touches a second buffer. The second half
//! carries the remaining edge and the attribute indices and lives in its own buffer.
//!
//! [`FastTriangle`]: struct.FastTriangle.html

use bytemuck::{Pod, Zeroable};
use nalgebra::{Point3, Vector3};

use crate::aabb::{Aabb, Bounded};
use crate::error::{BvhError, Result};

/// A triangle in origin/edge form.
///
/// `edge_a = origin - v1` and `edge_b = v2 - origin`. Note the sign asymmetry: the vertices
/// are reconstructed as `v1 = origin - edge_a` and `v2 = origin + edge_b`.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FastTriangle {
    /// First vertex.
    pub origin: Point3<f32>,

    /// `origin - v1`.
    pub edge_a: Vector3<f32>,

    /// `v2 - origin`.
    pub edge_b: Vector3<f32>,

    /// Indices of the three source vertices, used to look up other vertex attributes.
    pub vertex_indices: [u32; 3],

    /// Index of the scene object owning this triangle.
    pub object_index: u32,
}

/// First half of a [`FastTriangle`]: `origin` and `edge_a`, 24 bytes.
///
/// [`FastTriangle`]: struct.FastTriangle.html
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, Pod, Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FastTriangleFirstHalf {
    /// First vertex.
    pub origin: [f32; 3],
    /// `origin - v1`.
    pub edge_a: [f32; 3],
}

/// Second half of a [`FastTriangle`], 32 bytes laid out as two 16-byte words.
///
/// [`FastTriangle`]: struct.FastTriangle.html
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, Pod, Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FastTriangleSecondHalf {
    /// `v2 - origin`.
    pub edge_b: [f32; 3],
    /// Pads `edge_b` to a full 16-byte word.
    pub padding: u32,
    /// Indices of the three source vertices.
    pub vertex_indices: [u32; 3],
    /// Index of the owning scene object.
    pub object_index: u32,
}

impl FastTriangle {
    /// Creates a [`FastTriangle`] from three world-space vertices.
    ///
    /// # Examples
    /// ```
    /// use stackless_bvh::triangle::FastTriangle;
    /// use nalgebra::Point3;
    ///
    /// let v0 = Point3::new(0.0, 0.0, 0.0);
    /// let v1 = Point3::new(1.0, 0.0, 0.0);
    /// let v2 = Point3::new(0.0, 1.0, 0.0);
    /// let triangle = FastTriangle::new(v0, v1, v2, [0, 1, 2], 7);
    ///
    /// assert_eq!(triangle.vertices(), [v0, v1, v2]);
    /// assert_eq!(triangle.area(), 0.5);
    /// ```
    ///
    /// [`FastTriangle`]: struct.FastTriangle.html
    pub fn new(
        v0: Point3<f32>,
        v1: Point3<f32>,
        v2: Point3<f32>,
        vertex_indices: [u32; 3],
        object_index: u32,
    ) -> FastTriangle {
        FastTriangle {
            origin: v0,
            edge_a: v0 - v1,
            edge_b: v2 - v0,
            vertex_indices,
            object_index,
        }
    }

    /// Reassembles a [`FastTriangle`] from its two halves. This is a pure re-layout, no
    /// arithmetic is involved.
    ///
    /// [`FastTriangle`]: struct.FastTriangle.html
    pub fn from_halves(
        first: &FastTriangleFirstHalf,
        second: &FastTriangleSecondHalf,
    ) -> FastTriangle {
        FastTriangle {
            origin: Point3::from(first.origin),
            edge_a: Vector3::from(first.edge_a),
            edge_b: Vector3::from(second.edge_b),
            vertex_indices: second.vertex_indices,
            object_index: second.object_index,
        }
    }

    /// Returns the half which is inlined into BVH leaf records.
    pub fn first_half(&self) -> FastTriangleFirstHalf {
        FastTriangleFirstHalf {
            origin: self.origin.coords.into(),
            edge_a: self.edge_a.into(),
        }
    }

    /// Returns the half which is uploaded to the triangle buffer.
    pub fn second_half(&self) -> FastTriangleSecondHalf {
        FastTriangleSecondHalf {
            edge_b: self.edge_b.into(),
            padding: 0,
            vertex_indices: self.vertex_indices,
            object_index: self.object_index,
        }
    }

    /// Splits a triangle list into the two parallel GPU arrays.
    pub fn split_halves(
        triangles: &[FastTriangle],
    ) -> (Vec<FastTriangleFirstHalf>, Vec<FastTriangleSecondHalf>) {
        triangles
            .iter()
            .map(|triangle| (triangle.first_half(), triangle.second_half()))
            .unzip()
    }

    /// Reconstructs the three vertices `[v0, v1, v2]`.
    pub fn vertices(&self) -> [Point3<f32>; 3] {
        [
            self.origin,
            self.origin - self.edge_a,
            self.origin + self.edge_b,
        ]
    }

    /// Returns the surface area of the triangle. Degenerate triangles have zero area.
    pub fn area(&self) -> f32 {
        let [v0, v1, v2] = self.vertices();
        (v2 - v0).cross(&(v1 - v0)).norm() * 0.5
    }
}

impl Bounded for FastTriangle {
    fn aabb(&self) -> Aabb {
        let [v0, v1, v2] = self.vertices();
        Aabb::empty().grow(&v0).grow(&v1).grow(&v2)
    }
}

/// A random-access collection of triangles the BVH can be built from.
///
/// The build only needs the bounds of every triangle and the first halves of the leaves,
/// so the triangles may be stored either whole or as two parallel half arrays.
pub trait TriangleSource {
    /// Returns the number of triangles.
    fn triangle_count(&self) -> usize;

    /// Returns the triangle at `index`.
    fn triangle(&self, index: usize) -> FastTriangle;

    /// Returns the first half of the triangle at `index`.
    fn first_half(&self, index: usize) -> FastTriangleFirstHalf {
        self.triangle(index).first_half()
    }
}

impl TriangleSource for [FastTriangle] {
    fn triangle_count(&self) -> usize {
        self.len()
    }

    fn triangle(&self, index: usize) -> FastTriangle {
        self[index]
    }
}

/// Two parallel arrays of triangle halves, as kept by the renderer for upload.
///
/// # Examples
/// ```
/// use stackless_bvh::triangle::{FastTriangle, TriangleHalves, TriangleSource};
/// use nalgebra::Point3;
///
/// let triangle = FastTriangle::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     [0, 1, 2],
///     0,
/// );
/// let (first, second) = FastTriangle::split_halves(&[triangle]);
/// let halves = TriangleHalves::new(&first, &second).unwrap();
///
/// assert_eq!(halves.triangle_count(), 1);
/// assert_eq!(halves.triangle(0), triangle);
///
/// assert!(TriangleHalves::new(&first, &[]).is_err());
/// ```
#[derive(Debug, Copy, Clone)]
pub struct TriangleHalves<'a> {
    first: &'a [FastTriangleFirstHalf],
    second: &'a [FastTriangleSecondHalf],
}

impl<'a> TriangleHalves<'a> {
    /// Pairs up the two half arrays. Fails if their lengths differ.
    pub fn new(
        first: &'a [FastTriangleFirstHalf],
        second: &'a [FastTriangleSecondHalf],
    ) -> Result<TriangleHalves<'a>> {
        if first.len() != second.len() {
            return Err(BvhError::HalvesLengthMismatch {
                first: first.len(),
                second: second.len(),
            });
        }
        Ok(TriangleHalves { first, second })
    }
}

impl TriangleSource for TriangleHalves<'_> {
    fn triangle_count(&self) -> usize {
        self.first.len()
    }

    fn triangle(&self, index: usize) -> FastTriangle {
        FastTriangle::from_halves(&self.first[index], &self.second[index])
    }

    fn first_half(&self, index: usize) -> FastTriangleFirstHalf {
        self.first[index]
    }
}

#[cfg(test)]
mod tests {
    use crate::aabb::Bounded;
    use crate::testbase::{tuple_to_point, tuplevec_small_strategy};
    use crate::triangle::{
        FastTriangle, FastTriangleFirstHalf, FastTriangleSecondHalf, TriangleHalves,
        TriangleSource,
    };
    use float_eq::assert_float_eq;
    use nalgebra::Point3;
    use proptest::prelude::*;
    use std::mem::size_of;

    proptest! {
        // Test whether splitting a triangle into halves and joining them is lossless.
        #[test]
        fn test_halves_round_trip(a in tuplevec_small_strategy(),
                                  b in tuplevec_small_strategy(),
                                  c in tuplevec_small_strategy(),
                                  object_index in any::<u32>()) {
            let triangle = FastTriangle::new(
                tuple_to_point(&a),
                tuple_to_point(&b),
                tuple_to_point(&c),
                [1, 2, 3],
                object_index,
            );
            let joined = FastTriangle::from_halves(&triangle.first_half(), &triangle.second_half());

            assert_eq!(joined, triangle);
        }

        // Test whether vertices on an integer grid are reconstructed exactly.
        #[test]
        fn test_integer_vertices_reconstructed_exactly(a in prop::array::uniform9(-1000i32..1000)) {
            let v0 = Point3::new(a[0] as f32, a[1] as f32, a[2] as f32);
            let v1 = Point3::new(a[3] as f32, a[4] as f32, a[5] as f32);
            let v2 = Point3::new(a[6] as f32, a[7] as f32, a[8] as f32);
            let triangle = FastTriangle::new(v0, v1, v2, [0, 0, 0], 0);
            let joined = FastTriangle::from_halves(&triangle.first_half(), &triangle.second_half());

            assert_eq!(joined.vertices(), [v0, v1, v2]);
        }

        // Test whether the bounds of a triangle contain its vertices.
        #[test]
        fn test_aabb_contains_vertices(a in tuplevec_small_strategy(),
                                       b in tuplevec_small_strategy(),
                                       c in tuplevec_small_strategy()) {
            let triangle = FastTriangle::new(
                tuple_to_point(&a),
                tuple_to_point(&b),
                tuple_to_point(&c),
                [0, 1, 2],
                0,
            );
            let aabb = triangle.aabb();

            for vertex in triangle.vertices().iter() {
                assert!(aabb.contains(vertex));
            }
        }
    }

    #[test]
    fn test_half_layouts_match_gpu_slots() {
        assert_eq!(size_of::<FastTriangleFirstHalf>(), 24);
        assert_eq!(size_of::<FastTriangleSecondHalf>(), 32);
    }

    #[test]
    fn test_edges_follow_sign_convention() {
        let v0 = Point3::new(1.0, 2.0, 3.0);
        let v1 = Point3::new(4.0, 2.0, 3.0);
        let v2 = Point3::new(1.0, 5.0, 3.0);
        let triangle = FastTriangle::new(v0, v1, v2, [4, 5, 6], 9);

        assert_eq!(triangle.edge_a, v0 - v1);
        assert_eq!(triangle.edge_b, v2 - v0);

        let second = triangle.second_half();
        assert_eq!(second.padding, 0);
        assert_eq!(second.vertex_indices, [4, 5, 6]);
        assert_eq!(second.object_index, 9);
    }

    #[test]
    fn test_area() {
        let triangle = FastTriangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
            [0, 1, 2],
            0,
        );
        assert_float_eq!(triangle.area(), 6.0, abs <= 1e-6);

        let degenerate = FastTriangle::new(
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(2.0, 2.0, 2.0),
            Point3::new(3.0, 3.0, 3.0),
            [0, 1, 2],
            0,
        );
        assert_eq!(degenerate.area(), 0.0);
    }

    #[test]
    fn test_split_halves_and_source() {
        let triangles = (0..4)
            .map(|i| {
                let x = i as f32;
                FastTriangle::new(
                    Point3::new(x, 0.0, 0.0),
                    Point3::new(x + 1.0, 0.0, 0.0),
                    Point3::new(x, 1.0, 0.0),
                    [3 * i, 3 * i + 1, 3 * i + 2],
                    i,
                )
            })
            .collect::<Vec<_>>();
        let (first, second) = FastTriangle::split_halves(&triangles);
        let halves = TriangleHalves::new(&first, &second).unwrap();

        assert_eq!(halves.triangle_count(), triangles.len());
        for (index, triangle) in triangles.iter().enumerate() {
            assert_eq!(halves.triangle(index), *triangle);
            assert_eq!(halves.first_half(index), triangles.first_half(index));
        }
    }
}
