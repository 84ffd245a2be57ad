use bytemuck::{Pod, Zeroable};

use crate::bvh::{BvhNode, INVALID};
use crate::triangle::TriangleSource;

/// One 16-byte word of the GPU node buffer.
///
/// Every node occupies two consecutive words, so `buffer_index / 2` is the visit order of the
/// node and the index space of the `next` pointers:
///
/// | node     | word 0                        | word 1                        |
/// |----------|-------------------------------|-------------------------------|
/// | internal | `bbox_min`, [`INVALID`]       | `bbox_max`, `next`            |
/// | leaf     | triangle origin, triangle idx | triangle `edge_a`, `next`     |
///
/// Coordinates are stored as their raw `f32` bits.
///
/// [`INVALID`]: constant.INVALID.html
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Pod, Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PackedNode {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
}

impl PackedNode {
    /// Creates a word from three floats and a trailing integer.
    pub fn new(xyz: [f32; 3], w: u32) -> PackedNode {
        PackedNode {
            a: xyz[0].to_bits(),
            b: xyz[1].to_bits(),
            c: xyz[2].to_bits(),
            d: w,
        }
    }

    /// Returns the three leading floats.
    pub fn xyz(&self) -> [f32; 3] {
        [
            f32::from_bits(self.a),
            f32::from_bits(self.b),
            f32::from_bits(self.c),
        ]
    }

    /// Returns the trailing integer.
    pub fn w(&self) -> u32 {
        self.d
    }
}

/// Serializes linearized nodes into the GPU node buffer. Leaves inline the first half of
/// their triangle, taken from `triangles`.
///
/// # Panics
///
/// Panics if a leaf references a triangle outside of `triangles`.
pub fn pack<S>(nodes: &[BvhNode], triangles: &S) -> Vec<PackedNode>
where
    S: TriangleSource + ?Sized,
{
    let mut packed = Vec::with_capacity(2 * nodes.len());
    for node in nodes {
        match node.shape_index() {
            Some(triangle_index) => {
                let half = triangles.first_half(triangle_index);
                packed.push(PackedNode::new(half.origin, node.triangle_index));
                packed.push(PackedNode::new(half.edge_a, node.next));
            }
            None => {
                packed.push(PackedNode::new(node.bbox_min.coords.into(), INVALID));
                packed.push(PackedNode::new(node.bbox_max.coords.into(), node.next));
            }
        }
    }
    packed
}

#[cfg(test)]
mod tests {
    use crate::bvh::{pack, BvhNode, PackedNode, INVALID};
    use crate::testbase::triangle_at;
    use crate::triangle::FastTriangle;
    use nalgebra::Point3;
    use std::mem::size_of;

    #[test]
    fn test_word_size() {
        assert_eq!(size_of::<PackedNode>(), 16);
    }

    #[test]
    fn test_bits_are_preserved() {
        let word = PackedNode::new([-0.0, f32::INFINITY, 1.5], 42);

        assert_eq!(word.a, 0x8000_0000);
        assert_eq!(word.b, f32::INFINITY.to_bits());
        assert_eq!(word.xyz()[2], 1.5);
        assert_eq!(word.w(), 42);
    }

    #[test]
    fn test_internal_and_leaf_records() {
        let triangles: Vec<FastTriangle> = vec![
            triangle_at(Point3::new(5.0, 5.0, 5.0), 0),
            triangle_at(Point3::new(-5.0, 0.0, 0.0), 1),
        ];
        let internal = BvhNode {
            bbox_min: Point3::new(-1.0, -2.0, -3.0),
            triangle_index: INVALID,
            bbox_max: Point3::new(1.0, 2.0, 3.0),
            next: INVALID,
        };
        let leaf = BvhNode {
            bbox_min: Point3::new(-5.5, -0.5, 0.0),
            triangle_index: 1,
            bbox_max: Point3::new(-4.5, 0.5, 0.0),
            next: 2,
        };

        let packed = pack(&[internal, leaf], triangles.as_slice());

        assert_eq!(packed.len(), 4);
        assert_eq!(packed[0], PackedNode::new([-1.0, -2.0, -3.0], INVALID));
        assert_eq!(packed[1], PackedNode::new([1.0, 2.0, 3.0], INVALID));

        let half = triangles[1].first_half();
        assert_eq!(packed[2], PackedNode::new(half.origin, 1));
        assert_eq!(packed[3], PackedNode::new(half.edge_a, 2));
    }
}
