#![no_main]
use std::collections::HashSet;
use std::fmt::{self, Debug, Formatter};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use nalgebra::Point3;
use ordered_float::NotNan;
use stackless_bvh::aabb::Bounded;
use stackless_bvh::{BuildConfig, Bvh, BvhBuilder, BvhError, FastTriangle};

type Float = f32;
const LIMIT: Float = 1_000_000.0;

fuzz_target!(|workload: Workload| {
    workload.fuzz();
});

#[derive(Arbitrary)]
struct ArbitraryPoint {
    coordinates: [NotNan<Float>; 3],
}

impl ArbitraryPoint {
    fn point(&self) -> Point3<Float> {
        Point3::from(self.coordinates.map(|f| f.into_inner().clamp(-LIMIT, LIMIT)))
    }
}

impl Debug for ArbitraryPoint {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(&self.point(), f)
    }
}

#[derive(Debug, Arbitrary)]
struct ArbitraryTriangle {
    a: ArbitraryPoint,
    b: ArbitraryPoint,
    c: ArbitraryPoint,
    object_index: u32,
}

impl ArbitraryTriangle {
    fn triangle(&self, index: u32) -> FastTriangle {
        FastTriangle::new(
            self.a.point(),
            self.b.point(),
            self.c.point(),
            [
                index.wrapping_mul(3),
                index.wrapping_mul(3).wrapping_add(1),
                index.wrapping_mul(3).wrapping_add(2),
            ],
            self.object_index,
        )
    }
}

#[derive(Debug, Arbitrary)]
struct Workload {
    triangles: Vec<ArbitraryTriangle>,
    sah_threshold: u16,
    query: ArbitraryPoint,
}

impl Workload {
    fn fuzz(self) {
        let triangles = self
            .triangles
            .iter()
            .enumerate()
            .map(|(index, triangle)| triangle.triangle(index as u32))
            .collect::<Vec<_>>();
        let config = BuildConfig::new(self.sah_threshold as u32);

        if triangles.is_empty() {
            assert_eq!(
                Bvh::build(&triangles, &config).unwrap_err(),
                BvhError::EmptyInput
            );
            return;
        }

        let bvh = Bvh::build(&triangles, &config).unwrap();
        bvh.assert_consistent(triangles.as_slice());

        // Same input, same bytes.
        let again = Bvh::build(&triangles, &config).unwrap();
        assert_eq!(bvh.packed_bytes(), again.packed_bytes());

        // A culled walk must find exactly the triangles a brute force search finds.
        let query = self.query.point();
        let walked = bvh
            .walk(|node| node.aabb().contains(&query))
            .filter_map(|(_, node)| node.shape_index())
            .filter(|&index| triangles[index].aabb().contains(&query))
            .collect::<HashSet<_>>();
        let expected = (0..triangles.len())
            .filter(|&index| triangles[index].aabb().contains(&query))
            .collect::<HashSet<_>>();
        assert_eq!(walked, expected);

        // A failed rebuild keeps the previous buffers.
        let mut builder = BvhBuilder::new(config);
        builder.build(&triangles).unwrap();
        let (first, second) = FastTriangle::split_halves(&triangles);
        assert!(builder
            .build_from_halves(&first, &second[1..])
            .is_err());
        assert_eq!(builder.packed_nodes(), bvh.packed_nodes());
    }
}
