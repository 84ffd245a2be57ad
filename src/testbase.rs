//! Common utilities shared by unit tests.
#![cfg(test)]

use nalgebra::{Point3, Vector3};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bvh::BuildNode;
use crate::triangle::FastTriangle;

/// A vector represented as a tuple
pub type TupleVec = (f32, f32, f32);

/// Generate a `TupleVec` for [`proptest::strategy::Strategy`] from -10e10 to 10e10
/// A small enough range to prevent most fp32 errors from breaking certain tests
pub fn tuplevec_small_strategy() -> impl Strategy<Value = TupleVec> {
    (
        -10e10_f32..10e10_f32,
        -10e10_f32..10e10_f32,
        -10e10_f32..10e10_f32,
    )
}

/// Convert a `TupleVec` to a [`Point3`].
pub fn tuple_to_point(tpl: &TupleVec) -> Point3<f32> {
    Point3::new(tpl.0, tpl.1, tpl.2)
}

/// Creates a unit-sized triangle in the XY plane whose bounding box is centered on `center`.
/// The triangle gets the vertex indices `3 * id..3 * id + 3`.
pub fn triangle_at(center: Point3<f32>, id: u32) -> FastTriangle {
    FastTriangle::new(
        center + Vector3::new(-0.5, -0.5, 0.0),
        center + Vector3::new(0.5, -0.5, 0.0),
        center + Vector3::new(0.0, 0.5, 0.0),
        [3 * id, 3 * id + 1, 3 * id + 2],
        id % 4,
    )
}

/// Creates the leaf of every triangle, in input order.
pub fn leaf_nodes(triangles: &[FastTriangle]) -> Vec<BuildNode> {
    triangles
        .iter()
        .enumerate()
        .map(|(index, triangle)| BuildNode::leaf(index as u32, triangle))
        .collect()
}

/// Generate `n` unit triangles along the X axis centered on whole numbers (0, 1, .., n - 1).
/// Neighbouring bounding boxes touch.
pub fn generate_aligned_triangles(n: u32) -> Vec<FastTriangle> {
    (0..n)
        .map(|x| triangle_at(Point3::new(x as f32, 0.0, 0.0), x))
        .collect()
}

/// Creates `n` deterministic random triangles of up to a few units in size, scattered over
/// a cube of 200 units around the origin.
pub fn create_n_random_triangles(n: usize, seed: u64) -> Vec<FastTriangle> {
    fn random_point(rng: &mut StdRng, extent: f32) -> Point3<f32> {
        Point3::new(
            rng.random_range(-extent..extent),
            rng.random_range(-extent..extent),
            rng.random_range(-extent..extent),
        )
    }

    let mut rng = StdRng::seed_from_u64(seed);

    (0..n)
        .map(|i| {
            let center = random_point(&mut rng, 100.0).coords;
            let i = i as u32;
            FastTriangle::new(
                random_point(&mut rng, 2.0) + center,
                random_point(&mut rng, 2.0) + center,
                random_point(&mut rng, 2.0) + center,
                [3 * i, 3 * i + 1, 3 * i + 2],
                i % 16,
            )
        })
        .collect()
}

/// Creates a unit size cube centered at `pos` and pushes its 12 triangles to `triangles`.
fn push_cube(pos: Point3<f32>, object_index: u32, triangles: &mut Vec<FastTriangle>) {
    let top_front_right = pos + Vector3::new(0.5, 0.5, -0.5);
    let top_back_right = pos + Vector3::new(0.5, 0.5, 0.5);
    let top_back_left = pos + Vector3::new(-0.5, 0.5, 0.5);
    let top_front_left = pos + Vector3::new(-0.5, 0.5, -0.5);
    let bottom_front_right = pos + Vector3::new(0.5, -0.5, -0.5);
    let bottom_back_right = pos + Vector3::new(0.5, -0.5, 0.5);
    let bottom_back_left = pos + Vector3::new(-0.5, -0.5, 0.5);
    let bottom_front_left = pos + Vector3::new(-0.5, -0.5, -0.5);

    let faces = [
        [top_back_right, top_front_right, top_front_left],
        [top_front_left, top_back_left, top_back_right],
        [bottom_front_left, bottom_front_right, bottom_back_right],
        [bottom_back_right, bottom_back_left, bottom_front_left],
        [top_back_left, top_front_left, bottom_front_left],
        [bottom_front_left, bottom_back_left, top_back_left],
        [bottom_front_right, top_front_right, top_back_right],
        [top_back_right, bottom_back_right, bottom_front_right],
        [top_front_left, top_front_right, bottom_front_right],
        [bottom_front_right, bottom_front_left, top_front_left],
        [bottom_back_right, top_back_right, top_back_left],
        [top_back_left, bottom_back_left, bottom_back_right],
    ];
    for [a, b, c] in faces {
        let first = 3 * triangles.len() as u32;
        triangles.push(FastTriangle::new(
            a,
            b,
            c,
            [first, first + 1, first + 2],
            object_index,
        ));
    }
}

/// Creates `n` deterministic random cubes, one scene object each. Returns the surface
/// triangles.
pub fn create_n_cubes(n: usize, seed: u64) -> Vec<FastTriangle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut triangles = Vec::with_capacity(12 * n);
    for object_index in 0..n as u32 {
        let pos = Point3::new(
            rng.random_range(-1_000.0..1_000.0),
            rng.random_range(-1_000.0..1_000.0),
            rng.random_range(-1_000.0..1_000.0),
        );
        push_cube(pos, object_index, &mut triangles);
    }
    triangles
}
