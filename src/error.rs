//! Error types returned by the BVH build.

use thiserror::Error;

/// Errors reported by [`Bvh::build`] and [`BvhBuilder::build`].
///
/// All of them are precondition violations detected before any node is allocated. Degenerate
/// geometry is never an error.
///
/// [`Bvh::build`]: crate::bvh::Bvh::build
/// [`BvhBuilder::build`]: crate::bvh::BvhBuilder::build
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BvhError {
    /// A BVH over zero primitives has no root bounds and no traversal semantics.
    #[error("cannot build a BVH from an empty triangle list")]
    EmptyInput,

    /// The first and second triangle halves do not describe the same triangles.
    #[error("triangle halves differ in length: {first} first halves, {second} second halves")]
    HalvesLengthMismatch {
        /// Number of first halves.
        first: usize,
        /// Number of second halves.
        second: usize,
    },

    /// The node count `2n - 1` would collide with the 32-bit `INVALID` sentinel.
    #[error("{count} triangles exceed the maximum of {max} addressable by 32-bit node indices")]
    TooManyTriangles {
        /// Number of triangles passed in.
        count: usize,
        /// Largest supported number of triangles.
        max: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BvhError>;
