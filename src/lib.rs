#![cfg_attr(all(feature = "bench", test), feature(test))]
//! A crate which builds binary bounding volume hierarchies over triangle soups and packs
//! them into a flat buffer that a GPU shader can traverse without a stack.
//!
//! ## About
//!
//! A path tracing shader spends most of its time finding the closest triangle along a ray.
//! With a BVH the intersection test complexity is reduced from O(n) to O(log2(n)) at the cost
//! of building the hierarchy once in advance. Shaders usually have no call stack and very
//! little private memory, so the hierarchy built here is linearized in depth-first order and
//! every node carries a single `next` index. A traversal loop either descends by advancing to
//! the following record, or skips the whole subtree by jumping to `next`.
//!
//! The build pipeline is:
//!
//! 1. leaf nodes are created from [`FastTriangle`]s,
//! 2. a binary tree is built top-down, splitting with the surface area heuristic (SAH)
//!    below a configurable primitive count and with a median split above it,
//! 3. the tree is linearized in depth-first order with skip pointers,
//! 4. the nodes are packed into 16-byte [`PackedNode`] records, two per node.
//!
//! ## Example
//!
//! ```
//! use nalgebra::Point3;
//! use stackless_bvh::bvh::{Bvh, INVALID};
//! use stackless_bvh::config::BuildConfig;
//! use stackless_bvh::triangle::FastTriangle;
//!
//! let mut triangles = Vec::new();
//! for i in 0..100u32 {
//!     let x = i as f32 * 2.0;
//!     triangles.push(FastTriangle::new(
//!         Point3::new(x, 0.0, 0.0),
//!         Point3::new(x + 1.0, 0.0, 0.0),
//!         Point3::new(x, 1.0, 0.0),
//!         [3 * i, 3 * i + 1, 3 * i + 2],
//!         0,
//!     ));
//! }
//!
//! let bvh = Bvh::build(&triangles, &BuildConfig::default()).unwrap();
//! assert_eq!(bvh.nodes().len(), 2 * triangles.len() - 1);
//! assert_eq!(bvh.packed_nodes().len(), 2 * bvh.nodes().len());
//! assert_eq!(bvh.nodes()[0].next, INVALID);
//! ```
//!
//! ## Features
//!
//! - `simd` (default **disabled**) - computes the joint bounds of node ranges with explicit
//!   4-wide SIMD through the `wide` crate
//! - `serde` (default **disabled**) - adds `Serialize` and `Deserialize` implementations for
//!   the configuration and the node types
//! - `demo` (default **disabled**) - builds the `stackless-bvh-demo` binary
//!

#[cfg(all(feature = "bench", test))]
extern crate test;

pub mod aabb;
pub mod axis;
pub mod bvh;
pub mod config;
pub mod error;
pub mod triangle;
mod utils;

#[cfg(test)]
mod testbase;

pub use crate::bvh::{Bvh, BvhBuilder, BvhNode, PackedNode, INVALID};
pub use crate::config::BuildConfig;
pub use crate::error::{BvhError, Result};
pub use crate::triangle::{FastTriangle, FastTriangleFirstHalf, FastTriangleSecondHalf};

#[cfg(doctest)]
doc_comment::doctest!("../README.md");
