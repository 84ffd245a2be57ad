//! This module defines the stackless [`Bvh`] and the stages of its construction: splitting
//! node ranges, building the binary tree, linearizing it with skip pointers and packing it
//! into the GPU node buffer.
//!
//! [`Bvh`]: struct.Bvh.html
//!

mod build_node;
mod bvh_impl;
mod bvh_node;
mod hierarchy;
mod iter;
mod joint_bounds;
mod linearize;
mod pack;
mod split;
mod stats;

pub use self::build_node::*;
pub use self::bvh_impl::*;
pub use self::bvh_node::*;
pub use self::hierarchy::*;
pub use self::iter::*;
pub use self::joint_bounds::*;
pub use self::linearize::*;
pub use self::pack::*;
pub use self::split::*;
pub use self::stats::*;
