//! Axis Aligned Bounding Boxes.

mod aabb_impl;

pub use aabb_impl::*;
use nalgebra::Point3;

/// A trait implemented by things which can be bounded by an [`Aabb`].
///
/// # Examples
/// ```
/// use stackless_bvh::aabb::{Aabb, Bounded};
/// use nalgebra::Point3;
///
/// struct Something;
///
/// impl Bounded for Something {
///     fn aabb(&self) -> Aabb {
///         let point1 = Point3::new(0.0, 0.0, 0.0);
///         let point2 = Point3::new(1.0, 1.0, 1.0);
///         Aabb::with_bounds(point1, point2)
///     }
/// }
///
/// let something = Something;
/// let aabb = something.aabb();
///
/// assert!(aabb.contains(&Point3::new(0.0, 0.0, 0.0)));
/// assert!(aabb.contains(&Point3::new(1.0, 1.0, 1.0)));
/// ```
///
/// [`Aabb`]: struct.Aabb.html
///
pub trait Bounded {
    /// Returns the geometric bounds of this object in the form of an [`Aabb`].
    fn aabb(&self) -> Aabb;
}

impl<T: Bounded> Bounded for &T {
    fn aabb(&self) -> Aabb {
        T::aabb(self)
    }
}

/// Implementation of [`Bounded`] for single points.
impl Bounded for Point3<f32> {
    fn aabb(&self) -> Aabb {
        Aabb::with_bounds(*self, *self)
    }
}
