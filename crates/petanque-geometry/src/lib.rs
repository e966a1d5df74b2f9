#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pinhole camera helpers.
pub mod camera;

/// Distance, angle and area operations.
pub mod ops;

/// Point and vector types.
pub mod point;

pub use point::{Point2d, Point3d, Vector3d};
