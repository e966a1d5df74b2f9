use serde::{Deserialize, Serialize};

use crate::point::{Point2d, Point3d};

/// Represents the intrinsic parameters of a pinhole camera
///
/// # Fields
///
/// * `fx` - The focal length in the x direction
/// * `fy` - The focal length in the y direction
/// * `cx` - The x coordinate of the principal point
/// * `cy` - The y coordinate of the principal point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsic {
    /// The focal length in the x direction, in pixels
    pub fx: f64,
    /// The focal length in the y direction, in pixels
    pub fy: f64,
    /// The x coordinate of the principal point
    pub cx: f64,
    /// The y coordinate of the principal point
    pub cy: f64,
}

impl Default for CameraIntrinsic {
    /// A 1920x1080 sensor with a 1000 pixel focal length.
    fn default() -> Self {
        Self {
            fx: 1000.0,
            fy: 1000.0,
            cx: 960.0,
            cy: 540.0,
        }
    }
}

impl CameraIntrinsic {
    /// Back-project a pixel to a 3D point in the camera frame at the given depth.
    ///
    /// # Arguments
    ///
    /// * `pixel` - The pixel coordinates.
    /// * `depth` - The depth along the optical axis, in meters.
    ///
    /// # Returns
    ///
    /// The 3D point whose `z` equals `depth`.
    pub fn pixel_to_point3d(&self, pixel: &Point2d, depth: f64) -> Point3d {
        Point3d {
            x: (pixel.x - self.cx) * depth / self.fx,
            y: (pixel.y - self.cy) * depth / self.fy,
            z: depth,
        }
    }

    /// Project a 3D point in the camera frame onto the image plane.
    ///
    /// A point with `z == 0` maps to the principal point.
    pub fn point3d_to_pixel(&self, point: &Point3d) -> Point2d {
        if point.z == 0.0 {
            return Point2d::new(self.cx, self.cy);
        }

        Point2d {
            x: point.x * self.fx / point.z + self.cx,
            y: point.y * self.fy / point.z + self.cy,
        }
    }
}

/// Compute the depth of a point from its stereo disparity.
///
/// # Arguments
///
/// * `disparity` - Horizontal disparity between left and right images, in pixels.
/// * `baseline` - Distance between the two cameras, in meters.
/// * `focal_length` - Focal length, in pixels.
///
/// # Returns
///
/// The depth in meters, or `f64::INFINITY` when the disparity is zero.
pub fn depth_from_disparity(disparity: f64, baseline: f64, focal_length: f64) -> f64 {
    if disparity == 0.0 {
        return f64::INFINITY;
    }
    baseline * focal_length / disparity
}

/// Compute the distance from the camera to an object of known size.
///
/// Returns `f64::INFINITY` when the object has no extent in the image.
pub fn distance_from_size(real_size: f64, pixel_size: f64, focal_length: f64) -> f64 {
    if pixel_size == 0.0 {
        return f64::INFINITY;
    }
    real_size * focal_length / pixel_size
}
