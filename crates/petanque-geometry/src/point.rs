use serde::{Deserialize, Serialize};

/// A coordinate in image space, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2d {
    /// x coordinate
    pub x: f64,
    /// y coordinate
    pub y: f64,
}

impl Point2d {
    /// Create a new point from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Create a new point from an array of 2 values.
    pub fn from_array(array: &[f64; 2]) -> Self {
        Self {
            x: array[0],
            y: array[1],
        }
    }
}

/// A coordinate in the world, in meters. `z` holds the depth when available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3d {
    /// x coordinate
    pub x: f64,
    /// y coordinate
    pub y: f64,
    /// z coordinate
    pub z: f64,
}

impl Point3d {
    /// Create a new point from its coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create a new point from an array of 3 values.
    pub fn from_array(array: &[f64; 3]) -> Self {
        Self {
            x: array[0],
            y: array[1],
            z: array[2],
        }
    }
}

/// A direction in 3D space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3d {
    /// x component
    pub x: f64,
    /// y component
    pub y: f64,
    /// z component
    pub z: f64,
}

impl Vector3d {
    /// Create a new vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the vector.
    pub fn norm(&self) -> f64 {
        glam::DVec3::from(*self).length()
    }
}

impl From<Vector3d> for glam::DVec3 {
    fn from(v: Vector3d) -> Self {
        glam::DVec3::new(v.x, v.y, v.z)
    }
}

impl From<Point3d> for glam::DVec3 {
    fn from(p: Point3d) -> Self {
        glam::DVec3::new(p.x, p.y, p.z)
    }
}

impl std::ops::Sub for Point3d {
    type Output = Vector3d;

    fn sub(self, rhs: Self) -> Vector3d {
        Vector3d::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}
