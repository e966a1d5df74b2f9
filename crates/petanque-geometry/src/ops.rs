use crate::point::{Point2d, Point3d, Vector3d};

/// Compute the Euclidean distance between two points in image space.
///
/// # Arguments
///
/// * `a` - A point in pixels.
/// * `b` - Another point in pixels.
///
/// # Returns
///
/// The distance between the two points, in pixels.
///
/// Example:
/// ```
/// use petanque_geometry::{ops::distance_2d, Point2d};
///
/// let a = Point2d::new(0.0, 0.0);
/// let b = Point2d::new(3.0, 4.0);
/// assert_eq!(distance_2d(&a, &b), 5.0);
/// ```
pub fn distance_2d(a: &Point2d, b: &Point2d) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Compute the Euclidean distance between two points in 3D space.
///
/// Example:
/// ```
/// use petanque_geometry::{ops::distance_3d, Point3d};
///
/// let a = Point3d::new(1.0, 2.0, 3.0);
/// let b = Point3d::new(4.0, 5.0, 6.0);
/// let dst = distance_3d(&a, &b);
/// ```
pub fn distance_3d(a: &Point3d, b: &Point3d) -> f64 {
    (*a - *b).norm()
}

/// Compute the angle between two vectors, in degrees.
///
/// The cosine is clamped to `[-1, 1]` before `acos` so rounding cannot leave the
/// domain. If either vector has zero magnitude the angle is defined as `0`.
///
/// # Arguments
///
/// * `u` - The first vector.
/// * `v` - The second vector.
///
/// # Returns
///
/// The angle in degrees, in `[0, 180]`.
pub fn angle_between(u: &Vector3d, v: &Vector3d) -> f64 {
    let u = glam::DVec3::from(*u);
    let v = glam::DVec3::from(*v);

    let norms = u.length() * v.length();
    if norms == 0.0 {
        return 0.0;
    }

    let cos_angle = (u.dot(v) / norms).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

/// Compute the area of the triangle spanned by three points using the shoelace formula.
pub fn triangle_area(p1: &Point2d, p2: &Point2d, p3: &Point2d) -> f64 {
    ((p1.x * (p2.y - p3.y) + p2.x * (p3.y - p1.y) + p3.x * (p1.y - p2.y)) / 2.0).abs()
}

/// Check whether two points are at most `threshold` apart.
pub fn is_within_distance(a: &Point3d, b: &Point3d, threshold: f64) -> bool {
    distance_3d(a, b) <= threshold
}

/// Find the point closest to `reference`.
///
/// # Returns
///
/// The index of the nearest point and its distance, or `None` if `points` is empty.
/// On exact ties the earliest point wins.
pub fn find_nearest(reference: &Point3d, points: &[Point3d]) -> Option<(usize, f64)> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, distance_3d(reference, p)))
        .fold(None, |best, (i, d)| match best {
            Some((_, best_d)) if best_d <= d => best,
            _ => Some((i, d)),
        })
}

/// Sort the points by their distance to `reference`.
///
/// # Returns
///
/// A vector of `(index, distance)` pairs in ascending order of distance. The sort is
/// stable, so equally distant points keep their input order.
pub fn sort_by_distance(reference: &Point3d, points: &[Point3d]) -> Vec<(usize, f64)> {
    let mut sorted = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, distance_3d(reference, p)))
        .collect::<Vec<_>>();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_2d() {
        let a = Point2d::new(1.0, 1.0);
        let b = Point2d::new(4.0, 5.0);
        assert_relative_eq!(distance_2d(&a, &b), 5.0);
        assert_eq!(distance_2d(&a, &a), 0.0);
    }

    #[test]
    fn test_distance_2d_symmetric() {
        for _ in 0..100 {
            let a = Point2d::new(rand::random::<f64>() * 1920.0, rand::random::<f64>() * 1080.0);
            let b = Point2d::new(rand::random::<f64>() * 1920.0, rand::random::<f64>() * 1080.0);
            assert_eq!(distance_2d(&a, &b), distance_2d(&b, &a));
            assert!(distance_2d(&a, &b) >= 0.0);
        }
    }

    #[test]
    fn test_distance_3d() {
        let a = Point3d::new(1.0, 2.0, 3.0);
        let b = Point3d::new(4.0, 5.0, 6.0);
        assert_relative_eq!(distance_3d(&a, &b), 5.196152, epsilon = 1e-6);
        assert_eq!(distance_3d(&b, &b), 0.0);
    }

    #[test]
    fn test_angle_between() {
        let x = Vector3d::new(1.0, 0.0, 0.0);
        let y = Vector3d::new(0.0, 2.0, 0.0);
        assert_relative_eq!(angle_between(&x, &y), 90.0, epsilon = 1e-9);
        assert_relative_eq!(angle_between(&x, &x), 0.0, epsilon = 1e-6);

        let neg_x = Vector3d::new(-3.0, 0.0, 0.0);
        assert_relative_eq!(angle_between(&x, &neg_x), 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_angle_between_parallel_does_not_overshoot() {
        // the cosine of parallel vectors may round above 1.0
        let u = Vector3d::new(0.1, 0.2, 0.3);
        let v = Vector3d::new(0.3, 0.6, 0.9);
        let angle = angle_between(&u, &v);
        assert!(angle.is_finite());
        assert_relative_eq!(angle, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_angle_between_zero_vector() {
        let zero = Vector3d::default();
        let v = Vector3d::new(1.0, 1.0, 1.0);
        assert_eq!(angle_between(&zero, &v), 0.0);
        assert_eq!(angle_between(&v, &zero), 0.0);
    }

    #[test]
    fn test_triangle_area() {
        let p1 = Point2d::new(0.0, 0.0);
        let p2 = Point2d::new(4.0, 0.0);
        let p3 = Point2d::new(0.0, 3.0);
        assert_relative_eq!(triangle_area(&p1, &p2, &p3), 6.0);
        // orientation does not matter
        assert_relative_eq!(triangle_area(&p1, &p3, &p2), 6.0);
        // collinear points
        let p4 = Point2d::new(8.0, 0.0);
        assert_eq!(triangle_area(&p1, &p2, &p4), 0.0);
    }

    #[test]
    fn test_is_within_distance() {
        let a = Point3d::new(1.0, 0.5, 0.0);
        let b = Point3d::new(1.5, 0.5, 0.0);
        assert!(is_within_distance(&a, &b, 0.5));
        assert!(!is_within_distance(&a, &b, 0.49));
    }

    #[test]
    fn test_find_nearest() {
        let reference = Point3d::default();
        assert_eq!(find_nearest(&reference, &[]), None);

        let points = [
            Point3d::new(2.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(0.0, 0.0, 1.0),
        ];
        let (index, distance) = find_nearest(&reference, &points).unwrap();
        assert_eq!(index, 1);
        assert_relative_eq!(distance, 1.0);
    }

    #[test]
    fn test_sort_by_distance_is_stable() {
        let reference = Point3d::default();
        let points = [
            Point3d::new(3.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
        ];
        let sorted = sort_by_distance(&reference, &points);
        let order = sorted.iter().map(|(i, _)| *i).collect::<Vec<_>>();
        assert_eq!(order, vec![1, 2, 0]);
    }
}
