//! Point and point cloud containers
//!
//! Positions are stored as `f32` (matching the usual XYZRGB sensor layout),
//! while transforms use `f64` so that chained calibration transforms do not
//! accumulate single-precision error.

use glam::{DAffine3, Vec3};

/// Rigid (or general affine) 3-D transform applied to incoming clouds
pub type Transform = DAffine3;

/// A single 3-D point with optional color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Position in the cloud's frame
    pub position: Vec3,
    /// RGB color, if the sensor provides one
    pub color: Option<[u8; 3]>,
}

impl Point {
    /// Create an uncolored point
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            color: None,
        }
    }

    /// Create a colored point
    pub fn with_color(x: f32, y: f32, z: f32, rgb: [u8; 3]) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            color: Some(rgb),
        }
    }

    /// Return this point with `transform` applied to its position
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            position: transform
                .transform_point3(self.position.as_dvec3())
                .as_vec3(),
            color: self.color,
        }
    }
}

/// An ordered collection of points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    points: Vec<Point>,
}

impl PointCloud {
    /// Create an empty cloud
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cloud with room for `capacity` points
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Wrap an existing point vector
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the cloud holds no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Borrow the points
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Append a single point
    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Append every point of `other` (plain concatenation, no alignment)
    pub fn extend_from_cloud(&mut self, other: &PointCloud) {
        self.points.extend_from_slice(&other.points);
    }

    /// Remove all points, keeping the allocation
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Apply `transform` to every point in place
    pub fn transform_in_place(&mut self, transform: &Transform) {
        for p in &mut self.points {
            *p = p.transformed(transform);
        }
    }

    /// Return a transformed copy
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            points: self.points.iter().map(|p| p.transformed(transform)).collect(),
        }
    }

    /// Mean position of all points, or `None` for an empty cloud
    pub fn centroid(&self) -> Option<Vec3> {
        if self.points.is_empty() {
            return None;
        }
        let sum = self
            .points
            .iter()
            .fold(Vec3::ZERO, |acc, p| acc + p.position);
        Some(sum / self.points.len() as f32)
    }

    /// Consume the cloud and return its points
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }
}

impl FromIterator<Point> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl Extend<Point> for PointCloud {
    fn extend<I: IntoIterator<Item = Point>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}
