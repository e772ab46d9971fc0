//! Voxel grid downsampling
//!
//! Space is divided into cubes of `voxel_size` meters; every occupied cube
//! is replaced by the centroid of the points that fell into it. Output
//! order follows the first occurrence of each voxel in the input, so the
//! filter is deterministic for a fixed input and voxel size. Points with a
//! non-finite coordinate are dropped.

use std::collections::HashMap;

use glam::Vec3;

use super::point::{Point, PointCloud};

/// Default voxel edge length in meters
pub const DEFAULT_VOXEL_SIZE: f32 = 0.1;

/// Density reduction collaborator
pub trait Downsample: Send + Sync {
    /// Reduce `cloud` to at most one point per `voxel_size` cube
    fn downsample(&self, cloud: &PointCloud, voxel_size: f32) -> PointCloud;
}

/// Centroid voxel grid filter
#[derive(Debug, Clone, Copy, Default)]
pub struct VoxelGrid;

/// Running sums for one occupied voxel
struct Cell {
    sum: Vec3,
    rgb_sum: [u64; 3],
    count: u64,
    all_colored: bool,
}

impl Cell {
    fn new() -> Self {
        Self {
            sum: Vec3::ZERO,
            rgb_sum: [0; 3],
            count: 0,
            all_colored: true,
        }
    }

    fn add(&mut self, point: &Point) {
        self.sum += point.position;
        self.count += 1;
        match point.color {
            Some([r, g, b]) => {
                self.rgb_sum[0] += r as u64;
                self.rgb_sum[1] += g as u64;
                self.rgb_sum[2] += b as u64;
            }
            None => self.all_colored = false,
        }
    }

    fn centroid(&self) -> Point {
        let n = self.count.max(1);
        let color = if self.all_colored {
            Some([
                (self.rgb_sum[0] / n) as u8,
                (self.rgb_sum[1] / n) as u8,
                (self.rgb_sum[2] / n) as u8,
            ])
        } else {
            None
        };
        Point {
            position: self.sum / n as f32,
            color,
        }
    }
}

impl Downsample for VoxelGrid {
    fn downsample(&self, cloud: &PointCloud, voxel_size: f32) -> PointCloud {
        if cloud.is_empty() || !voxel_size.is_finite() || voxel_size <= 0.0 {
            return cloud.clone();
        }

        let inv = 1.0 / voxel_size;
        let mut index: HashMap<(i32, i32, i32), usize> = HashMap::with_capacity(cloud.len());
        let mut cells: Vec<Cell> = Vec::new();

        for p in cloud.points() {
            if !p.position.is_finite() {
                continue;
            }

            let v = (p.position * inv).floor();
            let key = (v.x as i32, v.y as i32, v.z as i32);

            let slot = *index.entry(key).or_insert_with(|| {
                cells.push(Cell::new());
                cells.len() - 1
            });
            cells[slot].add(p);
        }

        cells.iter().map(Cell::centroid).collect()
    }
}
