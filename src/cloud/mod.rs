//! Point cloud types and density reduction
//!
//! This module provides:
//! - `Point` / `PointCloud` containers (XYZ with optional RGB)
//! - Rigid transforms applied to whole clouds
//! - Voxel grid downsampling

pub mod point;
pub mod voxel;

pub use point::{Point, PointCloud, Transform};
pub use voxel::{Downsample, VoxelGrid, DEFAULT_VOXEL_SIZE};
