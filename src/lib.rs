//! Multi-source point cloud aggregation
//!
//! Sensors publish point clouds on independent channels. This crate keeps
//! the latest cloud of every source, drops sources that went silent for
//! longer than a configured age, and folds the fresh ones into a single
//! downsampled cloud for publishing.
//!
//! # Modules
//!
//! - [`cloud`]: point cloud types, transforms and voxel downsampling
//! - [`registration`]: geometric registration collaborator
//! - [`registry`]: per-source slot table, TTL eviction and merging
//! - [`aggregator`]: channel ingestion and fixed-rate publishing
//! - [`stats`]: merge and registry statistics
//!
//! # Example
//!
//! ```no_run
//! use pcl_aggregator::cloud::{Point, PointCloud};
//! use pcl_aggregator::registry::{RegistryConfig, SourceRegistry};
//!
//! # async fn example() -> Result<(), pcl_aggregator::registry::RegistryError> {
//! let registry = SourceRegistry::new(RegistryConfig::with_sources(2))?;
//!
//! let cloud = PointCloud::from_points(vec![Point::new(1.0, 0.0, 0.5)]);
//! registry.add_cloud(0, cloud).await?;
//!
//! let merged = registry.merged_cloud().await;
//! println!("merged {} points", merged.len());
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod cloud;
pub mod error;
pub mod registration;
pub mod registry;
pub mod stats;

pub use aggregator::{Aggregator, AggregatorConfig, MergedFrame};
pub use cloud::{Point, PointCloud, Transform};
pub use error::{Error, Result};
pub use registry::{RegistryConfig, SourceRegistry};
