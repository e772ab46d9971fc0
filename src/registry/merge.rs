//! Merge engine
//!
//! Folds the ready source clouds into one accumulated cloud:
//!
//! ```text
//!   slot 0 ──► seed ──┐
//!   slot 1 ──► align ─┤  (converged: take aligned result,
//!   slot 2 ──► align ─┤   otherwise: concatenate)
//!   ...               ▼
//!              accumulated ──► downsample (once) ──► merged cloud
//! ```
//!
//! The fold always runs in increasing source index order, so for a
//! deterministic registration the result depends only on slot contents,
//! not on the order in which sources were updated.

use std::sync::Arc;

use crate::cloud::{Downsample, PointCloud};
use crate::registration::Registration;
use crate::stats::MergeStats;

/// Accumulates ready clouds into the merged cloud
pub struct MergeEngine {
    registration: Arc<dyn Registration>,
    downsampler: Arc<dyn Downsample>,
    voxel_size: f32,
    merged: Arc<PointCloud>,
    downsampled: bool,
}

impl MergeEngine {
    /// Create an engine with the given collaborators
    pub fn new(
        registration: Arc<dyn Registration>,
        downsampler: Arc<dyn Downsample>,
        voxel_size: f32,
    ) -> Self {
        Self {
            registration,
            downsampler,
            voxel_size,
            merged: Arc::new(PointCloud::new()),
            downsampled: false,
        }
    }

    /// Result of the most recent fold
    pub fn merged(&self) -> &Arc<PointCloud> {
        &self.merged
    }

    /// Voxel size used for the final downsampling step
    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    /// Discard the previous result
    fn clear(&mut self) {
        self.merged = Arc::new(PointCloud::new());
        self.downsampled = false;
    }

    /// Fold `inputs` (source index, cloud) into a fresh merged cloud
    ///
    /// `inputs` must be ordered by source index. Empty clouds are skipped.
    pub fn fold(&mut self, inputs: &[(usize, Arc<PointCloud>)]) -> MergeStats {
        self.clear();

        let mut stats = MergeStats::new();
        let mut acc = PointCloud::new();

        for (source, cloud) in inputs {
            if cloud.is_empty() {
                continue;
            }

            if stats.sources_merged == 0 {
                // Nothing to register against yet
                acc.extend_from_cloud(cloud);
            } else {
                stats.registrations_attempted += 1;
                let alignment = self.registration.align(&acc, cloud);

                if alignment.converged {
                    stats.registrations_converged += 1;
                    acc = alignment.cloud;
                } else {
                    stats.fallbacks += 1;
                    acc.extend_from_cloud(cloud);
                    tracing::debug!(
                        source = source,
                        points = cloud.len(),
                        "Registration did not converge, concatenating"
                    );
                }
            }

            stats.sources_merged += 1;
        }

        stats.points_before_downsample = acc.len();
        self.merged = Arc::new(acc);
        self.downsample_once();
        stats.points_after_downsample = self.merged.len();
        stats.downsampled = self.downsampled;

        stats
    }

    /// Downsample the merged cloud unless this fold already did
    fn downsample_once(&mut self) {
        if self.downsampled {
            return;
        }
        if !self.merged.is_empty() {
            let reduced = self.downsampler.downsample(&self.merged, self.voxel_size);
            self.merged = Arc::new(reduced);
        }
        self.downsampled = true;
    }
}

impl std::fmt::Debug for MergeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeEngine")
            .field("voxel_size", &self.voxel_size)
            .field("merged_points", &self.merged.len())
            .field("downsampled", &self.downsampled)
            .finish()
    }
}
