//! Per-source slot state
//!
//! A `StreamSlot` holds the latest cloud received from one source, when it
//! was last touched, and the calibration transform applied to incoming
//! clouds. The registry owns every slot; the slot itself knows nothing
//! about locking or eviction.

use std::sync::Arc;
use std::time::Duration;

use crate::cloud::{PointCloud, Transform};

use super::config::TransformPolicy;

/// Check whether a transform carries no usable data
pub fn is_empty_transform(transform: &Transform) -> bool {
    !transform.is_finite()
}

/// State for a single source
#[derive(Debug)]
pub struct StreamSlot {
    source_index: usize,
    cloud: Arc<PointCloud>,
    last_update: Duration,
    pending_transform: Option<Transform>,
}

impl StreamSlot {
    /// Create an empty slot for `source_index`, touched at `now`
    pub(super) fn new(source_index: usize, now: Duration) -> Self {
        Self {
            source_index,
            cloud: Arc::new(PointCloud::new()),
            last_update: now,
            pending_transform: None,
        }
    }

    /// Source index this slot belongs to
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    /// Replace the stored cloud, applying the pending transform first
    pub(super) fn add_cloud(&mut self, mut cloud: PointCloud, now: Duration) {
        if let Some(ref tf) = self.pending_transform {
            cloud.transform_in_place(tf);
        }
        self.cloud = Arc::new(cloud);
        self.last_update = now;
    }

    /// Store the transform applied to incoming clouds
    ///
    /// Under `TransformPolicy::Retroactive` the stored cloud is transformed
    /// as well. Empty transforms are ignored.
    pub(super) fn set_transform(
        &mut self,
        transform: Transform,
        policy: TransformPolicy,
        now: Duration,
    ) {
        if is_empty_transform(&transform) {
            return;
        }

        if policy == TransformPolicy::Retroactive && !self.cloud.is_empty() {
            self.cloud = Arc::new(self.cloud.transformed(&transform));
        }

        self.pending_transform = Some(transform);
        self.last_update = now;
    }

    /// Latest cloud (shared, never mutated in place)
    pub fn cloud(&self) -> &Arc<PointCloud> {
        &self.cloud
    }

    /// Time of last update, since the UNIX epoch
    pub fn timestamp(&self) -> Duration {
        self.last_update
    }

    /// Transform applied to incoming clouds, if any
    pub fn pending_transform(&self) -> Option<&Transform> {
        self.pending_transform.as_ref()
    }

    /// Check if the slot holds a non-empty cloud
    pub fn has_cloud_ready(&self) -> bool {
        !self.cloud.is_empty()
    }

    /// Time elapsed since the last update (zero if `now` is earlier)
    pub fn age(&self, now: Duration) -> Duration {
        now.saturating_sub(self.last_update)
    }

    /// Check if the slot has gone stale
    pub fn is_expired(&self, now: Duration, max_age: Duration) -> bool {
        self.age(now) > max_age
    }
}
