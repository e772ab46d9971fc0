//! Source registry implementation
//!
//! The central registry that keeps the latest cloud of every source,
//! evicts sources that went silent, and folds the rest into the merged
//! cloud.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use crate::cloud::{Downsample, PointCloud, Transform, VoxelGrid};
use crate::registration::{Concatenate, Registration};
use crate::stats::{MergeStats, RegistryCounters, RegistryStats};

use super::clock::{Clock, SystemClock};
use super::config::RegistryConfig;
use super::error::RegistryError;
use super::merge::MergeEngine;
use super::stream::{is_empty_transform, StreamSlot};

type Slot = Option<Arc<RwLock<StreamSlot>>>;

/// Registry of per-source slots
///
/// Locking follows two levels. The slot table `RwLock` is taken shared by
/// everything that only touches slot contents (insertion into an existing
/// slot, merge snapshots), so different sources update in parallel. It is
/// taken exclusively only to create or evict slots. Each slot has its own
/// `RwLock`, which serializes writers to the same source.
pub struct SourceRegistry {
    /// Fixed-length slot table indexed by source index
    slots: RwLock<Vec<Slot>>,

    /// Merge state; the lock serializes concurrent merges
    engine: Mutex<MergeEngine>,

    /// Time source for slot ages
    clock: Arc<dyn Clock>,

    counters: RegistryCounters,

    /// Configuration
    config: RegistryConfig,
}

impl SourceRegistry {
    /// Create a registry with the default collaborators
    ///
    /// Uses identity registration, voxel grid downsampling and the system
    /// clock.
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        Self::with_collaborators(
            config,
            Arc::new(Concatenate),
            Arc::new(VoxelGrid),
            Arc::new(SystemClock),
        )
    }

    /// Create a registry with custom registration, downsampling and clock
    pub fn with_collaborators(
        config: RegistryConfig,
        registration: Arc<dyn Registration>,
        downsampler: Arc<dyn Downsample>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RegistryError> {
        config.validate()?;

        let mut slots: Vec<Slot> = Vec::new();
        slots
            .try_reserve_exact(config.n_sources)
            .map_err(|_| RegistryError::AllocationFailure(config.n_sources))?;
        slots.resize_with(config.n_sources, || None);

        let engine = MergeEngine::new(registration, downsampler, config.voxel_size);

        tracing::debug!(
            n_sources = config.n_sources,
            max_age_ms = config.max_age.as_millis() as u64,
            voxel_size = config.voxel_size,
            "Source registry created"
        );

        Ok(Self {
            slots: RwLock::new(slots),
            engine: Mutex::new(engine),
            clock,
            counters: RegistryCounters::default(),
            config,
        })
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Number of source slots
    pub fn n_sources(&self) -> usize {
        self.config.n_sources
    }

    /// Time source used for slot ages
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn check_index(&self, index: usize) -> Result<(), RegistryError> {
        if index < self.config.n_sources {
            Ok(())
        } else {
            tracing::warn!(
                source = index,
                n_sources = self.config.n_sources,
                "Source index out of range"
            );
            Err(RegistryError::IndexOutOfRange {
                index,
                n_sources: self.config.n_sources,
            })
        }
    }

    fn read_clock(&self) -> Result<Duration, RegistryError> {
        self.clock.now().map_err(|e| {
            tracing::warn!(error = %e, "Failed to read clock");
            RegistryError::from(e)
        })
    }

    /// Apply `update` to the slot for `index`, creating the slot if needed
    async fn update_slot<F>(&self, index: usize, now: Duration, update: F)
    where
        F: FnOnce(&mut StreamSlot) + Send,
    {
        // Fast path: the slot exists, only a shared table lock is needed
        let update = {
            let slots = self.slots.read().await;
            match &slots[index] {
                Some(slot) => {
                    update(&mut *slot.write().await);
                    None
                }
                None => Some(update),
            }
        };

        if let Some(update) = update {
            let mut slots = self.slots.write().await;
            // Another writer may have created it in between
            let slot = slots[index].get_or_insert_with(|| {
                tracing::info!(source = index, "Source slot created");
                Arc::new(RwLock::new(StreamSlot::new(index, now)))
            });
            update(&mut *slot.write().await);
        }
    }

    /// Store `cloud` as the latest cloud of source `index`
    ///
    /// Runs an eviction sweep afterwards, so the slot just touched is never
    /// evicted by it.
    pub async fn add_cloud(&self, index: usize, cloud: PointCloud) -> Result<(), RegistryError> {
        self.check_index(index)?;
        let now = self.read_clock()?;

        let points = cloud.len();
        self.update_slot(index, now, move |slot| slot.add_cloud(cloud, now))
            .await;

        tracing::trace!(source = index, points = points, "Cloud stored");

        self.clean().await;
        Ok(())
    }

    /// Set the transform applied to clouds of source `index`
    ///
    /// An empty (non-finite) transform is a no-op.
    pub async fn set_transform(
        &self,
        index: usize,
        transform: Transform,
    ) -> Result<(), RegistryError> {
        self.check_index(index)?;

        if is_empty_transform(&transform) {
            tracing::debug!(source = index, "Ignoring empty transform");
            return Ok(());
        }

        let now = self.read_clock()?;
        let policy = self.config.transform_policy;
        self.update_slot(index, now, move |slot| {
            slot.set_transform(transform, policy, now)
        })
        .await;

        tracing::debug!(source = index, policy = ?policy, "Transform set");
        Ok(())
    }

    /// Indices of slots older than `max_age` at `now`
    async fn expired_slots(&self, now: Duration) -> Vec<usize> {
        let slots = self.slots.read().await;
        let mut expired = Vec::new();

        for (index, entry) in slots.iter().enumerate() {
            if let Some(slot) = entry {
                if slot.read().await.is_expired(now, self.config.max_age) {
                    expired.push(index);
                }
            }
        }

        expired
    }

    /// Evict every slot older than `max_age`
    ///
    /// Returns the number of evicted slots. If the clock cannot be read the
    /// pass is skipped and nothing is evicted.
    pub async fn clean(&self) -> usize {
        let now = match self.clock.now() {
            Ok(now) => now,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping cleanup pass");
                return 0;
            }
        };

        // Scan under the shared lock; the exclusive lock is only taken when
        // there is something to evict
        let candidates = self.expired_slots(now).await;
        if candidates.is_empty() {
            return 0;
        }

        let mut slots = self.slots.write().await;
        let mut evicted = 0;

        for index in candidates {
            // Re-check: the slot may have been refreshed since the scan
            let age = match &slots[index] {
                Some(slot) => slot.read().await.age(now),
                None => continue,
            };

            if age > self.config.max_age {
                slots[index] = None;
                evicted += 1;
                tracing::info!(
                    source = index,
                    age_ms = age.as_millis() as u64,
                    "Source slot evicted"
                );
            }
        }

        if evicted > 0 {
            self.counters.record_evictions(evicted);
        }

        evicted
    }

    /// Ready clouds in source index order
    async fn snapshot(&self) -> Vec<(usize, Arc<PointCloud>)> {
        let slots = self.slots.read().await;
        let mut ready = Vec::with_capacity(slots.len());

        for (index, entry) in slots.iter().enumerate() {
            if let Some(slot) = entry {
                let slot = slot.read().await;
                if slot.has_cloud_ready() {
                    ready.push((index, Arc::clone(slot.cloud())));
                }
            }
        }

        ready
    }

    /// Fold every ready source into a new merged cloud
    ///
    /// Returns the merged cloud together with the statistics of this merge.
    pub async fn merge(&self) -> (Arc<PointCloud>, MergeStats) {
        let mut engine = self.engine.lock().await;
        let inputs = self.snapshot().await;

        let stats = engine.fold(&inputs);
        self.counters.record_merge(&stats);

        tracing::debug!(
            sources = stats.sources_merged,
            fallbacks = stats.fallbacks,
            points_in = stats.points_before_downsample,
            points_out = stats.points_after_downsample,
            "Merged cloud computed"
        );

        (Arc::clone(engine.merged()), stats)
    }

    /// Fold every ready source into a new merged cloud
    pub async fn merged_cloud(&self) -> Arc<PointCloud> {
        self.merge().await.0
    }

    /// Latest cloud of source `index`, if the slot is active
    pub async fn cloud(&self, index: usize) -> Result<Option<Arc<PointCloud>>, RegistryError> {
        self.check_index(index)?;
        let slots = self.slots.read().await;

        match &slots[index] {
            Some(slot) => Ok(Some(Arc::clone(slot.read().await.cloud()))),
            None => Ok(None),
        }
    }

    /// Last update time of source `index`, if the slot is active
    pub async fn timestamp(&self, index: usize) -> Result<Option<Duration>, RegistryError> {
        self.check_index(index)?;
        let slots = self.slots.read().await;

        match &slots[index] {
            Some(slot) => Ok(Some(slot.read().await.timestamp())),
            None => Ok(None),
        }
    }

    /// Check if source `index` holds a non-empty cloud
    pub async fn has_cloud_ready(&self, index: usize) -> Result<bool, RegistryError> {
        self.check_index(index)?;
        let slots = self.slots.read().await;

        match &slots[index] {
            Some(slot) => Ok(slot.read().await.has_cloud_ready()),
            None => Ok(false),
        }
    }

    /// Check if source `index` currently has a slot
    pub async fn is_active(&self, index: usize) -> Result<bool, RegistryError> {
        self.check_index(index)?;
        Ok(self.slots.read().await[index].is_some())
    }

    /// Indices of all active sources
    pub async fn active_sources(&self) -> Vec<usize> {
        self.slots
            .read()
            .await
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|_| index))
            .collect()
    }

    /// Get registry statistics
    pub async fn stats(&self) -> RegistryStats {
        use std::sync::atomic::Ordering;

        let slots = self.slots.read().await;
        let mut active_sources = 0;
        let mut ready_sources = 0;

        for slot in slots.iter().flatten() {
            active_sources += 1;
            if slot.read().await.has_cloud_ready() {
                ready_sources += 1;
            }
        }

        RegistryStats {
            n_sources: self.config.n_sources,
            active_sources,
            ready_sources,
            total_evictions: self.counters.evictions.load(Ordering::Relaxed),
            total_merges: self.counters.merges.load(Ordering::Relaxed),
            total_fallbacks: self.counters.fallbacks.load(Ordering::Relaxed),
        }
    }

    /// Spawn background cleanup task
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        let interval = registry.config.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                registry.clean().await;
            }
        })
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use glam::{DVec3, Vec3};
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::cloud::Point;
    use crate::registration::Alignment;
    use crate::registry::clock::{ClockError, ManualClock};

    const SECOND: Duration = Duration::from_secs(1);

    fn cloud_at(x: f32, n: usize) -> PointCloud {
        (0..n).map(|i| Point::new(x, i as f32, 0.0)).collect()
    }

    fn registry_with_clock(n_sources: usize, max_age: Duration) -> (SourceRegistry, ManualClock) {
        let clock = ManualClock::new(Duration::from_secs(1_000));
        let config = RegistryConfig::with_sources(n_sources).max_age(max_age);
        let registry = SourceRegistry::with_collaborators(
            config,
            Arc::new(Concatenate),
            Arc::new(VoxelGrid),
            Arc::new(clock.clone()),
        )
        .unwrap();
        (registry, clock)
    }

    struct NeverConverges;

    impl Registration for NeverConverges {
        fn align(&self, _target: &PointCloud, _source: &PointCloud) -> Alignment {
            Alignment::diverged()
        }
    }

    struct BrokenClock;

    impl Clock for BrokenClock {
        fn now(&self) -> Result<Duration, ClockError> {
            Err(ClockError("clock before epoch".into()))
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = SourceRegistry::new(RegistryConfig::default().n_sources(0));

        assert!(matches!(result, Err(RegistryError::InvalidConfig(_))));
    }

    #[test]
    fn test_new_allocation_failure() {
        let result = SourceRegistry::new(RegistryConfig::with_sources(usize::MAX));

        assert!(matches!(
            result,
            Err(RegistryError::AllocationFailure(n)) if n == usize::MAX
        ));
    }

    #[tokio::test]
    async fn test_add_cloud_marks_ready() {
        let (registry, clock) = registry_with_clock(3, 2 * SECOND);

        assert_ok!(registry.add_cloud(1, cloud_at(0.0, 4)).await);

        assert!(registry.has_cloud_ready(1).await.unwrap());
        assert!(!registry.has_cloud_ready(0).await.unwrap());
        assert_eq!(
            registry.timestamp(1).await.unwrap(),
            Some(clock.now().unwrap())
        );
        assert_eq!(registry.active_sources().await, vec![1]);
    }

    #[tokio::test]
    async fn test_add_cloud_system_clock_timestamp() {
        let registry = SourceRegistry::new(RegistryConfig::with_sources(1)).unwrap();

        registry.add_cloud(0, cloud_at(0.0, 1)).await.unwrap();

        let stamp = registry.timestamp(0).await.unwrap().unwrap();
        let now = SystemClock.now().unwrap();
        assert!(now.saturating_sub(stamp) < SECOND);
    }

    #[tokio::test]
    async fn test_out_of_range_index() {
        let (registry, _clock) = registry_with_clock(2, 2 * SECOND);
        registry.add_cloud(0, cloud_at(0.0, 1)).await.unwrap();

        let result = registry.add_cloud(2, cloud_at(0.0, 1)).await;
        assert!(matches!(
            result,
            Err(RegistryError::IndexOutOfRange {
                index: 2,
                n_sources: 2
            })
        ));

        assert_err!(registry.set_transform(7, Transform::IDENTITY).await);
        assert_err!(registry.has_cloud_ready(2).await);

        // Table unchanged
        assert_eq!(registry.active_sources().await, vec![0]);
        assert_eq!(registry.stats().await.active_sources, 1);
    }

    #[tokio::test]
    async fn test_set_transform_creates_slot() {
        let (registry, _clock) = registry_with_clock(2, 2 * SECOND);
        let tf = Transform::from_translation(DVec3::new(0.0, 0.0, 1.0));

        registry.set_transform(1, tf).await.unwrap();

        assert!(registry.is_active(1).await.unwrap());
        assert!(!registry.has_cloud_ready(1).await.unwrap());

        registry.add_cloud(1, cloud_at(2.0, 1)).await.unwrap();
        let cloud = registry.cloud(1).await.unwrap().unwrap();
        assert_eq!(cloud.points()[0].position, Vec3::new(2.0, 0.0, 1.0));
    }

    #[tokio::test]
    async fn test_empty_transform_does_not_create_slot() {
        let (registry, _clock) = registry_with_clock(2, 2 * SECOND);
        let mut tf = Transform::IDENTITY;
        tf.matrix3.x_axis.x = f64::INFINITY;

        registry.set_transform(0, tf).await.unwrap();

        assert!(!registry.is_active(0).await.unwrap());
    }

    #[tokio::test]
    async fn test_ttl_eviction() {
        let (registry, clock) = registry_with_clock(2, 2 * SECOND);
        registry.add_cloud(0, cloud_at(0.0, 1)).await.unwrap();

        // Just inside the TTL
        clock.advance(2 * SECOND - Duration::from_millis(1));
        assert_eq!(registry.clean().await, 0);
        assert!(registry.is_active(0).await.unwrap());

        clock.advance(Duration::from_millis(2));
        assert_eq!(registry.clean().await, 1);
        assert!(!registry.is_active(0).await.unwrap());
        assert_eq!(registry.timestamp(0).await.unwrap(), None);
        assert_eq!(registry.stats().await.total_evictions, 1);
    }

    #[tokio::test]
    async fn test_clean_is_idempotent() {
        let (registry, clock) = registry_with_clock(3, 2 * SECOND);
        registry.add_cloud(0, cloud_at(0.0, 1)).await.unwrap();
        clock.advance(SECOND);
        registry.add_cloud(1, cloud_at(1.0, 1)).await.unwrap();

        clock.advance(SECOND + Duration::from_millis(500));
        assert_eq!(registry.clean().await, 1);
        assert_eq!(registry.clean().await, 0);
        assert_eq!(registry.active_sources().await, vec![1]);
    }

    #[tokio::test]
    async fn test_add_cloud_evicts_stale_siblings() {
        let (registry, clock) = registry_with_clock(2, 2 * SECOND);
        registry.add_cloud(0, cloud_at(0.0, 1)).await.unwrap();

        clock.advance(3 * SECOND);
        registry.add_cloud(1, cloud_at(1.0, 1)).await.unwrap();

        assert_eq!(registry.active_sources().await, vec![1]);
    }

    #[tokio::test]
    async fn test_refresh_after_long_silence_keeps_slot() {
        let (registry, clock) = registry_with_clock(1, 2 * SECOND);
        registry.add_cloud(0, cloud_at(0.0, 1)).await.unwrap();

        // The stale slot is refreshed before the sweep runs
        clock.advance(10 * SECOND);
        registry.add_cloud(0, cloud_at(5.0, 1)).await.unwrap();

        assert!(registry.has_cloud_ready(0).await.unwrap());
    }

    #[tokio::test]
    async fn test_clock_failure_skips_clean() {
        let config = RegistryConfig::with_sources(1);
        let registry = SourceRegistry::with_collaborators(
            config,
            Arc::new(Concatenate),
            Arc::new(VoxelGrid),
            Arc::new(BrokenClock),
        )
        .unwrap();

        assert_eq!(registry.clean().await, 0);

        let result = registry.add_cloud(0, cloud_at(0.0, 1)).await;
        assert!(matches!(result, Err(RegistryError::TimeSource(_))));
        assert!(!registry.is_active(0).await.unwrap());
    }

    #[tokio::test]
    async fn test_merge_single_source() {
        let (registry, _clock) = registry_with_clock(3, 2 * SECOND);
        let cloud = cloud_at(0.0, 5);
        registry.add_cloud(0, cloud.clone()).await.unwrap();

        let (merged, stats) = registry.merge().await;

        assert_eq!(*merged, VoxelGrid.downsample(&cloud, 0.1));
        assert_eq!(stats.registrations_attempted, 0);
        assert_eq!(stats.sources_merged, 1);
    }

    #[tokio::test]
    async fn test_merge_order_independent_of_insert_order() {
        let a = cloud_at(0.0, 3);
        let b = cloud_at(10.0, 4);

        let (forward, _c1) = registry_with_clock(3, 2 * SECOND);
        forward.add_cloud(0, a.clone()).await.unwrap();
        forward.add_cloud(2, b.clone()).await.unwrap();

        let (reverse, _c2) = registry_with_clock(3, 2 * SECOND);
        reverse.add_cloud(2, b.clone()).await.unwrap();
        reverse.add_cloud(0, a.clone()).await.unwrap();

        let mut union = a.clone();
        union.extend_from_cloud(&b);
        let expected = VoxelGrid.downsample(&union, 0.1);

        assert_eq!(*forward.merged_cloud().await, expected);
        assert_eq!(*reverse.merged_cloud().await, expected);
    }

    #[tokio::test]
    async fn test_merge_idempotent() {
        let (registry, _clock) = registry_with_clock(2, 2 * SECOND);
        registry.add_cloud(0, cloud_at(0.0, 3)).await.unwrap();
        registry.add_cloud(1, cloud_at(3.0, 3)).await.unwrap();

        let first = registry.merged_cloud().await;
        let second = registry.merged_cloud().await;

        assert_eq!(*first, *second);
        assert_eq!(registry.stats().await.total_merges, 2);
    }

    #[tokio::test]
    async fn test_merge_fallback_keeps_all_points() {
        let clock = ManualClock::new(Duration::from_secs(1_000));
        let registry = SourceRegistry::with_collaborators(
            RegistryConfig::with_sources(3),
            Arc::new(NeverConverges),
            Arc::new(VoxelGrid),
            Arc::new(clock),
        )
        .unwrap();
        for i in 0..3 {
            registry
                .add_cloud(i, cloud_at(i as f32 * 10.0, 4))
                .await
                .unwrap();
        }

        let (merged, stats) = registry.merge().await;

        assert_eq!(stats.fallbacks, 2);
        assert_eq!(stats.points_before_downsample, 12);
        // Points are 1 m apart, so the 0.1 m voxel grid keeps them all
        assert_eq!(merged.len(), 12);
        assert_eq!(registry.stats().await.total_fallbacks, 2);
    }

    #[tokio::test]
    async fn test_merge_skips_unready_slots() {
        let (registry, _clock) = registry_with_clock(3, 2 * SECOND);
        registry.set_transform(0, Transform::IDENTITY).await.unwrap();
        registry.add_cloud(1, PointCloud::new()).await.unwrap();
        registry.add_cloud(2, cloud_at(0.0, 2)).await.unwrap();

        let (merged, stats) = registry.merge().await;

        assert_eq!(stats.sources_merged, 1);
        assert_eq!(merged.len(), 2);

        let snapshot = registry.stats().await;
        assert_eq!(snapshot.active_sources, 3);
        assert_eq!(snapshot.ready_sources, 1);
    }

    #[tokio::test]
    async fn test_three_source_scenario() {
        let (registry, clock) = registry_with_clock(3, 2 * SECOND);
        let start = clock.now().unwrap();

        registry.add_cloud(0, cloud_at(0.0, 2)).await.unwrap();
        registry.add_cloud(1, cloud_at(5.0, 2)).await.unwrap();
        clock.set(start + SECOND);
        registry.add_cloud(2, cloud_at(10.0, 2)).await.unwrap();

        clock.set(start + Duration::from_millis(1_500));
        assert_eq!(registry.clean().await, 0);
        let (merged, stats) = registry.merge().await;
        assert_eq!(stats.sources_merged, 3);
        assert_eq!(merged.len(), 6);

        clock.set(start + Duration::from_millis(2_100));
        assert_eq!(registry.clean().await, 2);
        let (merged, stats) = registry.merge().await;
        assert_eq!(stats.sources_merged, 1);
        assert_eq!(*merged, VoxelGrid.downsample(&cloud_at(10.0, 2), 0.1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_ingest_and_merge() {
        let registry = Arc::new(SourceRegistry::new(RegistryConfig::with_sources(8)).unwrap());

        let mut handles = Vec::new();
        for source in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                for round in 0..20 {
                    registry
                        .add_cloud(source, cloud_at(source as f32 * 100.0 + round as f32, 3))
                        .await
                        .unwrap();
                }
            }));
        }

        let merger = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                for _ in 0..20 {
                    let (_, stats) = registry.merge().await;
                    assert!(stats.sources_merged <= 8);
                }
            })
        };

        for handle in handles {
            handle.await.unwrap();
        }
        merger.await.unwrap();

        let (merged, stats) = registry.merge().await;
        assert_eq!(stats.sources_merged, 8);
        assert_eq!(merged.len(), 24);
    }

    #[tokio::test]
    async fn test_cleanup_task_evicts() {
        let config = RegistryConfig::with_sources(1)
            .max_age(Duration::from_millis(100))
            .cleanup_interval(Duration::from_millis(10));
        let clock = ManualClock::new(Duration::from_secs(1_000));
        let registry = Arc::new(
            SourceRegistry::with_collaborators(
                config,
                Arc::new(Concatenate),
                Arc::new(VoxelGrid),
                Arc::new(clock.clone()),
            )
            .unwrap(),
        );
        registry.add_cloud(0, cloud_at(0.0, 1)).await.unwrap();

        let handle = registry.spawn_cleanup_task();
        clock.advance(Duration::from_millis(200));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!registry.is_active(0).await.unwrap());
        handle.abort();
    }
}
