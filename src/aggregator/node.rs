//! Aggregator node
//!
//! Ties the registry to the outside world: ingests clouds and transforms
//! by channel name, and publishes the merged cloud at a fixed rate to any
//! number of subscribers.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use crate::cloud::{PointCloud, Transform};
use crate::error::Result;
use crate::registry::{RegistryConfig, SourceRegistry};

use super::config::AggregatorConfig;
use super::frame::{parse_source_index, MergedFrame};

/// Point cloud aggregator
pub struct Aggregator {
    config: AggregatorConfig,
    registry: Arc<SourceRegistry>,
    tx: broadcast::Sender<MergedFrame>,
    next_sequence: AtomicU64,
}

impl Aggregator {
    /// Create an aggregator with a fresh registry
    pub fn new(config: AggregatorConfig, registry_config: RegistryConfig) -> Result<Self> {
        let registry = SourceRegistry::new(registry_config)?;
        Ok(Self::with_registry(config, Arc::new(registry)))
    }

    /// Create an aggregator around an existing registry
    pub fn with_registry(config: AggregatorConfig, registry: Arc<SourceRegistry>) -> Self {
        let (tx, _) = broadcast::channel(config.broadcast_capacity);

        Self {
            config,
            registry,
            tx,
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Get a reference to the source registry
    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    /// Get the aggregator configuration
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Subscribe to published frames
    pub fn subscribe(&self) -> broadcast::Receiver<MergedFrame> {
        self.tx.subscribe()
    }

    /// Store a cloud received on `channel`
    pub async fn ingest_cloud(&self, channel: &str, cloud: PointCloud) -> Result<()> {
        let index = parse_source_index(&self.config.channel_prefix, channel)?;
        self.registry.add_cloud(index, cloud).await?;
        Ok(())
    }

    /// Store the sensor transform for `channel`
    pub async fn ingest_transform(&self, channel: &str, transform: Transform) -> Result<()> {
        let index = parse_source_index(&self.config.channel_prefix, channel)?;
        self.registry.set_transform(index, transform).await?;
        Ok(())
    }

    /// Evict stale sources, merge the rest and publish the result
    ///
    /// Returns the published frame. Publishing with no subscribers is not
    /// an error.
    pub async fn publish_once(&self) -> MergedFrame {
        self.registry.clean().await;
        let (cloud, stats) = self.registry.merge().await;

        let timestamp = self.registry.clock().now().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Publishing frame without timestamp");
            Duration::ZERO
        });
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let frame = MergedFrame::from_cloud(
            &cloud,
            self.config.robot_frame.as_str(),
            sequence,
            timestamp,
        );

        let receivers = self.tx.send(frame.clone()).unwrap_or(0);

        tracing::trace!(
            sequence = sequence,
            sources = stats.sources_merged,
            points = frame.point_count,
            receivers = receivers,
            "Merged cloud published"
        );

        frame
    }

    /// Run the publish loop forever
    pub async fn run(&self) {
        self.run_until(std::future::pending()).await
    }

    /// Run the publish loop until `shutdown` completes
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            n_sources = self.registry.n_sources(),
            rate_hz = self.config.publish_rate_hz,
            frame = %self.config.robot_frame,
            "Point cloud aggregator started"
        );

        // Spawn cleanup task for the source registry
        let cleanup_handle = self.registry.spawn_cleanup_task();

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
            }
            _ = self.publish_loop() => {}
        }

        // Stop cleanup task on shutdown
        cleanup_handle.abort();

        tracing::info!("Point cloud aggregator stopped");
    }

    async fn publish_loop(&self) {
        let mut ticker = tokio::time::interval(self.config.publish_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.publish_once().await;
        }
    }
}
