//! Point cloud aggregation demo with simulated sensors
//!
//! Run with: cargo run --example aggregate [N_SOURCES]
//!
//! Spawns N simulated sensors, each publishing a small ring of points on
//! channel `pointcloud<i>`. The last sensor stops after one second so its
//! slot is evicted once it exceeds the max age (2s). Merged frames are
//! printed as they are published.
//!
//! Set `RUST_LOG=pcl_aggregator=debug` to see slot creation, eviction and
//! per-merge statistics.

use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Duration;

use glam::DVec3;
use pcl_aggregator::cloud::{Point, PointCloud, Transform};
use pcl_aggregator::registry::RegistryConfig;
use pcl_aggregator::{Aggregator, AggregatorConfig};
use tracing_subscriber::EnvFilter;

/// Ring of points around the sensor, colored per source
fn ring(source: usize, phase: f32) -> PointCloud {
    let shade = (source as u8).wrapping_mul(80);
    (0..64)
        .map(|i| {
            let angle = phase + TAU * i as f32 / 64.0;
            Point::with_color(2.0 * angle.cos(), 2.0 * angle.sin(), 0.0, [shade, 255 - shade, 128])
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let n_sources: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(3);

    let aggregator = Arc::new(Aggregator::new(
        AggregatorConfig::default().publish_rate(4),
        RegistryConfig::with_sources(n_sources).max_age(Duration::from_secs(2)),
    )?);

    // Sensors are mounted one meter apart along x
    for source in 0..n_sources {
        let tf = Transform::from_translation(DVec3::new(source as f64, 0.0, 0.0));
        aggregator
            .ingest_transform(&format!("pointcloud{}", source), tf)
            .await?;
    }

    for source in 0..n_sources {
        let aggregator = Arc::clone(&aggregator);
        let lifetime = if source + 1 == n_sources {
            Duration::from_secs(1)
        } else {
            Duration::from_secs(10)
        };

        tokio::spawn(async move {
            let channel = format!("pointcloud{}", source);
            let started = tokio::time::Instant::now();
            let mut ticker = tokio::time::interval(Duration::from_millis(100 + 50 * source as u64));
            let mut phase = 0.0;

            while started.elapsed() < lifetime {
                ticker.tick().await;
                phase += 0.05;
                if let Err(e) = aggregator.ingest_cloud(&channel, ring(source, phase)).await {
                    eprintln!("{}: {}", channel, e);
                }
            }
            println!("{} went silent", channel);
        });
    }

    let mut frames = aggregator.subscribe();
    tokio::spawn(async move {
        while let Ok(frame) = frames.recv().await {
            println!(
                "frame #{} [{}]: {} points, {} bytes",
                frame.sequence,
                frame.frame_id,
                frame.point_count,
                frame.data.len()
            );
        }
    });

    aggregator
        .run_until(tokio::time::sleep(Duration::from_secs(5)))
        .await;

    let stats = aggregator.registry().stats().await;
    println!(
        "Stats: active={} merges={} evictions={} fallbacks={}",
        stats.active_sources, stats.total_merges, stats.total_evictions, stats.total_fallbacks
    );

    Ok(())
}
