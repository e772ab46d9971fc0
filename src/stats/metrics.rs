//! Statistics for merges and the source registry

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for a single merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Number of ready sources folded into the result
    pub sources_merged: usize,
    /// Registration attempts (every source after the first)
    pub registrations_attempted: usize,
    /// Attempts whose alignment converged
    pub registrations_converged: usize,
    /// Attempts that fell back to concatenation
    pub fallbacks: usize,
    /// Accumulated point count before downsampling
    pub points_before_downsample: usize,
    /// Point count of the published result
    pub points_after_downsample: usize,
    /// Whether downsampling was applied
    pub downsampled: bool,
}

impl MergeStats {
    /// Create empty merge stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of points kept by downsampling (1.0 for an empty merge)
    pub fn reduction_ratio(&self) -> f64 {
        if self.points_before_downsample > 0 {
            self.points_after_downsample as f64 / self.points_before_downsample as f64
        } else {
            1.0
        }
    }
}

/// Registry-wide statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of slots
    pub n_sources: usize,
    /// Slots currently holding a source
    pub active_sources: usize,
    /// Slots holding a non-empty cloud
    pub ready_sources: usize,
    /// Slots evicted for exceeding the max age
    pub total_evictions: u64,
    /// Merges performed
    pub total_merges: u64,
    /// Registrations that fell back to concatenation
    pub total_fallbacks: u64,
}

impl RegistryStats {
    /// Fraction of slots currently active
    pub fn occupancy(&self) -> f64 {
        if self.n_sources > 0 {
            self.active_sources as f64 / self.n_sources as f64
        } else {
            0.0
        }
    }
}

/// Cumulative counters updated by the registry
#[derive(Debug, Default)]
pub(crate) struct RegistryCounters {
    pub evictions: AtomicU64,
    pub merges: AtomicU64,
    pub fallbacks: AtomicU64,
}

impl RegistryCounters {
    pub fn record_evictions(&self, n: usize) {
        self.evictions.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn record_merge(&self, stats: &MergeStats) {
        self.merges.fetch_add(1, Ordering::Relaxed);
        self.fallbacks
            .fetch_add(stats.fallbacks as u64, Ordering::Relaxed);
    }
}
