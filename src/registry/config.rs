//! Registry configuration

use std::time::Duration;

use crate::cloud::DEFAULT_VOXEL_SIZE;

use super::error::RegistryError;

/// How a transform that arrives after a cloud is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformPolicy {
    /// Only clouds inserted after the transform are transformed
    #[default]
    NextCloud,
    /// The stored cloud is re-transformed as well
    Retroactive,
}

/// Source registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Number of source slots (fixed for the registry's lifetime)
    pub n_sources: usize,

    /// Slots untouched for longer than this are evicted
    pub max_age: Duration,

    /// Voxel edge length used to downsample the merged cloud
    pub voxel_size: f32,

    /// Handling of transforms arriving after cloud data
    pub transform_policy: TransformPolicy,

    /// Period of the background cleanup task
    pub cleanup_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            n_sources: 1,
            max_age: Duration::from_secs(2),
            voxel_size: DEFAULT_VOXEL_SIZE,
            transform_policy: TransformPolicy::NextCloud,
            cleanup_interval: Duration::from_millis(500),
        }
    }
}

impl RegistryConfig {
    /// Create a config for `n_sources` sources with default TTL
    pub fn with_sources(n_sources: usize) -> Self {
        Self {
            n_sources,
            ..Default::default()
        }
    }

    /// Set the number of sources
    pub fn n_sources(mut self, n: usize) -> Self {
        self.n_sources = n;
        self
    }

    /// Set the maximum slot age
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set the downsampling voxel size
    pub fn voxel_size(mut self, size: f32) -> Self {
        self.voxel_size = size;
        self
    }

    /// Set the transform policy
    pub fn transform_policy(mut self, policy: TransformPolicy) -> Self {
        self.transform_policy = policy;
        self
    }

    /// Set the cleanup task period
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Check the config before a registry is built from it
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.n_sources == 0 {
            return Err(RegistryError::InvalidConfig("n_sources must be positive"));
        }
        if self.max_age.is_zero() {
            return Err(RegistryError::InvalidConfig("max_age must be positive"));
        }
        if !self.voxel_size.is_finite() || self.voxel_size <= 0.0 {
            return Err(RegistryError::InvalidConfig("voxel_size must be positive"));
        }
        if self.cleanup_interval.is_zero() {
            return Err(RegistryError::InvalidConfig(
                "cleanup_interval must be positive",
            ));
        }
        Ok(())
    }
}
