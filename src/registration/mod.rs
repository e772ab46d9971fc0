//! Geometric registration collaborator
//!
//! The merge engine aligns each additional source onto the accumulated
//! cloud through the `Registration` trait. Implementations report whether
//! the alignment converged; a non-converged alignment is never fatal, the
//! engine falls back to plain concatenation instead.

use crate::cloud::PointCloud;

/// Outcome of aligning a source cloud onto a target cloud
#[derive(Debug, Clone)]
pub struct Alignment {
    /// The combined cloud (target plus aligned source). Only meaningful
    /// when `converged` is true.
    pub cloud: PointCloud,
    /// Whether the alignment converged
    pub converged: bool,
}

impl Alignment {
    /// A converged alignment producing `cloud`
    pub fn converged(cloud: PointCloud) -> Self {
        Self {
            cloud,
            converged: true,
        }
    }

    /// A failed alignment
    pub fn diverged() -> Self {
        Self {
            cloud: PointCloud::new(),
            converged: false,
        }
    }
}

/// Trait for point cloud registration algorithms
///
/// Implementations are expected to bound their own iteration count.
pub trait Registration: Send + Sync {
    /// Align `source` onto `target`.
    ///
    /// On convergence the returned cloud replaces the accumulated cloud.
    fn align(&self, target: &PointCloud, source: &PointCloud) -> Alignment;
}

/// Identity registration: every source is assumed to already share the
/// target's frame, so alignment always converges and returns the union.
#[derive(Debug, Clone, Copy, Default)]
pub struct Concatenate;

impl Registration for Concatenate {
    fn align(&self, target: &PointCloud, source: &PointCloud) -> Alignment {
        let mut cloud = PointCloud::with_capacity(target.len() + source.len());
        cloud.extend_from_cloud(target);
        cloud.extend_from_cloud(source);
        Alignment::converged(cloud)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::Point;

    #[test]
    fn test_concatenate_preserves_order() {
        let target = PointCloud::from_points(vec![Point::new(0.0, 0.0, 0.0)]);
        let source = PointCloud::from_points(vec![Point::new(1.0, 1.0, 1.0)]);

        let result = Concatenate.align(&target, &source);

        assert!(result.converged);
        assert_eq!(result.cloud.len(), 2);
        assert_eq!(result.cloud.points()[0], target.points()[0]);
        assert_eq!(result.cloud.points()[1], source.points()[0]);
    }

    #[test]
    fn test_diverged_is_empty() {
        let result = Alignment::diverged();

        assert!(!result.converged);
        assert!(result.cloud.is_empty());
    }
}
