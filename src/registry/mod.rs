//! Per-source freshness registry
//!
//! The registry keeps the latest point cloud of each source in a fixed-size
//! slot table, evicts sources that stop sending, and folds the remaining
//! clouds into one merged cloud.
//!
//! # Architecture
//!
//! ```text
//!                         Arc<SourceRegistry>
//!                    ┌──────────────────────────┐
//!                    │ slots: [Option<Arc<      │
//!                    │   RwLock<StreamSlot {    │
//!                    │     cloud, timestamp,    │
//!                    │     pending_transform,   │
//!                    │   }>>>; n_sources]       │
//!                    │ engine: Mutex<MergeEngine>│
//!                    └────────────┬─────────────┘
//!                                 │
//!        ┌────────────────────────┼────────────────────────┐
//!        │                        │                        │
//!        ▼                        ▼                        ▼
//!  [source 0..N]            [cleanup task]            [publisher]
//!  add_cloud()              clean()                   merged_cloud()
//!  set_transform()          evict age > max_age       fold + downsample
//! ```
//!
//! # Snapshot Semantics
//!
//! Stored clouds are `Arc<PointCloud>` and are replaced wholesale, so a
//! merge snapshot only bumps reference counts. A source updated or evicted
//! while a merge runs affects whether it is included, never the points
//! already folded.

pub mod clock;
pub mod config;
pub mod error;
pub mod merge;
pub mod store;
pub mod stream;

pub use clock::{Clock, ClockError, ManualClock, SystemClock};
pub use config::{RegistryConfig, TransformPolicy};
pub use error::RegistryError;
pub use merge::MergeEngine;
pub use store::SourceRegistry;
pub use stream::StreamSlot;
