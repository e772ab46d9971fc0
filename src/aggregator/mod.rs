//! Aggregator node: channel ingestion and fixed-rate publishing
//!
//! ```text
//!   "pointcloud0" ─┐                                   ┌──► subscriber
//!   "pointcloud1" ─┼─► ingest_cloud() ─► registry ─►   │
//!   "pointcloudN" ─┘                      │            ├──► subscriber
//!                                 publish_once() ──────┘
//!                                 (every 1 / publish_rate_hz)
//! ```
//!
//! Published frames share one `bytes::Bytes` buffer between all
//! subscribers.

pub mod config;
pub mod frame;
pub mod node;

pub use config::AggregatorConfig;
pub use frame::{parse_source_index, MergedFrame, POINT_STRIDE};
pub use node::Aggregator;
