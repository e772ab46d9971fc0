//! Published frame types
//!
//! A `MergedFrame` is what leaves the aggregator: the merged cloud packed
//! into a flat XYZRGB buffer, tagged with a frame id and a sequence number.

use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use glam::Vec3;

use crate::cloud::{Point, PointCloud};
use crate::error::{Error, Result};

/// Bytes per packed point: x, y, z as f32 plus a packed RGBA u32
pub const POINT_STRIDE: usize = 16;

const ALPHA_OPAQUE: u32 = 0xFF00_0000;

/// Map a channel name such as `"pointcloud3"` to its source index
///
/// The name must be `prefix` immediately followed by a decimal index.
pub fn parse_source_index(prefix: &str, channel: &str) -> Result<usize> {
    channel
        .strip_prefix(prefix)
        .filter(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|suffix| suffix.parse().ok())
        .ok_or_else(|| Error::InvalidChannel(channel.to_string()))
}

/// Merged cloud ready for publishing
///
/// Cheap to clone: the point buffer is reference counted.
#[derive(Debug, Clone)]
pub struct MergedFrame {
    /// Coordinate frame the points are expressed in
    pub frame_id: String,
    /// Monotonic publish counter
    pub sequence: u64,
    /// Wall-clock time the frame was built, since the UNIX epoch
    pub timestamp: Duration,
    /// Number of points in `data`
    pub point_count: usize,
    /// Packed little-endian points, `POINT_STRIDE` bytes each
    pub data: Bytes,
}

impl MergedFrame {
    /// Pack `cloud` into a frame
    pub fn from_cloud(
        cloud: &PointCloud,
        frame_id: impl Into<String>,
        sequence: u64,
        timestamp: Duration,
    ) -> Self {
        Self {
            frame_id: frame_id.into(),
            sequence,
            timestamp,
            point_count: cloud.len(),
            data: encode_points(cloud),
        }
    }

    /// Check if the frame carries no points
    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }

    /// Unpack the points of this frame
    ///
    /// Packed colors are always returned as `Some`, uncolored points come
    /// back black.
    pub fn decode_points(&self) -> PointCloud {
        let mut buf = self.data.clone();
        let mut cloud = PointCloud::with_capacity(self.point_count);

        while buf.remaining() >= POINT_STRIDE {
            let position = Vec3::new(buf.get_f32_le(), buf.get_f32_le(), buf.get_f32_le());
            let rgba = buf.get_u32_le();
            let color = [(rgba >> 16) as u8, (rgba >> 8) as u8, rgba as u8];
            cloud.push(Point {
                position,
                color: Some(color),
            });
        }

        cloud
    }
}

fn encode_points(cloud: &PointCloud) -> Bytes {
    let mut buf = BytesMut::with_capacity(cloud.len() * POINT_STRIDE);

    for p in cloud.points() {
        buf.put_f32_le(p.position.x);
        buf.put_f32_le(p.position.y);
        buf.put_f32_le(p.position.z);
        let [r, g, b] = p.color.unwrap_or([0, 0, 0]);
        buf.put_u32_le(ALPHA_OPAQUE | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32));
    }

    buf.freeze()
}
