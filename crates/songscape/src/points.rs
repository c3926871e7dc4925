//! Point payload decoding and density tiers.

use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Half-extent of the navigable world, in world units.
pub const DEFAULT_WORLD_LIMIT: f64 = 3.0;

/// Size of one encoded point: three little-endian `f32`.
pub const POINT_STRIDE_BYTES: usize = 12;

/// One renderable point. Layout matches the point shader's instance input.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointRecord {
    pub x: f32,
    pub y: f32,
    /// Normalized feature in [0, 1], mapped to hue when drawn.
    pub feature: f32,
}

/// Fixed point-count configurations trading fidelity for speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DensityTier {
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
}

impl DensityTier {
    pub fn point_count(self) -> usize {
        match self {
            Self::Small => 50_000,
            Self::Medium => 100_000,
            Self::Large => 500_000,
            Self::ExtraLarge => 1_000_000,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Small => "50k",
            Self::Medium => "100k",
            Self::Large => "500k",
            Self::ExtraLarge => "1M",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Small => "Potato / Low Power",
            Self::Medium => "Balanced Performance",
            Self::Large => "High End GPU",
            Self::ExtraLarge => "Experimental",
        }
    }

    /// Pan bound for this tier. All baked datasets share one embedding extent.
    pub fn world_limit(self) -> f64 {
        DEFAULT_WORLD_LIMIT
    }

    /// Bundled dataset file, relative to the dataset root. The largest tier
    /// has no bundled file and is served by the API.
    pub fn bundled_path(self) -> Option<&'static str> {
        match self {
            Self::Small => Some("sm/sm_coords.bin"),
            Self::Medium => Some("m/m_coords.bin"),
            Self::Large => Some("l/l_coords.bin"),
            Self::ExtraLarge => None,
        }
    }
}

impl fmt::Display for DensityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DensityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "small" | "50k" => Ok(Self::Small),
            "m" | "medium" | "100k" => Ok(Self::Medium),
            "l" | "large" | "500k" => Ok(Self::Large),
            "xl" | "extra-large" | "1m" => Ok(Self::ExtraLarge),
            other => Err(format!("unknown density tier '{other}' (expected s, m, l or xl)")),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PointDataError {
    #[error("point payload is empty")]
    Empty,
    #[error("point payload length {0} is not a multiple of 12 bytes")]
    Misaligned(usize),
}

/// Immutable, GPU-ready point array for one tier.
#[derive(Debug, Clone)]
pub struct PointBuffer {
    tier: DensityTier,
    points: Arc<[PointRecord]>,
}

impl PointBuffer {
    pub fn empty(tier: DensityTier) -> Self {
        Self {
            tier,
            points: Arc::from(Vec::new()),
        }
    }

    /// Decodes a little-endian `(x, y, feature)` f32 payload.
    ///
    /// Payloads longer than the tier are truncated to its point count.
    pub fn decode(bytes: &[u8], tier: DensityTier) -> Result<Self, PointDataError> {
        if bytes.is_empty() {
            return Err(PointDataError::Empty);
        }
        if bytes.len() % POINT_STRIDE_BYTES != 0 {
            return Err(PointDataError::Misaligned(bytes.len()));
        }

        let available = bytes.len() / POINT_STRIDE_BYTES;
        let count = available.min(tier.point_count());
        if available > count {
            log::warn!(
                "Point payload holds {} points, truncating to tier {} ({})",
                available,
                tier,
                count
            );
        }

        let points: Vec<PointRecord> = bytes[..count * POINT_STRIDE_BYTES]
            .par_chunks_exact(POINT_STRIDE_BYTES)
            .map(|c| PointRecord {
                x: f32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                y: f32::from_le_bytes([c[4], c[5], c[6], c[7]]),
                feature: f32::from_le_bytes([c[8], c[9], c[10], c[11]]),
            })
            .collect();

        Ok(Self {
            tier,
            points: Arc::from(points),
        })
    }

    /// Like [`decode`](Self::decode), but malformed payloads become zero points.
    pub fn decode_lossy(bytes: &[u8], tier: DensityTier) -> Self {
        Self::decode(bytes, tier).unwrap_or_else(|err| {
            log::warn!("Treating point payload as empty: {}", err);
            Self::empty(tier)
        })
    }

    pub fn tier(&self) -> DensityTier {
        self.tier
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PointRecord] {
        &self.points
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.points[..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(points: &[[f32; 3]]) -> Vec<u8> {
        points
            .iter()
            .flat_map(|p| p.iter().flat_map(|v| v.to_le_bytes()))
            .collect()
    }

    #[test]
    fn decodes_triples() {
        let bytes = encode(&[[0.5, -1.0, 0.25], [2.0, 3.0, 1.0]]);
        let buf = PointBuffer::decode(&bytes, DensityTier::Small).unwrap();
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.points()[1], PointRecord { x: 2.0, y: 3.0, feature: 1.0 });
        assert_eq!(buf.as_bytes(), bytes.as_slice());
    }

    #[test]
    fn malformed_payloads_become_empty() {
        assert_eq!(
            PointBuffer::decode(&[0u8; 13], DensityTier::Small).unwrap_err(),
            PointDataError::Misaligned(13)
        );
        assert!(PointBuffer::decode_lossy(&[0u8; 13], DensityTier::Small).is_empty());
        assert!(PointBuffer::decode_lossy(&[], DensityTier::Small).is_empty());
    }

    #[test]
    fn truncates_to_tier_count() {
        let n = DensityTier::Small.point_count() + 3;
        let bytes = vec![0u8; n * POINT_STRIDE_BYTES];
        let buf = PointBuffer::decode(&bytes, DensityTier::Small).unwrap();
        assert_eq!(buf.len(), DensityTier::Small.point_count());
    }

    #[test]
    fn tier_parsing() {
        assert_eq!("XL".parse::<DensityTier>(), Ok(DensityTier::ExtraLarge));
        assert_eq!("100k".parse::<DensityTier>(), Ok(DensityTier::Medium));
        assert!("huge".parse::<DensityTier>().is_err());
        assert_eq!(DensityTier::Large.point_count(), 500_000);
    }

    #[test]
    fn record_is_twelve_bytes() {
        assert_eq!(std::mem::size_of::<PointRecord>(), POINT_STRIDE_BYTES);
    }
}
