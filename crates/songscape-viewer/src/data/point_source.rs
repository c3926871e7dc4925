use crate::config::Config;
use anyhow::{bail, Context, Result};
use songscape::{DensityTier, PointBuffer};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Where a tier's point payload comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointSource {
    File(PathBuf),
    Url(String),
}

impl PointSource {
    /// Treats `http(s)://` references as URLs and everything else as a path.
    pub fn parse(reference: &str) -> Self {
        if crate::assets::is_remote(reference) {
            Self::Url(reference.to_owned())
        } else {
            Self::File(PathBuf::from(reference))
        }
    }

    /// The default source of `tier`. Tiers without a bundled file are served
    /// by the API, cache-busted with `now_ms`.
    pub fn for_tier(tier: DensityTier, dataset_dir: &Path, api_base: &str, now_ms: u128) -> Self {
        match tier.bundled_path() {
            Some(rel) => Self::File(dataset_dir.join(rel)),
            None => Self::Url(format!(
                "{}/load-mesh/?t={}",
                api_base.trim_end_matches('/'),
                now_ms
            )),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        match &config.points {
            Some(reference) => Self::parse(reference),
            None => {
                let now_ms = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis())
                    .unwrap_or(0);
                Self::for_tier(config.tier, &config.dataset_dir, config.api_base(), now_ms)
            }
        }
    }

    fn fetch(&self) -> Result<Vec<u8>> {
        match self {
            Self::File(path) => {
                std::fs::read(path).with_context(|| format!("reading {}", path.display()))
            }
            Self::Url(url) => {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_io()
                    .enable_time()
                    .build()?;
                rt.block_on(async {
                    let client = reqwest::Client::builder()
                        .connect_timeout(Duration::from_secs(10))
                        .build()?;
                    let resp = client.get(url).send().await?;
                    if !resp.status().is_success() {
                        bail!("{} returned {}", url, resp.status());
                    }
                    Ok::<_, anyhow::Error>(resp.bytes().await?.to_vec())
                })
            }
        }
    }
}

impl std::fmt::Display for PointSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Loads the point cloud for `tier`. An unreachable or malformed source
/// degrades to zero points; the map stays navigable.
pub fn load_points(source: &PointSource, tier: DensityTier) -> PointBuffer {
    log::info!("Loading {} tier points from {}", tier, source);
    let bytes = match source.fetch() {
        Ok(bytes) => bytes,
        Err(err) => {
            log::warn!("Point source unavailable, rendering no points: {:#}", err);
            return PointBuffer::empty(tier);
        }
    };

    let points = PointBuffer::decode_lossy(&bytes, tier);
    log::info!(
        "Loaded {} points ({} bytes) for tier {} ({})",
        points.len(),
        bytes.len(),
        tier,
        tier.description()
    );
    points
}
