use clap::Parser;
use songscape::config::{CLICK_SLOP_PX, QUERY_K};
use songscape::{DensityTier, SessionConfig};
use std::path::PathBuf;
use std::time::Duration;

/// `songscape` - Explore a map of songs laid out by audio similarity.
///
/// Points are loaded once at startup for the chosen density tier. Zooming in
/// past the hover threshold queries the proximity service for the songs
/// around the pointer, which can then be hovered and selected.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Point density tier: s (50k), m (100k), l (500k) or xl (1M).
    #[arg(long, env = "SONGSCAPE_TIER", default_value_t = DensityTier::Medium)]
    pub tier: DensityTier,

    /// Point payload to load instead of the tier's default.
    ///
    /// Either a filesystem path or an `http(s)` URL to a flat little-endian
    /// `f32` array of `(x, y, feature)` triples.
    #[arg(long, env = "SONGSCAPE_POINTS")]
    pub points: Option<String>,

    /// Directory holding the bundled tier datasets (`sm/`, `m/`, `l/`).
    #[arg(long, env = "SONGSCAPE_DATASET_DIR", default_value = "dataset")]
    pub dataset_dir: PathBuf,

    /// Base URL of the proximity query service.
    #[arg(long, env = "SONGSCAPE_API", default_value = "http://127.0.0.1:8000")]
    pub api: String,

    /// Candidates requested per proximity query.
    #[arg(long, env = "SONGSCAPE_QUERY_K", default_value_t = QUERY_K)]
    pub query_k: u32,

    /// Quiet period before a proximity query is sent, in milliseconds.
    #[arg(long, env = "SONGSCAPE_DEBOUNCE_MS", default_value_t = 150)]
    pub debounce_ms: u64,

    /// Pointer travel in logical pixels beyond which a press becomes a drag.
    #[arg(long, env = "SONGSCAPE_CLICK_SLOP", default_value_t = CLICK_SLOP_PX)]
    pub click_slop_px: f64,

    /// Initial window width in logical pixels.
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height in logical pixels.
    #[arg(long, default_value_t = 720)]
    pub height: u32,
}

impl Config {
    /// API base without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api.trim_end_matches('/')
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            query_k: self.query_k,
            query_debounce: Duration::from_millis(self.debounce_ms),
            click_slop_px: self.click_slop_px,
            ..SessionConfig::for_tier(self.tier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_reach_session() {
        let config = Config::try_parse_from([
            "songscape",
            "--tier",
            "xl",
            "--api",
            "http://songs.local:9000/",
            "--query-k",
            "200",
            "--debounce-ms",
            "300",
        ])
        .unwrap();
        assert_eq!(config.tier, DensityTier::ExtraLarge);
        assert_eq!(config.api_base(), "http://songs.local:9000");

        let session = config.session();
        assert_eq!(session.query_k, 200);
        assert_eq!(session.query_debounce, Duration::from_millis(300));
        assert_eq!(session.world_limit, DensityTier::ExtraLarge.world_limit());
    }

    #[test]
    fn unknown_tier_is_rejected() {
        assert!(Config::try_parse_from(["songscape", "--tier", "huge"]).is_err());
    }
}
