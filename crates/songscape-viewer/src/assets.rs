//! Cover image worker: fetches a reference (URL or local path) and decodes it
//! off the render thread.

use crossbeam_channel::{Receiver, Sender};
use image::{GenericImageView, RgbaImage};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

/// Covers are downscaled to fit this edge before upload.
pub const MAX_COVER_EDGE: u32 = 512;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Result of one load, keyed by the reference it was requested for.
#[derive(Debug)]
pub struct DecodedImage {
    pub reference: String,
    pub result: Result<RgbaImage, AssetError>,
}

pub fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Decodes any format `image` understands into RGBA8, bounded by [`MAX_COVER_EDGE`].
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, AssetError> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = img.dimensions();
    let img = if width > MAX_COVER_EDGE || height > MAX_COVER_EDGE {
        img.thumbnail(MAX_COVER_EDGE, MAX_COVER_EDGE)
    } else {
        img
    };
    Ok(img.to_rgba8())
}

pub struct AssetWorker {
    tx: Option<mpsc::UnboundedSender<String>>,
    rx: Receiver<DecodedImage>,
    handle: Option<thread::JoinHandle<()>>,
}

impl AssetWorker {
    pub fn spawn() -> anyhow::Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()?;
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (img_tx, img_rx) = crossbeam_channel::unbounded();

        let handle = thread::Builder::new()
            .name("songscape-assets".into())
            .spawn(move || {
                rt.block_on(run_asset_loop(client, req_rx, img_tx));
                log::debug!("Asset worker stopped");
            })?;

        Ok(Self {
            tx: Some(req_tx),
            rx: img_rx,
            handle: Some(handle),
        })
    }

    pub fn request(&self, reference: String) {
        if let Some(tx) = &self.tx {
            if tx.send(reference).is_err() {
                log::debug!("Asset worker gone, dropping request");
            }
        }
    }

    pub fn try_iter(&self) -> crossbeam_channel::TryIter<'_, DecodedImage> {
        self.rx.try_iter()
    }

    pub fn shutdown(&mut self) {
        self.tx = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Asset worker panicked");
            }
        }
    }
}

impl Drop for AssetWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_asset_loop(
    client: reqwest::Client,
    mut requests: mpsc::UnboundedReceiver<String>,
    images: Sender<DecodedImage>,
) {
    while let Some(reference) = requests.recv().await {
        let client = client.clone();
        let images = images.clone();
        tokio::spawn(async move {
            let result = load(&client, &reference).await;
            deliver(&images, DecodedImage { reference, result });
        });
    }
}

/// Returns `false` if the render thread is no longer listening.
fn deliver(images: &Sender<DecodedImage>, image: DecodedImage) -> bool {
    if let Err(err) = images.send(image) {
        log::debug!("Render thread gone, dropping cover {}", err.into_inner().reference);
        return false;
    }
    true
}

async fn load(client: &reqwest::Client, reference: &str) -> Result<RgbaImage, AssetError> {
    let bytes = if is_remote(reference) {
        let resp = client
            .get(reference)
            .send()
            .await
            .map_err(|e| AssetError::Fetch(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AssetError::Status(resp.status().as_u16()));
        }
        resp.bytes()
            .await
            .map_err(|e| AssetError::Fetch(e.to_string()))?
            .to_vec()
    } else {
        tokio::fs::read(reference).await?
    };

    tokio::task::spawn_blocking(move || decode(&bytes))
        .await
        .map_err(|e| AssetError::Fetch(e.to_string()))?
}
