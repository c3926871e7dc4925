/// Fatal viewer failures surfaced once at startup.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("no usable GPU: {0}")]
    GpuUnavailable(String),
}
