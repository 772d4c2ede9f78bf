//! Error types shared across the crate.
//!
//! Loading and bootstrap code returns `anyhow::Result` at its outer edge; the
//! variants below describe the failures that the world itself knows how to name.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("failed to load asset `{path}`: {reason}")]
    AssetLoad { path: String, reason: String },

    #[error("gltf `{path}` could not be parsed: {source}")]
    Gltf {
        path: String,
        #[source]
        source: gltf::Error,
    },

    #[error("image could not be decoded: {0}")]
    Image(#[from] image::ImageError),

    #[error("unknown image format `{0}`")]
    ImageFormat(String),

    #[error("config could not be parsed: {0}")]
    Config(#[from] toml::de::Error),

    #[error("scene node `{0}` is missing")]
    MissingNode(String),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(String),

    #[error("GPU device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface could not be created: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
}
