//! Loaded avatar image types.

use bytes::Bytes;

/// Where an image was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Loaded from in-memory LRU cache.
    MemoryCache,
    /// Downloaded from network.
    Network,
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemoryCache => write!(f, "memory"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// An image whose bytes were downloaded and validated by decoding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// URL the image was loaded from.
    pub url: String,
    /// Raw encoded bytes, as served.
    pub bytes: Bytes,
    /// Decoded width in pixels.
    pub width: u32,
    /// Decoded height in pixels.
    pub height: u32,
    /// Where the bytes came from.
    pub source: ImageSource,
}

impl LoadedImage {
    /// Returns a lowercase file extension guessed from the encoded bytes.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match ::image::guess_format(&self.bytes) {
            Ok(::image::ImageFormat::Jpeg) => "jpg",
            Ok(::image::ImageFormat::Gif) => "gif",
            Ok(::image::ImageFormat::WebP) => "webp",
            _ => "png",
        }
    }
}
