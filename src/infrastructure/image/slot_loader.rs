//! Builds the load tasks the queue runs for each slot.

use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{debug, error, warn};

use crate::domain::entities::{ImageSource, LoadedImage, SlotId};
use crate::domain::errors::ImageLoadError;
use crate::domain::ports::{ImageFetchPort, SlotRendererPort};

use super::load_queue::LoadFuture;
use super::memory_cache::MemoryImageCache;

/// Loads slot images and reports the outcome to the renderer.
#[derive(Clone)]
pub struct SlotLoader {
    fetcher: Arc<dyn ImageFetchPort>,
    renderer: Arc<dyn SlotRendererPort>,
    memory_cache: Arc<MemoryImageCache>,
}

impl std::fmt::Debug for SlotLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotLoader")
            .field("memory_cache", &self.memory_cache.stats())
            .finish_non_exhaustive()
    }
}

impl SlotLoader {
    /// Creates a loader reporting to `renderer`.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn ImageFetchPort>,
        renderer: Arc<dyn SlotRendererPort>,
        memory_cache: Arc<MemoryImageCache>,
    ) -> Self {
        Self {
            fetcher,
            renderer,
            memory_cache,
        }
    }

    /// Returns the deferred load for a slot.
    ///
    /// On success the renderer reveals the slot; on failure it removes it and
    /// the error is returned to the queue.
    pub fn loader_for(
        &self,
        slot: SlotId,
        url: String,
    ) -> impl FnOnce() -> LoadFuture + Send + 'static {
        let this = self.clone();
        move || {
            async move {
                match this.load(&slot, &url).await {
                    Ok(image) => {
                        this.renderer.reveal(&slot, &image);
                        Ok(())
                    }
                    Err(e) => {
                        debug!(slot = %slot, url = %url, "Removing slot after failed load");
                        this.renderer.remove(&slot);
                        Err(e)
                    }
                }
            }
            .boxed()
        }
    }

    /// Loads and validates an image, checking the memory cache first.
    ///
    /// # Errors
    /// Returns error if the download fails or the bytes do not decode.
    pub async fn load(
        &self,
        slot: &SlotId,
        url: &str,
    ) -> Result<Arc<LoadedImage>, ImageLoadError> {
        if let Some(image) = self.memory_cache.get(slot).await {
            return Ok(Arc::new(LoadedImage {
                source: ImageSource::MemoryCache,
                ..(*image).clone()
            }));
        }

        let bytes = self.fetcher.fetch_image(url).await?;

        let bytes_for_decode = bytes.clone();
        let (width, height) = tokio::task::spawn_blocking(move || {
            image::load_from_memory(&bytes_for_decode).map(|img| (img.width(), img.height()))
        })
        .await
        .map_err(|e| {
            error!(url = %url, error = %e, "Decode task panicked");
            ImageLoadError::decode(url, format!("decode task panicked: {e}"))
        })?
        .map_err(|e| {
            warn!(url = %url, error = %e, "Failed to decode image");
            ImageLoadError::decode(url, e.to_string())
        })?;

        let image = Arc::new(LoadedImage {
            url: url.to_string(),
            bytes,
            width,
            height,
            source: ImageSource::Network,
        });
        self.memory_cache.put(slot.clone(), image.clone()).await;

        debug!(slot = %slot, width, height, "Image loaded");
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::{MockImageFetcher, RecordingRenderer, png_bytes};

    fn setup(
        fetcher: MockImageFetcher,
    ) -> (SlotLoader, Arc<MockImageFetcher>, Arc<RecordingRenderer>) {
        let fetcher = Arc::new(fetcher);
        let renderer = Arc::new(RecordingRenderer::default());
        let loader = SlotLoader::new(
            fetcher.clone(),
            renderer.clone(),
            Arc::new(MemoryImageCache::new(10)),
        );
        (loader, fetcher, renderer)
    }

    #[tokio::test]
    async fn test_success_reveals_slot() {
        let (loader, _, renderer) =
            setup(MockImageFetcher::new().with_image("a.png", png_bytes(4, 3)));

        let result = loader.loader_for("a".into(), "a.png".to_string())().await;

        assert!(result.is_ok());
        assert_eq!(*renderer.revealed.lock(), vec![SlotId::new("a")]);
        assert!(renderer.removed.lock().is_empty());
    }

    #[tokio::test]
    async fn test_missing_image_removes_slot() {
        let (loader, _, renderer) = setup(MockImageFetcher::new());

        let result = loader.loader_for("a".into(), "a.png".to_string())().await;

        assert!(matches!(result, Err(ImageLoadError::Status { status: 404, .. })));
        assert_eq!(*renderer.removed.lock(), vec![SlotId::new("a")]);
    }

    #[tokio::test]
    async fn test_undecodable_bytes_fail() {
        let (loader, _, renderer) =
            setup(MockImageFetcher::new().with_image("a.png", &b"<html>not found</html>"[..]));

        let result = loader.loader_for("a".into(), "a.png".to_string())().await;

        assert!(matches!(result, Err(ImageLoadError::Decode { .. })));
        assert_eq!(renderer.removed.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_second_load_hits_memory_cache() {
        let (loader, fetcher, _) =
            setup(MockImageFetcher::new().with_image("a.png", png_bytes(2, 2)));
        let slot = SlotId::new("a");

        let first = loader.load(&slot, "a.png").await.unwrap();
        let second = loader.load(&slot, "a.png").await.unwrap();

        assert_eq!(first.source, ImageSource::Network);
        assert_eq!(second.source, ImageSource::MemoryCache);
        assert_eq!((second.width, second.height), (2, 2));
        assert_eq!(fetcher.calls(), 1);
    }
}
