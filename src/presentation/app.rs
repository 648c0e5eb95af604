//! Command-line picker: list, filter, download and select avatars.

use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::application::services::{
    CatalogCache, PickerSession, SessionOptions, SessionServices, TranslationLoader,
    VisibilityTrigger,
};
use crate::application::use_cases::{SelectAvatarKeys, SelectAvatarUseCase, UploadOutcome};
use crate::domain::entities::{CatalogEntry, LoadedImage, SlotId};
use crate::domain::ports::{KeyValueStorePort, SlotRendererPort};
use crate::domain::services::{FilterCriteria, GridLayout, PriorityPolicy};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http::{ClientIdentity, HttpClient, ProfileImageClient};
use crate::infrastructure::image::{
    LoadQueue, LoadQueueConfig, MemoryImageCache, QueueEvent, SlotLoader,
};
use crate::presentation::directory_renderer::DirectoryRenderer;

/// What the user asked for on the command line.
#[derive(Debug, Clone, Default)]
pub struct PickerRequest {
    /// Search term and category to filter by.
    pub criteria: FilterCriteria,
    /// Print the category options and stop.
    pub list_categories: bool,
    /// Directory that receives loaded images.
    pub download_dir: Option<PathBuf>,
    /// Load every slot, not only the visible ones.
    pub download_all: bool,
    /// Image URL to upload as the profile picture.
    pub select: Option<String>,
    /// Drop the cached catalog before loading.
    pub refresh: bool,
}

/// Runs one picker request against the configured server.
pub struct App {
    config: AppConfig,
    request: PickerRequest,
    http: HttpClient,
    store: Arc<dyn KeyValueStorePort>,
}

impl App {
    /// Creates the app from loaded configuration and shared clients.
    #[must_use]
    pub fn new(
        config: AppConfig,
        request: PickerRequest,
        http: HttpClient,
        store: Arc<dyn KeyValueStorePort>,
    ) -> Self {
        Self {
            config,
            request,
            http,
            store,
        }
    }

    /// Runs the request to completion.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid, the picker cannot open,
    /// or the download directory cannot be created.
    pub async fn run(self) -> Result<()> {
        self.config.validate()?;
        let http = Arc::new(self.http.clone());

        let translations = TranslationLoader::new(
            http.clone(),
            self.config.local_translations_base(),
            self.config.i18n.fallback_base.clone(),
            self.config.i18n.default_language.clone(),
        )
        .load(&self.config.preferred_language())
        .await;

        let catalog_cache = CatalogCache::new(
            http.clone(),
            self.store.clone(),
            self.config.cache_key(),
            self.config.cache_max_age(),
        );
        if self.request.refresh {
            catalog_cache.invalidate().await;
        }

        let directory = match &self.request.download_dir {
            Some(dir) => Some(Arc::new(DirectoryRenderer::create(dir).wrap_err_with(|| {
                format!("Failed to create download directory {}", dir.display())
            })?)),
            None => None,
        };
        let renderer: Arc<dyn SlotRendererPort> = match &directory {
            Some(directory) => directory.clone() as Arc<dyn SlotRendererPort>,
            None => Arc::new(DiscardRenderer),
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let queue = Arc::new(LoadQueue::with_events(
            LoadQueueConfig {
                max_concurrency: self.config.loading.max_concurrency,
            },
            &event_tx,
        )?);
        drop(event_tx);
        let progress = tokio::spawn(report_progress(event_rx));

        let loader = SlotLoader::new(
            http.clone(),
            renderer,
            Arc::new(MemoryImageCache::new(self.config.loading.memory_cache_size)),
        );
        let trigger = VisibilityTrigger::new(
            queue.clone(),
            loader.clone(),
            PriorityPolicy::from_setting(
                self.config.loading.prioritize_viewport,
                self.config.loading.static_priority,
            ),
            self.config.layout.viewport_height,
        );

        let mut session = PickerSession::open(
            SessionOptions::from_config(&self.config),
            SessionServices {
                catalog_cache,
                store: self.store.clone(),
                loader,
                trigger,
            },
            translations,
        )
        .await?;

        if self.request.list_categories {
            for category in session.category_options().await {
                println!("{category}");
            }
            session.close().await;
            return Ok(());
        }

        let entries = session.apply_filters(&self.request.criteria);
        print_entries(&entries);

        if let Some(directory) = &directory {
            let summary = session.render(&entries, self.layout()).await;
            info!(slots = summary.slots, visible = summary.enqueued, "Downloading images");
            if self.request.download_all {
                let enqueued = session.scroll_through();
                debug!(enqueued, "Scrolled through grid");
            }
            session.close().await;
            let _ = progress.await;

            let stats = queue.stats();
            println!(
                "{} image(s) saved to {}, {} failed",
                directory.written_count(),
                directory.dir().display(),
                stats.failed
            );
        } else {
            session.close().await;
            let _ = progress.await;
        }

        if let Some(url) = &self.request.select {
            self.select(http, url).await;
        }

        Ok(())
    }

    fn layout(&self) -> GridLayout {
        GridLayout::new(self.config.layout.columns, self.config.layout.row_height)
    }

    async fn select(&self, http: Arc<HttpClient>, url: &str) {
        let server = &self.config.server;
        let profile = ProfileImageClient::new(
            http.inner().clone(),
            server.base_url.clone(),
            ClientIdentity {
                client: server.client_name.clone(),
                device: server.device_name.clone(),
                version: server.client_version.clone(),
            },
        );
        let use_case = SelectAvatarUseCase::new(
            http,
            Arc::new(profile),
            self.store.clone(),
            SelectAvatarKeys {
                credentials: server.credentials_key.clone(),
                device_prefix: server.device_key_prefix.clone(),
                selected_image: self.config.selected_image_key(),
            },
        );

        match use_case.execute(url).await {
            UploadOutcome::Uploaded => println!("Profile image updated: {url}"),
            UploadOutcome::Failed(e) => println!("Profile image not updated: {e}"),
        }
    }
}

/// Renderer used when images are only listed.
struct DiscardRenderer;

impl SlotRendererPort for DiscardRenderer {
    fn reveal(&self, _slot: &SlotId, _image: &LoadedImage) {}

    fn remove(&self, _slot: &SlotId) {}
}

fn print_entries(entries: &[CatalogEntry]) {
    for entry in entries {
        match (entry.name(), entry.effective_category()) {
            (Some(name), Some(category)) => println!("{}\t{name}\t{category}", entry.url()),
            (Some(name), None) => println!("{}\t{name}", entry.url()),
            (None, Some(category)) => println!("{}\t\t{category}", entry.url()),
            (None, None) => println!("{}", entry.url()),
        }
    }
}

async fn report_progress(mut events: mpsc::UnboundedReceiver<QueueEvent>) {
    let mut settled = 0usize;
    while let Some(event) = events.recv().await {
        if let QueueEvent::Settled { slot, result, active } = event {
            settled += 1;
            match result {
                Ok(()) => debug!(slot = %slot, settled, active, "Image ready"),
                Err(e) => debug!(slot = %slot, settled, active, error = %e, "Image dropped"),
            }
        }
    }
    info!(settled, "Image loading finished");
}
