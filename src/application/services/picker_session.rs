//! State of one open avatar picker.
//!
//! A session is created when the picker opens and dropped when it closes. It
//! owns the loaded catalog, the current selection and the slot pipeline, so
//! nothing outlives the picker.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::application::services::catalog_cache::CatalogCache;
use crate::application::services::translation_loader::{DEFAULT_OPTION_KEY, Translations};
use crate::application::services::visibility_trigger::{Registration, VisibilityTrigger};
use crate::domain::entities::{CatalogEntry, Slot, SlotId, VisibilityEntry};
use crate::domain::errors::ConfigurationError;
use crate::domain::ports::KeyValueStorePort;
use crate::domain::services::{FilterCriteria, FilterEngine, GridLayout, placeholder_avatars};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::image::SlotLoader;

/// Settings a session needs from the application configuration.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Catalog URL.
    pub images_url: String,
    /// Category list URL.
    pub categories_url: String,
    /// Store key of the last uploaded image.
    pub selected_image_key: String,
    /// Fallback label of the "every category" option.
    pub all_label: String,
    /// Number of leading entries loaded right after render.
    pub preload_count: usize,
    /// Delay between preloads.
    pub preload_stagger: Duration,
    /// Zero disables the placeholder fallback.
    pub placeholder_count: usize,
    /// Placeholder URL template containing `{seed}`.
    pub placeholder_template: String,
}

impl SessionOptions {
    /// Reads the session settings from `config`.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            images_url: config.catalog.images_url.clone(),
            categories_url: config.catalog.categories_url.clone(),
            selected_image_key: config.selected_image_key(),
            all_label: config.catalog.all_label.clone(),
            preload_count: config.loading.preload_count,
            preload_stagger: Duration::from_millis(config.loading.preload_stagger_ms),
            placeholder_count: if config.placeholders.enabled {
                config.placeholders.count
            } else {
                0
            },
            placeholder_template: config.placeholders.template.clone(),
        }
    }
}

/// Collaborators a session drives.
pub struct SessionServices {
    /// Catalog source.
    pub catalog_cache: CatalogCache,
    /// Durable store holding the saved image.
    pub store: Arc<dyn KeyValueStorePort>,
    /// Loader used for preloads.
    pub loader: SlotLoader,
    /// Visibility trigger feeding the load queue.
    pub trigger: VisibilityTrigger,
}

/// Result of laying out a grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Slots placed in the grid.
    pub slots: usize,
    /// Slots enqueued because they were already visible.
    pub enqueued: usize,
    /// Slots waiting to scroll into view.
    pub watching: usize,
}

/// One open picker.
pub struct PickerSession {
    options: SessionOptions,
    catalog_cache: CatalogCache,
    store: Arc<dyn KeyValueStorePort>,
    loader: SlotLoader,
    trigger: VisibilityTrigger,
    filter: FilterEngine,
    translations: Translations,
    catalog: Vec<CatalogEntry>,
    layout: GridLayout,
    rendered: Vec<Slot>,
    selected: Option<String>,
    preload: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for PickerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickerSession")
            .field("catalog", &self.catalog.len())
            .field("rendered", &self.rendered.len())
            .field("selected", &self.selected)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

impl PickerSession {
    /// Opens the picker and loads the catalog.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::MissingTitle`] if the translations have no title.
    pub async fn open(
        options: SessionOptions,
        services: SessionServices,
        translations: Translations,
    ) -> Result<Self, ConfigurationError> {
        let Some(title) = translations.title() else {
            return Err(ConfigurationError::MissingTitle);
        };
        info!(title = %title, language = ?translations.language(), "Opening avatar picker");

        let all_label = translations
            .get(DEFAULT_OPTION_KEY)
            .unwrap_or(options.all_label.as_str())
            .to_string();

        let SessionServices {
            catalog_cache,
            store,
            loader,
            trigger,
        } = services;

        let catalog = catalog_cache.load(&options.images_url).await;
        debug!(entries = catalog.len(), "Catalog ready");

        Ok(Self {
            options,
            catalog_cache,
            store,
            loader,
            trigger,
            filter: FilterEngine::new(all_label),
            translations,
            catalog,
            layout: GridLayout::new(1, 1.0),
            rendered: Vec::new(),
            selected: None,
            preload: None,
        })
    }

    /// Translations the session opened with.
    #[must_use]
    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    /// Catalog loaded at open.
    #[must_use]
    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    /// Label of the "every category" option.
    #[must_use]
    pub fn all_label(&self) -> &str {
        self.filter.all_label()
    }

    /// Category choices: the "every category" label followed by the published names.
    pub async fn category_options(&self) -> Vec<String> {
        let mut options = vec![self.all_label().to_string()];
        options.extend(
            self.catalog_cache
                .load_categories(&self.options.categories_url)
                .await,
        );
        options
    }

    /// Entries matching `criteria`, or generated placeholders when nothing matches.
    #[must_use]
    pub fn apply_filters(&self, criteria: &FilterCriteria) -> Vec<CatalogEntry> {
        let matches: Vec<CatalogEntry> = self
            .filter
            .filter(&self.catalog, criteria)
            .into_iter()
            .cloned()
            .collect();

        if matches.is_empty() && self.options.placeholder_count > 0 {
            debug!(term = %criteria.search_term, "No match, showing generated avatars");
            return placeholder_avatars(
                &criteria.search_term,
                self.options.placeholder_count,
                &self.options.placeholder_template,
            );
        }
        matches
    }

    /// Lays out `entries` and starts loading what is visible.
    ///
    /// The saved and selected images come first. Slots from a previous render
    /// are forgotten; their in-flight loads still settle.
    pub async fn render(&mut self, entries: &[CatalogEntry], layout: GridLayout) -> RenderSummary {
        if let Some(preload) = self.preload.take() {
            preload.abort();
        }
        self.trigger.clear();
        self.layout = layout;

        let saved = self.saved_image().await;
        let mut seen = HashSet::new();
        let urls: Vec<&str> = saved
            .as_deref()
            .into_iter()
            .chain(self.selected.as_deref())
            .chain(entries.iter().map(CatalogEntry::url))
            .filter(|url| seen.insert(*url))
            .collect();

        self.rendered = urls
            .iter()
            .enumerate()
            .map(|(index, url)| Slot::for_url(*url, layout.bounds(index)))
            .collect();

        let mut summary = RenderSummary {
            slots: self.rendered.len(),
            ..RenderSummary::default()
        };
        for slot in self.rendered.clone() {
            match self.trigger.register(slot) {
                Registration::Enqueued(_) => summary.enqueued += 1,
                Registration::Watching => summary.watching += 1,
                Registration::Ignored => {}
            }
        }

        self.schedule_preload(entries);
        debug!(
            slots = summary.slots,
            enqueued = summary.enqueued,
            watching = summary.watching,
            "Rendered grid"
        );
        summary
    }

    /// Scrolls the grid and reports newly visible slots.
    ///
    /// Returns the number of slots enqueued.
    pub fn scroll_to(&mut self, offset: f64) -> usize {
        self.layout = self.layout.scrolled_to(offset);
        let viewport_height = self.trigger.viewport_height();

        let entries: Vec<VisibilityEntry> = self
            .rendered
            .iter()
            .enumerate()
            .filter(|(_, slot)| !self.trigger.is_triggered(&slot.id))
            .map(|(index, slot)| {
                let bounds = self.layout.bounds(index);
                VisibilityEntry {
                    slot: slot.id.clone(),
                    bounds,
                    is_intersecting: bounds.intersects(viewport_height),
                }
            })
            .collect();

        self.trigger.on_visibility(&entries)
    }

    /// Scrolls page by page to the end of the grid.
    ///
    /// Returns the number of slots enqueued.
    pub fn scroll_through(&mut self) -> usize {
        let page = self.trigger.viewport_height();
        if page.is_nan() || page <= 0.0 {
            debug!(page, "Viewport has no height, not scrolling");
            return 0;
        }
        let end = self.layout.content_height(self.rendered.len());
        let mut offset = 0.0;
        let mut enqueued = 0;

        while offset < end {
            offset += page;
            enqueued += self.scroll_to(offset);
        }
        enqueued
    }

    /// Slots of the current grid, in layout order.
    #[must_use]
    pub fn rendered(&self) -> &[Slot] {
        &self.rendered
    }

    /// Slots still waiting to become visible.
    #[must_use]
    pub fn watched_count(&self) -> usize {
        self.trigger.watched_count()
    }

    /// Marks `url` as the chosen image.
    pub fn select(&mut self, url: impl Into<String>) {
        let url = url.into();
        trace!(url = %url, "Image selected");
        self.selected = Some(url);
    }

    /// Image chosen in this session.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Image saved by the last upload, if any.
    pub async fn saved_image(&self) -> Option<String> {
        match self.store.get(&self.options.selected_image_key).await {
            Ok(saved) => saved.filter(|s| !s.is_empty()),
            Err(e) => {
                debug!(error = %e, "Failed to read saved image");
                None
            }
        }
    }

    /// Closes the picker and waits for queued loads to settle.
    pub async fn close(mut self) {
        if let Some(preload) = self.preload.take() {
            preload.abort();
        }
        self.trigger.clear();
        self.trigger.queue().shutdown().await;
        debug!("Avatar picker closed");
    }

    fn schedule_preload(&mut self, entries: &[CatalogEntry]) {
        let targets: Vec<(SlotId, String)> = entries
            .iter()
            .take(self.options.preload_count)
            .map(|entry| (SlotId::from_url(entry.url()), entry.url().to_string()))
            .collect();
        if targets.is_empty() {
            return;
        }

        let loader = self.loader.clone();
        let stagger = self.options.preload_stagger;
        self.preload = Some(tokio::spawn(async move {
            for (index, (slot, url)) in targets.into_iter().enumerate() {
                if index > 0 {
                    tokio::time::sleep(stagger).await;
                }
                trace!(index = index + 1, url = %url, "Preloading image");
                let loader = loader.clone();
                tokio::spawn(async move {
                    if let Err(e) = loader.load(&slot, &url).await {
                        debug!(error = %e, "Preload failed");
                    }
                });
            }
        }));
    }
}

impl Drop for PickerSession {
    fn drop(&mut self) {
        if let Some(preload) = self.preload.take() {
            preload.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::SlotBounds;
    use crate::domain::ports::mocks::{
        MockImageFetcher, MockJsonFetchPort, RecordingRenderer, png_bytes,
    };
    use crate::domain::services::PriorityPolicy;
    use crate::infrastructure::image::{LoadQueue, LoadQueueConfig, MemoryImageCache};
    use crate::infrastructure::storage::MemoryKeyValueStore;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use std::collections::HashMap;

    const KEY: &str = "jf-avatars-selected-img";

    fn options() -> SessionOptions {
        SessionOptions {
            images_url: "https://images.test/catalog.json".to_string(),
            categories_url: "https://images.test/folders.json".to_string(),
            selected_image_key: KEY.to_string(),
            all_label: "All".to_string(),
            preload_count: 0,
            preload_stagger: Duration::from_millis(1),
            placeholder_count: 3,
            placeholder_template: "https://avatars.test/{seed}.png".to_string(),
        }
    }

    fn translations(title: Option<&str>) -> Translations {
        let mut strings = HashMap::new();
        if let Some(title) = title {
            strings.insert("title".to_string(), title.to_string());
        }
        strings.insert("default-option".to_string(), "Tous".to_string());
        Translations::new("fr", strings)
    }

    fn services(store: Arc<MemoryKeyValueStore>, catalog_calls: usize) -> SessionServices {
        services_with_viewport(store, catalog_calls, 220.0)
    }

    fn services_with_viewport(
        store: Arc<MemoryKeyValueStore>,
        catalog_calls: usize,
        viewport_height: f64,
    ) -> SessionServices {
        let mut fetcher = MockJsonFetchPort::new();
        fetcher
            .expect_fetch_json()
            .withf(|url| url == "https://images.test/catalog.json")
            .times(catalog_calls)
            .returning(|_| {
                Ok(json!([
                    {"url": "https://images.test/cat.png", "category": "Animals"},
                    {"url": "https://images.test/dog.png", "folder": "Animals"},
                ]))
            });
        fetcher
            .expect_fetch_json()
            .returning(|_| Ok(json!(["Animals", "Heroes"])));

        let images = MockImageFetcher::new().with_image("https://images.test/cat.png", png_bytes(1, 1));
        let loader = SlotLoader::new(
            Arc::new(images),
            Arc::new(RecordingRenderer::default()),
            Arc::new(MemoryImageCache::new(8)),
        );
        let queue = Arc::new(LoadQueue::new(LoadQueueConfig { max_concurrency: 2 }).unwrap());
        let trigger =
            VisibilityTrigger::new(queue, loader.clone(), PriorityPolicy::Spatial, viewport_height);

        SessionServices {
            catalog_cache: CatalogCache::new(
                Arc::new(fetcher),
                store.clone(),
                "jf-avatars-images-cache",
                ChronoDuration::hours(24),
            ),
            store,
            loader,
            trigger,
        }
    }

    #[tokio::test]
    async fn test_open_requires_title() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let result = PickerSession::open(options(), services(store, 0), translations(None)).await;

        assert!(matches!(result, Err(ConfigurationError::MissingTitle)));
    }

    #[tokio::test]
    async fn test_open_loads_catalog_and_categories() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let session = PickerSession::open(options(), services(store, 1), translations(Some("Avatars")))
            .await
            .unwrap();

        assert_eq!(session.catalog().len(), 2);
        assert_eq!(session.all_label(), "Tous");
        assert_eq!(
            session.category_options().await,
            vec!["Tous", "Animals", "Heroes"]
        );
        session.close().await;
    }

    #[tokio::test]
    async fn test_apply_filters_falls_back_to_placeholders() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let session = PickerSession::open(options(), services(store, 1), translations(Some("Avatars")))
            .await
            .unwrap();

        let animals = session.apply_filters(&FilterCriteria::category("animals"));
        assert_eq!(animals.len(), 2);

        let all = session.apply_filters(&FilterCriteria::category("tous"));
        assert_eq!(all.len(), 2);

        let none = session.apply_filters(&FilterCriteria::search("zebra"));
        assert_eq!(none.len(), 3);
        assert_eq!(none[0].url(), "https://avatars.test/zebra%2D1.png");
        session.close().await;
    }

    #[tokio::test]
    async fn test_render_saved_image_first_and_scroll() {
        let store = Arc::new(MemoryKeyValueStore::with_entries([(
            KEY,
            "https://images.test/saved.png",
        )]));
        let mut session =
            PickerSession::open(options(), services(store, 1), translations(Some("Avatars")))
                .await
                .unwrap();
        session.select("https://images.test/cat.png");

        let entries: Vec<CatalogEntry> = (0..10)
            .map(|i| CatalogEntry::new(format!("https://images.test/{i}.png")))
            .chain(std::iter::once(CatalogEntry::new("https://images.test/cat.png")))
            .collect();
        let summary = session.render(&entries, GridLayout::new(2, 100.0)).await;

        assert_eq!(summary.slots, 12);
        assert_eq!(session.rendered()[0].url, "https://images.test/saved.png");
        assert_eq!(session.rendered()[1].url, "https://images.test/cat.png");
        assert_eq!(summary.enqueued, 6);
        assert_eq!(summary.watching, 6);

        assert_eq!(session.scroll_to(200.0), 4);
        assert_eq!(session.rendered()[11].bounds, SlotBounds::new(500.0, 600.0));
        assert_eq!(session.scroll_through(), 2);
        assert_eq!(session.watched_count(), 0);
        session.close().await;
    }

    #[tokio::test]
    async fn test_rerender_forgets_previous_slots() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let mut session =
            PickerSession::open(options(), services(store, 1), translations(Some("Avatars")))
                .await
                .unwrap();
        let entries = session.apply_filters(&FilterCriteria::default());

        session.render(&entries, GridLayout::new(1, 500.0)).await;
        assert_eq!(session.watched_count(), 1);

        let summary = session.render(&entries, GridLayout::new(2, 100.0)).await;
        assert_eq!(summary.enqueued, 2);
        assert_eq!(session.watched_count(), 0);
        session.close().await;
    }

    #[tokio::test]
    async fn test_scroll_through_zero_height_viewport_returns() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let mut session = PickerSession::open(
            options(),
            services_with_viewport(store, 1, 0.0),
            translations(Some("Avatars")),
        )
        .await
        .unwrap();
        let entries = session.apply_filters(&FilterCriteria::default());

        let summary = session.render(&entries, GridLayout::new(1, 100.0)).await;
        assert_eq!(summary.enqueued, 0);

        assert_eq!(session.scroll_through(), 0);
        assert_eq!(session.watched_count(), session.rendered().len());
        session.close().await;
    }
}
