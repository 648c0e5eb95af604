//! One-shot bridge from slot visibility to the load queue.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::domain::entities::{Slot, SlotId, VisibilityEntry};
use crate::domain::services::PriorityPolicy;
use crate::infrastructure::image::{LoadQueue, SlotLoader};

/// What `register` did with a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Already in the viewport; enqueued with this priority.
    Enqueued(i64),
    /// Outside the viewport; waiting for a visibility report.
    Watching,
    /// Loaded or watched before; nothing changed.
    Ignored,
}

/// Feeds slots into the load queue the first time they become visible.
///
/// A slot is enqueued at most once until [`VisibilityTrigger::clear`].
pub struct VisibilityTrigger {
    queue: Arc<LoadQueue>,
    loader: SlotLoader,
    policy: PriorityPolicy,
    viewport_height: f64,
    watched: HashMap<SlotId, Slot>,
    triggered: HashSet<SlotId>,
}

impl std::fmt::Debug for VisibilityTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityTrigger")
            .field("policy", &self.policy)
            .field("viewport_height", &self.viewport_height)
            .field("watched", &self.watched.len())
            .field("triggered", &self.triggered.len())
            .finish_non_exhaustive()
    }
}

impl VisibilityTrigger {
    /// Creates a trigger with nothing watched.
    #[must_use]
    pub fn new(
        queue: Arc<LoadQueue>,
        loader: SlotLoader,
        policy: PriorityPolicy,
        viewport_height: f64,
    ) -> Self {
        Self {
            queue,
            loader,
            policy,
            viewport_height,
            watched: HashMap::new(),
            triggered: HashSet::new(),
        }
    }

    /// Queue the trigger feeds.
    #[must_use]
    pub fn queue(&self) -> &Arc<LoadQueue> {
        &self.queue
    }

    /// Height used for intersection and priority.
    #[must_use]
    pub const fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    /// Updates the viewport height for later registrations.
    pub fn set_viewport_height(&mut self, viewport_height: f64) {
        self.viewport_height = viewport_height;
    }

    /// Enqueues a slot already in the viewport, otherwise starts watching it.
    pub fn register(&mut self, slot: Slot) -> Registration {
        if self.triggered.contains(&slot.id) || self.watched.contains_key(&slot.id) {
            trace!(slot = %slot.id, "Slot already registered");
            return Registration::Ignored;
        }

        if slot.bounds.intersects(self.viewport_height) {
            let priority = self.policy.priority(slot.bounds, self.viewport_height);
            self.trigger(slot, priority);
            Registration::Enqueued(priority)
        } else {
            trace!(slot = %slot.id, top = slot.bounds.top, "Watching slot");
            self.watched.insert(slot.id.clone(), slot);
            Registration::Watching
        }
    }

    /// Handles a batch of visibility reports.
    ///
    /// Returns the number of slots enqueued.
    pub fn on_visibility(&mut self, entries: &[VisibilityEntry]) -> usize {
        let mut enqueued = 0;
        for entry in entries.iter().filter(|e| e.is_intersecting) {
            let Some(mut slot) = self.watched.remove(&entry.slot) else {
                continue;
            };
            slot.bounds = entry.bounds;
            let priority = self.policy.priority(entry.bounds, self.viewport_height);
            self.trigger(slot, priority);
            enqueued += 1;
        }

        if enqueued > 0 {
            debug!(enqueued, watching = self.watched.len(), "Slots became visible");
        }
        enqueued
    }

    /// Enqueues a watched slot regardless of visibility.
    ///
    /// Returns false if the slot is not watched.
    pub fn force(&mut self, id: &SlotId, priority: i64) -> bool {
        match self.watched.remove(id) {
            Some(slot) => {
                self.trigger(slot, priority);
                true
            }
            None => false,
        }
    }

    /// Stops watching a slot without loading it.
    pub fn unwatch(&mut self, id: &SlotId) -> bool {
        self.watched.remove(id).is_some()
    }

    /// Forgets every slot. Loads already queued still run.
    pub fn clear(&mut self) {
        debug!(
            watched = self.watched.len(),
            triggered = self.triggered.len(),
            "Clearing visibility trigger"
        );
        self.watched.clear();
        self.triggered.clear();
    }

    /// Number of slots waiting to become visible.
    #[must_use]
    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    /// Slots still waiting for visibility, in no particular order.
    pub fn watched(&self) -> impl Iterator<Item = &Slot> {
        self.watched.values()
    }

    /// Whether the slot has already been enqueued.
    #[must_use]
    pub fn is_triggered(&self, id: &SlotId) -> bool {
        self.triggered.contains(id)
    }

    fn trigger(&mut self, slot: Slot, priority: i64) {
        trace!(slot = %slot.id, priority, "Enqueueing slot");
        self.triggered.insert(slot.id.clone());
        let loader = self.loader.loader_for(slot.id.clone(), slot.url);
        self.queue.enqueue(slot.id, priority, loader);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::SlotBounds;
    use crate::domain::ports::mocks::{MockImageFetcher, RecordingRenderer, png_bytes};
    use crate::infrastructure::image::{LoadQueueConfig, MemoryImageCache, QueueEvent};
    use tokio::sync::mpsc;

    struct Fixture {
        trigger: VisibilityTrigger,
        queue: Arc<LoadQueue>,
        renderer: Arc<RecordingRenderer>,
        events: mpsc::UnboundedReceiver<QueueEvent>,
    }

    fn fixture(urls: &[&str]) -> Fixture {
        let fetcher = urls
            .iter()
            .fold(MockImageFetcher::new(), |f, url| f.with_image(*url, png_bytes(1, 1)));
        let renderer = Arc::new(RecordingRenderer::default());
        let (event_tx, events) = mpsc::unbounded_channel();
        let queue = Arc::new(
            LoadQueue::with_events(LoadQueueConfig { max_concurrency: 4 }, &event_tx).unwrap(),
        );
        let loader = SlotLoader::new(
            Arc::new(fetcher),
            renderer.clone(),
            Arc::new(MemoryImageCache::new(16)),
        );
        let trigger = VisibilityTrigger::new(queue.clone(), loader, PriorityPolicy::Spatial, 800.0);
        Fixture {
            trigger,
            queue,
            renderer,
            events,
        }
    }

    fn slot(url: &str, top: f64) -> Slot {
        Slot::for_url(url, SlotBounds::new(top, top + 100.0))
    }

    fn started_slots(events: &mut mpsc::UnboundedReceiver<QueueEvent>) -> Vec<(SlotId, i64)> {
        let mut started = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let QueueEvent::Started { slot, priority, .. } = event {
                started.push((slot, priority));
            }
        }
        started
    }

    #[tokio::test]
    async fn test_visible_slot_enqueued_immediately() {
        let mut f = fixture(&["a.png"]);

        let result = f.trigger.register(slot("a.png", 350.0));
        f.queue.shutdown().await;

        assert_eq!(result, Registration::Enqueued(0));
        assert_eq!(f.trigger.watched_count(), 0);
        assert_eq!(*f.renderer.revealed.lock(), vec![SlotId::from_url("a.png")]);
        assert_eq!(started_slots(&mut f.events).len(), 1);
    }

    #[tokio::test]
    async fn test_offscreen_slot_waits_for_visibility() {
        let mut f = fixture(&["far.png"]);
        let far = slot("far.png", 2000.0);
        let id = far.id.clone();

        assert_eq!(f.trigger.register(far), Registration::Watching);
        assert_eq!(f.trigger.watched_count(), 1);

        let report = VisibilityEntry {
            slot: id.clone(),
            bounds: SlotBounds::new(700.0, 800.0),
            is_intersecting: true,
        };
        assert_eq!(f.trigger.on_visibility(&[report.clone()]), 1);
        assert_eq!(f.trigger.on_visibility(&[report]), 0);
        f.queue.shutdown().await;

        assert_eq!(f.trigger.watched_count(), 0);
        assert!(f.trigger.is_triggered(&id));
        assert_eq!(started_slots(&mut f.events), vec![(id, 3)]);
    }

    #[tokio::test]
    async fn test_non_intersecting_report_is_ignored() {
        let mut f = fixture(&[]);
        let far = slot("far.png", 2000.0);
        let id = far.id.clone();
        f.trigger.register(far);

        let enqueued = f.trigger.on_visibility(&[VisibilityEntry {
            slot: id,
            bounds: SlotBounds::new(1500.0, 1600.0),
            is_intersecting: false,
        }]);

        assert_eq!(enqueued, 0);
        assert_eq!(f.trigger.watched_count(), 1);
        f.queue.shutdown().await;
        assert!(started_slots(&mut f.events).is_empty());
    }

    #[tokio::test]
    async fn test_slot_loaded_at_most_once() {
        let mut f = fixture(&["a.png"]);

        assert_eq!(f.trigger.register(slot("a.png", 0.0)), Registration::Enqueued(3));
        assert_eq!(f.trigger.register(slot("a.png", 0.0)), Registration::Ignored);
        f.queue.shutdown().await;

        assert_eq!(started_slots(&mut f.events).len(), 1);
    }

    #[tokio::test]
    async fn test_clear_forgets_slots() {
        let mut f = fixture(&[]);
        f.trigger.register(slot("a.png", 5000.0));
        f.trigger.register(slot("b.png", 6000.0));
        assert_eq!(f.trigger.watched_count(), 2);

        assert!(f.trigger.unwatch(&SlotId::from_url("a.png")));
        assert!(!f.trigger.unwatch(&SlotId::from_url("a.png")));

        f.trigger.clear();
        assert_eq!(f.trigger.watched_count(), 0);
        assert_eq!(
            f.trigger.register(slot("b.png", 6000.0)),
            Registration::Watching
        );
        f.queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_static_policy_priority() {
        let mut f = fixture(&["a.png"]);
        f.trigger.policy = PriorityPolicy::Static(10);

        assert_eq!(f.trigger.register(slot("a.png", 0.0)), Registration::Enqueued(10));
        f.queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_load_removes_slot() {
        let f = fixture(&[]);
        let mut trigger = f.trigger;

        trigger.register(slot("missing.png", 100.0));
        f.queue.shutdown().await;

        assert_eq!(*f.renderer.removed.lock(), vec![SlotId::from_url("missing.png")]);
        assert_eq!(f.queue.stats().failed, 1);
    }
}
