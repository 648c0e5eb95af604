//! Bounded-concurrency priority queue for slot image loads.
//!
//! A single scheduler task owns the queue state. It reacts to two kinds of
//! events: enqueue commands arriving over a channel, and settlement of the
//! loads it is currently driving. After every event it promotes pending tasks,
//! lowest priority value first, until the concurrency cap is reached.
//!
//! Loader futures are polled on the scheduler task itself, so all bookkeeping
//! happens on one task and needs no locking.

use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::domain::entities::SlotId;
use crate::domain::errors::{ConfigurationError, ImageLoadError};

/// Future returned by a loader once it is started.
pub type LoadFuture = BoxFuture<'static, Result<(), ImageLoadError>>;

/// Deferred load: invoked only when the task is promoted to active.
pub type Loader = Box<dyn FnOnce() -> LoadFuture + Send>;

/// Default cap on simultaneously running loads.
pub const DEFAULT_MAX_CONCURRENT_LOADS: usize = 100;

/// Configuration for the load queue.
#[derive(Debug, Clone)]
pub struct LoadQueueConfig {
    /// Maximum loads running at once. Must be at least 1.
    pub max_concurrency: usize,
}

impl Default for LoadQueueConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENT_LOADS,
        }
    }
}

/// Progress notification emitted by the scheduler.
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// A task was promoted and its loader invoked.
    Started {
        /// Slot being loaded.
        slot: SlotId,
        /// Priority the task was queued with.
        priority: i64,
        /// Active loads including this one.
        active: usize,
    },
    /// A task finished.
    Settled {
        /// Slot that finished.
        slot: SlotId,
        /// Outcome of the loader.
        result: Result<(), ImageLoadError>,
        /// Active loads after this one was released.
        active: usize,
    },
}

/// Snapshot of queue counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Loads waiting for a concurrency slot.
    pub pending: usize,
    /// Loads currently running.
    pub active: usize,
    /// Loads that settled successfully.
    pub completed: u64,
    /// Loads that failed or panicked.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct QueueCounters {
    pending: AtomicUsize,
    active: AtomicUsize,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// A queued load.
pub struct LoadTask {
    slot: SlotId,
    priority: i64,
    seq: u64,
    loader: Loader,
}

impl std::fmt::Debug for LoadTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadTask")
            .field("slot", &self.slot)
            .field("priority", &self.priority)
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

/// Pending/active bookkeeping.
///
/// `pending` is sorted by `(priority, seq)`; a promoted task leaves `pending`
/// before it is counted in `active`, and `active` never exceeds `max`.
#[derive(Debug)]
pub struct QueueState {
    pending: VecDeque<LoadTask>,
    active: usize,
    max: usize,
    next_seq: u64,
}

impl QueueState {
    /// Creates an empty state. `max` is clamped to at least 1.
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            active: 0,
            max: max.max(1),
            next_seq: 0,
        }
    }

    /// Inserts a task after every pending task with a priority value less than
    /// or equal to its own.
    pub fn push(&mut self, slot: SlotId, priority: i64, loader: Loader) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let index = self.pending.partition_point(|task| task.priority <= priority);
        self.pending.insert(
            index,
            LoadTask {
                slot,
                priority,
                seq,
                loader,
            },
        );
    }

    /// Takes the most urgent pending task if a concurrency slot is free.
    pub fn promote(&mut self) -> Option<LoadTask> {
        if self.active >= self.max {
            return None;
        }
        let task = self.pending.pop_front()?;
        self.active += 1;
        Some(task)
    }

    /// Releases the concurrency slot of a settled task.
    pub fn settle(&mut self) {
        debug_assert!(self.active > 0, "settle without an active task");
        self.active = self.active.saturating_sub(1);
    }

    /// Number of tasks waiting for promotion.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of promoted, unsettled tasks.
    #[must_use]
    pub const fn active(&self) -> usize {
        self.active
    }

    /// Pending slots in the order they would be promoted.
    pub fn pending_slots(&self) -> impl Iterator<Item = &SlotId> {
        self.pending.iter().map(|task| &task.slot)
    }
}

enum QueueCommand {
    Enqueue {
        slot: SlotId,
        priority: i64,
        loader: Loader,
    },
    Close,
}

/// Handle to the load scheduler.
pub struct LoadQueue {
    command_tx: mpsc::UnboundedSender<QueueCommand>,
    counters: Arc<QueueCounters>,
    worker: Mutex<Option<JoinHandle<()>>>,
    config: LoadQueueConfig,
}

impl std::fmt::Debug for LoadQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadQueue")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// State for the background scheduler loop.
struct WorkerState {
    command_rx: mpsc::UnboundedReceiver<QueueCommand>,
    counters: Arc<QueueCounters>,
    event_tx: Option<mpsc::UnboundedSender<QueueEvent>>,
    queue: QueueState,
}

type InFlight = BoxFuture<'static, (SlotId, Result<(), ImageLoadError>)>;

impl LoadQueue {
    /// Starts a scheduler on the current Tokio runtime.
    ///
    /// # Errors
    /// Returns error if `max_concurrency` is zero.
    pub fn new(config: LoadQueueConfig) -> Result<Self, ConfigurationError> {
        Self::spawn(config, None)
    }

    /// Starts a scheduler that reports progress on `event_tx`.
    ///
    /// # Errors
    /// Returns error if `max_concurrency` is zero.
    pub fn with_events(
        config: LoadQueueConfig,
        event_tx: &mpsc::UnboundedSender<QueueEvent>,
    ) -> Result<Self, ConfigurationError> {
        Self::spawn(config, Some(event_tx.clone()))
    }

    fn spawn(
        config: LoadQueueConfig,
        event_tx: Option<mpsc::UnboundedSender<QueueEvent>>,
    ) -> Result<Self, ConfigurationError> {
        if config.max_concurrency == 0 {
            return Err(ConfigurationError::invalid(
                "loading.max_concurrency",
                "must be at least 1",
            ));
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let counters = Arc::new(QueueCounters::default());

        let worker_state = WorkerState {
            command_rx,
            counters: counters.clone(),
            event_tx,
            queue: QueueState::new(config.max_concurrency),
        };

        let worker = tokio::spawn(Self::run_worker_loop(worker_state));

        Ok(Self {
            command_tx,
            counters,
            worker: Mutex::new(Some(worker)),
            config,
        })
    }

    /// Queues a load. `loader` is invoked once the task is promoted.
    pub fn enqueue<F, Fut>(&self, slot: SlotId, priority: i64, loader: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ImageLoadError>> + Send + 'static,
    {
        let loader: Loader = Box::new(move || loader().boxed());
        self.counters.pending.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.command_tx.send(QueueCommand::Enqueue {
            slot,
            priority,
            loader,
        }) {
            self.counters.pending.fetch_sub(1, Ordering::Relaxed);
            warn!("Load queue closed, dropping load: {}", e);
        }
    }

    /// Returns a snapshot of the queue counters.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pending: self.counters.pending.load(Ordering::Relaxed),
            active: self.counters.active.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Returns the configured concurrency cap.
    #[must_use]
    pub const fn max_concurrency(&self) -> usize {
        self.config.max_concurrency
    }

    /// Stops accepting work, lets queued and running loads finish, and waits
    /// for the scheduler to exit.
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(QueueCommand::Close);
        let worker = self.worker.lock().take();
        if let Some(worker) = worker
            && let Err(e) = worker.await
        {
            error!(error = %e, "Load scheduler panicked");
        }
    }

    async fn run_worker_loop(mut state: WorkerState) {
        let mut in_flight: FuturesUnordered<InFlight> = FuturesUnordered::new();
        let mut accepting = true;

        loop {
            while let Some(task) = state.queue.promote() {
                in_flight.push(state.start(task));
            }

            if !accepting && in_flight.is_empty() {
                break;
            }

            tokio::select! {
                cmd = state.command_rx.recv(), if accepting => {
                    match cmd {
                        Some(QueueCommand::Enqueue { slot, priority, loader }) => {
                            trace!(slot = %slot, priority, "Load queued");
                            state.queue.push(slot, priority, loader);
                        }
                        Some(QueueCommand::Close) | None => {
                            state.command_rx.close();
                            state.drain_commands();
                            debug!(pending = state.queue.pending_len(), "Load queue closing");
                            accepting = false;
                        }
                    }
                }
                Some((slot, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    state.finish(slot, result);
                }
            }
        }

        debug!("Load scheduler stopped");
    }
}

impl WorkerState {
    /// Queues loads that were sent before the command channel closed.
    fn drain_commands(&mut self) {
        while let Ok(cmd) = self.command_rx.try_recv() {
            if let QueueCommand::Enqueue {
                slot,
                priority,
                loader,
            } = cmd
            {
                trace!(slot = %slot, priority, "Load queued before close");
                self.queue.push(slot, priority, loader);
            }
        }
    }

    fn start(&mut self, task: LoadTask) -> InFlight {
        let LoadTask {
            slot,
            priority,
            loader,
            ..
        } = task;

        self.counters.pending.fetch_sub(1, Ordering::Relaxed);
        self.counters.active.store(self.queue.active(), Ordering::Relaxed);
        trace!(slot = %slot, priority, active = self.queue.active(), "Load started");
        self.emit(QueueEvent::Started {
            slot: slot.clone(),
            priority,
            active: self.queue.active(),
        });

        let panicked = ImageLoadError::network(slot.as_str(), "loader panicked");
        let load: LoadFuture = match std::panic::catch_unwind(AssertUnwindSafe(loader)) {
            Ok(load) => AssertUnwindSafe(load)
                .catch_unwind()
                .map(move |outcome| outcome.unwrap_or(Err(panicked)))
                .boxed(),
            Err(_) => futures_util::future::ready(Err(panicked)).boxed(),
        };

        async move { (slot, load.await) }.boxed()
    }

    fn finish(&mut self, slot: SlotId, result: Result<(), ImageLoadError>) {
        self.queue.settle();
        self.counters.active.store(self.queue.active(), Ordering::Relaxed);

        match &result {
            Ok(()) => {
                self.counters.completed.fetch_add(1, Ordering::Relaxed);
                trace!(slot = %slot, "Load settled");
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(slot = %slot, error = %e, "Image load failed");
            }
        }

        self.emit(QueueEvent::Settled {
            slot,
            result,
            active: self.queue.active(),
        });
    }

    fn emit(&self, event: QueueEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn noop() -> Loader {
        Box::new(|| futures_util::future::ready(Ok(())).boxed())
    }

    fn queue(max: usize) -> LoadQueue {
        LoadQueue::new(LoadQueueConfig {
            max_concurrency: max,
        })
        .unwrap()
    }

    #[test]
    fn test_state_orders_by_priority_then_insertion() {
        let mut state = QueueState::new(10);
        state.push("p5".into(), 5, noop());
        state.push("p1a".into(), 1, noop());
        state.push("p3".into(), 3, noop());
        state.push("p1b".into(), 1, noop());

        let order: Vec<&str> = state.pending_slots().map(SlotId::as_str).collect();
        assert_eq!(order, vec!["p1a", "p1b", "p3", "p5"]);
    }

    #[test]
    fn test_state_respects_cap() {
        let mut state = QueueState::new(2);
        for i in 0..4 {
            state.push(SlotId::new(i.to_string()), 0, noop());
        }

        assert!(state.promote().is_some());
        assert!(state.promote().is_some());
        assert!(state.promote().is_none());
        assert_eq!(state.active(), 2);
        assert_eq!(state.pending_len(), 2);

        state.settle();
        assert!(state.promote().is_some());
        assert_eq!(state.active(), 2);
        assert_eq!(state.pending_len(), 1);
    }

    #[test]
    fn test_state_clamps_zero_max() {
        let mut state = QueueState::new(0);
        state.push("a".into(), 0, noop());
        assert!(state.promote().is_some());
    }

    #[tokio::test]
    async fn test_zero_concurrency_rejected() {
        let result = LoadQueue::new(LoadQueueConfig { max_concurrency: 0 });
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidValue { .. })
        ));
    }

    #[tokio::test]
    async fn test_runs_in_priority_order() {
        let queue = queue(1);
        let started = Arc::new(Mutex::new(Vec::new()));
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let log = started.clone();
        queue.enqueue("gate".into(), 0, move || {
            log.lock().push("gate");
            async move {
                let _ = release_rx.await;
                Ok::<(), ImageLoadError>(())
            }
        });

        for (name, priority) in [("p5", 5), ("p1a", 1), ("p3", 3), ("p1b", 1)] {
            let log = started.clone();
            queue.enqueue(name.into(), priority, move || {
                log.lock().push(name);
                async { Ok::<(), ImageLoadError>(()) }
            });
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*started.lock(), vec!["gate"]);
        assert_eq!(queue.stats().pending, 4);

        release_tx.send(()).unwrap();
        queue.shutdown().await;

        assert_eq!(*started.lock(), vec!["gate", "p1a", "p1b", "p3", "p5"]);
        assert_eq!(queue.stats().completed, 5);
    }

    #[tokio::test]
    async fn test_active_never_exceeds_cap() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let queue = LoadQueue::with_events(LoadQueueConfig { max_concurrency: 3 }, &event_tx)
            .unwrap();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for i in 0..20u64 {
            let running = running.clone();
            let peak = peak.clone();
            queue.enqueue(SlotId::new(i.to_string()), (i % 4) as i64, move || async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(1 + i % 5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok::<(), ImageLoadError>(())
            });
        }

        queue.shutdown().await;
        drop(event_tx);

        assert!(peak.load(Ordering::SeqCst) <= 3);
        let mut settled = 0;
        while let Some(event) = event_rx.recv().await {
            match event {
                QueueEvent::Started { active, .. } => assert!(active <= 3),
                QueueEvent::Settled { active, .. } => {
                    assert!(active < 3);
                    settled += 1;
                }
            }
        }
        assert_eq!(settled, 20);
        assert_eq!(queue.stats(), QueueStats {
            pending: 0,
            active: 0,
            completed: 20,
            failed: 0,
        });
    }

    fn ran_marker() -> bool {
        true
    }

    #[tokio::test]
    async fn test_failures_do_not_stall_queue() {
        let queue = queue(1);
        let ran = Arc::new(AtomicUsize::new(0));

        queue.enqueue("broken".into(), 0, || async {
            Err(ImageLoadError::network("broken.png", "connection reset"))
        });
        queue.enqueue("panics".into(), 1, || async {
            if ran_marker() {
                panic!("decoder exploded");
            }
            Ok::<(), ImageLoadError>(())
        });
        for i in 0..3 {
            let ran = ran.clone();
            queue.enqueue(SlotId::new(format!("ok{i}")), 2, move || async move {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok::<(), ImageLoadError>(())
            });
        }

        queue.shutdown().await;

        assert_eq!(ran.load(Ordering::SeqCst), 3);
        let stats = queue.stats();
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.completed, 3);
    }

    #[tokio::test]
    async fn test_later_urgent_task_jumps_pending() {
        let queue = queue(1);
        let started = Arc::new(Mutex::new(Vec::new()));
        let (release_tx, release_rx) = oneshot::channel::<()>();

        queue.enqueue("gate".into(), 0, move || async move {
            let _ = release_rx.await;
            Ok::<(), ImageLoadError>(())
        });

        let log = started.clone();
        queue.enqueue("offscreen".into(), 40, move || {
            log.lock().push("offscreen");
            async { Ok::<(), ImageLoadError>(()) }
        });
        let log = started.clone();
        queue.enqueue("visible".into(), 2, move || {
            log.lock().push("visible");
            async { Ok::<(), ImageLoadError>(()) }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        release_tx.send(()).unwrap();
        queue.shutdown().await;

        assert_eq!(*started.lock(), vec!["visible", "offscreen"]);
    }

    #[tokio::test]
    async fn test_enqueue_after_close_is_rejected() {
        let queue = Arc::new(queue(1));
        let (release_tx, release_rx) = oneshot::channel::<()>();
        queue.enqueue("gate".into(), 0, move || async move {
            let _ = release_rx.await;
            Ok::<(), ImageLoadError>(())
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let closing = queue.clone();
        let shutdown = tokio::spawn(async move { closing.shutdown().await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let ran = Arc::new(AtomicUsize::new(0));
        let late = ran.clone();
        queue.enqueue("late".into(), 0, move || async move {
            late.fetch_add(1, Ordering::SeqCst);
            Ok::<(), ImageLoadError>(())
        });

        release_tx.send(()).unwrap();
        shutdown.await.unwrap();

        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(queue.stats(), QueueStats {
            pending: 0,
            active: 0,
            completed: 1,
            failed: 0,
        });
    }

    #[tokio::test]
    async fn test_loads_sent_before_close_still_run() {
        let queue = queue(1);
        let ran = Arc::new(AtomicUsize::new(0));
        for i in 0..5 {
            let ran = ran.clone();
            queue.enqueue(SlotId::new(format!("s{i}")), i, move || async move {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok::<(), ImageLoadError>(())
            });
        }

        queue.shutdown().await;

        assert_eq!(ran.load(Ordering::SeqCst), 5);
        assert_eq!(queue.stats().pending, 0);
    }
}
