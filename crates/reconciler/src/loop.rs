//! Continuous reconciliation loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use kiln_store::{Component, StoreEvent, StoreExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::reconciler::ComponentReconciler;
use crate::types::ComponentKey;

/// Configuration for the reconciliation loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Delay before a failed key is delivered again.
    pub requeue_delay: Duration,
    /// Consecutive failures after which a key is dropped; 0 retries forever.
    pub max_attempts: u32,
    /// Capacity of the work queue.
    pub queue_capacity: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            requeue_delay: Duration::from_secs(5),
            max_attempts: 0,
            queue_capacity: 1024,
        }
    }
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Runs that returned an outcome.
    pub reconciled: u64,
    /// Runs that returned an error.
    pub failed: u64,
    /// Failed keys scheduled for redelivery.
    pub requeued: u64,
    /// Keys discarded after too many failures or on a full queue.
    pub dropped: u64,
}

/// Continuous reconciliation loop.
///
/// Keys arrive from store events, from a [`LoopHandle`] and from requeues of
/// failed runs. They are processed one at a time.
pub struct ReconciliationLoop {
    /// The reconciler.
    reconciler: Arc<ComponentReconciler>,
    /// Loop configuration.
    config: LoopConfig,
    /// Work queue sender, shared with handles and requeue timers.
    queue_tx: mpsc::Sender<ComponentKey>,
    /// Work queue receiver.
    queue_rx: mpsc::Receiver<ComponentKey>,
    /// Store change notifications, when watching.
    events: Option<broadcast::Receiver<StoreEvent>>,
    /// Stop signal receiver.
    stop_rx: watch::Receiver<bool>,
    /// Stop signal sender (for external control).
    stop_tx: watch::Sender<bool>,
    /// Consecutive failures per key.
    attempts: HashMap<ComponentKey, u32>,
    stats: LoopStats,
}

impl ReconciliationLoop {
    /// Create a new reconciliation loop.
    pub fn new(reconciler: Arc<ComponentReconciler>, config: LoopConfig) -> Self {
        let (queue_tx, queue_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            reconciler,
            config,
            queue_tx,
            queue_rx,
            events: None,
            stop_rx,
            stop_tx,
            attempts: HashMap::new(),
            stats: LoopStats::default(),
        }
    }

    /// Drive the loop from store change notifications.
    #[must_use]
    pub fn watch(mut self, events: broadcast::Receiver<StoreEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Get a handle for enqueueing keys.
    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            queue_tx: self.queue_tx.clone(),
        }
    }

    /// Get a stopper handle.
    pub fn stopper(&self) -> LoopStopper {
        LoopStopper {
            stop_tx: self.stop_tx.clone(),
        }
    }

    /// Run the reconciliation loop until stopped.
    ///
    /// Every component in the store is enqueued once on start.
    pub async fn run(mut self) -> LoopStats {
        info!(
            requeue_delay_ms = self.config.requeue_delay.as_millis(),
            max_attempts = self.config.max_attempts,
            watching = self.events.is_some(),
            "Starting reconciliation loop"
        );

        self.resync().await;

        loop {
            tokio::select! {
                biased;
                changed = self.stop_rx.changed() => {
                    if changed.is_err() || *self.stop_rx.borrow() {
                        info!("Reconciliation loop stopped");
                        break;
                    }
                }
                Some(key) = self.queue_rx.recv() => self.process(key).await,
                event = next_event(&mut self.events) => self.on_event(event).await,
            }
        }

        self.stats
    }

    /// Reconcile one key and schedule a retry on failure.
    async fn process(&mut self, key: ComponentKey) {
        match self.reconciler.reconcile(&key).await {
            Ok(outcome) => {
                self.attempts.remove(&key);
                self.stats.reconciled = self.stats.reconciled.saturating_add(1);
                debug!(component = %key, outcome = %outcome, "Reconcile finished");
            }
            Err(e) => {
                self.stats.failed = self.stats.failed.saturating_add(1);
                let attempt = self
                    .attempts
                    .get(&key)
                    .copied()
                    .unwrap_or_default()
                    .saturating_add(1);

                if self.config.max_attempts != 0 && attempt >= self.config.max_attempts {
                    error!(
                        component = %key,
                        class = %e.class(),
                        error = %e,
                        attempt,
                        "Max attempts reached, dropping component"
                    );
                    self.attempts.remove(&key);
                    self.stats.dropped = self.stats.dropped.saturating_add(1);
                    return;
                }

                warn!(
                    component = %key,
                    class = %e.class(),
                    error = %e,
                    attempt,
                    delay_ms = self.config.requeue_delay.as_millis(),
                    "Reconcile failed, requeueing"
                );
                self.attempts.insert(key.clone(), attempt);
                self.stats.requeued = self.stats.requeued.saturating_add(1);
                self.requeue_after(key, self.config.requeue_delay);
            }
        }
    }

    async fn on_event(&mut self, event: Result<StoreEvent, RecvError>) {
        match event {
            Ok(event) => {
                if let Some(key) = ComponentKey::from_object_key(event.key()) {
                    self.offer(key);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Store events lagged, resyncing components");
                self.resync().await;
            }
            Err(RecvError::Closed) => {
                debug!("Store event stream closed");
                self.events = None;
            }
        }
    }

    /// Enqueue every component currently in the store.
    async fn resync(&mut self) {
        let listed = self.reconciler.store().list_as::<Component>(None).await;
        match listed {
            Ok(components) => components
                .iter()
                .map(ComponentKey::from)
                .for_each(|key| self.offer(key)),
            Err(e) => warn!(error = %e, "Listing components failed"),
        }
    }

    fn offer(&mut self, key: ComponentKey) {
        if let Err(TrySendError::Full(key)) = self.queue_tx.try_send(key) {
            warn!(component = %key, "Work queue full, dropping component");
            self.stats.dropped = self.stats.dropped.saturating_add(1);
        }
    }

    fn requeue_after(&self, key: ComponentKey, delay: Duration) {
        let queue_tx = self.queue_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = queue_tx.send(key).await;
        });
    }
}

async fn next_event(
    events: &mut Option<broadcast::Receiver<StoreEvent>>,
) -> Result<StoreEvent, RecvError> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

/// Handle to enqueue keys into a reconciliation loop.
#[derive(Clone)]
pub struct LoopHandle {
    queue_tx: mpsc::Sender<ComponentKey>,
}

impl LoopHandle {
    /// Enqueue a component; returns false once the loop is gone.
    pub async fn enqueue(&self, key: ComponentKey) -> bool {
        self.queue_tx.send(key).await.is_ok()
    }
}

/// Handle to stop a reconciliation loop.
#[derive(Clone)]
pub struct LoopStopper {
    stop_tx: watch::Sender<bool>,
}

impl LoopStopper {
    /// Stop the loop.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}
