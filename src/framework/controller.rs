//! # Controller Runtime
//!
//! Turns store change events into reconcile calls.
//!
//! ## Flow
//!
//! ```text
//! ResourceActor --watch--> source task --mapper--> WorkQueue --> Controller::run --> Reconciler
//!        ^                                                                               |
//!        +------------------------------- writes ----------------------------------------+
//! ```
//!
//! - **Sources** subscribe to a store's watch stream, list everything once (and again
//!   after falling behind), and map each object to zero or more reconcile keys.
//! - The **WorkQueue** coalesces duplicate keys and guarantees a key is never reconciled
//!   by two tasks at once. A key that changes while it is being reconciled is run again
//!   afterwards.
//! - The **Controller** runs distinct keys concurrently, bounded by a semaphore, and
//!   applies the outcome: wait for the next change, requeue now, or retry after backoff.

use crate::framework::client::ResourceClient;
use crate::framework::meta::ObjectKey;
use crate::framework::resource::Resource;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, info_span, warn, Instrument};

/// What the controller should do with a key after a successful reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing left to do until the next change event.
    AwaitChange,
    /// Reconcile the key again right away.
    Requeue,
}

/// A level-triggered control loop for one kind.
///
/// `reconcile` receives only a key: it must fetch current state itself and be safe to
/// run any number of times.
#[async_trait]
pub trait Reconciler: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Name used in logs and spans.
    const NAME: &'static str;

    async fn reconcile(&self, key: &ObjectKey) -> Result<Action, Self::Error>;

    /// Stale-version failures are retried immediately instead of backing off.
    fn is_conflict(&self, _error: &Self::Error) -> bool {
        false
    }
}

/// Exponential retry delay: `base`, `2 * base`, `4 * base`, ... capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Delay before retry number `failures` (1-based).
    pub fn delay(&self, failures: u32) -> Duration {
        let shift = failures.saturating_sub(1).min(31);
        self.base.saturating_mul(1u32 << shift).min(self.max)
    }
}

#[derive(Default)]
struct QueueState {
    queued: HashSet<ObjectKey>,
    processing: HashSet<ObjectKey>,
    dirty: HashSet<ObjectKey>,
    failures: HashMap<ObjectKey, u32>,
}

/// De-duplicating queue of reconcile keys.
pub struct WorkQueue {
    state: Mutex<QueueState>,
    ready: mpsc::UnboundedSender<ObjectKey>,
}

impl WorkQueue {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ObjectKey>) {
        let (ready, receiver) = mpsc::unbounded_channel();
        let queue = Arc::new(Self {
            state: Mutex::new(QueueState::default()),
            ready,
        });
        (queue, receiver)
    }

    /// Schedules `key`. Returns `false` when it was coalesced with a pending run.
    pub fn enqueue(&self, key: ObjectKey) -> bool {
        let mut state = self.lock();
        if state.processing.contains(&key) {
            state.dirty.insert(key);
            return false;
        }
        if !state.queued.insert(key.clone()) {
            return false;
        }
        drop(state);
        // A closed receiver means the controller has stopped.
        let _ = self.ready.send(key);
        true
    }

    fn start(&self, key: &ObjectKey) {
        let mut state = self.lock();
        state.queued.remove(key);
        state.processing.insert(key.clone());
    }

    fn finish(&self, key: &ObjectKey) {
        let mut state = self.lock();
        state.processing.remove(key);
        if state.dirty.remove(key) {
            state.queued.insert(key.clone());
            drop(state);
            let _ = self.ready.send(key.clone());
        }
    }

    fn record_failure(&self, key: &ObjectKey) -> u32 {
        let mut state = self.lock();
        let failures = state.failures.entry(key.clone()).or_insert(0);
        *failures = failures.saturating_add(1);
        *failures
    }

    fn forget(&self, key: &ObjectKey) {
        self.lock().failures.remove(key);
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drives one [`Reconciler`] from any number of watch sources.
pub struct Controller<R: Reconciler> {
    reconciler: Arc<R>,
    queue: Arc<WorkQueue>,
    ready: mpsc::UnboundedReceiver<ObjectKey>,
    sources: Vec<JoinHandle<()>>,
    max_concurrent: usize,
    backoff: Backoff,
}

impl<R: Reconciler> Controller<R> {
    pub fn new(reconciler: R, max_concurrent: usize, backoff: Backoff) -> Self {
        let (queue, ready) = WorkQueue::new();
        Self {
            reconciler: Arc::new(reconciler),
            queue,
            ready,
            sources: Vec::new(),
            max_concurrent: max_concurrent.max(1),
            backoff,
        }
    }

    /// Reconciles every object of kind `T` under its own key.
    pub fn owns<T: Resource>(self, client: ResourceClient<T>) -> Self {
        self.watches(client, |object: &T| vec![object.key()])
    }

    /// Reconciles the keys `mapper` derives from every change to a `T`.
    ///
    /// Must be called from within a Tokio runtime: the source task starts immediately.
    pub fn watches<T, F>(mut self, client: ResourceClient<T>, mapper: F) -> Self
    where
        T: Resource,
        F: Fn(&T) -> Vec<ObjectKey> + Send + Sync + 'static,
    {
        let queue = self.queue.clone();
        let handle = tokio::spawn(forward_events(R::NAME, client, queue, mapper));
        self.sources.push(handle);
        self
    }

    /// Processes keys until `shutdown` turns `true` or its sender is dropped.
    ///
    /// Watch sources are stopped first; reconciles already running are awaited.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let name = R::NAME;
        info!(controller = name, max_concurrent = self.max_concurrent, "Controller started");

        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let mut in_flight = JoinSet::new();

        if !*shutdown.borrow() {
            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    key = self.ready.recv() => {
                        let Some(key) = key else { break };
                        let Ok(permit) = permits.clone().acquire_owned().await else { break };
                        in_flight.spawn(process(
                            self.reconciler.clone(),
                            self.queue.clone(),
                            self.backoff,
                            key,
                            permit,
                        ));
                    }
                    Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
                }
            }
        }

        for source in self.sources.drain(..) {
            source.abort();
            // Wait until the task is gone and its client dropped.
            let _ = source.await;
        }
        while in_flight.join_next().await.is_some() {}
        info!(controller = name, "Controller stopped");
    }
}

async fn process<R: Reconciler>(
    reconciler: Arc<R>,
    queue: Arc<WorkQueue>,
    backoff: Backoff,
    key: ObjectKey,
    _permit: OwnedSemaphorePermit,
) {
    let name = R::NAME;
    queue.start(&key);
    let span = info_span!("reconcile", controller = name, %key);
    let result = reconciler.reconcile(&key).instrument(span).await;
    queue.finish(&key);

    match result {
        Ok(Action::AwaitChange) => {
            queue.forget(&key);
            debug!(controller = name, %key, "Reconciled");
        }
        Ok(Action::Requeue) => {
            queue.forget(&key);
            debug!(controller = name, %key, "Requeue requested");
            queue.enqueue(key);
        }
        Err(e) if reconciler.is_conflict(&e) => {
            info!(controller = name, %key, error = %e, "Conflict, refetching");
            queue.enqueue(key);
        }
        Err(e) => {
            let failures = queue.record_failure(&key);
            let delay = backoff.delay(failures);
            warn!(controller = name, %key, error = %e, failures, ?delay, "Reconcile failed");
            schedule(queue, key, delay);
        }
    }
}

fn schedule(queue: Arc<WorkQueue>, key: ObjectKey, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        queue.enqueue(key);
    });
}

async fn forward_events<T, F>(
    controller: &'static str,
    client: ResourceClient<T>,
    queue: Arc<WorkQueue>,
    mapper: F,
) where
    T: Resource,
    F: Fn(&T) -> Vec<ObjectKey> + Send + Sync + 'static,
{
    let kind = T::KIND;
    // Subscribe before listing so nothing written in between is missed.
    let mut events = match client.watch().await {
        Ok(events) => events,
        Err(e) => {
            warn!(controller, kind, error = %e, "Watch failed");
            return;
        }
    };
    resync(controller, &client, &queue, &mapper).await;

    loop {
        match events.recv().await {
            Ok(event) => {
                // Both sides of a modification, so a key the object stopped mapping to
                // is still reconciled.
                for object in event.objects() {
                    for key in mapper(object) {
                        queue.enqueue(key);
                    }
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(controller, kind, skipped, "Watch lagged, relisting");
                resync(controller, &client, &queue, &mapper).await;
            }
            Err(RecvError::Closed) => {
                debug!(controller, kind, "Watch closed");
                break;
            }
        }
    }
}

async fn resync<T, F>(
    controller: &'static str,
    client: &ResourceClient<T>,
    queue: &WorkQueue,
    mapper: &F,
) where
    T: Resource,
    F: Fn(&T) -> Vec<ObjectKey>,
{
    match client.list(None).await {
        Ok(objects) => {
            debug!(controller, kind = T::KIND, count = objects.len(), "Resync");
            for object in &objects {
                for key in mapper(object) {
                    queue.enqueue(key);
                }
            }
        }
        Err(e) => warn!(controller, kind = T::KIND, error = %e, "Resync list failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::actor::ResourceActor;
    use crate::framework::meta::ObjectMeta;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_doubles_and_caps() {
        let backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(200));
        assert_eq!(backoff.delay(4), Duration::from_millis(800));
        assert_eq!(backoff.delay(5), Duration::from_secs(1));
        assert_eq!(backoff.delay(500), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_queue_coalesces_duplicates() {
        let (queue, mut ready) = WorkQueue::new();
        let key = ObjectKey::namespaced("a", "x");

        assert!(queue.enqueue(key.clone()));
        assert!(!queue.enqueue(key.clone()));
        assert_eq!(ready.recv().await.unwrap(), key);
        assert!(ready.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_queue_reruns_key_changed_while_processing() {
        let (queue, mut ready) = WorkQueue::new();
        let key = ObjectKey::namespaced("a", "x");

        queue.enqueue(key.clone());
        let taken = ready.recv().await.unwrap();
        queue.start(&taken);

        // Two changes during processing collapse into one follow-up run.
        assert!(!queue.enqueue(key.clone()));
        assert!(!queue.enqueue(key.clone()));
        assert!(ready.try_recv().is_err());

        queue.finish(&taken);
        assert_eq!(ready.recv().await.unwrap(), key);
        assert!(ready.try_recv().is_err());
    }

    #[derive(Clone, Debug)]
    struct Ticket {
        metadata: ObjectMeta,
    }

    impl Resource for Ticket {
        const KIND: &'static str = "Ticket";
        const NAMESPACED: bool = false;

        fn meta(&self) -> &ObjectMeta {
            &self.metadata
        }

        fn meta_mut(&mut self) -> &mut ObjectMeta {
            &mut self.metadata
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("flaky")]
    struct Flaky;

    struct FlakyReconciler {
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Reconciler for FlakyReconciler {
        type Error = Flaky;
        const NAME: &'static str = "flaky";

        async fn reconcile(&self, _key: &ObjectKey) -> Result<Action, Flaky> {
            // Fail the first attempt only.
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Flaky)
            } else {
                Ok(Action::AwaitChange)
            }
        }
    }

    #[tokio::test]
    async fn test_controller_retries_failed_key() {
        let (actor, client) = ResourceActor::<Ticket>::new(10, 16);
        tokio::spawn(actor.run());
        client
            .create(Ticket {
                metadata: ObjectMeta::cluster("t1"),
            })
            .await
            .unwrap();

        let calls = Arc::new(AtomicU32::new(0));
        let backoff = Backoff::new(Duration::from_millis(5), Duration::from_millis(20));
        let controller = Controller::new(FlakyReconciler { calls: calls.clone() }, 2, backoff)
            .owns(client.clone());

        let (stop, shutdown) = watch::channel(false);
        let handle = tokio::spawn(controller.run(shutdown));

        tokio::time::timeout(Duration::from_secs(5), async {
            while calls.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("reconcile was not retried");

        stop.send(true).unwrap();
        handle.await.unwrap();
    }
}
