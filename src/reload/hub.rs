//! Subscriber registry and broadcast dispatcher.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};

use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::FxBuildHasher;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use super::ChangeEvent;
use crate::config::DeliveryPolicy;

/// Opaque identity of one attached subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Mint a fresh identity. Monotonic for the process lifetime.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Subscriber map: concurrent, statically typed channels, no runtime casts.
type SubscriberMap = DashMap<SubscriberId, mpsc::Sender<ChangeEvent>, FxBuildHasher>;

/// Registry of subscriber channels plus the dispatch task fanning the
/// central event stream out to them.
///
/// The dispatcher is started lazily by the first registration, at most once
/// per process; the `Once` replaces a hand-rolled flag-and-mutex check. It
/// runs until the central event source closes, which happens when the
/// watcher side drops its sender.
pub struct ReloadHub {
    subscribers: Arc<SubscriberMap>,
    /// Central event source, taken by the dispatcher on first registration.
    events: Mutex<Option<mpsc::Receiver<ChangeEvent>>>,
    started: Once,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    delivery: DeliveryPolicy,
}

impl ReloadHub {
    pub fn new(events: mpsc::Receiver<ChangeEvent>, delivery: DeliveryPolicy) -> Self {
        Self {
            subscribers: Arc::new(SubscriberMap::with_hasher(FxBuildHasher::default())),
            events: Mutex::new(Some(events)),
            started: Once::new(),
            dispatcher: Mutex::new(None),
            delivery,
        }
    }

    /// Attach a subscriber's outbound channel.
    ///
    /// The first registration spawns the dispatch task; the map insertion
    /// itself runs concurrently with other register/deregister calls. Must
    /// be called from within a tokio runtime.
    pub fn register(&self, id: SubscriberId, tx: mpsc::Sender<ChangeEvent>) {
        self.started.call_once(|| {
            let events = self
                .events
                .lock()
                .take()
                .expect("central event source already taken");
            let subscribers = Arc::clone(&self.subscribers);
            let delivery = self.delivery;

            crate::debug!("reload"; "starting dispatcher");
            let handle = tokio::spawn(dispatch(subscribers, events, delivery));
            *self.dispatcher.lock() = Some(handle);
        });

        self.subscribers.insert(id, tx);
        crate::debug!("reload"; "subscriber {} registered ({} attached)", id, self.subscriber_count());
    }

    /// Detach a subscriber. Idempotent: detaching an unknown id is a no-op.
    pub fn deregister(&self, id: SubscriberId) {
        if self.subscribers.remove(&id).is_some() {
            crate::debug!("reload"; "subscriber {} deregistered ({} attached)", id, self.subscribers.len());
        }
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Wait for the dispatch task to terminate.
    ///
    /// Returns immediately when the dispatcher was never started.
    pub async fn join(&self) {
        let handle = self.dispatcher.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

/// Dispatch loop: consume the central event stream and fan each event out
/// to every currently attached subscriber.
async fn dispatch(
    subscribers: Arc<SubscriberMap>,
    mut events: mpsc::Receiver<ChangeEvent>,
    delivery: DeliveryPolicy,
) {
    while let Some(event) = events.recv().await {
        crate::debug!("reload"; "got update: '{}'", event);

        // Snapshot of the current subscriber set; iteration order is
        // unspecified. Delivery is not transactional: a failed hand-off to
        // one subscriber neither rolls back nor aborts the others.
        let targets: Vec<(SubscriberId, mpsc::Sender<ChangeEvent>)> = subscribers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        for (id, tx) in targets {
            match delivery {
                DeliveryPolicy::Block => {
                    // Blocking hand-off: a stalled subscriber delays every
                    // subscriber iterated after it for this event.
                    if tx.send(event.clone()).await.is_err() {
                        crate::debug!("reload"; "subscriber {} gone, skipping", id);
                    }
                }
                DeliveryPolicy::Drop => match tx.try_send(event.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        crate::debug!("reload"; "subscriber {} full, dropping '{}'", id, event);
                    }
                    Err(TrySendError::Closed(_)) => {
                        crate::debug!("reload"; "subscriber {} gone, skipping", id);
                    }
                },
            }
        }
    }

    // Event source closed: close every subscriber channel exactly once by
    // dropping its sender, then terminate for good. This sweep is the only
    // path that closes the channel of a live connection; deregistration of
    // a finished connection merely removes its entry.
    crate::debug!("reload"; "event source closed, stopping dispatcher");
    subscribers.retain(|id, _| {
        crate::debug!("reload"; "closing stream for subscriber {}", id);
        false
    });
}
