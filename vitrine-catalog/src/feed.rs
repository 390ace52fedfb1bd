use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};
use vitrine_core::{AsyncDocumentStore, ChangeEvent, Subscription};

use crate::error::CatalogError;
use crate::gateway::materialize;
use crate::item::Item;

/// In-memory mirror of a store collection, kept current by its change stream.
///
/// Every snapshot replaces the whole set. Records without an image or that
/// do not decode are left out. A failing stream leaves the last good set in
/// place.
///
/// The feed owns its subscription: [`LiveCatalogFeed::close`] releases it,
/// and dropping the feed aborts the background task, which releases it too.
#[derive(Debug)]
pub struct LiveCatalogFeed {
    collection: String,
    items: watch::Receiver<Arc<[Item]>>,
    last_error: Arc<Mutex<Option<String>>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl LiveCatalogFeed {
    /// Subscribes to `collection` and starts mirroring it.
    ///
    /// Must be called within a tokio runtime.
    #[instrument(skip(store))]
    pub async fn open<S: AsyncDocumentStore>(
        store: &S,
        collection: &str,
    ) -> Result<Self, CatalogError> {
        let subscription = store
            .async_subscribe(collection)
            .await
            .map_err(CatalogError::unavailable)?;

        let (items_tx, items) = watch::channel(Arc::<[Item]>::from(Vec::new()));
        let (shutdown, shutdown_rx) = oneshot::channel();
        let last_error = Arc::new(Mutex::new(None));

        let task = tokio::spawn(run(
            subscription,
            items_tx,
            Arc::clone(&last_error),
            shutdown_rx,
        ));
        debug!("feed opened");

        Ok(Self {
            collection: collection.to_string(),
            items,
            last_error,
            shutdown: Some(shutdown),
            task: Some(task),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The current materialized set.
    pub fn items(&self) -> Arc<[Item]> {
        Arc::clone(&self.items.borrow())
    }

    /// Waits for the next materialized set.
    ///
    /// Returns `None` once the feed has stopped.
    pub async fn changed(&mut self) -> Option<Arc<[Item]>> {
        self.items.changed().await.ok()?;
        Some(Arc::clone(&self.items.borrow_and_update()))
    }

    /// A receiver for consumers that want to follow the set on their own.
    pub fn watch(&self) -> watch::Receiver<Arc<[Item]>> {
        self.items.clone()
    }

    /// The most recent failure reported by the change stream, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_open(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Releases the subscription and waits for the background task to stop.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(collection = %self.collection, error = %e, "feed task failed");
            }
        }
        debug!(collection = %self.collection, "feed closed");
    }
}

impl Drop for LiveCatalogFeed {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    mut subscription: Subscription,
    items: watch::Sender<Arc<[Item]>>,
    last_error: Arc<Mutex<Option<String>>>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut failing = false;

    loop {
        let event = tokio::select! {
            _ = &mut shutdown => break,
            event = subscription.recv() => event,
        };

        match event {
            Some(ChangeEvent::Snapshot(records)) => {
                failing = false;
                let received = records.len();
                let set = materialize(records);
                debug!(
                    collection = subscription.collection(),
                    received,
                    kept = set.len(),
                    "snapshot materialized"
                );
                items.send_replace(set.into());
            }
            Some(ChangeEvent::Failed(reason)) => {
                if !failing {
                    warn!(
                        collection = subscription.collection(),
                        %reason,
                        "change stream failed, keeping last known items"
                    );
                }
                failing = true;
                *last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason);
            }
            None => {
                debug!(collection = subscription.collection(), "change stream ended");
                break;
            }
        }
    }

    subscription.close();
}
