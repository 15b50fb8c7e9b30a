use std::sync::Arc;

use tokio::sync::watch;

use crate::db::DbError;

use super::StoreError;

/// One published state of an observable collection.
///
/// `version` increases on every publish. `stale` is set when the most recent
/// reload failed; `items` then still holds the last successfully loaded rows.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub items: Arc<Vec<T>>,
    pub version: u64,
    pub stale: bool,
}

impl<T> Snapshot<T> {
    fn empty() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            version: 0,
            stale: false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A named collection published through a watch channel.
pub(crate) struct Collection<T> {
    name: &'static str,
    tx: watch::Sender<Snapshot<T>>,
}

impl<T> Collection<T> {
    pub(crate) fn new(name: &'static str) -> Self {
        let (tx, _rx) = watch::channel(Snapshot::empty());
        Self { name, tx }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.tx.subscribe()
    }

    pub(crate) fn current(&self) -> Arc<Vec<T>> {
        self.tx.borrow().items.clone()
    }

    pub(crate) fn publish(&self, items: Vec<T>) {
        self.tx.send_modify(|snapshot| {
            snapshot.items = Arc::new(items);
            snapshot.version += 1;
            snapshot.stale = false;
        });
    }

    /// Replace the whole collection with a fresh read from `load`.
    ///
    /// On failure the previous items stay published and are flagged stale.
    pub(crate) fn refresh(
        &self,
        load: impl FnOnce() -> Result<Vec<T>, DbError>,
    ) -> Result<(), StoreError> {
        match load() {
            Ok(items) => {
                tracing::debug!("Reloaded {} ({} rows)", self.name, items.len());
                self.publish(items);
                Ok(())
            }
            Err(source) => {
                tracing::warn!("Reload of {} failed, keeping stale snapshot: {}", self.name, source);
                self.tx.send_modify(|snapshot| {
                    snapshot.version += 1;
                    snapshot.stale = true;
                });
                Err(StoreError::Reload {
                    collection: self.name,
                    source,
                })
            }
        }
    }
}
