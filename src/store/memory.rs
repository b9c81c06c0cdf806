//! In-process [`DocumentStore`] implementation.
//!
//! [`MemoryStore`] backs the component tests and headless embedding: it keeps
//! collections in memory, answers queries with the same ordering and cursor
//! semantics the hosted store uses, and drives live listeners the same way
//! (an immediate initial snapshot, then a fresh snapshot after every mutation
//! of the collection). `set_offline(true)` makes every operation fail with
//! [`Error::RemoteUnavailable`] so failure paths can be exercised.

use super::{
    Direction, DocumentStore, ErrorFn, ListenerHandle, Query, Snapshot, SnapshotFn, SortField,
};
use crate::document::Document;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

struct Listener<D> {
    id: u64,
    query: Query,
    on_snapshot: SnapshotFn<D>,
}

struct Inner<D> {
    collections: Mutex<HashMap<String, Vec<D>>>,
    listeners: Mutex<Vec<Listener<D>>>,
    offline: AtomicBool,
    next_listener_id: AtomicU64,
    next_doc_id: AtomicU64,
}

/// An in-memory document store with live listeners.
///
/// Cloning is cheap and shares the underlying collections, so a clone can
/// mutate data while another handle holds subscriptions.
pub struct MemoryStore<D: Document> {
    inner: Arc<Inner<D>>,
}

impl<D: Document> Clone for MemoryStore<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Document> Default for MemoryStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Document> MemoryStore<D> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                collections: Mutex::new(HashMap::new()),
                listeners: Mutex::new(Vec::new()),
                offline: AtomicBool::new(false),
                next_listener_id: AtomicU64::new(1),
                next_doc_id: AtomicU64::new(1),
            }),
        }
    }

    /// Replaces the contents of a collection without assigning ids; listeners
    /// on it are notified.
    pub fn seed(&self, collection: &str, docs: Vec<D>) {
        lock(&self.inner.collections).insert(collection.to_string(), docs);
        self.notify(collection);
    }

    /// Toggles simulated connectivity loss. While offline every operation
    /// returns [`Error::RemoteUnavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of documents currently in a collection.
    pub fn len(&self, collection: &str) -> usize {
        lock(&self.inner.collections)
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Whether a collection is empty or absent.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn check_online(&self) -> Result<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            Err(Error::remote("store is offline"))
        } else {
            Ok(())
        }
    }

    fn run_query(&self, query: &Query) -> Snapshot<D> {
        let collections = lock(&self.inner.collections);
        let mut docs: Vec<D> = collections
            .get(&query.collection)
            .cloned()
            .unwrap_or_default();
        drop(collections);

        let key = |d: &D| match query.order_by.field {
            SortField::DateCreated => d.created_at(),
            SortField::DateModified => d.modified_at(),
        };
        // Stable sort keeps insertion order among equal timestamps.
        match query.order_by.direction {
            Direction::Ascending => docs.sort_by_key(key),
            Direction::Descending => {
                docs.sort_by(|a, b| key(b).cmp(&key(a)));
            }
        }

        if let Some(last_id) = query.start_after.last_id() {
            if let Some(pos) = docs.iter().position(|d| d.id() == last_id) {
                docs.drain(..=pos);
            }
        }
        docs.truncate(query.limit);
        Snapshot::from_batch(docs)
    }

    /// Delivers a fresh snapshot to every listener on the collection.
    fn notify(&self, collection: &str) {
        let targets: Vec<(Query, SnapshotFn<D>)> = lock(&self.inner.listeners)
            .iter()
            .filter(|l| l.query.collection == collection)
            .map(|l| (l.query.clone(), Arc::clone(&l.on_snapshot)))
            .collect();
        // Callbacks run outside the listener lock; they may unsubscribe.
        for (query, on_snapshot) in targets {
            on_snapshot(self.run_query(&query));
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<D: Document> DocumentStore<D> for MemoryStore<D> {
    fn fetch_once(&self, query: &Query) -> Result<Snapshot<D>> {
        self.check_online()?;
        Ok(self.run_query(query))
    }

    fn get_one(&self, collection: &str, id: &str) -> Result<D> {
        self.check_online()?;
        lock(&self.inner.collections)
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id() == id))
            .cloned()
            .ok_or_else(|| Error::not_found(format!("{collection}/{id}")))
    }

    fn add_one(&self, collection: &str, doc: D) -> Result<D> {
        self.check_online()?;
        let n = self.inner.next_doc_id.fetch_add(1, Ordering::SeqCst);
        let doc = doc.with_id(&format!("doc-{n}"));
        lock(&self.inner.collections)
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        self.notify(collection);
        Ok(doc)
    }

    fn update_one(&self, collection: &str, id: &str, doc: D) -> Result<()> {
        self.check_online()?;
        {
            let mut collections = lock(&self.inner.collections);
            let docs = collections
                .get_mut(collection)
                .ok_or_else(|| Error::not_found(format!("{collection}/{id}")))?;
            let slot = docs
                .iter_mut()
                .find(|d| d.id() == id)
                .ok_or_else(|| Error::not_found(format!("{collection}/{id}")))?;
            *slot = doc.with_id(id);
        }
        self.notify(collection);
        Ok(())
    }

    fn delete_one(&self, collection: &str, id: &str) -> Result<()> {
        self.check_online()?;
        {
            let mut collections = lock(&self.inner.collections);
            let docs = collections
                .get_mut(collection)
                .ok_or_else(|| Error::not_found(format!("{collection}/{id}")))?;
            let before = docs.len();
            docs.retain(|d| d.id() != id);
            if docs.len() == before {
                return Err(Error::not_found(format!("{collection}/{id}")));
            }
        }
        self.notify(collection);
        Ok(())
    }

    fn subscribe(
        &self,
        query: &Query,
        on_snapshot: SnapshotFn<D>,
        _on_error: ErrorFn,
    ) -> Result<ListenerHandle> {
        self.check_online()?;
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.inner.listeners).push(Listener {
            id,
            query: query.clone(),
            on_snapshot: Arc::clone(&on_snapshot),
        });
        // Initial delivery, matching the hosted store's behavior.
        on_snapshot(self.run_query(query));

        let inner = Arc::clone(&self.inner);
        Ok(ListenerHandle::new(Box::new(move || {
            lock(&inner.listeners).retain(|l| l.id != id);
        })))
    }
}
