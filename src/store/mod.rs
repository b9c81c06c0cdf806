//! Remote document store interface.
//!
//! Everything the list-sync and editor components need from the hosted
//! backend is expressed here as the [`DocumentStore`] trait: batched ordered
//! queries with cursor continuation, single-document CRUD, and change
//! subscriptions that deliver whole [`Snapshot`]s. The in-process reference
//! implementation lives in [`memory`]; a production build would put its
//! backend client behind the same trait.
//!
//! Subscriptions return a [`ListenerHandle`]; dropping it (or calling
//! [`ListenerHandle::unsubscribe`]) stops delivery. Callbacks may be invoked
//! from any thread the store pleases, so they only hand data off, typically
//! into a channel drained by the owning component.

pub mod memory;

pub use memory::MemoryStore;

use crate::document::Document;
use crate::error::{Error, Result};
use std::sync::Arc;

/// Default number of documents fetched per batch.
pub const DEFAULT_BATCH_LIMIT: usize = 20;

/// Field a query orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    /// Order by creation time (`dateCreated`).
    DateCreated,
    /// Order by last modification time (`dateModified`).
    #[default]
    DateModified,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Oldest first.
    Ascending,
    /// Newest first.
    #[default]
    Descending,
}

/// Ordering clause of a [`Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderBy {
    /// The field compared.
    pub field: SortField,
    /// Ascending or descending.
    pub direction: Direction,
}

impl OrderBy {
    /// Newest-modified-first, the admin list ordering.
    pub fn modified_desc() -> Self {
        Self {
            field: SortField::DateModified,
            direction: Direction::Descending,
        }
    }

    /// Newest-created-first, the public display ordering.
    pub fn created_desc() -> Self {
        Self {
            field: SortField::DateCreated,
            direction: Direction::Descending,
        }
    }
}

/// Opaque continuation marker: the id of the last document of the most
/// recently fetched batch. An empty cursor means "from the start".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cursor(Option<String>);

impl Cursor {
    /// The empty cursor.
    pub fn empty() -> Self {
        Self(None)
    }

    /// A cursor positioned after the document with the given id.
    pub fn after(id: impl Into<String>) -> Self {
        Self(Some(id.into()))
    }

    /// Whether this cursor points at the start.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// The id this cursor points after, if any.
    pub fn last_id(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// A batched, ordered query over one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Collection name, e.g. `"publications"`.
    pub collection: String,
    /// Ordering applied before batching.
    pub order_by: OrderBy,
    /// Fetch documents strictly after this cursor.
    pub start_after: Cursor,
    /// Maximum number of documents per batch.
    pub limit: usize,
}

impl Query {
    /// A query over `collection` with the given ordering, no cursor and the
    /// default batch limit.
    pub fn new(collection: impl Into<String>, order_by: OrderBy) -> Self {
        Self {
            collection: collection.into(),
            order_by,
            start_after: Cursor::empty(),
            limit: DEFAULT_BATCH_LIMIT,
        }
    }

    /// Sets the continuation cursor (builder).
    pub fn with_start_after(mut self, cursor: Cursor) -> Self {
        self.start_after = cursor;
        self
    }

    /// Sets the batch limit (builder). Values below 1 clamp to 1.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }
}

/// A point-in-time batch of documents delivered by a query or subscription.
#[derive(Debug, Clone)]
pub struct Snapshot<D> {
    /// The decoded batch, in query order.
    pub docs: Vec<D>,
    /// Cursor for fetching the batch after this one. Empty when the batch
    /// itself was empty.
    pub next_cursor: Cursor,
}

impl<D: Document> Snapshot<D> {
    /// Builds a snapshot from a batch, deriving the continuation cursor from
    /// the last document.
    pub fn from_batch(docs: Vec<D>) -> Self {
        let next_cursor = docs
            .last()
            .map(|d| Cursor::after(d.id()))
            .unwrap_or_default();
        Self { docs, next_cursor }
    }
}

/// Callback invoked with every snapshot a subscription delivers.
pub type SnapshotFn<D> = Arc<dyn Fn(Snapshot<D>) + Send + Sync>;

/// Callback invoked when an established subscription fails.
pub type ErrorFn = Arc<dyn Fn(Error) + Send + Sync>;

/// Cancels a subscription when invoked.
type UnsubscribeFn = Box<dyn FnOnce() + Send>;

/// Keeps a change subscription alive.
///
/// Delivery stops when [`unsubscribe`](Self::unsubscribe) is called or the
/// handle is dropped, whichever comes first.
pub struct ListenerHandle {
    unsubscribe: Option<UnsubscribeFn>,
}

impl ListenerHandle {
    /// Wraps a cancellation closure.
    pub fn new(unsubscribe: UnsubscribeFn) -> Self {
        Self {
            unsubscribe: Some(unsubscribe),
        }
    }

    /// Stops delivery. Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// The remote document store boundary.
///
/// Documents are opaque to the store beyond what [`Document`] exposes; all
/// consistency is the backend's own (last-write-wins per document). Errors
/// map to [`Error::RemoteUnavailable`] for transport failures and
/// [`Error::NotFound`] for missing targets.
pub trait DocumentStore<D: Document>: Send + Sync {
    /// Runs the query once and returns the batch.
    fn fetch_once(&self, query: &Query) -> Result<Snapshot<D>>;

    /// Fetches a single document by id.
    fn get_one(&self, collection: &str, id: &str) -> Result<D>;

    /// Adds a document, assigning it a fresh id. Returns the stored document
    /// with the id filled in.
    fn add_one(&self, collection: &str, doc: D) -> Result<D>;

    /// Replaces the document with the given id.
    fn update_one(&self, collection: &str, id: &str, doc: D) -> Result<()>;

    /// Deletes the document with the given id.
    fn delete_one(&self, collection: &str, id: &str) -> Result<()>;

    /// Registers a change listener for the query. The listener receives an
    /// initial snapshot immediately and a fresh one after every mutation of
    /// the collection, until the returned handle is released.
    fn subscribe(
        &self,
        query: &Query,
        on_snapshot: SnapshotFn<D>,
        on_error: ErrorFn,
    ) -> Result<ListenerHandle>;
}
