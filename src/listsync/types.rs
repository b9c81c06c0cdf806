//! Core types for the list-sync component: configuration, phases, messages
//! and the item-rendering delegate.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::store::{OrderBy, Snapshot, DEFAULT_BATCH_LIMIT};
use std::fmt::Display;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

/// Items per page on admin list views.
pub const ADMIN_PAGE_SIZE: usize = 6;

/// Items per page on public display views.
pub const PUBLIC_PAGE_SIZE: usize = 12;

/// Quiet period after the last keystroke before the search filter runs.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// How long a notice stays visible.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(4);

/// How the search term is matched against a document's search fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Case-insensitive substring match, OR across fields. The empty term
    /// matches everything.
    #[default]
    Substring,
    /// Fuzzy matching ranked by score, best match first.
    Fuzzy,
}

/// How [`start`](super::Model::start) connects to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartMode {
    /// Register a change listener; every remote change replaces the list.
    #[default]
    Subscribe,
    /// Fetch a single batch and render once.
    FetchOnce,
}

/// Direction for [`change_page`](super::Model::change_page).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStep {
    /// One page back, clamped at the first page.
    Prev,
    /// One page forward, clamped at the last page.
    Next,
}

/// Lifecycle of the synced list.
///
/// `Error` is terminal until the caller triggers a fresh start; there is no
/// automatic retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    /// Nothing fetched yet.
    #[default]
    Idle,
    /// First fetch or subscription setup in flight.
    Loading,
    /// At least one snapshot ingested; stays `Ready` across further
    /// snapshots, searches and page changes.
    Ready,
    /// A fetch or the subscription failed. Previously rendered content stays
    /// visible.
    Error,
}

/// Configuration of one synced list view.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Collection queried.
    pub collection: String,
    /// Ordering of the remote query.
    pub order_by: OrderBy,
    /// Items per rendered page.
    pub page_size: usize,
    /// Documents per remote batch.
    pub batch_limit: usize,
    /// Search debounce delay.
    pub debounce: Duration,
    /// Search matching mode.
    pub filter_mode: FilterMode,
    /// How long notices stay visible.
    pub notice_ttl: Duration,
}

impl SyncConfig {
    /// Admin defaults for a collection: 6 per page, newest-modified first.
    pub fn admin(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            order_by: OrderBy::modified_desc(),
            page_size: ADMIN_PAGE_SIZE,
            batch_limit: DEFAULT_BATCH_LIMIT,
            debounce: DEFAULT_DEBOUNCE,
            filter_mode: FilterMode::default(),
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }

    /// Public display defaults: 12 per page, newest-created first.
    pub fn public_display(collection: impl Into<String>) -> Self {
        Self {
            order_by: OrderBy::created_desc(),
            page_size: PUBLIC_PAGE_SIZE,
            ..Self::admin(collection)
        }
    }

    /// Sets the page size (builder). Values below 1 clamp to 1.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets the debounce delay (builder).
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the filter mode (builder).
    pub fn with_filter_mode(mut self, mode: FilterMode) -> Self {
        self.filter_mode = mode;
        self
    }
}

/// What a subscription delivered, queued for the model's listen tick.
pub(crate) enum ListenEvent<D> {
    Snapshot(Snapshot<D>),
    Failed(Error),
}

/// Debounce expiry for a buffered search term.
///
/// `tag` identifies the newest `set_search_term` call; ticks from superseded
/// calls carry an older tag and are discarded, so rapid typing produces one
/// filter pass.
#[derive(Debug, Clone, Copy)]
pub struct SearchTickMsg {
    /// Instance the tick belongs to.
    pub id: i64,
    /// Debounce generation within the instance.
    pub tag: i64,
}

/// Recurring poll that drains queued subscription events.
///
/// `generation` identifies the live listener; ticks left over from a replaced
/// subscription are discarded.
#[derive(Debug, Clone, Copy)]
pub struct ListenTickMsg {
    /// Instance the tick belongs to.
    pub id: i64,
    /// Listener generation within the instance.
    pub generation: u64,
}

/// Result of a one-shot fetch (`start` in fetch-once mode or `load_more`).
pub struct FetchResultMsg<D> {
    /// Instance the result belongs to.
    pub id: i64,
    /// Listener generation the fetch was issued under.
    pub generation: u64,
    /// The fetched batch, or the failure to surface.
    pub result: Result<Snapshot<D>>,
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational, e.g. a completed save.
    Info,
    /// A surfaced operation failure.
    Error,
}

/// A transient status line message. Expiry is checked lazily at render time.
#[derive(Debug, Clone)]
pub struct Notice {
    /// Display text.
    pub text: String,
    /// Severity, controls styling.
    pub level: NoticeLevel,
    pub(crate) created: Instant,
}

impl Notice {
    /// Creates an informational notice.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: NoticeLevel::Info,
            created: Instant::now(),
        }
    }

    /// Creates an error notice.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: NoticeLevel::Error,
            created: Instant::now(),
        }
    }

    /// Whether the notice has outlived the given time-to-live.
    pub fn expired(&self, ttl: Duration) -> bool {
        self.created.elapsed() >= ttl
    }
}

/// Renders one document of the current page.
///
/// The delegate is the render-callback seam: the model itself emits no
/// item markup, so headless callers can swap in a delegate (or read
/// [`page_items`](super::Model::page_items) directly) without touching the
/// sync logic. Rendering must be idempotent.
pub trait ItemDelegate<D: Document>: Send + Sync {
    /// Renders a single item. `index` is the item's position within the
    /// current page, starting at 0.
    fn render(&self, doc: &D, index: usize) -> String;

    /// Blank lines between items.
    fn spacing(&self) -> usize {
        0
    }
}

/// Renders each item as its `Display` form, truncated to a display width.
#[derive(Debug, Clone)]
pub struct DefaultDelegate {
    /// Maximum display width of a rendered line.
    pub max_width: usize,
}

impl Default for DefaultDelegate {
    fn default() -> Self {
        Self { max_width: 72 }
    }
}

impl DefaultDelegate {
    /// Creates the delegate with the default width.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: Document + Display> ItemDelegate<D> for DefaultDelegate {
    fn render(&self, doc: &D, _index: usize) -> String {
        let line = doc.to_string();
        if line.width() <= self.max_width {
            return line;
        }
        let mut out = String::new();
        let mut used = 0;
        for ch in line.chars() {
            let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
            if used + w > self.max_width.saturating_sub(1) {
                break;
            }
            used += w;
            out.push(ch);
        }
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Post;
    use crate::store::{Direction, SortField};

    #[test]
    fn test_admin_and_public_defaults() {
        let admin = SyncConfig::admin("publications");
        assert_eq!(admin.page_size, 6);
        assert_eq!(admin.order_by.field, SortField::DateModified);
        assert_eq!(admin.order_by.direction, Direction::Descending);
        assert_eq!(admin.batch_limit, 20);
        assert_eq!(admin.debounce, Duration::from_millis(300));

        let display = SyncConfig::public_display("resources");
        assert_eq!(display.page_size, 12);
        assert_eq!(display.order_by.field, SortField::DateCreated);
    }

    #[test]
    fn test_notice_expiry_is_lazy() {
        let notice = Notice::info("Saved.");
        assert!(!notice.expired(Duration::from_secs(60)));
        assert!(notice.expired(Duration::ZERO));
    }

    #[test]
    fn test_default_delegate_truncates_by_display_width() {
        let delegate = DefaultDelegate { max_width: 8 };
        let short = Post::new("a", "Hi");
        assert_eq!(delegate.render(&short, 0), "Hi");

        let long = Post::new("b", "A very long publication title");
        let rendered = delegate.render(&long, 0);
        assert!(rendered.ends_with('…'));
        assert!(rendered.width() <= 8);
    }
}
