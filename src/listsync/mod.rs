//! Live-updating, searchable, paginated collection views.
//!
//! `listsync::Model<D>` owns the authoritative in-memory copy of a remote
//! collection: it ingests whole snapshots (once, or on every change when
//! subscribed), derives a filtered list from a debounced search term, slices
//! the filtered list into 1-based pages, and renders the current page through
//! an [`ItemDelegate`]. All remote work happens inside commands; snapshot
//! callbacks only queue events that the model drains on its own tick, so
//! every state change runs on the update path.
//!
//! One model serves each list view (admin publications, admin resources,
//! and their public display counterparts) parameterized by a [`SyncConfig`].
//!
//! # Lifecycle
//!
//! `Idle → Loading → Ready` on the first successful snapshot, then `Ready`
//! across every further snapshot, search or page change. A failed fetch or
//! subscription moves to `Error` with no automatic retry; previously
//! rendered content stays visible and the caller (or the `r` key) triggers
//! a fresh [`start`](Model::start).
//!
//! # Example
//!
//! ```rust
//! use bubbletea_admin::document::Post;
//! use bubbletea_admin::listsync::{self, DefaultDelegate, StartMode, SyncConfig};
//! use bubbletea_admin::store::MemoryStore;
//! use std::sync::Arc;
//!
//! let store = MemoryStore::new();
//! store.seed("publications", vec![Post::new("p1", "Digital Skills 101")]);
//!
//! let mut list = listsync::Model::new(
//!     Arc::new(store),
//!     SyncConfig::admin("publications"),
//!     Box::new(DefaultDelegate::new()),
//! );
//! let _cmd = list.start(StartMode::Subscribe);
//! ```

pub mod keys;
pub mod style;
mod types;

pub use keys::SyncKeyMap;
pub use style::{SyncStyles, BULLET, ELLIPSIS};
pub use types::{
    DefaultDelegate, FetchResultMsg, FilterMode, ItemDelegate, ListenTickMsg, Notice, NoticeLevel,
    PageStep, SearchTickMsg, StartMode, SyncConfig, SyncPhase, ADMIN_PAGE_SIZE, DEFAULT_DEBOUNCE,
    DEFAULT_NOTICE_TTL, PUBLIC_PAGE_SIZE,
};

use crate::document::Document;
use crate::error::Error;
use crate::key::KeyMap as KeyMapTrait;
use crate::paginator;
use crate::store::{Cursor, DocumentStore, ErrorFn, ListenerHandle, Query, Snapshot, SnapshotFn};
use crate::Component;
use bubbletea_rs::{tick as bubbletea_tick, Cmd, KeyMsg, Msg};
use crossterm::event::KeyCode;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use types::ListenEvent;
use unicode_segmentation::UnicodeSegmentation;

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// How often queued subscription events are drained.
const LISTEN_POLL: Duration = Duration::from_millis(50);

/// A live-updating, searchable, paginated view over one remote collection.
pub struct Model<D: Document> {
    store: Arc<dyn DocumentStore<D>>,
    config: SyncConfig,
    delegate: Box<dyn ItemDelegate<D>>,

    /// The authoritative full list, replaced wholesale by every snapshot.
    items: Vec<D>,
    /// Indices into `items` that pass the current search term.
    filtered: Vec<usize>,
    pager: paginator::Model,

    /// The applied search term.
    term: String,
    /// The live text of the search input, applied after the debounce.
    input: String,
    editing: bool,
    search_tag: i64,

    cursor: Cursor,
    listener: Option<ListenerHandle>,
    events: Option<Receiver<ListenEvent<D>>>,
    /// Bumped whenever the listener is replaced or released; stale ticks and
    /// fetch results from older generations are discarded.
    generation: u64,
    last_mode: StartMode,

    phase: SyncPhase,
    notice: Option<Notice>,
    focused: bool,
    id: i64,

    /// Title line shown above the list.
    pub title: String,
    /// Key bindings.
    pub keymap: SyncKeyMap,
    /// Styling.
    pub styles: SyncStyles,
}

impl<D: Document> Model<D> {
    /// Creates an idle model over a store. Call [`start`](Self::start) to
    /// populate it.
    pub fn new(
        store: Arc<dyn DocumentStore<D>>,
        config: SyncConfig,
        delegate: Box<dyn ItemDelegate<D>>,
    ) -> Self {
        let pager = paginator::Model {
            paginator_type: paginator::Type::Links,
            ..paginator::Model::new().with_per_page(config.page_size)
        };
        let title = config.collection.clone();
        Self {
            store,
            config,
            delegate,
            items: Vec::new(),
            filtered: Vec::new(),
            pager,
            term: String::new(),
            input: String::new(),
            editing: false,
            search_tag: 0,
            cursor: Cursor::empty(),
            listener: None,
            events: None,
            generation: 0,
            last_mode: StartMode::default(),
            phase: SyncPhase::Idle,
            notice: None,
            focused: true,
            id: next_id(),
            title,
            keymap: SyncKeyMap::default(),
            styles: SyncStyles::default(),
        }
    }

    /// Sets the title line (builder).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Connects to the store. Any prior subscription is released first, so
    /// re-starting is idempotent: at most one listener exists per instance.
    ///
    /// In `Subscribe` mode the returned command begins the recurring drain of
    /// queued snapshots; in `FetchOnce` mode it performs the single fetch.
    /// A setup failure moves to [`SyncPhase::Error`] and returns `None`; the
    /// prior rendered state, if any, remains visible.
    pub fn start(&mut self, mode: StartMode) -> Option<Cmd> {
        self.release_listener();
        self.last_mode = mode;
        self.phase = SyncPhase::Loading;

        match mode {
            StartMode::Subscribe => {
                let (tx, rx) = std::sync::mpsc::channel();
                let snapshot_tx: Sender<ListenEvent<D>> = tx.clone();
                let on_snapshot: SnapshotFn<D> = Arc::new(move |snap| {
                    let _ = snapshot_tx.send(ListenEvent::Snapshot(snap));
                });
                let on_error: ErrorFn = Arc::new(move |err| {
                    let _ = tx.send(ListenEvent::Failed(err));
                });
                let query = self.build_query(self.cursor.clone());
                match self.store.subscribe(&query, on_snapshot, on_error) {
                    Ok(handle) => {
                        self.listener = Some(handle);
                        self.events = Some(rx);
                        Some(self.listen_tick())
                    }
                    Err(err) => {
                        self.fail(err);
                        None
                    }
                }
            }
            StartMode::FetchOnce => Some(self.fetch_cmd(self.cursor.clone())),
        }
    }

    /// Clears the full list, the cursor and the page, releasing any live
    /// subscription. Call before a fresh [`start`](Self::start) to avoid
    /// duplicate accumulation.
    pub fn reset(&mut self) {
        self.release_listener();
        self.items.clear();
        self.filtered.clear();
        self.cursor = Cursor::empty();
        self.pager.set_total_items(0);
        self.pager.page = 1;
        self.phase = SyncPhase::Idle;
    }

    /// Buffers a new search term. The filter runs once the debounce delay
    /// has elapsed without a newer call; rapid successive calls produce a
    /// single filter pass using the latest term.
    pub fn set_search_term(&mut self, term: impl Into<String>) -> Option<Cmd> {
        self.input = term.into();
        Some(self.debounce_cmd())
    }

    /// The currently applied search term.
    pub fn search_term(&self) -> &str {
        &self.term
    }

    /// Jumps to page `n`; out of range is a no-op.
    pub fn go_to_page(&mut self, n: usize) {
        self.pager.go_to_page(n);
    }

    /// Moves one page in the given direction, clamped at the boundaries.
    pub fn change_page(&mut self, step: PageStep) {
        match step {
            PageStep::Prev => self.pager.prev_page(),
            PageStep::Next => self.pager.next_page(),
        }
    }

    /// Fetches the batch after the current cursor. The result replaces the
    /// full list wholesale, mirroring the store's batch semantics.
    pub fn load_more(&mut self) -> Option<Cmd> {
        Some(self.fetch_cmd(self.cursor.clone()))
    }

    /// The items belonging on the current page, possibly empty.
    pub fn page_items(&self) -> Vec<&D> {
        let (start, end) = self.pager.slice_bounds(self.filtered.len());
        self.filtered[start..end]
            .iter()
            .map(|&i| &self.items[i])
            .collect()
    }

    /// The full (unfiltered) list as last ingested.
    pub fn items(&self) -> &[D] {
        &self.items
    }

    /// Number of items passing the current search term.
    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    /// Current page, 1-based.
    pub fn current_page(&self) -> usize {
        self.pager.page
    }

    /// Total pages, minimum 1.
    pub fn total_pages(&self) -> usize {
        self.pager.total_pages
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Shows a transient notice in the status area.
    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    fn build_query(&self, start_after: Cursor) -> Query {
        Query::new(self.config.collection.as_str(), self.config.order_by)
            .with_limit(self.config.batch_limit)
            .with_start_after(start_after)
    }

    fn listen_tick(&self) -> Cmd {
        let id = self.id;
        let generation = self.generation;
        bubbletea_tick(LISTEN_POLL, move |_| {
            Box::new(ListenTickMsg { id, generation }) as Msg
        })
    }

    fn debounce_cmd(&mut self) -> Cmd {
        self.search_tag += 1;
        let id = self.id;
        let tag = self.search_tag;
        bubbletea_tick(self.config.debounce, move |_| {
            Box::new(SearchTickMsg { id, tag }) as Msg
        })
    }

    fn fetch_cmd(&self, start_after: Cursor) -> Cmd {
        let store = Arc::clone(&self.store);
        let query = self.build_query(start_after);
        let id = self.id;
        let generation = self.generation;
        bubbletea_tick(Duration::from_nanos(1), move |_| {
            let result = store.fetch_once(&query);
            Box::new(FetchResultMsg {
                id,
                generation,
                result,
            }) as Msg
        })
    }

    fn release_listener(&mut self) {
        self.generation += 1;
        if let Some(mut handle) = self.listener.take() {
            handle.unsubscribe();
        }
        self.events = None;
    }

    fn fail(&mut self, err: Error) {
        self.release_listener();
        self.phase = SyncPhase::Error;
        self.notice = Some(Notice::error(err.to_string()));
    }

    /// Replaces the full list with a snapshot and reapplies the active
    /// search term against the new contents. The page clamps if the filtered
    /// count shrank underneath it.
    fn apply_snapshot(&mut self, snapshot: Snapshot<D>) {
        self.items = snapshot.docs;
        self.cursor = snapshot.next_cursor;
        self.phase = SyncPhase::Ready;
        self.refilter();
    }

    fn refilter(&mut self) {
        self.filtered = self.filter_indices(&self.term);
        self.pager.set_total_items(self.filtered.len());
    }

    fn apply_search(&mut self) {
        self.term = self.input.clone();
        self.refilter();
        self.pager.page = 1;
    }

    fn filter_indices(&self, term: &str) -> Vec<usize> {
        if term.is_empty() {
            return (0..self.items.len()).collect();
        }
        match self.config.filter_mode {
            FilterMode::Substring => {
                let needle = term.to_lowercase();
                self.items
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| {
                        d.search_fields()
                            .iter()
                            .any(|f| f.to_lowercase().contains(&needle))
                    })
                    .map(|(i, _)| i)
                    .collect()
            }
            FilterMode::Fuzzy => {
                let matcher = SkimMatcherV2::default();
                let mut scored: Vec<(i64, usize)> = self
                    .items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, d)| {
                        d.search_fields()
                            .iter()
                            .filter_map(|f| matcher.fuzzy_match(f, term))
                            .max()
                            .map(|score| (score, i))
                    })
                    .collect();
                // Stable by score, so equal scores keep snapshot order.
                scored.sort_by(|a, b| b.0.cmp(&a.0));
                scored.into_iter().map(|(_, i)| i).collect()
            }
        }
    }

    fn drain_events(&mut self) -> (Option<Snapshot<D>>, Option<Error>) {
        let mut latest = None;
        let mut failure = None;
        if let Some(rx) = &self.events {
            while let Ok(event) = rx.try_recv() {
                match event {
                    // Coalesce: only the newest queued snapshot matters.
                    ListenEvent::Snapshot(snap) => latest = Some(snap),
                    ListenEvent::Failed(err) => failure = Some(err),
                }
            }
        }
        (latest, failure)
    }

    fn handle_key(&mut self, key_msg: &KeyMsg) -> Option<Cmd> {
        if self.editing {
            return self.handle_search_key(key_msg);
        }

        if self.keymap.search.matches(key_msg) {
            self.editing = true;
            self.input = self.term.clone();
            return None;
        }
        if self.keymap.clear_search.matches(key_msg) {
            if !self.term.is_empty() {
                self.input.clear();
                self.apply_search();
            }
            return None;
        }
        if self.keymap.prev_page.matches(key_msg) {
            self.change_page(PageStep::Prev);
            return None;
        }
        if self.keymap.next_page.matches(key_msg) {
            self.change_page(PageStep::Next);
            return None;
        }
        if self.keymap.load_more.matches(key_msg) {
            return self.load_more();
        }
        if self.keymap.refresh.matches(key_msg) {
            if self.phase == SyncPhase::Error {
                return self.start(self.last_mode);
            }
            return None;
        }
        if let KeyCode::Char(c) = key_msg.key {
            if let Some(n) = c.to_digit(10) {
                let n = n as usize;
                if self.pager.page_links().contains(&n) {
                    self.go_to_page(n);
                }
            }
        }
        None
    }

    fn handle_search_key(&mut self, key_msg: &KeyMsg) -> Option<Cmd> {
        if self.keymap.apply_search.matches(key_msg) {
            self.editing = false;
            // Invalidate pending debounce ticks; enter applies immediately.
            self.search_tag += 1;
            self.apply_search();
            return None;
        }
        if self.keymap.clear_search.matches(key_msg) {
            self.editing = false;
            self.input = self.term.clone();
            return None;
        }
        match key_msg.key {
            KeyCode::Char(c) => {
                self.input.push(c);
                Some(self.debounce_cmd())
            }
            KeyCode::Backspace => {
                pop_grapheme(&mut self.input);
                Some(self.debounce_cmd())
            }
            _ => None,
        }
    }

    /// Routes messages: debounce and listen ticks, fetch results, and key
    /// input while focused.
    pub fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        if let Some(tick) = msg.downcast_ref::<SearchTickMsg>() {
            if tick.id == self.id && tick.tag == self.search_tag {
                self.apply_search();
            }
            return None;
        }

        if let Some(tick) = msg.downcast_ref::<ListenTickMsg>() {
            if tick.id != self.id || tick.generation != self.generation {
                return None;
            }
            let (latest, failure) = self.drain_events();
            if let Some(err) = failure {
                self.fail(err);
                return None;
            }
            if let Some(snapshot) = latest {
                self.apply_snapshot(snapshot);
            }
            if self.listener.is_some() {
                return Some(self.listen_tick());
            }
            return None;
        }

        if let Some(result) = msg.downcast_ref::<FetchResultMsg<D>>() {
            if result.id != self.id || result.generation != self.generation {
                return None;
            }
            match result.result.clone() {
                Ok(snapshot) => self.apply_snapshot(snapshot),
                Err(err) => self.fail(err),
            }
            return None;
        }

        if self.focused {
            if let Some(key_msg) = msg.downcast_ref::<KeyMsg>() {
                return self.handle_key(key_msg);
            }
        }
        None
    }

    /// Renders the full view: title, search line, the current page (or the
    /// explicit empty state), status and notice, page links and help.
    /// Rendering always happens, even when the filtered list is empty.
    pub fn view(&self) -> String {
        let mut sections = Vec::new();

        if !self.title.is_empty() {
            sections.push(self.styles.title.render(&self.title));
        }

        if self.editing {
            sections.push(format!(
                "{} {}▌",
                self.styles.search_prompt.render("Search:"),
                self.styles.search_text.render(&self.input)
            ));
        } else if !self.term.is_empty() {
            sections.push(format!(
                "{} {}",
                self.styles.search_prompt.render("Search:"),
                self.styles.search_text.render(&self.term)
            ));
        }

        match self.phase {
            SyncPhase::Loading if self.items.is_empty() => {
                sections.push(self.styles.loading.render("Loading…"));
            }
            SyncPhase::Idle => {}
            _ => {
                let page = self.page_items();
                if page.is_empty() {
                    sections.push(self.styles.no_items.render("No results found."));
                } else {
                    let spacing = "\n".repeat(self.delegate.spacing() + 1);
                    let lines: Vec<String> = page
                        .iter()
                        .enumerate()
                        .map(|(i, doc)| self.styles.item.render(&self.delegate.render(doc, i)))
                        .collect();
                    sections.push(lines.join(&spacing));
                }
                sections.push(self.styles.status.render(&format!(
                    "{}/{} items {BULLET} page {}/{}",
                    self.filtered.len(),
                    self.items.len(),
                    self.pager.page,
                    self.pager.total_pages
                )));
            }
        }

        if let Some(notice) = &self.notice {
            if !notice.expired(self.config.notice_ttl) {
                let style = match notice.level {
                    NoticeLevel::Info => &self.styles.notice_info,
                    NoticeLevel::Error => &self.styles.notice_error,
                };
                sections.push(style.render(&notice.text));
            }
        }

        if self.pager.total_pages > 1 {
            sections.push(self.styles.pagination.render(&self.pager.view()));
        }

        let help: Vec<String> = self
            .keymap
            .short_help()
            .into_iter()
            .map(|b| format!("{} {}", b.help().key, b.help().desc))
            .collect();
        sections.push(self.styles.help.render(&help.join(&format!(" {BULLET} "))));

        sections.join("\n")
    }
}

fn pop_grapheme(s: &mut String) {
    if let Some((idx, _)) = s.grapheme_indices(true).next_back() {
        s.truncate(idx);
    }
}

impl<D: Document> Component for Model<D> {
    fn focus(&mut self) -> Option<Cmd> {
        self.focused = true;
        None
    }

    fn blur(&mut self) {
        self.focused = false;
        self.editing = false;
    }

    fn focused(&self) -> bool {
        self.focused
    }
}
