//! Pagination state for sliced list views.
//!
//! This component owns the page math only; it never touches the items
//! themselves. Pages are 1-based, matching the page numbers users see in the
//! rendered link row. Besides the usual prev/next movement it supports direct
//! jumps (`go_to_page`, where an out-of-range target is a no-op) and a
//! windowed row of page links centered on the current page.
//!
//! # Examples
//!
//! ```rust
//! use bubbletea_admin::paginator::Model;
//!
//! let mut pager = Model::new().with_per_page(6).with_total_items(14);
//! assert_eq!(pager.total_pages, 3);
//!
//! pager.go_to_page(5); // out of range, no-op
//! assert_eq!(pager.page, 1);
//!
//! pager.next_page();
//! let (start, end) = pager.slice_bounds(14);
//! assert_eq!((start, end), (6, 12));
//! ```

use crate::key::{self, KeyMap as KeyMapTrait};
use bubbletea_rs::{KeyMsg, Msg};
use crossterm::event::KeyCode;
use lipgloss_extras::prelude::*;

/// How the paginator renders itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Type {
    /// Page position as Arabic numerals, e.g. `2/5`.
    #[default]
    Arabic,
    /// A windowed row of page-number links, e.g. `1 [2] 3 4`.
    Links,
}

/// Key bindings for page navigation.
#[derive(Debug, Clone)]
pub struct PaginatorKeyMap {
    /// Move to the previous page. Defaults: PageUp, Left, `h`.
    pub prev_page: key::Binding,
    /// Move to the next page. Defaults: PageDown, Right, `l`.
    pub next_page: key::Binding,
}

impl Default for PaginatorKeyMap {
    fn default() -> Self {
        Self {
            prev_page: key::new_binding(vec![
                key::with_keys(vec![KeyCode::PageUp, KeyCode::Left, KeyCode::Char('h')]),
                key::with_help("←/h", "prev page"),
            ]),
            next_page: key::new_binding(vec![
                key::with_keys(vec![KeyCode::PageDown, KeyCode::Right, KeyCode::Char('l')]),
                key::with_help("→/l", "next page"),
            ]),
        }
    }
}

impl KeyMapTrait for PaginatorKeyMap {
    fn short_help(&self) -> Vec<&key::Binding> {
        vec![&self.prev_page, &self.next_page]
    }

    fn full_help(&self) -> Vec<Vec<&key::Binding>> {
        vec![vec![&self.prev_page, &self.next_page]]
    }
}

/// Styles for the rendered page indicators.
#[derive(Debug, Clone)]
pub struct PaginatorStyles {
    /// Style for the current page's link.
    pub active_link: Style,
    /// Style for every other page link.
    pub inactive_link: Style,
    /// Style for the Arabic `current/total` indicator.
    pub arabic: Style,
}

impl Default for PaginatorStyles {
    fn default() -> Self {
        let subdued = AdaptiveColor {
            Light: "#9B9B9B",
            Dark: "#5C5C5C",
        };
        Self {
            active_link: Style::new().bold(true).foreground(AdaptiveColor {
                Light: "#1a1a1a",
                Dark: "#dddddd",
            }),
            inactive_link: Style::new().foreground(subdued.clone()),
            arabic: Style::new().foreground(subdued),
        }
    }
}

/// Number of page links shown by default.
pub const DEFAULT_WINDOW: usize = 4;

/// Pagination state and rendering.
///
/// Invariant: `page` always stays within `[1, total_pages]` and `total_pages`
/// is at least 1, even for an empty list.
#[derive(Debug, Clone)]
pub struct Model {
    /// How the paginator renders.
    pub paginator_type: Type,
    /// Current page, 1-based.
    pub page: usize,
    /// Items per page, minimum 1.
    pub per_page: usize,
    /// Total pages, minimum 1.
    pub total_pages: usize,
    /// Maximum number of page links shown in the links view.
    pub window: usize,
    /// Key bindings.
    pub keymap: PaginatorKeyMap,
    /// Styling for both views.
    pub styles: PaginatorStyles,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            paginator_type: Type::default(),
            page: 1,
            per_page: 1,
            total_pages: 1,
            window: DEFAULT_WINDOW,
            keymap: PaginatorKeyMap::default(),
            styles: PaginatorStyles::default(),
        }
    }
}

impl Model {
    /// Creates a paginator on page 1 with one item per page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the items per page (builder). Values below 1 clamp to 1.
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Sets the total item count and recomputes pages (builder).
    pub fn with_total_items(mut self, items: usize) -> Self {
        self.set_total_items(items);
        self
    }

    /// Sets the link window size (builder). Values below 1 clamp to 1.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    /// Recomputes `total_pages` from an item count, clamping the current page
    /// back into range when the list shrank underneath it.
    pub fn set_total_items(&mut self, items: usize) {
        self.total_pages = if items == 0 {
            1
        } else {
            items.div_ceil(self.per_page)
        };
        if self.page > self.total_pages {
            self.page = self.total_pages;
        }
    }

    /// Jumps to page `n` when `1 <= n <= total_pages`; anything else is a
    /// no-op and the current page is kept.
    pub fn go_to_page(&mut self, n: usize) {
        if n >= 1 && n <= self.total_pages {
            self.page = n;
        }
    }

    /// Moves back one page; already on page 1 is a no-op.
    pub fn prev_page(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
    }

    /// Moves forward one page; already on the last page is a no-op.
    pub fn next_page(&mut self) {
        if self.page < self.total_pages {
            self.page += 1;
        }
    }

    /// Whether the current page is page 1.
    pub fn on_first_page(&self) -> bool {
        self.page == 1
    }

    /// Whether the current page is the last one.
    pub fn on_last_page(&self) -> bool {
        self.page == self.total_pages
    }

    /// Start (inclusive) and end (exclusive) indices of the current page
    /// within a list of the given length, usable directly as slice bounds.
    pub fn slice_bounds(&self, length: usize) -> (usize, usize) {
        let start = ((self.page - 1) * self.per_page).min(length);
        let end = (start + self.per_page).min(length);
        (start, end)
    }

    /// Number of items on the current page; 0 for an empty list.
    pub fn items_on_page(&self, total_items: usize) -> usize {
        let (start, end) = self.slice_bounds(total_items);
        end - start
    }

    /// The page numbers shown as links: at most `window` consecutive pages,
    /// centered on the current page and clamped to `[1, total_pages]`. Near
    /// the end of the range the window may come out shorter than `window`;
    /// that is accepted behavior.
    pub fn page_links(&self) -> Vec<usize> {
        let start = self.page.saturating_sub(self.window / 2).max(1);
        let end = (start + self.window - 1).min(self.total_pages);
        (start..=end).collect()
    }

    /// Handles prev/next key presses. Callers that need direct jumps route
    /// digit keys to [`go_to_page`](Self::go_to_page) themselves.
    pub fn update(&mut self, msg: &Msg) {
        if let Some(key_msg) = msg.downcast_ref::<KeyMsg>() {
            if self.keymap.next_page.matches(key_msg) {
                self.next_page();
            } else if self.keymap.prev_page.matches(key_msg) {
                self.prev_page();
            }
        }
    }

    /// Renders according to `paginator_type`.
    pub fn view(&self) -> String {
        match self.paginator_type {
            Type::Arabic => self.arabic_view(),
            Type::Links => self.links_view(),
        }
    }

    fn arabic_view(&self) -> String {
        self.styles
            .arabic
            .render(&format!("{}/{}", self.page, self.total_pages))
    }

    fn links_view(&self) -> String {
        let links: Vec<String> = self
            .page_links()
            .into_iter()
            .map(|n| {
                if n == self.page {
                    self.styles.active_link.render(&format!("[{n}]"))
                } else {
                    self.styles.inactive_link.render(&n.to_string())
                }
            })
            .collect();
        links.join(" ")
    }
}
