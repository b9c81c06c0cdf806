//! Key bindings for the list-sync component.

use crate::key::{self, KeyMap as KeyMapTrait};
use crossterm::event::KeyCode;

/// Key bindings for navigating and searching a synced list.
///
/// Digit keys are not bound here; the model routes them straight to the
/// visible page links.
#[derive(Debug, Clone)]
pub struct SyncKeyMap {
    /// Previous page. Defaults: PageUp, Left, `h`.
    pub prev_page: key::Binding,
    /// Next page. Defaults: PageDown, Right, `l`.
    pub next_page: key::Binding,
    /// Focus the search input. Default: `/`.
    pub search: key::Binding,
    /// Apply the typed term immediately. Default: Enter.
    pub apply_search: key::Binding,
    /// Clear the search term, or cancel typing. Default: Esc.
    pub clear_search: key::Binding,
    /// Fetch the next remote batch. Default: `m`.
    pub load_more: key::Binding,
    /// Restart after a failure. Default: `r`.
    pub refresh: key::Binding,
}

impl Default for SyncKeyMap {
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
            search: key::new_binding(vec![
                key::with_keys(vec![KeyCode::Char('/')]),
                key::with_help("/", "search"),
            ]),
            apply_search: key::new_binding(vec![
                key::with_keys(vec![KeyCode::Enter]),
                key::with_help("enter", "apply search"),
            ]),
            clear_search: key::new_binding(vec![
                key::with_keys(vec![KeyCode::Esc]),
                key::with_help("esc", "clear search"),
            ]),
            load_more: key::new_binding(vec![
                key::with_keys(vec![KeyCode::Char('m')]),
                key::with_help("m", "load more"),
            ]),
            refresh: key::new_binding(vec![
                key::with_keys(vec![KeyCode::Char('r')]),
                key::with_help("r", "retry"),
            ]),
        }
    }
}

impl KeyMapTrait for SyncKeyMap {
    fn short_help(&self) -> Vec<&key::Binding> {
        vec![&self.prev_page, &self.next_page, &self.search]
    }

    fn full_help(&self) -> Vec<Vec<&key::Binding>> {
        vec![
            vec![&self.prev_page, &self.next_page, &self.load_more],
            vec![&self.search, &self.apply_search, &self.clear_search],
            vec![&self.refresh],
        ]
    }
}
