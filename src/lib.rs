#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/bubbletea-admin/")]

//! # bubbletea-admin
//!
//! Content-administration components for [bubbletea-rs](https://github.com/joshka/bubbletea-rs):
//! live-updating document lists synced from a hosted store, a guarded
//! create/edit save flow with file uploads, session and role handling, and
//! aggregate insights.
//!
//! ## Overview
//!
//! The centerpiece is [`listsync::Model`], which keeps an in-memory list in
//! step with a remote collection. It ingests whole snapshots (once or on
//! every remote change), filters them through a debounced search term,
//! paginates the result and renders the current page. Around it sit the
//! store and storage boundaries, the auth/session layer, the guarded editor
//! pipeline and the insights aggregator. Every component follows the Elm
//! Architecture pattern with `update()` and `view()` methods.
//!
//! ## Components
//!
//! - **Sync**: `listsync::Model` over any [`store::DocumentStore`]
//! - **Editing**: `editor::Model` with upload validation and save guards
//! - **Identity**: `auth` sessions, roles and account guards
//! - **Display**: `paginator::Model`, `insights::Insights`
//!
//! ## Quick start
//!
//! ```rust
//! use bubbletea_admin::prelude::*;
//! use std::sync::Arc;
//!
//! let store = MemoryStore::new();
//! store.seed(
//!     "publications",
//!     vec![
//!         Post::new("p1", "Annual Report").with_category("Reports"),
//!         Post::new("p2", "Digital Skills").with_category("Training"),
//!     ],
//! );
//!
//! let mut list = ListSync::new(
//!     Arc::new(store),
//!     SyncConfig::admin("publications"),
//!     Box::new(DefaultDelegate::new()),
//! )
//! .with_title("Publications");
//!
//! // In a real program the returned command runs on the bubbletea runtime
//! // and the snapshots flow back through `update`.
//! let _cmd = list.start(StartMode::Subscribe);
//! ```
//!
//! ## Key bindings
//!
//! Components use the type-safe key binding system from the `key` module:
//!
//! ```rust
//! use bubbletea_admin::key::{Binding, KeyMap};
//! use crossterm::event::{KeyCode, KeyModifiers};
//!
//! let apply = Binding::new(vec![KeyCode::Enter]).with_help("enter", "apply search");
//! let save = Binding::new(vec![(KeyCode::Char('s'), KeyModifiers::CONTROL)])
//!     .with_help("ctrl+s", "save");
//!
//! struct MyKeyMap {
//!     apply: Binding,
//!     save: Binding,
//! }
//!
//! impl KeyMap for MyKeyMap {
//!     fn short_help(&self) -> Vec<&Binding> {
//!         vec![&self.apply, &self.save]
//!     }
//!
//!     fn full_help(&self) -> Vec<Vec<&Binding>> {
//!         vec![vec![&self.apply], vec![&self.save]]
//!     }
//! }
//! ```
//!
//! ## Integration with bubbletea-rs
//!
//! ```rust,ignore
//! use bubbletea_admin::prelude::*;
//! use bubbletea_rs::{Cmd, Model, Msg};
//!
//! struct App {
//!     publications: ListSync<Post>,
//! }
//!
//! impl Model for App {
//!     fn init() -> (Self, Option<Cmd>) {
//!         let mut publications = build_list();
//!         let cmd = publications.start(StartMode::Subscribe);
//!         (Self { publications }, cmd)
//!     }
//!
//!     fn update(&mut self, msg: Msg) -> Option<Cmd> {
//!         self.publications.update(&msg)
//!     }
//!
//!     fn view(&self) -> String {
//!         self.publications.view()
//!     }
//! }
//! ```

pub mod auth;
pub mod document;
pub mod editor;
pub mod error;
pub mod insights;
pub mod key;
pub mod listsync;
pub mod paginator;
pub mod storage;
pub mod store;
pub mod timestamp;

use bubbletea_rs::Cmd;

/// Core trait for components that support focus management.
///
/// A focused component receives keyboard input routed by its `update`;
/// a blurred one ignores keys entirely. `focus()` may return a command for
/// initialization work such as starting a timer.
///
/// # Examples
///
/// ```rust
/// use bubbletea_admin::prelude::*;
/// use std::sync::Arc;
///
/// let mut list = ListSync::new(
///     Arc::new(MemoryStore::<Post>::new()),
///     SyncConfig::admin("publications"),
///     Box::new(DefaultDelegate::new()),
/// );
/// assert!(list.focused());
/// list.blur();
/// assert!(!list.focused());
/// list.focus();
/// assert!(list.focused());
/// ```
pub trait Component {
    /// Sets the component to focused state, optionally returning an
    /// initialization command.
    fn focus(&mut self) -> Option<Cmd>;

    /// Sets the component to blurred state; keyboard input is ignored until
    /// the next [`focus`](Self::focus).
    fn blur(&mut self);

    /// Returns the current focus state.
    fn focused(&self) -> bool;
}

pub use auth::{
    AuthService, MemoryAuth, Role, Session, SessionCache, UserAccount, UserInfo,
    USERS_COLLECTION,
};
pub use document::{short_summary, Document, Post, SHORT_SUMMARY_WORDS};
pub use editor::{Draft, Model as Editor, SaveDoneMsg, SaveMode, SaveOutcome};
pub use error::{Error, Result};
pub use insights::Insights;
pub use key::{
    matches, matches_binding, new_binding, with_disabled, with_help, with_keys, Binding,
    Help as KeyHelp, KeyMap, KeyPress,
};
pub use listsync::{
    DefaultDelegate, FilterMode, ItemDelegate, Model as ListSync, Notice, NoticeLevel, StartMode,
    SyncConfig, SyncKeyMap, SyncPhase, SyncStyles,
};
pub use paginator::Model as Paginator;
pub use storage::{
    document_rule, image_rule, FileUpload, MemoryObjectStorage, ObjectStorage, UploadRule,
};
pub use store::{
    Cursor, Direction, DocumentStore, ListenerHandle, MemoryStore, OrderBy, Query, Snapshot,
    SortField,
};
pub use timestamp::Timestamp;

/// Prelude module for convenient imports.
///
/// Re-exports the types most applications need, so a single `use` brings in
/// the synced list, the concrete document type, the in-memory backends and
/// the session layer:
///
/// ```rust
/// use bubbletea_admin::prelude::*;
/// ```
pub mod prelude {
    pub use crate::auth::{AuthService, MemoryAuth, Role, Session, SessionCache, UserInfo};
    pub use crate::document::{Document, Post};
    pub use crate::editor::{Draft, Model as Editor, SaveMode, SaveOutcome};
    pub use crate::error::{Error, Result};
    pub use crate::insights::Insights;
    pub use crate::key::{Binding, KeyMap};
    pub use crate::listsync::{
        DefaultDelegate, FilterMode, ItemDelegate, Model as ListSync, Notice, StartMode,
        SyncConfig, SyncPhase,
    };
    pub use crate::paginator::Model as Paginator;
    pub use crate::storage::{FileUpload, MemoryObjectStorage, ObjectStorage};
    pub use crate::store::{Cursor, DocumentStore, MemoryStore, OrderBy, Query, Snapshot};
    pub use crate::timestamp::Timestamp;
    pub use crate::Component;
}
