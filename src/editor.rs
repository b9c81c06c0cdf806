//! Guarded create/edit save flow for [`Post`] documents.
//!
//! The save pipeline validates the draft, uploads any attached image and
//! document file, and writes the document, with two guards around it:
//!
//! - a double-submit guard: [`Model::save`] is a no-op while a save is in
//!   flight, and every completion path (success, failure, cancellation)
//!   clears it;
//! - a cooperative cancellation flag, checked after each upload step and
//!   once more before the document write. A cancelled save writes nothing;
//!   files already uploaded stay behind as orphans.
//!
//! Creating sets `dateCreated` and the owning `uid` from the session. Editing
//! preserves both and only stamps `dateModified` and `lastEditedBy`. When an
//! edit replaces an uploaded file, the previous object is deleted best-effort
//! after the write; a failed delete becomes a warning on the outcome, never
//! an error.
//!
//! The pipeline itself is the plain function [`run_save`], so its ordering
//! can be tested without an event loop; [`Model`] wraps it in a command and
//! routes the [`SaveDoneMsg`] completion.

use crate::auth::Session;
use crate::document::{Document, Post};
use crate::error::{Error, Result};
use crate::listsync::Notice;
use crate::storage::{document_rule, image_rule, FileUpload, ObjectStorage};
use crate::store::DocumentStore;
use crate::timestamp::Timestamp;
use bubbletea_rs::{tick as bubbletea_tick, Cmd, Msg};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// Editable form state for one document.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    /// Title, required.
    pub title: String,
    /// Author display name.
    pub author: String,
    /// Category badge text.
    pub category: String,
    /// Summary for list views.
    pub summary: String,
    /// Full body content.
    pub content: String,
    /// Cover image to upload, if picked.
    pub image: Option<FileUpload>,
    /// Document file to upload, if picked.
    pub file: Option<FileUpload>,
}

impl Draft {
    /// Checks the required fields and any picked files against the upload
    /// rules. The draft itself is never mutated; a rejected draft stays
    /// intact for correction.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("Title is required."));
        }
        if let Some(image) = &self.image {
            image_rule().check(image)?;
        }
        if let Some(file) = &self.file {
            document_rule().check(file)?;
        }
        Ok(())
    }
}

/// Whether the save creates a new document or replaces an existing one.
#[derive(Debug, Clone)]
pub enum SaveMode {
    /// Create a fresh document owned by the saving session.
    Create,
    /// Replace the given document, preserving its id, `dateCreated` and
    /// owner uid.
    Edit(Post),
}

/// How a save pipeline finished, short of an error.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The document was written.
    Saved {
        /// The stored document, id assigned on create.
        doc: Post,
        /// Non-fatal problems, currently only failed cleanup deletes.
        warnings: Vec<String>,
    },
    /// The cancellation flag was set before the write; nothing was written.
    Cancelled,
}

/// Posted when a save pipeline completes, on every path.
pub struct SaveDoneMsg {
    /// Instance the save belongs to.
    pub id: i64,
    /// The pipeline result.
    pub outcome: Result<SaveOutcome>,
}

/// Runs the full save pipeline synchronously.
///
/// Order: validate, gate on the session role, upload image then file
/// (checking `cancelled` after each), check `cancelled` once more, write the
/// document, then best-effort delete any replaced object URLs.
pub fn run_save(
    store: &dyn DocumentStore<Post>,
    storage: &dyn ObjectStorage,
    collection: &str,
    session: &Session,
    mode: &SaveMode,
    draft: &Draft,
    cancelled: &AtomicBool,
) -> Result<SaveOutcome> {
    draft.validate()?;

    if let SaveMode::Edit(existing) = mode {
        if !session.can_edit(existing.owner_uid()) {
            return Err(Error::unauthorized(
                "You do not have permission to edit this document.",
            ));
        }
    }

    let now = Timestamp::now();
    let mut image_url = None;
    let mut file_url = None;

    if let Some(image) = &draft.image {
        image_url = Some(storage.upload(&upload_path(collection, now, &image.name), image)?);
        if cancelled.load(Ordering::SeqCst) {
            return Ok(SaveOutcome::Cancelled);
        }
    }
    if let Some(file) = &draft.file {
        file_url = Some(storage.upload(&upload_path(collection, now, &file.name), file)?);
        if cancelled.load(Ordering::SeqCst) {
            return Ok(SaveOutcome::Cancelled);
        }
    }

    // Last chance to bail before anything becomes visible.
    if cancelled.load(Ordering::SeqCst) {
        return Ok(SaveOutcome::Cancelled);
    }

    let mut replaced = Vec::new();
    let doc = match mode {
        SaveMode::Create => {
            let mut doc = Post::new("", &draft.title)
                .with_author(&draft.author)
                .with_category(&draft.category)
                .with_summary(&draft.summary)
                .with_content(&draft.content)
                .with_uid(&session.user.uid)
                .with_timestamps(now, now);
            doc.image_url = image_url;
            doc.file_url = file_url;
            doc.last_edited_by = Some(session.user.uid.clone());
            store.add_one(collection, doc)?
        }
        SaveMode::Edit(existing) => {
            let mut doc = existing.clone();
            doc.title = draft.title.clone();
            doc.author = draft.author.clone();
            doc.category = draft.category.clone();
            doc.summary = draft.summary.clone();
            doc.content = draft.content.clone();
            if let Some(url) = image_url {
                if let Some(old) = doc.image_url.replace(url) {
                    replaced.push(old);
                }
            }
            if let Some(url) = file_url {
                if let Some(old) = doc.file_url.replace(url) {
                    replaced.push(old);
                }
            }
            doc.date_modified = now;
            doc.last_edited_by = Some(session.user.uid.clone());
            store.update_one(collection, &existing.id, doc.clone())?;
            doc
        }
    };

    let warnings = replaced
        .into_iter()
        .filter(|url| storage.delete(url).is_err())
        .map(|url| format!("Could not remove replaced file {url}."))
        .collect();

    Ok(SaveOutcome::Saved { doc, warnings })
}

fn upload_path(collection: &str, at: Timestamp, name: &str) -> String {
    format!("{collection}/{}_{name}", at.epoch_millis())
}

/// Editor state: a draft plus the in-flight save bookkeeping.
pub struct Model {
    store: Arc<dyn DocumentStore<Post>>,
    storage: Arc<dyn ObjectStorage>,
    collection: String,
    mode: SaveMode,
    saving: bool,
    cancel: Arc<AtomicBool>,
    notice: Option<Notice>,
    id: i64,

    /// The form state being edited.
    pub draft: Draft,
}

impl Model {
    /// Creates an editor for a new document in `collection`.
    pub fn new(
        store: Arc<dyn DocumentStore<Post>>,
        storage: Arc<dyn ObjectStorage>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            storage,
            collection: collection.into(),
            mode: SaveMode::Create,
            saving: false,
            cancel: Arc::new(AtomicBool::new(false)),
            notice: None,
            id: next_id(),
            draft: Draft::default(),
        }
    }

    /// Switches to editing an existing document, pre-filling the draft from
    /// its current fields.
    pub fn edit(&mut self, existing: Post) {
        self.draft = Draft {
            title: existing.title.clone(),
            author: existing.author.clone(),
            category: existing.category.clone(),
            summary: existing.summary.clone(),
            content: existing.content.clone(),
            image: None,
            file: None,
        };
        self.mode = SaveMode::Edit(existing);
    }

    /// Whether a save is currently in flight.
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// The most recent completion notice, if any.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Starts the save pipeline in a command. Returns `None` while a save is
    /// already in flight.
    pub fn save(&mut self, session: &Session) -> Option<Cmd> {
        if self.saving {
            return None;
        }
        self.saving = true;
        self.notice = None;
        self.cancel = Arc::new(AtomicBool::new(false));

        let store = Arc::clone(&self.store);
        let storage = Arc::clone(&self.storage);
        let collection = self.collection.clone();
        let session = session.clone();
        let mode = self.mode.clone();
        let draft = self.draft.clone();
        let cancelled = Arc::clone(&self.cancel);
        let id = self.id;
        Some(bubbletea_tick(Duration::from_nanos(1), move |_| {
            let outcome = run_save(
                store.as_ref(),
                storage.as_ref(),
                &collection,
                &session,
                &mode,
                &draft,
                &cancelled,
            );
            Box::new(SaveDoneMsg { id, outcome }) as Msg
        }))
    }

    /// Requests cancellation of the in-flight save. The pipeline honors it
    /// at its next checkpoint; nothing is written afterwards.
    pub fn cancel_save(&self) {
        if self.saving {
            self.cancel.store(true, Ordering::SeqCst);
        }
    }

    /// Routes the save completion, clearing the guard on every path.
    pub fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        if let Some(done) = msg.downcast_ref::<SaveDoneMsg>() {
            if done.id != self.id {
                return None;
            }
            self.saving = false;
            self.notice = Some(match &done.outcome {
                Ok(SaveOutcome::Saved { warnings, .. }) if warnings.is_empty() => {
                    Notice::info("Saved.")
                }
                Ok(SaveOutcome::Saved { warnings, .. }) => {
                    Notice::info(format!("Saved. {}", warnings.join(" ")))
                }
                Ok(SaveOutcome::Cancelled) => Notice::info("Save cancelled."),
                Err(err) => Notice::error(err.to_string()),
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, UserInfo};
    use crate::storage::MemoryObjectStorage;
    use crate::store::MemoryStore;

    fn session(uid: &str, role: Role) -> Session {
        Session {
            user: UserInfo {
                uid: uid.to_string(),
                email: format!("{uid}@example.org"),
            },
            role,
        }
    }

    fn draft(title: &str) -> Draft {
        Draft {
            title: title.to_string(),
            author: "A. Mensah".to_string(),
            category: "Training".to_string(),
            summary: "Summary".to_string(),
            content: "Body".to_string(),
            image: None,
            file: None,
        }
    }

    fn png(bytes: usize) -> FileUpload {
        FileUpload::new("cover.png", "image/png", vec![0; bytes])
    }

    #[test]
    fn test_create_sets_owner_and_timestamps() {
        let store = MemoryStore::new();
        let storage = MemoryObjectStorage::new();
        let admin = session("u-admin", Role::Admin);
        let cancelled = AtomicBool::new(false);

        let outcome = run_save(
            &store,
            &storage,
            "publications",
            &admin,
            &SaveMode::Create,
            &draft("New Post"),
            &cancelled,
        )
        .unwrap();

        let SaveOutcome::Saved { doc, warnings } = outcome else {
            panic!("expected a saved document");
        };
        assert!(warnings.is_empty());
        assert!(!doc.id.is_empty(), "store assigns the id");
        assert_eq!(doc.uid.as_deref(), Some("u-admin"));
        assert_eq!(doc.last_edited_by.as_deref(), Some("u-admin"));
        assert_eq!(doc.date_created, doc.date_modified);
        assert_eq!(store.len("publications"), 1);
    }

    #[test]
    fn test_edit_preserves_owner_and_creation_time() {
        let store = MemoryStore::new();
        let storage = MemoryObjectStorage::new();
        let created = Timestamp::from_server(1_000, 0);
        let existing = Post::new("p1", "Old Title")
            .with_uid("u-owner")
            .with_timestamps(created, created);
        store.seed("publications", vec![existing.clone()]);

        let admin = session("u-admin", Role::Admin);
        let cancelled = AtomicBool::new(false);
        let outcome = run_save(
            &store,
            &storage,
            "publications",
            &admin,
            &SaveMode::Edit(existing),
            &draft("New Title"),
            &cancelled,
        )
        .unwrap();

        let SaveOutcome::Saved { doc, .. } = outcome else {
            panic!("expected a saved document");
        };
        assert_eq!(doc.title, "New Title");
        assert_eq!(doc.uid.as_deref(), Some("u-owner"), "owner preserved");
        assert_eq!(doc.date_created, created, "creation time preserved");
        assert!(doc.date_modified > created);
        assert_eq!(doc.last_edited_by.as_deref(), Some("u-admin"));

        let stored = store.get_one("publications", "p1").unwrap();
        assert_eq!(stored.title, "New Title");
    }

    #[test]
    fn test_manager_cannot_edit_foreign_document() {
        let store = MemoryStore::new();
        let storage = MemoryObjectStorage::new();
        let existing = Post::new("p1", "T").with_uid("u-other");
        store.seed("publications", vec![existing.clone()]);

        let manager = session("u-manager", Role::Manager);
        let cancelled = AtomicBool::new(false);
        let err = run_save(
            &store,
            &storage,
            "publications",
            &manager,
            &SaveMode::Edit(existing),
            &draft("T2"),
            &cancelled,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
        assert_eq!(store.get_one("publications", "p1").unwrap().title, "T");
    }

    #[test]
    fn test_manager_can_edit_own_document() {
        let store = MemoryStore::new();
        let storage = MemoryObjectStorage::new();
        let existing = Post::new("p1", "Mine").with_uid("u-manager");
        store.seed("publications", vec![existing.clone()]);

        let manager = session("u-manager", Role::Manager);
        let cancelled = AtomicBool::new(false);
        let outcome = run_save(
            &store,
            &storage,
            "publications",
            &manager,
            &SaveMode::Edit(existing),
            &draft("Mine, revised"),
            &cancelled,
        )
        .unwrap();
        assert!(matches!(outcome, SaveOutcome::Saved { .. }));
        assert_eq!(
            store.get_one("publications", "p1").unwrap().title,
            "Mine, revised"
        );
    }

    #[test]
    fn test_invalid_draft_rejected_before_any_upload() {
        let store = MemoryStore::new();
        let storage = MemoryObjectStorage::new();
        let admin = session("u-admin", Role::Admin);
        let cancelled = AtomicBool::new(false);

        let mut bad = draft("");
        bad.image = Some(png(10));
        let err = run_save(
            &store,
            &storage,
            "publications",
            &admin,
            &SaveMode::Create,
            &bad,
            &cancelled,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ValidationFailed(_)));
        assert!(storage.uploads().is_empty(), "nothing uploaded");
        assert!(store.is_empty("publications"));
    }

    #[test]
    fn test_cancel_after_upload_writes_nothing() {
        let store = MemoryStore::new();
        let storage = MemoryObjectStorage::new();
        let admin = session("u-admin", Role::Admin);
        let cancelled = Arc::new(AtomicBool::new(false));

        // Flip the flag the moment the upload completes, before the write.
        let flag = Arc::clone(&cancelled);
        storage.set_upload_hook(move |_| flag.store(true, Ordering::SeqCst));

        let mut with_image = draft("T");
        with_image.image = Some(png(10));
        let outcome = run_save(
            &store,
            &storage,
            "publications",
            &admin,
            &SaveMode::Create,
            &with_image,
            &cancelled,
        )
        .unwrap();
        assert_eq!(outcome, SaveOutcome::Cancelled);
        assert_eq!(storage.uploads().len(), 1, "the upload already happened");
        assert!(store.is_empty("publications"), "but nothing was written");
    }

    #[test]
    fn test_replaced_image_deleted_best_effort() {
        let store = MemoryStore::new();
        let storage = MemoryObjectStorage::new();
        let mut existing = Post::new("p1", "T").with_uid("u-admin");
        existing.image_url = Some("memory://publications/old.png".to_string());
        store.seed("publications", vec![existing.clone()]);

        let admin = session("u-admin", Role::Admin);
        let cancelled = AtomicBool::new(false);
        let mut with_image = draft("T");
        with_image.image = Some(png(10));
        let outcome = run_save(
            &store,
            &storage,
            "publications",
            &admin,
            &SaveMode::Edit(existing),
            &with_image,
            &cancelled,
        )
        .unwrap();

        let SaveOutcome::Saved { doc, warnings } = outcome else {
            panic!("expected a saved document");
        };
        assert!(warnings.is_empty());
        assert_ne!(doc.image_url.as_deref(), Some("memory://publications/old.png"));
        assert_eq!(storage.deletes(), vec!["memory://publications/old.png"]);
    }

    #[test]
    fn test_failed_cleanup_becomes_warning_not_error() {
        let store = MemoryStore::new();
        let storage = MemoryObjectStorage::new();
        let mut existing = Post::new("p1", "T").with_uid("u-admin");
        existing.image_url = Some("memory://publications/old.png".to_string());
        store.seed("publications", vec![existing.clone()]);

        let admin = session("u-admin", Role::Admin);
        let cancelled = AtomicBool::new(false);
        let mut with_image = draft("T");
        with_image.image = Some(png(10));

        // Take storage offline after the upload so only the delete fails.
        let fail_deletes = storage.clone();
        storage.set_upload_hook(move |_| fail_deletes.set_offline(true));

        let outcome = run_save(
            &store,
            &storage,
            "publications",
            &admin,
            &SaveMode::Edit(existing),
            &with_image,
            &cancelled,
        )
        .unwrap();
        let SaveOutcome::Saved { warnings, .. } = outcome else {
            panic!("expected a saved document");
        };
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("old.png"));
        assert_eq!(
            store.get_one("publications", "p1").unwrap().title,
            "T",
            "the write itself succeeded"
        );
    }

    #[test]
    fn test_store_failure_surfaces_as_error() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let storage = MemoryObjectStorage::new();
        let admin = session("u-admin", Role::Admin);
        let cancelled = AtomicBool::new(false);

        let err = run_save(
            &store,
            &storage,
            "publications",
            &admin,
            &SaveMode::Create,
            &draft("T"),
            &cancelled,
        )
        .unwrap_err();
        assert!(matches!(err, Error::RemoteUnavailable(_)));
    }

    fn editor() -> Model {
        Model::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryObjectStorage::new()),
            "publications",
        )
    }

    #[test]
    fn test_save_guard_blocks_double_submit() {
        let mut m = editor();
        m.draft = draft("T");
        let admin = session("u-admin", Role::Admin);

        assert!(m.save(&admin).is_some());
        assert!(m.is_saving());
        assert!(m.save(&admin).is_none(), "second submit is a no-op");
    }

    #[test]
    fn test_completion_clears_guard_on_every_path() {
        let admin = session("u-admin", Role::Admin);
        let outcomes: Vec<Result<SaveOutcome>> = vec![
            Ok(SaveOutcome::Saved {
                doc: Post::new("p1", "T"),
                warnings: vec![],
            }),
            Ok(SaveOutcome::Cancelled),
            Err(Error::remote("boom")),
        ];
        for outcome in outcomes {
            let mut m = editor();
            m.draft = draft("T");
            m.save(&admin);
            assert!(m.is_saving());

            let msg: Msg = Box::new(SaveDoneMsg {
                id: m.id,
                outcome,
            });
            m.update(&msg);
            assert!(!m.is_saving());
            assert!(m.notice().is_some());
        }
    }

    #[test]
    fn test_foreign_completion_is_ignored() {
        let mut m = editor();
        m.draft = draft("T");
        m.save(&session("u-admin", Role::Admin));

        let msg: Msg = Box::new(SaveDoneMsg {
            id: m.id + 1,
            outcome: Ok(SaveOutcome::Cancelled),
        });
        m.update(&msg);
        assert!(m.is_saving(), "a different editor's result changes nothing");
    }

    #[test]
    fn test_edit_prefills_draft() {
        let mut m = editor();
        m.edit(
            Post::new("p1", "Existing")
                .with_author("A")
                .with_summary("S"),
        );
        assert_eq!(m.draft.title, "Existing");
        assert_eq!(m.draft.author, "A");
        assert!(m.draft.image.is_none());
        assert!(matches!(m.mode, SaveMode::Edit(_)));
    }
}
