//! Documents projected from the remote store.
//!
//! [`Document`] is the trait a record must implement to flow through the
//! list-sync, store and editor components: a unique id, the fields the search
//! filter runs over, the owning user, and the two sort timestamps. [`Post`] is
//! the concrete record for publications and downloadable resources, with serde
//! field names matching the hosted store's document shape.
//!
//! # Examples
//!
//! ```rust
//! use bubbletea_admin::document::{Document, Post};
//!
//! let post = Post::new("p1", "Digital Skills 101")
//!     .with_author("A. Mensah")
//!     .with_category("Training");
//! assert_eq!(post.id(), "p1");
//! assert!(post.search_fields().contains(&"Training"));
//! ```

use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of words kept by [`short_summary`] for list rendering.
pub const SHORT_SUMMARY_WORDS: usize = 40;

/// A document that can be listed, searched, stored and edited.
///
/// Implementations are cheap to clone; list snapshots replace the in-memory
/// collection wholesale on every change.
pub trait Document: Clone + Send + Sync + 'static {
    /// The unique document id within its collection.
    fn id(&self) -> &str;

    /// Returns a copy of the document carrying the given id. Stores call this
    /// when they assign an id on creation.
    fn with_id(self, id: &str) -> Self;

    /// The field values the search filter tests, combined with logical OR.
    fn search_fields(&self) -> Vec<&str>;

    /// The uid of the user who owns the document, when tracked.
    fn owner_uid(&self) -> Option<&str> {
        None
    }

    /// Creation time, used for `dateCreated` ordering.
    fn created_at(&self) -> Timestamp;

    /// Last modification time, used for `dateModified` ordering.
    fn modified_at(&self) -> Timestamp;
}

/// A publication or downloadable resource document.
///
/// Field names on the wire follow the store's camelCase convention
/// (`dateModified`, `imageURL`, `lastEditedBy`, ...). Timestamps absorb both
/// wire shapes via [`Timestamp`]; missing ones default to the epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Document id. Empty until the store assigns one.
    #[serde(default)]
    pub id: String,
    /// Title, always present.
    pub title: String,
    /// Display name of the author.
    #[serde(default)]
    pub author: String,
    /// Category badge text.
    #[serde(default)]
    pub category: String,
    /// Summary shown in list views, truncated via [`short_summary`].
    #[serde(default)]
    pub summary: String,
    /// Full body content, when the document carries one.
    #[serde(default)]
    pub content: String,
    /// Download URL of the cover image, if uploaded.
    #[serde(default, rename = "imageURL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Download URL of the attached file, if uploaded.
    #[serde(default, rename = "fileURL", skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    /// Set once on creation and preserved by every edit.
    #[serde(default)]
    pub date_created: Timestamp,
    /// Stamped on every save.
    #[serde(default)]
    pub date_modified: Timestamp,
    /// Uid of the original uploader; preserved by edits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Uid of the user who last saved the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_by: Option<String>,
}

impl Post {
    /// Creates a post with the given id and title; both timestamps start at
    /// the current time.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: id.into(),
            title: title.into(),
            author: String::new(),
            category: String::new(),
            summary: String::new(),
            content: String::new(),
            image_url: None,
            file_url: None,
            date_created: now,
            date_modified: now,
            uid: None,
            last_edited_by: None,
        }
    }

    /// Sets the author display name.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Sets the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Sets the body content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Sets the owning user's uid.
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// Sets both timestamps.
    pub fn with_timestamps(mut self, created: Timestamp, modified: Timestamp) -> Self {
        self.date_created = created;
        self.date_modified = modified;
        self
    }
}

impl Document for Post {
    fn id(&self) -> &str {
        &self.id
    }

    fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.title, &self.author, &self.category, &self.summary]
    }

    fn owner_uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    fn created_at(&self) -> Timestamp {
        self.date_created
    }

    fn modified_at(&self) -> Timestamp {
        self.date_modified
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Truncates text to at most `max_words` whitespace-separated words, appending
/// an ellipsis when anything was cut.
///
/// # Examples
///
/// ```rust
/// use bubbletea_admin::document::short_summary;
///
/// assert_eq!(short_summary("one two three", 5), "one two three");
/// assert_eq!(short_summary("one two three", 2), "one two…");
/// ```
pub fn short_summary(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        words.join(" ")
    } else {
        let mut out = words[..max_words].join(" ");
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_fields_cover_title_author_category_summary() {
        let post = Post::new("p1", "Digital Skills")
            .with_author("A. Mensah")
            .with_category("Training")
            .with_summary("Intro course");
        assert_eq!(
            post.search_fields(),
            vec!["Digital Skills", "A. Mensah", "Training", "Intro course"]
        );
    }

    #[test]
    fn test_with_id_replaces_id() {
        let post = Post::new("", "Untitled").with_id("gen-1");
        assert_eq!(post.id(), "gen-1");
    }

    #[test]
    fn test_deserializes_store_shape() {
        let json = r#"{
            "title": "Digital Skills",
            "author": "A. Mensah",
            "category": "Training",
            "summary": "Intro",
            "imageURL": "https://files.example/img.png",
            "dateCreated": "2024-01-15T10:30:00.000Z",
            "dateModified": {"seconds": 1705314600, "nanos": 0},
            "uid": "u-1",
            "lastEditedBy": "u-2"
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.image_url.as_deref(), Some("https://files.example/img.png"));
        assert_eq!(post.date_created, post.date_modified);
        assert_eq!(post.uid.as_deref(), Some("u-1"));
        assert_eq!(post.last_edited_by.as_deref(), Some("u-2"));
        assert!(post.file_url.is_none());
        assert!(post.id.is_empty());
    }

    #[test]
    fn test_serializes_camel_case() {
        let post = Post::new("p1", "T").with_uid("u-1");
        let json = serde_json::to_string(&post).unwrap();
        assert!(json.contains("\"dateModified\""));
        assert!(json.contains("\"uid\""));
        assert!(!json.contains("imageURL"), "absent options are skipped");
    }

    #[test]
    fn test_short_summary_cuts_at_word_boundary() {
        let text = "a b c d e f";
        assert_eq!(short_summary(text, 6), "a b c d e f");
        assert_eq!(short_summary(text, 3), "a b c…");
        assert_eq!(short_summary("", 40), "");
        assert_eq!(short_summary("  spaced   out  ", 40), "spaced out");
    }
}
