//! Aggregate statistics over a snapshot of posts.
//!
//! [`Insights::compute`] folds a full list into the sidebar numbers shown
//! next to the admin views: total count, the most frequent category and
//! author, the newest document by creation time, the most recently updated
//! one, and the average body word count. Ties on a count resolve to the
//! name seen first in snapshot order.
//!
//! # Example
//!
//! ```rust
//! use bubbletea_admin::document::Post;
//! use bubbletea_admin::insights::Insights;
//!
//! let posts = vec![
//!     Post::new("a", "One").with_category("Training"),
//!     Post::new("b", "Two").with_category("Training"),
//!     Post::new("c", "Three").with_category("Reports"),
//! ];
//! let insights = Insights::compute(&posts);
//! assert_eq!(insights.total, 3);
//! assert_eq!(insights.top_category.as_deref(), Some("Training"));
//! ```

use crate::document::{Document, Post};
use crate::listsync::style::{EMPHASIS, SUBDUED};
use crate::listsync::BULLET;
use lipgloss_extras::prelude::*;

/// Aggregates derived from one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Insights {
    /// Number of documents in the snapshot.
    pub total: usize,
    /// Most frequent non-empty category, if any.
    pub top_category: Option<String>,
    /// Most frequent non-empty author, if any.
    pub top_author: Option<String>,
    /// Title of the newest document by creation time.
    pub newest: Option<String>,
    /// Title of the most recently updated document.
    pub latest_update: Option<String>,
    /// Mean body word count, rounded down. Zero for an empty snapshot.
    pub avg_content_words: usize,
}

impl Insights {
    /// Folds a snapshot into its aggregates. An empty slice yields the
    /// all-empty default.
    pub fn compute(posts: &[Post]) -> Self {
        if posts.is_empty() {
            return Self::default();
        }

        let total_words: usize = posts
            .iter()
            .map(|p| p.content.split_whitespace().count())
            .sum();

        Self {
            total: posts.len(),
            top_category: most_frequent(posts.iter().map(|p| p.category.as_str())),
            top_author: most_frequent(posts.iter().map(|p| p.author.as_str())),
            newest: posts
                .iter()
                .max_by_key(|p| p.created_at())
                .map(|p| p.title.clone()),
            latest_update: posts
                .iter()
                .max_by_key(|p| p.modified_at())
                .map(|p| p.title.clone()),
            avg_content_words: total_words / posts.len(),
        }
    }

    /// Renders the aggregates as a short labeled block.
    pub fn view(&self) -> String {
        let label = Style::new().foreground(SUBDUED.clone());
        let value = Style::new().foreground(EMPHASIS.clone()).bold(true);
        let line = |name: &str, text: &str| {
            format!("{} {}", label.render(&format!("{name}:")), value.render(text))
        };

        let mut lines = vec![line("Total", &self.total.to_string())];
        if let Some(category) = &self.top_category {
            lines.push(line("Top category", category));
        }
        if let Some(author) = &self.top_author {
            lines.push(line("Top author", author));
        }
        if let Some(newest) = &self.newest {
            lines.push(line("Newest", newest));
        }
        if let Some(updated) = &self.latest_update {
            lines.push(line("Last updated", updated));
        }
        lines.push(line(
            "Avg words",
            &format!("{} {BULLET} per document", self.avg_content_words),
        ));
        lines.join("\n")
    }
}

/// The most frequent non-empty value; ties go to the value seen first.
fn most_frequent<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    for value in values {
        if value.is_empty() {
            continue;
        }
        match order.iter().position(|&v| v == value) {
            Some(i) => counts[i] += 1,
            None => {
                order.push(value);
                counts.push(1);
            }
        }
    }
    let mut best: Option<usize> = None;
    for (i, &count) in counts.iter().enumerate() {
        // Strictly greater, so ties keep the earlier value.
        if best.map_or(true, |b| count > counts[b]) {
            best = Some(i);
        }
    }
    best.map(|i| order[i].to_string())
}
