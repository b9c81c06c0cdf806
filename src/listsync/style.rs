//! Styling for the list-sync component.
//!
//! All defaults use `AdaptiveColor` pairs so the component reads well on
//! both light and dark terminals. The shared palette lives in lazy statics
//! so every instance styles consistently.

use lipgloss_extras::prelude::*;
use once_cell::sync::Lazy;

/// Bullet separator used in the status line.
pub const BULLET: &str = "•";

/// Ellipsis used when truncating rendered text.
pub const ELLIPSIS: &str = "…";

/// Subdued foreground for secondary text.
pub static SUBDUED: Lazy<AdaptiveColor> = Lazy::new(|| AdaptiveColor {
    Light: "#9B9B9B",
    Dark: "#5C5C5C",
});

/// Emphasized foreground for primary values.
pub static EMPHASIS: Lazy<AdaptiveColor> = Lazy::new(|| AdaptiveColor {
    Light: "#1a1a1a",
    Dark: "#dddddd",
});

/// Styles for every visual element of a synced list view.
#[derive(Debug, Clone)]
pub struct SyncStyles {
    /// The list title.
    pub title: Style,
    /// The `Search:` prompt label.
    pub search_prompt: Style,
    /// The typed search term.
    pub search_text: Style,
    /// One rendered item line.
    pub item: Style,
    /// The explicit empty state (`No results found.`).
    pub no_items: Style,
    /// The `Loading…` placeholder.
    pub loading: Style,
    /// The counts and page position line.
    pub status: Style,
    /// Informational notices.
    pub notice_info: Style,
    /// Error notices.
    pub notice_error: Style,
    /// The page-links row.
    pub pagination: Style,
    /// The short help line.
    pub help: Style,
}

impl Default for SyncStyles {
    fn default() -> Self {
        Self {
            title: Style::new()
                .background(Color::from("62"))
                .foreground(Color::from("230"))
                .padding(0, 1, 0, 1),
            search_prompt: Style::new().foreground(AdaptiveColor {
                Light: "#04B575",
                Dark: "#ECFD65",
            }),
            search_text: Style::new().foreground(EMPHASIS.clone()),
            item: Style::new(),
            no_items: Style::new().foreground(AdaptiveColor {
                Light: "#909090",
                Dark: "#626262",
            }),
            loading: Style::new().foreground(SUBDUED.clone()),
            status: Style::new().foreground(AdaptiveColor {
                Light: "#A49FA5",
                Dark: "#777777",
            }),
            notice_info: Style::new().foreground(Color::from("#04B575")),
            notice_error: Style::new().foreground(Color::from("#FF5F87")),
            pagination: Style::new().foreground(SUBDUED.clone()),
            help: Style::new().foreground(SUBDUED.clone()),
        }
    }
}
