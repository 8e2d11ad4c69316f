//! Plain-text rendering for the command line.
//!
//! Every renderer returns a `String` and never touches the terminal itself,
//! so the output can be printed, piped or compared in tests.
//!
//! # Module Structure
//!
//! - `feeds` - feed list with unread counts and categories
//! - `articles` - headline list of one feed
//! - `reader` - a single item, dejunked and wrapped
//! - `categories` - the category registry

mod articles;
mod categories;
mod feeds;
mod reader;

pub use articles::{format_relative_time, render_headlines};
pub use categories::{paint_category, render_categories};
pub use feeds::render_feed_list;
pub use reader::render_item;

use crate::content::MIN_WIDTH;

/// Width used when the terminal size cannot be queried.
pub const FALLBACK_WIDTH: usize = 80;

/// How output is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Columns available for every line.
    pub width: usize,
    /// Whether category colour labels become ANSI colours.
    pub color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: FALLBACK_WIDTH,
            color: false,
        }
    }
}

impl RenderOptions {
    /// `configured` of 0 means the terminal width.
    pub fn with_width(configured: usize) -> Self {
        let width = if configured == 0 {
            terminal_width()
        } else {
            configured
        };
        Self {
            width: width.max(MIN_WIDTH),
            ..Self::default()
        }
    }
}

/// Current terminal width, or [`FALLBACK_WIDTH`] when stdout is not a tty.
pub fn terminal_width() -> usize {
    match crossterm::terminal::size() {
        Ok((cols, _)) if cols > 0 => usize::from(cols),
        Ok(_) => FALLBACK_WIDTH,
        Err(e) => {
            tracing::debug!(error = %e, "Terminal size unavailable");
            FALLBACK_WIDTH
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_width_wins() {
        assert_eq!(RenderOptions::with_width(60).width, 60);
    }

    #[test]
    fn test_width_never_below_minimum() {
        assert_eq!(RenderOptions::with_width(1).width, MIN_WIDTH);
    }

    #[test]
    fn test_terminal_width_is_positive() {
        assert!(terminal_width() > 0);
    }
}
