//! The feed content pipeline: turns raw feed text into something that can be
//! printed on a terminal.
//!
//! - [`sanitize`] normalizes whitespace right after parsing
//! - [`Dejunker`] strips tag soup and decodes entities
//! - [`wrap`] reflows the result to the terminal width
//!
//! Everything here is synchronous and infallible.

mod dejunk;
mod entities;
mod sanitize;
mod wrap;

pub use dejunk::{dejunk, Dejunker, IMAGE_MARKER, NO_DESCRIPTION};
pub use entities::EntityTable;
pub use sanitize::{sanitize, sanitize_opt, sanitized, CleanupMode};
pub use wrap::{wrap, wrap_lines, MIN_WIDTH};
