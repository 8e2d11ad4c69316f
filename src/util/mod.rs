//! Utility functions for common operations.
//!
//! - **Text**: Unicode-aware display width, truncation and control-character
//!   stripping for anything that reaches the terminal
//! - **URL validation**: subscription URLs are checked before they are stored
//! - **Files**: atomic replace for the cache, subscription list and OPML export

mod fs;
mod text;
mod url_validator;

pub use fs::atomic_write;
pub use text::{display_width, strip_control_chars, truncate_to_width, ELLIPSIS};
pub use url_validator::{validate_local_url, validate_url, UrlValidationError};
