//! Shared utility functions.
//!
//! - `text`: UTF-8 safe truncation and character counting
//! - `format`: Human-readable formatting (sizes, etc.)

mod format;
mod text;

pub use format::format_size;
pub use text::{non_whitespace_chars, truncate_bytes, truncate_chars};
