//! Static asset constants (CSS and JavaScript).

/// Stylesheet for the web interface.
pub const CSS: &str = include_str!("styles.css");

/// Upload and question form behaviour.
pub const JS: &str = include_str!("app.js");
