//! HTTP request handlers for the web server.

mod api;
mod chat;
mod documents;
mod pages;
mod static_files;

// Re-export handlers for use by the router
pub use api::{api_ask, api_status};
pub use chat::{ask, clear_chat, export_chat};
pub use documents::{load_index, process_document};
pub use pages::index;
pub use static_files::{serve_css, serve_js};
