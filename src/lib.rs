//! docqa - ask questions about a PDF and get answers with page citations.
//!
//! The indexing side extracts page-tagged text, tables and image OCR from a
//! PDF, splits it into passages, embeds them and persists a vector index.
//! The query side embeds a question, retrieves the nearest passages and asks
//! an LLM to answer from them, citing the pages the passages came from.

pub mod chunker;
pub mod cli;
pub mod config;
pub mod embed;
pub mod extract;
pub mod index;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod qa;
pub mod server;
pub mod utils;
