//! Retrieval units stored in the vector index.

use serde::{Deserialize, Serialize};

use super::ContentKind;

/// A chunk of extracted content together with its embedding.
///
/// Passages are immutable once indexed; rebuilding the index replaces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Stable identifier, `p{page}-{kind}-{ordinal}`.
    pub id: String,
    pub text: String,
    pub page: u32,
    pub kind: ContentKind,
    pub embedding: Vec<f32>,
}

impl Passage {
    /// Build the identifier for the `ordinal`-th chunk of a given page and kind.
    pub fn make_id(page: u32, kind: ContentKind, ordinal: usize) -> String {
        format!("p{}-{}-{}", page, kind.as_str(), ordinal)
    }
}
