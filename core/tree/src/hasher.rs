//! Content digest of hook source text.
//!
//! Two hooks whose bodies are byte-identical get the same digest no matter
//! which name they are bound to, so anonymous callbacks can be compared
//! across the tree.

use sha2::{Digest, Sha256};

/// Computes the SHA256 digest of `source_text` as a lowercase hex string.
#[must_use]
pub fn content_hash(source_text: &str) -> String {
    hex::encode(Sha256::digest(source_text.as_bytes()))
}
