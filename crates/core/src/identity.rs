//! Content-based identity for book records.
//!
//! Two agent results for the same title+author collapse to one stored record
//! no matter which query produced them, so the identity hash deliberately
//! ignores isbn, edition and every other field.

use sha2::{Digest, Sha256};

/// Compute the stable identity key for a book.
///
/// Hex SHA-256 of `lowercase(trim(title)) + "|" + lowercase(trim(author))`.
/// Deterministic across casing and incidental whitespace.
pub fn identity_key(title: &str, author: &str) -> String {
    let normalized = format!(
        "{}|{}",
        title.trim().to_lowercase(),
        author.trim().to_lowercase()
    );
    format!("{:x}", Sha256::digest(normalized.as_bytes()))
}
