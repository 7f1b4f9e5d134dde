//! Query canonicalization and free-text sanitization.
//!
//! Queries are compared in canonical form both when looking up the cache and
//! when tagging stored records, so the two sides always agree.

/// Normalize a raw search query into its canonical cache-key form.
///
/// Lower-cases, strips everything that is not a word character or whitespace,
/// collapses whitespace runs to single spaces and trims. Total and
/// idempotent: `canonicalize_query(canonicalize_query(s)) ==
/// canonicalize_query(s)`.
pub fn canonicalize_query(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitize free text (book overviews) before persisting it.
///
/// Escapes backslashes and double quotes, collapses newlines and tabs to
/// spaces, drops carriage returns and trims.
///
/// Not idempotent: re-applying it to already-sanitized text doubles the
/// escapes. Call it exactly once, on raw agent/user input — never on an
/// overview read back from the store.
pub fn sanitize_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', " ")
        .replace('\r', "")
        .replace('\t', " ")
        .trim()
        .to_string()
}
