//! Search orchestration: the tiered pipeline that answers every book query.
//!
//! Tier 1 returns records previously tagged with the exact canonical query.
//! Tier 2 trusts cached free-text matches when enough of them exist. Tier 3
//! asks the external agent and caches what it returns.

mod service;
mod types;

pub use service::BookLookup;
pub use types::{LinksOutcome, LookupError, NewBook, SearchOutcome, SearchSource};
