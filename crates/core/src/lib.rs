pub mod agent;
pub mod config;
pub mod identity;
pub mod lookup;
pub mod store;
pub mod testing;
pub mod text;

pub use agent::{
    AgentError, BookAgent, BookMetadata, OpenAiAgent, MAX_LINK_RESULTS, MAX_SEARCH_RESULTS,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AgentConfig, Config, ConfigError,
    DatabaseConfig, LookupConfig, SanitizedConfig, ServerConfig,
};
pub use identity::identity_key;
pub use lookup::{BookLookup, LinksOutcome, LookupError, NewBook, SearchOutcome, SearchSource};
pub use store::{
    BookRecord, BookStore, SqliteBookStore, StoreError, StoreStats, PLACEHOLDER_COVER_URL,
};
pub use text::{canonicalize_query, sanitize_text};
