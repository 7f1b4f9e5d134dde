//! OpenAI-compatible chat-completions client for the book agent.
//!
//! The agent endpoint is any OpenAI-compatible API whose model has been set
//! up with web-search tooling; from this side it is a black box that takes a
//! query and returns strict JSON.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::config::AgentConfig;

use super::{AgentError, BookAgent, BookMetadata, MAX_LINK_RESULTS, MAX_SEARCH_RESULTS};

const SEARCH_INSTRUCTIONS: &str = r#"You are a book search assistant. Given a book query:
1. Use web search to find relevant published books (skip articles/videos/lists).
2. If the query specifies an edition, search for that specific edition; otherwise return only the most recent or most popular edition.
3. For each result provide:
   - "title": exact full title
   - "author": author(s) or ""
   - "overview": concise factual overview in plain English (no opinions, no large quotes, no spoilers), "" if insufficient data
   - "coverUrl": direct URL to a valid cover image, prefer OpenLibrary covers (https://covers.openlibrary.org/b/isbn/{ISBN}-L.jpg)
   - "isbn": ISBN-13 or ISBN-10
   - "year": published year
   - "genre": top 3 most relevant genres in plain English
   - "pages": median page count
   - "publisher": the most relevant publishing agency
4. Return STRICT JSON: {"books":[{"title":"...","author":"...","overview":"...","coverUrl":"...","isbn":"...","year":"...","genre":["..."],"pages":"...","publisher":"..."}, ...]}
5. Maximum 10 results ordered by relevance.
6. Return ONLY valid JSON, no commentary, no code fences. If you cannot determine a field, use "" or []."#;

const LINK_INSTRUCTIONS: &str = r#"You are a PDF link finder. Given a book query (title + author):
1. Search the web once for direct PDF links for the requested book.
2. Prioritize university/educational repositories, archive.org, publisher preview PDFs and open access repositories.
3. Only include links that look like direct PDFs.
4. Return STRICT JSON: {"links": ["https://...", ...]} (max 5). If none found, return {"links": []}.
5. Return ONLY valid JSON, no commentary, no markdown, no explanations."#;

/// OpenAI-compatible agent client.
pub struct OpenAiAgent {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiAgent {
    /// Create a new agent client with the given configuration.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let timeout = Duration::from_secs(config.timeout_secs as u64);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            timeout,
        })
    }

    /// Send one completion request and return the raw assistant text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, AgentError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AgentError::Timeout(self.timeout)
                } else {
                    AgentError::Http(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if !(200..300).contains(&status) {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ChatErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(AgentError::Api { status, message });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidJson(e.to_string()))?;

        let text = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl BookAgent for OpenAiAgent {
    fn name(&self) -> &str {
        "openai"
    }

    async fn search(&self, query: &str) -> Result<Vec<BookMetadata>, AgentError> {
        debug!(query = query, model = %self.model, "Invoking search agent");
        let raw = self.complete(SEARCH_INSTRUCTIONS, query).await?;
        parse_books(&raw)
    }

    async fn fetch_links(&self, query: &str) -> Result<Vec<String>, AgentError> {
        debug!(query = query, model = %self.model, "Invoking link agent");
        let raw = self.complete(LINK_INSTRUCTIONS, query).await?;
        parse_links(&raw)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatErrorResponse {
    error: ChatErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ChatErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct BooksPayload {
    books: Vec<BookMetadata>,
}

#[derive(Debug, Deserialize)]
struct LinksPayload {
    links: Vec<String>,
}

// ============================================================================
// Response parsing
// ============================================================================

/// Strip a leading/trailing markdown code fence if the model wrapped its
/// output despite the instructions.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let without_open = trimmed
        .trim_start_matches("```")
        .trim_start_matches("json")
        .trim_start_matches("JSON");
    without_open.trim_end_matches("```").trim()
}

/// Parse and validate a search response: `{"books": [...]}`, at most
/// [`MAX_SEARCH_RESULTS`] entries, every field present.
pub(crate) fn parse_books(raw: &str) -> Result<Vec<BookMetadata>, AgentError> {
    let cleaned = strip_code_fences(raw);

    let value: serde_json::Value = serde_json::from_str(cleaned).map_err(|e| {
        error!(raw = raw, "Agent returned unparseable search response");
        AgentError::InvalidJson(e.to_string())
    })?;

    let payload: BooksPayload = serde_json::from_value(value).map_err(|e| {
        error!(raw = raw, "Agent search response violates schema");
        AgentError::SchemaViolation(e.to_string())
    })?;

    if payload.books.len() > MAX_SEARCH_RESULTS {
        error!(raw = raw, "Agent search response exceeds result cap");
        return Err(AgentError::SchemaViolation(format!(
            "got {} books, max {}",
            payload.books.len(),
            MAX_SEARCH_RESULTS
        )));
    }

    Ok(payload.books)
}

/// Parse and validate a link response: `{"links": [...]}`, at most
/// [`MAX_LINK_RESULTS`] entries, each a valid http(s) URL.
pub(crate) fn parse_links(raw: &str) -> Result<Vec<String>, AgentError> {
    let cleaned = strip_code_fences(raw);

    let value: serde_json::Value = serde_json::from_str(cleaned).map_err(|e| {
        error!(raw = raw, "Agent returned unparseable link response");
        AgentError::InvalidJson(e.to_string())
    })?;

    let payload: LinksPayload = serde_json::from_value(value).map_err(|e| {
        error!(raw = raw, "Agent link response violates schema");
        AgentError::SchemaViolation(e.to_string())
    })?;

    if payload.links.len() > MAX_LINK_RESULTS {
        error!(raw = raw, "Agent link response exceeds link cap");
        return Err(AgentError::SchemaViolation(format!(
            "got {} links, max {}",
            payload.links.len(),
            MAX_LINK_RESULTS
        )));
    }

    for link in &payload.links {
        let parsed = reqwest::Url::parse(link)
            .map_err(|e| AgentError::SchemaViolation(format!("invalid url {}: {}", link, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AgentError::SchemaViolation(format!(
                "unsupported url scheme: {}",
                link
            )));
        }
    }

    Ok(payload.links)
}
