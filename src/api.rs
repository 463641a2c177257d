//! HTTP client for the portfolio backend: layout persistence, profile, AI helpers
//! and the editor's chat assistant.
//!
//! Every request carries the session cookie. Non-2xx responses surface the
//! server's `{error}` message as [`ApiError::Status`].

use std::sync::Arc;
use std::time::Duration;

use canvas::block::{Block, BlockKind};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::FolioConfig;
use crate::session::{Profile, Session};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    HttpClientBuild(String),
    #[error("invalid session token: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0} cannot be empty")]
    EmptyInput(&'static str),
    #[error("server returned no {0}")]
    EmptyResponse(&'static str),
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// A stored canvas layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMetadata {
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub background_color: String,
}

/// One AI-proposed portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPortfolio {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub metadata: PortfolioMetadata,
}

/// Prior turns sent along with a chat message.
pub const CHAT_HISTORY_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// What the chat assistant is told about the selected block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatContext<'a> {
    pub block_type: Option<BlockKind>,
    /// Text of the selected block; only text blocks carry any.
    pub block_content: Option<&'a str>,
}

impl<'a> ChatContext<'a> {
    #[must_use]
    pub fn for_block(block: &'a Block) -> Self {
        Self { block_type: Some(block.kind()), block_content: block.text() }
    }
}

#[derive(Serialize)]
struct SaveRequest<'a> {
    blocks: &'a [Arc<Block>],
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct RewriteRequest<'a> {
    text: &'a str,
    instruction: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RewriteResponse {
    #[serde(default)]
    rewritten_text: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    portfolios: Vec<GeneratedPortfolio>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EditRequest<'a> {
    prompt: &'a str,
    current_blocks: &'a [Arc<Block>],
}

#[derive(Deserialize)]
struct EditResponse {
    blocks: Option<Vec<Block>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected_block_type: Option<BlockKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected_block_content: Option<&'a str>,
    conversation_history: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct MeResponse {
    user: Profile,
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client for `config.base_url` that authenticates as `session`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the token is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(config: &FolioConfig, session: &Session) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = session.cookie() {
            headers.insert(COOKIE, HeaderValue::from_str(&cookie)?);
        }
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/auth/me`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, a non-2xx status or a bad body.
    pub async fn me(&self) -> Result<Profile, ApiError> {
        let response: MeResponse = self.get("/api/auth/me").await?;
        Ok(response.user)
    }

    /// `GET /api/layout`. `None` when the user has never saved.
    ///
    /// Accepts both `{layout: {...} | null}` and a bare `{blocks}` body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, a non-2xx status or a bad body.
    pub async fn load_layout(&self) -> Result<Option<Layout>, ApiError> {
        let body: Value = self.get("/api/layout").await?;
        parse_layout(body)
    }

    /// `POST /api/layout`: upsert the user's layout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a non-2xx status.
    pub async fn save_layout(&self, blocks: &[Arc<Block>], name: Option<&str>) -> Result<(), ApiError> {
        let _: Value = self.post("/api/layout", &SaveRequest { blocks, name }).await?;
        Ok(())
    }

    /// `POST /api/ai/rewrite-text`.
    ///
    /// # Errors
    ///
    /// [`ApiError::EmptyInput`] for blank text or instruction (no request is sent),
    /// [`ApiError::EmptyResponse`] when the server returns no text.
    pub async fn rewrite_text(&self, text: &str, instruction: &str) -> Result<String, ApiError> {
        if text.trim().is_empty() {
            return Err(ApiError::EmptyInput("text"));
        }
        if instruction.trim().is_empty() {
            return Err(ApiError::EmptyInput("instruction"));
        }
        let response: RewriteResponse = self.post("/api/ai/rewrite-text", &RewriteRequest { text, instruction }).await?;
        if response.rewritten_text.trim().is_empty() {
            return Err(ApiError::EmptyResponse("rewritten text"));
        }
        Ok(response.rewritten_text)
    }

    /// `POST /api/ai/generate`: candidate portfolios for `prompt`.
    ///
    /// # Errors
    ///
    /// [`ApiError::EmptyInput`] for a blank prompt, otherwise transport or status errors.
    pub async fn generate(&self, prompt: &str) -> Result<Vec<GeneratedPortfolio>, ApiError> {
        if prompt.trim().is_empty() {
            return Err(ApiError::EmptyInput("prompt"));
        }
        let response: GenerateResponse = self.post("/api/ai/generate", &GenerateRequest { prompt }).await?;
        debug!(count = response.portfolios.len(), "generated portfolios");
        Ok(response.portfolios)
    }

    /// `POST /api/ai/edit`: a revised block list for `prompt`.
    ///
    /// # Errors
    ///
    /// [`ApiError::EmptyInput`] for a blank prompt, [`ApiError::EmptyResponse`]
    /// when the server sends no `blocks`.
    pub async fn edit(&self, prompt: &str, current_blocks: &[Arc<Block>]) -> Result<Vec<Block>, ApiError> {
        if prompt.trim().is_empty() {
            return Err(ApiError::EmptyInput("prompt"));
        }
        let response: EditResponse = self.post("/api/ai/edit", &EditRequest { prompt, current_blocks }).await?;
        response.blocks.ok_or(ApiError::EmptyResponse("blocks"))
    }

    /// `POST /api/ai/chat`: one assistant reply to `message`.
    ///
    /// Only the last [`CHAT_HISTORY_LEN`] entries of `history` are sent.
    ///
    /// # Errors
    ///
    /// [`ApiError::EmptyInput`] for a blank message (no request is sent),
    /// [`ApiError::EmptyResponse`] when the server returns no reply.
    pub async fn chat(&self, message: &str, context: ChatContext<'_>, history: &[ChatMessage]) -> Result<String, ApiError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ApiError::EmptyInput("message"));
        }
        let recent = &history[history.len().saturating_sub(CHAT_HISTORY_LEN)..];
        let request = ChatRequest {
            message,
            selected_block_type: context.block_type,
            selected_block_content: context.block_content,
            conversation_history: recent,
        };
        let response: ChatResponse = self.post("/api/ai/chat", &request).await?;
        if response.message.trim().is_empty() {
            return Err(ApiError::EmptyResponse("chat reply"));
        }
        Ok(response.message)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(%path, "GET");
        let response = self.http.get(self.url(path)).send().await?;
        read_json(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        debug!(%path, "POST");
        let response = self.http.post(self.url(path)).json(body).send().await?;
        read_json(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

// =============================================================================
// PARSING
// =============================================================================

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(ApiError::Status { status: status.as_u16(), message: error_message(&text) });
    }
    Ok(serde_json::from_str(&text)?)
}

/// The `error` field of a failure body, else the raw body.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body)
        && let Some(message) = value.get("error").and_then(Value::as_str)
    {
        return message.to_owned();
    }
    let trimmed = body.trim();
    if trimmed.is_empty() { "request failed".to_owned() } else { trimmed.to_owned() }
}

fn parse_layout(body: Value) -> Result<Option<Layout>, ApiError> {
    let inner = match body {
        Value::Object(mut map) if map.contains_key("layout") => map.remove("layout").unwrap_or(Value::Null),
        other => other,
    };
    if inner.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(inner)?))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
