//! Editing session: an [`EditorCore`] bound to the backend that stores its layout.
//!
//! Loads the saved layout, saves it back, applies AI results and keeps the chat
//! assistant's conversation. Network failures are logged and returned;
//! in-memory edits are never rolled back.

use canvas::block::{BlockId, PayloadError};
use canvas::engine::{Action, EditorCore};
use tracing::{error, info};

use crate::api::{ApiClient, ApiError, ChatContext, ChatMessage, GeneratedPortfolio};

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error("no block with id {0}")]
    UnknownBlock(BlockId),
}

pub struct EditorSession {
    api: ApiClient,
    core: EditorCore,
    name: Option<String>,
    chat: Vec<ChatMessage>,
}

impl EditorSession {
    /// A session with an empty canvas.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api, core: EditorCore::new(), name: None, chat: Vec::new() }
    }

    /// Fetch the stored layout and hydrate the canvas with it.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Api`] if the layout cannot be loaded.
    pub async fn open(api: ApiClient) -> Result<Self, EditorError> {
        let mut session = Self::new(api);
        let layout = session.api.load_layout().await.inspect_err(|e| error!(error = %e, "failed to load layout"))?;
        if let Some(layout) = layout {
            info!(blocks = layout.blocks.len(), "layout loaded");
            session.core.load_layout(layout.blocks);
            session.name = layout.name;
        }
        Ok(session)
    }

    #[must_use]
    pub fn core(&self) -> &EditorCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut EditorCore {
        &mut self.core
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Upsert the current blocks.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Api`] on failure; the canvas keeps its state.
    pub async fn save(&self) -> Result<(), EditorError> {
        self.api
            .save_layout(self.core.blocks(), self.name.as_deref())
            .await
            .inspect_err(|e| error!(error = %e, "failed to save layout"))?;
        info!(blocks = self.core.blocks().len(), "layout saved");
        Ok(())
    }

    /// Ask the AI to rewrite text block `id` following `instruction`, then splice
    /// the result in.
    ///
    /// # Errors
    ///
    /// [`EditorError::UnknownBlock`] or [`PayloadError::NotText`] before any
    /// request is made, [`EditorError::Api`] if the rewrite fails.
    pub async fn rewrite(&mut self, id: &BlockId, instruction: &str) -> Result<Vec<Action>, EditorError> {
        let block = self.core.block(id).ok_or_else(|| EditorError::UnknownBlock(id.clone()))?;
        let text = block.text().ok_or_else(|| PayloadError::NotText(id.clone()))?.to_owned();
        let rewritten = self
            .api
            .rewrite_text(&text, instruction)
            .await
            .inspect_err(|e| error!(%id, error = %e, "text rewrite failed"))?;
        Ok(self.core.apply_rewrite(id, &rewritten)?)
    }

    /// Replace the canvas with the AI's revision of the current blocks.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Api`] if the edit fails; the canvas is unchanged.
    pub async fn ai_edit(&mut self, prompt: &str) -> Result<Vec<Action>, EditorError> {
        let blocks = self
            .api
            .edit(prompt, self.core.blocks())
            .await
            .inspect_err(|e| error!(error = %e, "AI edit failed"))?;
        Ok(self.core.replace_blocks(blocks))
    }

    /// Ask the chat assistant about `message`, telling it which block is
    /// selected. The exchange is appended to the conversation only when a
    /// reply arrives.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Api`] if the chat request fails.
    pub async fn chat(&mut self, message: &str) -> Result<String, EditorError> {
        let selected = self.core.selection().and_then(|id| self.core.block(id));
        let context = selected.map(ChatContext::for_block).unwrap_or_default();
        let reply = self
            .api
            .chat(message, context, &self.chat)
            .await
            .inspect_err(|e| error!(error = %e, "chat failed"))?;
        self.chat.push(ChatMessage::user(message.trim()));
        self.chat.push(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }

    /// Candidate portfolios for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Api`] if generation fails.
    pub async fn generate(&self, prompt: &str) -> Result<Vec<GeneratedPortfolio>, EditorError> {
        Ok(self.api.generate(prompt).await.inspect_err(|e| error!(error = %e, "AI generate failed"))?)
    }

    /// Adopt a generated portfolio wholesale and save it under its name.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Api`] if the save fails; the canvas still shows
    /// the portfolio.
    pub async fn apply_portfolio(&mut self, portfolio: GeneratedPortfolio) -> Result<Vec<Action>, EditorError> {
        info!(id = %portfolio.id, name = %portfolio.name, "applying portfolio");
        let actions = self.core.replace_blocks(portfolio.blocks);
        self.name = Some(portfolio.name);
        self.save().await?;
        Ok(actions)
    }
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
