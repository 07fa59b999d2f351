use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

/// A chat-style text generator: one system message, one user message.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate_text(&self, prompt: &str, system_prompt: &str) -> Result<String>;

    /// Text fragments in arrival order. Empty deltas are not yielded.
    fn chat_stream(&self, prompt: &str, system_prompt: &str) -> BoxStream<'static, Result<String>>;
}
