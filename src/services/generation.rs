use std::sync::Arc;

use async_stream::try_stream;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::error::Result;
use crate::interfaces::providers::LlmProvider;
use crate::story::StoryContext;

/// Sends prompts to the provider with the story context for the chapter
/// prepended.
#[derive(Clone)]
pub struct GenerationClient {
    provider: Arc<dyn LlmProvider>,
    story: StoryContext,
    system_prompt: String,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn LlmProvider>, story: StoryContext, system_prompt: String) -> Self {
        Self {
            provider,
            story,
            system_prompt,
        }
    }

    pub async fn generate(&self, prompt: &str, chapter_number: i64) -> Result<String> {
        let prompt = self.story.constrain(prompt, chapter_number)?;
        self.provider
            .generate_text(&prompt, &self.system_prompt)
            .await
    }

    /// Lazy: nothing is read or sent until the stream is first polled.
    pub fn stream(&self, prompt: &str, chapter_number: i64) -> BoxStream<'static, Result<String>> {
        let provider = self.provider.clone();
        let story = self.story.clone();
        let system_prompt = self.system_prompt.clone();
        let prompt = prompt.to_string();

        Box::pin(try_stream! {
            let prompt = story.constrain(&prompt, chapter_number)?;
            let mut upstream = provider.chat_stream(&prompt, &system_prompt);
            while let Some(piece) = upstream.next().await {
                let piece = piece?;
                if !piece.is_empty() {
                    yield piece;
                }
            }
        })
    }
}
