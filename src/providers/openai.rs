use async_stream::try_stream;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
    Client,
};

use crate::config::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::error::{Result, WorldscribeError};
use crate::interfaces::providers::LlmProvider;

#[derive(Clone)]
pub struct OpenAiProvider {
    model: String,
    client: Client<OpenAIConfig>,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Self {
            model,
            client: Client::with_config(config),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_system_message(system_prompt: &str) -> Result<Option<ChatCompletionRequestMessage>> {
        if system_prompt.is_empty() {
            return Ok(None);
        }
        let message = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt)
            .build()
            .map_err(|e| WorldscribeError::Runtime(e.to_string()))?;
        Ok(Some(ChatCompletionRequestMessage::System(message)))
    }

    fn build_user_text_message(prompt: &str) -> Result<ChatCompletionRequestMessage> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Text(
                prompt.to_string(),
            ))
            .build()
            .map_err(|e| WorldscribeError::Runtime(e.to_string()))?;
        Ok(ChatCompletionRequestMessage::User(message))
    }

    fn build_request(
        &self,
        prompt: &str,
        system_prompt: &str,
        stream: bool,
    ) -> Result<CreateChatCompletionRequest> {
        let mut messages = Vec::new();
        if let Some(system) = Self::build_system_message(system_prompt)? {
            messages.push(system);
        }
        messages.push(Self::build_user_text_message(prompt)?);

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(self.model.clone());
        builder.messages(messages);
        if stream {
            builder.stream(true);
        }

        builder
            .build()
            .map_err(|e| WorldscribeError::Runtime(e.to_string()))
    }

    fn extract_text_from_response(
        response: &async_openai::types::chat::CreateChatCompletionResponse,
    ) -> Result<String> {
        let message = response
            .choices
            .first()
            .ok_or_else(|| WorldscribeError::Runtime("No choices returned".to_string()))?
            .message
            .content
            .clone()
            .unwrap_or_default();
        Ok(message)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate_text(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        let request = self.build_request(prompt, system_prompt, false)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| WorldscribeError::Http(e.to_string()))?;

        Self::extract_text_from_response(&response)
    }

    fn chat_stream(&self, prompt: &str, system_prompt: &str) -> BoxStream<'static, Result<String>> {
        let provider = self.clone();
        let prompt = prompt.to_string();
        let system_prompt = system_prompt.to_string();

        Box::pin(try_stream! {
            let request = provider.build_request(&prompt, &system_prompt, true)?;
            let mut upstream = provider
                .client
                .chat()
                .create_stream(request)
                .await
                .map_err(|e| WorldscribeError::Http(e.to_string()))?;

            while let Some(chunk) = upstream.next().await {
                let chunk = chunk.map_err(|e| WorldscribeError::Http(e.to_string()))?;
                let piece = chunk
                    .choices
                    .first()
                    .and_then(|choice| choice.delta.content.clone())
                    .unwrap_or_default();
                if !piece.is_empty() {
                    yield piece;
                }
            }
        })
    }
}
