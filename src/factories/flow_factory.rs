use std::sync::Arc;

use crate::config::Config;
use crate::error::{Result, WorldscribeError};
use crate::interfaces::providers::LlmProvider;
use crate::providers::openai::OpenAiProvider;
use crate::services::chapter_flow::ChapterFlowService;
use crate::services::generation::GenerationClient;
use crate::storage::ChapterStore;
use crate::story::StoryContext;

pub struct ChapterFlowFactory;

impl ChapterFlowFactory {
    pub fn create_from_config(config: Config) -> Result<ChapterFlowService> {
        let openai = config.openai.clone().ok_or_else(|| {
            WorldscribeError::Config("Missing openai configuration".to_string())
        })?;
        let api_key = openai
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| WorldscribeError::Config("Missing API key".to_string()))?;

        let llm = Arc::new(OpenAiProvider::new(api_key, openai.model, openai.base_url));
        tracing::info!(model = llm.model(), "using OpenAI-compatible provider");
        Ok(Self::create_with_provider(config, llm))
    }

    pub fn create_with_provider(config: Config, llm: Arc<dyn LlmProvider>) -> ChapterFlowService {
        let paths = config.data_paths();
        let story = StoryContext::new(paths.overview_file, paths.storyline_file);
        let generation = Arc::new(GenerationClient::new(llm, story, config.system_prompt()));
        let store = Arc::new(ChapterStore::new(paths.chapters_dir, paths.summary_log));
        ChapterFlowService::new(paths.data_dir, generation, store)
    }
}
