use std::path::Path;
use std::sync::Arc;

use futures::stream::BoxStream;

use crate::config::Config;
use crate::error::Result;
use crate::factories::flow_factory::ChapterFlowFactory;
use crate::interfaces::providers::LlmProvider;
use crate::prompt::ChapterPrompt;
use crate::services::chapter_flow::{ChapterFlowService, GeneratedChapter};

pub struct Worldscribe {
    flow: ChapterFlowService,
}

impl Worldscribe {
    pub fn from_config(config: Config) -> Result<Self> {
        let flow = ChapterFlowFactory::create_from_config(config.resolve_env())?;
        Ok(Self { flow })
    }

    pub fn from_config_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::from_file(path)?;
        Self::from_config(config)
    }

    pub fn with_provider(config: Config, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            flow: ChapterFlowFactory::create_with_provider(config, provider),
        }
    }

    pub fn prepare_chapter(&self, chapter_number: i64) -> Result<ChapterPrompt> {
        self.flow.prepare(chapter_number)
    }

    pub fn stream_chapter(&self, prepared: ChapterPrompt) -> BoxStream<'static, Result<String>> {
        self.flow.stream(prepared)
    }

    pub async fn generate_chapter(&self, chapter_number: i64) -> Result<GeneratedChapter> {
        self.flow.generate(chapter_number).await
    }
}
