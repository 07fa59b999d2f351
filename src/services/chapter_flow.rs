use std::path::PathBuf;
use std::sync::Arc;

use async_stream::try_stream;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::error::Result;
use crate::prompt::{assemble, ChapterPrompt};
use crate::services::generation::GenerationClient;
use crate::storage::ChapterStore;
use crate::tables::WorldTables;

const SUMMARY_INSTRUCTION: &str =
    "请用一个简洁段落总结以下章节已发生的主要事件与走向，不要使用分点，不要补充未发生内容：";

pub fn summary_prompt(chapter_text: &str) -> String {
    format!("{SUMMARY_INSTRUCTION}\n\n{chapter_text}")
}

#[derive(Debug, Clone)]
pub struct GeneratedChapter {
    pub chapter_number: i64,
    pub title: String,
    pub text: String,
    pub path: PathBuf,
}

/// Load, assemble, generate, then persist the chapter and its summary.
#[derive(Clone)]
pub struct ChapterFlowService {
    data_dir: PathBuf,
    generation: Arc<GenerationClient>,
    store: Arc<ChapterStore>,
}

impl ChapterFlowService {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        generation: Arc<GenerationClient>,
        store: Arc<ChapterStore>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            generation,
            store,
        }
    }

    /// Reads the tables from disk and assembles the chapter prompt.
    pub fn prepare(&self, chapter_number: i64) -> Result<ChapterPrompt> {
        let tables = WorldTables::load(&self.data_dir)?;
        assemble(&tables, chapter_number)
    }

    /// Forwards generated fragments as they arrive. Persistence runs after the
    /// last fragment, before the stream ends.
    pub fn stream(&self, prepared: ChapterPrompt) -> BoxStream<'static, Result<String>> {
        let generation = self.generation.clone();
        let store = self.store.clone();

        Box::pin(try_stream! {
            let mut collected = String::new();
            let mut upstream = generation.stream(&prepared.text, prepared.chapter_number);
            while let Some(piece) = upstream.next().await {
                let piece = piece?;
                collected.push_str(&piece);
                yield piece;
            }
            persist(&generation, &store, &prepared, &collected).await?;
        })
    }

    pub async fn generate(&self, chapter_number: i64) -> Result<GeneratedChapter> {
        let prepared = self.prepare(chapter_number)?;
        let text = self
            .generation
            .generate(&prepared.text, chapter_number)
            .await?;
        let path = persist(&self.generation, &self.store, &prepared, &text).await?;
        Ok(GeneratedChapter {
            chapter_number,
            title: prepared.title,
            text,
            path,
        })
    }
}

async fn persist(
    generation: &GenerationClient,
    store: &ChapterStore,
    prepared: &ChapterPrompt,
    full_text: &str,
) -> Result<PathBuf> {
    let chapter_text = format!("{}\n\n{}", prepared.heading(), full_text);
    let path = store.save_chapter(prepared.chapter_number, &chapter_text)?;
    tracing::info!(
        chapter = prepared.chapter_number,
        bytes = chapter_text.len(),
        "saved chapter to {}",
        path.display()
    );

    let summary = generation
        .generate(&summary_prompt(full_text), prepared.chapter_number)
        .await?;
    store.append_summary(prepared.chapter_number, &prepared.title, &summary)?;
    tracing::info!(
        chapter = prepared.chapter_number,
        "appended summary to {}",
        store.summary_log().display()
    );
    Ok(path)
}
