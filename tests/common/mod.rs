#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::BoxStream;

use worldscribe::config::{Config, DataConfig};
use worldscribe::error::Result;
use worldscribe::interfaces::providers::LlmProvider;

pub const FACTIONS: &str = "faction_id,name,core_tech,ideology,notes\n\
F1,曙光联盟,量子通信,技术自由主义,\n";

pub const COUNTRIES: &str =
    "country_id,name,regime,media_ecology,alignment,faction_id,notes\n\
C1,北陆共和国,议会制,多元媒体,温和派,F1,\n";

pub const CHARACTERS: &str =
    "character_id,canonical_name,titles,age,profession,personality,country_id,notes\n\
P1,林远,林工;老林,42,工程师,沉稳,C1,\n";

pub const CHAPTERS: &str = "chapter_id,chapter_title,chapter_goal,chapter_tone,notes\n\
1,裂隙,主角决定公开数据,压抑,\n";

pub const EVENTS: &str =
    "event_id,chapter_id,order_in_chapter,year,month,location,characters,scene_type,plot_direction\n\
E1,1,1,2031,4,港口,P1,对峙,局势升级\n";

pub const TIMELINE: &str = "year,month,location,actors,event_type,impact\n\
2031,4,港口,北陆海军,封锁,航运中断\n";

/// Writes the single-row world into `data_dir`.
pub fn write_world(data_dir: &Path) {
    write_tables(data_dir, FACTIONS, COUNTRIES, CHARACTERS, CHAPTERS, EVENTS, TIMELINE);
}

pub fn write_tables(
    data_dir: &Path,
    factions: &str,
    countries: &str,
    characters: &str,
    chapters: &str,
    events: &str,
    timeline: &str,
) {
    fs::create_dir_all(data_dir).unwrap();
    fs::write(data_dir.join("factions.csv"), factions).unwrap();
    fs::write(data_dir.join("countries.csv"), countries).unwrap();
    fs::write(data_dir.join("characters.csv"), characters).unwrap();
    fs::write(data_dir.join("chapters.csv"), chapters).unwrap();
    fs::write(data_dir.join("events.csv"), events).unwrap();
    fs::write(data_dir.join("timeline.csv"), timeline).unwrap();
}

pub fn config_rooted_at(root: &Path) -> Config {
    let path = |rel: &str| Some(root.join(rel).to_string_lossy().into_owned());
    Config {
        openai: None,
        data: Some(DataConfig {
            data_dir: path("data"),
            chapters_dir: path("chapters"),
            overview_file: path("data/story_overview.md"),
            storyline_file: path("data/storyline.csv"),
            summary_log: path("data/storyline.md"),
        }),
        system_prompt: None,
    }
}

/// Streams fixed fragments and answers single-shot calls from a queue,
/// recording every prompt it receives.
pub struct ScriptedProvider {
    fragments: Vec<String>,
    replies: Mutex<Vec<String>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(fragments: &[&str], replies: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate_text(&self, prompt: &str, _system_prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| "summary".to_string()))
    }

    fn chat_stream(
        &self,
        prompt: &str,
        _system_prompt: &str,
    ) -> BoxStream<'static, Result<String>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let items: Vec<Result<String>> = self.fragments.iter().cloned().map(Ok).collect();
        Box::pin(futures::stream::iter(items))
    }
}
