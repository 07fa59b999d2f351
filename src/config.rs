use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, WorldscribeError};

pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_SYSTEM_PROMPT: &str = "你是一个小说写作助手";

const API_KEY_ENV_VARS: [&str; 2] = ["DEEPSEEK_API_KEY", "OPENAI_API_KEY"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Locations of the world tables and of everything the chapter flow writes.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DataConfig {
    pub data_dir: Option<String>,
    pub chapters_dir: Option<String>,
    pub overview_file: Option<String>,
    pub storyline_file: Option<String>,
    pub summary_log: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DataPaths {
    pub data_dir: PathBuf,
    pub chapters_dir: PathBuf,
    pub overview_file: PathBuf,
    pub storyline_file: PathBuf,
    pub summary_log: PathBuf,
}

impl DataConfig {
    pub fn resolve(&self) -> DataPaths {
        let pick = |value: &Option<String>, default: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        };
        DataPaths {
            data_dir: pick(&self.data_dir, "data"),
            chapters_dir: pick(&self.chapters_dir, "chapters"),
            overview_file: pick(&self.overview_file, "data/story_overview.md"),
            storyline_file: pick(&self.storyline_file, "data/storyline.csv"),
            summary_log: pick(&self.summary_log, "data/storyline.md"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub openai: Option<OpenAiConfig>,
    pub data: Option<DataConfig>,
    pub system_prompt: Option<String>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| WorldscribeError::Config(format!("{}: {e}", path.as_ref().display())))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| WorldscribeError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Fills a missing API key from the environment.
    pub fn resolve_env(mut self) -> Self {
        let openai = self.openai.get_or_insert_with(OpenAiConfig::default);
        if openai
            .api_key
            .as_deref()
            .map(|key| key.trim().is_empty())
            .unwrap_or(true)
        {
            openai.api_key = API_KEY_ENV_VARS
                .iter()
                .find_map(|name| std::env::var(name).ok())
                .filter(|key| !key.trim().is_empty());
        }
        self
    }

    pub fn data_paths(&self) -> DataPaths {
        self.data.clone().unwrap_or_default().resolve()
    }

    pub fn system_prompt(&self) -> String {
        self.system_prompt
            .clone()
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
    }
}
