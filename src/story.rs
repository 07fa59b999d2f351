//! Story-wide constraints prepended to every generation request: the global
//! outline and the stage description covering the requested chapter.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, WorldscribeError};
use crate::tables::find_stage;

pub const OUTLINE_SECTION: &str = "【总纲约束】";
pub const STAGE_SECTION: &str = "【阶段约束】";

/// Reads the global outline. A missing file is an empty outline.
pub fn load_story_overview(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }
    fs::read_to_string(path)
        .map_err(|e| WorldscribeError::Storage(format!("{}: {e}", path.display())))
}

/// Description of the first stage whose chapter range contains `chapter_number`.
pub fn load_stage_description(path: &Path, chapter_number: i64) -> Result<String> {
    let description = find_stage(path, chapter_number)?
        .map(|stage| stage.description)
        .unwrap_or_default();
    Ok(description)
}

/// Prefixes `prompt` with the outline and stage sections unless both are empty.
pub fn constrain_prompt(overview: &str, stage: &str, prompt: &str) -> String {
    if overview.is_empty() && stage.is_empty() {
        return prompt.to_string();
    }
    format!("{OUTLINE_SECTION}\n{overview}\n\n{STAGE_SECTION}\n{stage}\n\n{prompt}")
}

#[derive(Debug, Clone)]
pub struct StoryContext {
    overview_file: PathBuf,
    storyline_file: PathBuf,
}

impl StoryContext {
    pub fn new(overview_file: impl Into<PathBuf>, storyline_file: impl Into<PathBuf>) -> Self {
        Self {
            overview_file: overview_file.into(),
            storyline_file: storyline_file.into(),
        }
    }

    /// Both files are re-read on every call so edits apply to the next request.
    pub fn constrain(&self, prompt: &str, chapter_number: i64) -> Result<String> {
        let overview = load_story_overview(&self.overview_file)?;
        let stage = load_stage_description(&self.storyline_file, chapter_number)?;
        Ok(constrain_prompt(&overview, &stage, prompt))
    }
}
