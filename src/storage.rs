//! File persistence of generated chapters and the rolling summary log.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, WorldscribeError};

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| WorldscribeError::Storage(e.to_string()))?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ChapterStore {
    chapters_dir: PathBuf,
    summary_log: PathBuf,
}

impl ChapterStore {
    pub fn new(chapters_dir: impl Into<PathBuf>, summary_log: impl Into<PathBuf>) -> Self {
        Self {
            chapters_dir: chapters_dir.into(),
            summary_log: summary_log.into(),
        }
    }

    pub fn chapter_path(&self, chapter_number: i64) -> PathBuf {
        self.chapters_dir.join(format!("chapter_{chapter_number}.md"))
    }

    pub fn summary_log(&self) -> &Path {
        &self.summary_log
    }

    /// Writes the chapter file, replacing any earlier text for the same number.
    pub fn save_chapter(&self, chapter_number: i64, text: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.chapters_dir)
            .map_err(|e| WorldscribeError::Storage(e.to_string()))?;
        let path = self.chapter_path(chapter_number);
        fs::write(&path, text)
            .map_err(|e| WorldscribeError::Storage(format!("{}: {e}", path.display())))?;
        Ok(path)
    }

    /// Appends one summary block; earlier blocks are never rewritten.
    pub fn append_summary(&self, chapter_number: i64, title: &str, summary: &str) -> Result<()> {
        ensure_parent_dir(&self.summary_log)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.summary_log)
            .map_err(|e| WorldscribeError::Storage(e.to_string()))?;
        let block = format!("## 第{chapter_number}章 {title}\n{summary}\n\n");
        file.write_all(block.as_bytes())
            .map_err(|e| WorldscribeError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Concatenates the stored chapters numbered below `upto`, skipping gaps.
    pub fn load_previous_chapters(&self, upto: i64) -> Result<String> {
        let mut text = String::new();
        for number in 1..upto {
            let path = self.chapter_path(number);
            if !path.exists() {
                continue;
            }
            let chapter = fs::read_to_string(&path)
                .map_err(|e| WorldscribeError::Storage(format!("{}: {e}", path.display())))?;
            text.push_str(&chapter);
            text.push_str("\n\n");
        }
        Ok(text)
    }
}
