use serde::{Deserialize, Serialize};

use crate::error::{Result, WorldscribeError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faction {
    pub faction_id: String,
    pub name: String,
    pub core_tech: String,
    pub ideology: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub country_id: String,
    pub name: String,
    pub regime: String,
    pub media_ecology: String,
    pub alignment: String,
    pub faction_id: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub character_id: String,
    pub canonical_name: String,
    /// Semicolon-delimited.
    pub titles: String,
    pub age: String,
    pub profession: String,
    pub personality: String,
    pub country_id: String,
    #[serde(default)]
    pub notes: String,
}

impl Character {
    pub fn title_list(&self) -> Vec<&str> {
        self.titles.split(';').collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub chapter_id: String,
    pub chapter_title: String,
    pub chapter_goal: String,
    pub chapter_tone: String,
    #[serde(default)]
    pub notes: String,
}

/// An `events.csv` row as stored: participants are character ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRow {
    pub event_id: String,
    pub chapter_id: String,
    pub order_in_chapter: i64,
    pub year: i32,
    pub month: u32,
    pub location: String,
    pub characters: String,
    pub scene_type: String,
    pub plot_direction: String,
}

/// An event whose participants have been resolved to canonical names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub chapter_id: String,
    pub order_in_chapter: i64,
    pub year: i32,
    pub month: u32,
    pub location: String,
    pub participants: Vec<String>,
    pub scene_type: String,
    pub plot_direction: String,
}

impl Event {
    pub fn participant_string(&self) -> String {
        self.participants.join(";")
    }

    pub fn time_point(&self) -> (i32, u32) {
        (self.year, self.month)
    }
}

/// A `timeline.csv` row. Year and month keep their cell text for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub year: String,
    pub month: String,
    pub location: String,
    pub actors: String,
    pub event_type: String,
    pub impact: String,
}

impl TimelineEntry {
    pub fn time_point(&self) -> Result<(i32, u32)> {
        let year = self.year.trim().parse().map_err(|e| {
            WorldscribeError::Serialization(format!("timeline year {:?}: {e}", self.year))
        })?;
        let month = self.month.trim().parse().map_err(|e| {
            WorldscribeError::Serialization(format!("timeline month {:?}: {e}", self.month))
        })?;
        Ok((year, month))
    }
}

/// A `storyline.csv` row: a stage description covering an inclusive chapter range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRow {
    pub start_chapter: i64,
    pub end_chapter: i64,
    pub description: String,
}

impl StageRow {
    pub fn covers(&self, chapter_number: i64) -> bool {
        self.start_chapter <= chapter_number && chapter_number <= self.end_chapter
    }
}
