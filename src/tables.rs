//! Loading of the world tables from CSV files.
//!
//! Tables are read fresh for every request. Keyed tables keep file order for
//! iteration so rendered sections follow the order rows appear on disk.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::domains::world::{
    Chapter, Character, Country, Event, EventRow, Faction, StageRow, TimelineEntry,
};
use crate::error::{Result, WorldscribeError};

pub const FACTIONS_FILE: &str = "factions.csv";
pub const COUNTRIES_FILE: &str = "countries.csv";
pub const CHARACTERS_FILE: &str = "characters.csv";
pub const CHAPTERS_FILE: &str = "chapters.csv";
pub const TIMELINE_FILE: &str = "timeline.csv";
pub const EVENTS_FILE: &str = "events.csv";

pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Faction {
    fn key(&self) -> &str {
        &self.faction_id
    }
}

impl Keyed for Country {
    fn key(&self) -> &str {
        &self.country_id
    }
}

impl Keyed for Character {
    fn key(&self) -> &str {
        &self.character_id
    }
}

impl Keyed for Chapter {
    fn key(&self) -> &str {
        &self.chapter_id
    }
}

/// Rows indexed by their identifier.
///
/// A repeated identifier keeps the slot of its first occurrence and takes the
/// values of the last one.
#[derive(Debug, Clone)]
pub struct Table<T> {
    rows: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Keyed> Table<T> {
    pub fn from_rows(rows: impl IntoIterator<Item = T>) -> Self {
        let mut table = Self {
            rows: Vec::new(),
            index: HashMap::new(),
        };
        for row in rows {
            match table.index.get(row.key()) {
                Some(&slot) => table.rows[slot] = row,
                None => {
                    table.index.insert(row.key().to_string(), table.rows.len());
                    table.rows.push(row);
                }
            }
        }
        table
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&slot| &self.rows[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Rows may leave out trailing optional columns such as `notes`.
fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| WorldscribeError::Storage(format!("{}: {e}", path.display())))
}

fn row_error(path: &Path, err: csv::Error) -> WorldscribeError {
    WorldscribeError::Serialization(format!("{}: {err}", path.display()))
}

pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = open_reader(path)?;
    reader
        .deserialize::<T>()
        .map(|row| row.map_err(|e| row_error(path, e)))
        .collect()
}

/// Resolves the character ids of each event row to canonical names. Ids with
/// no matching character are dropped.
pub fn resolve_events(rows: Vec<EventRow>, characters: &Table<Character>) -> Vec<Event> {
    rows.into_iter()
        .map(|row| {
            let participants = row
                .characters
                .split(';')
                .filter_map(|id| characters.get(id))
                .map(|character| character.canonical_name.clone())
                .collect();
            Event {
                event_id: row.event_id,
                chapter_id: row.chapter_id,
                order_in_chapter: row.order_in_chapter,
                year: row.year,
                month: row.month,
                location: row.location,
                participants,
                scene_type: row.scene_type,
                plot_direction: row.plot_direction,
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct WorldTables {
    pub factions: Table<Faction>,
    pub countries: Table<Country>,
    pub characters: Table<Character>,
    pub chapters: Table<Chapter>,
    pub timeline: Vec<TimelineEntry>,
    pub events: Vec<Event>,
}

impl WorldTables {
    pub fn load<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let dir = data_dir.as_ref();
        let factions = Table::from_rows(read_rows::<Faction>(&dir.join(FACTIONS_FILE))?);
        let countries = Table::from_rows(read_rows::<Country>(&dir.join(COUNTRIES_FILE))?);
        let characters = Table::from_rows(read_rows::<Character>(&dir.join(CHARACTERS_FILE))?);
        let chapters = Table::from_rows(read_rows::<Chapter>(&dir.join(CHAPTERS_FILE))?);
        let timeline = read_rows::<TimelineEntry>(&dir.join(TIMELINE_FILE))?;
        let events = resolve_events(read_rows::<EventRow>(&dir.join(EVENTS_FILE))?, &characters);

        tracing::debug!(
            factions = factions.len(),
            countries = countries.len(),
            characters = characters.len(),
            chapters = chapters.len(),
            timeline = timeline.len(),
            events = events.len(),
            "loaded world tables from {}",
            dir.display()
        );

        Ok(Self {
            factions,
            countries,
            characters,
            chapters,
            timeline,
            events,
        })
    }
}

/// Scans the stage table for the first row covering `chapter_number`. Rows
/// after the match are not read. A missing file yields no stage.
pub fn find_stage(path: &Path, chapter_number: i64) -> Result<Option<StageRow>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut reader = open_reader(path)?;
    for row in reader.deserialize::<StageRow>() {
        let stage = row.map_err(|e| row_error(path, e))?;
        if stage.covers(chapter_number) {
            return Ok(Some(stage));
        }
    }
    Ok(None)
}
