//! Assembly of the per-chapter constraint prompt from the world tables.

use std::collections::HashSet;

use crate::domains::world::{Chapter, Character, Country, Event, Faction, TimelineEntry};
use crate::error::{Result, WorldscribeError};
use crate::tables::WorldTables;

pub const WORLD_SECTION: &str = "【世界背景约束】";
pub const TIMELINE_SECTION: &str = "【宏观时间线约束】";
pub const CHARACTER_SECTION: &str = "【人物表约束】";
pub const GOAL_SECTION: &str = "【章节目标约束】";
pub const EVENT_SECTION: &str = "【本章事件】";

const EVENT_INSTRUCTION: &str = "请将以下场景自然融合为一个完整叙事，不要使用小标题或编号：";
const CLOSING_INSTRUCTION: &str = "请根据以上约束生成完整章节正文，保持连贯叙事。";

/// Chapter heading used for the prompt, the saved chapter file and the summary log.
pub fn chapter_heading(chapter_number: i64, title: &str) -> String {
    format!("# 第{chapter_number}章 {title}")
}

#[derive(Debug, Clone)]
pub struct ChapterPrompt {
    pub chapter_number: i64,
    pub title: String,
    pub text: String,
}

impl ChapterPrompt {
    pub fn heading(&self) -> String {
        chapter_heading(self.chapter_number, &self.title)
    }
}

/// The rows of every table that take part in one chapter.
#[derive(Debug)]
pub struct ChapterCast<'a> {
    pub chapter: &'a Chapter,
    pub events: Vec<&'a Event>,
    pub characters: Vec<&'a Character>,
    pub countries: Vec<&'a Country>,
    pub factions: Vec<&'a Faction>,
    pub timeline: Vec<&'a TimelineEntry>,
}

impl<'a> ChapterCast<'a> {
    pub fn collect(tables: &'a WorldTables, chapter_number: i64) -> Result<Self> {
        let chapter_id = chapter_number.to_string();
        let chapter = tables
            .chapters
            .get(&chapter_id)
            .ok_or(WorldscribeError::ChapterNotFound(chapter_number))?;

        let mut events: Vec<&Event> = tables
            .events
            .iter()
            .filter(|event| event.chapter_id == chapter_id)
            .collect();
        events.sort_by_key(|event| event.order_in_chapter);

        // Substring containment, not an exact name match: a short name that
        // occurs inside a longer participant name also counts as involved.
        let participants = events
            .iter()
            .map(|event| event.participant_string())
            .collect::<Vec<_>>()
            .join(";");
        let characters: Vec<&Character> = tables
            .characters
            .iter()
            .filter(|character| participants.contains(character.canonical_name.as_str()))
            .collect();

        let country_ids: HashSet<&str> = characters
            .iter()
            .map(|character| character.country_id.as_str())
            .collect();
        let countries: Vec<&Country> = tables
            .countries
            .iter()
            .filter(|country| country_ids.contains(country.country_id.as_str()))
            .collect();

        let faction_ids: HashSet<&str> = countries
            .iter()
            .map(|country| country.faction_id.as_str())
            .collect();
        let factions: Vec<&Faction> = tables
            .factions
            .iter()
            .filter(|faction| faction_ids.contains(faction.faction_id.as_str()))
            .collect();

        let time_points: HashSet<(i32, u32)> =
            events.iter().map(|event| event.time_point()).collect();
        let mut timeline: Vec<&TimelineEntry> = Vec::new();
        for entry in &tables.timeline {
            if time_points.contains(&entry.time_point()?) {
                timeline.push(entry);
            }
        }

        Ok(Self {
            chapter,
            events,
            characters,
            countries,
            factions,
            timeline,
        })
    }
}

pub fn assemble(tables: &WorldTables, chapter_number: i64) -> Result<ChapterPrompt> {
    let cast = ChapterCast::collect(tables, chapter_number)?;
    let title = cast.chapter.chapter_title.clone();

    let mut text = chapter_heading(chapter_number, &title);
    text.push('\n');
    render_world(&mut text, tables, &cast);
    render_timeline(&mut text, &cast);
    render_characters(&mut text, tables, &cast);
    render_goal(&mut text, cast.chapter);
    render_events(&mut text, &cast.events);
    text.push('\n');
    text.push_str(CLOSING_INSTRUCTION);

    tracing::debug!(
        chapter = chapter_number,
        events = cast.events.len(),
        characters = cast.characters.len(),
        timeline = cast.timeline.len(),
        "assembled chapter prompt"
    );

    Ok(ChapterPrompt {
        chapter_number,
        title,
        text,
    })
}

fn open_section(out: &mut String, section: &str) {
    out.push('\n');
    out.push_str(section);
    out.push('\n');
}

fn render_world(out: &mut String, tables: &WorldTables, cast: &ChapterCast<'_>) {
    open_section(out, WORLD_SECTION);
    for faction in &cast.factions {
        out.push_str(&format!(
            "阵营 {}，核心科技：{}，意识形态：{}。\n",
            faction.name, faction.core_tech, faction.ideology
        ));
    }
    for country in &cast.countries {
        let affiliation = tables
            .factions
            .get(&country.faction_id)
            .map(|faction| format!("（隶属阵营：{}）", faction.name))
            .unwrap_or_default();
        out.push_str(&format!(
            "国家 {}{}，政体：{}，媒体生态：{}，立场：{}。\n",
            country.name, affiliation, country.regime, country.media_ecology, country.alignment
        ));
    }
}

fn render_timeline(out: &mut String, cast: &ChapterCast<'_>) {
    open_section(out, TIMELINE_SECTION);
    for entry in &cast.timeline {
        out.push_str(&format!(
            "{}年{}月，{}，{}，{}：{}。\n",
            entry.year, entry.month, entry.location, entry.actors, entry.event_type, entry.impact
        ));
    }
}

fn render_characters(out: &mut String, tables: &WorldTables, cast: &ChapterCast<'_>) {
    open_section(out, CHARACTER_SECTION);
    for character in &cast.characters {
        let country = tables.countries.get(&character.country_id);
        let faction = country.and_then(|country| tables.factions.get(&country.faction_id));
        let allegiance = match (country, faction) {
            (Some(country), Some(faction)) => {
                format!("国家：{}（阵营：{}），", country.name, faction.name)
            }
            (Some(country), None) => format!("国家：{}，", country.name),
            _ => String::new(),
        };
        out.push_str(&format!(
            "- {}（可用称呼：{}），{}职业：{}，性格：{}\n",
            character.canonical_name,
            character.title_list().join(","),
            allegiance,
            character.profession,
            character.personality
        ));
    }
}

fn render_goal(out: &mut String, chapter: &Chapter) {
    open_section(out, GOAL_SECTION);
    out.push_str(&format!("必须在结尾体现：{}\n", chapter.chapter_goal));
    out.push_str(&format!("章节氛围：{}\n", chapter.chapter_tone));
}

fn render_events(out: &mut String, events: &[&Event]) {
    open_section(out, EVENT_SECTION);
    out.push_str(EVENT_INSTRUCTION);
    out.push('\n');
    let scenes: Vec<String> = events
        .iter()
        .map(|event| {
            format!(
                "在{}年{}月的{}，涉及人物：{}，这是一次{}场面，事件结束后局势变化：{}",
                event.year,
                event.month,
                event.location,
                event.participants.join("、"),
                event.scene_type,
                event.plot_direction
            )
        })
        .collect();
    out.push_str(&scenes.join("；"));
    out.push_str("。\n");
}

/// Returns the lines of `prompt` between `section` and the next section marker.
pub fn section_lines<'a>(prompt: &'a str, section: &str) -> Vec<&'a str> {
    prompt
        .lines()
        .skip_while(|line| *line != section)
        .skip(1)
        .take_while(|line| !line.starts_with('【'))
        .filter(|line| !line.trim().is_empty())
        .collect()
}
