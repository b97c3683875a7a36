//! Wire shapes of the Compass API and their conversion into [`Record`]s.
//!
//! Field names follow the server's JSON exactly. Identity-bearing fields
//! (`filename`, `date`, `name`) are required so a truncated payload fails to
//! decode instead of producing records that cannot be selected; body fields
//! default to empty because the server sends `null` for unreadable files.

use serde::{Deserialize, Serialize};

use crate::model::preview::{self, DEFAULT_PREVIEW_CHARS};
use crate::model::{HarborCategory, Record, card_identity, harbor_identity};

/// The server's `preview` is the raw head of the note; list panels want text.
fn list_preview(raw: &str) -> String {
    preview::excerpt(raw, DEFAULT_PREVIEW_CHARS)
}

// ---------------------------------------------------------------------------
// Config / today
// ---------------------------------------------------------------------------

/// `GET /config/user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Card filenames created today, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TodayCards {
    pub insights: Vec<String>,
    pub fleeting: Vec<String>,
}

/// `GET /today`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayData {
    pub date: String,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub sounding: Option<String>,
    #[serde(default)]
    pub sounding_exists: bool,
    #[serde(default)]
    pub course_exists: bool,
    #[serde(default)]
    pub cards: TodayCards,
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// One logbook card as listed by `GET /cards`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    pub filename: String,
    #[serde(rename = "type")]
    pub card_type: String,
    pub date: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub preview: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardsResponse {
    #[serde(default)]
    pub date: String,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDates {
    pub dates: Vec<String>,
}

/// Body of `POST /cards/fleeting`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetingCardInput {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Response of `POST /cards/fleeting`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedCard {
    pub path: String,
    #[serde(default)]
    pub message: String,
}

impl From<Card> for Record {
    fn from(card: Card) -> Self {
        let mut record = Record::new(card_identity(&card.date, &card.filename), card.name)
            .with_preview(list_preview(&card.preview))
            .with_category(card.card_type)
            .with_date(card.date);
        record.full_content = card.content;
        record
    }
}

// ---------------------------------------------------------------------------
// Charts (soundings)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    pub date: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub preview: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsResponse {
    pub charts: Vec<Chart>,
}

/// `GET /charts/:date`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartDetail {
    pub date: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl From<Chart> for Record {
    fn from(chart: Chart) -> Self {
        let mut record = Record::new(chart.date.clone(), chart.date.clone())
            .with_preview(list_preview(&chart.preview))
            .with_date(chart.date);
        record.full_content = chart.content;
        record
    }
}

impl From<ChartDetail> for Record {
    fn from(detail: ChartDetail) -> Self {
        let content = detail.content.unwrap_or_default();
        Record::new(detail.date.clone(), detail.date.clone())
            .with_preview(preview::excerpt(&content, DEFAULT_PREVIEW_CHARS))
            .with_date(detail.date)
            .with_content(content)
    }
}

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub date: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub next: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoursesResponse {
    pub courses: Vec<Course>,
}

/// `GET /courses/:date`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDetail {
    pub date: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub next: String,
}

// ---------------------------------------------------------------------------
// Harbor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarborFile {
    pub name: String,
    pub filename: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub preview: String,
}

/// Harbor files grouped by category, as returned by `GET /harbor`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarborData {
    pub concepts: Vec<HarborFile>,
    pub frameworks: Vec<HarborFile>,
    pub companies: Vec<HarborFile>,
    pub people: Vec<HarborFile>,
    pub skills: Vec<HarborFile>,
}

impl HarborData {
    /// Consume the groups in tab order, keeping only `only` when given.
    pub fn into_files(self, only: Option<HarborCategory>) -> Vec<HarborFile> {
        let groups = [
            (HarborCategory::Concepts, self.concepts),
            (HarborCategory::Frameworks, self.frameworks),
            (HarborCategory::Companies, self.companies),
            (HarborCategory::People, self.people),
            (HarborCategory::Skills, self.skills),
        ];
        groups
            .into_iter()
            .filter(|(category, _)| only.is_none_or(|o| o == *category))
            .flat_map(|(_, files)| files)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarborResponse {
    pub harbor: HarborData,
}

/// `GET /harbor/:category/:filename`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarborFileDetail {
    pub category: String,
    pub filename: String,
    pub name: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl From<HarborFile> for Record {
    fn from(file: HarborFile) -> Self {
        let preview = if file.description.is_empty() {
            list_preview(&file.preview)
        } else {
            file.description
        };
        Record::new(harbor_identity(&file.category, &file.filename), file.name)
            .with_preview(preview)
            .with_category(file.category)
    }
}

impl From<HarborFileDetail> for Record {
    fn from(detail: HarborFileDetail) -> Self {
        let content = detail.content.unwrap_or_default();
        Record::new(
            harbor_identity(&detail.category, &detail.filename),
            detail.name,
        )
        .with_preview(preview::first_line(&content))
        .with_category(detail.category)
        .with_content(content)
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub filename: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub preview: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesResponse {
    pub templates: Vec<Template>,
}

impl From<Template> for Record {
    fn from(template: Template) -> Self {
        let mut record = Record::new(template.filename, template.name)
            .with_preview(list_preview(&template.preview));
        record.full_content = template.content;
        record
    }
}

// ---------------------------------------------------------------------------
// Map (daily canvas)
// ---------------------------------------------------------------------------

/// `GET /map`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapData {
    pub date: String,
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
