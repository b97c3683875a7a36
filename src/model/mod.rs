//! Record model shared by the gateway, the controller and the shell.
//!
//! Every list the API returns (cards, soundings, harbor files, templates) is
//! normalized into a flat [`Record`] so one controller can drive all of them.
//! Identities are strings that are unique within a single list response:
//!
//! | Resource       | Identity                 |
//! |----------------|--------------------------|
//! | `cards`        | `{date}/{filename}`      |
//! | `charts`       | `{date}`                 |
//! | `harbor-files` | `{category}/{filename}`  |
//! | `templates`    | `{filename}`             |

pub mod preview;

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// The fixed set of list resources the gateway knows how to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Cards,
    Charts,
    HarborFiles,
    Templates,
}

impl Resource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cards => "cards",
            Self::Charts => "charts",
            Self::HarborFiles => "harbor-files",
            Self::Templates => "templates",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Card type / harbor category
// ---------------------------------------------------------------------------

/// Logbook card kind, mirrors the `type` query parameter of `GET /cards`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Insights,
    Fleeting,
}

impl CardType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insights => "insights",
            Self::Fleeting => "fleeting",
        }
    }

    pub fn parse(val: &str) -> Option<Self> {
        match val.to_ascii_lowercase().as_str() {
            "insights" | "insight" | "i" => Some(Self::Insights),
            "fleeting" | "f" => Some(Self::Fleeting),
            _ => None,
        }
    }

    /// Single-letter badge shown next to a card in the list.
    pub fn badge(self) -> &'static str {
        match self {
            Self::Insights => "I",
            Self::Fleeting => "F",
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Harbor reference document category, in tab order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarborCategory {
    #[default]
    Concepts,
    Frameworks,
    Companies,
    People,
    Skills,
}

impl HarborCategory {
    pub const ALL: [HarborCategory; 5] = [
        HarborCategory::Concepts,
        HarborCategory::Frameworks,
        HarborCategory::Companies,
        HarborCategory::People,
        HarborCategory::Skills,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Concepts => "concepts",
            Self::Frameworks => "frameworks",
            Self::Companies => "companies",
            Self::People => "people",
            Self::Skills => "skills",
        }
    }

    pub fn parse(val: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(val.trim()))
    }
}

impl fmt::Display for HarborCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One entry of a list view.
///
/// Records are values: a detail fetch produces a new record that replaces
/// the old one in the list, it never mutates it in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub identity: String,
    pub display_name: String,
    pub preview_text: String,
    /// Markdown body. `None` until the list payload or a detail fetch
    /// provides it.
    pub full_content: Option<String>,
    /// Card type or harbor category.
    pub category: Option<String>,
    pub date: Option<String>,
}

impl Record {
    pub fn new(identity: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            display_name: display_name.into(),
            preview_text: String::new(),
            full_content: None,
            category: None,
            date: None,
        }
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview_text = preview.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.full_content = Some(content.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Whether the Markdown body is already available.
    pub fn has_content(&self) -> bool {
        self.full_content.is_some()
    }

    /// Combine this list entry with a detail response for the same identity.
    ///
    /// The detail's body wins; list-level fields are kept unless the list
    /// entry left them blank.
    pub fn merged_with(&self, detail: Record) -> Record {
        Record {
            identity: self.identity.clone(),
            display_name: if self.display_name.is_empty() {
                detail.display_name
            } else {
                self.display_name.clone()
            },
            preview_text: if self.preview_text.is_empty() {
                detail.preview_text
            } else {
                self.preview_text.clone()
            },
            full_content: detail.full_content.or_else(|| self.full_content.clone()),
            category: self.category.clone().or(detail.category),
            date: self.date.clone().or(detail.date),
        }
    }
}

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// Identity of a logbook card: `{date}/{filename}`.
pub fn card_identity(date: &str, filename: &str) -> String {
    format!("{date}/{filename}")
}

/// Identity of a harbor file: `{category}/{filename}`.
pub fn harbor_identity(category: &str, filename: &str) -> String {
    format!("{category}/{filename}")
}

/// Split a two-part identity at its first `/`.
pub fn split_identity(identity: &str) -> Option<(&str, &str)> {
    let (head, tail) = identity.split_once('/')?;
    if head.is_empty() || tail.is_empty() {
        return None;
    }
    Some((head, tail))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_display_is_kebab_case() {
        assert_eq!(Resource::HarborFiles.to_string(), "harbor-files");
        assert_eq!(Resource::Cards.to_string(), "cards");
    }

    #[test]
    fn harbor_category_order_matches_tabs() {
        let names: Vec<_> = HarborCategory::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(
            names,
            ["concepts", "frameworks", "companies", "people", "skills"]
        );
        assert_eq!(HarborCategory::parse(" People "), Some(HarborCategory::People));
    }

    #[test]
    fn card_type_parse_and_badge() {
        assert_eq!(CardType::parse("insight"), Some(CardType::Insights));
        assert_eq!(CardType::parse("FLEETING"), Some(CardType::Fleeting));
        assert_eq!(CardType::parse("all"), None);
        assert_eq!(CardType::Insights.badge(), "I");
    }

    #[test]
    fn split_identity_requires_both_halves() {
        assert_eq!(
            split_identity("concepts/flow.md"),
            Some(("concepts", "flow.md"))
        );
        assert_eq!(
            split_identity("2024-05-01/a b.md"),
            Some(("2024-05-01", "a b.md"))
        );
        assert_eq!(split_identity("flow.md"), None);
        assert_eq!(split_identity("/flow.md"), None);
    }

    #[test]
    fn merged_with_takes_detail_body_and_keeps_list_fields() {
        let listed = Record::new("concepts/flow.md", "flow")
            .with_preview("Flow state")
            .with_category("concepts");
        let detail = Record::new("concepts/flow.md", "flow-detail")
            .with_content("# Flow\n\nDeep work.")
            .with_preview("ignored");

        let merged = listed.merged_with(detail);
        assert_eq!(merged.display_name, "flow");
        assert_eq!(merged.preview_text, "Flow state");
        assert_eq!(merged.full_content.as_deref(), Some("# Flow\n\nDeep work."));
        assert_eq!(merged.category.as_deref(), Some("concepts"));
        // the original list entry is untouched
        assert!(!listed.has_content());
    }
}
