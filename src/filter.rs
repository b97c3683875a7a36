//! Secondary filter composition.
//!
//! Views expose a handful of UI controls (a date picker, the
//! All/Insight/Fleeting type tabs, the harbor category tabs). Those controls
//! live in [`UiFilterState`]; the controller only ever sees the canonical
//! [`Filter`] composed from them.
//!
//! Composition is a pure function. Identical UI state always produces a
//! value-equal `Filter`, which is what lets the controller skip a refetch
//! when nothing visible changed.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{CardType, HarborCategory};

// ---------------------------------------------------------------------------
// Canonical filter
// ---------------------------------------------------------------------------

/// Query parameters that determine which records a list fetch asks for.
///
/// Every field is optional; `None` leaves that dimension unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Filter {
    pub date: Option<String>,
    pub card_type: Option<CardType>,
    pub category: Option<HarborCategory>,
}

impl Filter {
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = normalize(Some(date.into()));
        self
    }

    pub fn with_card_type(mut self, card_type: CardType) -> Self {
        self.card_type = Some(card_type);
        self
    }

    pub fn with_category(mut self, category: HarborCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// True when no field constrains the query.
    pub fn is_unconstrained(&self) -> bool {
        self.date.is_none() && self.card_type.is_none() && self.category.is_none()
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(date) = &self.date {
            parts.push(format!("date={date}"));
        }
        if let Some(card_type) = self.card_type {
            parts.push(format!("type={card_type}"));
        }
        if let Some(category) = self.category {
            parts.push(format!("category={category}"));
        }
        if parts.is_empty() {
            write!(f, "(all)")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}

// ---------------------------------------------------------------------------
// UI state
// ---------------------------------------------------------------------------

/// The logbook's All / Insight / Fleeting tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TypeTab {
    #[default]
    All,
    Insights,
    Fleeting,
}

impl TypeTab {
    pub const ALL: [TypeTab; 3] = [TypeTab::All, TypeTab::Insights, TypeTab::Fleeting];

    /// The card type this tab constrains to; `All` constrains nothing.
    pub fn card_type(self) -> Option<CardType> {
        match self {
            Self::All => None,
            Self::Insights => Some(CardType::Insights),
            Self::Fleeting => Some(CardType::Fleeting),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Insights => "Insight",
            Self::Fleeting => "Fleeting",
        }
    }

    pub fn parse(val: &str) -> Option<Self> {
        if val.trim().eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        match CardType::parse(val.trim())? {
            CardType::Insights => Some(Self::Insights),
            CardType::Fleeting => Some(Self::Fleeting),
        }
    }
}

/// Raw state of every filter control a view can show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiFilterState {
    /// Selected entry of the date dropdown.
    pub date: Option<String>,
    pub type_tab: TypeTab,
    pub harbor_tab: HarborCategory,
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Which filter controls a view shows. Controls a view does not show never
/// reach its filter, whatever their UI state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterControls {
    pub date: bool,
    pub type_tabs: bool,
    pub category_tabs: bool,
}

impl FilterControls {
    /// No controls: the view always lists everything.
    pub const NONE: Self = Self {
        date: false,
        type_tabs: false,
        category_tabs: false,
    };

    /// Date dropdown plus the All / Insight / Fleeting tabs.
    pub const LOGBOOK: Self = Self {
        date: true,
        type_tabs: true,
        category_tabs: false,
    };

    /// Harbor category tabs only.
    pub const HARBOR: Self = Self {
        date: false,
        type_tabs: false,
        category_tabs: true,
    };
}

/// Compose the controls a view shows into its canonical filter.
pub fn compose_filter(controls: FilterControls, ui: &UiFilterState) -> Filter {
    Filter {
        date: if controls.date {
            normalize(ui.date.clone())
        } else {
            None
        },
        card_type: if controls.type_tabs {
            ui.type_tab.card_type()
        } else {
            None
        },
        category: controls.category_tabs.then_some(ui.harbor_tab),
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate a `YYYY-MM-DD` date and return it in canonical form.
pub fn parse_date(val: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(val.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date '{val}', expected YYYY-MM-DD"))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_ui_state_composes_equal_filters() {
        let ui = UiFilterState {
            date: Some("2024-05-01".to_string()),
            type_tab: TypeTab::Insights,
            ..Default::default()
        };
        assert_eq!(
            compose_filter(FilterControls::LOGBOOK, &ui),
            compose_filter(FilterControls::LOGBOOK, &ui.clone())
        );
    }

    #[test]
    fn all_tab_leaves_type_unconstrained() {
        let ui = UiFilterState {
            date: Some("2024-05-01".to_string()),
            type_tab: TypeTab::All,
            ..Default::default()
        };
        let filter = compose_filter(FilterControls::LOGBOOK, &ui);
        assert_eq!(filter.card_type, None);
        assert_eq!(filter.date.as_deref(), Some("2024-05-01"));
        assert_eq!(filter.category, None);
    }

    #[test]
    fn blank_date_normalizes_to_none() {
        let blank = UiFilterState {
            date: Some("   ".to_string()),
            ..Default::default()
        };
        let filter = compose_filter(FilterControls::LOGBOOK, &blank);
        assert_eq!(filter, compose_filter(FilterControls::LOGBOOK, &UiFilterState::default()));
        assert!(filter.is_unconstrained());
    }

    #[test]
    fn harbor_controls_ignore_logbook_state() {
        let mut ui = UiFilterState {
            harbor_tab: HarborCategory::People,
            ..Default::default()
        };
        let before = compose_filter(FilterControls::HARBOR, &ui);
        ui.type_tab = TypeTab::Fleeting;
        ui.date = Some("2024-05-01".to_string());
        assert_eq!(compose_filter(FilterControls::HARBOR, &ui), before);
        assert_eq!(before.category, Some(HarborCategory::People));
    }

    #[test]
    fn no_controls_is_unconstrained() {
        let ui = UiFilterState {
            date: Some("2024-05-01".to_string()),
            type_tab: TypeTab::Insights,
            harbor_tab: HarborCategory::Skills,
        };
        assert!(compose_filter(FilterControls::NONE, &ui).is_unconstrained());
    }

    #[test]
    fn type_tab_parse_handles_variants() {
        assert_eq!(TypeTab::parse("all"), Some(TypeTab::All));
        assert_eq!(TypeTab::parse("Insight"), Some(TypeTab::Insights));
        assert_eq!(TypeTab::parse("fleeting"), Some(TypeTab::Fleeting));
        assert_eq!(TypeTab::parse("weekly"), None);
    }

    #[test]
    fn parse_date_validates_format() {
        assert_eq!(parse_date("2024-05-01").unwrap(), "2024-05-01");
        assert_eq!(parse_date(" 2024-5-1 ").unwrap(), "2024-05-01");
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn display_lists_constrained_fields() {
        let filter = Filter::default()
            .with_date("2024-05-01")
            .with_card_type(CardType::Insights);
        assert_eq!(filter.to_string(), "date=2024-05-01 type=insights");
        assert_eq!(Filter::default().to_string(), "(all)");
    }
}
