//! The five views built on the generic controller.
//!
//! A profile is plain data: which resource the view lists, how its filter
//! controls compose into a [`Filter`], and whether the first record is
//! selected after the first load.

use std::fmt;

use crate::filter::{self, Filter, FilterControls, UiFilterState};
use crate::model::Resource;

use super::controller::Controller;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Chart,
    Harbor,
    Logbook,
    Navigation,
    Template,
}

impl ViewKind {
    pub const ALL: [ViewKind; 5] = [
        ViewKind::Chart,
        ViewKind::Harbor,
        ViewKind::Logbook,
        ViewKind::Navigation,
        ViewKind::Template,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chart => "chart",
            Self::Harbor => "harbor",
            Self::Logbook => "logbook",
            Self::Navigation => "navigation",
            Self::Template => "template",
        }
    }

    pub fn parse(val: &str) -> Option<Self> {
        match val.trim().to_ascii_lowercase().as_str() {
            "chart" | "charts" | "soundings" => Some(Self::Chart),
            "harbor" => Some(Self::Harbor),
            "logbook" | "cards" => Some(Self::Logbook),
            "navigation" | "nav" => Some(Self::Navigation),
            "template" | "templates" => Some(Self::Template),
            _ => None,
        }
    }

    pub fn profile(self) -> ViewProfile {
        match self {
            Self::Chart => ViewProfile {
                kind: self,
                title: "Chart",
                resource: Resource::Charts,
                controls: FilterControls::NONE,
                auto_select_first: true,
                empty_message: "No soundings yet.",
            },
            Self::Harbor => ViewProfile {
                kind: self,
                title: "Harbor",
                resource: Resource::HarborFiles,
                controls: FilterControls::HARBOR,
                auto_select_first: false,
                empty_message: "No files in this category.",
            },
            Self::Logbook => ViewProfile {
                kind: self,
                title: "Logbook",
                resource: Resource::Cards,
                controls: FilterControls::LOGBOOK,
                auto_select_first: true,
                empty_message: "No cards for this date.",
            },
            Self::Navigation => ViewProfile {
                kind: self,
                title: "Navigation",
                resource: Resource::Cards,
                controls: FilterControls::NONE,
                auto_select_first: false,
                empty_message: "No cards today.",
            },
            Self::Template => ViewProfile {
                kind: self,
                title: "Templates",
                resource: Resource::Templates,
                controls: FilterControls::NONE,
                auto_select_first: true,
                empty_message: "No templates found.",
            },
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration of one list/detail view.
#[derive(Debug, Clone, Copy)]
pub struct ViewProfile {
    pub kind: ViewKind,
    pub title: &'static str,
    pub resource: Resource,
    pub controls: FilterControls,
    pub auto_select_first: bool,
    /// Shown in place of the list when a load returns no records.
    pub empty_message: &'static str,
}

impl ViewProfile {
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// A fresh controller configured for this view.
    pub fn controller(&self) -> Controller {
        Controller::new(self.resource).with_auto_select(self.auto_select_first)
    }

    /// Compose the view's filter from the UI controls.
    pub fn compose(&self, ui: &UiFilterState) -> Filter {
        filter::compose_filter(self.controls, ui)
    }
}
