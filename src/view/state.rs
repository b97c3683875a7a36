//! Observable state of one list/detail view.

use serde::Serialize;

use crate::model::Record;

/// Everything the shell needs to draw a view.
///
/// Only the controller writes to it; the shell reads snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub records: Vec<Record>,
    /// Identity of the record shown in the detail panel.
    pub selection: Option<String>,
    pub is_list_loading: bool,
    pub is_detail_loading: bool,
    /// Inline message for the most recent failure.
    pub error: Option<String>,
}

/// Phase of the list half of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPhase {
    /// No list has been requested yet.
    Idle,
    ListLoading,
    ListReady,
}

/// Phase of the detail half of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailPhase {
    NoSelection,
    DetailLoading,
    DetailReady,
}

impl ViewState {
    pub fn record(&self, identity: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.identity == identity)
    }

    /// The selected record, if it is part of the current list.
    pub fn selected_record(&self) -> Option<&Record> {
        self.selection.as_deref().and_then(|id| self.record(id))
    }

    pub fn detail_phase(&self) -> DetailPhase {
        match (&self.selection, self.is_detail_loading) {
            (None, _) => DetailPhase::NoSelection,
            (Some(_), true) => DetailPhase::DetailLoading,
            (Some(_), false) => DetailPhase::DetailReady,
        }
    }

    /// True when neither half is waiting on the network.
    pub fn is_settled(&self) -> bool {
        !self.is_list_loading && !self.is_detail_loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_phase_follows_selection_and_flag() {
        let mut state = ViewState::default();
        assert_eq!(state.detail_phase(), DetailPhase::NoSelection);

        state.selection = Some("a.md".to_string());
        state.is_detail_loading = true;
        assert_eq!(state.detail_phase(), DetailPhase::DetailLoading);

        state.is_detail_loading = false;
        assert_eq!(state.detail_phase(), DetailPhase::DetailReady);
    }

    #[test]
    fn selected_record_requires_membership() {
        let state = ViewState {
            records: vec![Record::new("a.md", "a")],
            selection: Some("b.md".to_string()),
            ..Default::default()
        };
        assert!(state.selected_record().is_none());
        assert!(state.record("a.md").is_some());
    }
}
