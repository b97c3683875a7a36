//! Generic list/detail controller.
//!
//! One controller drives every list/detail view. It owns the [`ViewState`]
//! and never performs I/O: each operation updates the state and returns the
//! [`Command`] (if any) the runtime must execute. Responses come back through
//! [`Controller::on_list_loaded`] / [`Controller::on_detail_loaded`] tagged
//! with the [`Ticket`] of the request that produced them.
//!
//! # Last request wins
//!
//! Every command carries a freshly minted ticket. The controller remembers
//! the ticket of the one list fetch and the one detail fetch it still cares
//! about; a response carrying any other ticket is dropped, even when it is a
//! success. Changing the filter forgets the pending detail ticket and clears
//! the selection before the new list fetch is issued, so a detail panel is
//! never shown against a list it does not belong to.
//!
//! # Auto-select
//!
//! When enabled, the first successful list load selects the first record.
//! The `has_auto_selected` flag makes this a one-shot: later reloads never
//! auto-select, even if an intermediate load came back empty.

use std::fmt;

use serde::Serialize;

use super::state::{ListPhase, ViewState};
use crate::filter::Filter;
use crate::gateway::GatewayError;
use crate::model::{Record, Resource};

// ---------------------------------------------------------------------------
// Commands and tickets
// ---------------------------------------------------------------------------

/// Correlation token attached to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A fetch the runtime must perform on the controller's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchList {
        ticket: Ticket,
        resource: Resource,
        filter: Filter,
    },
    FetchDetail {
        ticket: Ticket,
        resource: Resource,
        identity: String,
    },
}

impl Command {
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::FetchList { ticket, .. } | Self::FetchDetail { ticket, .. } => *ticket,
        }
    }
}

/// What the controller did with a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    /// The response was superseded and ignored.
    Stale,
    /// The response updated the state; it may require a follow-up fetch
    /// (an auto-selected record whose body is not in the list payload).
    Applied(Option<Command>),
}

impl Reaction {
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }

    pub fn into_command(self) -> Option<Command> {
        match self {
            Self::Stale => None,
            Self::Applied(command) => command,
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Controller {
    resource: Resource,
    auto_select_first: bool,
    state: ViewState,
    /// Filter of the most recent list request.
    filter: Option<Filter>,
    has_loaded: bool,
    has_auto_selected: bool,
    next_ticket: u64,
    pending_list: Option<Ticket>,
    pending_detail: Option<(Ticket, String)>,
}

impl Controller {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            auto_select_first: true,
            state: ViewState::default(),
            filter: None,
            has_loaded: false,
            has_auto_selected: false,
            next_ticket: 0,
            pending_list: None,
            pending_detail: None,
        }
    }

    /// Enable or disable selecting the first record after the first load.
    pub fn with_auto_select(mut self, enabled: bool) -> Self {
        self.auto_select_first = enabled;
        self
    }

    // -- Queries --

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn has_auto_selected(&self) -> bool {
        self.has_auto_selected
    }

    pub fn pending_list(&self) -> Option<Ticket> {
        self.pending_list
    }

    pub fn pending_detail(&self) -> Option<(Ticket, &str)> {
        self.pending_detail
            .as_ref()
            .map(|(ticket, identity)| (*ticket, identity.as_str()))
    }

    pub fn list_phase(&self) -> ListPhase {
        if self.state.is_list_loading {
            ListPhase::ListLoading
        } else if self.has_loaded || self.filter.is_some() {
            ListPhase::ListReady
        } else {
            ListPhase::Idle
        }
    }

    /// The selection is absent, names a listed record, or names the record a
    /// pending detail fetch was issued for.
    pub fn selection_is_valid(&self) -> bool {
        match &self.state.selection {
            None => true,
            Some(id) => {
                self.state.record(id).is_some()
                    || self
                        .pending_detail
                        .as_ref()
                        .is_some_and(|(_, pending)| pending == id)
            }
        }
    }

    // -- Operations --

    /// Request the list for `filter`.
    ///
    /// A filter equal to the current one is a no-op. Any other filter clears
    /// the selection first, then issues the fetch.
    pub fn set_filter(&mut self, filter: Filter) -> Option<Command> {
        if self.filter.as_ref() == Some(&filter) {
            return None;
        }
        self.clear_selection();
        Some(self.issue_list(filter))
    }

    /// Re-issue the current filter's list fetch. The selection survives and
    /// is reconciled against the new list when it arrives.
    pub fn refresh(&mut self) -> Option<Command> {
        let filter = self.filter.clone()?;
        Some(self.issue_list(filter))
    }

    /// Toggle the selection of `identity`.
    ///
    /// Selecting the current selection deselects it. Identities that are not
    /// in the current list are ignored. A record whose body is already loaded
    /// is shown without a fetch.
    pub fn select_record(&mut self, identity: &str) -> Option<Command> {
        if self.state.selection.as_deref() == Some(identity) {
            self.clear_selection();
            return None;
        }

        let has_content = self.state.record(identity)?.has_content();

        self.state.selection = Some(identity.to_string());
        self.state.error = None;

        if has_content {
            self.pending_detail = None;
            self.state.is_detail_loading = false;
            return None;
        }

        Some(self.issue_detail(identity.to_string()))
    }

    /// Close the detail panel. Any pending detail response becomes stale.
    pub fn clear_selection(&mut self) {
        self.state.selection = None;
        self.state.is_detail_loading = false;
        self.pending_detail = None;
    }

    // -- Responses --

    pub fn on_list_loaded(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Record>, GatewayError>,
    ) -> Reaction {
        if self.pending_list != Some(ticket) {
            return Reaction::Stale;
        }
        self.pending_list = None;
        self.state.is_list_loading = false;

        let records = match result {
            Ok(records) => records,
            Err(err) => {
                self.state.error = Some(err.to_string());
                return Reaction::Applied(None);
            }
        };

        self.state.records = records;
        self.has_loaded = true;

        let mut follow_up = self.reconcile_selection();

        if self.auto_select_first && !self.has_auto_selected {
            self.has_auto_selected = true;
            if self.state.selection.is_none()
                && let Some(first) = self.state.records.first().map(|r| r.identity.clone())
            {
                follow_up = self.select_record(&first);
            }
        }

        Reaction::Applied(follow_up)
    }

    pub fn on_detail_loaded(
        &mut self,
        ticket: Ticket,
        result: Result<Record, GatewayError>,
    ) -> Reaction {
        let identity = match &self.pending_detail {
            Some((pending, identity))
                if *pending == ticket && self.state.selection.as_ref() == Some(identity) =>
            {
                identity.clone()
            }
            _ => return Reaction::Stale,
        };
        self.pending_detail = None;
        self.state.is_detail_loading = false;

        match result {
            Ok(detail) => {
                match self.state.records.iter().position(|r| r.identity == identity) {
                    Some(index) => {
                        let merged = self.state.records[index].merged_with(detail);
                        self.state.records[index] = merged;
                    }
                    None => self.state.selection = None,
                }
            }
            Err(err) => {
                self.state.error = Some(err.to_string());
                self.state.selection = None;
            }
        }

        Reaction::Applied(None)
    }

    // -- Internal --

    fn mint(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    fn issue_list(&mut self, filter: Filter) -> Command {
        let ticket = self.mint();
        self.pending_list = Some(ticket);
        self.state.is_list_loading = true;
        self.state.error = None;
        self.filter = Some(filter.clone());
        Command::FetchList {
            ticket,
            resource: self.resource,
            filter,
        }
    }

    fn issue_detail(&mut self, identity: String) -> Command {
        let ticket = self.mint();
        self.pending_detail = Some((ticket, identity.clone()));
        self.state.is_detail_loading = true;
        Command::FetchDetail {
            ticket,
            resource: self.resource,
            identity,
        }
    }

    /// Bring the selection in line with a freshly loaded list.
    fn reconcile_selection(&mut self) -> Option<Command> {
        let identity = self.state.selection.clone()?;

        let Some(record) = self.state.record(&identity) else {
            self.clear_selection();
            return None;
        };

        if record.has_content() {
            self.pending_detail = None;
            self.state.is_detail_loading = false;
            return None;
        }

        if self.pending_detail.is_some() {
            return None;
        }
        Some(self.issue_detail(identity))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
