//! Event loop that executes controller commands.
//!
//! The runtime owns one [`Controller`] and one `mpsc` channel. Each
//! [`Command`] runs on a short-lived worker thread that performs the blocking
//! gateway call and posts the tagged result back to the channel. Results are
//! fed to the controller on the runtime's own thread in arrival order, so
//! the controller never sees concurrent mutation. Whatever produced the
//! result last, the controller's tickets decide what is applied.
//!
//! Shells that read user input on another thread post it into the same
//! channel through [`ViewRuntime::sender`], which lets the user change the
//! filter while a fetch is still outstanding.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::analytics::events::{self, ViewEvent, ViewEventKind};
use crate::filter::{Filter, UiFilterState};
use crate::gateway::{Gateway, GatewayError};
use crate::model::Record;

use super::controller::{Command, Controller, Reaction, Ticket};
use super::profile::ViewProfile;
use super::state::ViewState;

/// Everything that can arrive on the runtime channel.
#[derive(Debug)]
pub enum Event<I> {
    List {
        ticket: Ticket,
        result: Result<Vec<Record>, GatewayError>,
    },
    Detail {
        ticket: Ticket,
        identity: String,
        result: Result<Record, GatewayError>,
    },
    /// Shell input, passed through untouched.
    Input(I),
    /// The input source is exhausted.
    InputClosed,
}

/// What one turn of the loop produced.
#[derive(Debug, PartialEq, Eq)]
pub enum Step<I> {
    /// A fetch result reached the controller.
    Handled(Reaction),
    Input(I),
    InputClosed,
}

pub struct ViewRuntime<I = ()> {
    profile: ViewProfile,
    controller: Controller,
    gateway: Arc<dyn Gateway>,
    tx: Sender<Event<I>>,
    rx: Receiver<Event<I>>,
    ui: UiFilterState,
    /// Input that arrived while waiting for fetches to settle.
    deferred: VecDeque<Event<I>>,
    in_flight: usize,
    stale_dropped: usize,
    log_events: bool,
}

impl<I: Send + 'static> ViewRuntime<I> {
    pub fn new(profile: ViewProfile, gateway: Arc<dyn Gateway>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            controller: profile.controller(),
            profile,
            gateway,
            tx,
            rx,
            ui: UiFilterState::default(),
            deferred: VecDeque::new(),
            in_flight: 0,
            stale_dropped: 0,
            log_events: false,
        }
    }

    /// Record every handled response in `~/.compass/events.jsonl`.
    pub fn with_event_log(mut self, enabled: bool) -> Self {
        self.log_events = enabled;
        self
    }

    // -- Queries --

    pub fn profile(&self) -> &ViewProfile {
        &self.profile
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn state(&self) -> &ViewState {
        self.controller.state()
    }

    pub fn ui(&self) -> &UiFilterState {
        &self.ui
    }

    /// Worker threads whose result has not been handled yet, stale or not.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Responses dropped because a newer request superseded them.
    pub fn stale_dropped(&self) -> usize {
        self.stale_dropped
    }

    /// A sender for posting [`Event::Input`] from another thread.
    pub fn sender(&self) -> Sender<Event<I>> {
        self.tx.clone()
    }

    // -- Operations --

    pub fn set_filter(&mut self, filter: Filter) {
        let command = self.controller.set_filter(filter);
        self.dispatch(command);
    }

    /// Replace the UI control state and apply the filter it composes to.
    pub fn apply_ui(&mut self, ui: UiFilterState) {
        let filter = self.profile.compose(&ui);
        self.ui = ui;
        self.set_filter(filter);
    }

    /// Edit the UI control state in place, then apply it.
    pub fn update_ui(&mut self, edit: impl FnOnce(&mut UiFilterState)) {
        let mut ui = self.ui.clone();
        edit(&mut ui);
        self.apply_ui(ui);
    }

    pub fn select(&mut self, identity: &str) {
        let command = self.controller.select_record(identity);
        self.dispatch(command);
    }

    pub fn clear_selection(&mut self) {
        self.controller.clear_selection();
    }

    pub fn refresh(&mut self) {
        let command = self.controller.refresh();
        self.dispatch(command);
    }

    // -- Loop --

    /// Block until the next event and handle it.
    pub fn step(&mut self) -> Step<I> {
        let event = match self.deferred.pop_front() {
            Some(event) => event,
            // `self.tx` keeps the channel open, so `recv` cannot fail.
            None => match self.rx.recv() {
                Ok(event) => event,
                Err(_) => return Step::InputClosed,
            },
        };
        self.handle(event)
    }

    /// Feed one event to the controller.
    pub fn handle(&mut self, event: Event<I>) -> Step<I> {
        match event {
            Event::List { ticket, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let outcome = result
                    .as_ref()
                    .map(|records| records.len())
                    .map_err(ToString::to_string);
                let reaction = self.controller.on_list_loaded(ticket, result);
                self.log_outcome(&reaction, ticket, None, outcome.map(|n| format!("{n} records")));
                self.dispatch(reaction.clone().into_command());
                Step::Handled(reaction)
            }
            Event::Detail {
                ticket,
                identity,
                result,
            } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let outcome = result.as_ref().map(|_| String::new()).map_err(ToString::to_string);
                let reaction = self.controller.on_detail_loaded(ticket, result);
                self.log_outcome(&reaction, ticket, Some(&identity), outcome);
                Step::Handled(reaction)
            }
            Event::Input(input) => Step::Input(input),
            Event::InputClosed => Step::InputClosed,
        }
    }

    /// Handle fetch results until neither half of the view is loading.
    ///
    /// Input that arrives meanwhile is kept for the next [`step`](Self::step).
    pub fn run_until_settled(&mut self) {
        while !self.state().is_settled() && self.in_flight > 0 {
            let Some(event) = self.next_fetch_event(None) else {
                break;
            };
            self.handle(event);
        }
    }

    /// Like [`run_until_settled`](Self::run_until_settled) but gives up after
    /// `timeout`. Returns whether the view settled.
    pub fn run_until_settled_within(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.state().is_settled() && self.in_flight > 0 {
            let Some(event) = self.next_fetch_event(Some(deadline)) else {
                break;
            };
            self.handle(event);
        }
        self.state().is_settled()
    }

    /// Handle results until every worker has reported back, including the
    /// ones whose response will be dropped as stale.
    pub fn run_until_idle(&mut self) {
        while self.in_flight > 0 {
            let Some(event) = self.next_fetch_event(None) else {
                break;
            };
            self.handle(event);
        }
    }

    // -- Internal --

    /// Next list/detail result, deferring any input that arrives first.
    fn next_fetch_event(&mut self, deadline: Option<Instant>) -> Option<Event<I>> {
        loop {
            let event = match deadline {
                None => self.rx.recv().ok()?,
                Some(deadline) => {
                    let wait = deadline.saturating_duration_since(Instant::now());
                    match self.rx.recv_timeout(wait) {
                        Ok(event) => event,
                        Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                            return None;
                        }
                    }
                }
            };
            match event {
                Event::Input(_) | Event::InputClosed => self.deferred.push_back(event),
                fetch => return Some(fetch),
            }
        }
    }

    fn dispatch(&mut self, command: Option<Command>) {
        let Some(command) = command else {
            return;
        };
        self.in_flight += 1;

        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let event = match command {
                Command::FetchList {
                    ticket,
                    resource,
                    filter,
                } => Event::List {
                    ticket,
                    result: guarded(|| gateway.fetch_list(resource, &filter)),
                },
                Command::FetchDetail {
                    ticket,
                    resource,
                    identity,
                } => {
                    let result = guarded(|| gateway.fetch_detail(resource, &identity));
                    Event::Detail {
                        ticket,
                        identity,
                        result,
                    }
                }
            };
            // The runtime may already be gone; nobody is left to care.
            let _ = tx.send(event);
        });
    }

    fn log_outcome(
        &mut self,
        reaction: &Reaction,
        ticket: Ticket,
        identity: Option<&str>,
        outcome: Result<String, String>,
    ) {
        if reaction.is_stale() {
            self.stale_dropped += 1;
        }
        if !self.log_events {
            return;
        }

        let kind = match (reaction.is_stale(), &outcome, identity) {
            (true, _, _) => ViewEventKind::StaleDropped,
            (false, Err(_), _) => ViewEventKind::FetchFailed,
            (false, Ok(_), None) => ViewEventKind::ListLoaded,
            (false, Ok(_), Some(_)) => ViewEventKind::DetailLoaded,
        };

        let mut event = ViewEvent::new(self.profile.name(), kind, ticket.value());
        if let Some(identity) = identity {
            event = event.with_identity(identity);
        }
        match outcome {
            Ok(detail) if !detail.is_empty() => event = event.with_detail(detail),
            Err(message) => event = event.with_detail(message),
            Ok(_) => {}
        }
        events::log_view_event(&event);
    }
}

/// Run one gateway call on a worker. A panic becomes a failed result, so the
/// loop still hears back and `in_flight` stays accurate.
fn guarded<T>(call: impl FnOnce() -> Result<T, GatewayError>) -> Result<T, GatewayError> {
    panic::catch_unwind(AssertUnwindSafe(call))
        .unwrap_or_else(|_| Err(GatewayError::transport("gateway call panicked")))
}
