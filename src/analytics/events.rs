//! View event logger — records what the list/detail runtime did with each
//! response.
//!
//! The request log says what went over the wire; this log says what the
//! controller made of it: which loads were applied, which arrived after
//! being superseded and were dropped, which failed.
//!
//! Log file: `~/.compass/events.jsonl`

use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Event entry
// ---------------------------------------------------------------------------

/// What happened to a response when it reached the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewEventKind {
    ListLoaded,
    DetailLoaded,
    StaleDropped,
    FetchFailed,
}

/// One runtime event. One line per response handled.
#[derive(Debug, Serialize)]
pub struct ViewEvent {
    pub timestamp: String,
    /// View name, e.g. `"harbor"`.
    pub view: String,
    pub event: ViewEventKind,
    pub ticket: u64,
    /// Record identity for detail events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    /// Record count for list loads, error text for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ViewEvent {
    pub fn new(view: &str, event: ViewEventKind, ticket: u64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            view: view.to_string(),
            event,
            ticket,
            identity: None,
            detail: None,
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Log a view event to `~/.compass/events.jsonl`.
///
/// Best-effort — failures are silently ignored.
pub fn log_view_event(event: &ViewEvent) {
    let _ = append_event(event);
}

fn append_event(event: &ViewEvent) -> anyhow::Result<()> {
    let Some(path) = events_log_path() else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(event)?;
    writeln!(file, "{json}")?;

    Ok(())
}

fn events_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".compass").join("events.jsonl"))
}
