//! List/detail views.
//!
//! - [`state`]: the observable [`ViewState`]
//! - [`controller`]: the generic reducer with last-request-wins sequencing
//! - [`profile`]: the five views as configurations of that controller
//! - [`runtime`]: the event loop that runs a controller against a gateway

pub mod controller;
pub mod profile;
pub mod runtime;
pub mod state;

pub use controller::{Command, Controller, Reaction, Ticket};
pub use profile::{ViewKind, ViewProfile};
pub use runtime::{Event, Step, ViewRuntime};
pub use state::{DetailPhase, ListPhase, ViewState};
