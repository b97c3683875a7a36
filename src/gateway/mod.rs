//! Remote data gateway for the Compass JSON API.
//!
//! The [`Gateway`] trait is the seam between the list/detail controller and
//! the network: the runtime only ever talks to a `dyn Gateway`, so tests can
//! substitute a scripted in-memory implementation for [`HttpGateway`].
//!
//! The gateway is stateless between calls and never retries. Every failure is
//! normalized into a [`GatewayError`]; callers decide what to show.

pub mod http;
pub mod wire;

use thiserror::Error;

use crate::filter::Filter;
use crate::model::{Record, Resource};

pub use http::HttpGateway;
pub use wire::{CreatedCard, FleetingCardInput};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Uniform failure signal for every gateway call.
///
/// `Decode` is a transport-level failure as far as callers are concerned:
/// the request completed but the body could not be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Network unreachable, non-2xx status, or a requested entry absent from
    /// the response. `message` is the server-provided text when there is one.
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },
    /// The response body was not the JSON shape we expected.
    #[error("malformed response from {path}: {message}")]
    Decode { path: String, message: String },
}

impl GatewayError {
    /// Transport failure without an HTTP status (connection refused, missing
    /// entry in a fallback lookup, malformed identity).
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Every gateway failure is a transport failure from the caller's point
    /// of view; the variant only refines the message.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Decode { .. })
    }

    /// HTTP status attached to the failure, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::Decode { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Gateway trait
// ---------------------------------------------------------------------------

/// List/detail/create operations the view controller depends on.
///
/// Implementations must be shareable across worker threads: the runtime
/// issues each fetch on its own thread and may have a list fetch and a
/// detail fetch in flight at once.
pub trait Gateway: Send + Sync {
    /// Fetch the ordered records of `resource` matching `filter`. Absent
    /// filter fields leave the query unconstrained.
    fn fetch_list(&self, resource: Resource, filter: &Filter) -> Result<Vec<Record>, GatewayError>;

    /// Fetch one record with `full_content` populated.
    fn fetch_detail(&self, resource: Resource, identity: &str) -> Result<Record, GatewayError>;

    /// Create a fleeting card.
    fn submit_create(&self, input: &FleetingCardInput) -> Result<CreatedCard, GatewayError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
