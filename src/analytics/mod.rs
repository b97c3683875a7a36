//! JSONL logs under `~/.compass/` and their reporting.
//!
//! - [`logger`]: one line per API request (`requests.jsonl`)
//! - [`events`]: one line per response handled by a view (`events.jsonl`)
//! - [`reporter`]: aggregation for `compass log`

pub mod events;
pub mod logger;
pub mod reporter;
