//! Domain model: job records, lifecycle states, identifiers.

mod ids;
mod record;
mod state;

pub use ids::{HandlerName, TriggerId};
pub use record::{JobRecord, cache_key};
pub use state::JobState;
