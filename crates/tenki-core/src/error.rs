use thiserror::Error;

use crate::domain::HandlerName;

#[derive(Debug, Error)]
pub enum BrokerError {
    /// Enqueue or consume was handed a name the registry cannot resolve,
    /// so the trigger scheduler could never re-invoke it.
    #[error("unknown handler for name={0}")]
    UnknownHandler(HandlerName),

    /// Registration rejected an empty name; re-invocation is by name only.
    #[error("handler name must not be empty")]
    UnnamedHandler,

    #[error("duplicate handler for name={0}")]
    DuplicateHandler(HandlerName),

    /// Trigger capacity ceiling reached; back off or drop the deferred work.
    #[error("broker busy: {active} triggers registered, capacity {capacity}")]
    Busy { active: usize, capacity: usize },

    #[error("payload serialization: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
