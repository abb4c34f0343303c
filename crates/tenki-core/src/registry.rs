use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::HandlerName;
use crate::error::BrokerError;

/// A callback for one kind of deferred job.
///
/// The payload arrives parsed back from the JSON text the enqueue side
/// serialized. Errors returned here are absorbed by the consumer into the
/// job record's terminal state; they never reach the trigger scheduler.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, payload: serde_json::Value) -> Result<(), BrokerError>;
}

/// Registry of job handlers (handler name -> handler).
///
/// Design:
/// - Built during initialization (mutable), used at consume time
///   (immutable); the broker takes it at construction.
/// - The trigger scheduler can only persist a name, so every entry needs a
///   stable, non-empty one; anonymous entries are rejected at this
///   boundary instead of being discovered at re-invocation time.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<HandlerName, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        name: HandlerName,
        handler: Arc<dyn JobHandler>,
    ) -> Result<(), BrokerError> {
        if name.is_empty() {
            return Err(BrokerError::UnnamedHandler);
        }
        if self.handlers.contains_key(&name) {
            return Err(BrokerError::DuplicateHandler(name));
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    pub fn get(&self, name: &HandlerName) -> Option<&Arc<dyn JobHandler>> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &HandlerName) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
