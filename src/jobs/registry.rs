use crate::jobs::{JobHandler, JobHandlerFactory};
use anyhow::{Result, anyhow};
use serde_json::Value;
use std::collections::HashMap;

/// Registry of job handlers by kind.
#[derive(Default)]
pub struct JobRegistry {
    handlers: HashMap<&'static str, JobHandlerFactory>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a job handler for a specific kind.
    pub fn register<H: JobHandler + Clone + 'static>(&mut self, handler: H) {
        let kind = handler.kind();
        let factory: JobHandlerFactory =
            Box::new(move |_payload| Ok(Box::new(handler.clone()) as Box<dyn JobHandler>));
        self.handlers.insert(kind, factory);
    }

    /// Create a handler instance for the given job kind and payload.
    pub fn create_handler(&self, kind: &str, payload: Value) -> Result<Box<dyn JobHandler>> {
        let factory = self
            .handlers
            .get(kind)
            .ok_or_else(|| anyhow!("No handler registered for job kind: {}", kind))?;

        factory(payload)
    }

    /// Get all registered job kinds.
    pub fn registered_kinds(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }
}
