//! Named handlers for route tables assembled from data.

use std::collections::HashMap;

use crate::error::PipelineError;
use crate::handler::shape::HandlerLike;

/// Maps names used in configuration files to handler-like values.
#[derive(Clone, Debug, Default)]
pub struct HandlerRegistry {
    entries: HashMap<String, HandlerLike>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, handler: HandlerLike) -> &mut Self {
        self.entries.insert(name.into(), handler);
        self
    }

    pub fn get(&self, name: &str) -> Option<&HandlerLike> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Resolve every name in order; the first unknown name fails the lot.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<HandlerLike>, PipelineError> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.entries
                    .get(name)
                    .cloned()
                    .ok_or_else(|| PipelineError::UnknownHandler(name.to_string()))
            })
            .collect()
    }
}
