use serde_json::Value;
use crate::compiler::aggregator::ExecutionPayload;

/// Remembers which source and options produced the last artifact, so the page
/// can tell when the artifact no longer matches the chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactCache {
    processed_for: Option<Value>,
    processed_with: Option<ExecutionPayload>,
    artifact: Option<Value>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn processed_for(&self) -> Option<&Value> {
        self.processed_for.as_ref()
    }

    pub fn processed_with(&self) -> Option<&ExecutionPayload> {
        self.processed_with.as_ref()
    }

    pub fn artifact(&self) -> Option<&Value> {
        self.artifact.as_ref()
    }

    pub fn record(&mut self, payload: &ExecutionPayload, artifact: Value) {
        self.processed_for = payload.source().cloned();
        self.processed_with = Some(payload.clone());
        self.artifact = Some(artifact);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// An artifact exists and was produced from exactly this payload.
    pub fn is_fresh(&self, payload: &ExecutionPayload) -> bool {
        self.artifact.is_some() && self.processed_with.as_ref() == Some(payload)
    }

    /// Drop the artifact if `current` (None when the chain is not runnable)
    /// differs from what produced it. Returns whether anything was dropped.
    pub fn invalidate_if_stale(&mut self, current: Option<&ExecutionPayload>) -> bool {
        if self.artifact.is_none() {
            return false;
        }
        if self.processed_with.as_ref() != current {
            self.reset();
            return true;
        }
        false
    }
}
