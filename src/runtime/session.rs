use std::sync::Arc;
use anyhow::Result;
use thiserror::Error;
use tracing::{info, warn, error, debug};
use crate::compiler::aggregator::ExecutionPayload;
use crate::dsl::{Layout, Node, NodeData};
use crate::error::{AggregateError, ChainError, ValidationError};
use crate::nodes::Vocabulary;
use crate::runtime::cache::ArtifactCache;
use crate::runtime::chain::ChainStore;
use crate::runtime::executor::{ExecutionResult, Executor};
use crate::runtime::storage::BackupStore;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("Execution failed: {0}")]
    Dispatch(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Idle,
    Running,
    Succeeded,
    Failed(String),
}

/// 流水线页面会话
/// Owns one pipeline's chain store. Every mutation re-validates the chain and
/// drops the cached artifact if the payload it was built from has changed.
/// All calls happen on the caller's thread; only `run` awaits.
pub struct PipelineSession {
    vocabulary: Arc<Vocabulary>,
    store: ChainStore,
    executor: Arc<dyn Executor>,
    backup: Arc<dyn BackupStore>,
    cache: ArtifactCache,
    /// Ids of the single complete run, or why there is none.
    validation: Result<Vec<String>, ValidationError>,
    status: RunStatus,
}

impl PipelineSession {
    pub fn new(
        vocabulary: Arc<Vocabulary>,
        executor: Arc<dyn Executor>,
        backup: Arc<dyn BackupStore>,
    ) -> Result<Self, ChainError> {
        let store = vocabulary.new_store()?;
        Ok(Self::with_store(vocabulary, store, executor, backup))
    }

    pub fn from_nodes(
        vocabulary: Arc<Vocabulary>,
        nodes: Vec<Node>,
        executor: Arc<dyn Executor>,
        backup: Arc<dyn BackupStore>,
    ) -> Result<Self, ChainError> {
        let store = vocabulary.restore(nodes)?;
        Ok(Self::with_store(vocabulary, store, executor, backup))
    }

    fn with_store(
        vocabulary: Arc<Vocabulary>,
        store: ChainStore,
        executor: Arc<dyn Executor>,
        backup: Arc<dyn BackupStore>,
    ) -> Self {
        let mut session = Self {
            vocabulary,
            store,
            executor,
            backup,
            cache: ArtifactCache::new(),
            validation: Err(ValidationError::NoCompleteChain),
            status: RunStatus::Idle,
        };
        session.refresh();
        session
    }

    pub fn store(&self) -> &ChainStore {
        &self.store
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn validation(&self) -> &Result<Vec<String>, ValidationError> {
        &self.validation
    }

    /// Whether the run action should be enabled.
    pub fn can_run(&self) -> bool {
        self.validation.is_ok()
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    pub fn layout(&self, id: &str) -> Layout {
        Layout {
            id: id.to_string(),
            pipeline: self.vocabulary.kind,
            nodes: self.store.snapshot(),
        }
    }

    // --- Mutations ---

    pub fn insert(&mut self, type_tag: &str, after_id: Option<&str>) -> Result<String, ChainError> {
        let id = self.store.insert(type_tag, after_id)?.id.clone();
        self.refresh();
        Ok(id)
    }

    pub fn insert_with_id(&mut self, id: &str, type_tag: &str, after_id: Option<&str>) -> Result<(), ChainError> {
        self.store.insert_with_id(id, type_tag, after_id)?;
        self.refresh();
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<Node, ChainError> {
        let removed = self.store.remove(id)?;
        self.refresh();
        Ok(removed)
    }

    pub fn relink(&mut self, source_id: &str, target_id: &str) -> Result<(), ChainError> {
        self.store.relink(source_id, target_id)?;
        self.refresh();
        Ok(())
    }

    pub fn rewire(&mut self, source_id: &str, target_id: &str) -> Result<(), ChainError> {
        self.store.rewire(source_id, target_id)?;
        self.refresh();
        Ok(())
    }

    pub fn disconnect(&mut self, source_id: &str) -> Result<Option<String>, ChainError> {
        let old = self.store.disconnect(source_id)?;
        self.refresh();
        Ok(old)
    }

    pub fn update_data(&mut self, id: &str, data: NodeData) -> Result<(), ChainError> {
        self.store.update_data(id, data)?;
        self.refresh();
        Ok(())
    }

    /// Payload the run action would dispatch right now.
    pub fn payload(&self) -> Result<ExecutionPayload, RunError> {
        let run = self.vocabulary.validate(&self.store)?;
        let trigger = run.tail().id.clone();
        Ok(self.vocabulary.aggregate(&run, &trigger)?)
    }

    fn refresh(&mut self) {
        let outcome = self
            .vocabulary
            .validate(&self.store)
            .map(|run| run.ids().into_iter().map(str::to_string).collect::<Vec<_>>());

        if outcome != self.validation {
            match &outcome {
                Ok(ids) => info!(pipeline = %self.vocabulary.kind, nodes = ids.len(), "Pipeline is runnable"),
                Err(e) => debug!(pipeline = %self.vocabulary.kind, reason = %e, "Pipeline is not runnable"),
            }
        }
        self.validation = outcome;

        let current = self.payload().ok();
        if self.cache.invalidate_if_stale(current.as_ref()) {
            info!(pipeline = %self.vocabulary.kind, "Cached artifact no longer matches the chain, invalidated");
        }
    }

    // --- Run action ---

    /// Build the payload from the valid run and hand it to the executor.
    /// A fresh cached artifact is returned without dispatching.
    pub async fn run(&mut self, trigger_id: &str) -> Result<ExecutionResult, RunError> {
        let payload = {
            let run = self.vocabulary.validate(&self.store)?;
            self.vocabulary.aggregate(&run, trigger_id)?
        };

        if self.cache.is_fresh(&payload) {
            if let Some(artifact) = self.cache.artifact() {
                info!(pipeline = %self.vocabulary.kind, "Reusing cached artifact");
                self.status = RunStatus::Succeeded;
                return Ok(ExecutionResult::ok(artifact.clone()));
            }
        }

        self.cache.reset();
        self.status = RunStatus::Running;
        info!(pipeline = %self.vocabulary.kind, trigger = %trigger_id, "Running pipeline");

        match self.executor.execute(self.vocabulary.kind, &payload).await {
            Ok(result) if result.success => {
                self.cache.record(&payload, result.result.clone());
                self.status = RunStatus::Succeeded;
                Ok(result)
            }
            Ok(result) => {
                let message = result.error.clone().unwrap_or_else(|| "Execution failed".to_string());
                warn!(pipeline = %self.vocabulary.kind, error = %message, "Execution service reported failure");
                self.backup_payload(&payload).await;
                self.status = RunStatus::Failed(message);
                Ok(result)
            }
            Err(e) => {
                error!(pipeline = %self.vocabulary.kind, error = ?e, "Dispatch failed");
                self.backup_payload(&payload).await;
                self.status = RunStatus::Failed(e.to_string());
                Err(RunError::Dispatch(e.to_string()))
            }
        }
    }

    /// The payload saved by the last failed run, if any.
    pub async fn restore_backup(&self) -> Result<Option<ExecutionPayload>> {
        self.backup.load_payload(self.vocabulary.kind).await
    }

    async fn backup_payload(&self, payload: &ExecutionPayload) {
        match self.backup.save_payload(self.vocabulary.kind, payload).await {
            Ok(()) => info!(pipeline = %self.vocabulary.kind, "Saved payload backup"),
            Err(e) => error!(pipeline = %self.vocabulary.kind, error = ?e, "Failed to save payload backup"),
        }
    }
}
