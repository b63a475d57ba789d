use async_trait::async_trait;
use anyhow::{Result, Context as AnyhowContext};
use dashmap::DashMap;
use std::path::PathBuf;
use crate::compiler::aggregator::ExecutionPayload;
use crate::dsl::{Layout, PipelineKind};

// --- Interfaces ---

/// Persists the flat node snapshot of a page between sessions.
#[async_trait]
pub trait LayoutStore: Send + Sync {
    async fn save(&self, layout: &Layout) -> Result<()>;
    async fn load(&self, layout_id: &str) -> Result<Option<Layout>>;
    async fn list(&self) -> Result<Vec<String>>;
}

/// Keeps the last payload of a pipeline when dispatch fails.
#[async_trait]
pub trait BackupStore: Send + Sync {
    async fn save_payload(&self, pipeline: PipelineKind, payload: &ExecutionPayload) -> Result<()>;
    async fn load_payload(&self, pipeline: PipelineKind) -> Result<Option<ExecutionPayload>>;
}

// --- In-Memory Implementations ---

#[derive(Default)]
pub struct InMemoryLayoutStore {
    layouts: DashMap<String, Layout>,
}

impl InMemoryLayoutStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LayoutStore for InMemoryLayoutStore {
    async fn save(&self, layout: &Layout) -> Result<()> {
        self.layouts.insert(layout.id.clone(), layout.clone());
        Ok(())
    }

    async fn load(&self, layout_id: &str) -> Result<Option<Layout>> {
        Ok(self.layouts.get(layout_id).map(|l| l.value().clone()))
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.layouts.iter().map(|l| l.key().clone()).collect();
        ids.sort();
        Ok(ids)
    }
}

#[derive(Default)]
pub struct InMemoryBackupStore {
    payloads: DashMap<PipelineKind, ExecutionPayload>,
}

impl InMemoryBackupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BackupStore for InMemoryBackupStore {
    async fn save_payload(&self, pipeline: PipelineKind, payload: &ExecutionPayload) -> Result<()> {
        self.payloads.insert(pipeline, payload.clone());
        Ok(())
    }

    async fn load_payload(&self, pipeline: PipelineKind) -> Result<Option<ExecutionPayload>> {
        Ok(self.payloads.get(&pipeline).map(|p| p.value().clone()))
    }
}

// --- File Implementation ---

/// One JSON file per pipeline under `dir`.
pub struct FileBackupStore {
    dir: PathBuf,
}

impl FileBackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, pipeline: PipelineKind) -> PathBuf {
        self.dir.join(format!("{}_payload.json", pipeline))
    }
}

#[async_trait]
impl BackupStore for FileBackupStore {
    async fn save_payload(&self, pipeline: PipelineKind, payload: &ExecutionPayload) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create backup dir {}", self.dir.display()))?;
        let path = self.path_for(pipeline);
        let serialized = serde_json::to_vec_pretty(payload)?;
        tokio::fs::write(&path, serialized)
            .await
            .with_context(|| format!("Failed to write backup {}", path.display()))?;
        Ok(())
    }

    async fn load_payload(&self, pipeline: PipelineKind) -> Result<Option<ExecutionPayload>> {
        let path = self.path_for(pipeline);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let payload = serde_json::from_slice(&bytes)
                    .with_context(|| format!("Corrupt backup {}", path.display()))?;
                Ok(Some(payload))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read backup {}", path.display())),
        }
    }
}
