use async_trait::async_trait;
use anyhow::Result;
use redis::AsyncCommands;
use crate::compiler::aggregator::ExecutionPayload;
use crate::dsl::{Layout, PipelineKind};
use crate::runtime::storage::{BackupStore, LayoutStore};

pub struct RedisLayoutStore {
    client: redis::Client,
}

impl RedisLayoutStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn layout_key(&self, layout_id: &str) -> String {
        format!("chainflow:layout:{}", layout_id)
    }

    fn index_key(&self) -> &'static str {
        "chainflow:layouts"
    }
}

#[async_trait]
impl LayoutStore for RedisLayoutStore {
    async fn save(&self, layout: &Layout) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let serialized = serde_json::to_string(layout)?;
        let _: () = conn.set(self.layout_key(&layout.id), serialized).await?;
        let _: () = conn.sadd(self.index_key(), &layout.id).await?;
        Ok(())
    }

    async fn load(&self, layout_id: &str) -> Result<Option<Layout>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(self.layout_key(layout_id)).await?;

        if let Some(s) = raw {
            Ok(Some(serde_json::from_str(&s)?))
        } else {
            Ok(None)
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let mut ids: Vec<String> = conn.smembers(self.index_key()).await?;
        ids.sort();
        Ok(ids)
    }
}

pub struct RedisBackupStore {
    client: redis::Client,
}

impl RedisBackupStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn backup_key(&self, pipeline: PipelineKind) -> String {
        format!("chainflow:backup:{}", pipeline)
    }
}

#[async_trait]
impl BackupStore for RedisBackupStore {
    async fn save_payload(&self, pipeline: PipelineKind, payload: &ExecutionPayload) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let serialized = serde_json::to_string(payload)?;
        let _: () = conn.set(self.backup_key(pipeline), serialized).await?;
        Ok(())
    }

    async fn load_payload(&self, pipeline: PipelineKind) -> Result<Option<ExecutionPayload>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(self.backup_key(pipeline)).await?;

        if let Some(s) = raw {
            Ok(Some(serde_json::from_str(&s)?))
        } else {
            Ok(None)
        }
    }
}
