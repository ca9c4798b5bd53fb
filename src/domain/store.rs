use async_trait::async_trait;

use super::record::{NewRecord, RecordId, Resource};

/// Durable collection of one resource family.
#[async_trait]
pub trait Store<R: Resource>: Send + Sync + 'static {
    /// Store assigns `id`, timestamps and family defaults.
    async fn insert(&self, input: NewRecord) -> anyhow::Result<R>;
    /// Newest first by `createdAt`.
    async fn list_all(&self) -> anyhow::Result<Vec<R>>;
    /// `None` when no record has this id.
    async fn replace(&self, id: &RecordId, patch: R::Patch) -> anyhow::Result<Option<R>>;
    /// Succeeds whether or not the record existed.
    async fn delete_by_id(&self, id: &RecordId) -> anyhow::Result<()>;
}
