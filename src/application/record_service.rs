use async_trait::async_trait;

use crate::domain::{
    record::{NewRecord, RecordId, Resource},
    store::Store,
};

/// How much the service checks before touching the store.
///
/// `Lenient` accepts empty text and answers an update of an unknown id with
/// the store's "not found" sentinel. `Strict` rejects both with distinct
/// errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("record {0} not found")]
    NotFound(RecordId),
    #[error("persistence failure: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

#[async_trait]
pub trait RecordService<R: Resource>: Send + Sync + 'static {
    async fn list(&self) -> Result<Vec<R>, ServiceError>;
    async fn create(&self, input: NewRecord) -> Result<R, ServiceError>;
    /// `Ok(None)` only in lenient mode, for an id the store does not hold.
    async fn update(&self, id: RecordId, patch: R::Patch) -> Result<Option<R>, ServiceError>;
    async fn delete(&self, id: RecordId) -> Result<(), ServiceError>;
}

#[derive(Clone)]
pub struct RecordServiceImpl<S> {
    store: S,
    mode: ValidationMode,
}

impl<S> RecordServiceImpl<S> {
    pub fn new(store: S) -> Self { Self::with_mode(store, ValidationMode::default()) }

    pub fn with_mode(store: S, mode: ValidationMode) -> Self { Self { store, mode } }

    fn check_text<R: Resource>(&self, text: Option<&str>) -> Result<(), ServiceError> {
        match (self.mode, text) {
            (ValidationMode::Strict, Some(t)) if t.trim().is_empty() => {
                Err(ServiceError::Validation(format!("{} text must not be empty", R::LABELS.display)))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<R: Resource, S: Store<R>> RecordService<R> for RecordServiceImpl<S> {
    async fn list(&self) -> Result<Vec<R>, ServiceError> { Ok(self.store.list_all().await?) }

    async fn create(&self, input: NewRecord) -> Result<R, ServiceError> {
        self.check_text::<R>(Some(&input.text))?;
        let record = self.store.insert(input).await?;
        tracing::info!(id = %record.id(), kind = R::LABELS.singular, "created");
        Ok(record)
    }

    async fn update(&self, id: RecordId, patch: R::Patch) -> Result<Option<R>, ServiceError> {
        self.check_text::<R>(R::patch_text(&patch))?;
        let updated = self.store.replace(&id, patch).await?;
        match (updated, self.mode) {
            (None, ValidationMode::Strict) => Err(ServiceError::NotFound(id)),
            (None, ValidationMode::Lenient) => {
                tracing::warn!(%id, kind = R::LABELS.singular, "update matched no record");
                Ok(None)
            }
            (Some(record), _) => {
                tracing::info!(%id, kind = R::LABELS.singular, "updated");
                Ok(Some(record))
            }
        }
    }

    async fn delete(&self, id: RecordId) -> Result<(), ServiceError> {
        self.store.delete_by_id(&id).await?;
        tracing::info!(%id, kind = R::LABELS.singular, "deleted");
        Ok(())
    }
}
