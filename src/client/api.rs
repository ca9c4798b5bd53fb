use async_trait::async_trait;
use reqwest::{Response, StatusCode};

use crate::domain::record::{NewRecord, RecordId, Resource};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Empty input, caught before any request is made.
    #[error("text must not be empty")]
    Validation,
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("backend answered {0}")]
    Status(StatusCode),
    /// The backend answered an update with its "not found" sentinel.
    #[error("record {0} no longer exists")]
    Gone(RecordId),
}

/// The four CRUD calls the client makes for one resource family.
#[async_trait]
pub trait ResourceApi<R: Resource>: Send + Sync {
    async fn list(&self) -> Result<Vec<R>, ClientError>;
    async fn create(&self, input: &NewRecord) -> Result<R, ClientError>;
    /// `Ok(None)` when the backend no longer holds the record.
    async fn update(&self, id: &RecordId, patch: &R::Patch) -> Result<Option<R>, ClientError>;
    async fn delete(&self, id: &RecordId) -> Result<(), ClientError>;
}

/// `reqwest`-backed API rooted at the configured base URL.
#[derive(Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn collection<R: Resource>(&self) -> String { format!("{}/{}", self.base_url, R::LABELS.plural) }

    fn item<R: Resource>(&self, id: &RecordId) -> String { format!("{}/{}", self.collection::<R>(), id) }
}

fn ensure_success(res: Response) -> Result<Response, ClientError> {
    let status = res.status();
    if status.is_success() { Ok(res) } else { Err(ClientError::Status(status)) }
}

#[async_trait]
impl<R: Resource> ResourceApi<R> for HttpApi {
    async fn list(&self) -> Result<Vec<R>, ClientError> {
        let res = ensure_success(self.client.get(self.collection::<R>()).send().await?)?;
        Ok(res.json().await?)
    }

    async fn create(&self, input: &NewRecord) -> Result<R, ClientError> {
        let res = ensure_success(self.client.post(self.collection::<R>()).json(input).send().await?)?;
        Ok(res.json().await?)
    }

    async fn update(&self, id: &RecordId, patch: &R::Patch) -> Result<Option<R>, ClientError> {
        tracing::debug!(%id, kind = R::LABELS.singular, "sending update");
        let res = ensure_success(self.client.put(self.item::<R>(id)).json(patch).send().await?)?;
        Ok(res.json().await?)
    }

    async fn delete(&self, id: &RecordId) -> Result<(), ClientError> {
        ensure_success(self.client.delete(self.item::<R>(id)).send().await?)?;
        Ok(())
    }
}
