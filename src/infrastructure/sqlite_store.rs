use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::{SqlitePoolOptions, SqliteRow}, Pool, Row, Sqlite};

use crate::domain::{
    feedback::{Feedback, FeedbackPatch},
    record::{NewRecord, RecordId},
    store::Store,
    todo::{Todo, TodoPatch},
};

/// One SQLite database holding both collections.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqlitePoolOptions::new();
        // Every connection to an in-memory database is a fresh database.
        let options = if database_url.contains(":memory:") {
            options.max_connections(1).idle_timeout(None).max_lifetime(None)
        } else {
            options.max_connections(5)
        };
        let pool = options
            .connect(database_url)
            .await
            .with_context(|| format!("connect to sqlite via {database_url}"))?;
        Ok(Self { pool: Arc::new(pool) })
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS todos (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&*self.pool)
        .await
        .context("create todos table")?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS feedbacks (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&*self.pool)
        .await
        .context("create feedbacks table")?;
        Ok(())
    }
}

// Fixed-width nanosecond stamps keep TEXT ordering equal to time ordering.
fn timestamp(at: DateTime<Utc>) -> String { at.to_rfc3339_opts(SecondsFormat::Nanos, true) }

fn parse_timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.try_get(column)?;
    Ok(DateTime::parse_from_rfc3339(&raw)
        .with_context(|| format!("bad {column} value {raw:?}"))?
        .with_timezone(&Utc))
}

#[async_trait]
impl Store<Todo> for SqliteStore {
    async fn insert(&self, input: NewRecord) -> Result<Todo> {
        let now = Utc::now();
        let id = RecordId::generate();
        sqlx::query(
            "INSERT INTO todos (id, text, completed, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(id.as_str())
        .bind(&input.text)
        .bind(false)
        .bind(timestamp(now))
        .bind(timestamp(now))
        .execute(&*self.pool)
        .await
        .context("insert todo")?;
        Ok(Todo { id, text: input.text, completed: false, created_at: now, updated_at: now })
    }

    async fn list_all(&self) -> Result<Vec<Todo>> {
        let rows = sqlx::query("SELECT id, text, completed, created_at, updated_at FROM todos ORDER BY created_at DESC, rowid DESC")
            .fetch_all(&*self.pool)
            .await
            .context("list todos")?;
        rows.iter().map(row_to_todo).collect()
    }

    async fn replace(&self, id: &RecordId, patch: TodoPatch) -> Result<Option<Todo>> {
        let row = sqlx::query(
            "UPDATE todos SET text = COALESCE(?2, text), completed = COALESCE(?3, completed), updated_at = ?4
             WHERE id = ?1
             RETURNING id, text, completed, created_at, updated_at",
        )
        .bind(id.as_str())
        .bind(patch.text)
        .bind(patch.completed)
        .bind(timestamp(Utc::now()))
        .fetch_optional(&*self.pool)
        .await
        .context("update todo")?;
        row.as_ref().map(row_to_todo).transpose()
    }

    async fn delete_by_id(&self, id: &RecordId) -> Result<()> {
        sqlx::query("DELETE FROM todos WHERE id = ?1")
            .bind(id.as_str())
            .execute(&*self.pool)
            .await
            .context("delete todo")?;
        Ok(())
    }
}

#[async_trait]
impl Store<Feedback> for SqliteStore {
    async fn insert(&self, input: NewRecord) -> Result<Feedback> {
        let now = Utc::now();
        let id = RecordId::generate();
        sqlx::query("INSERT INTO feedbacks (id, text, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(id.as_str())
            .bind(&input.text)
            .bind(timestamp(now))
            .bind(timestamp(now))
            .execute(&*self.pool)
            .await
            .context("insert feedback")?;
        Ok(Feedback { id, text: input.text, created_at: now, updated_at: now })
    }

    async fn list_all(&self) -> Result<Vec<Feedback>> {
        let rows = sqlx::query("SELECT id, text, created_at, updated_at FROM feedbacks ORDER BY created_at DESC, rowid DESC")
            .fetch_all(&*self.pool)
            .await
            .context("list feedbacks")?;
        rows.iter().map(row_to_feedback).collect()
    }

    async fn replace(&self, id: &RecordId, patch: FeedbackPatch) -> Result<Option<Feedback>> {
        let row = sqlx::query(
            "UPDATE feedbacks SET text = COALESCE(?2, text), updated_at = ?3
             WHERE id = ?1
             RETURNING id, text, created_at, updated_at",
        )
        .bind(id.as_str())
        .bind(patch.text)
        .bind(timestamp(Utc::now()))
        .fetch_optional(&*self.pool)
        .await
        .context("update feedback")?;
        row.as_ref().map(row_to_feedback).transpose()
    }

    async fn delete_by_id(&self, id: &RecordId) -> Result<()> {
        sqlx::query("DELETE FROM feedbacks WHERE id = ?1")
            .bind(id.as_str())
            .execute(&*self.pool)
            .await
            .context("delete feedback")?;
        Ok(())
    }
}

fn row_to_todo(row: &SqliteRow) -> Result<Todo> {
    Ok(Todo {
        id: RecordId(row.try_get("id")?),
        text: row.try_get("text")?,
        completed: row.try_get("completed")?,
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    })
}

fn row_to_feedback(row: &SqliteRow) -> Result<Feedback> {
    Ok(Feedback {
        id: RecordId(row.try_get("id")?),
        text: row.try_get("text")?,
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        store.init().await.unwrap();
        store
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let store = store().await;
        for text in ["t1", "t2", "t3"] {
            Store::<Todo>::insert(&store, NewRecord::new(text)).await.unwrap();
        }
        let texts: Vec<String> = Store::<Todo>::list_all(&store).await.unwrap().into_iter().map(|t| t.text).collect();
        assert_eq!(texts, ["t3", "t2", "t1"]);
    }

    #[tokio::test]
    async fn replace_keeps_identity_and_unspecified_fields() {
        let store = store().await;
        let created = Store::<Todo>::insert(&store, NewRecord::new("Buy milk")).await.unwrap();
        let updated = Store::<Todo>::replace(&store, &created.id, TodoPatch { text: None, completed: Some(true) })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.text, "Buy milk");
        assert!(updated.completed);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn feedback_replace_rewrites_text_only() {
        let store = store().await;
        let created = Store::<Feedback>::insert(&store, NewRecord::new("a")).await.unwrap();
        let updated = Store::<Feedback>::replace(&store, &created.id, FeedbackPatch { text: Some("b".into()) })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.text, "b");
        assert_eq!(Store::<Feedback>::list_all(&store).await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn replace_of_unknown_id_is_none() {
        let store = store().await;
        let missing = Store::<Feedback>::replace(&store, &RecordId::from("nope"), FeedbackPatch { text: Some("x".into()) }).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_collections_are_separate() {
        let store = store().await;
        let todo = Store::<Todo>::insert(&store, NewRecord::new("a")).await.unwrap();
        let feedback = Store::<Feedback>::insert(&store, NewRecord::new("b")).await.unwrap();
        Store::<Todo>::delete_by_id(&store, &todo.id).await.unwrap();
        Store::<Todo>::delete_by_id(&store, &todo.id).await.unwrap();
        assert!(Store::<Todo>::list_all(&store).await.unwrap().is_empty());
        let remaining = Store::<Feedback>::list_all(&store).await.unwrap();
        assert_eq!(remaining, vec![feedback]);
    }

    #[tokio::test]
    async fn accepts_empty_text() {
        let store = store().await;
        let todo = Store::<Todo>::insert(&store, NewRecord::new("")).await.unwrap();
        assert_eq!(todo.text, "");
        assert!(!todo.completed);
    }
}
