use std::path::{Path, PathBuf};

use anyhow::Context;
use sqlx::{
    Row,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous},
};

use crate::core::db::{DocumentStore, document::{Document, created_at}};

/// Document store backed by a SQLite file.
///
/// Bodies are kept as JSON text; the `createdAt` timestamp is copied into
/// indexed columns so listings can be ordered without decoding every body.
pub struct SqliteDocumentStore {
    database: PathBuf,
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDocumentStore")
            .field("database", &self.database)
            .finish()
    }
}

impl SqliteDocumentStore {
    pub async fn open<P: AsRef<Path>>(database: P) -> anyhow::Result<Self> {
        let database = database.as_ref().to_path_buf();

        if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create database directory {:?}", parent))?;
        }

        let connect_opts = SqliteConnectOptions::new()
            .filename(&database)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_opts)
            .await
            .with_context(|| format!("Failed to open document database {:?}", database))?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!("Opened document database {:?}", database);

        Ok(Self { database, pool })
    }

    pub fn database(&self) -> &Path {
        &self.database
    }

    /// Checkpoints the WAL and closes the pool. Further use will fail.
    pub async fn close(&self) -> anyhow::Result<()> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE);")
            .execute(&self.pool)
            .await?;
        self.pool.close().await;
        Ok(())
    }
}

fn decode_body(id: &str, body: &str) -> anyhow::Result<Document> {
    serde_json::from_str(body).with_context(|| format!("Corrupt document body for {id}"))
}

impl DocumentStore for SqliteDocumentStore {
    async fn list(&self, collection: &str) -> anyhow::Result<Vec<(String, Document)>> {
        let rows = sqlx::query(
            r#"SELECT id, body FROM document
            WHERE collection = ?1
            ORDER BY created_seconds IS NULL, created_seconds DESC, created_nanos DESC, id ASC"#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let body: String = row.try_get("body")?;
            match decode_body(&id, &body) {
                Ok(document) => documents.push((id, document)),
                Err(e) => {
                    tracing::warn!(collection, document_id = %id, "Skipping corrupt document: {e:#}")
                }
            }
        }
        Ok(documents)
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query(r#"SELECT body FROM document WHERE collection = ?1 AND id = ?2"#)
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let body: String = row.try_get("body")?;
                Ok(Some(decode_body(id, &body)?))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, collection: &str, id: &str, document: Document) -> anyhow::Result<()> {
        let timestamp = created_at(&document);
        let created_seconds = timestamp.map(|ts| ts.seconds);
        let created_nanos = timestamp.map(|ts| i64::from(ts.nanos));
        let body = serde_json::to_string(&document)?;
        sqlx::query(
            r#"INSERT INTO document (collection, id, created_seconds, created_nanos, body)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (collection, id) DO UPDATE SET
                created_seconds = excluded.created_seconds,
                created_nanos = excluded.created_nanos,
                body = excluded.body"#,
        )
        .bind(collection)
        .bind(id)
        .bind(created_seconds)
        .bind(created_nanos)
        .bind(body)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        sqlx::query(r#"DELETE FROM document WHERE collection = ?1 AND id = ?2"#)
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::document::{CREATED_AT_FIELD, DocValue, Timestamp};

    #[tokio::test]
    async fn corrupt_rows_are_skipped_in_listings() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let store = SqliteDocumentStore::open(dir.path().join("catalog.db")).await?;

        let mut good = Document::new();
        good.insert(
            CREATED_AT_FIELD.into(),
            DocValue::Timestamp(Timestamp { seconds: 5, nanos: 0 }),
        );
        store.put("projects", "good", good.clone()).await?;
        sqlx::query(
            r#"INSERT INTO document (collection, id, created_seconds, created_nanos, body)
            VALUES ('projects', 'broken', 9, 0, 'not json')"#,
        )
        .execute(&store.pool)
        .await?;

        let listed = store.list("projects").await?;
        assert_eq!(listed, [("good".to_string(), good)]);
        assert!(store.get("projects", "broken").await.is_err());
        Ok(())
    }
}
