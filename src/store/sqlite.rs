use crate::{utils, BlobIoError, BlobStore};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use tracing::debug;

/// Blobs as rows of one table per container.
pub struct SqliteBlobStore {
    name: String,
    pool: SqlitePool,
}

impl SqliteBlobStore {
    pub async fn new(path: &str, container: &str) -> Result<SqliteBlobStore, BlobIoError> {
        let opt = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opt).await?;
        let store = SqliteBlobStore {
            name: table_name(container),
            pool,
        };
        store.create().await?;
        Ok(store)
    }

    pub fn get_name(&self) -> &str {
        self.name.as_str()
    }

    async fn create(&self) -> Result<(), sqlx::Error> {
        if !utils::is_table_exists(&self.pool, &self.name).await? {
            let query = format!(
                "CREATE TABLE {} (
                    id TEXT PRIMARY KEY,
                    content TEXT NOT NULL,
                    updated_at DATETIME
                 )",
                &self.name
            );
            sqlx::query(query.as_str()).execute(&self.pool).await?;
            debug!("Created {}", self.name);
        }
        Ok(())
    }
}

// Container names are lowercase letters, digits and dashes.
fn table_name(container: &str) -> String {
    let cleaned: String = container
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_blobs", cleaned)
}

#[async_trait::async_trait]
impl BlobStore for SqliteBlobStore {
    async fn read(&self, id: &str) -> Result<Option<String>, BlobIoError> {
        let query = format!("SELECT content FROM {} WHERE id = ?", self.name);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(row.try_get::<String, _>("content")?)),
            None => Ok(None),
        }
    }

    async fn write(&self, id: &str, text: &str) -> Result<(), BlobIoError> {
        let mut tx = self.pool.begin().await?;
        let query = format!(
            "INSERT INTO {} (id, content, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET content = excluded.content, updated_at = excluded.updated_at",
            self.name
        );
        sqlx::query(&query)
            .bind(id)
            .bind(text)
            .bind(Utc::now())
            .execute(&mut tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn exists(&self, id: &str) -> Result<bool, BlobIoError> {
        let query = format!("SELECT id FROM {} WHERE id = ?", self.name);
        Ok(sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .is_some())
    }
}
