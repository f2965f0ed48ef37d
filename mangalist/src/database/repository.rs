//! SQLite-backed manga collection
//!
//! Implements the same contract as the remote store, one row per record.
//! Field names are mapped to columns through `MangaField`, never
//! interpolated from caller input.

use super::models::*;
use crate::error::{AppError, Result};
use crate::remote::CollectionClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::query::Query;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct MangaRow {
    id: String,
    title: Option<String>,
    status: Option<String>,
    priority: Option<i64>,
    last_chapter_read: Option<i64>,
    released_chapters: Option<i64>,
    hot: bool,
    is_publication_stopped: bool,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

impl MangaRow {
    fn into_entry(self) -> (String, MangaDocument) {
        let doc = MangaDocument {
            title: self.title,
            status: self.status.filter(|s| !s.is_empty()).map(Status::from),
            priority: self.priority,
            last_chapter_read: self.last_chapter_read.and_then(|n| u32::try_from(n).ok()),
            released_chapters: self.released_chapters.and_then(|n| u32::try_from(n).ok()),
            hot: self.hot,
            is_publication_stopped: self.is_publication_stopped,
        };
        (self.id, doc)
    }
}

/// Bind the typed value of `field` taken from `doc`
fn bind_field<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    field: MangaField,
    doc: &MangaDocument,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match field {
        MangaField::Title => query.bind(doc.title.clone()),
        MangaField::Status => query.bind(doc.status.clone().map(String::from)),
        MangaField::Priority => query.bind(doc.priority),
        MangaField::LastChapterRead => query.bind(doc.last_chapter_read.map(i64::from)),
        MangaField::ReleasedChapters => query.bind(doc.released_chapters.map(i64::from)),
        MangaField::Hot => query.bind(doc.hot),
        MangaField::IsPublicationStopped => query.bind(doc.is_publication_stopped),
    }
}

/// Offline collection stored in SQLite
#[derive(Clone)]
pub struct SqliteCollection {
    pool: SqlitePool,
}

impl SqliteCollection {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CollectionClient for SqliteCollection {
    async fn fetch_all(&self) -> Result<RawCollection> {
        let rows = sqlx::query_as::<_, MangaRow>("SELECT * FROM mangas")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(MangaRow::into_entry).collect())
    }

    async fn write_field(&self, id: &str, field: MangaField, value: Value) -> Result<()> {
        let mut doc = MangaDocument::default();
        doc.set(field, &value);

        let sql = format!("UPDATE mangas SET {} = ? WHERE id = ?", field.column());
        let rows = bind_field(sqlx::query(&sql), field, &doc)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::MangaNotFound(id.to_string()));
        }

        tracing::debug!("Wrote {} on manga: {}", field, id);
        Ok(())
    }

    async fn write_record(&self, record: &MangaDocument) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO mangas (id, title, status, priority, last_chapter_read,
                                released_chapters, hot, is_publication_stopped, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(record.title.clone())
        .bind(record.status.clone().map(String::from))
        .bind(record.priority)
        .bind(record.last_chapter_read.map(i64::from))
        .bind(record.released_chapters.map(i64::from))
        .bind(record.hot)
        .bind(record.is_publication_stopped)
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Inserted manga: {}", id);
        Ok(id)
    }

    async fn delete_record(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM mangas WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Deleted manga: {}", id);
        Ok(())
    }

    async fn query_by_field(&self, field: MangaField, value: &Value) -> Result<RawCollection> {
        let rows = if value.is_null() {
            let sql = format!("SELECT * FROM mangas WHERE {} IS NULL", field.column());
            sqlx::query_as::<_, MangaRow>(&sql).fetch_all(&self.pool).await?
        } else {
            let mut doc = MangaDocument::default();
            doc.set(field, value);
            let sql = format!("SELECT * FROM mangas WHERE {} = ?", field.column());
            let mut query = sqlx::query_as::<_, MangaRow>(&sql);
            query = match field {
                MangaField::Title => query.bind(doc.title),
                MangaField::Status => query.bind(doc.status.map(String::from)),
                MangaField::Priority => query.bind(doc.priority),
                MangaField::LastChapterRead => query.bind(doc.last_chapter_read.map(i64::from)),
                MangaField::ReleasedChapters => query.bind(doc.released_chapters.map(i64::from)),
                MangaField::Hot => query.bind(doc.hot),
                MangaField::IsPublicationStopped => query.bind(doc.is_publication_stopped),
            };
            query.fetch_all(&self.pool).await?
        };

        Ok(rows.into_iter().map(MangaRow::into_entry).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::initialize_database;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_collection() -> SqliteCollection {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        SqliteCollection::new(pool)
    }

    fn doc(title: &str, status: Status) -> MangaDocument {
        MangaDocument {
            title: Some(title.to_string()),
            status: Some(status),
            ..MangaDocument::default()
        }
    }

    #[tokio::test]
    async fn test_write_and_fetch_record() {
        let collection = create_test_collection().await;

        let id = collection
            .write_record(&MangaDocument {
                released_chapters: Some(120),
                ..doc("Berserk", Status::InProgress)
            })
            .await
            .unwrap();

        let all = collection.fetch_all().await.unwrap();
        assert_eq!(all.len(), 1);
        let stored = &all[&id];
        assert_eq!(stored.title.as_deref(), Some("Berserk"));
        assert_eq!(stored.status, Some(Status::InProgress));
        assert_eq!(stored.released_chapters, Some(120));
        assert_eq!(stored.last_chapter_read, None);
    }

    #[tokio::test]
    async fn test_write_field() {
        let collection = create_test_collection().await;
        let id = collection.write_record(&doc("Monster", Status::ToRead)).await.unwrap();

        collection
            .write_field(&id, MangaField::LastChapterRead, json!(42))
            .await
            .unwrap();
        collection
            .write_field(&id, MangaField::IsPublicationStopped, json!(true))
            .await
            .unwrap();
        collection
            .write_field(&id, MangaField::Priority, Value::Null)
            .await
            .unwrap();

        let stored = collection.fetch_all().await.unwrap().remove(&id).unwrap();
        assert_eq!(stored.last_chapter_read, Some(42));
        assert!(stored.is_publication_stopped);
        assert_eq!(stored.priority, None);
    }

    #[tokio::test]
    async fn test_write_field_unknown_id() {
        let collection = create_test_collection().await;

        let result = collection.write_field("missing", MangaField::Hot, json!(true)).await;
        assert!(matches!(result, Err(AppError::MangaNotFound(_))));
    }

    #[tokio::test]
    async fn test_query_by_field() {
        let collection = create_test_collection().await;
        collection.write_record(&doc("Monster", Status::Finished)).await.unwrap();
        collection.write_record(&doc("Pluto", Status::Finished)).await.unwrap();
        collection.write_record(&doc("20th Century Boys", Status::ToRead)).await.unwrap();

        let by_title = collection
            .query_by_field(MangaField::Title, &json!("Pluto"))
            .await
            .unwrap();
        assert_eq!(by_title.len(), 1);

        let finished = collection
            .query_by_field(MangaField::Status, &json!("finished"))
            .await
            .unwrap();
        assert_eq!(finished.len(), 2);

        let unranked = collection
            .query_by_field(MangaField::Priority, &Value::Null)
            .await
            .unwrap();
        assert_eq!(unranked.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_record() {
        let collection = create_test_collection().await;
        let id = collection.write_record(&doc("Akira", Status::Finished)).await.unwrap();

        collection.delete_record(&id).await.unwrap();

        assert!(collection.fetch_all().await.unwrap().is_empty());
    }
}
