use crate::scrape::types::ArticleRecord;
use crate::store::StoreOutcome;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::MySqlPool;
use tracing::info;

/// `updateTime` is stored as the Unix epoch plus an integer-second offset.
pub fn published_at_from_offset(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(seconds)
}

/// Repository for article records, deduplicated by exact title.
pub struct ArticleRepository<'a> {
    pool: &'a MySqlPool,
}

impl<'a> ArticleRepository<'a> {
    pub fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// Exact-match existence check by title.
    pub async fn exists(&self, title: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE title = ?")
            .bind(title)
            .fetch_one(self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Atomic compare-and-insert against the unique title index. Two workers
    /// racing on the same title cannot both insert; the loser sees
    /// `AlreadyExists`.
    pub async fn insert_if_absent(&self, record: &ArticleRecord) -> Result<StoreOutcome> {
        let update_time = record.publish_time.map(published_at_from_offset);

        let result = sqlx::query(
            r#"
            INSERT IGNORE INTO articles
                (`title`, `poster`, `authorId`, `authorAvatar`, `authorName`,
                 `col`, `description`, `content`, `updateTime`, `tag`, `likes`, `type`)
            VALUES (?, ?, NULL, ?, ?, ?, ?, ?, ?, 0, 0, 0)
            "#,
        )
        .bind(&record.title)
        .bind(&record.poster)
        .bind(&record.author_avatar)
        .bind(&record.author_name)
        .bind(&record.column)
        .bind(&record.description)
        .bind(record.content.trim())
        .bind(update_time)
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(title = %record.title, "article stored");
            Ok(StoreOutcome::Inserted)
        } else {
            info!(title = %record.title, "article already exists, skipped");
            Ok(StoreOutcome::AlreadyExists)
        }
    }
}
