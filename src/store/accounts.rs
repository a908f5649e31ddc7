use crate::scrape::types::AccountProfile;
use crate::store::StoreOutcome;
use anyhow::Result;
use sqlx::MySqlPool;
use tracing::info;

/// Repository for publishing-account profiles, keyed by handle.
pub struct AccountRepository<'a> {
    pool: &'a MySqlPool,
}

impl<'a> AccountRepository<'a> {
    pub fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// Insert a profile unless its handle is already stored.
    pub async fn insert_if_absent(&self, profile: &AccountProfile) -> Result<StoreOutcome> {
        let result = sqlx::query(
            r#"
            INSERT IGNORE INTO gzh
                (`title`, `wechatid`, `avatar`, `qrcode`, `introduction`, `verification`)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&profile.title)
        .bind(&profile.wechat_id)
        .bind(&profile.avatar)
        .bind(&profile.qrcode)
        .bind(&profile.introduction)
        .bind(&profile.verification)
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(handle = %profile.wechat_id, "account profile stored");
            Ok(StoreOutcome::Inserted)
        } else {
            Ok(StoreOutcome::AlreadyExists)
        }
    }
}
