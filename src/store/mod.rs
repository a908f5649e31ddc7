//! Persistence layer. Everything goes through parameterized statements;
//! record fields are never spliced into SQL text.

pub mod accounts;
pub mod articles;

pub use accounts::AccountRepository;
pub use articles::{ArticleRepository, published_at_from_offset};

use crate::config::Config;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

/// The result of a dedupe-aware insert. A duplicate is a normal skip
/// outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Inserted,
    AlreadyExists,
}

/// Connect the pool and run migrations. Failure here is fatal-configuration:
/// the pipeline refuses to start against an unreachable or unmigratable
/// store.
pub async fn connect(config: &Config) -> anyhow::Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url())
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
