use crate::config::Config;
use crate::fetcher::{FetchError, PageResponse};
use crate::images::ImageStore;
use crate::pipeline::backoff::calculate_backoff_delay;
use crate::pipeline::{RunReport, Task};
use crate::renderer::Renderer;
use crate::scrape::{
    ScrapeError, SearchQuery, extract_account_profiles, extract_article_detail, extract_feed,
    extract_listing, resolve_account_page_url,
};
use crate::scrape::types::ArticleRecord;
use crate::store::{AccountRepository, ArticleRepository, StoreOutcome};
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const PAGE_RETRY_BASE_MS: u64 = 1000;

/// Shared state handed to every worker.
pub(crate) struct TaskContext {
    pub config: Config,
    pub pool: MySqlPool,
    pub images: ImageStore,
    /// Image-download budget, deliberately separate from page concurrency.
    pub image_budget: Arc<Semaphore>,
    pub cancel: CancellationToken,
}

/// An article waiting to be resolved through its detail page. Both the
/// keyword path and the feed path funnel into this shape.
struct PendingArticle {
    title: String,
    url: String,
    poster: Option<String>,
    /// Author name already known from the source (feed entries carry one);
    /// used when the detail page has none.
    author_hint: String,
    description: String,
    publish_time: Option<i64>,
    column: String,
}

pub(crate) async fn process_task(
    ctx: &TaskContext,
    renderer: &dyn Renderer,
    task: Task,
) -> RunReport {
    match task {
        Task::Search { keyword, page } => process_search(ctx, renderer, &keyword, page).await,
        Task::Accounts { keyword, page } => process_accounts(ctx, renderer, &keyword, page).await,
        Task::Feed { handle } => process_feed(ctx, renderer, &handle).await,
    }
}

/// One page of keyword search results.
async fn process_search(
    ctx: &TaskContext,
    renderer: &dyn Renderer,
    keyword: &str,
    page: u32,
) -> RunReport {
    let mut report = RunReport::default();
    let url = SearchQuery::new(keyword, page).build_url(ctx.config.article_search_url());

    let listing = match render_with_retry(ctx, renderer, &url).await {
        Ok(page) => page,
        Err(e) => {
            warn!(keyword, page, error = %e, "listing fetch abandoned");
            report.skipped_network += 1;
            return report;
        }
    };

    let candidates = extract_listing(&listing.body);
    info!(keyword, page, count = candidates.len(), "listing extracted");

    for candidate in candidates {
        if ctx.cancel.is_cancelled() {
            break;
        }
        let pending = PendingArticle {
            title: candidate.title,
            url: candidate.url,
            poster: candidate.posters.into_iter().next(),
            author_hint: String::new(),
            description: candidate.description,
            publish_time: candidate.publish_time,
            // The account name doubles as the collection tag for keyword
            // results.
            column: candidate.account_name,
        };
        ingest_article(ctx, renderer, pending, &mut report).await;
    }
    report
}

/// One page of account search results, persisted as profiles.
async fn process_accounts(
    ctx: &TaskContext,
    renderer: &dyn Renderer,
    keyword: &str,
    page: u32,
) -> RunReport {
    let mut report = RunReport::default();
    let url = SearchQuery::new(keyword, page).build_url(ctx.config.account_search_url());

    let listing = match render_with_retry(ctx, renderer, &url).await {
        Ok(page) => page,
        Err(e) => {
            warn!(keyword, page, error = %e, "account listing fetch abandoned");
            report.skipped_network += 1;
            return report;
        }
    };

    let profiles = extract_account_profiles(&listing.body);
    info!(keyword, page, count = profiles.len(), "account profiles extracted");

    let repo = AccountRepository::new(&ctx.pool);
    for profile in &profiles {
        if ctx.cancel.is_cancelled() {
            break;
        }
        match repo.insert_if_absent(profile).await {
            Ok(StoreOutcome::Inserted) => report.profiles_stored += 1,
            Ok(StoreOutcome::AlreadyExists) => {}
            Err(e) => {
                warn!(handle = %profile.wechat_id, error = %e, "profile store failed");
                report.store_errors += 1;
            }
        }
    }
    report
}

/// An account's embedded message feed: resolve the account page through the
/// handle search, parse the embedded document, then run every message
/// through the same article path as keyword results.
async fn process_feed(ctx: &TaskContext, renderer: &dyn Renderer, handle: &str) -> RunReport {
    let mut report = RunReport::default();
    let search_url = SearchQuery::new(handle, 1).build_url(ctx.config.account_search_url());

    let search_page = match render_with_retry(ctx, renderer, &search_url).await {
        Ok(page) => page,
        Err(e) => {
            warn!(handle, error = %e, "account search fetch abandoned");
            report.skipped_network += 1;
            return report;
        }
    };

    let Some(account_url) = resolve_account_page_url(&search_page.body) else {
        warn!(handle, error = %ScrapeError::AccountNotFound(handle.to_string()), "feed skipped");
        report.skipped_malformed += 1;
        return report;
    };

    let account_page = match render_with_retry(ctx, renderer, &account_url).await {
        Ok(page) => page,
        Err(e) => {
            warn!(handle, error = %e, "account page fetch abandoned");
            report.skipped_network += 1;
            return report;
        }
    };

    let messages = match extract_feed(&account_page.body, ctx.config.feed_host()) {
        Ok(messages) => messages,
        Err(e) => {
            warn!(handle, error = %e, "feed skipped");
            report.skipped_malformed += 1;
            return report;
        }
    };
    info!(handle, count = messages.len(), "feed extracted");

    for message in messages {
        if ctx.cancel.is_cancelled() {
            break;
        }
        let pending = PendingArticle {
            title: message.title,
            url: message.url,
            poster: (!message.poster.is_empty()).then_some(message.poster),
            author_hint: message.author_name,
            description: message.description,
            publish_time: Some(message.publish_time),
            column: handle.to_string(),
        };
        ingest_article(ctx, renderer, pending, &mut report).await;
    }
    report
}

/// Resolve one candidate through its detail page, rewrite its images, and
/// persist it. Every outcome is counted on the report.
async fn ingest_article(
    ctx: &TaskContext,
    renderer: &dyn Renderer,
    pending: PendingArticle,
    report: &mut RunReport,
) {
    let repo = ArticleRepository::new(&ctx.pool);

    // Cheap pre-check; the unique index still guards the race.
    match repo.exists(&pending.title).await {
        Ok(true) => {
            info!(title = %pending.title, "already exists, skipped");
            report.duplicates += 1;
            return;
        }
        Ok(false) => {}
        Err(e) => {
            warn!(title = %pending.title, error = %e, "existence check failed");
            report.store_errors += 1;
            return;
        }
    }

    // Listing hrefs arrive with entity-mangled ampersands.
    let url = pending.url.replace("amp;", "");

    let detail_page = match render_with_retry(ctx, renderer, &url).await {
        Ok(page) => page,
        Err(e) => {
            warn!(title = %pending.title, error = %e, "detail fetch abandoned");
            report.skipped_network += 1;
            return;
        }
    };
    let detail = extract_article_detail(&detail_page.body);

    let (content, rewrite) = ctx
        .images
        .rewrite_content(
            detail.content,
            ctx.image_budget.clone(),
            ctx.cancel.clone(),
        )
        .await;
    report.absorb_rewrite(rewrite);

    let poster = store_local_image(ctx, pending.poster.as_deref(), report).await;
    let author_avatar = store_local_image(ctx, Some(&detail.author_avatar), report).await;

    let author_name = if detail.author_name.is_empty() {
        pending.author_hint
    } else {
        detail.author_name
    };

    let record = ArticleRecord {
        title: pending.title,
        poster,
        author_avatar,
        author_name,
        column: pending.column,
        description: pending.description,
        content,
        publish_time: pending.publish_time,
    };

    match repo.insert_if_absent(&record).await {
        Ok(StoreOutcome::Inserted) => report.articles_stored += 1,
        Ok(StoreOutcome::AlreadyExists) => report.duplicates += 1,
        Err(e) => {
            warn!(title = %record.title, error = %e, "article store failed");
            report.store_errors += 1;
        }
    }

    pace(ctx, Duration::from_millis(ctx.config.article_pacing_ms())).await;
}

/// Download a single remote image (poster or avatar) and return its local
/// path, or empty when there is nothing to store or the download failed.
async fn store_local_image(
    ctx: &TaskContext,
    url: Option<&str>,
    report: &mut RunReport,
) -> String {
    let Some(url) = url else {
        return String::new();
    };
    match ctx.images.store_poster(url, &ctx.cancel).await {
        Ok(Some(path)) => {
            report.images_stored += 1;
            path
        }
        Ok(None) => String::new(),
        Err(e) => {
            warn!(url, error = %e, "image skipped");
            report.images_skipped += 1;
            String::new()
        }
    }
}

/// Fetch a page through the worker's renderer, retrying transient failures
/// with backoff. Cancellation short-circuits between attempts.
async fn render_with_retry(
    ctx: &TaskContext,
    renderer: &dyn Renderer,
    url: &str,
) -> Result<PageResponse, FetchError> {
    let attempts = ctx.config.fetch_retries().max(1);
    let mut attempt = 0;
    loop {
        match renderer.render(url).await {
            Ok(page) => return Ok(page),
            Err(e) => {
                attempt += 1;
                if !e.should_retry() || attempt >= attempts || ctx.cancel.is_cancelled() {
                    return Err(e);
                }
                let delay = calculate_backoff_delay(attempt, PAGE_RETRY_BASE_MS);
                warn!(url, attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying page fetch");
                tokio::select! {
                    _ = ctx.cancel.cancelled() => return Err(e),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

async fn pace(ctx: &TaskContext, delay: Duration) {
    if delay.is_zero() {
        return;
    }
    tokio::select! {
        _ = ctx.cancel.cancelled() => {}
        _ = tokio::time::sleep(delay) => {}
    }
}
