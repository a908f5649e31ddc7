//! Orchestration: a bounded worker pool draining a task queue.
//!
//! Each worker owns an exclusive rendering session for its whole task
//! stream; image downloads fan out under a separate concurrency budget so
//! image traffic never starves page fetches. Cancellation is observed at
//! every suspension point and propagates into in-flight image stores.

pub mod backoff;
pub mod report;
mod worker;

pub use report::RunReport;

use crate::config::Config;
use crate::images::ImageStore;
use crate::renderer::{HttpRenderer, Renderer};
use sqlx::MySqlPool;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span};
use worker::TaskContext;

/// One unit of ingestion work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// One page of keyword search results, each result resolved to a full
    /// article record.
    Search { keyword: String, page: u32 },
    /// One page of account search results, persisted as profiles.
    Accounts { keyword: String, page: u32 },
    /// An account's embedded message feed, each message resolved to a full
    /// article record.
    Feed { handle: String },
}

/// Builds a fresh rendering session for a worker. Type-erased so a headless
/// browser driver can stand in for the default HTTP renderer.
pub type RendererFactory = Arc<dyn Fn() -> Box<dyn Renderer> + Send + Sync>;

pub struct Pipeline {
    config: Config,
    pool: MySqlPool,
    renderer_factory: RendererFactory,
}

impl Pipeline {
    pub fn new(config: Config, pool: MySqlPool) -> Self {
        Self::with_renderer_factory(config, pool, Arc::new(|| Box::new(HttpRenderer::new())))
    }

    pub fn with_renderer_factory(
        config: Config,
        pool: MySqlPool,
        renderer_factory: RendererFactory,
    ) -> Self {
        Self {
            config,
            pool,
            renderer_factory,
        }
    }

    /// Drain `tasks` through the worker pool and return the merged report.
    /// Cancelling `cancel` stops work at the next suspension point of every
    /// worker; already-persisted records stay persisted.
    pub async fn run(&self, tasks: Vec<Task>, cancel: CancellationToken) -> RunReport {
        if tasks.is_empty() {
            return RunReport::default();
        }

        let (task_tx, task_rx) = mpsc::channel::<Task>(tasks.len());
        for task in tasks {
            // Capacity equals the task count, so this never blocks.
            if task_tx.send(task).await.is_err() {
                break;
            }
        }
        drop(task_tx);
        let task_rx = Arc::new(tokio::sync::Mutex::new(task_rx));

        let ctx = Arc::new(TaskContext {
            config: self.config.clone(),
            pool: self.pool.clone(),
            images: ImageStore::from_config(&self.config),
            image_budget: Arc::new(Semaphore::new(self.config.image_concurrency().max(1))),
            cancel,
        });

        let worker_count = self.config.workers().max(1);
        info!(workers = worker_count, "starting pipeline");

        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            let ctx = ctx.clone();
            let task_rx = task_rx.clone();
            let renderer = (self.renderer_factory)();
            workers.spawn(
                async move {
                    let mut report = RunReport::default();
                    loop {
                        let next = {
                            let mut rx = task_rx.lock().await;
                            tokio::select! {
                                _ = ctx.cancel.cancelled() => None,
                                task = rx.recv() => task,
                            }
                        };
                        let Some(task) = next else { break };
                        let delta = worker::process_task(&ctx, renderer.as_ref(), task).await;
                        report.merge(&delta);
                    }
                    report
                }
                .instrument(info_span!("worker", id = worker_id)),
            );
        }

        let mut total = RunReport::default();
        while let Some(joined) = workers.join_next().await {
            if let Ok(report) = joined {
                total.merge(&report);
            }
        }
        info!(%total, "pipeline finished");
        total
    }
}
