use anyhow::{Result, bail};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use weclip::{
    config::Config,
    pipeline::{Pipeline, Task},
    store,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let tasks = tasks_from_args(&args)?;

    let config = Config::from_env()?;
    let pool = store::connect(&config).await?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("shutdown signal received, finishing in-flight work");
        shutdown.cancel();
    });

    let report = Pipeline::new(config, pool).run(tasks, cancel).await;
    println!("{report}");
    Ok(())
}

/// Parse the task list from CLI arguments:
///   weclip search <keyword> [pages]
///   weclip accounts <keyword> [pages]
///   weclip feed <handle>...
fn tasks_from_args(args: &[String]) -> Result<Vec<Task>> {
    let usage = "usage: weclip search <keyword> [pages] | accounts <keyword> [pages] | feed <handle>...";
    let Some((mode, rest)) = args.split_first() else {
        bail!("{usage}");
    };
    match (mode.as_str(), rest) {
        ("search", [keyword, rest @ ..]) => {
            let pages = parse_pages(rest)?;
            Ok((1..=pages)
                .map(|page| Task::Search {
                    keyword: keyword.clone(),
                    page,
                })
                .collect())
        }
        ("accounts", [keyword, rest @ ..]) => {
            let pages = parse_pages(rest)?;
            Ok((1..=pages)
                .map(|page| Task::Accounts {
                    keyword: keyword.clone(),
                    page,
                })
                .collect())
        }
        ("feed", handles) if !handles.is_empty() => Ok(handles
            .iter()
            .map(|handle| Task::Feed {
                handle: handle.clone(),
            })
            .collect()),
        _ => bail!("{usage}"),
    }
}

fn parse_pages(rest: &[String]) -> Result<u32> {
    match rest {
        [] => Ok(1),
        [pages] => {
            let pages: u32 = pages.parse()?;
            if pages == 0 {
                bail!("pages must be at least 1");
            }
            Ok(pages)
        }
        _ => bail!("too many arguments"),
    }
}
