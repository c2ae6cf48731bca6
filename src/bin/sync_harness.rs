use anyhow::{Context, Result, bail};
use feed_sync::{
    AppConfig, ConnectionPool, InMemoryRemoteSource, SqliteSyncStore, SyncEngine, SyncReport,
    Synchronizer, TracingNewsNotifier, init_logging,
};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::{env, fs};
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
struct CliOptions {
    fixture: PathBuf,
    database_url: Option<String>,
    pretty: bool,
}

fn usage() -> &'static str {
    "Usage: sync_harness --fixture <path> [--database-url <url>] [--pretty]"
}

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let options = parse_args(args)?;

    let mut config = AppConfig::from_env();
    if let Some(url) = &options.database_url {
        config.database.url = url.clone();
    }
    config.validate().context("Invalid configuration")?;

    let fixture = fs::read_to_string(&options.fixture)
        .with_context(|| format!("Failed to read fixture {}", options.fixture.display()))?;

    let rt = Runtime::new().context("Failed to create Tokio runtime")?;
    let report = rt.block_on(run_round(&config, &fixture))?;

    let payload = to_json(&report, options.pretty)?;
    println!("{payload}");
    Ok(())
}

async fn run_round(config: &AppConfig, fixture: &str) -> Result<SyncReport> {
    let pool = ConnectionPool::from_config(&config.database)
        .await
        .with_context(|| format!("Failed to connect to database at {}", config.database.url))?;
    let store = Arc::new(SqliteSyncStore::new(pool));
    store
        .initialize()
        .await
        .context("Failed to run database migrations")?;

    let batch_size = NonZeroUsize::new(config.sync.batch_size)
        .ok_or_else(|| anyhow::anyhow!("batch size must be greater than 0"))?;
    let remote = Arc::new(
        InMemoryRemoteSource::from_fixture_json(fixture)
            .await
            .context("Failed to parse fixture")?
            .with_max_batch_size(batch_size.get()),
    );
    let engine = SyncEngine::new(
        store.clone(),
        remote.clone(),
        remote,
        store.clone(),
        store.clone(),
    )
    .with_batch_size(batch_size);

    let synchronizer = Synchronizer::new(
        Arc::new(engine),
        Arc::new(TracingNewsNotifier::new()),
        config.sync.clone(),
    );
    let report = synchronizer.sync_once().await;

    store.pool().close().await;
    Ok(report)
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

fn parse_args<I>(args: I) -> Result<CliOptions>
where
    I: IntoIterator<Item = String>,
{
    let mut fixture: Option<PathBuf> = None;
    let mut database_url: Option<String> = None;
    let mut pretty = false;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-f" | "--fixture" => {
                let path = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--fixture requires a path\n{}", usage()))?;
                fixture = Some(PathBuf::from(path));
            }
            "--database-url" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--database-url requires a value\n{}", usage())
                })?;
                database_url = Some(value);
            }
            "--pretty" => {
                pretty = true;
            }
            "-h" | "--help" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            other => {
                bail!("Unknown argument: {other}\n{}", usage());
            }
        }
    }

    let Some(fixture) = fixture else {
        bail!("--fixture is required\n{}", usage());
    };

    Ok(CliOptions {
        fixture,
        database_url,
        pretty,
    })
}
