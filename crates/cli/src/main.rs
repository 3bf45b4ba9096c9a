//! CLI application for the token transfer ledger service.

mod config;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use config::{poll_interval, IndexerArgs, Settings};
use token_ledger_api::AppState;
use token_ledger_db::{DbPool, LedgerStore, SqliteLedger};
use token_ledger_ingestion::{verify_chain_id, ChainClient, RpcClient, TransferIndexer};
use token_ledger_telemetry::{init_logging, Metrics};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "token-ledger")]
#[command(about = "Indexes ERC-20 Transfer events into a queryable ledger")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the query API and index transfers
    Serve {
        #[command(flatten)]
        indexer: IndexerArgs,

        /// HTTP listen port
        #[arg(long, env = "PORT")]
        port: u16,

        /// Re-run indexing at this interval; a single catch-up run when omitted
        #[arg(long, env = "POLL_INTERVAL_SECONDS")]
        poll_interval_seconds: Option<u64>,
    },
    /// Run a single indexing pass up to the current head and exit
    Index {
        #[command(flatten)]
        indexer: IndexerArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            indexer,
            port,
            poll_interval_seconds,
        } => {
            init_logging(indexer.log_level.as_deref())?;
            let settings = indexer.validate()?;
            let poll_interval = poll_interval(poll_interval_seconds)?;
            run_service(settings, port, poll_interval).await?;
        }
        Commands::Index { indexer } => {
            init_logging(indexer.log_level.as_deref())?;
            let settings = indexer.validate()?;
            run_once(settings).await?;
        }
    }

    Ok(())
}

/// Connect to the ledger and the chain node and assemble the indexer.
async fn build_indexer(
    settings: &Settings,
    metrics: Metrics,
) -> anyhow::Result<(DbPool, TransferIndexer<RpcClient, SqliteLedger>)> {
    let db = DbPool::connect_with_retry(
        &settings.database_url,
        settings.db_connect_attempts,
        settings.db_connect_delay,
    )
    .await?;
    db.migrate().await?;

    let rpc_client = RpcClient::new(&settings.rpc_endpoint, settings.rpc_timeout, metrics.clone())?;
    let chain_id = verify_chain_id(&rpc_client, settings.chain_id).await?;
    info!("Connected to chain {}", chain_id);

    let indexer = TransferIndexer::new(
        rpc_client,
        SqliteLedger::new(db.clone()),
        metrics,
        settings.token_address,
        settings.indexer.clone(),
    );

    Ok((db, indexer))
}

async fn run_once(settings: Settings) -> anyhow::Result<()> {
    info!("Starting one-shot indexing for token {}", settings.token_address);

    let metrics = Metrics::new()?;
    let (db, indexer) = build_indexer(&settings, metrics).await?;

    let result = indexer.index_transfers().await;
    db.close().await;

    let report = result?;
    if !report.is_complete() {
        warn!(
            "Indexing finished with {} failed windows and {} failed writes",
            report.failed_windows.len(),
            report.failed_writes
        );
    }
    info!("Indexing complete up to block {}", report.head);
    Ok(())
}

async fn run_service(
    settings: Settings,
    port: u16,
    poll_interval: Option<Duration>,
) -> anyhow::Result<()> {
    info!("Starting token ledger service for token {}", settings.token_address);

    let metrics = Metrics::new()?;
    let (db, indexer) = build_indexer(&settings, metrics.clone()).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let state = AppState {
        store: Arc::new(SqliteLedger::new(db.clone())),
        metrics,
    };
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    let mut server_shutdown = shutdown_rx.clone();
    let server = tokio::spawn(token_ledger_api::serve(listener, state, async move {
        let _ = server_shutdown.changed().await;
    }));

    let mut indexing = tokio::spawn(run_indexing(indexer, poll_interval, shutdown_rx));

    let outcome = tokio::select! {
        _ = shutdown_signal() => Ok(()),
        joined = &mut indexing => match joined {
            Ok(Ok(())) => {
                info!("Indexing complete");
                shutdown_signal().await;
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(e) => Err(e.into()),
        },
    };

    info!("Shutting down gracefully...");
    let _ = shutdown_tx.send(true);
    if !indexing.is_finished() {
        if let Err(e) = indexing.await {
            error!("Indexing task failed: {}", e);
        }
    }
    if let Err(e) = server.await? {
        error!("Server error: {}", e);
    }
    db.close().await;

    outcome
}

/// Run indexing once, or repeatedly every `poll_interval`, until shutdown.
///
/// A failed run is fatal in single-run mode and retried on the next tick
/// in poll mode.
async fn run_indexing<C, S>(
    indexer: TransferIndexer<C, S>,
    poll_interval: Option<Duration>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()>
where
    C: ChainClient,
    S: LedgerStore,
{
    info!("Starting indexing...");

    loop {
        let result = tokio::select! {
            result = indexer.index_transfers() => result,
            _ = shutdown.changed() => {
                info!("Indexing interrupted by shutdown");
                return Ok(());
            }
        };

        match result {
            Ok(report) if !report.is_complete() => warn!(
                "Indexing run reached block {} with {} failed windows and {} failed writes",
                report.head,
                report.failed_windows.len(),
                report.failed_writes
            ),
            Ok(_) => {}
            Err(e) if poll_interval.is_some() => error!("Indexing run failed: {}", e),
            Err(e) => return Err(e.into()),
        }

        let Some(interval) = poll_interval else {
            return Ok(());
        };
        tokio::select! {
            _ = sleep(interval) => {}
            _ = shutdown.changed() => return Ok(()),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl-C received"),
        _ = terminate => info!("SIGTERM received"),
    }
}
