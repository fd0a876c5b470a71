//! Thin entry point for maintenance operations on the shared sync
//! state. The pipelines themselves are wired up by the per-deployment
//! agents, which link the protocol connectors this workspace only
//! defines contracts for.

mod config;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use regsync_core::EntityKind;
use regsync_engine::{IdentifierCache, PgIdentifierCache};

use config::AgentConfig;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,regsync_engine=debug")),
        )
        .init();

    let config = AgentConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("check");

    tracing::info!(
        command = command,
        live_writes = config.live_writes,
        destructive_writes = config.destructive_writes,
        concurrency = config.concurrency,
        "starting regsync agent"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Database connection error: {e}");
            std::process::exit(1);
        });

    match command {
        "check" => {
            // Connectivity is already proven by the pool; report and
            // exit cleanly.
            tracing::info!("database reachable, configuration valid");
        }
        "purge-cache" => {
            let Some(kind) = args.get(1).and_then(|s| s.parse::<EntityKind>().ok()) else {
                eprintln!("usage: regsync-agent purge-cache <entity-kind>");
                std::process::exit(2);
            };

            let cache = PgIdentifierCache::new(pool);
            match cache.purge(kind).await {
                Ok(dropped) => {
                    tracing::info!(kind = %kind, dropped = dropped, "purged identifier cache");
                }
                Err(e) => {
                    tracing::error!(error = %e, "cache purge failed");
                    std::process::exit(1);
                }
            }
        }
        other => {
            eprintln!("unknown command: {other} (expected: check, purge-cache)");
            std::process::exit(2);
        }
    }
}
