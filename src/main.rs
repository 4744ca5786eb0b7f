//! Point Ledger server
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────────┐    ┌──────────────┐
//! │  Config  │───▶│ Gateway  │───▶│LedgerService │───▶│ Balance +    │
//! │  (YAML)  │    │ (axum)   │    │ (user locks) │    │ History store│
//! └──────────┘    └──────────┘    └──────────────┘    └──────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;

use point_ledger::config::AppConfig;
use point_ledger::{InMemoryBalanceStore, InMemoryHistoryStore, KeyedLockRegistry, LedgerService};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = point_ledger::logging::init_logging(&app_config);

    tracing::info!("Starting Point Ledger in {} mode", env);
    tracing::info!(
        min = app_config.policy.min(),
        max = app_config.policy.max(),
        lock_timeout_ms = ?app_config.lock.acquire_timeout_ms,
        "Policy loaded"
    );

    let ledger = Arc::new(
        LedgerService::new(
            Arc::new(InMemoryBalanceStore::new()),
            Arc::new(InMemoryHistoryStore::new()),
            Arc::new(KeyedLockRegistry::new()),
            app_config.policy,
        )
        .with_lock_timeout(app_config.lock.acquire_timeout()),
    );

    for seed in &app_config.seed_accounts {
        ledger
            .seed_account(seed.user_id, seed.balance)
            .await
            .with_context(|| format!("Failed to seed user {}", seed.user_id))?;
        tracing::info!(user_id = seed.user_id, balance = seed.balance, "Seeded account");
    }

    let port = get_port_override().unwrap_or(app_config.gateway.port);
    point_ledger::gateway::run_server(&app_config.gateway.host, port, ledger).await
}
