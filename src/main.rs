//! Account lifecycle cleanup binary

use std::process::ExitCode;
use std::sync::Arc;

use sarkariminds_reaper::{config, data::Database, service::CleanupService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Batch entry point
///
/// # Steps
/// 1. Initialize tracing/logging
/// 2. Load configuration from file and environment
/// 3. Connect to the SQLite database
/// 4. Run one scan-and-purge pass
/// 5. Close the database and report via exit code
///
/// Exit code 0 means the scan-and-purge phase completed, including runs
/// where individual candidates failed. Exit code 1 means configuration,
/// connection, or the scan itself failed.
#[tokio::main]
async fn main() -> ExitCode {
    // 1. Initialize tracing/logging
    let log_format =
        std::env::var("REAPER__LOGGING__FORMAT").unwrap_or_else(|_| "pretty".to_string());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "sarkariminds_reaper=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "sarkariminds_reaper=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!("Starting account lifecycle cleanup...");

    // 2. Load configuration
    let config = match config::AppConfig::load() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(error = %error, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        database = %config.database.path.display(),
        deletion_grace_days = config.account.deletion_grace_days,
        "Configuration loaded"
    );

    // 3. Connect to the SQLite database
    let db = match Database::connect(&config.database.path).await {
        Ok(db) => Arc::new(db),
        Err(error) => {
            tracing::error!(error = %error, "Failed to connect to database");
            return ExitCode::FAILURE;
        }
    };

    // 4. Run one scan-and-purge pass
    let cleanup = CleanupService::new(db.clone());
    let result = cleanup.run(chrono::Utc::now()).await;

    // 5. Close the database on every exit path before reporting
    db.close().await;

    match result {
        Ok(report) => {
            tracing::info!(
                scanned = report.scanned,
                removed = report.removed,
                failed = report.failed,
                "Cleanup run completed"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(error = %error, "Cleanup run aborted");
            ExitCode::FAILURE
        }
    }
}
