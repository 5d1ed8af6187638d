//! Common test utilities for E2E tests

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sarkariminds_reaper::data::{Account, Database};
use sarkariminds_reaper::service::{AccountService, CleanupService, NotificationService};
use tempfile::TempDir;

/// Test application instance
///
/// Real services over a temporary SQLite database; the directory is dropped
/// with the app.
pub struct TestApp {
    pub db: Arc<Database>,
    pub accounts: AccountService,
    pub notifications: NotificationService,
    pub cleanup: CleanupService,
    pub _temp_dir: TempDir,
}

impl TestApp {
    /// Create a new test application instance
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::connect(&db_path).await.unwrap());

        let notifications = NotificationService::new(db.clone());
        let accounts = AccountService::new(db.clone(), notifications.clone(), 30);
        let cleanup = CleanupService::new(db.clone());

        Self {
            db,
            accounts,
            notifications,
            cleanup,
            _temp_dir: temp_dir,
        }
    }

    /// Register an account with a derived email address
    pub async fn register(&self, username: &str) -> Account {
        self.accounts
            .register(username, &format!("{}@example.com", username))
            .await
            .unwrap()
    }

    /// Stamp an account's scheduled deletion date directly
    ///
    /// Bypasses the grace period so tests can place the date anywhere.
    pub async fn schedule_deletion_at(&self, account_id: &str, at: DateTime<Utc>) {
        self.db
            .set_scheduled_deletion(account_id, Some(at), Utc::now())
            .await
            .unwrap();
    }

    /// Make two accounts mutual, accepted connections
    pub async fn connect(&self, a: &Account, b: &Account) {
        let connection = self
            .accounts
            .request_connection(&a.id, &b.id)
            .await
            .unwrap();
        self.accounts.accept_connection(&connection.id).await.unwrap();
    }
}
