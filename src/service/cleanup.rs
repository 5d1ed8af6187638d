//! Account cleanup service
//!
//! One-shot batch pass that finds accounts whose scheduled deletion date has
//! passed and removes them together with every reference other records hold
//! to them: peers' relationship lists, connection records, posts, and
//! notifications, then the account row itself.
//!
//! Candidates are processed strictly one at a time. A failing step never
//! aborts the batch: it is logged, recorded on the candidate's outcome, and
//! the remaining steps and candidates are still attempted. Only a failure of
//! the initial scan propagates to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::data::{Account, Database};
use crate::error::AppError;

/// Store operations the cleanup run depends on
///
/// `Database` implements this by delegation. Kept as a trait so failure
/// isolation can be exercised against a store that fails on command.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CleanupStore: Send + Sync {
    async fn expired_accounts(&self, now: DateTime<Utc>) -> Result<Vec<Account>, AppError>;
    async fn prune_connection_lists(&self, account_id: &str) -> Result<u64, AppError>;
    async fn prune_follower_lists(&self, account_id: &str) -> Result<u64, AppError>;
    async fn prune_following_lists(&self, account_id: &str) -> Result<u64, AppError>;
    async fn delete_connections_involving(&self, account_id: &str) -> Result<u64, AppError>;
    async fn delete_posts_by(&self, account_id: &str) -> Result<u64, AppError>;
    async fn delete_notifications_involving(&self, account_id: &str) -> Result<u64, AppError>;
    async fn delete_account(&self, account_id: &str) -> Result<bool, AppError>;
}

#[async_trait]
impl CleanupStore for Database {
    async fn expired_accounts(&self, now: DateTime<Utc>) -> Result<Vec<Account>, AppError> {
        Database::expired_accounts(self, now).await
    }

    async fn prune_connection_lists(&self, account_id: &str) -> Result<u64, AppError> {
        Database::prune_connection_lists(self, account_id).await
    }

    async fn prune_follower_lists(&self, account_id: &str) -> Result<u64, AppError> {
        Database::prune_follower_lists(self, account_id).await
    }

    async fn prune_following_lists(&self, account_id: &str) -> Result<u64, AppError> {
        Database::prune_following_lists(self, account_id).await
    }

    async fn delete_connections_involving(&self, account_id: &str) -> Result<u64, AppError> {
        Database::delete_connections_involving(self, account_id).await
    }

    async fn delete_posts_by(&self, account_id: &str) -> Result<u64, AppError> {
        Database::delete_posts_by(self, account_id).await
    }

    async fn delete_notifications_involving(&self, account_id: &str) -> Result<u64, AppError> {
        Database::delete_notifications_involving(self, account_id).await
    }

    async fn delete_account(&self, account_id: &str) -> Result<bool, AppError> {
        Database::delete_account(self, account_id).await
    }
}

/// Steps of a single candidate's cleanup, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStep {
    PruneConnectionLists,
    PruneFollowerLists,
    PruneFollowingLists,
    PurgeConnections,
    PurgePosts,
    PurgeNotifications,
    RemoveAccount,
}

impl CleanupStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PruneConnectionLists => "prune_connection_lists",
            Self::PruneFollowerLists => "prune_follower_lists",
            Self::PruneFollowingLists => "prune_following_lists",
            Self::PurgeConnections => "purge_connections",
            Self::PurgePosts => "purge_posts",
            Self::PurgeNotifications => "purge_notifications",
            Self::RemoveAccount => "remove_account",
        }
    }
}

/// Per-candidate processing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    Pending,
    Pruning,
    Purging,
    Removing,
    Done,
    Failed,
}

impl CandidateState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Pruning => "pruning",
            Self::Purging => "purging",
            Self::Removing => "removing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// A step that failed for one candidate
#[derive(Debug, Clone)]
pub struct StepFailure {
    pub step: CleanupStep,
    pub message: String,
}

/// Outcome of one candidate's cleanup
#[derive(Debug, Clone)]
pub struct CandidateOutcome {
    pub account_id: String,
    pub username: String,
    pub state: CandidateState,
    pub failures: Vec<StepFailure>,
    /// List entries removed from other accounts' three relationship lists
    pub pruned_list_entries: u64,
    pub purged_connections: u64,
    pub purged_posts: u64,
    pub purged_notifications: u64,
    /// Whether the account row itself was removed. Can be true on a failed
    /// candidate: the remove step is still attempted after earlier failures.
    pub account_removed: bool,
}

/// Summary of a full cleanup run
#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    /// Candidates the scan found
    pub scanned: usize,
    /// Candidates cleaned up without any step failure
    pub removed: usize,
    /// Candidates with at least one failed step
    pub failed: usize,
    pub outcomes: Vec<CandidateOutcome>,
}

/// Account cleanup service
pub struct CleanupService {
    store: Arc<dyn CleanupStore>,
}

impl CleanupService {
    /// Create new cleanup service
    pub fn new(store: Arc<dyn CleanupStore>) -> Self {
        Self { store }
    }

    /// Run one scan-and-purge pass
    ///
    /// # Arguments
    /// * `now` - Cutoff for the expiry scan; accounts scheduled at or before
    ///   this instant are candidates
    ///
    /// # Errors
    /// Only a failure of the scan itself is returned as an error. Step
    /// failures are confined to their candidate and recorded on its outcome.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<CleanupReport, AppError> {
        let candidates = self.store.expired_accounts(now).await?;
        let mut report = CleanupReport {
            scanned: candidates.len(),
            ..Default::default()
        };

        if candidates.is_empty() {
            tracing::info!("No accounts due for cleanup");
            return Ok(report);
        }

        tracing::info!(candidates = report.scanned, "Starting account cleanup");

        for account in candidates {
            let outcome = self.process_candidate(&account).await;
            match outcome.state {
                CandidateState::Done => report.removed += 1,
                _ => report.failed += 1,
            }
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    /// Process a single candidate through prune, purge, and remove
    ///
    /// Every step runs in order even after an earlier step failed. Cleanup
    /// for a partially failed candidate cannot be resumed once the account
    /// row is gone, so leftovers are handled by the next scheduled run's
    /// full re-scan, not by stopping early here.
    async fn process_candidate(&self, account: &Account) -> CandidateOutcome {
        let mut outcome = CandidateOutcome {
            account_id: account.id.clone(),
            username: account.username.clone(),
            state: CandidateState::Pending,
            failures: Vec::new(),
            pruned_list_entries: 0,
            purged_connections: 0,
            purged_posts: 0,
            purged_notifications: 0,
            account_removed: false,
        };

        tracing::info!(
            account_id = %account.id,
            username = %account.username,
            "Cleaning up expired account"
        );

        outcome.state = CandidateState::Pruning;
        match self.store.prune_connection_lists(&account.id).await {
            Ok(removed) => outcome.pruned_list_entries += removed,
            Err(error) => {
                record_failure(&mut outcome, account, CleanupStep::PruneConnectionLists, error)
            }
        }
        match self.store.prune_follower_lists(&account.id).await {
            Ok(removed) => outcome.pruned_list_entries += removed,
            Err(error) => {
                record_failure(&mut outcome, account, CleanupStep::PruneFollowerLists, error)
            }
        }
        match self.store.prune_following_lists(&account.id).await {
            Ok(removed) => outcome.pruned_list_entries += removed,
            Err(error) => {
                record_failure(&mut outcome, account, CleanupStep::PruneFollowingLists, error)
            }
        }

        outcome.state = CandidateState::Purging;
        match self.store.delete_connections_involving(&account.id).await {
            Ok(removed) => outcome.purged_connections = removed,
            Err(error) => {
                record_failure(&mut outcome, account, CleanupStep::PurgeConnections, error)
            }
        }
        match self.store.delete_posts_by(&account.id).await {
            Ok(removed) => outcome.purged_posts = removed,
            Err(error) => record_failure(&mut outcome, account, CleanupStep::PurgePosts, error),
        }
        match self.store.delete_notifications_involving(&account.id).await {
            Ok(removed) => outcome.purged_notifications = removed,
            Err(error) => {
                record_failure(&mut outcome, account, CleanupStep::PurgeNotifications, error)
            }
        }

        outcome.state = CandidateState::Removing;
        match self.store.delete_account(&account.id).await {
            Ok(removed) => outcome.account_removed = removed,
            Err(error) => record_failure(&mut outcome, account, CleanupStep::RemoveAccount, error),
        }

        outcome.state = if outcome.failures.is_empty() {
            CandidateState::Done
        } else {
            CandidateState::Failed
        };

        match outcome.state {
            CandidateState::Done => tracing::info!(
                account_id = %account.id,
                username = %account.username,
                pruned_list_entries = outcome.pruned_list_entries,
                purged_connections = outcome.purged_connections,
                purged_posts = outcome.purged_posts,
                purged_notifications = outcome.purged_notifications,
                "Expired account removed"
            ),
            _ => tracing::warn!(
                account_id = %account.id,
                username = %account.username,
                failed_steps = outcome.failures.len(),
                account_removed = outcome.account_removed,
                "Account cleanup finished with errors"
            ),
        }

        outcome
    }
}

fn record_failure(
    outcome: &mut CandidateOutcome,
    account: &Account,
    step: CleanupStep,
    error: AppError,
) {
    tracing::error!(
        account_id = %account.id,
        username = %account.username,
        step = step.as_str(),
        error = %error,
        "Cleanup step failed"
    );
    outcome.failures.push(StepFailure {
        step,
        message: error.to_string(),
    });
}
