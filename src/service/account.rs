//! Account service
//!
//! Registration, deletion scheduling, and relationship maintenance. These are
//! the write paths that produce the state the cleanup job later consumes.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::notification::NotificationService;
use crate::data::{
    Account, Connection, ConnectionState, Database, EntityId, NotificationKind, Post,
};
use crate::error::AppError;

/// Account service
pub struct AccountService {
    db: Arc<Database>,
    notifier: NotificationService,
    deletion_grace: Duration,
}

impl AccountService {
    /// Create new account service
    ///
    /// # Arguments
    /// * `deletion_grace_days` - Days between a deletion request and
    ///   eligibility for cleanup
    pub fn new(db: Arc<Database>, notifier: NotificationService, deletion_grace_days: i64) -> Self {
        Self {
            db,
            notifier,
            deletion_grace: Duration::days(deletion_grace_days),
        }
    }

    /// Get account by ID
    ///
    /// # Returns
    /// The account or `NotFound` error
    pub async fn get_account(&self, account_id: &str) -> Result<Account, AppError> {
        self.db.get_account(account_id).await?.ok_or(AppError::NotFound)
    }

    /// Register a new account
    ///
    /// All notification preferences start enabled.
    ///
    /// # Errors
    /// Returns a validation error when the username or email is empty,
    /// the email is implausible, or either is already taken.
    pub async fn register(&self, username: &str, email: &str) -> Result<Account, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("username cannot be empty".to_string()));
        }

        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation(format!(
                "email address is not valid: {}",
                email
            )));
        }

        if self.db.get_account_by_username(username).await?.is_some() {
            return Err(AppError::Validation(format!(
                "username is already taken: {}",
                username
            )));
        }
        if self.db.get_account_by_email(email).await?.is_some() {
            return Err(AppError::Validation(format!(
                "email is already registered: {}",
                email
            )));
        }

        let account = Account {
            id: EntityId::new().0,
            username: username.to_string(),
            email: email.to_string(),
            display_name: None,
            notify_follows: true,
            notify_connections: true,
            notify_posts: true,
            notify_stories: true,
            scheduled_deletion_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.db.insert_account(&account).await?;

        tracing::info!(
            account_id = %account.id,
            username = %account.username,
            "Account registered"
        );

        Ok(account)
    }

    /// Schedule an account for deletion after the grace period
    ///
    /// Requesting again restamps the date from the current time.
    ///
    /// # Returns
    /// The effective deletion date.
    pub async fn request_deletion(&self, account_id: &str) -> Result<DateTime<Utc>, AppError> {
        let account = self.get_account(account_id).await?;

        let now = Utc::now();
        let scheduled_at = now + self.deletion_grace;
        self.db
            .set_scheduled_deletion(&account.id, Some(scheduled_at), now)
            .await?;

        tracing::info!(
            account_id = %account.id,
            username = %account.username,
            scheduled_deletion_at = %scheduled_at,
            "Account deletion scheduled"
        );

        Ok(scheduled_at)
    }

    /// Cancel a pending deletion
    ///
    /// An account without a scheduled date is never touched by the cleanup
    /// job.
    pub async fn cancel_deletion(&self, account_id: &str) -> Result<(), AppError> {
        let account = self.get_account(account_id).await?;

        self.db
            .set_scheduled_deletion(&account.id, None, Utc::now())
            .await?;

        tracing::info!(
            account_id = %account.id,
            username = %account.username,
            "Account deletion cancelled"
        );

        Ok(())
    }

    /// Follow another account
    ///
    /// Maintains both sides: the follower's following list and the target's
    /// followers list. Dispatches a follow notification to the target.
    pub async fn follow(&self, follower_id: &str, target_id: &str) -> Result<(), AppError> {
        if follower_id == target_id {
            return Err(AppError::Validation("cannot follow yourself".to_string()));
        }

        let follower = self.get_account(follower_id).await?;
        let target = self.get_account(target_id).await?;

        let now = Utc::now();
        self.db.add_following(&follower.id, &target.id, now).await?;
        self.db.add_follower(&target.id, &follower.id, now).await?;

        self.notifier
            .dispatch(&target.id, &follower.id, NotificationKind::Follow, None, None)
            .await?;

        Ok(())
    }

    /// Unfollow an account
    ///
    /// Removes both list sides. Unfollowing someone not followed is a no-op.
    pub async fn unfollow(&self, follower_id: &str, target_id: &str) -> Result<(), AppError> {
        self.db.remove_following(follower_id, target_id).await?;
        self.db.remove_follower(target_id, follower_id).await?;

        Ok(())
    }

    /// Request a connection with another account
    ///
    /// # Errors
    /// Returns a validation error when the parties are the same account or a
    /// connection record between them already exists in either direction.
    pub async fn request_connection(
        &self,
        requester_id: &str,
        recipient_id: &str,
    ) -> Result<Connection, AppError> {
        if requester_id == recipient_id {
            return Err(AppError::Validation(
                "cannot connect to yourself".to_string(),
            ));
        }

        let requester = self.get_account(requester_id).await?;
        let recipient = self.get_account(recipient_id).await?;

        if self
            .db
            .get_connection_between(&requester.id, &recipient.id)
            .await?
            .is_some()
        {
            return Err(AppError::Validation(
                "a connection between these accounts already exists".to_string(),
            ));
        }

        let connection = Connection {
            id: EntityId::new().0,
            requester_id: requester.id.clone(),
            recipient_id: recipient.id.clone(),
            state: ConnectionState::Pending.as_str().to_string(),
            created_at: Utc::now(),
            responded_at: None,
        };
        self.db.insert_connection(&connection).await?;

        self.notifier
            .dispatch(
                &recipient.id,
                &requester.id,
                NotificationKind::ConnectionRequest,
                None,
                None,
            )
            .await?;

        Ok(connection)
    }

    /// Accept a pending connection request
    ///
    /// Marks the record accepted, adds each party to the other's connections
    /// list, and notifies the requester.
    pub async fn accept_connection(&self, connection_id: &str) -> Result<Connection, AppError> {
        let mut connection = self
            .db
            .get_connection(connection_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if connection.state != ConnectionState::Pending.as_str() {
            return Err(AppError::Validation(format!(
                "connection is not pending: {}",
                connection.state
            )));
        }

        let responded_at = Utc::now();
        let updated = self
            .db
            .set_connection_state(&connection.id, ConnectionState::Accepted.as_str(), responded_at)
            .await?;
        if !updated {
            return Err(AppError::NotFound);
        }

        self.db
            .add_connection_peer(&connection.requester_id, &connection.recipient_id, responded_at)
            .await?;
        self.db
            .add_connection_peer(&connection.recipient_id, &connection.requester_id, responded_at)
            .await?;

        self.notifier
            .dispatch(
                &connection.requester_id,
                &connection.recipient_id,
                NotificationKind::ConnectionAccepted,
                None,
                None,
            )
            .await?;

        connection.state = ConnectionState::Accepted.as_str().to_string();
        connection.responded_at = Some(responded_at);
        Ok(connection)
    }

    /// Create a post
    pub async fn create_post(&self, author_id: &str, content: &str) -> Result<Post, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation(
                "post content cannot be empty".to_string(),
            ));
        }

        let author = self.get_account(author_id).await?;

        let post = Post {
            id: EntityId::new().0,
            author_id: author.id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.db.insert_post(&post).await?;

        Ok(post)
    }
}
