//! SQLite database operations
//!
//! All database access goes through this module.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        // Create connection string
        let connection_string = format!("sqlite:{}?mode=rwc", path.display());

        // Create connection pool
        let pool = SqlitePool::connect(&connection_string).await?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    /// Close the connection pool
    ///
    /// The job runs once and exits; the pool is closed on every exit path
    /// so pending writes are flushed before the process ends.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Insert a new account
    pub async fn insert_account(&self, account: &Account) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, username, email, display_name,
                notify_follows, notify_connections, notify_posts, notify_stories,
                scheduled_deletion_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.display_name)
        .bind(account.notify_follows)
        .bind(account.notify_connections)
        .bind(account.notify_posts)
        .bind(account.notify_stories)
        .bind(account.scheduled_deletion_at)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get account by ID
    pub async fn get_account(&self, id: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Get account by username
    pub async fn get_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Get account by email
    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Set or clear the scheduled deletion date
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching account row exists.
    pub async fn set_scheduled_deletion(
        &self,
        account_id: &str,
        scheduled_deletion_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET scheduled_deletion_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(scheduled_deletion_at)
        .bind(updated_at)
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Get accounts whose scheduled deletion date has passed
    ///
    /// Accounts without a scheduled date are never returned. Ordered by the
    /// deletion date so repeated runs over the same data are deterministic.
    pub async fn expired_accounts(&self, now: DateTime<Utc>) -> Result<Vec<Account>, AppError> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT * FROM accounts
            WHERE scheduled_deletion_at IS NOT NULL AND scheduled_deletion_at <= ?
            ORDER BY scheduled_deletion_at, id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    // =========================================================================
    // Relationship lists
    // =========================================================================

    /// Add a peer to an account's connections list
    pub async fn add_connection_peer(
        &self,
        account_id: &str,
        peer_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT OR IGNORE INTO account_connections (account_id, peer_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(account_id)
        .bind(peer_id)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add a follower to an account's followers list
    pub async fn add_follower(
        &self,
        account_id: &str,
        follower_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT OR IGNORE INTO account_followers (account_id, follower_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(account_id)
        .bind(follower_id)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add a followed account to an account's following list
    pub async fn add_following(
        &self,
        account_id: &str,
        followed_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT OR IGNORE INTO account_following (account_id, followed_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(account_id)
        .bind(followed_id)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the peer IDs in an account's connections list
    pub async fn connection_peer_ids(&self, account_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT peer_id FROM account_connections WHERE account_id = ? ORDER BY created_at",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Get the follower IDs in an account's followers list
    pub async fn follower_ids(&self, account_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT follower_id FROM account_followers WHERE account_id = ? ORDER BY created_at",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Get the followed IDs in an account's following list
    pub async fn following_ids(&self, account_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT followed_id FROM account_following WHERE account_id = ? ORDER BY created_at",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Remove one follower from an account's followers list
    ///
    /// # Returns
    /// `true` if a list entry was removed.
    pub async fn remove_follower(
        &self,
        account_id: &str,
        follower_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM account_followers WHERE account_id = ? AND follower_id = ?",
        )
        .bind(account_id)
        .bind(follower_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove one followed account from an account's following list
    ///
    /// # Returns
    /// `true` if a list entry was removed.
    pub async fn remove_following(
        &self,
        account_id: &str,
        followed_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM account_following WHERE account_id = ? AND followed_id = ?",
        )
        .bind(account_id)
        .bind(followed_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove an account ID from every other account's connections list
    ///
    /// # Returns
    /// Number of list entries removed.
    pub async fn prune_connection_lists(&self, account_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM account_connections WHERE peer_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Remove an account ID from every other account's followers list
    ///
    /// # Returns
    /// Number of list entries removed.
    pub async fn prune_follower_lists(&self, account_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM account_followers WHERE follower_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Remove an account ID from every other account's following list
    ///
    /// # Returns
    /// Number of list entries removed.
    pub async fn prune_following_lists(&self, account_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM account_following WHERE followed_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// Insert a connection record
    pub async fn insert_connection(&self, connection: &Connection) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO connections (
                id, requester_id, recipient_id, state, created_at, responded_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&connection.id)
        .bind(&connection.requester_id)
        .bind(&connection.recipient_id)
        .bind(&connection.state)
        .bind(connection.created_at)
        .bind(connection.responded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get connection by ID
    pub async fn get_connection(&self, id: &str) -> Result<Option<Connection>, AppError> {
        let connection = sqlx::query_as::<_, Connection>("SELECT * FROM connections WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(connection)
    }

    /// Get the connection record between two accounts, in either direction
    pub async fn get_connection_between(
        &self,
        account_a: &str,
        account_b: &str,
    ) -> Result<Option<Connection>, AppError> {
        let connection = sqlx::query_as::<_, Connection>(
            r#"
            SELECT * FROM connections
            WHERE (requester_id = ? AND recipient_id = ?)
               OR (requester_id = ? AND recipient_id = ?)
            "#,
        )
        .bind(account_a)
        .bind(account_b)
        .bind(account_b)
        .bind(account_a)
        .fetch_optional(&self.pool)
        .await?;

        Ok(connection)
    }

    /// Update a connection record's state
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching connection row exists.
    pub async fn set_connection_state(
        &self,
        id: &str,
        state: &str,
        responded_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE connections SET state = ?, responded_at = ? WHERE id = ?",
        )
        .bind(state)
        .bind(responded_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete every connection record involving an account
    ///
    /// One statement covering both roles; never issued as two queries.
    ///
    /// # Returns
    /// Number of connection records removed.
    pub async fn delete_connections_involving(&self, account_id: &str) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM connections WHERE requester_id = ? OR recipient_id = ?")
                .bind(account_id)
                .bind(account_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Insert a new post
    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO posts (id, author_id, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&post.id)
        .bind(&post.author_id)
        .bind(&post.content)
        .bind(post.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get post by ID
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// Get all posts by an author, newest first
    pub async fn posts_by_author(&self, author_id: &str) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE author_id = ? ORDER BY created_at DESC",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Delete every post authored by an account
    ///
    /// # Returns
    /// Number of posts removed.
    pub async fn delete_posts_by(&self, account_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE author_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Insert notification
    pub async fn insert_notification(&self, notification: &Notification) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, recipient_id, sender_id, kind, post_id, story_id, read, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.recipient_id)
        .bind(&notification.sender_id)
        .bind(&notification.kind)
        .bind(&notification.post_id)
        .bind(&notification.story_id)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a single notification by ID
    pub async fn get_notification(&self, id: &str) -> Result<Option<Notification>, AppError> {
        let notification =
            sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(notification)
    }

    /// Get a recipient's notifications, newest first
    pub async fn notifications_for(
        &self,
        recipient_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE recipient_id = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(recipient_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Mark notification as read
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching notification row exists.
    pub async fn mark_notification_read(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE notifications SET read = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete every notification sent to or by an account
    ///
    /// # Returns
    /// Number of notifications removed.
    pub async fn delete_notifications_involving(&self, account_id: &str) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM notifications WHERE recipient_id = ? OR sender_id = ?")
                .bind(account_id)
                .bind(account_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Account removal
    // =========================================================================

    /// Delete an account row and its own relationship lists
    ///
    /// The account's lists live with the account, so they go when it goes.
    /// Each delete is an independent statement; no transaction spans them.
    ///
    /// # Returns
    /// `true` if the account row was removed.
    pub async fn delete_account(&self, account_id: &str) -> Result<bool, AppError> {
        sqlx::query("DELETE FROM account_connections WHERE account_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM account_followers WHERE account_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM account_following WHERE account_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
