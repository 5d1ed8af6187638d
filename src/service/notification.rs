//! Notification service
//!
//! Persists in-app notifications, honoring each recipient's per-category
//! preferences.

use std::sync::Arc;

use chrono::Utc;

use crate::data::{Database, EntityId, Notification, NotificationKind};
use crate::error::AppError;

/// Notification service
#[derive(Clone)]
pub struct NotificationService {
    db: Arc<Database>,
}

impl NotificationService {
    /// Create new notification service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Dispatch a notification to a recipient
    ///
    /// Looks up the recipient and checks the preference flag matching `kind`
    /// before persisting anything. A missing recipient or a disabled
    /// preference is not an error: the dispatch silently drops the
    /// notification and returns `Ok(None)`.
    pub async fn dispatch(
        &self,
        recipient_id: &str,
        sender_id: &str,
        kind: NotificationKind,
        post_id: Option<&str>,
        story_id: Option<&str>,
    ) -> Result<Option<Notification>, AppError> {
        let Some(recipient) = self.db.get_account(recipient_id).await? else {
            tracing::debug!(
                recipient_id = %recipient_id,
                kind = kind.as_str(),
                "Notification dropped: recipient does not exist"
            );
            return Ok(None);
        };

        if !recipient.allows_notification(&kind) {
            tracing::debug!(
                recipient_id = %recipient.id,
                kind = kind.as_str(),
                "Notification dropped: preference disabled"
            );
            return Ok(None);
        }

        let notification = Notification {
            id: EntityId::new().0,
            recipient_id: recipient.id,
            sender_id: sender_id.to_string(),
            kind: kind.as_str().to_string(),
            post_id: post_id.map(|id| id.to_string()),
            story_id: story_id.map(|id| id.to_string()),
            read: false,
            created_at: Utc::now(),
        };
        self.db.insert_notification(&notification).await?;

        Ok(Some(notification))
    }

    /// Get a recipient's recent notifications, newest first
    pub async fn recent_for(
        &self,
        recipient_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, AppError> {
        self.db.notifications_for(recipient_id, limit).await
    }

    /// Mark a notification as read
    pub async fn mark_read(&self, id: &str) -> Result<(), AppError> {
        if !self.db.mark_notification_read(id).await? {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
