//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Account
// =============================================================================

/// A registered member
///
/// Relationship lists (connections, followers, following) live in their own
/// membership tables keyed by `id`; they are not columns here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    /// Receive follow notifications
    pub notify_follows: bool,
    /// Receive connection request/accept notifications
    pub notify_connections: bool,
    /// Receive like/comment notifications on own posts
    pub notify_posts: bool,
    /// Receive story view notifications
    pub notify_stories: bool,
    /// When set and in the past, the account is eligible for cleanup
    pub scheduled_deletion_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Whether this account wants notifications of the given kind
    pub fn allows_notification(&self, kind: &NotificationKind) -> bool {
        match kind {
            NotificationKind::Follow => self.notify_follows,
            NotificationKind::ConnectionRequest | NotificationKind::ConnectionAccepted => {
                self.notify_connections
            }
            NotificationKind::PostLiked | NotificationKind::PostCommented => self.notify_posts,
            NotificationKind::StoryViewed => self.notify_stories,
        }
    }
}

// =============================================================================
// Connection
// =============================================================================

/// A connection record between two accounts
///
/// Jointly owned: removed when either party's account is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Connection {
    pub id: String,
    /// Account that sent the request
    pub requester_id: String,
    /// Account that received the request
    pub recipient_id: String,
    /// State: pending, accepted
    pub state: String,
    pub created_at: DateTime<Utc>,
    /// When the request was accepted
    pub responded_at: Option<DateTime<Utc>>,
}

/// Connection states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Pending,
    Accepted,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }
}

// =============================================================================
// Post
// =============================================================================

/// A text post
///
/// Owned by exactly one account and deleted together with it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Notifications
// =============================================================================

/// Notification for user interactions
///
/// Removed when either the recipient or the sender account is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    /// Who triggered this notification
    pub sender_id: String,
    /// Kind: follow, connection_request, connection_accepted,
    /// post_liked, post_commented, story_viewed
    pub kind: String,
    /// Related post ID (if applicable)
    pub post_id: Option<String>,
    /// Related story ID (if applicable, stored opaquely)
    pub story_id: Option<String>,
    /// Whether the recipient has seen this
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    Follow,
    ConnectionRequest,
    ConnectionAccepted,
    PostLiked,
    PostCommented,
    StoryViewed,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Follow => "follow",
            Self::ConnectionRequest => "connection_request",
            Self::ConnectionAccepted => "connection_accepted",
            Self::PostLiked => "post_liked",
            Self::PostCommented => "post_commented",
            Self::StoryViewed => "story_viewed",
        }
    }
}
