mod repository;

pub use repository::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direct message between two users.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub sender_name: String,
    /// `None` once the recipient account is deleted.
    pub recipient_id: Option<i64>,
    pub recipient_name: Option<String>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Messages received and sent by a user, newest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Inbox {
    pub received: Vec<Message>,
    pub sent: Vec<Message>,
}

/// Message totals shown on dashboards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, sqlx::FromRow)]
pub struct MessageCounts {
    pub received: i64,
    pub sent: i64,
}

/// Participant grouping kept as a record only; messages are not threaded
/// through it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: i64,
    #[sqlx(json)]
    pub participants: Vec<String>,
    pub created_at: DateTime<Utc>,
}
