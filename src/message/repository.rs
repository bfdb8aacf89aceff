use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{Result, ServerError};
use crate::message::{Conversation, Inbox, Message, MessageCounts};
use crate::user::UserRepository;

const MESSAGE_SELECT: &str = r#"
    SELECT m.id, m.sender_id, s.username AS sender_name, m.recipient_id,
        r.username AS recipient_name, m.content, m.created_at AS timestamp
    FROM messages m
    JOIN users s ON s.id = m.sender_id
    LEFT JOIN users r ON r.id = m.recipient_id
"#;

#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    /// Create a new [`MessageRepository`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, message_id: i64) -> Result<Option<Message>> {
        Ok(sqlx::query_as::<_, Message>(&format!("{MESSAGE_SELECT} WHERE m.id = ?"))
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Messages exchanged between two users in either direction, oldest first.
    pub async fn history(&self, user_a: i64, user_b: i64) -> Result<Vec<Message>> {
        Ok(sqlx::query_as::<_, Message>(&format!(
            r#"{MESSAGE_SELECT}
                WHERE (m.sender_id = ? AND m.recipient_id = ?)
                    OR (m.sender_id = ? AND m.recipient_id = ?)
                ORDER BY m.created_at, m.id"#
        ))
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Append a message. The content is stored as submitted.
    pub async fn send(&self, sender_id: i64, recipient_id: i64, content: &str) -> Result<Message> {
        if content.trim().is_empty() {
            return Err(ServerError::invalid(
                "content",
                "empty",
                "Message cannot be empty.",
            ));
        }
        if sender_id == recipient_id {
            return Err(ServerError::invalid(
                "recipient",
                "self",
                "You cannot send a message to yourself.",
            ));
        }

        UserRepository::new(self.pool.clone())
            .find_by_id(recipient_id)
            .await?
            .ok_or(ServerError::NotFound("recipient"))?;

        let (message_id,): (i64,) = sqlx::query_as(
            "INSERT INTO messages (sender_id, recipient_id, content, created_at) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(sender_id)
        .bind(recipient_id)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        metrics::counter!("messages_sent_total").increment(1);
        tracing::info!(message_id, sender_id, recipient_id, "message sent");

        self.find_by_id(message_id)
            .await?
            .ok_or(ServerError::NotFound("message"))
    }

    /// Send to the user owning `email`.
    pub async fn send_to_email(&self, sender_id: i64, email: &str, content: &str) -> Result<Message> {
        let recipient = UserRepository::new(self.pool.clone())
            .find_by_email(email)
            .await?
            .ok_or(ServerError::NotFound("recipient"))?;

        self.send(sender_id, recipient.id, content).await
    }

    /// Received and sent messages of a user.
    pub async fn inbox(&self, user_id: i64) -> Result<Inbox> {
        let received = sqlx::query_as::<_, Message>(&format!(
            "{MESSAGE_SELECT} WHERE m.recipient_id = ? ORDER BY m.created_at DESC, m.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let sent = sqlx::query_as::<_, Message>(&format!(
            "{MESSAGE_SELECT} WHERE m.sender_id = ? ORDER BY m.created_at DESC, m.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Inbox { received, sent })
    }

    pub async fn counts(&self, user_id: i64) -> Result<MessageCounts> {
        Ok(sqlx::query_as::<_, MessageCounts>(
            r#"SELECT
                (SELECT COUNT(*) FROM messages WHERE recipient_id = ?) AS received,
                (SELECT COUNT(*) FROM messages WHERE sender_id = ?) AS sent"#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Conversations `user_id` takes part in, newest first.
    pub async fn conversations_for(&self, user_id: i64) -> Result<Vec<Conversation>> {
        Ok(sqlx::query_as::<_, Conversation>(
            r#"SELECT c.id, c.created_at,
                (SELECT json_group_array(u.username)
                    FROM conversation_participants p
                    JOIN users u ON u.id = p.user_id
                    WHERE p.conversation_id = c.id) AS participants
                FROM conversations c
                WHERE EXISTS (
                    SELECT 1 FROM conversation_participants p
                    WHERE p.conversation_id = c.id AND p.user_id = ?
                )
                ORDER BY c.created_at DESC, c.id DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
