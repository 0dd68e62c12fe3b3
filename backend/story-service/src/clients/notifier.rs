use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Like,
    Comment,
    Bookmark,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "LIKE",
            NotificationKind::Comment => "COMMENT",
            NotificationKind::Bookmark => "BOOKMARK",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification sink. Callers skip self-notifications and treat failures as
/// non-fatal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        receiver_id: &str,
        sender_id: &str,
        story_id: Uuid,
        kind: NotificationKind,
    ) -> Result<()>;
}

/// Persists unread notifications for the notification service to deliver.
#[derive(Clone)]
pub struct PgNotifier {
    pool: PgPool,
}

impl PgNotifier {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Notifier for PgNotifier {
    async fn notify(
        &self,
        receiver_id: &str,
        sender_id: &str,
        story_id: Uuid,
        kind: NotificationKind,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, receiver_id, sender_id, story_id, notification_type, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, false, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(receiver_id)
        .bind(sender_id)
        .bind(story_id)
        .bind(kind.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Log-only sink for local runs without a database.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(
        &self,
        receiver_id: &str,
        sender_id: &str,
        story_id: Uuid,
        kind: NotificationKind,
    ) -> Result<()> {
        info!(
            receiver_id = receiver_id,
            sender_id = sender_id,
            story_id = %story_id,
            kind = kind.as_str(),
            "Notification emitted"
        );
        Ok(())
    }
}
