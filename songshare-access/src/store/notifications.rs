//! Notification repository

use crate::plan::NotificationSpec;
use songshare_common::db::Notification;
use songshare_common::uuid_utils::{self, parse_column, parse_optional_column};
use songshare_common::Result;
use sqlx::{Row, Sqlite, SqlitePool};
use uuid::Uuid;

/// Create a notification, returning its new id
pub async fn insert_notification<'e, E>(executor: E, spec: &NotificationSpec) -> Result<Uuid>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let id = uuid_utils::generate();

    sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, kind, message, songbook_id, count, read, created_at)
        VALUES (?, ?, ?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(spec.user_id.to_string())
    .bind(spec.kind.as_str())
    .bind(&spec.message)
    .bind(spec.songbook_id.map(|id| id.to_string()))
    .bind(spec.count.map(i64::from))
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(executor)
    .await?;

    Ok(id)
}

/// A user's notifications, newest first
pub async fn list_notifications(pool: &SqlitePool, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, kind, message, songbook_id, count, read, created_at
        FROM notifications
        WHERE user_id = ? AND (? = 0 OR read = 0)
        ORDER BY created_at DESC, id
        "#,
    )
    .bind(user_id.to_string())
    .bind(unread_only)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<Notification> {
            let id: String = row.try_get("id")?;
            let user_id: String = row.try_get("user_id")?;
            let songbook_id: Option<String> = row.try_get("songbook_id")?;

            Ok(Notification {
                id: parse_column("notifications.id", &id)?,
                user_id: parse_column("notifications.user_id", &user_id)?,
                kind: row.try_get("kind")?,
                message: row.try_get("message")?,
                songbook_id: parse_optional_column("notifications.songbook_id", songbook_id.as_deref())?,
                count: row.try_get("count")?,
                read: row.try_get("read")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}

/// Mark a notification read; returns false if it does not exist
pub async fn mark_notification_read(pool: &SqlitePool, notification_id: Uuid) -> Result<bool> {
    let result = sqlx::query("UPDATE notifications SET read = 1 WHERE id = ?")
        .bind(notification_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
