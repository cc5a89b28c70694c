//! SQLite-backed transition store

use crate::event::TransitionEvent;
use crate::repository::TransitionStore;
use crate::StorageError;
use alarm_state::AlarmState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

/// Transition store in a SQLite table.
///
/// Rows are appended per transition; the latest row for an alarm is the one
/// with the greatest event time, then insertion order.
pub struct SqliteStore {
    pool: SqlitePool,
    table: String,
}

impl SqliteStore {
    /// Connect to `url` and create `table` if missing
    pub async fn connect(url: &str, table: &str) -> Result<Self, StorageError> {
        validate_table_name(table)?;

        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let in_memory = url.contains(":memory:");

        // every connection to an in-memory database sees its own database
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let store = Self {
            pool,
            table: table.to_string(),
        };
        store.migrate().await?;

        info!("Connected transition store {} (table {})", url, table);
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        let create = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL,
                resource_id TEXT NOT NULL,
                state TEXT NOT NULL,
                value INTEGER NOT NULL,
                event_time TEXT NOT NULL
            )",
            table = self.table
        );
        sqlx::query(&create).execute(&self.pool).await?;

        let index = format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_id_time ON {table} (id, event_time)",
            table = self.table
        );
        sqlx::query(&index).execute(&self.pool).await?;
        Ok(())
    }

    /// Close the pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn validate_table_name(table: &str) -> Result<(), StorageError> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !table.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidTable(table.to_string()))
    }
}

fn decode_row(row: &SqliteRow) -> Result<TransitionEvent, StorageError> {
    let state: String = row.try_get("state")?;
    let state = AlarmState::from_str(&state)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;

    let value: i64 = row.try_get("value")?;
    let value = i8::try_from(value)
        .map_err(|e| StorageError::SerializationError(format!("value {}: {}", value, e)))?;

    let event_time: String = row.try_get("event_time")?;
    let event_time = DateTime::parse_from_rfc3339(&event_time)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?
        .with_timezone(&Utc);

    Ok(TransitionEvent {
        id: row.try_get("id")?,
        resource_id: row.try_get("resource_id")?,
        state,
        value,
        event_time,
    })
}

#[async_trait]
impl TransitionStore for SqliteStore {
    async fn last_event(&self, id: &str) -> Result<Option<TransitionEvent>, StorageError> {
        let sql = format!(
            "SELECT id, resource_id, state, value, event_time FROM {} \
             WHERE id = ? ORDER BY event_time DESC, seq DESC LIMIT 1",
            self.table
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn put_event(&self, event: &TransitionEvent) -> Result<(), StorageError> {
        let sql = format!(
            "INSERT INTO {} (id, resource_id, state, value, event_time) VALUES (?, ?, ?, ?, ?)",
            self.table
        );
        sqlx::query(&sql)
            .bind(event.id.as_str())
            .bind(event.resource_id.as_str())
            .bind(event.state.as_str())
            .bind(i64::from(event.value))
            .bind(event.event_time_text())
            .execute(&self.pool)
            .await?;

        debug!("Inserted {} transition for {}", event.state, event.id);
        Ok(())
    }

    async fn events(&self, id: &str, limit: usize) -> Result<Vec<TransitionEvent>, StorageError> {
        let sql = format!(
            "SELECT id, resource_id, state, value, event_time FROM {} \
             WHERE id = ? ORDER BY event_time DESC, seq DESC LIMIT ?",
            self.table
        );
        let rows = sqlx::query(&sql)
            .bind(id)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 12, 12, 6, minute, 0).unwrap()
    }

    fn event(minute: u32, state: AlarmState) -> TransitionEvent {
        TransitionEvent::new("flaky-service", "1577082070_pipeline5", state, at(minute))
    }

    #[test]
    fn test_table_names() {
        assert!(validate_table_name("EventStore").is_ok());
        assert!(validate_table_name("event_store_2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("2events").is_err());
        assert!(validate_table_name("events; DROP TABLE x").is_err());
    }

    #[tokio::test]
    async fn test_round_trip_through_sqlite() {
        let store = SqliteStore::connect("sqlite::memory:", "EventStore").await.unwrap();
        assert!(store.last_event("flaky-service").await.unwrap().is_none());

        store.put_event(&event(1, AlarmState::Failing)).await.unwrap();
        store.put_event(&event(4, AlarmState::Healthy)).await.unwrap();
        store.put_event(&event(2, AlarmState::Failing)).await.unwrap();

        let last = store.last_event("flaky-service").await.unwrap().unwrap();
        assert_eq!(last, event(4, AlarmState::Healthy));

        let events = store.events("flaky-service", 10).await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].event_time, at(1));

        assert!(store.last_event("other").await.unwrap().is_none());
        store.close().await;
    }
}
