//! Experiment outcome audit log
//!
//! Every auto-match invocation emits one write-once record of what was
//! recommended, which variant applied, and what was actually joined,
//! for offline evaluation of the experiment. Writes are best-effort:
//! the engine logs and swallows sink failures.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

use crate::model::ExperimentOutcome;

/// Destination for experiment outcome records
#[async_trait]
pub trait OutcomeSink: Send + Sync {
    async fn record_outcome(&self, outcome: &ExperimentOutcome) -> Result<()>;
}

/// Outcome sink backed by a local SQLite table; pod-id lists are
/// stored as JSON text columns
pub struct SqliteOutcomeLog {
    conn: Mutex<Connection>,
}

impl SqliteOutcomeLog {
    /// Open or create the outcome log at the given database path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS experiment_outcomes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                variant TEXT NOT NULL,
                recommended_pod_ids TEXT NOT NULL,
                joined_pod_ids TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_outcomes_user ON experiment_outcomes(user_id);
            "#,
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Number of recorded outcomes (for status reporting)
    pub fn count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM experiment_outcomes", [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }

    /// Load all outcomes for a user, newest first
    pub fn outcomes_for_user(&self, user_id: &str) -> Result<Vec<ExperimentOutcome>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, variant, recommended_pod_ids, joined_pod_ids, recorded_at
             FROM experiment_outcomes WHERE user_id = ?1 ORDER BY id DESC",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut outcomes = Vec::new();
        for row in rows {
            let (user_id, variant, recommended, joined, recorded_at) = row?;
            let Some(variant) = crate::model::Variant::parse(&variant) else {
                continue;
            };
            outcomes.push(ExperimentOutcome {
                user_id,
                variant,
                recommended_pod_ids: serde_json::from_str(&recommended).unwrap_or_default(),
                joined_pod_ids: serde_json::from_str(&joined).unwrap_or_default(),
                recorded_at: recorded_at
                    .parse()
                    .unwrap_or(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH),
            });
        }
        Ok(outcomes)
    }
}

#[async_trait]
impl OutcomeSink for SqliteOutcomeLog {
    async fn record_outcome(&self, outcome: &ExperimentOutcome) -> Result<()> {
        let recommended = serde_json::to_string(&outcome.recommended_pod_ids)?;
        let joined = serde_json::to_string(&outcome.joined_pod_ids)?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO experiment_outcomes
             (user_id, variant, recommended_pod_ids, joined_pod_ids, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                outcome.user_id,
                outcome.variant.as_str(),
                recommended,
                joined,
                outcome.recorded_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Variant;
    use chrono::Utc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_record_and_read_back() {
        let temp = TempDir::new().unwrap();
        let log = SqliteOutcomeLog::open(&temp.path().join("experiments.sqlite")).unwrap();

        let outcome = ExperimentOutcome {
            user_id: "user-1".into(),
            variant: Variant::AutoJoin,
            recommended_pod_ids: vec!["pod-a".into(), "pod-b".into()],
            joined_pod_ids: vec!["pod-a".into()],
            recorded_at: Utc::now(),
        };
        log.record_outcome(&outcome).await.unwrap();

        assert_eq!(log.count().unwrap(), 1);
        let stored = log.outcomes_for_user("user-1").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].variant, Variant::AutoJoin);
        assert_eq!(stored[0].recommended_pod_ids, vec!["pod-a", "pod-b"]);
        assert_eq!(stored[0].joined_pod_ids, vec!["pod-a"]);
    }

    #[tokio::test]
    async fn test_outcomes_are_append_only() {
        let temp = TempDir::new().unwrap();
        let log = SqliteOutcomeLog::open(&temp.path().join("experiments.sqlite")).unwrap();

        for joined in [vec![], vec!["pod-a".to_string()]] {
            log.record_outcome(&ExperimentOutcome {
                user_id: "user-1".into(),
                variant: Variant::Prompted,
                recommended_pod_ids: vec!["pod-a".into()],
                joined_pod_ids: joined,
                recorded_at: Utc::now(),
            })
            .await
            .unwrap();
        }

        let stored = log.outcomes_for_user("user-1").unwrap();
        assert_eq!(stored.len(), 2);
        // Newest first
        assert_eq!(stored[0].joined_pod_ids, vec!["pod-a"]);
        assert!(stored[1].joined_pod_ids.is_empty());
    }
}
