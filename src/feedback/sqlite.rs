//! Local single-file feedback store (SQLite)

use super::{
    format_created_at, new_session_id, FeedbackAck, FeedbackRecord, FeedbackStore, StoreError,
    StoredFeedback,
};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

const CANONICAL_COLUMNS: &str = "\
    id INTEGER PRIMARY KEY AUTOINCREMENT,\
    model_name TEXT NOT NULL DEFAULT '',\
    prompt TEXT NOT NULL,\
    problem_id INTEGER NOT NULL DEFAULT 0,\
    visual_accuracy INTEGER NOT NULL,\
    visual_insightfulness INTEGER NOT NULL,\
    business_relevance INTEGER NOT NULL,\
    iteration INTEGER NOT NULL DEFAULT 1,\
    pos_outcome TEXT NOT NULL DEFAULT '',\
    neg_outcome TEXT NOT NULL DEFAULT '',\
    comment TEXT,\
    code TEXT,\
    session_id TEXT NOT NULL,\
    created_at TEXT NOT NULL";

/// SQLite-backed feedback store
pub struct SqliteFeedbackStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteFeedbackStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store, used by tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Idempotently ensure the feedback table exists with the canonical
    /// column set.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        // A poisoned lock only means another caller panicked mid-query; the
        // connection itself is still usable.
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            &format!("CREATE TABLE IF NOT EXISTS feedback ({CANONICAL_COLUMNS})"),
            [],
        )?;
        Ok(())
    }

    /// Rebuild a legacy feedback table (the early local schema without the
    /// iteration/outcome columns) onto the canonical column set by
    /// copy-drop-rename, inside one transaction. Every legacy column was
    /// nullable, so missing values are defaulted during the copy. No-op when
    /// the table is already canonical.
    pub fn migrate_legacy(&self) -> Result<usize, StoreError> {
        let mut conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());

        let mut has_session_id = false;
        let mut has_timestamp = false;
        {
            let mut stmt = conn.prepare("PRAGMA table_info(feedback)")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let name: String = row.get(1)?;
                match name.as_str() {
                    "session_id" => has_session_id = true,
                    "timestamp" => has_timestamp = true,
                    _ => {}
                }
            }
        }

        if has_session_id {
            info!("feedback table already canonical, nothing to migrate");
            return Ok(0);
        }
        if !has_timestamp {
            return Err(StoreError::Backend(
                "feedback table matches neither the legacy nor the canonical schema".to_string(),
            ));
        }

        let tx = conn.transaction()?;
        tx.execute(
            &format!("CREATE TABLE feedback_new ({CANONICAL_COLUMNS})"),
            [],
        )?;
        let copied = tx.execute(
            "INSERT INTO feedback_new (id, prompt, visual_accuracy, visual_insightfulness, \
             business_relevance, comment, created_at, code, session_id) \
             SELECT id, COALESCE(prompt, ''), COALESCE(visual_accuracy, 0), \
             COALESCE(visual_insightfulness, 0), COALESCE(business_relevance, 0), \
             comment, COALESCE(timestamp, ''), code, lower(hex(randomblob(16))) \
             FROM feedback",
            [],
        )?;
        tx.execute("DROP TABLE feedback", [])?;
        tx.execute("ALTER TABLE feedback_new RENAME TO feedback", [])?;
        tx.commit()?;

        info!(rows = copied, "migrated legacy feedback table");
        Ok(copied)
    }
}

#[async_trait]
impl FeedbackStore for SqliteFeedbackStore {
    async fn insert(&self, record: &FeedbackRecord) -> Result<FeedbackAck, StoreError> {
        let session_id = new_session_id();
        let created_at = format_created_at();

        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT INTO feedback (model_name, prompt, problem_id, visual_accuracy, \
             visual_insightfulness, business_relevance, iteration, pos_outcome, neg_outcome, \
             comment, code, session_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                record.model_name,
                record.prompt,
                record.problem_id,
                record.visual_accuracy,
                record.visual_insightfulness,
                record.business_relevance,
                record.iteration_count,
                record.positive_outcomes_joined(),
                record.negative_outcomes_joined(),
                record.comment,
                record.code,
                session_id,
                created_at,
            ],
        )?;

        Ok(FeedbackAck {
            session_id,
            created_at,
        })
    }

    async fn count(&self) -> i64 {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        match conn.query_row("SELECT COUNT(*) FROM feedback", [], |row| row.get(0)) {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "feedback count failed");
                0
            }
        }
    }

    async fn list_all(&self) -> Vec<StoredFeedback> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let result = conn
            .prepare(
                "SELECT id, model_name, prompt, problem_id, visual_accuracy, \
                 visual_insightfulness, business_relevance, iteration, pos_outcome, \
                 neg_outcome, comment, code, session_id, created_at \
                 FROM feedback ORDER BY id DESC",
            )
            .and_then(|mut stmt| {
                let rows = stmt.query_map([], row_to_feedback)?;
                rows.collect::<Result<Vec<_>, _>>()
            });

        match result {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "feedback listing failed");
                Vec::new()
            }
        }
    }

    fn kind(&self) -> &'static str {
        "sqlite"
    }
}

fn row_to_feedback(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredFeedback> {
    Ok(StoredFeedback {
        id: row.get(0)?,
        model_name: row.get(1)?,
        prompt: row.get(2)?,
        problem_id: row.get(3)?,
        visual_accuracy: row.get(4)?,
        visual_insightfulness: row.get(5)?,
        business_relevance: row.get(6)?,
        iteration_count: row.get(7)?,
        positive_outcomes: row.get(8)?,
        negative_outcomes: row.get(9)?,
        comment: row.get(10)?,
        code: row.get(11)?,
        session_id: row.get(12)?,
        created_at: row.get(13)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> FeedbackRecord {
        FeedbackRecord {
            model_name: "Claude 3.7 Sonnet".to_string(),
            prompt: "Sales Distribution Across Regions using Pie chart".to_string(),
            problem_id: 4,
            visual_accuracy: 5,
            visual_insightfulness: 4,
            business_relevance: 5,
            iteration_count: 1,
            positive_outcomes: vec!["Correct chart type".to_string()],
            negative_outcomes: vec![],
            comment: Some("clean pie chart".to_string()),
            code: "plt.pie(df['Sales'])".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_then_count_and_list() {
        let store = SqliteFeedbackStore::open_in_memory().unwrap();
        assert_eq!(store.count().await, 0);

        let ack = store.insert(&sample_record()).await.unwrap();
        assert_eq!(ack.created_at.len(), 22);

        assert_eq!(store.count().await, 1);
        let all = store.list_all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].problem_id, 4);
        assert_eq!(all[0].positive_outcomes, "Correct chart type");
        assert_eq!(all[0].session_id, ack.session_id);
    }

    #[tokio::test]
    async fn init_schema_is_idempotent() {
        let store = SqliteFeedbackStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        store.init_schema().unwrap();
        store.insert(&sample_record()).await.unwrap();
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn newest_records_list_first() {
        let store = SqliteFeedbackStore::open_in_memory().unwrap();
        let mut first = sample_record();
        first.model_name = "first".to_string();
        let mut second = sample_record();
        second.model_name = "second".to_string();

        store.insert(&first).await.unwrap();
        store.insert(&second).await.unwrap();

        let all = store.list_all().await;
        assert_eq!(all[0].model_name, "second");
        assert_eq!(all[1].model_name, "first");
    }

    #[tokio::test]
    async fn migrates_legacy_table_by_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.db");

        {
            let conn = Connection::open(&path).unwrap();
            conn.execute(
                "CREATE TABLE feedback (\
                 id INTEGER PRIMARY KEY AUTOINCREMENT,\
                 prompt TEXT, visual_accuracy INTEGER, visual_insightfulness INTEGER,\
                 business_relevance INTEGER, comment TEXT, timestamp TEXT, code TEXT)",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO feedback (prompt, visual_accuracy, visual_insightfulness, \
                 business_relevance, comment, timestamp, code) \
                 VALUES ('old prompt', 4, 3, 5, 'legacy row', '2025-01-01 00:00:00+00', 'x=1')",
                [],
            )
            .unwrap();
        }

        let store = SqliteFeedbackStore {
            conn: Arc::new(Mutex::new(Connection::open(&path).unwrap())),
        };
        let copied = store.migrate_legacy().unwrap();
        assert_eq!(copied, 1);

        let all = store.list_all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].prompt, "old prompt");
        assert_eq!(all[0].created_at, "2025-01-01 00:00:00+00");
        assert_eq!(all[0].iteration_count, 1);
        assert!(!all[0].session_id.is_empty());

        // Migrating again is a no-op.
        assert_eq!(store.migrate_legacy().unwrap(), 0);
    }

    #[tokio::test]
    async fn migrates_nullable_legacy_rows_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy_nulls.db");

        // Every legacy column was nullable; an unrated row must migrate too.
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute(
                "CREATE TABLE feedback (\
                 id INTEGER PRIMARY KEY AUTOINCREMENT,\
                 prompt TEXT, visual_accuracy INTEGER, visual_insightfulness INTEGER,\
                 business_relevance INTEGER, comment TEXT, timestamp TEXT, code TEXT)",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO feedback (prompt, visual_accuracy, comment, timestamp) \
                 VALUES (NULL, NULL, 'unrated row', '2025-01-02 00:00:00+00')",
                [],
            )
            .unwrap();
        }

        let store = SqliteFeedbackStore {
            conn: Arc::new(Mutex::new(Connection::open(&path).unwrap())),
        };
        assert_eq!(store.migrate_legacy().unwrap(), 1);

        // The rebuild is transactional, so no intermediate table survives it.
        {
            let conn = store.conn.lock().unwrap();
            let stray: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE name = 'feedback_new'",
                    [],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(stray, 0);
        }

        let all = store.list_all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].prompt, "");
        assert_eq!(all[0].visual_accuracy, 0);
        assert_eq!(all[0].visual_insightfulness, 0);
        assert_eq!(all[0].comment.as_deref(), Some("unrated row"));
    }

    #[tokio::test]
    async fn survives_a_poisoned_lock() {
        let store = SqliteFeedbackStore::open_in_memory().unwrap();

        let conn = store.conn.clone();
        std::thread::spawn(move || {
            let _guard = conn.lock().unwrap();
            panic!("poison the connection lock");
        })
        .join()
        .unwrap_err();

        store.insert(&sample_record()).await.unwrap();
        assert_eq!(store.count().await, 1);
    }
}
