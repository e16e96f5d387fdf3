//! Structured feedback persistence
//!
//! One feedback record per (model, prompt, rating) submission. Records are
//! insert-only: never updated or deleted by this system. The store generates
//! `created_at` and `session_id` itself at insertion time; there is no
//! concept of authenticated users.

mod sqlite;
mod supabase;

pub use sqlite::SqliteFeedbackStore;
pub use supabase::SupabaseFeedbackStore;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Predefined positive outcome tags offered by the rating form
pub const POSITIVE_OUTCOME_TAGS: [&str; 5] = [
    "Correct chart type",
    "Clear labels",
    "Good use of color",
    "Revealed a pattern",
    "Ready to present",
];

/// Predefined negative outcome tags offered by the rating form
pub const NEGATIVE_OUTCOME_TAGS: [&str; 5] = [
    "Wrong chart type",
    "Misleading axes",
    "Cluttered",
    "Missing labels",
    "Irrelevant to the question",
];

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store rejected the write: {0}")]
    Backend(String),
}

/// A feedback submission, as collected from the rating form
#[derive(Debug, Clone)]
pub struct FeedbackRecord {
    pub model_name: String,
    pub prompt: String,
    /// 0 iff the originating prompt was free-form
    pub problem_id: u32,
    /// Ratings, each in [1, 5]
    pub visual_accuracy: u8,
    pub visual_insightfulness: u8,
    pub business_relevance: u8,
    /// Number of iterations needed, >= 1
    pub iteration_count: u32,
    pub positive_outcomes: Vec<String>,
    pub negative_outcomes: Vec<String>,
    pub comment: Option<String>,
    /// The generated source the rating refers to
    pub code: String,
}

impl FeedbackRecord {
    /// Outcome tag sets are persisted as comma-delimited strings
    pub fn positive_outcomes_joined(&self) -> String {
        self.positive_outcomes.join(", ")
    }

    pub fn negative_outcomes_joined(&self) -> String {
        self.negative_outcomes.join(", ")
    }
}

/// A persisted feedback row, as returned by `list_all`
///
/// Field renames match the `feedback` table's column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFeedback {
    pub id: i64,
    pub model_name: String,
    pub prompt: String,
    pub problem_id: u32,
    pub visual_accuracy: u8,
    pub visual_insightfulness: u8,
    pub business_relevance: u8,
    #[serde(rename = "iteration")]
    pub iteration_count: u32,
    #[serde(rename = "pos_outcome")]
    pub positive_outcomes: String,
    #[serde(rename = "neg_outcome")]
    pub negative_outcomes: String,
    pub comment: Option<String>,
    pub code: Option<String>,
    pub session_id: String,
    pub created_at: String,
}

/// Acknowledgement of a successful insertion
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackAck {
    pub session_id: String,
    pub created_at: String,
}

/// Persistence seam shared by the local and remote store variants
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Persist one record. The store stamps `session_id` and `created_at`.
    async fn insert(&self, record: &FeedbackRecord) -> Result<FeedbackAck, StoreError>;

    /// Total record count; 0 on failure.
    async fn count(&self) -> i64;

    /// All records, newest first; empty on failure or no rows.
    async fn list_all(&self) -> Vec<StoredFeedback>;

    /// Short label for logs and the health endpoint
    fn kind(&self) -> &'static str;
}

/// Current UTC timestamp in the store's fixed format, e.g.
/// `2025-08-23 08:29:30+00` - exactly 22 characters, no sub-second
/// precision, explicit `+00` offset. This exact textual format is a
/// compatibility requirement for the analysis view.
pub fn format_created_at() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S+00").to_string()
}

/// Fresh random token tagging one submission
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
