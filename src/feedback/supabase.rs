//! Remote feedback store (Supabase / PostgREST)
//!
//! Talks to the managed backend's REST surface directly: upsert-capable
//! inserts into the `feedback` table, select-all reads, and an exact count
//! via the Content-Range header. Reads degrade to empty/zero on failure.

use super::{
    format_created_at, new_session_id, FeedbackAck, FeedbackRecord, FeedbackStore, StoreError,
    StoredFeedback,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

/// One row as sent to the `feedback` table
#[derive(Serialize)]
struct FeedbackRow<'a> {
    model_name: &'a str,
    prompt: &'a str,
    problem_id: u32,
    visual_accuracy: u8,
    visual_insightfulness: u8,
    business_relevance: u8,
    iteration: u32,
    pos_outcome: String,
    neg_outcome: String,
    comment: Option<&'a str>,
    code: &'a str,
    session_id: &'a str,
    created_at: &'a str,
}

/// PostgREST-backed feedback store
pub struct SupabaseFeedbackStore {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseFeedbackStore {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            base_url,
            anon_key: anon_key.into(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/feedback", self.base_url)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
    }
}

#[async_trait]
impl FeedbackStore for SupabaseFeedbackStore {
    async fn insert(&self, record: &FeedbackRecord) -> Result<FeedbackAck, StoreError> {
        let session_id = new_session_id();
        let created_at = format_created_at();

        let row = FeedbackRow {
            model_name: &record.model_name,
            prompt: &record.prompt,
            problem_id: record.problem_id,
            visual_accuracy: record.visual_accuracy,
            visual_insightfulness: record.visual_insightfulness,
            business_relevance: record.business_relevance,
            iteration: record.iteration_count,
            pos_outcome: record.positive_outcomes_joined(),
            neg_outcome: record.negative_outcomes_joined(),
            comment: record.comment.as_deref(),
            code: &record.code,
            session_id: &session_id,
            created_at: &created_at,
        };

        let response = self
            .authed(self.client.post(self.table_url()))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation,resolution=merge-duplicates")
            .json(&row)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend(format!("HTTP {status}: {body}")));
        }

        Ok(FeedbackAck {
            session_id,
            created_at,
        })
    }

    async fn count(&self) -> i64 {
        let response = self
            .authed(self.client.head(format!("{}?select=id", self.table_url())))
            .header("Prefer", "count=exact")
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => resp
                .headers()
                .get("content-range")
                .and_then(|v| v.to_str().ok())
                .and_then(|range| range.rsplit('/').next())
                .and_then(|total| total.parse().ok())
                .unwrap_or(0),
            Ok(resp) => {
                warn!(status = %resp.status(), "feedback count failed");
                0
            }
            Err(e) => {
                warn!(error = %e, "feedback count failed");
                0
            }
        }
    }

    async fn list_all(&self) -> Vec<StoredFeedback> {
        let response = self
            .authed(
                self.client
                    .get(format!("{}?select=*&order=created_at.desc", self.table_url())),
            )
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                resp.json().await.unwrap_or_else(|e| {
                    warn!(error = %e, "feedback listing returned bad payload");
                    Vec::new()
                })
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "feedback listing failed");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "feedback listing failed");
                Vec::new()
            }
        }
    }

    fn kind(&self) -> &'static str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_serializes_with_table_column_names() {
        let row = FeedbackRow {
            model_name: "m",
            prompt: "p",
            problem_id: 2,
            visual_accuracy: 5,
            visual_insightfulness: 4,
            business_relevance: 3,
            iteration: 1,
            pos_outcome: "Clear labels".to_string(),
            neg_outcome: String::new(),
            comment: None,
            code: "plt.plot([1])",
            session_id: "abc",
            created_at: "2025-08-23 08:29:30+00",
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["iteration"], 1);
        assert_eq!(json["pos_outcome"], "Clear labels");
        assert_eq!(json["created_at"], "2025-08-23 08:29:30+00");
    }

    #[test]
    fn base_url_is_normalized() {
        let store = SupabaseFeedbackStore::new("https://x.supabase.co/", "key");
        assert_eq!(store.table_url(), "https://x.supabase.co/rest/v1/feedback");
    }
}
