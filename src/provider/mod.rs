//! Generation client abstraction and code post-processing

mod openrouter;

pub use openrouter::OpenRouterClient;

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Errors from a code generation attempt
///
/// None of these are retried automatically; the orchestrator downgrades each
/// one into a failed per-model result for the current cycle.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error: HTTP {status}")]
    Api { status: u16 },

    #[error("model returned no usable code")]
    EmptyGeneration,
}

/// One generation cycle's input: the prompt plus the dataset schema
///
/// Ephemeral; constructed per cycle and never persisted.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The visualization request, non-empty after trimming
    pub prompt_text: String,
    /// Dataset column names, in dataset order
    pub dataset_columns: Vec<String>,
    /// Rendered preview of the first dataset rows
    pub dataset_sample: String,
}

/// Seam between the orchestrator and the hosted chat-completion endpoint
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Ask one model for plotting code; returns fence-stripped source text
    async fn generate(
        &self,
        model_id: &str,
        request: &GenerationRequest,
    ) -> Result<String, GenerationError>;
}

static LEADING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```(?:python)?\s*").expect("valid regex"));
static TRAILING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```$").expect("valid regex"));

/// Strip a leading fenced-code marker (optional language tag, case-insensitive)
/// and a trailing fence from a model response. Idempotent: already-stripped
/// text passes through unchanged.
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_leading = LEADING_FENCE.replace(trimmed, "");
    TRAILING_FENCE.replace(&without_leading, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_python_fence() {
        let raw = "```python\nimport pandas as pd\ndf.plot()\n```";
        assert_eq!(strip_code_fences(raw), "import pandas as pd\ndf.plot()");
    }

    #[test]
    fn strips_bare_fence_and_uppercase_tag() {
        assert_eq!(strip_code_fences("```\nplt.plot([1])\n```"), "plt.plot([1])");
        assert_eq!(strip_code_fences("```PYTHON\nx = 1\n```"), "x = 1");
    }

    #[test]
    fn stripping_is_idempotent() {
        let raw = "```python\ndf.plot(x='A', y='B')\n```";
        let once = strip_code_fences(raw);
        let twice = strip_code_fences(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn unfenced_code_is_untouched() {
        let code = "df.groupby('Segment')['Profit'].sum().plot(kind='bar')";
        assert_eq!(strip_code_fences(code), code);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(strip_code_fences("  \n```python\nx = 1\n```\n  "), "x = 1");
    }
}
