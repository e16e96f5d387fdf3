//! PromptViz - Multi-model LLM visualization demo pipeline
//!
//! This crate provides:
//! - A catalog of pre-canned business problems with suggested chart types
//! - An OpenRouter-compatible generation client that asks LLMs for plotting code
//! - An orchestrator that runs one generation cycle across all configured models
//! - An embedded-Python sandbox that executes the generated code against a dataset
//! - A feedback store (SQLite or Supabase/PostgREST) for structured ratings

pub mod api;
pub mod dataset;
pub mod feedback;
pub mod orchestrator;
pub mod provider;
pub mod safety;
pub mod sandbox;
pub mod scenario;

pub use orchestrator::{CycleResults, GenerationOrchestrator, ModelResult};
pub use provider::{CodeGenerator, GenerationError, GenerationRequest};
pub use sandbox::{PlotSandbox, RenderResult};
pub use scenario::{catalog, Complexity, ScenarioDefinition};

/// Configuration for the PromptViz service
#[derive(Debug, Clone, serde::Deserialize)]
pub struct AppConfig {
    /// Chat-completions base URL (OpenRouter-compatible)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum tokens per generation
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Path to the tabular dataset (CSV)
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,

    /// Path to the local feedback database
    #[serde(default = "default_feedback_db")]
    pub feedback_db_path: String,

    /// Port for the HTTP server
    #[serde(default = "default_port")]
    pub port: u16,

    /// Models queried each generation cycle, in display order
    #[serde(default = "default_models")]
    pub models: Vec<ModelConfig>,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}
fn default_max_tokens() -> u32 {
    800
}
fn default_temperature() -> f32 {
    0.2
}
fn default_dataset_path() -> String {
    "Superstore_Dataset.csv".to_string()
}
fn default_feedback_db() -> String {
    "prompt_feedback.db".to_string()
}
fn default_port() -> u16 {
    8080
}

fn default_models() -> Vec<ModelConfig> {
    vec![
        ModelConfig {
            name: "DeepSeek v3.1".to_string(),
            id: "deepseek/deepseek-chat-v3.1".to_string(),
        },
        ModelConfig {
            name: "OpenAI GPT-4o".to_string(),
            id: "openai/chatgpt-4o-latest".to_string(),
        },
        ModelConfig {
            name: "Claude 3.7 Sonnet".to_string(),
            id: "anthropic/claude-3.7-sonnet".to_string(),
        },
    ]
}

/// Configuration errors, fatal at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("duplicate model name in config: {0}")]
    DuplicateModelName(String),

    #[error("no models configured")]
    NoModels,
}

impl AppConfig {
    /// Model names key the per-cycle result set, so they must be unique and
    /// at least one model must be configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::NoModels);
        }
        let mut seen = std::collections::HashSet::new();
        for model in &self.models {
            if !seen.insert(model.name.as_str()) {
                return Err(ConfigError::DuplicateModelName(model.name.clone()));
            }
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            dataset_path: default_dataset_path(),
            feedback_db_path: default_feedback_db(),
            port: default_port(),
            models: default_models(),
        }
    }
}

/// A single model queried during a generation cycle
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct ModelConfig {
    /// Display name, used as the result key (e.g. "Claude 3.7 Sonnet")
    pub name: String,

    /// Provider model identifier (e.g. "anthropic/claude-3.7-sonnet")
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_three_models() {
        let config = AppConfig::default();
        assert_eq!(config.models.len(), 3);
        assert_eq!(config.max_tokens, 800);
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn duplicate_model_names_are_rejected() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.models.push(ModelConfig {
            name: "DeepSeek v3.1".to_string(),
            id: "some/other-id".to_string(),
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateModelName(name)) if name == "DeepSeek v3.1"
        ));

        config.models.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoModels)));
    }

    #[test]
    fn config_parses_from_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            dataset_path = "data/sales.csv"

            [[models]]
            name = "Test Model"
            id = "test/model-1"
            "#,
        )
        .unwrap();
        assert_eq!(config.dataset_path, "data/sales.csv");
        assert_eq!(config.models.len(), 1);
        assert_eq!(config.base_url, "https://openrouter.ai/api/v1");
    }
}
