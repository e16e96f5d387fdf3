//! Generation cycle orchestration
//!
//! One user-triggered cycle queries every configured model in order for
//! plotting code. Each model is invoked exactly once; any generation error is
//! downgraded to a failed per-model result so one model's failure never
//! prevents the others from running. A cycle replaces the previous result set
//! wholesale - there is no incremental merge.

use crate::provider::{CodeGenerator, GenerationRequest};
use crate::ModelConfig;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one (model, cycle) generation attempt
#[derive(Debug, Clone, Serialize)]
pub struct ModelResult {
    /// Display name, the result key
    pub model_name: String,
    /// Provider model identifier
    pub model_id: String,
    /// True iff `code` holds non-empty, fence-stripped source text
    pub success: bool,
    /// Generated source on success, error message on failure
    pub code: String,
    /// The prompt that produced this result
    pub source_prompt: String,
}

/// Results of one generation cycle, keyed by model name in input order
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleResults {
    results: Vec<ModelResult>,
}

impl CycleResults {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Look up a result by model name. Names are unique per cycle (config
    /// validation rejects duplicates); the first match is returned.
    pub fn get(&self, model_name: &str) -> Option<&ModelResult> {
        self.results.iter().find(|r| r.model_name == model_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelResult> {
        self.results.iter()
    }

    /// Drop all results from the previous cycle
    pub fn clear(&mut self) {
        self.results.clear();
    }
}

/// Runs generation cycles against a set of configured models
pub struct GenerationOrchestrator {
    generator: Arc<dyn CodeGenerator>,
}

impl GenerationOrchestrator {
    pub fn new(generator: Arc<dyn CodeGenerator>) -> Self {
        Self { generator }
    }

    /// Invoke the generation client once per model, sequentially, in the
    /// given order. Produces exactly one result per model regardless of how
    /// many individually fail.
    pub async fn run_cycle(
        &self,
        request: &GenerationRequest,
        models: &[ModelConfig],
    ) -> CycleResults {
        let mut results = Vec::with_capacity(models.len());

        for model in models {
            info!(model = %model.name, id = %model.id, "Generating visualization code");

            let result = match self.generator.generate(&model.id, request).await {
                Ok(code) => ModelResult {
                    model_name: model.name.clone(),
                    model_id: model.id.clone(),
                    success: true,
                    code,
                    source_prompt: request.prompt_text.clone(),
                },
                Err(e) => {
                    warn!(model = %model.name, error = %e, "Generation failed");
                    ModelResult {
                        model_name: model.name.clone(),
                        model_id: model.id.clone(),
                        success: false,
                        code: format!("Error: {e}"),
                        source_prompt: request.prompt_text.clone(),
                    }
                }
            };

            results.push(result);
        }

        CycleResults { results }
    }
}
