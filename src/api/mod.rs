//! REST API and embedded demo page
//!
//! The interactive surface for the pipeline: scenario selection, generation
//! cycles across all configured models, chart rendering, and feedback
//! submission. Session state (current prompt, selected problem, the result
//! set) lives behind the router state - one logical session per process,
//! replaced wholesale on each generation cycle.

use crate::dataset::TabularDataset;
use crate::feedback::{
    FeedbackRecord, FeedbackStore, StoredFeedback, NEGATIVE_OUTCOME_TAGS, POSITIVE_OUTCOME_TAGS,
};
use crate::orchestrator::GenerationOrchestrator;
use crate::provider::GenerationRequest;
use crate::safety::is_code_safe;
use crate::sandbox::{PlotSandbox, RenderResult};
use crate::scenario::{self, ScenarioDefinition};
use crate::ModelConfig;
use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Rows of the dataset sample embedded into generation prompts
const SAMPLE_ROWS: usize = 5;

/// API state
pub struct ApiState {
    pub orchestrator: GenerationOrchestrator,
    pub sandbox: PlotSandbox,
    pub dataset: TabularDataset,
    pub store: Arc<dyn FeedbackStore>,
    pub models: Vec<ModelConfig>,
    pub session: Mutex<SessionState>,
}

/// Per-session conversation state, surviving across render cycles
#[derive(Default)]
pub struct SessionState {
    pub current_prompt: String,
    /// Catalog name the prompt came from; `None` for free-form prompts
    pub selected_problem: Option<String>,
    pub sections: Vec<ModelSection>,
    /// Feedback submissions per model name; survives cycles and clears,
    /// reset only when the process restarts
    pub feedback_counts: HashMap<String, u32>,
}

/// One model's slice of the current cycle: code plus execution outcome
#[derive(Debug, Clone, Serialize)]
pub struct ModelSection {
    pub model_name: String,
    pub model_id: String,
    pub success: bool,
    /// Generated source on success, generation error message otherwise
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render: Option<RenderResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_error: Option<String>,
}

/// Request to run a generation cycle
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Catalog scenario name; takes precedence over `prompt`
    #[serde(default)]
    pub scenario: Option<String>,
    /// Free-form prompt, used when no scenario is given
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub prompt: String,
    pub sections: Vec<ModelSection>,
    /// Feedback submissions so far this session, keyed by model name
    pub feedback_counts: HashMap<String, u32>,
}

/// Feedback form submission
#[derive(Debug, Deserialize)]
pub struct FeedbackSubmission {
    pub model_name: String,
    pub visual_accuracy: u8,
    pub visual_insightfulness: u8,
    pub business_relevance: u8,
    #[serde(default = "default_iteration_count")]
    pub iteration_count: u32,
    #[serde(default)]
    pub positive_outcomes: Vec<String>,
    #[serde(default)]
    pub negative_outcomes: Vec<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

fn default_iteration_count() -> u32 {
    1
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: &'static str,
    pub models: usize,
}

#[derive(Debug, Serialize)]
pub struct ScenarioListResponse {
    pub scenarios: &'static [ScenarioDefinition],
    pub positive_outcome_tags: [&'static str; 5],
    pub negative_outcome_tags: [&'static str; 5],
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// Create the API router
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(demo_page))
        .route("/health", get(health_check))
        .route("/scenarios", get(list_scenarios))
        .route("/generate", post(generate))
        .route("/clear", post(clear_results))
        .route("/results", get(current_results))
        .route("/feedback", post(submit_feedback).get(list_feedback))
        .route("/feedback/count", get(feedback_count))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: state.store.kind(),
        models: state.models.len(),
    })
}

async fn list_scenarios() -> Json<ScenarioListResponse> {
    Json(ScenarioListResponse {
        scenarios: scenario::catalog(),
        positive_outcome_tags: POSITIVE_OUTCOME_TAGS,
        negative_outcome_tags: NEGATIVE_OUTCOME_TAGS,
    })
}

/// Run one generation cycle: query every configured model, execute each
/// successful result in the sandbox, and replace the session result set.
async fn generate(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, String)> {
    let (prompt_text, selected_problem) = resolve_prompt(&request)?;

    info!(prompt = %prompt_text, models = state.models.len(), "Starting generation cycle");

    let generation_request = GenerationRequest {
        prompt_text: prompt_text.clone(),
        dataset_columns: state.dataset.columns().to_vec(),
        dataset_sample: state.dataset.head_preview(SAMPLE_ROWS),
    };

    let results = state
        .orchestrator
        .run_cycle(&generation_request, &state.models)
        .await;

    let mut sections = Vec::with_capacity(results.len());
    for result in results.iter() {
        let section = if !result.success {
            ModelSection {
                model_name: result.model_name.clone(),
                model_id: result.model_id.clone(),
                success: false,
                code: result.code.clone(),
                render: None,
                execution_error: None,
            }
        } else if !is_code_safe(&result.code) {
            // Advisory filter: blocked code is shown but not executed.
            ModelSection {
                model_name: result.model_name.clone(),
                model_id: result.model_id.clone(),
                success: true,
                code: result.code.clone(),
                render: None,
                execution_error: Some(
                    "Blocked by the code safety filter (advisory blacklist match)".to_string(),
                ),
            }
        } else {
            match state.sandbox.execute(&result.code, &state.dataset) {
                Ok(render) => ModelSection {
                    model_name: result.model_name.clone(),
                    model_id: result.model_id.clone(),
                    success: true,
                    code: result.code.clone(),
                    render: Some(render),
                    execution_error: None,
                },
                Err(e) => {
                    error!(model = %result.model_name, error = %e, "Execution failed");
                    ModelSection {
                        model_name: result.model_name.clone(),
                        model_id: result.model_id.clone(),
                        success: true,
                        code: result.code.clone(),
                        render: None,
                        execution_error: Some(e.to_string()),
                    }
                }
            }
        };
        sections.push(section);
    }

    let feedback_counts = {
        // A poisoned lock only means another handler panicked; session data
        // is still usable.
        let mut session = state.session.lock().unwrap_or_else(|e| e.into_inner());
        session.current_prompt = prompt_text.clone();
        session.selected_problem = selected_problem;
        session.sections = sections.clone();
        session.feedback_counts.clone()
    };

    Ok(Json(GenerateResponse {
        prompt: prompt_text,
        sections,
        feedback_counts,
    }))
}

/// Resolve the prompt for a cycle: a catalog scenario wins over free-form
/// text; a blank prompt is rejected.
fn resolve_prompt(
    request: &GenerateRequest,
) -> Result<(String, Option<String>), (StatusCode, String)> {
    if let Some(name) = request.scenario.as_deref() {
        let scenario = scenario::find(name).ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                format!("Unknown business problem: {name}"),
            )
        })?;
        return Ok((scenario.prompt(), Some(scenario.name.to_string())));
    }

    let prompt = request.prompt.as_deref().unwrap_or("").trim().to_string();
    if prompt.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "Please enter a valid visualization request".to_string(),
        ));
    }
    Ok((prompt, None))
}

/// Drop the current result set. Feedback counters are session history, not
/// results, so they stay.
async fn clear_results(State(state): State<Arc<ApiState>>) -> StatusCode {
    let mut session = state.session.lock().unwrap_or_else(|e| e.into_inner());
    session.current_prompt.clear();
    session.selected_problem = None;
    session.sections.clear();
    StatusCode::NO_CONTENT
}

async fn current_results(State(state): State<Arc<ApiState>>) -> Json<GenerateResponse> {
    let session = state.session.lock().unwrap_or_else(|e| e.into_inner());
    Json(GenerateResponse {
        prompt: session.current_prompt.clone(),
        sections: session.sections.clone(),
        feedback_counts: session.feedback_counts.clone(),
    })
}

/// Persist one feedback submission for a model in the current result set.
async fn submit_feedback(
    State(state): State<Arc<ApiState>>,
    Json(submission): Json<FeedbackSubmission>,
) -> Result<Json<crate::feedback::FeedbackAck>, (StatusCode, String)> {
    for (label, value) in [
        ("visual_accuracy", submission.visual_accuracy),
        ("visual_insightfulness", submission.visual_insightfulness),
        ("business_relevance", submission.business_relevance),
    ] {
        if !(1..=5).contains(&value) {
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("{label} must be between 1 and 5"),
            ));
        }
    }
    if submission.iteration_count < 1 {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "iteration_count must be at least 1".to_string(),
        ));
    }

    let (prompt, problem_id, code) = {
        let session = state.session.lock().unwrap_or_else(|e| e.into_inner());
        let section = session
            .sections
            .iter()
            .find(|s| s.model_name == submission.model_name)
            .ok_or_else(|| {
                (
                    StatusCode::NOT_FOUND,
                    format!("No current result for model: {}", submission.model_name),
                )
            })?;
        (
            session.current_prompt.clone(),
            scenario::problem_id_for(session.selected_problem.as_deref()),
            section.code.clone(),
        )
    };

    let record = FeedbackRecord {
        model_name: submission.model_name,
        prompt,
        problem_id,
        visual_accuracy: submission.visual_accuracy,
        visual_insightfulness: submission.visual_insightfulness,
        business_relevance: submission.business_relevance,
        iteration_count: submission.iteration_count,
        positive_outcomes: submission.positive_outcomes,
        negative_outcomes: submission.negative_outcomes,
        comment: submission.comment,
        code,
    };

    match state.store.insert(&record).await {
        Ok(ack) => {
            let mut session = state.session.lock().unwrap_or_else(|e| e.into_inner());
            *session
                .feedback_counts
                .entry(record.model_name.clone())
                .or_insert(0) += 1;
            info!(model = %record.model_name, session_id = %ack.session_id, "Feedback saved");
            Ok(Json(ack))
        }
        Err(e) => {
            error!(error = %e, "Feedback save failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error saving feedback: {e}"),
            ))
        }
    }
}

async fn list_feedback(State(state): State<Arc<ApiState>>) -> Json<Vec<StoredFeedback>> {
    Json(state.store.list_all().await)
}

async fn feedback_count(State(state): State<Arc<ApiState>>) -> Json<CountResponse> {
    Json(CountResponse {
        count: state.store.count().await,
    })
}

async fn demo_page() -> Html<&'static str> {
    Html(DEMO_HTML)
}

const DEMO_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>PromptViz</title>
    <script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
    <style>
        :root {
            --bg: #1a1a2e;
            --card: #16213e;
            --accent: #0f3460;
            --highlight: #e94560;
            --text: #eee;
            --muted: #888;
            --success: #4ade80;
            --error: #f87171;
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: 'SF Mono', 'Consolas', monospace;
            background: var(--bg);
            color: var(--text);
            min-height: 100vh;
            padding: 20px;
        }
        .container { max-width: 1100px; margin: 0 auto; }
        h1 { font-size: 1.5rem; color: var(--highlight); margin-bottom: 4px; }
        .subtitle { color: var(--muted); font-size: 0.85rem; margin-bottom: 20px; }
        .card {
            background: var(--card);
            padding: 20px;
            border-radius: 12px;
            margin-bottom: 20px;
        }
        label { font-size: 0.85rem; color: var(--muted); display: block; margin-bottom: 5px; }
        select, textarea, input[type=range] {
            width: 100%;
            background: var(--bg);
            border: 1px solid var(--accent);
            border-radius: 8px;
            padding: 10px;
            color: var(--text);
            font-family: inherit;
            font-size: 0.9rem;
        }
        .meta { font-size: 0.8rem; color: var(--muted); margin: 8px 0; }
        button {
            background: var(--highlight);
            color: white;
            border: none;
            padding: 10px 24px;
            border-radius: 8px;
            cursor: pointer;
            font-weight: 600;
            font-family: inherit;
        }
        button.secondary { background: var(--accent); }
        button:disabled { opacity: 0.5; cursor: not-allowed; }
        .row { display: flex; gap: 10px; margin-top: 12px; }
        .model-section {
            border-top: 2px solid var(--accent);
            margin-top: 20px;
            padding-top: 15px;
        }
        .model-section h2 { font-size: 1.1rem; color: var(--highlight); }
        .model-id { font-size: 0.75rem; color: var(--muted); margin-bottom: 10px; }
        pre.code {
            background: var(--bg);
            border-radius: 8px;
            padding: 12px;
            overflow-x: auto;
            font-size: 0.8rem;
            white-space: pre-wrap;
            margin: 10px 0;
        }
        .chart img { max-width: 100%; border-radius: 8px; background: #fff; }
        .error-box { color: var(--error); font-size: 0.85rem; margin: 8px 0; }
        .ok { color: var(--success); font-size: 0.85rem; }
        .feedback-form { background: var(--bg); border-radius: 8px; padding: 12px; margin-top: 10px; }
        .feedback-form .slider-row { margin-bottom: 10px; }
        .tags { display: flex; flex-wrap: wrap; gap: 8px; margin: 6px 0; font-size: 0.8rem; }
        .tags label { display: inline; color: var(--text); }
        .hidden { display: none; }
        #status { font-size: 0.85rem; margin-top: 10px; color: var(--muted); }
    </style>
</head>
<body>
<div class="container">
    <h1>&#128200; PromptViz</h1>
    <div class="subtitle">Generate, execute and rate LLM visualization code · <span id="dbStatus"></span></div>

    <div class="card">
        <label for="scenarioSelect">Choose a Business Problem</label>
        <select id="scenarioSelect"></select>
        <div class="meta" id="scenarioMeta"></div>
        <label style="margin-top:10px">
            <input type="checkbox" id="customToggle" onchange="toggleCustom()"> Write your own prompt instead
        </label>
        <textarea id="customPrompt" class="hidden" rows="3" placeholder="Describe the visualization you want..."></textarea>
        <div class="row">
            <button id="generateBtn" onclick="runGenerate()">&#128640; Generate All Visualizations</button>
            <button class="secondary" onclick="clearResults()">&#128465; Clear Results</button>
        </div>
        <div id="status"></div>
    </div>

    <div id="results"></div>
</div>

<script>
let catalog = [];
let tags = { positive: [], negative: [] };
let fbCounts = {};

async function init() {
    const resp = await fetch('/scenarios');
    const data = await resp.json();
    catalog = data.scenarios;
    tags.positive = data.positive_outcome_tags;
    tags.negative = data.negative_outcome_tags;

    const select = document.getElementById('scenarioSelect');
    select.innerHTML = catalog.map(s =>
        `<option value="${escapeHtml(s.name)}">${escapeHtml(s.name)}</option>`).join('');
    select.onchange = showMeta;
    showMeta();

    const count = await (await fetch('/feedback/count')).json();
    document.getElementById('dbStatus').textContent = `${count.count} feedback entries stored`;

    const current = await (await fetch('/results')).json();
    if (current.sections.length) renderResults(current);
}

function showMeta() {
    const s = catalog.find(c => c.name === document.getElementById('scenarioSelect').value);
    if (s) {
        document.getElementById('scenarioMeta').textContent =
            `Visualization Type: ${s.visualization_type} · Complexity: ${s.complexity} · Problem #${s.problem_id}`;
    }
}

function toggleCustom() {
    const custom = document.getElementById('customToggle').checked;
    document.getElementById('customPrompt').classList.toggle('hidden', !custom);
    document.getElementById('scenarioSelect').disabled = custom;
}

async function runGenerate() {
    const btn = document.getElementById('generateBtn');
    const status = document.getElementById('status');
    const custom = document.getElementById('customToggle').checked;
    const body = custom
        ? { prompt: document.getElementById('customPrompt').value }
        : { scenario: document.getElementById('scenarioSelect').value };

    btn.disabled = true;
    status.textContent = 'Generating visualizations from all models...';
    try {
        const resp = await fetch('/generate', {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify(body)
        });
        if (!resp.ok) {
            status.textContent = await resp.text();
            return;
        }
        const data = await resp.json();
        status.textContent = `Prompt: ${data.prompt}`;
        renderResults(data);
    } catch (err) {
        status.textContent = 'Error: ' + err.message;
    } finally {
        btn.disabled = false;
    }
}

async function clearResults() {
    await fetch('/clear', { method: 'POST' });
    document.getElementById('results').innerHTML = '';
    document.getElementById('status').textContent = 'Results cleared.';
}

function renderResults(data) {
    fbCounts = data.feedback_counts || {};
    const container = document.getElementById('results');
    container.innerHTML = '';
    data.sections.forEach((section, i) => {
        const div = document.createElement('div');
        div.className = 'card model-section';
        let inner = `<h2>&#129302; ${escapeHtml(section.model_name)}</h2>
                     <div class="model-id">${escapeHtml(section.model_id)}</div>`;
        if (!section.success) {
            inner += `<div class="error-box">&#10060; ${escapeHtml(section.code)}</div>`;
        } else {
            inner += `<pre class="code">${escapeHtml(section.code)}</pre>`;
            if (section.execution_error) {
                inner += `<div class="error-box">Error executing code: ${escapeHtml(section.execution_error)}</div>`;
            } else if (section.render && section.render.kind === 'static') {
                inner += `<div class="chart"><img src="data:image/png;base64,${section.render.png_base64}"></div>`;
            } else if (section.render && section.render.kind === 'interactive') {
                inner += `<div class="chart" id="plotly-${i}"></div>`;
            }
            inner += feedbackForm(section.model_name, i);
        }
        div.innerHTML = inner;
        container.appendChild(div);
        if (section.render && section.render.kind === 'interactive') {
            const spec = JSON.parse(section.render.spec);
            Plotly.newPlot(`plotly-${i}`, spec.data, spec.layout);
        }
    });
}

function feedbackForm(modelName, i) {
    const sliders = [
        ['visual_accuracy', 'Visual Accuracy'],
        ['visual_insightfulness', 'Visual Insightfulness'],
        ['business_relevance', 'Business Relevance'],
    ].map(([key, label]) => `
        <div class="slider-row">
            <label>${label} (1-5): <span id="${key}-val-${i}">3</span></label>
            <input type="range" min="1" max="5" value="3" id="${key}-${i}"
                   oninput="document.getElementById('${key}-val-${i}').textContent = this.value">
        </div>`).join('');

    const tagBoxes = (list, cls) => list.map(t =>
        `<label><input type="checkbox" class="${cls}-${i}" value="${escapeHtml(t)}"> ${escapeHtml(t)}</label>`).join('');

    return `<div class="feedback-form">
        <strong>&#11088; Rate This Visualization</strong>
        <div class="meta" id="fb-count-${i}">You have submitted ${fbCounts[modelName] || 0} feedback entries for this model</div>
        ${sliders}
        <label>What worked well?</label>
        <div class="tags">${tagBoxes(tags.positive, 'pos')}</div>
        <label>What fell short?</label>
        <div class="tags">${tagBoxes(tags.negative, 'neg')}</div>
        <label>Comment (optional)</label>
        <textarea id="comment-${i}" rows="2"></textarea>
        <div class="row">
            <button onclick="submitFeedback('${escapeHtml(modelName)}', ${i})">&#9989; Submit Feedback</button>
        </div>
        <div id="feedback-status-${i}"></div>
    </div>`;
}

async function submitFeedback(modelName, i) {
    const checked = cls => Array.from(document.querySelectorAll(`.${cls}-${i}:checked`)).map(c => c.value);
    const body = {
        model_name: modelName,
        visual_accuracy: parseInt(document.getElementById(`visual_accuracy-${i}`).value),
        visual_insightfulness: parseInt(document.getElementById(`visual_insightfulness-${i}`).value),
        business_relevance: parseInt(document.getElementById(`business_relevance-${i}`).value),
        positive_outcomes: checked('pos'),
        negative_outcomes: checked('neg'),
        comment: document.getElementById(`comment-${i}`).value || null,
    };
    const statusEl = document.getElementById(`feedback-status-${i}`);
    const resp = await fetch('/feedback', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(body)
    });
    if (resp.ok) {
        statusEl.innerHTML = '<span class="ok">&#9989; Feedback submitted, thank you!</span>';
        fbCounts[modelName] = (fbCounts[modelName] || 0) + 1;
        document.getElementById(`fb-count-${i}`).textContent =
            `You have submitted ${fbCounts[modelName]} feedback entries for this model`;
        const count = await (await fetch('/feedback/count')).json();
        document.getElementById('dbStatus').textContent = `${count.count} feedback entries stored`;
    } else {
        statusEl.innerHTML = `<span class="error-box">${escapeHtml(await resp.text())}</span>`;
    }
}

function escapeHtml(str) {
    return String(str).replace(/&/g, '&amp;')
                      .replace(/</g, '&lt;')
                      .replace(/>/g, '&gt;')
                      .replace(/"/g, '&quot;');
}

init();
</script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::SqliteFeedbackStore;
    use crate::provider::{CodeGenerator, GenerationError};
    use async_trait::async_trait;

    struct CannedGenerator;

    #[async_trait]
    impl CodeGenerator for CannedGenerator {
        async fn generate(
            &self,
            _model_id: &str,
            _request: &GenerationRequest,
        ) -> Result<String, GenerationError> {
            Ok("df.plot()".to_string())
        }
    }

    fn test_state() -> Arc<ApiState> {
        Arc::new(ApiState {
            orchestrator: GenerationOrchestrator::new(Arc::new(CannedGenerator)),
            sandbox: PlotSandbox::new(),
            dataset: TabularDataset::from_csv_str("Region,Sales\nWest,100\n").unwrap(),
            store: Arc::new(SqliteFeedbackStore::open_in_memory().unwrap()),
            models: vec![ModelConfig {
                name: "Model A".to_string(),
                id: "vendor/a".to_string(),
            }],
            session: Mutex::new(SessionState::default()),
        })
    }

    fn section_for(model: &str) -> ModelSection {
        ModelSection {
            model_name: model.to_string(),
            model_id: "vendor/a".to_string(),
            success: true,
            code: "df.plot()".to_string(),
            render: None,
            execution_error: None,
        }
    }

    fn submission(model: &str) -> FeedbackSubmission {
        FeedbackSubmission {
            model_name: model.to_string(),
            visual_accuracy: 5,
            visual_insightfulness: 4,
            business_relevance: 5,
            iteration_count: 1,
            positive_outcomes: vec![],
            negative_outcomes: vec![],
            comment: None,
        }
    }

    #[tokio::test]
    async fn feedback_submissions_increment_the_model_counter() {
        let state = test_state();
        state
            .session
            .lock()
            .unwrap()
            .sections
            .push(section_for("Model A"));

        submit_feedback(State(state.clone()), Json(submission("Model A")))
            .await
            .unwrap();
        submit_feedback(State(state.clone()), Json(submission("Model A")))
            .await
            .unwrap();

        let results = current_results(State(state)).await;
        assert_eq!(results.0.feedback_counts.get("Model A"), Some(&2));
    }

    #[tokio::test]
    async fn clearing_results_keeps_feedback_counters() {
        let state = test_state();
        state
            .session
            .lock()
            .unwrap()
            .sections
            .push(section_for("Model A"));
        submit_feedback(State(state.clone()), Json(submission("Model A")))
            .await
            .unwrap();

        clear_results(State(state.clone())).await;

        let results = current_results(State(state)).await;
        assert!(results.0.sections.is_empty());
        assert!(results.0.prompt.is_empty());
        assert_eq!(results.0.feedback_counts.get("Model A"), Some(&1));
    }

    #[tokio::test]
    async fn rejected_feedback_does_not_count() {
        let state = test_state();
        state
            .session
            .lock()
            .unwrap()
            .sections
            .push(section_for("Model A"));

        let mut bad = submission("Model A");
        bad.visual_accuracy = 0;
        submit_feedback(State(state.clone()), Json(bad))
            .await
            .unwrap_err();

        let results = current_results(State(state)).await;
        assert!(results.0.feedback_counts.is_empty());
    }

    #[test]
    fn scenario_prompt_wins_over_free_form() {
        let request = GenerateRequest {
            scenario: Some("Sales Distribution Across Regions".to_string()),
            prompt: Some("ignored".to_string()),
        };
        let (prompt, selected) = resolve_prompt(&request).unwrap();
        assert_eq!(
            prompt,
            "Sales Distribution Across Regions using Pie chart (Region-wise Sales %)"
        );
        assert_eq!(selected.as_deref(), Some("Sales Distribution Across Regions"));
    }

    #[test]
    fn free_form_prompt_has_no_selected_problem() {
        let request = GenerateRequest {
            scenario: None,
            prompt: Some("  total sales per month as a line chart  ".to_string()),
        };
        let (prompt, selected) = resolve_prompt(&request).unwrap();
        assert_eq!(prompt, "total sales per month as a line chart");
        assert!(selected.is_none());
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let request = GenerateRequest {
            scenario: None,
            prompt: Some("   ".to_string()),
        };
        let (status, _) = resolve_prompt(&request).unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn unknown_scenario_is_not_found() {
        let request = GenerateRequest {
            scenario: Some("Quarterly Unicorn Forecast".to_string()),
            prompt: None,
        };
        let (status, _) = resolve_prompt(&request).unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
