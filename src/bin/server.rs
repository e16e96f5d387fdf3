//! PromptViz server binary

use anyhow::{Context, Result};
use promptviz::api::{create_router, ApiState, SessionState};
use promptviz::dataset::TabularDataset;
use promptviz::feedback::{FeedbackStore, SqliteFeedbackStore, SupabaseFeedbackStore};
use promptviz::orchestrator::GenerationOrchestrator;
use promptviz::provider::OpenRouterClient;
use promptviz::sandbox::PlotSandbox;
use promptviz::AppConfig;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting PromptViz Server v{}", env!("CARGO_PKG_VERSION"));

    // .env is optional; real environments set variables directly
    dotenvy::dotenv().ok();

    // Load config from file
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config: AppConfig = match std::fs::read_to_string(&config_path) {
        Ok(contents) => toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", config_path))?,
        Err(_) => {
            warn!(
                config_path = config_path,
                "No config file found, using defaults"
            );
            AppConfig::default()
        }
    };

    config
        .validate()
        .with_context(|| format!("Invalid config: {}", config_path))?;

    info!(
        config_path = config_path,
        models = config.models.len(),
        dataset = config.dataset_path,
        "Loaded configuration"
    );

    let api_key = std::env::var("OPENROUTER_API_KEY").map_err(|_| {
        anyhow::anyhow!(
            "OPENROUTER_API_KEY is not set. Generation cannot run without it; \
             export the key or put it in a .env file."
        )
    })?;

    // Prefer the managed backend when both of its variables are present,
    // otherwise fall back to the local database file.
    let store: Arc<dyn FeedbackStore> = match (
        std::env::var("SUPABASE_URL"),
        std::env::var("SUPABASE_ANON_KEY"),
    ) {
        (Ok(url), Ok(key)) => {
            info!(url = url, "Using Supabase feedback store");
            Arc::new(SupabaseFeedbackStore::new(url, key))
        }
        _ => {
            info!(path = config.feedback_db_path, "Using SQLite feedback store");
            Arc::new(
                SqliteFeedbackStore::open(&config.feedback_db_path)
                    .with_context(|| format!("Failed to open {}", config.feedback_db_path))?,
            )
        }
    };

    let dataset = TabularDataset::load(&config.dataset_path)
        .with_context(|| format!("Failed to load dataset: {}", config.dataset_path))?;
    info!(
        columns = dataset.columns().len(),
        rows = dataset.row_count(),
        "Dataset loaded"
    );

    let generator = OpenRouterClient::new(
        &config.base_url,
        &api_key,
        config.max_tokens,
        config.temperature,
    );
    let orchestrator = GenerationOrchestrator::new(Arc::new(generator));

    let port = config.port;
    let state = Arc::new(ApiState {
        orchestrator,
        sandbox: PlotSandbox::new(),
        dataset,
        store,
        models: config.models,
        session: Mutex::new(SessionState::default()),
    });

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
